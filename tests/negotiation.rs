//! End-to-end negotiation behavior: expansion, selection and fixation
//! driven through the public API the way a pipeline would.

use prism::caps::{CapsSet, CapsValue, VideoCaps};
use prism::device::HardwareClass;
use prism::format::{PixelFormat, VideoFormat};
use prism::fraction::Fraction;
use prism::negotiation::{
    conversion_cost, fixate_geometry, relax, select_format, Negotiation, NegotiationError,
};
use prism::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

const ALL_FORMATS: &[PixelFormat] = &[
    PixelFormat::I420,
    PixelFormat::Nv12,
    PixelFormat::Nv12_10Le,
    PixelFormat::I420_10Le,
    PixelFormat::P010,
    PixelFormat::I422,
    PixelFormat::Yuyv,
    PixelFormat::Uyvy,
    PixelFormat::I444,
    PixelFormat::Rgb24,
    PixelFormat::Rgba,
    PixelFormat::Bgr24,
    PixelFormat::Bgra,
    PixelFormat::Argb,
    PixelFormat::Rgb8p,
    PixelFormat::Gray8,
    PixelFormat::Gray16Le,
];

#[test]
fn identity_conversion_is_free_for_every_format() {
    init_tracing();
    for &f in ALL_FORMATS {
        assert_eq!(
            conversion_cost(f, f, HardwareClass::Coarse),
            0,
            "identity cost for {f}"
        );
    }
}

#[test]
fn loss_terms_are_directional() {
    init_tracing();
    let class = HardwareClass::Coarse;
    // removing alpha costs strictly more than adding it
    assert!(
        conversion_cost(PixelFormat::Bgra, PixelFormat::Bgr24, class)
            > conversion_cost(PixelFormat::Bgr24, PixelFormat::Bgra, class)
    );
    // dropping bit depth costs strictly more than raising it
    assert!(
        conversion_cost(PixelFormat::P010, PixelFormat::I420, class)
            > conversion_cost(PixelFormat::I420, PixelFormat::P010, class)
    );
    // subsampling chroma costs strictly more than restoring it
    assert!(
        conversion_cost(PixelFormat::I444, PixelFormat::I420, class)
            > conversion_cost(PixelFormat::I420, PixelFormat::I444, class)
    );
}

#[test]
fn exact_source_format_wins_from_any_position() {
    init_tracing();
    for position in 0..3 {
        let mut formats = vec![PixelFormat::Rgba, PixelFormat::Gray8, PixelFormat::Yuyv];
        formats.insert(position, PixelFormat::Nv12);
        let set = CapsSet::single(VideoCaps {
            pixel_format: CapsValue::List(formats),
            ..VideoCaps::any()
        });
        let sel = select_format(PixelFormat::Nv12, &set, HardwareClass::Coarse).unwrap();
        assert_eq!(sel.format, PixelFormat::Nv12);
        assert_eq!(sel.cost, 0);
    }
}

#[test]
fn unconstrained_output_preserves_1080p_exactly() {
    init_tracing();
    let input = VideoFormat::new(1920, 1080, PixelFormat::I420);
    let candidate = VideoCaps::any().with_size_range(64, 4096, 64, 4096);
    let got = fixate_geometry(&input, &candidate).unwrap();
    assert_eq!((got.width, got.height), (1920, 1080));
    assert!(got.effective_par().is_one());
}

#[test]
fn sd_to_576_line_square_pixel_width() {
    init_tracing();
    // 720x480 at PAR 10/11 has DAR 15/11; the square-pixel width for
    // 576 lines is round(576 * 15 / 11) = 785
    let input = VideoFormat::new(720, 480, PixelFormat::I420).with_par(Fraction::new(10, 11));
    let candidate = VideoCaps {
        width: CapsValue::Range { min: 64, max: 4096 },
        height: CapsValue::Fixed(576),
        par: Some(CapsValue::Fixed(Fraction::ONE)),
        ..VideoCaps::any()
    };
    let got = fixate_geometry(&input, &candidate).unwrap();
    assert_eq!(got.width, 785);
    assert_eq!(got.height, 576);
    assert_eq!(got.par, Some(Fraction::ONE));
}

#[test]
fn fixation_has_no_hidden_state() {
    init_tracing();
    let input = VideoFormat::new(1280, 720, PixelFormat::Nv12).with_par(Fraction::new(4, 3));
    let candidate = VideoCaps::any()
        .with_size_range(100, 1000, 100, 1000)
        .with_par(Fraction::ONE);
    let first = fixate_geometry(&input, &candidate).unwrap();
    let second = fixate_geometry(&input, &candidate).unwrap();
    assert_eq!(first, second);
}

#[test]
fn relaxation_is_stable_under_repetition() {
    init_tracing();
    let peer: CapsSet = [
        VideoCaps::for_format(PixelFormat::Nv12)
            .with_size(1920, 1080)
            .with_par(Fraction::ONE),
        VideoCaps::for_format(PixelFormat::Rgba).with_size_range(320, 640, 240, 480),
    ]
    .into_iter()
    .collect();
    for class in [HardwareClass::FineTiling, HardwareClass::Coarse] {
        let once = relax(&peer, class);
        let twice = relax(&once, class);
        assert_eq!(once, twice);
        for caps in &once {
            assert_eq!(
                caps.width,
                CapsValue::Range {
                    min: class.min_dimension(),
                    max: u32::MAX
                }
            );
        }
    }
}

#[test]
fn empty_candidate_set_fails_before_any_scoring() {
    init_tracing();
    let err = select_format(PixelFormat::I420, &CapsSet::new(), HardwareClass::Coarse)
        .unwrap_err();
    assert!(matches!(err, NegotiationError::EmptyCapsSet { .. }));
}

#[test]
fn degenerate_peer_range_fails_fixation() {
    init_tracing();
    let input = VideoFormat::new(640, 480, PixelFormat::I420);
    let candidate = VideoCaps {
        height: CapsValue::Range { min: 1000, max: 100 },
        ..VideoCaps::any()
    };
    let err = fixate_geometry(&input, &candidate).unwrap_err();
    assert!(matches!(
        err,
        NegotiationError::DegenerateRange { field: "height" }
    ));
}

#[test]
fn full_event_prefers_lossless_candidate() {
    init_tracing();
    // downstream offers GRAY8 first and the input format second; the
    // lossless one must win despite scan order
    let input = VideoCaps::from_fixed(&VideoFormat::new(1280, 720, PixelFormat::Nv12));
    let peer: CapsSet = [
        VideoCaps::for_format(PixelFormat::Gray8).with_size_range(64, 4096, 64, 4096),
        VideoCaps::for_format(PixelFormat::Nv12).with_size_range(64, 4096, 64, 4096),
    ]
    .into_iter()
    .collect();
    let mut event = Negotiation::new(HardwareClass::Coarse);
    let out = event
        .negotiate(&input, &peer, &[PixelFormat::Nv12, PixelFormat::Gray8])
        .unwrap();
    assert_eq!(out.pixel_format, PixelFormat::Nv12);
    assert_eq!((out.width, out.height), (1280, 720));
}

#[test]
fn fine_tiler_detile_overrides_generic_scoring() {
    init_tracing();
    // 10-bit semi-planar into NV12 is free on a fine tiler even though
    // generic scoring would charge for the depth drop
    let input = VideoCaps::from_fixed(&VideoFormat::new(3840, 2160, PixelFormat::Nv12_10Le));
    let peer = CapsSet::single(VideoCaps {
        pixel_format: CapsValue::List(vec![PixelFormat::Nv12, PixelFormat::Nv12_10Le]),
        width: CapsValue::Range { min: 8, max: 8192 },
        height: CapsValue::Range { min: 8, max: 8192 },
        ..VideoCaps::any()
    });
    let mut event = Negotiation::new(HardwareClass::FineTiling);
    let out = event
        .negotiate(&input, &peer, &[PixelFormat::Nv12, PixelFormat::Nv12_10Le])
        .unwrap();
    assert_eq!(out.pixel_format, PixelFormat::Nv12);
}

#[test]
fn fine_tiler_without_ten_bit_source_cannot_emit_nv12() {
    init_tracing();
    let input = VideoCaps::from_fixed(&VideoFormat::new(640, 480, PixelFormat::I420));
    let peer = CapsSet::single(VideoCaps::for_format(PixelFormat::Nv12).with_size_range(
        8, 4096, 8, 4096,
    ));
    let mut event = Negotiation::new(HardwareClass::FineTiling);
    let err = event
        .negotiate(&input, &peer, &[PixelFormat::Nv12])
        .unwrap_err();
    assert!(matches!(err, NegotiationError::NoAcceptableFormat { .. }));
}

#[test]
fn filter_level_negotiation_round_trip() {
    init_tracing();
    let mut filter = InferenceFilter::new(
        MockDevice::coarse(),
        FilterConfig {
            enable_inference: false,
            ..FilterConfig::default()
        },
    )
    .unwrap();

    let input = VideoCaps::from_fixed(
        &VideoFormat::new(720, 480, PixelFormat::I420).with_par(Fraction::new(10, 11)),
    );
    let peer = CapsSet::single(VideoCaps {
        pixel_format: CapsValue::List(vec![PixelFormat::Rgba, PixelFormat::I420]),
        width: CapsValue::Range { min: 64, max: 4096 },
        height: CapsValue::Range { min: 64, max: 4096 },
        par: Some(CapsValue::Range {
            min: Fraction::new(1, 64),
            max: Fraction::new(64, 1),
        }),
        ..VideoCaps::any()
    });

    let out = filter.negotiate(&input, &peer).unwrap();
    assert_eq!(out.pixel_format, PixelFormat::I420);
    assert_eq!((out.width, out.height), (720, 480));
    assert_eq!(out.par, Fraction::new(10, 11));

    // a second event with unchanged constraints reuses the result
    let again = filter.negotiate(&input, &peer).unwrap();
    assert_eq!(again, out);

    filter.set_info(&input, &VideoCaps::from_fixed(&out)).unwrap();
    assert!(filter.is_passthrough());
}
