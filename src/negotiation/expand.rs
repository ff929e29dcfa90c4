//! Capability expansion and relaxation.
//!
//! Two builders feed the negotiation driver: [`expand`] turns a
//! device's supported-format list into a template set (one descriptor
//! per format, dimensions open), and [`relax`] widens a peer set into
//! everything reachable through the blitter (any supported format, any
//! dimensions above the hardware minimum, any aspect ratio).

use crate::caps::{CapsSet, CapsValue, VideoCaps};
use crate::device::HardwareClass;
use crate::format::PixelFormat;
use crate::fraction::Fraction;
use tracing::trace;

/// Widest pixel-aspect-ratio constraint a relaxed descriptor carries.
fn full_par_range() -> CapsValue<Fraction> {
    CapsValue::Range {
        min: Fraction::new(1, u32::MAX),
        max: Fraction::new(u32::MAX, 1),
    }
}

/// Build a template set from a supported-format list.
///
/// One descriptor per format, in list order, dimensions and PAR
/// unconstrained. An empty list yields an empty set; callers check.
pub fn expand(formats: &[PixelFormat]) -> CapsSet {
    formats
        .iter()
        .map(|&f| VideoCaps::for_format(f))
        .collect()
}

/// Relax one descriptor for the far side of the blitter.
///
/// The pixel-format constraint is dropped (the selector re-adds one),
/// dimensions widen to `[min_dim, MAX]`, and a present PAR widens to
/// the full fraction range. Interlace mode is left untouched.
pub fn relax_caps(caps: &VideoCaps, class: HardwareClass) -> VideoCaps {
    let min = class.min_dimension();
    VideoCaps {
        pixel_format: CapsValue::Any,
        width: CapsValue::Range { min, max: u32::MAX },
        height: CapsValue::Range { min, max: u32::MAX },
        par: caps.par.as_ref().map(|_| full_par_range()),
        interlace: caps.interlace,
    }
}

/// Relax every descriptor of a set, deduplicating as it goes.
///
/// A descriptor whose relaxed form is subsumed by an earlier emitted
/// one is skipped; scan order is insertion order, so the result is
/// deterministic. Applying `relax` to its own output is a no-op.
pub fn relax(set: &CapsSet, class: HardwareClass) -> CapsSet {
    let mut result = CapsSet::new();
    for caps in set {
        let relaxed = relax_caps(caps, class);
        if !result.push(relaxed) {
            trace!("relaxed descriptor subsumed by an earlier one, skipped");
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_keeps_list_order() {
        let set = expand(&[PixelFormat::Nv12, PixelFormat::Rgba]);
        assert_eq!(set.len(), 2);
        assert_eq!(
            set.get(0).unwrap().pixel_format.as_fixed(),
            Some(&PixelFormat::Nv12)
        );
        assert_eq!(
            set.get(1).unwrap().pixel_format.as_fixed(),
            Some(&PixelFormat::Rgba)
        );
    }

    #[test]
    fn expand_empty_list_is_empty_set() {
        assert!(expand(&[]).is_empty());
    }

    #[test]
    fn relax_widens_dimensions_per_class() {
        let fixed = VideoCaps::for_format(PixelFormat::Nv12).with_size(1920, 1080);
        let fine = relax_caps(&fixed, HardwareClass::FineTiling);
        assert_eq!(fine.width, CapsValue::Range { min: 8, max: u32::MAX });
        let coarse = relax_caps(&fixed, HardwareClass::Coarse);
        assert_eq!(coarse.height, CapsValue::Range { min: 64, max: u32::MAX });
        assert!(fine.pixel_format.is_any());
    }

    #[test]
    fn relax_widens_par_only_when_present() {
        let without = relax_caps(&VideoCaps::any(), HardwareClass::Coarse);
        assert!(without.par.is_none());
        let with = relax_caps(
            &VideoCaps::any().with_par(Fraction::new(10, 11)),
            HardwareClass::Coarse,
        );
        assert!(matches!(with.par, Some(CapsValue::Range { .. })));
    }

    #[test]
    fn relax_twice_is_a_no_op() {
        let mut peer = CapsSet::new();
        peer.push(VideoCaps::for_format(PixelFormat::Nv12).with_size(1920, 1080));
        peer.push(
            VideoCaps::for_format(PixelFormat::Rgba)
                .with_size(640, 480)
                .with_par(Fraction::ONE),
        );
        let once = relax(&peer, HardwareClass::Coarse);
        let twice = relax(&once, HardwareClass::Coarse);
        assert_eq!(once, twice);
    }

    #[test]
    fn relax_dedups_identical_relaxed_forms() {
        // two descriptors that only differ in fields relax erases
        let mut peer = CapsSet::new();
        peer.push(VideoCaps::for_format(PixelFormat::Nv12).with_size(1920, 1080));
        peer.push(VideoCaps::for_format(PixelFormat::I420).with_size(1280, 720));
        let relaxed = relax(&peer, HardwareClass::FineTiling);
        assert_eq!(relaxed.len(), 1);
    }
}
