//! Geometry fixation: choosing concrete output dimensions and PAR.
//!
//! Given a fully fixed input format and an output descriptor whose
//! width/height/PAR may still be ranges, derive one concrete triple
//! that keeps the input's display aspect ratio whenever the output
//! constraints allow it, and degrades predictably when they do not.
//!
//! The branch order is a strict priority list: already-fixed dimensions
//! are never revisited, a fixed PAR forces the free dimension, and only
//! when everything is open do we try to preserve the input geometry
//! outright. Every fallback is deterministic; running fixation twice on
//! the same inputs yields the same result.
//!
//! All ratio math is exact integer fraction arithmetic. No floating
//! point touches this path.

use crate::caps::{CapsValue, VideoCaps};
use crate::format::VideoFormat;
use crate::fraction::Fraction;
use crate::negotiation::error::NegotiationError;
use tracing::debug;

/// The fixator's outcome.
///
/// `par` is `None` when the descriptor had no PAR field and unity was
/// derived; consumers treat that as `1/1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixatedGeometry {
    /// Concrete output width.
    pub width: u32,
    /// Concrete output height.
    pub height: u32,
    /// Concrete output PAR, if one must be carried explicitly.
    pub par: Option<Fraction>,
}

impl FixatedGeometry {
    /// The effective PAR (`1/1` when absent).
    pub fn effective_par(&self) -> Fraction {
        self.par.unwrap_or(Fraction::ONE)
    }
}

fn snap_dim(
    constraint: &CapsValue<u32>,
    target: u32,
    field: &'static str,
) -> Result<u32, NegotiationError> {
    constraint
        .snap(target)
        .ok_or(NegotiationError::DegenerateRange { field })
}

fn snap_par(
    constraint: &CapsValue<Fraction>,
    target: Fraction,
) -> Result<Fraction, NegotiationError> {
    constraint
        .snap(target)
        .ok_or(NegotiationError::DegenerateRange {
            field: "pixel-aspect-ratio",
        })
}

/// Carry the PAR explicitly only if the field existed or it is
/// non-unity.
fn par_out(par_present: bool, par: Fraction) -> Option<Fraction> {
    (par_present || !par.is_one()).then_some(par)
}

/// Fixate output width, height and PAR against `candidate`.
///
/// `input` must be fully fixed. The candidate's pixel format is not
/// consulted; format selection happens separately.
pub fn fixate_geometry(
    input: &VideoFormat,
    candidate: &VideoCaps,
) -> Result<FixatedGeometry, NegotiationError> {
    for (constraint, field) in [(&candidate.width, "width"), (&candidate.height, "height")] {
        if constraint.is_degenerate() {
            return Err(NegotiationError::DegenerateRange { field });
        }
    }
    if candidate.par.as_ref().is_some_and(CapsValue::is_degenerate) {
        return Err(NegotiationError::DegenerateRange {
            field: "pixel-aspect-ratio",
        });
    }

    let (from_w, from_h) = (input.width, input.height);
    let par_present = candidate.par.is_some();
    // An absent output PAR negotiates over the full range.
    let to_par = candidate.par.clone().unwrap_or(CapsValue::Range {
        min: Fraction::new(1, u32::MAX),
        max: Fraction::new(u32::MAX, 1),
    });

    let w_fixed = candidate.width.as_fixed().copied();
    let h_fixed = candidate.height.as_fixed().copied();

    // Both dimensions already fixed: only the PAR may still move.
    if let (Some(w), Some(h)) = (w_fixed, h_fixed) {
        debug!("dimensions already set to {w}x{h}");
        let par = if let Some(p) = to_par.as_fixed() {
            par_present.then_some(*p)
        } else {
            // the PAR that reproduces the input DAR at w x h
            let required = input.dar().mul(&Fraction::from_ratio(h as u64, w.max(1) as u64));
            debug!("fixating output par to {required}");
            if par_present {
                Some(snap_par(&to_par, required)?)
            } else {
                (!required.is_one()).then_some(required)
            }
        };
        return Ok(FixatedGeometry {
            width: w,
            height: h,
            par,
        });
    }

    let from_dar = input.dar();
    debug!("input DAR is {from_dar}");

    if let Some(h) = h_fixed {
        debug!("height is fixed ({h})");

        if let Some(&tp) = to_par.as_fixed() {
            // width follows from DAR and the fixed PAR
            debug!("PAR is fixed {tp}");
            let scale = from_dar.mul(&tp.invert());
            let w = scale.scale(h);
            let set_w = snap_dim(&candidate.width, w, "width")?;
            return Ok(FixatedGeometry {
                width: set_w,
                height: h,
                par: Some(tp),
            });
        }

        // PAR free: try to keep the input width
        let set_w = snap_dim(&candidate.width, from_w, "width")?;
        let required = from_dar.mul(&Fraction::from_ratio(h as u64, set_w.max(1) as u64));
        let set_par = snap_par(&to_par, required)?;

        if set_par == required {
            return Ok(FixatedGeometry {
                width: set_w,
                height: h,
                par: par_out(par_present, set_par),
            });
        }
        // Scale the width to the snapped PAR instead; DAR may be lost.
        let scale = from_dar.mul(&set_par.invert());
        let w = scale.scale(h);
        let set_w = snap_dim(&candidate.width, w, "width")?;
        return Ok(FixatedGeometry {
            width: set_w,
            height: h,
            par: par_out(par_present, set_par),
        });
    }

    if let Some(w) = w_fixed {
        debug!("width is fixed ({w})");

        if let Some(&tp) = to_par.as_fixed() {
            debug!("PAR is fixed {tp}");
            let scale = from_dar.mul(&tp.invert());
            let h = scale.invert().scale(w);
            let set_h = snap_dim(&candidate.height, h, "height")?;
            return Ok(FixatedGeometry {
                width: w,
                height: set_h,
                par: Some(tp),
            });
        }

        // PAR free: try to keep the input height
        let set_h = snap_dim(&candidate.height, from_h, "height")?;
        let required = from_dar.mul(&Fraction::from_ratio(set_h as u64, w.max(1) as u64));
        let set_par = snap_par(&to_par, required)?;

        if set_par == required {
            return Ok(FixatedGeometry {
                width: w,
                height: set_h,
                par: par_out(par_present, set_par),
            });
        }
        let scale = from_dar.mul(&set_par.invert());
        let h = scale.invert().scale(w);
        let set_h = snap_dim(&candidate.height, h, "height")?;
        return Ok(FixatedGeometry {
            width: w,
            height: set_h,
            par: par_out(par_present, set_par),
        });
    }

    // Neither dimension fixed.
    if let Some(&tp) = to_par.as_fixed() {
        // Scale factor for the PAR change.
        let scale = from_dar.mul(&tp);

        // Try to keep the input height (interlaced content resists
        // vertical scaling).
        let set_h = snap_dim(&candidate.height, from_h, "height")?;
        let w = scale.scale(set_h);
        let set_w = snap_dim(&candidate.width, w, "width")?;
        if set_w == w {
            return Ok(FixatedGeometry {
                width: set_w,
                height: set_h,
                par: Some(tp),
            });
        }
        let fallback = (set_w, set_h);

        // Keep the input width at least.
        let set_w = snap_dim(&candidate.width, from_w, "width")?;
        let h = scale.invert().scale(set_w);
        let set_h = snap_dim(&candidate.height, h, "height")?;
        if set_h == h {
            return Ok(FixatedGeometry {
                width: set_w,
                height: set_h,
                par: Some(tp),
            });
        }
        return Ok(FixatedGeometry {
            width: fallback.0,
            height: fallback.1,
            par: Some(tp),
        });
    }

    // Everything free: keep dimensions as close to the input as the
    // ranges allow and scale the PAR to match.
    let set_h = snap_dim(&candidate.height, from_h, "height")?;
    let set_w = snap_dim(&candidate.width, from_w, "width")?;
    let required = from_dar.mul(&Fraction::from_ratio(set_h as u64, set_w.max(1) as u64));
    let set_par = snap_par(&to_par, required)?;

    if set_par == required {
        return Ok(FixatedGeometry {
            width: set_w,
            height: set_h,
            par: par_out(par_present, set_par),
        });
    }

    // The snapped PAR broke the DAR; try re-deriving the width from it.
    let scale = from_dar.mul(&set_par.invert());
    let w = scale.scale(set_h);
    let snapped_w = snap_dim(&candidate.width, w, "width")?;
    if snapped_w == w {
        return Ok(FixatedGeometry {
            width: snapped_w,
            height: set_h,
            par: par_out(par_present, set_par),
        });
    }

    // Then the height.
    let h = scale.invert().scale(set_w);
    let snapped_h = snap_dim(&candidate.height, h, "height")?;
    if snapped_h == h {
        return Ok(FixatedGeometry {
            width: set_w,
            height: snapped_h,
            par: par_out(par_present, set_par),
        });
    }

    // DAR cannot be kept; take the nearest values from the first try.
    Ok(FixatedGeometry {
        width: set_w,
        height: set_h,
        par: par_out(par_present, set_par),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::PixelFormat;

    fn input(w: u32, h: u32, par: Fraction) -> VideoFormat {
        VideoFormat::new(w, h, PixelFormat::I420).with_par(par)
    }

    fn open_range(min: u32, max: u32) -> VideoCaps {
        VideoCaps::any().with_size_range(min, max, min, max)
    }

    #[test]
    fn passthrough_when_ranges_cover_input() {
        let got = fixate_geometry(&input(1920, 1080, Fraction::ONE), &open_range(64, 4096))
            .unwrap();
        assert_eq!((got.width, got.height), (1920, 1080));
        assert_eq!(got.par, None);
        assert!(got.effective_par().is_one());
    }

    #[test]
    fn fixed_height_and_par_derives_width_exactly() {
        // 720x480 at 10/11 has DAR 15/11; at square pixels and height
        // 576 the width is round(576 * 15/11) = 785
        let candidate = VideoCaps {
            width: CapsValue::Range { min: 64, max: 4096 },
            height: CapsValue::Fixed(576),
            par: Some(CapsValue::Fixed(Fraction::ONE)),
            ..VideoCaps::any()
        };
        let got = fixate_geometry(&input(720, 480, Fraction::new(10, 11)), &candidate).unwrap();
        assert_eq!((got.width, got.height), (785, 576));
        assert_eq!(got.par, Some(Fraction::ONE));
    }

    #[test]
    fn fixed_width_and_par_derives_height() {
        // DAR 16/9, width 1280, square pixels -> height 720
        let candidate = VideoCaps {
            width: CapsValue::Fixed(1280),
            height: CapsValue::Range { min: 64, max: 4096 },
            par: Some(CapsValue::Fixed(Fraction::ONE)),
            ..VideoCaps::any()
        };
        let got = fixate_geometry(&input(1920, 1080, Fraction::ONE), &candidate).unwrap();
        assert_eq!((got.width, got.height), (1280, 720));
    }

    #[test]
    fn both_fixed_derives_required_par() {
        // 1920x1080 squeezed into 1440x1080 needs PAR 4/3
        let candidate = VideoCaps {
            width: CapsValue::Fixed(1440),
            height: CapsValue::Fixed(1080),
            par: Some(CapsValue::Range {
                min: Fraction::new(1, 16),
                max: Fraction::new(16, 1),
            }),
            ..VideoCaps::any()
        };
        let got = fixate_geometry(&input(1920, 1080, Fraction::ONE), &candidate).unwrap();
        assert_eq!((got.width, got.height), (1440, 1080));
        assert_eq!(got.par, Some(Fraction::new(4, 3)));
    }

    #[test]
    fn both_fixed_absent_par_stays_absent_when_unity() {
        let candidate = VideoCaps::any().with_size(1920, 1080);
        let got = fixate_geometry(&input(1920, 1080, Fraction::ONE), &candidate).unwrap();
        assert_eq!(got.par, None);
        // non-unity requirement is carried explicitly
        let got = fixate_geometry(&input(1440, 1080, Fraction::new(4, 3)), &candidate).unwrap();
        assert_eq!(got.par, Some(Fraction::new(4, 3)));
    }

    #[test]
    fn fixed_height_free_par_keeps_input_width() {
        // height forced to 480 from a 640x480 input: width stays, PAR
        // stays square
        let candidate = VideoCaps {
            width: CapsValue::Range { min: 64, max: 4096 },
            height: CapsValue::Fixed(480),
            par: Some(CapsValue::Range {
                min: Fraction::new(1, 16),
                max: Fraction::new(16, 1),
            }),
            ..VideoCaps::any()
        };
        let got = fixate_geometry(&input(640, 480, Fraction::ONE), &candidate).unwrap();
        assert_eq!((got.width, got.height), (640, 480));
        assert_eq!(got.par, Some(Fraction::ONE));
    }

    #[test]
    fn clamped_width_compensates_with_par() {
        // input 1920x1080 but width capped at 960: PAR absorbs the
        // squeeze so the DAR survives
        let candidate = VideoCaps {
            width: CapsValue::Range { min: 64, max: 960 },
            height: CapsValue::Fixed(1080),
            par: Some(CapsValue::Range {
                min: Fraction::new(1, 16),
                max: Fraction::new(16, 1),
            }),
            ..VideoCaps::any()
        };
        let got = fixate_geometry(&input(1920, 1080, Fraction::ONE), &candidate).unwrap();
        assert_eq!((got.width, got.height), (960, 1080));
        assert_eq!(got.par, Some(Fraction::new(2, 1)));
    }

    #[test]
    fn fixation_is_idempotent() {
        let candidate = open_range(64, 1024);
        let src = input(1920, 1080, Fraction::new(10, 11));
        let a = fixate_geometry(&src, &candidate).unwrap();
        let b = fixate_geometry(&src, &candidate).unwrap();
        assert_eq!(a, b);
        // the fixed result fixates to itself
        let fixed = VideoCaps::any()
            .with_size(a.width, a.height)
            .with_par(a.effective_par());
        let again = fixate_geometry(&src, &fixed).unwrap();
        assert_eq!((again.width, again.height), (a.width, a.height));
    }

    #[test]
    fn degenerate_range_is_an_error() {
        let candidate = VideoCaps {
            width: CapsValue::Range { min: 4096, max: 64 },
            ..open_range(64, 4096)
        };
        let err = fixate_geometry(&input(1920, 1080, Fraction::ONE), &candidate).unwrap_err();
        assert!(matches!(
            err,
            NegotiationError::DegenerateRange { field: "width" }
        ));
    }

    #[test]
    fn degenerate_par_constraint_is_an_error() {
        let src = input(640, 480, Fraction::ONE);
        // inverted range
        let candidate = VideoCaps {
            par: Some(CapsValue::Range {
                min: Fraction::new(2, 1),
                max: Fraction::new(1, 2),
            }),
            ..open_range(64, 4096)
        };
        let err = fixate_geometry(&src, &candidate).unwrap_err();
        assert!(matches!(
            err,
            NegotiationError::DegenerateRange {
                field: "pixel-aspect-ratio"
            }
        ));
        // empty list
        let candidate = VideoCaps {
            par: Some(CapsValue::List(Vec::new())),
            ..open_range(64, 4096)
        };
        let err = fixate_geometry(&src, &candidate).unwrap_err();
        assert!(matches!(
            err,
            NegotiationError::DegenerateRange {
                field: "pixel-aspect-ratio"
            }
        ));
    }

    #[test]
    fn fixed_par_scales_both_free_dimensions() {
        // all free but PAR pinned to 1/1: input geometry survives
        let candidate = VideoCaps {
            par: Some(CapsValue::Fixed(Fraction::ONE)),
            ..open_range(64, 4096)
        };
        let got = fixate_geometry(&input(1280, 720, Fraction::ONE), &candidate).unwrap();
        assert_eq!((got.width, got.height), (1280, 720));
        assert_eq!(got.par, Some(Fraction::ONE));
    }
}
