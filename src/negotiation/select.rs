//! Conversion-cost scoring and pixel-format selection.
//!
//! The cost model rates how much information a format conversion
//! destroys. The selector scans a candidate set in order, scores every
//! candidate pixel format against the fixed input, and keeps the
//! cheapest; ties keep the first found so scan order decides.

use crate::caps::{CapsSet, CapsValue, VideoCaps};
use crate::device::HardwareClass;
use crate::format::{ColorModel, PixelFormat};
use crate::negotiation::error::NegotiationError;
use tracing::{debug, trace};

/// Sentinel cost for conversions the hardware cannot perform.
pub const FORBIDDEN: u32 = u32::MAX;

const SCORE_FORMAT_CHANGE: u32 = 1;
const SCORE_DEPTH_CHANGE: u32 = 1;
const SCORE_ALPHA_CHANGE: u32 = 1;
const SCORE_CHROMA_W_CHANGE: u32 = 1;
const SCORE_CHROMA_H_CHANGE: u32 = 1;
const SCORE_PALETTE_CHANGE: u32 = 1;

const SCORE_COLORSPACE_LOSS: u32 = 2; // RGB <-> YUV
const SCORE_DEPTH_LOSS: u32 = 4; // lower bit depth
const SCORE_ALPHA_LOSS: u32 = 8; // lose the alpha channel
const SCORE_CHROMA_W_LOSS: u32 = 16; // more horizontal sub-sampling
const SCORE_CHROMA_H_LOSS: u32 = 32; // more vertical sub-sampling
const SCORE_PALETTE_LOSS: u32 = 64; // convert to palette format
const SCORE_COLOR_LOSS: u32 = 128; // convert to GRAY

/// Score a conversion from `input` to `candidate`.
///
/// Zero means identity or lossless; [`FORBIDDEN`] means the hardware
/// refuses the pair. Independent penalties accumulate on top of a base
/// format-change cost of 1.
///
/// Fine-tiling engines carry an override that takes precedence over
/// everything below, including the identity rule: they detile 10-bit
/// semi-planar into NV12 for free, and accept no other source for NV12
/// output.
pub fn conversion_cost(input: PixelFormat, candidate: PixelFormat, class: HardwareClass) -> u32 {
    if class == HardwareClass::FineTiling && candidate == PixelFormat::Nv12 {
        return if input == PixelFormat::Nv12_10Le {
            0
        } else {
            FORBIDDEN
        };
    }

    if input == candidate {
        trace!("same format {input}");
        return 0;
    }

    let from = input.info();
    let to = candidate.info();
    let mut loss = SCORE_FORMAT_CHANGE;

    if from.palette != to.palette {
        loss += SCORE_PALETTE_CHANGE;
        if to.palette {
            loss += SCORE_PALETTE_LOSS;
        }
    }

    if from.color != to.color {
        loss += SCORE_COLORSPACE_LOSS;
        if to.color == ColorModel::Gray {
            loss += SCORE_COLOR_LOSS;
        }
    }

    if from.alpha != to.alpha {
        loss += SCORE_ALPHA_CHANGE;
        if from.alpha {
            loss += SCORE_ALPHA_LOSS;
        }
    }

    if from.h_sub != to.h_sub {
        loss += SCORE_CHROMA_H_CHANGE;
        if from.h_sub < to.h_sub {
            loss += SCORE_CHROMA_H_LOSS;
        }
    }
    if from.w_sub != to.w_sub {
        loss += SCORE_CHROMA_W_CHANGE;
        if from.w_sub < to.w_sub {
            loss += SCORE_CHROMA_W_LOSS;
        }
    }

    if from.bits != to.bits {
        loss += SCORE_DEPTH_CHANGE;
        if from.bits > to.bits {
            loss += SCORE_DEPTH_LOSS;
        }
    }

    trace!("{input} -> {candidate}, loss = {loss}");
    loss
}

/// The selector's outcome: which set entry won and with which format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    /// Index of the winning descriptor within the candidate set.
    pub index: usize,
    /// The chosen output pixel format.
    pub format: PixelFormat,
    /// Conversion cost of the chosen pair.
    pub cost: u32,
}

/// Pick the cheapest output pixel format from a candidate set.
///
/// Scans descriptors in order; within a list, candidates in list order.
/// The running minimum uses a strict comparison so the first cheapest
/// candidate wins, and the scan stops as soon as a zero-cost candidate
/// appears. An `Any` format constraint accepts the input itself.
pub fn select_format(
    input: PixelFormat,
    candidates: &CapsSet,
    class: HardwareClass,
) -> Result<Selection, NegotiationError> {
    if candidates.is_empty() {
        return Err(NegotiationError::EmptyCapsSet {
            context: "format selection",
        });
    }

    debug!("source format: {input}");

    let mut best: Option<Selection> = None;
    let mut consider = |best: &mut Option<Selection>, index, format| {
        let cost = conversion_cost(input, format, class);
        if cost != FORBIDDEN && best.map_or(true, |b| cost < b.cost) {
            *best = Some(Selection {
                index,
                format,
                cost,
            });
        }
    };

    'outer: for (index, caps) in candidates.iter().enumerate() {
        match &caps.pixel_format {
            CapsValue::Fixed(f) => consider(&mut best, index, *f),
            CapsValue::List(formats) => {
                for &f in formats {
                    consider(&mut best, index, f);
                    if matches!(best, Some(b) if b.cost == 0) {
                        break 'outer;
                    }
                }
            }
            // an unconstrained format accepts the input as-is
            CapsValue::Any => consider(&mut best, index, input),
            // format constraints are never ranges; nothing to score
            CapsValue::Range { .. } => {}
        }
        if matches!(best, Some(b) if b.cost == 0) {
            break;
        }
    }

    match best {
        Some(sel) => {
            debug!("out format {} (cost {})", sel.format, sel.cost);
            Ok(sel)
        }
        None => Err(NegotiationError::NoAcceptableFormat { input }),
    }
}

/// Write the winning format into its descriptor and drop the rest.
pub fn fixate_format(candidates: &CapsSet, selection: Selection) -> Option<VideoCaps> {
    let mut chosen = candidates.get(selection.index)?.clone();
    chosen.pixel_format = CapsValue::Fixed(selection.format);
    Some(chosen)
}
