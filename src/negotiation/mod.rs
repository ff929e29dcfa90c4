//! Format negotiation: one fixed input, one set of alternatives out.
//!
//! A negotiation event takes the upstream side's fully fixed format and
//! the downstream side's capability set and produces exactly one
//! concrete output format, or fails. The work splits into three stages
//! consumed in order:
//!
//! 1. **Expansion** ([`expand`]/[`relax`]): build the candidate space,
//!    the device's supported formats as a template set, and the peer's
//!    constraints widened to everything the blitter can reach.
//! 2. **Selection** ([`select_format`]): score every candidate pixel
//!    format for conversion loss against the input and keep the
//!    cheapest.
//! 3. **Fixation** ([`fixate_geometry`]): pin width, height and pixel
//!    aspect ratio, preserving the input's display aspect ratio as far
//!    as the winning descriptor allows.
//!
//! [`Negotiation`] drives the three stages and tracks the two-state
//! lifecycle: an event is either still negotiating or terminally fixed.
//! There is no retry; the same inputs would deterministically reproduce
//! the same failure. A fresh event (a new `Negotiation` value) is the
//! only way to renegotiate, optionally seeded with the previous result
//! as a reuse hint.
//!
//! Everything here is pure, synchronous computation over in-memory
//! descriptors; it holds no locks and performs no I/O.

pub mod error;
pub mod expand;
pub mod fixate;
pub mod select;

pub use error::NegotiationError;
pub use expand::{expand, relax, relax_caps};
pub use fixate::{fixate_geometry, FixatedGeometry};
pub use select::{conversion_cost, select_format, Selection, FORBIDDEN};

use crate::caps::{CapsSet, VideoCaps};
use crate::device::HardwareClass;
use crate::format::{PixelFormat, VideoFormat};
use tracing::{debug, info};

/// Lifecycle of one negotiation event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum NegotiationState {
    /// Capability sets are still being intersected and relaxed.
    #[default]
    Negotiating,
    /// Terminal: a concrete format exists, or the event has failed.
    Fixed,
}

/// One negotiation event.
///
/// Single-shot: [`negotiate`](Self::negotiate) may run once; afterwards
/// the event is [`NegotiationState::Fixed`] and a new event must be
/// created for any renegotiation.
#[derive(Debug)]
pub struct Negotiation {
    class: HardwareClass,
    state: NegotiationState,
    hint: Option<VideoFormat>,
    result: Option<VideoFormat>,
}

impl Negotiation {
    /// Start a negotiation event for the given hardware class.
    pub fn new(class: HardwareClass) -> Self {
        Self {
            class,
            state: NegotiationState::Negotiating,
            hint: None,
            result: None,
        }
    }

    /// Seed the event with a previously negotiated format.
    ///
    /// The hint is only a preference: it is reused verbatim when the
    /// new candidate set still accepts it, its pixel format ties the
    /// minimum conversion cost for the new input, and it still
    /// preserves the input's display aspect ratio. It never overrides
    /// minimum-cost selection; otherwise it is ignored.
    pub fn with_hint(mut self, hint: VideoFormat) -> Self {
        self.hint = Some(hint);
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> NegotiationState {
        self.state
    }

    /// The negotiated format, once fixed.
    pub fn result(&self) -> Option<&VideoFormat> {
        self.result.as_ref()
    }

    /// Compute the caps this stage can produce for a given input set.
    ///
    /// Relaxes each input descriptor through the blitter and, when a
    /// peer filter is supplied, intersects filter-first so the peer's
    /// preference order wins.
    pub fn transform_caps(&self, caps: &CapsSet, filter: Option<&CapsSet>) -> CapsSet {
        let relaxed = relax(caps, self.class);
        match filter {
            Some(filter) => filter.intersect(&relaxed),
            None => relaxed,
        }
    }

    /// Run the full pipeline: expand, select, fixate.
    ///
    /// `input` must be fully fixed; `peer` is the downstream capability
    /// set; `device_formats` is the blitter's supported output list.
    pub fn negotiate(
        &mut self,
        input: &VideoCaps,
        peer: &CapsSet,
        device_formats: &[PixelFormat],
    ) -> Result<VideoFormat, NegotiationError> {
        if self.state == NegotiationState::Fixed {
            return Err(NegotiationError::Internal(
                "negotiation event already fixed; start a new event".into(),
            ));
        }
        // Terminal either way from here on.
        self.state = NegotiationState::Fixed;

        let input = input.to_format().ok_or_else(|| {
            NegotiationError::UnsupportedInputFormat {
                detail: "input caps are not fully fixed".into(),
            }
        })?;

        if peer.is_empty() {
            return Err(NegotiationError::EmptyCapsSet {
                context: "peer capability set",
            });
        }
        let template = expand(device_formats);
        if template.is_empty() {
            return Err(NegotiationError::EmptyCapsSet {
                context: "device format list",
            });
        }

        let relaxed = relax(&CapsSet::single(VideoCaps::from_fixed(&input)), self.class);
        let candidates = peer.intersect(&relaxed).intersect(&template);
        debug!(candidates = candidates.len(), "candidate set built");
        if candidates.is_empty() {
            return Err(NegotiationError::EmptyCapsSet {
                context: "candidate set",
            });
        }

        let selection = select_format(input.pixel_format, &candidates, self.class)?;

        // A previous result is only a preference; it must tie the
        // minimum conversion cost before it can be reused.
        if let Some(hint) = self.hint {
            let still_acceptable = candidates
                .iter()
                .any(|c| VideoCaps::from_fixed(&hint).is_subset_of(c));
            let ties_minimum = conversion_cost(input.pixel_format, hint.pixel_format, self.class)
                == selection.cost;
            if still_acceptable && ties_minimum && hint.dar() == input.dar() {
                info!(format = %hint.pixel_format, width = hint.width, height = hint.height,
                      "reusing previously negotiated format");
                self.result = Some(hint);
                return Ok(hint);
            }
        }
        let chosen = select::fixate_format(&candidates, selection).ok_or_else(|| {
            NegotiationError::Internal("selection index out of bounds".into())
        })?;

        let geometry = fixate_geometry(&input, &chosen)?;

        let result = VideoFormat {
            width: geometry.width,
            height: geometry.height,
            pixel_format: selection.format,
            par: geometry.effective_par(),
            interlace: input.interlace,
        };
        info!(format = %result.pixel_format, width = result.width, height = result.height,
              par = %result.par, cost = selection.cost, "negotiation fixed");
        self.result = Some(result);
        Ok(result)
    }
}
