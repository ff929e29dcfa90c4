//! # Prism
//!
//! A hardware-accelerated video filter stage: caps negotiation, format
//! fixation and 2D-engine transforms for inference pipelines.
//!
//! Prism answers one question deterministically: given a fixed input
//! format and a downstream peer that accepts many, which single
//! concrete output format should the hardware produce? The answer
//! minimizes conversion loss and preserves the input's display aspect
//! ratio as far as the peer's constraints allow.
//!
//! ## Quick Start
//!
//! ```rust
//! use prism::prelude::*;
//!
//! // A coarse-tiling (GPU-class) device and default filter config
//! let mut filter = InferenceFilter::new(
//!     MockDevice::coarse(),
//!     FilterConfig { enable_inference: false, ..FilterConfig::default() },
//! )?;
//!
//! // Fixed 1080p input, downstream takes anything up to 4K
//! let input = VideoCaps::from_fixed(&VideoFormat::new(1920, 1080, PixelFormat::I420));
//! let peer = CapsSet::single(VideoCaps::any().with_size_range(64, 4096, 64, 4096));
//!
//! let out = filter.negotiate(&input, &peer)?;
//! assert_eq!((out.width, out.height), (1920, 1080));
//! # Ok::<(), prism::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod caps;
pub mod device;
pub mod error;
pub mod filter;
pub mod format;
pub mod fraction;
pub mod negotiation;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::caps::{CapsSet, CapsValue, VideoCaps};
    pub use crate::device::{Device2d, HardwareClass, MockDevice, Rotation, Surface};
    pub use crate::error::{Error, Result};
    pub use crate::filter::mode::InferenceMode;
    pub use crate::filter::{FilterConfig, InferenceFilter};
    pub use crate::format::{InterlaceMode, PixelFormat, VideoFormat};
    pub use crate::fraction::Fraction;
    pub use crate::negotiation::{Negotiation, NegotiationState};
}

pub use error::{Error, Result};

use std::sync::Once;

static INIT: Once = Once::new();

/// Idempotent process-wide initialization.
///
/// Safe to call from any thread, any number of times; only the first
/// call does work. Entry points call it on construction, so explicit
/// calls are only needed when using the negotiation modules directly
/// and wanting the startup log line.
pub fn init() {
    INIT.call_once(|| {
        tracing::debug!(version = env!("CARGO_PKG_VERSION"), "prism initialized");
    });
}
