//! The inference video filter element.
//!
//! [`InferenceFilter`] glues the pieces together: it owns the 2D
//! device, drives caps negotiation against a downstream peer, runs the
//! blit for every frame and keeps running statistics. Inference proper
//! (tensor setup, model execution, overlay drawing) lives behind the
//! [`mode::Engine`] dispatch and is configured, not implemented, here.

pub mod mode;
pub mod stats;

use crate::caps::{CapsSet, VideoCaps};
use crate::device::{Device2d, Rotation, Surface};
use crate::error::{Error, Result};
use crate::format::VideoFormat;
use crate::negotiation::{Negotiation, NegotiationError};
use mode::{Engine, InferenceMode};
use stats::FrameStats;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

/// User-facing filter properties.
#[derive(Clone, Debug)]
pub struct FilterConfig {
    /// Rotation applied to the output frame.
    pub rotation: Rotation,
    /// Processing strategy.
    pub mode: InferenceMode,
    /// Model file override; each mode has its own default.
    pub model: Option<PathBuf>,
    /// Label file override (object-detection mode only).
    pub label: Option<PathBuf>,
    /// Draw the statistics overlay.
    pub display_stats: bool,
    /// Run the model; disabling leaves the blit-and-stats path.
    pub enable_inference: bool,
    /// Prefer the platform neural-network API delegate.
    pub use_nnapi: bool,
    /// Interpreter thread count.
    pub num_threads: u32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            rotation: Rotation::None,
            mode: InferenceMode::default(),
            model: None,
            label: None,
            display_stats: true,
            enable_inference: true,
            use_nnapi: false,
            num_threads: 2,
        }
    }
}

/// A negotiating, blitting, inference-running filter stage.
pub struct InferenceFilter<D: Device2d> {
    device: D,
    config: FilterConfig,
    engine: Engine,
    stats: FrameStats,
    in_format: Option<VideoFormat>,
    out_format: Option<VideoFormat>,
    last_negotiated: Option<VideoFormat>,
}

impl<D: Device2d> InferenceFilter<D> {
    /// Create the filter, building the inference engine eagerly so a
    /// bad model or label path fails at construction, not mid-stream.
    pub fn new(device: D, config: FilterConfig) -> Result<Self> {
        crate::init();
        let engine = Engine::new(config.mode, config.model.as_deref(), config.label.as_deref())?;
        info!(device = device.name(), mode = %config.mode, "filter created");
        Ok(Self {
            device,
            config,
            engine,
            stats: FrameStats::new(),
            in_format: None,
            out_format: None,
            last_negotiated: None,
        })
    }

    /// Filter properties.
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// The engine built for the configured mode.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Running statistics.
    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Caps this filter can produce for the given input set.
    pub fn transform_caps(&self, caps: &CapsSet, filter: Option<&CapsSet>) -> CapsSet {
        Negotiation::new(self.device.hardware_class()).transform_caps(caps, filter)
    }

    /// Negotiate a concrete output format against a downstream peer.
    ///
    /// Each call is a fresh negotiation event; the previous result, if
    /// any, is passed along as a reuse hint.
    pub fn negotiate(&mut self, input: &VideoCaps, peer: &CapsSet) -> Result<VideoFormat> {
        let mut event = Negotiation::new(self.device.hardware_class());
        if let Some(hint) = self.last_negotiated {
            event = event.with_hint(hint);
        }
        let result = event.negotiate(input, peer, self.device.output_formats())?;
        self.last_negotiated = Some(result);
        Ok(result)
    }

    /// Install the negotiated input and output formats.
    ///
    /// Both must be fully fixed and the input format must be readable
    /// by the device.
    pub fn set_info(&mut self, input: &VideoCaps, output: &VideoCaps) -> Result<()> {
        let in_format = input
            .to_format()
            .ok_or_else(|| unfixed("input caps are not fully fixed"))?;
        let out_format = output
            .to_format()
            .ok_or_else(|| unfixed("output caps are not fully fixed"))?;
        if !self.device.input_formats().contains(&in_format.pixel_format) {
            return Err(unfixed(&format!(
                "{} cannot read {}",
                self.device.name(),
                in_format.pixel_format
            )));
        }
        debug!(input = %in_format.pixel_format, output = %out_format.pixel_format,
               "formats installed");
        self.in_format = Some(in_format);
        self.out_format = Some(out_format);
        Ok(())
    }

    /// True when the frame can flow through untouched.
    ///
    /// Interlaced input always goes through the device, so the blitter
    /// can deinterlace.
    pub fn is_passthrough(&self) -> bool {
        match (&self.in_format, &self.out_format) {
            (Some(i), Some(o)) => i == o && !i.interlace.is_interlaced(),
            _ => false,
        }
    }

    /// Map a downstream pointer position back into input coordinates.
    ///
    /// Navigation events arrive in output-surface coordinates; when the
    /// filter scales, the upstream source expects them unscaled.
    pub fn scale_navigation(&self, x: f64, y: f64) -> (f64, f64) {
        let (Some(i), Some(o)) = (&self.in_format, &self.out_format) else {
            return (x, y);
        };
        if i.width == o.width && i.height == o.height {
            return (x, y);
        }
        (
            x * i.width as f64 / o.width as f64,
            y * i.height as f64 / o.height as f64,
        )
    }

    /// Transform one frame: blit into the negotiated output format,
    /// run inference when enabled, update statistics.
    pub fn transform(&mut self, src: &Surface) -> Result<Surface> {
        let out_format = self
            .out_format
            .ok_or_else(|| unfixed("transform before set_info"))?;
        let in_format = self.in_format.ok_or_else(|| unfixed("transform before set_info"))?;
        if src.format != in_format {
            return Err(Error::Device(format!(
                "frame format {} does not match negotiated input {}",
                src.format.pixel_format, in_format.pixel_format
            )));
        }

        let mut dst = Surface::new(out_format);
        self.device.blit(src, &mut dst, self.config.rotation)?;

        if self.config.enable_inference {
            let started = Instant::now();
            self.run_inference(&mut dst)?;
            self.stats
                .record_inference_time(started.elapsed().as_secs_f64() * 1000.0);
        }
        self.stats.tick(out_format.width, out_format.height);
        Ok(dst)
    }

    // Tensor setup and model execution live outside this crate; the
    // dispatch point stays so per-mode hooks land in one place.
    fn run_inference(&mut self, _frame: &mut Surface) -> Result<()> {
        match &self.engine {
            Engine::Posenet { .. } | Engine::MobilenetSsd { .. } | Engine::Benchmark { .. } => {
                Ok(())
            }
        }
    }
}

fn unfixed(detail: &str) -> Error {
    Error::Negotiation(NegotiationError::UnsupportedInputFormat {
        detail: detail.into(),
    })
}
