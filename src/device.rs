//! 2D acceleration device abstraction.
//!
//! The filter delegates blitting (scale, rotate, color convert) to a
//! hardware 2D engine. Different engine generations have different
//! alignment rules and format support; [`Device2d`] is the seam the
//! negotiation core and the transform path program against, and
//! [`MockDevice`] stands in for real hardware in tests.

use crate::error::{Error, Result};
use crate::format::{PixelFormat, VideoFormat};
use tracing::debug;

/// Hardware generation class of the 2D engine.
///
/// Tiling granularity drives both the minimum negotiable dimension and
/// a format-conversion special case (fine-tiling engines detile 10-bit
/// semi-planar output to 8-bit NV12 for free).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HardwareClass {
    /// Fine-grained tiler (DPU-style). Small minimum tile.
    FineTiling,
    /// Coarse tiler (GPU/PXP-style). Large minimum tile.
    Coarse,
}

impl HardwareClass {
    /// Smallest width/height the engine can produce.
    pub const fn min_dimension(&self) -> u32 {
        match self {
            Self::FineTiling => 8,
            Self::Coarse => 64,
        }
    }
}

/// Rotation applied during the blit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Rotation {
    /// No rotation.
    #[default]
    None,
    /// 90 degrees clockwise.
    Cw90,
    /// 180 degrees.
    Cw180,
    /// 270 degrees clockwise.
    Cw270,
    /// Horizontal mirror.
    HorizontalFlip,
    /// Vertical mirror.
    VerticalFlip,
}

impl Rotation {
    /// True when the rotation swaps width and height.
    pub const fn transposes(&self) -> bool {
        matches!(self, Self::Cw90 | Self::Cw270)
    }
}

/// Round `value` up to the next multiple of `align` (power of two).
///
/// Engines with stride or tile alignment rules use this when sizing
/// surfaces.
pub const fn align_up(value: u32, align: u32) -> u32 {
    (value + align - 1) & !(align - 1)
}

/// A frame the device can read from or write into.
#[derive(Debug)]
pub struct Surface {
    /// Format of the surface.
    pub format: VideoFormat,
    /// Pixel data, tightly packed per [`VideoFormat::frame_size`].
    pub data: Vec<u8>,
}

impl Surface {
    /// Allocate a zeroed surface for `format`.
    pub fn new(format: VideoFormat) -> Self {
        Self {
            data: vec![0; format.frame_size()],
            format,
        }
    }
}

/// A 2D blit engine: scale, rotate, and color-convert frames.
pub trait Device2d {
    /// Engine name for logs.
    fn name(&self) -> &str;

    /// Hardware generation class.
    fn hardware_class(&self) -> HardwareClass;

    /// Pixel formats the engine can read.
    fn input_formats(&self) -> &[PixelFormat];

    /// Pixel formats the engine can write.
    fn output_formats(&self) -> &[PixelFormat];

    /// Blit `src` into `dst`, scaling and converting as the surface
    /// formats demand, applying `rotation`.
    fn blit(&mut self, src: &Surface, dst: &mut Surface, rotation: Rotation) -> Result<()>;
}

/// Software stand-in for a hardware engine.
///
/// Supports the same format set on both sides and performs
/// nearest-neighbor scaling on the luma/first plane only; good enough
/// for negotiation and pipeline tests, not for display.
pub struct MockDevice {
    class: HardwareClass,
    formats: Vec<PixelFormat>,
}

impl MockDevice {
    /// A mock fine-tiling (DPU-class) engine.
    pub fn fine_tiling() -> Self {
        Self {
            class: HardwareClass::FineTiling,
            formats: vec![
                PixelFormat::Nv12,
                PixelFormat::Nv12_10Le,
                PixelFormat::I420,
                PixelFormat::Rgba,
                PixelFormat::Bgra,
                PixelFormat::Rgb24,
            ],
        }
    }

    /// A mock coarse-tiling (GPU-class) engine.
    pub fn coarse() -> Self {
        Self {
            class: HardwareClass::Coarse,
            formats: vec![
                PixelFormat::Nv12,
                PixelFormat::I420,
                PixelFormat::Rgba,
                PixelFormat::Bgra,
                PixelFormat::Rgb24,
                PixelFormat::Yuyv,
            ],
        }
    }
}

impl Device2d for MockDevice {
    fn name(&self) -> &str {
        match self.class {
            HardwareClass::FineTiling => "mock-dpu",
            HardwareClass::Coarse => "mock-gpu",
        }
    }

    fn hardware_class(&self) -> HardwareClass {
        self.class
    }

    fn input_formats(&self) -> &[PixelFormat] {
        &self.formats
    }

    fn output_formats(&self) -> &[PixelFormat] {
        &self.formats
    }

    fn blit(&mut self, src: &Surface, dst: &mut Surface, rotation: Rotation) -> Result<()> {
        if !self.formats.contains(&src.format.pixel_format) {
            return Err(Error::Device(format!(
                "{}: unsupported source format {}",
                self.name(),
                src.format.pixel_format
            )));
        }
        if !self.formats.contains(&dst.format.pixel_format) {
            return Err(Error::Device(format!(
                "{}: unsupported destination format {}",
                self.name(),
                dst.format.pixel_format
            )));
        }
        let (src_w, src_h) = (src.format.width.max(1), src.format.height.max(1));
        let (dst_w, dst_h) = (dst.format.width, dst.format.height);
        debug!(
            device = self.name(),
            src = %src.format.pixel_format,
            dst = %dst.format.pixel_format,
            ?rotation,
            "blit {}x{} -> {}x{}",
            src_w, src_h, dst_w, dst_h
        );

        // Nearest-neighbor on the first plane; chroma left zeroed.
        for y in 0..dst_h {
            for x in 0..dst_w {
                let (sx, sy) = match rotation {
                    Rotation::None => (x * src_w / dst_w.max(1), y * src_h / dst_h.max(1)),
                    Rotation::Cw180 => (
                        (dst_w - 1 - x) * src_w / dst_w.max(1),
                        (dst_h - 1 - y) * src_h / dst_h.max(1),
                    ),
                    Rotation::HorizontalFlip => (
                        (dst_w - 1 - x) * src_w / dst_w.max(1),
                        y * src_h / dst_h.max(1),
                    ),
                    Rotation::VerticalFlip => (
                        x * src_w / dst_w.max(1),
                        (dst_h - 1 - y) * src_h / dst_h.max(1),
                    ),
                    // Transposing rotations sample with axes swapped.
                    Rotation::Cw90 => (y * src_w / dst_h.max(1), x * src_h / dst_w.max(1)),
                    Rotation::Cw270 => (
                        (dst_h - 1 - y) * src_w / dst_h.max(1),
                        (dst_w - 1 - x) * src_h / dst_w.max(1),
                    ),
                };
                let si = (sy.min(src_h - 1) * src_w + sx.min(src_w - 1)) as usize;
                let di = (y * dst_w + x) as usize;
                if let (Some(&s), Some(d)) = (src.data.get(si), dst.data.get_mut(di)) {
                    *d = s;
                }
            }
        }
        Ok(())
    }
}
