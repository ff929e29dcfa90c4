//! Raw video format descriptions.
//!
//! This module provides type-safe descriptions of the formats the
//! filter negotiates over: pixel layouts with their loss-relevant
//! properties, and the fully fixed [`VideoFormat`] a negotiation event
//! produces.
//!
//! # Design Principles
//!
//! - **Type safety**: Closed enums instead of stringly-typed formats
//! - **Zero-cost**: Small, Copy types wherever possible
//! - **Static metadata**: Per-format properties come from a const table

use crate::fraction::Fraction;

/// Pixel formats (color space and memory layout).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[repr(u8)]
pub enum PixelFormat {
    // ========================================================================
    // YUV 4:2:0 formats (most common)
    // ========================================================================
    /// YUV 4:2:0 planar (Y plane, then U plane, then V plane).
    #[default]
    I420 = 0,
    /// YUV 4:2:0 semi-planar (Y plane, then interleaved UV plane).
    /// Common for hardware decoders and blitters.
    Nv12,
    /// YUV 4:2:0 semi-planar, 10-bit packed little endian.
    /// Produced by 10-bit hardware decoders.
    Nv12_10Le,
    /// YUV 4:2:0 planar, 10-bit little endian.
    I420_10Le,
    /// YUV 4:2:0 semi-planar, 10-bit in 16-bit containers.
    P010,

    // ========================================================================
    // YUV 4:2:2 formats (broadcast quality)
    // ========================================================================
    /// YUV 4:2:2 planar.
    I422,
    /// YUV 4:2:2 packed (Y0 U Y1 V).
    Yuyv,
    /// YUV 4:2:2 packed (U Y0 V Y1).
    Uyvy,

    // ========================================================================
    // YUV 4:4:4 formats (full chroma)
    // ========================================================================
    /// YUV 4:4:4 planar.
    I444,

    // ========================================================================
    // RGB formats
    // ========================================================================
    /// RGB 8-bit per channel, packed (24 bits/pixel).
    Rgb24,
    /// RGBA 8-bit per channel, packed (32 bits/pixel).
    Rgba,
    /// BGR 8-bit per channel, packed (24 bits/pixel).
    Bgr24,
    /// BGRA 8-bit per channel, packed (32 bits/pixel).
    Bgra,
    /// ARGB 8-bit per channel, packed (32 bits/pixel).
    Argb,
    /// 8-bit paletted RGB.
    Rgb8p,

    // ========================================================================
    // Grayscale formats
    // ========================================================================
    /// 8-bit grayscale.
    Gray8,
    /// 16-bit grayscale little endian.
    Gray16Le,
}

/// Color model class of a pixel format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorModel {
    /// Luma/chroma formats.
    Yuv,
    /// Red/green/blue formats.
    Rgb,
    /// Single-component luminance.
    Gray,
}

/// Loss-relevant properties of a pixel format.
///
/// The conversion-cost model compares these fields between source and
/// candidate formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatInfo {
    /// Color model class.
    pub color: ColorModel,
    /// Whether the format carries an alpha channel.
    pub alpha: bool,
    /// Whether the format is palette-indexed.
    pub palette: bool,
    /// Component bit depth.
    pub bits: u8,
    /// Horizontal chroma subsampling shift (log2) of the chroma plane.
    pub w_sub: u8,
    /// Vertical chroma subsampling shift (log2) of the chroma plane.
    pub h_sub: u8,
}

const fn fi(
    color: ColorModel,
    alpha: bool,
    palette: bool,
    bits: u8,
    w_sub: u8,
    h_sub: u8,
) -> FormatInfo {
    FormatInfo {
        color,
        alpha,
        palette,
        bits,
        w_sub,
        h_sub,
    }
}

impl PixelFormat {
    /// Loss-relevant properties of this format.
    pub const fn info(&self) -> FormatInfo {
        use ColorModel::*;
        match self {
            Self::I420 => fi(Yuv, false, false, 8, 1, 1),
            Self::Nv12 => fi(Yuv, false, false, 8, 1, 1),
            Self::Nv12_10Le => fi(Yuv, false, false, 10, 1, 1),
            Self::I420_10Le => fi(Yuv, false, false, 10, 1, 1),
            Self::P010 => fi(Yuv, false, false, 10, 1, 1),
            Self::I422 => fi(Yuv, false, false, 8, 1, 0),
            Self::Yuyv => fi(Yuv, false, false, 8, 1, 0),
            Self::Uyvy => fi(Yuv, false, false, 8, 1, 0),
            Self::I444 => fi(Yuv, false, false, 8, 0, 0),
            Self::Rgb24 | Self::Bgr24 => fi(Rgb, false, false, 8, 0, 0),
            Self::Rgba | Self::Bgra | Self::Argb => fi(Rgb, true, false, 8, 0, 0),
            Self::Rgb8p => fi(Rgb, false, true, 8, 0, 0),
            Self::Gray8 => fi(Gray, false, false, 8, 0, 0),
            Self::Gray16Le => fi(Gray, false, false, 16, 0, 0),
        }
    }

    /// Short lowercase name, matching common caps-string spellings.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::I420 => "i420",
            Self::Nv12 => "nv12",
            Self::Nv12_10Le => "nv12-10le",
            Self::I420_10Le => "i420-10le",
            Self::P010 => "p010",
            Self::I422 => "i422",
            Self::Yuyv => "yuyv",
            Self::Uyvy => "uyvy",
            Self::I444 => "i444",
            Self::Rgb24 => "rgb24",
            Self::Rgba => "rgba",
            Self::Bgr24 => "bgr24",
            Self::Bgra => "bgra",
            Self::Argb => "argb",
            Self::Rgb8p => "rgb8p",
            Self::Gray8 => "gray8",
            Self::Gray16Le => "gray16-le",
        }
    }

    /// Is this a YUV format?
    #[inline]
    pub const fn is_yuv(&self) -> bool {
        matches!(self.info().color, ColorModel::Yuv)
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Interlace mode of a stream.
///
/// Informational for the negotiation core; the filter disables
/// passthrough for the interlaced modes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum InterlaceMode {
    /// Frames are whole progressive pictures.
    #[default]
    Progressive,
    /// Both fields interleaved in one buffer.
    Interleaved,
    /// Progressive and interlaced content mixed; per-buffer flags decide.
    Mixed,
    /// One field per buffer.
    Alternate,
}

impl InterlaceMode {
    /// True for modes that carry field-based content.
    pub const fn is_interlaced(&self) -> bool {
        matches!(self, Self::Interleaved | Self::Mixed)
    }
}

/// Fully fixed video format (Copy).
///
/// Every negotiation event ends with one of these on the output side,
/// or with an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VideoFormat {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel format (color space and layout).
    pub pixel_format: PixelFormat,
    /// Pixel aspect ratio; `1/1` means square pixels.
    pub par: Fraction,
    /// Interlace mode.
    pub interlace: InterlaceMode,
}

impl VideoFormat {
    /// Create a progressive, square-pixel format.
    pub const fn new(width: u32, height: u32, pixel_format: PixelFormat) -> Self {
        Self {
            width,
            height,
            pixel_format,
            par: Fraction::ONE,
            interlace: InterlaceMode::Progressive,
        }
    }

    /// Set the pixel aspect ratio.
    pub fn with_par(mut self, par: Fraction) -> Self {
        self.par = par;
        self
    }

    /// Set the interlace mode.
    pub fn with_interlace(mut self, interlace: InterlaceMode) -> Self {
        self.interlace = interlace;
        self
    }

    /// Display aspect ratio implied by dimensions and PAR.
    pub fn dar(&self) -> Fraction {
        Fraction::from_ratio(
            self.width as u64 * self.par.num() as u64,
            self.height.max(1) as u64 * self.par.den() as u64,
        )
    }

    /// Frame size in bytes at this format (tightly packed).
    pub const fn frame_size(&self) -> usize {
        let pixels = self.width as usize * self.height as usize;
        match self.pixel_format {
            // YUV 4:2:0 (1.5 bytes per pixel)
            PixelFormat::I420 | PixelFormat::Nv12 => pixels * 3 / 2,
            // YUV 4:2:0 10-bit in 16-bit containers
            PixelFormat::I420_10Le | PixelFormat::P010 => pixels * 3,
            // 10-bit packed: 4 samples in 5 bytes, 1.5 samples per pixel
            PixelFormat::Nv12_10Le => pixels * 15 / 8,
            // YUV 4:2:2 (2 bytes per pixel)
            PixelFormat::I422 | PixelFormat::Yuyv | PixelFormat::Uyvy => pixels * 2,
            // YUV 4:4:4
            PixelFormat::I444 => pixels * 3,
            // RGB (3 or 4 bytes per pixel)
            PixelFormat::Rgb24 | PixelFormat::Bgr24 => pixels * 3,
            PixelFormat::Rgba | PixelFormat::Bgra | PixelFormat::Argb => pixels * 4,
            // Paletted: one index byte per pixel (palette stored aside)
            PixelFormat::Rgb8p => pixels,
            // Grayscale
            PixelFormat::Gray8 => pixels,
            PixelFormat::Gray16Le => pixels * 2,
        }
    }
}
