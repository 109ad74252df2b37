//! Pixel buffers accepted by the analysis engine.
//!
//! The engine never decodes files itself; callers hand it an already
//! decoded [`PixelBuffer`]. Alpha is carried along for mask rendering but
//! never enters index math.

use std::borrow::Cow;

use imgref::ImgVec;
use rgb::{RGB8, RGBA8};

use crate::error::{Error, Result};

/// Image data accepted by the engine.
///
/// Supports both `imgref::ImgVec` types and owned interleaved byte buffers.
#[derive(Debug, Clone)]
pub enum PixelBuffer {
    /// RGB8 image using imgref.
    Rgb8(ImgVec<RGB8>),

    /// RGBA8 image using imgref.
    Rgba8(ImgVec<RGBA8>),

    /// Interleaved RGB bytes with dimensions.
    RgbBytes {
        /// Pixel data in row-major order.
        data: Vec<u8>,
        /// Image width.
        width: usize,
        /// Image height.
        height: usize,
    },

    /// Interleaved RGBA bytes with dimensions.
    RgbaBytes {
        /// Pixel data in row-major order.
        data: Vec<u8>,
        /// Image width.
        width: usize,
        /// Image height.
        height: usize,
    },
}

fn area(width: usize, height: usize) -> Result<usize> {
    width
        .checked_mul(height)
        .ok_or_else(|| Error::invalid(format!("{width}x{height} is too large")))
}

/// Minimum backing length for a strided image.
fn strided_len(width: usize, height: usize, stride: usize) -> Option<usize> {
    match height {
        0 => Some(0),
        h => stride.checked_mul(h - 1)?.checked_add(width),
    }
}

impl PixelBuffer {
    /// Build a buffer from a plain pixel vector.
    ///
    /// `pixels` must hold exactly `width * height` entries and both
    /// dimensions must be non-zero.
    pub fn from_rgb(pixels: Vec<RGB8>, width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::invalid(format!("{width}x{height} has no pixels")));
        }
        let expected = area(width, height)?;
        if pixels.len() != expected {
            return Err(Error::invalid(format!(
                "{} pixels given for a {width}x{height} image",
                pixels.len()
            )));
        }
        Ok(Self::Rgb8(ImgVec::new(pixels, width, height)))
    }

    /// Image width.
    #[must_use]
    pub fn width(&self) -> usize {
        match self {
            Self::Rgb8(img) => img.width(),
            Self::Rgba8(img) => img.width(),
            Self::RgbBytes { width, .. } | Self::RgbaBytes { width, .. } => *width,
        }
    }

    /// Image height.
    #[must_use]
    pub fn height(&self) -> usize {
        match self {
            Self::Rgb8(img) => img.height(),
            Self::Rgba8(img) => img.height(),
            Self::RgbBytes { height, .. } | Self::RgbaBytes { height, .. } => *height,
        }
    }

    /// Number of pixels described by the dimensions.
    pub fn pixel_count(&self) -> Result<usize> {
        area(self.width(), self.height())
    }

    /// Check that the backing storage covers the declared dimensions.
    pub fn validate(&self) -> Result<()> {
        let (width, height) = (self.width(), self.height());
        let (len, needed) = match self {
            Self::Rgb8(img) => (img.buf().len(), strided_len(width, height, img.stride())),
            Self::Rgba8(img) => (img.buf().len(), strided_len(width, height, img.stride())),
            Self::RgbBytes { data, .. } => (data.len(), area(width, height)?.checked_mul(3)),
            Self::RgbaBytes { data, .. } => (data.len(), area(width, height)?.checked_mul(4)),
        };
        let needed = needed
            .ok_or_else(|| Error::invalid(format!("{width}x{height} is too large")))?;
        let exact = matches!(self, Self::RgbBytes { .. } | Self::RgbaBytes { .. });
        if len < needed || (exact && len != needed) {
            return Err(Error::invalid(format!(
                "buffer holds {len} elements but {width}x{height} needs {needed}"
            )));
        }
        Ok(())
    }

    /// Color channels of every pixel in row-major order.
    ///
    /// Borrows when the buffer is already a contiguous RGB8 image.
    pub fn rgb_pixels(&self) -> Result<Cow<'_, [RGB8]>> {
        self.validate()?;
        let pixels = match self {
            Self::Rgb8(img) if img.stride() == img.width() => {
                Cow::Borrowed(&img.buf()[..img.width() * img.height()])
            }
            Self::Rgb8(img) => Cow::Owned(img.pixels().collect()),
            Self::Rgba8(img) => {
                Cow::Owned(img.pixels().map(|p| RGB8::new(p.r, p.g, p.b)).collect())
            }
            Self::RgbBytes { data, .. } => Cow::Owned(
                data.chunks_exact(3)
                    .map(|c| RGB8::new(c[0], c[1], c[2]))
                    .collect(),
            ),
            Self::RgbaBytes { data, .. } => Cow::Owned(
                data.chunks_exact(4)
                    .map(|c| RGB8::new(c[0], c[1], c[2]))
                    .collect(),
            ),
        };
        Ok(pixels)
    }

    /// Alpha of every pixel in row-major order; opaque when the buffer has none.
    pub fn alpha(&self) -> Result<Vec<u8>> {
        self.validate()?;
        Ok(match self {
            Self::Rgb8(_) | Self::RgbBytes { .. } => vec![u8::MAX; self.pixel_count()?],
            Self::Rgba8(img) => img.pixels().map(|p| p.a).collect(),
            Self::RgbaBytes { data, .. } => data.chunks_exact(4).map(|c| c[3]).collect(),
        })
    }
}

/// Chromatic coordinates of a pixel: each channel divided by the channel sum.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormalizedRgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl NormalizedRgb {
    /// Construct directly from already-normalized components.
    #[must_use]
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Normalize a raw pixel. Black pixels map to `(0, 0, 0)`.
    #[inline]
    #[must_use]
    pub fn from_pixel(px: RGB8) -> Self {
        let sum = u32::from(px.r) + u32::from(px.g) + u32::from(px.b);
        if sum == 0 {
            return Self::default();
        }
        let sum = f64::from(sum);
        Self {
            r: f64::from(px.r) / sum,
            g: f64::from(px.g) / sum,
            b: f64::from(px.b) / sum,
        }
    }

    /// Excess green on normalized channels, in `[-1, 2]`.
    #[inline]
    #[must_use]
    pub fn excess_green(&self) -> f64 {
        2.0 * self.g - self.r - self.b
    }
}
