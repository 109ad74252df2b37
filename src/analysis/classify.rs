//! Single-pass pixel classification and index accumulation.
//!
//! The buffer is cut into fixed-size chunks. Each chunk yields partial
//! sums and the partials are merged in chunk order, so the result is the
//! same whether the chunks run on one thread or many.

use imgref::ImgVec;
use rayon::prelude::*;
use rgb::{RGB8, RGBA8};

use crate::error::{Error, Result};
use crate::indices::{IndexDefinition, IndexSelection};
use crate::pixels::{NormalizedRgb, PixelBuffer};

/// Pixels per work unit.
pub const CHUNK_PIXELS: usize = 1 << 16;

/// Raw counts and per-index sums for one image (or one chunk of it).
///
/// Sum vectors are indexed by position in the [`IndexSelection`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClassSums {
    pub total_pixels: u64,
    pub vegetation_pixels: u64,
    pub whole: Vec<f64>,
    pub vegetation: Vec<f64>,
}

impl ClassSums {
    fn zeroed(len: usize) -> Self {
        Self {
            total_pixels: 0,
            vegetation_pixels: 0,
            whole: vec![0.0; len],
            vegetation: vec![0.0; len],
        }
    }

    fn merge(mut self, other: &Self) -> Self {
        self.total_pixels += other.total_pixels;
        self.vegetation_pixels += other.vegetation_pixels;
        for (acc, v) in self.whole.iter_mut().zip(&other.whole) {
            *acc += v;
        }
        for (acc, v) in self.vegetation.iter_mut().zip(&other.vegetation) {
            *acc += v;
        }
        self
    }
}

#[inline]
fn is_vegetation(px: NormalizedRgb, threshold: f64) -> bool {
    px.excess_green() >= threshold
}

fn accumulate(pixels: &[RGB8], threshold: f64, defs: &[&'static IndexDefinition]) -> ClassSums {
    let mut sums = ClassSums::zeroed(defs.len());
    sums.total_pixels = pixels.len() as u64;
    for &px in pixels {
        let n = NormalizedRgb::from_pixel(px);
        let veg = is_vegetation(n, threshold);
        if veg {
            sums.vegetation_pixels += 1;
        }
        for (i, def) in defs.iter().enumerate() {
            let v = def.evaluate(n);
            sums.whole[i] += v;
            if veg {
                sums.vegetation[i] += v;
            }
        }
    }
    sums
}

/// Classify every pixel against `threshold` and sum the selected indices
/// over the whole image and over the vegetation pixels.
pub fn classify_pixels(
    buffer: &PixelBuffer,
    threshold: f64,
    selection: &IndexSelection,
    parallel: bool,
) -> Result<ClassSums> {
    let pixels = buffer.rgb_pixels()?;
    let defs = selection.definitions();

    let partials: Vec<ClassSums> = if parallel {
        pixels
            .par_chunks(CHUNK_PIXELS)
            .map(|chunk| accumulate(chunk, threshold, defs))
            .collect()
    } else {
        pixels
            .chunks(CHUNK_PIXELS)
            .map(|chunk| accumulate(chunk, threshold, defs))
            .collect()
    };

    let sums = partials
        .iter()
        .fold(ClassSums::zeroed(defs.len()), |acc, part| acc.merge(part));

    tracing::debug!(
        threshold,
        total = sums.total_pixels,
        vegetation = sums.vegetation_pixels,
        chunks = partials.len(),
        "classified pixels"
    );
    Ok(sums)
}

/// Per-pixel vegetation flags for visualization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VegetationMask {
    width: usize,
    height: usize,
    mask: Vec<bool>,
}

impl VegetationMask {
    /// Mask width.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Mask height.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major flags.
    #[must_use]
    pub fn as_slice(&self) -> &[bool] {
        &self.mask
    }

    /// Flag at `(x, y)`.
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Option<bool> {
        (x < self.width && y < self.height).then(|| self.mask[y * self.width + x])
    }

    /// Number of vegetation pixels.
    #[must_use]
    pub fn vegetation_pixels(&self) -> usize {
        self.mask.iter().filter(|&&v| v).count()
    }

    /// Percentage of vegetation pixels; 0 for an empty mask.
    #[must_use]
    pub fn coverage(&self) -> f64 {
        if self.mask.is_empty() {
            0.0
        } else {
            100.0 * self.vegetation_pixels() as f64 / self.mask.len() as f64
        }
    }

    /// Render as white vegetation on black, carrying over `alpha`.
    pub fn to_rgba(&self, alpha: &[u8]) -> Result<ImgVec<RGBA8>> {
        if self.mask.is_empty() {
            return Err(Error::invalid("cannot render an empty mask"));
        }
        if alpha.len() != self.mask.len() {
            return Err(Error::invalid(format!(
                "alpha has {} values for a mask of {} pixels",
                alpha.len(),
                self.mask.len()
            )));
        }
        let render = |(&veg, &a): (&bool, &u8)| {
            let v = if veg { u8::MAX } else { 0 };
            RGBA8::new(v, v, v, a)
        };
        let pixels = self.mask.iter().zip(alpha).map(render).collect();
        Ok(ImgVec::new(pixels, self.width, self.height))
    }
}

/// Build the vegetation mask for a buffer at a given threshold.
pub fn classify_mask(buffer: &PixelBuffer, threshold: f64) -> Result<VegetationMask> {
    let pixels = buffer.rgb_pixels()?;
    let is_veg = |&px: &RGB8| is_vegetation(NormalizedRgb::from_pixel(px), threshold);
    let mask = pixels.par_iter().map(is_veg).collect();
    Ok(VegetationMask {
        width: buffer.width(),
        height: buffer.height(),
        mask,
    })
}
