//! Batch analysis over an ordered list of images.
//!
//! Images are independent, so with `parallel` enabled they are spread over
//! the rayon pool. Results always come back in input order, and the first
//! failure discards the whole batch.

use rayon::prelude::*;

use crate::analysis::{AnalysisConfig, aggregate, classify_pixels};
use crate::error::{Error, Result};
use crate::pixels::PixelBuffer;
use crate::report::BatchRecord;
use crate::threshold::compute_threshold;

/// An image waiting to be analyzed.
#[derive(Debug, Clone)]
pub struct BatchImage {
    /// Name reported in the output record.
    pub filename: String,
    /// Decoded pixels.
    pub buffer: PixelBuffer,
}

impl BatchImage {
    /// Pair a name with a buffer.
    #[must_use]
    pub fn new(filename: impl Into<String>, buffer: PixelBuffer) -> Self {
        Self {
            filename: filename.into(),
            buffer,
        }
    }
}

fn run_one(
    image: &BatchImage,
    config: &AnalysisConfig,
    parallel_pixels: bool,
) -> Result<BatchRecord> {
    let wrap = |source: Error| Error::BatchAborted {
        filename: image.filename.clone(),
        source: Box::new(source),
    };
    let threshold = compute_threshold(&image.buffer, config.threshold).map_err(wrap)?;
    let sums = classify_pixels(&image.buffer, threshold, &config.indices, parallel_pixels)
        .map_err(wrap)?;
    let result = aggregate(&sums, &config.indices).map_err(wrap)?;
    tracing::debug!(
        filename = %image.filename,
        threshold,
        coverage = result.vegetation_coverage,
        "analyzed image"
    );
    Ok(BatchRecord::new(image.filename.clone(), result))
}

/// Analyze every image with the same settings.
///
/// Returns one record per image in input order. Any failure aborts the
/// run with [`Error::BatchAborted`] naming the offending image.
pub fn run_batch(images: &[BatchImage], config: &AnalysisConfig) -> Result<Vec<BatchRecord>> {
    config.validate()?;
    tracing::info!(
        images = images.len(),
        threshold = %config.threshold,
        indices = config.indices.len(),
        "starting batch"
    );

    // Parallelism goes to the image level; pixel work inside stays sequential.
    let records: Vec<BatchRecord> = if config.parallel {
        images
            .par_iter()
            .map(|image| run_one(image, config, false))
            .collect::<Result<_>>()?
    } else {
        images
            .iter()
            .map(|image| run_one(image, config, false))
            .collect::<Result<_>>()?
    };

    tracing::info!(records = records.len(), "batch finished");
    Ok(records)
}
