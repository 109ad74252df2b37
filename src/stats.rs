//! Descriptive statistics over batch results.

use serde::{Deserialize, Serialize};

use crate::report::BatchRecord;

/// Descriptive statistics for a set of measurements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    /// Number of values.
    pub count: usize,
    /// Mean value.
    pub mean: f64,
    /// Median value.
    pub median: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    /// Minimum value.
    pub min: f64,
    /// Maximum value.
    pub max: f64,
}

impl Summary {
    /// Compute summary statistics for a slice of values.
    ///
    /// Non-finite values are skipped. Returns `None` if nothing is left.
    #[must_use]
    pub fn compute(values: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        let variance = sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / count as f64;

        Some(Self {
            count,
            mean,
            median: median_sorted(&sorted),
            std_dev: variance.sqrt(),
            min: sorted[0],
            max: sorted[count - 1],
        })
    }

    /// Summary of vegetation coverage across a batch.
    #[must_use]
    pub fn coverage(records: &[BatchRecord]) -> Option<Self> {
        let values: Vec<f64> = records
            .iter()
            .map(|r| r.result.vegetation_coverage)
            .collect();
        Self::compute(&values)
    }

    /// Summary of one index's mean across a batch, whole image or vegetation only.
    #[must_use]
    pub fn index(records: &[BatchRecord], key: &str, vegetation: bool) -> Option<Self> {
        let values: Vec<f64> = records
            .iter()
            .filter_map(|r| {
                let means = if vegetation {
                    &r.result.indices.vegetation
                } else {
                    &r.result.indices.whole
                };
                means.get(key)
            })
            .collect();
        Self::compute(&values)
    }
}

fn median_sorted(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
