//! Turn raw classification sums into per-index means and coverage.

use crate::analysis::classify::ClassSums;
use crate::error::{Error, Result};
use crate::indices::IndexSelection;
use crate::report::{AnalysisResult, IndexMeans, IndexSummary};

fn mean_or_zero(sum: f64, count: u64) -> f64 {
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Normalize sums into an [`AnalysisResult`].
///
/// Vegetation means are 0 when no pixel was classified as vegetation.
/// Non-finite means are passed through untouched.
pub fn aggregate(sums: &ClassSums, selection: &IndexSelection) -> Result<AnalysisResult> {
    if sums.total_pixels == 0 {
        return Err(Error::invalid("cannot aggregate an image with zero pixels"));
    }
    if sums.vegetation_pixels > sums.total_pixels {
        return Err(Error::invalid(format!(
            "{} vegetation pixels exceed {} total pixels",
            sums.vegetation_pixels, sums.total_pixels
        )));
    }
    if sums.whole.len() != selection.len() || sums.vegetation.len() != selection.len() {
        return Err(Error::invalid("sum vectors do not match the selection"));
    }

    let whole = selection
        .keys()
        .zip(&sums.whole)
        .map(|(k, &s)| (k, mean_or_zero(s, sums.total_pixels)));
    let vegetation = selection
        .keys()
        .zip(&sums.vegetation)
        .map(|(k, &s)| (k, mean_or_zero(s, sums.vegetation_pixels)));
    let whole = IndexMeans::from_pairs(whole);
    let vegetation = IndexMeans::from_pairs(vegetation);

    for m in whole.iter().chain(vegetation.iter()) {
        if !m.mean.is_finite() {
            tracing::warn!(index = %m.key, mean = m.mean, "non-finite index mean");
        }
    }

    Ok(AnalysisResult {
        total_pixels: sums.total_pixels,
        vegetation_pixels: sums.vegetation_pixels,
        vegetation_coverage: 100.0 * sums.vegetation_pixels as f64 / sums.total_pixels as f64,
        indices: IndexSummary { vegetation, whole },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sums(total: u64, veg: u64, whole: Vec<f64>, vegetation: Vec<f64>) -> ClassSums {
        ClassSums {
            total_pixels: total,
            vegetation_pixels: veg,
            whole,
            vegetation,
        }
    }

    #[test]
    fn test_means_and_coverage() {
        let sel = IndexSelection::parse("ExG,GLI").unwrap();
        let result = aggregate(&sums(8, 2, vec![4.0, 2.0], vec![3.0, 1.0]), &sel).unwrap();
        assert_eq!(result.total_pixels, 8);
        assert_eq!(result.vegetation_pixels, 2);
        assert_eq!(result.vegetation_coverage, 25.0);
        assert_eq!(result.indices.whole.get("ExG"), Some(0.5));
        assert_eq!(result.indices.whole.get("GLI"), Some(0.25));
        assert_eq!(result.indices.vegetation.get("ExG"), Some(1.5));
        assert_eq!(result.indices.vegetation.get("GLI"), Some(0.5));
    }

    #[test]
    fn test_no_vegetation_gives_zero_means() {
        let sel = IndexSelection::parse("VEG").unwrap();
        let result = aggregate(&sums(4, 0, vec![f64::NAN], vec![0.0]), &sel).unwrap();
        assert_eq!(result.vegetation_coverage, 0.0);
        assert_eq!(result.indices.vegetation.get("VEG"), Some(0.0));
        assert!(result.indices.whole.get("VEG").unwrap().is_nan());
    }

    #[test]
    fn test_zero_pixels_is_invalid() {
        let sel = IndexSelection::parse("ExG").unwrap();
        let err = aggregate(&sums(0, 0, vec![0.0], vec![0.0]), &sel);
        assert!(matches!(err, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_inconsistent_sums_are_invalid() {
        let sel = IndexSelection::parse("ExG").unwrap();
        assert!(aggregate(&sums(2, 3, vec![0.0], vec![0.0]), &sel).is_err());
        let mismatched = sums(2, 1, vec![0.0, 1.0], vec![0.0]);
        assert!(aggregate(&mismatched, &sel).is_err());
    }
}
