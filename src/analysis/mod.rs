//! The single-image analysis pipeline.
//!
//! - [`classify`]: one pass over the pixels producing counts and sums
//! - [`aggregate`]: sums to means and coverage
//! - [`config`]: [`AnalysisConfig`] and its builder
//!
//! [`analyze`] chains threshold selection, classification and aggregation.

pub mod aggregate;
pub mod classify;
pub mod config;

pub use aggregate::aggregate;
pub use classify::{ClassSums, VegetationMask, classify_mask, classify_pixels};
pub use config::{AnalysisConfig, AnalysisConfigBuilder};

use crate::error::Result;
use crate::indices::IndexSelection;
use crate::pixels::PixelBuffer;
use crate::report::{AnalysisResult, ImageAnalysis};
use crate::threshold::compute_threshold;

/// Analyze a buffer against an already chosen threshold.
pub fn analyze_image(
    buffer: &PixelBuffer,
    threshold: f64,
    selection: &IndexSelection,
) -> Result<AnalysisResult> {
    analyze_with(buffer, threshold, selection, true)
}

fn analyze_with(
    buffer: &PixelBuffer,
    threshold: f64,
    selection: &IndexSelection,
    parallel: bool,
) -> Result<AnalysisResult> {
    let sums = classify_pixels(buffer, threshold, selection, parallel)?;
    aggregate(&sums, selection)
}

/// Choose the threshold per `config`, then classify and aggregate.
pub fn analyze(buffer: &PixelBuffer, config: &AnalysisConfig) -> Result<ImageAnalysis> {
    let threshold = compute_threshold(buffer, config.threshold)?;
    let result = analyze_with(buffer, threshold, &config.indices, config.parallel)?;
    Ok(ImageAnalysis { threshold, result })
}

#[cfg(test)]
mod tests {
    use rgb::RGB8;

    use super::*;
    use crate::error::Error;
    use crate::indices::lookup;
    use crate::pixels::NormalizedRgb;
    use crate::threshold::ThresholdMethod;

    fn config(threshold: ThresholdMethod, keys: &str) -> AnalysisConfig {
        AnalysisConfig::builder()
            .threshold(threshold)
            .indices(IndexSelection::parse(keys).unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn test_pure_green_is_full_coverage() {
        let buf = PixelBuffer::from_rgb(vec![RGB8::new(0, 255, 0); 9], 3, 3).unwrap();
        for tau in [-1.0, 0.0, 2.0 / 3.0, 1.0] {
            let result = analyze_image(&buf, tau, &IndexSelection::all()).unwrap();
            assert_eq!(result.vegetation_coverage, 100.0);
            assert_eq!(result.vegetation_pixels, 9);
        }
    }

    #[test]
    fn test_threshold_one_excludes_non_pure_green() {
        let buf = PixelBuffer::from_rgb(
            vec![
                RGB8::new(10, 250, 0),
                RGB8::new(0, 200, 5),
                RGB8::new(80, 90, 70),
            ],
            3,
            1,
        )
        .unwrap();
        let result = analyze(&buf, &config(ThresholdMethod::Fixed(1.0), "ExG")).unwrap();
        assert_eq!(result.threshold, 1.0);
        // (10, 250, 0) has ExG = 2 - 3 * 10/260 > 1, so only the grey-ish pixel misses
        assert_eq!(result.result.vegetation_pixels, 2);

        let dull = PixelBuffer::from_rgb(vec![RGB8::new(90, 120, 80); 4], 2, 2).unwrap();
        let result = analyze(&dull, &config(ThresholdMethod::Fixed(1.0), "ExG")).unwrap();
        assert_eq!(result.result.vegetation_coverage, 0.0);
        assert_eq!(result.result.indices.vegetation.get("ExG"), Some(0.0));
    }

    #[test]
    fn test_whole_mean_matches_independent_mean() {
        let pixels = vec![
            RGB8::new(10, 200, 30),
            RGB8::new(120, 90, 60),
            RGB8::new(0, 0, 0),
            RGB8::new(50, 60, 200),
        ];
        let buf = PixelBuffer::from_rgb(pixels.clone(), 2, 2).unwrap();
        let keys = ["INT", "RGRI", "ExGR", "GRVI", "VARI", "GLI"];
        let sel = IndexSelection::from_keys(&keys).unwrap();
        let result = analyze_image(&buf, 0.1, &sel).unwrap();

        for key in keys {
            let def = lookup(key).unwrap();
            let expected: f64 = pixels
                .iter()
                .map(|&p| def.evaluate(NormalizedRgb::from_pixel(p)))
                .sum::<f64>()
                / 4.0;
            let got = result.indices.whole.get(key).unwrap();
            assert!((got - expected).abs() < 1e-12, "{key}: {got} vs {expected}");
        }
    }

    #[test]
    fn test_vegetation_mean_covers_only_masked_pixels() {
        let buf = PixelBuffer::from_rgb(
            vec![RGB8::new(0, 255, 0), RGB8::new(100, 100, 100)],
            2,
            1,
        )
        .unwrap();
        let sel = IndexSelection::parse("NGI").unwrap();
        let result = analyze_image(&buf, 0.5, &sel).unwrap();
        assert_eq!(result.indices.vegetation.get("NGI"), Some(1.0));
        let whole = result.indices.whole.get("NGI").unwrap();
        assert!((whole - (1.0 + 1.0 / 3.0) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_black_pixel_makes_unguarded_means_nan() {
        let buf = PixelBuffer::from_rgb(
            vec![RGB8::new(0, 0, 0), RGB8::new(40, 160, 60)],
            2,
            1,
        )
        .unwrap();
        let sel = IndexSelection::parse("MGRVI,RGBVI,VEG,GLI").unwrap();
        let result = analyze_image(&buf, 0.5, &sel).unwrap();
        assert!(result.indices.whole.get("MGRVI").unwrap().is_nan());
        assert!(result.indices.whole.get("RGBVI").unwrap().is_nan());
        assert!(result.indices.whole.get("VEG").unwrap().is_nan());
        assert!(result.indices.whole.get("GLI").unwrap().is_finite());
        // the black pixel (ExG = 0) is below 0.5, so vegetation stays finite
        assert!(result.indices.vegetation.get("VEG").unwrap().is_finite());
    }

    #[test]
    fn test_selection_order_is_preserved() {
        let buf = PixelBuffer::from_rgb(vec![RGB8::new(30, 90, 40); 4], 2, 2).unwrap();
        let sel = IndexSelection::parse("VEG,INT,ExB").unwrap();
        let result = analyze_image(&buf, 0.0, &sel).unwrap();
        let whole: Vec<_> = result.indices.whole.keys().collect();
        let vegetation: Vec<_> = result.indices.vegetation.keys().collect();
        assert_eq!(whole, vec!["VEG", "INT", "ExB"]);
        assert_eq!(vegetation, whole);
    }

    #[test]
    fn test_empty_image_is_invalid() {
        let buf = PixelBuffer::RgbBytes {
            data: Vec::new(),
            width: 0,
            height: 0,
        };
        let err = analyze(&buf, &AnalysisConfig::default());
        assert!(matches!(err, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_short_buffer_is_rejected() {
        let short = PixelBuffer::Rgb8(imgref::ImgVec::new(vec![RGB8::new(0, 255, 0); 3], 2, 2));
        for config in [
            AnalysisConfig::default(),
            config(ThresholdMethod::Fixed(0.2), "ExG"),
        ] {
            let err = analyze(&short, &config);
            assert!(matches!(err, Err(Error::InvalidInput(_))));
        }
        assert!(matches!(
            classify_mask(&short, 0.0),
            Err(Error::InvalidInput(_))
        ));
    }
}
