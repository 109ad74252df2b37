//! # vegmask
//!
//! Vegetation masks and RGB vegetation indices for plain color photos.
//!
//! Each pixel is classified as vegetation when its Excess Green value
//! reaches a threshold, either fixed or picked by Otsu's method over the
//! image's ExG histogram. Sixteen RGB indices are then averaged over the
//! vegetation pixels and over the whole image. Batches of images produce
//! ordered records that export to a fixed CSV layout.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vegmask::{AnalysisConfig, BatchImage, IndexSelection, run_batch, write_csv};
//!
//! let config = AnalysisConfig::builder()
//!     .indices(IndexSelection::parse("ExG,GLI,VARI")?)
//!     .build()?;
//!
//! let images = vec![BatchImage::new("plot_01.jpg", buffer)];
//! let records = run_batch(&images, &config)?;
//! write_csv("vegetation.csv".as_ref(), &records, &config.indices, config.threshold)?;
//! ```
//!
//! ## Modules
//!
//! - [`pixels`]: Pixel buffers and normalized chromatic coordinates
//! - [`indices`]: The index registry and index selections
//! - [`threshold`]: Fixed and Otsu thresholds on Excess Green
//! - [`analysis`]: Pixel classification, masks and per-image aggregation
//! - [`batch`]: Ordered, optionally parallel batch runs
//! - [`export`] / [`import`]: CSV export and re-import
//! - [`stats`]: Summary statistics over batch results
//! - [`decode`]: JPEG/PNG decoding and image discovery

pub mod analysis;
pub mod batch;
#[cfg(any(feature = "jpeg-decode", feature = "png-decode"))]
pub mod decode;
pub mod error;
pub mod export;
pub mod import;
pub mod indices;
pub mod pixels;
pub mod report;
pub mod stats;
pub mod threshold;

// Re-export commonly used types
pub use analysis::{
    AnalysisConfig, AnalysisConfigBuilder, VegetationMask, analyze, analyze_image, classify_mask,
};
pub use batch::{BatchImage, run_batch};
pub use error::{Error, Result};
pub use export::{default_export_filename, export_csv, today_export_filename, write_csv};
pub use import::{ImportedReport, parse_csv, read_csv};
pub use indices::{IndexDefinition, IndexSelection, lookup, registry};
pub use pixels::{NormalizedRgb, PixelBuffer};
pub use report::{AnalysisResult, BatchRecord, ImageAnalysis, IndexMeans, IndexSummary};
pub use stats::Summary;
pub use threshold::{ThresholdMethod, compute_threshold};
