//! Result types for single-image and batch analyses.
//!
//! These are the values handed back to callers and serialized to JSON or
//! CSV. All of them are immutable once produced.

use serde::{Deserialize, Serialize};

/// Mean value of one index over one pixel population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMean {
    /// Registry key of the index.
    pub key: String,

    /// Mean over the population. May be NaN or infinite for unguarded
    /// formulas on degenerate pixels; serialized as `null` in that case.
    #[serde(with = "finite_or_null")]
    pub mean: f64,
}

/// Per-index means in the order the indices were selected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexMeans(Vec<IndexMean>);

impl IndexMeans {
    /// Build from `(key, mean)` pairs, keeping their order.
    pub fn from_pairs<K: Into<String>>(pairs: impl IntoIterator<Item = (K, f64)>) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(key, mean)| IndexMean {
                    key: key.into(),
                    mean,
                })
                .collect(),
        )
    }

    /// Mean for a key, if that index was computed.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.iter().find(|m| m.key == key).map(|m| m.mean)
    }

    /// Keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|m| m.key.as_str())
    }

    /// Entries in order.
    pub fn iter(&self) -> impl Iterator<Item = &IndexMean> {
        self.0.iter()
    }

    /// Number of indices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no index was computed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Index means over the vegetation mask and over the whole image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexSummary {
    /// Means over pixels classified as vegetation (0 when there are none).
    pub vegetation: IndexMeans,
    /// Means over every pixel.
    pub whole: IndexMeans,
}

/// Outcome of analyzing one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Number of pixels in the image.
    pub total_pixels: u64,

    /// Number of pixels classified as vegetation.
    pub vegetation_pixels: u64,

    /// `100 * vegetation_pixels / total_pixels`.
    pub vegetation_coverage: f64,

    /// Aggregated index means.
    pub indices: IndexSummary,
}

/// Result of a single-image analysis together with the threshold applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAnalysis {
    /// Threshold on normalized excess green that was used.
    pub threshold: f64,

    /// The aggregated result.
    #[serde(flatten)]
    pub result: AnalysisResult,
}

/// One row of a batch: an image name and its result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRecord {
    /// Image name as supplied by the caller.
    pub filename: String,

    /// The aggregated result.
    #[serde(flatten)]
    pub result: AnalysisResult,
}

impl BatchRecord {
    /// Pair a filename with its result.
    #[must_use]
    pub fn new(filename: impl Into<String>, result: AnalysisResult) -> Self {
        Self {
            filename: filename.into(),
            result,
        }
    }
}

// JSON has no NaN or infinity, so non-finite means travel as null.
mod finite_or_null {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.is_finite().then_some(*value).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: Option<f64> = Option::deserialize(deserializer)?;
        Ok(value.unwrap_or(f64::NAN))
    }
}
