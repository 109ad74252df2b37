//! Configuration for analyses.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::indices::IndexSelection;
use crate::threshold::ThresholdMethod;

/// Settings shared by single-image and batch analyses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// How the vegetation threshold is chosen.
    pub threshold: ThresholdMethod,

    /// Which indices to compute, in output order.
    pub indices: IndexSelection,

    /// Spread pixel work and batch images across the rayon pool.
    pub parallel: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            threshold: ThresholdMethod::Auto,
            indices: IndexSelection::all(),
            parallel: true,
        }
    }
}

impl AnalysisConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Check invariants that deserialization alone cannot enforce.
    ///
    /// Only the threshold needs checking here: an empty index list is
    /// already rejected when the selection is built or deserialized.
    pub fn validate(&self) -> Result<()> {
        self.threshold.validate()
    }

    /// Load and validate a JSON configuration file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Pretty JSON form, suitable for [`AnalysisConfig::from_json_file`].
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Builder for [`AnalysisConfig`].
#[derive(Debug, Default)]
pub struct AnalysisConfigBuilder {
    threshold: Option<ThresholdMethod>,
    indices: Option<IndexSelection>,
    parallel: Option<bool>,
}

impl AnalysisConfigBuilder {
    /// Set the threshold method.
    #[must_use]
    pub fn threshold(mut self, method: ThresholdMethod) -> Self {
        self.threshold = Some(method);
        self
    }

    /// Use a fixed threshold; validated by [`build`](Self::build).
    #[must_use]
    pub fn fixed_threshold(self, value: f64) -> Self {
        self.threshold(ThresholdMethod::Fixed(value))
    }

    /// Set the index selection.
    #[must_use]
    pub fn indices(mut self, indices: IndexSelection) -> Self {
        self.indices = Some(indices);
        self
    }

    /// Enable or disable parallel execution.
    #[must_use]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = Some(parallel);
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<AnalysisConfig> {
        let config = AnalysisConfig {
            threshold: self.threshold.unwrap_or_default(),
            indices: self.indices.unwrap_or_default(),
            parallel: self.parallel.unwrap_or(true),
        };
        config.validate()?;
        Ok(config)
    }
}
