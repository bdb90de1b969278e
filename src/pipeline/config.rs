//! Serializable configuration of an ecological analysis run.

use crate::beta::DistanceMetric;
use crate::differential::{DEFAULT_ALPHA, DEFAULT_PSEUDOCOUNT};
use crate::error::{EcoError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Optional low-abundance pre-filter applied before any analysis stage.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Minimum fraction of samples in which a feature is present.
    pub min_prevalence: f64,
    /// Minimum mean abundance across samples.
    pub min_abundance: f64,
}

/// Which numerical capabilities the run may use.
///
/// A disabled capability omits its stage from the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilityFlags {
    /// Symmetric eigendecomposition (beta diversity / PCoA).
    pub linear_algebra: bool,
    /// Rank-sum testing (differential abundance).
    pub statistics: bool,
}

impl Default for CapabilityFlags {
    fn default() -> Self {
        Self {
            linear_algebra: true,
            statistics: true,
        }
    }
}

/// Analysis configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Directory the result document is written to.
    pub output_dir: PathBuf,
    /// File name of the result document.
    pub output_file: String,
    /// Metadata column holding group labels.
    pub group_column: String,
    /// Reference group.
    pub group1: String,
    /// Comparison group.
    pub group2: String,
    pub distance_metric: DistanceMetric,
    /// Number of PCoA axes to keep.
    pub n_components: usize,
    /// Significance threshold for adjusted p-values.
    pub alpha: f64,
    /// Fold-change pseudocount.
    pub pseudocount: f64,
    pub filter: Option<FilterConfig>,
    pub capabilities: CapabilityFlags,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("data/analysis_results"),
            output_file: "ecological_analysis_results.json".to_string(),
            group_column: "sample_type".to_string(),
            group1: "non_medical".to_string(),
            group2: "medical_influenced".to_string(),
            distance_metric: DistanceMetric::BrayCurtis,
            n_components: 2,
            alpha: DEFAULT_ALPHA,
            pseudocount: DEFAULT_PSEUDOCOUNT,
            filter: None,
            capabilities: CapabilityFlags::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(EcoError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(EcoError::from)
    }

    /// Load from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Full path of the result document.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_file)
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.n_components == 0 {
            return Err(EcoError::InvalidParameter(
                "n_components must be at least 1".to_string(),
            ));
        }
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(EcoError::InvalidParameter(format!(
                "alpha must be in (0, 1], got {}",
                self.alpha
            )));
        }
        if !(self.pseudocount.is_finite() && self.pseudocount > 0.0) {
            return Err(EcoError::InvalidParameter(format!(
                "pseudocount must be positive, got {}",
                self.pseudocount
            )));
        }
        if let Some(filter) = &self.filter {
            if filter.min_prevalence < 0.0 || filter.min_abundance < 0.0 {
                return Err(EcoError::InvalidParameter(
                    "filter thresholds must be non-negative".to_string(),
                ));
            }
        }
        if self.output_file.is_empty() {
            return Err(EcoError::InvalidParameter(
                "output_file must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
