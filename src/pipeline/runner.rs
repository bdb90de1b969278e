//! Orchestrator running the full ecological analysis.

use super::capability::Capabilities;
use super::config::AnalysisConfig;
use crate::alpha::{alpha_diversity, DiversityReport};
use crate::beta::{distance_matrix_for, pcoa, DistanceMatrix, DistanceMetric, PcoaCoordinates};
use crate::data::{AbundanceMatrix, FeatureResult, Metadata};
use crate::differential::{compare_groups_with, GroupComparison};
use crate::error::Result;
use crate::filter::filter_low_abundance;
use crate::normalize::{normalize_by_total_reads, scale};
use log::{info, warn};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Between-sample section of the result document.
#[derive(Debug, Clone, Serialize)]
pub struct BetaDiversityResult {
    pub metric: DistanceMetric,
    pub distance_matrix: DistanceMatrix,
    pub pcoa_coordinates: PcoaCoordinates,
    pub explained_variance: Vec<f64>,
}

/// Aggregate output of one analysis run.
///
/// Stages that did not run are absent from the serialized document.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    /// Samples in the analyzed table, after normalization and pre-filtering.
    pub samples_analyzed: usize,
    /// Features left after the optional pre-filter. Smaller than the loaded
    /// table's row count whenever `filter` removes features.
    pub features_analyzed: usize,
    pub alpha_diversity: DiversityReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beta_diversity: Option<BetaDiversityResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub differential_abundance: Option<Vec<FeatureResult>>,
}

/// Drives alpha diversity, beta diversity and differential abundance over
/// one abundance table.
#[derive(Debug, Clone)]
pub struct EcologicalAnalysis {
    config: AnalysisConfig,
    capabilities: Capabilities,
    total_reads: Option<HashMap<String, u64>>,
}

impl Default for EcologicalAnalysis {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

impl EcologicalAnalysis {
    /// Create an analysis whose capabilities follow `config.capabilities`.
    pub fn new(config: AnalysisConfig) -> Self {
        let capabilities = Capabilities::from_flags(&config.capabilities);
        Self {
            config,
            capabilities,
            total_reads: None,
        }
    }

    /// Replace the resolved capabilities.
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Normalize to reads per million with these per-sample totals first.
    pub fn with_total_reads(mut self, total_reads: HashMap<String, u64>) -> Self {
        self.total_reads = Some(total_reads);
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Run the in-memory stages on a loaded table.
    pub fn analyze(&self, matrix: &AbundanceMatrix, metadata: &Metadata) -> Result<AnalysisResult> {
        self.config.validate()?;

        let mut working = Cow::Borrowed(matrix);
        if let Some(total_reads) = &self.total_reads {
            working = Cow::Owned(normalize_by_total_reads(&working, total_reads, scale::RPM)?);
        }
        if let Some(filter) = &self.config.filter {
            working = Cow::Owned(filter_low_abundance(
                &working,
                filter.min_prevalence,
                filter.min_abundance,
            ));
        }
        let matrix: &AbundanceMatrix = &working;

        let unlabeled = matrix
            .sample_ids()
            .iter()
            .filter(|sid| !metadata.has_sample(sid))
            .count();
        if unlabeled > 0 {
            warn!("{} of {} samples have no metadata", unlabeled, matrix.n_samples());
        }

        info!("[2/5] Alpha diversity for {} samples", matrix.n_samples());
        let alpha = alpha_diversity(matrix);

        let beta = match self.capabilities.eigensolver() {
            Some(solver) => {
                info!(
                    "[3/5] Beta diversity ({}) and PCoA with {} components",
                    self.config.distance_metric, self.config.n_components
                );
                let dm = distance_matrix_for(matrix, self.config.distance_metric)?;
                let ordination = pcoa(&dm, self.config.n_components, solver)?;
                Some(BetaDiversityResult {
                    metric: self.config.distance_metric,
                    distance_matrix: dm,
                    pcoa_coordinates: ordination.coordinates,
                    explained_variance: ordination.explained_variance,
                })
            }
            None => {
                info!("[3/5] Beta diversity skipped: no eigensolver available");
                None
            }
        };

        let differential = match self.capabilities.rank_sum() {
            Some(test) if metadata.has_column(&self.config.group_column) => {
                info!(
                    "[4/5] Differential abundance: {} vs {} on '{}'",
                    self.config.group1, self.config.group2, self.config.group_column
                );
                let labels = metadata.group_labeling(&self.config.group_column)?;
                let comparison = GroupComparison::new(&self.config.group1, &self.config.group2)
                    .with_alpha(self.config.alpha)
                    .with_pseudocount(self.config.pseudocount);
                let result = compare_groups_with(matrix, &labels, &comparison, test)?;
                Some(result.into_results())
            }
            Some(_) => {
                info!(
                    "[4/5] Differential abundance skipped: no '{}' column in metadata",
                    self.config.group_column
                );
                None
            }
            None => {
                info!("[4/5] Differential abundance skipped: no rank-sum test available");
                None
            }
        };

        Ok(AnalysisResult {
            samples_analyzed: matrix.n_samples(),
            features_analyzed: matrix.n_features(),
            alpha_diversity: alpha,
            beta_diversity: beta,
            differential_abundance: differential,
        })
    }

    /// Load both tables, analyze, and write the JSON result document.
    ///
    /// Nothing is written if loading or any analysis stage fails.
    pub fn run_full_analysis<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        abundance_path: P,
        metadata_path: Q,
    ) -> Result<AnalysisResult> {
        info!(
            "[1/5] Loading {} and {}",
            abundance_path.as_ref().display(),
            metadata_path.as_ref().display()
        );
        let matrix = AbundanceMatrix::from_tsv(abundance_path)?;
        let metadata = Metadata::from_tsv(metadata_path)?;
        info!(
            "Loaded {} features x {} samples",
            matrix.n_features(),
            matrix.n_samples()
        );

        let result = self.analyze(&matrix, &metadata)?;

        let path = self.write_results(&result)?;
        info!("[5/5] Results written to {}", path.display());
        Ok(result)
    }

    /// Write `result` as pretty-printed JSON to the configured output path.
    pub fn write_results(&self, result: &AnalysisResult) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;
        let path = self.config.output_path();
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, result)?;
        writer.flush()?;
        Ok(path)
    }
}
