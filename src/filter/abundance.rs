//! Prevalence and abundance filtering of rare features.

use crate::data::AbundanceMatrix;
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Filter out features that are both rare and sparse.
///
/// A feature is kept only if
/// - the fraction of samples with a positive value is at least `min_prevalence`, and
/// - its mean value across all samples is at least `min_abundance`.
///
/// The result may have zero features; sample identifiers are always kept.
///
/// # Arguments
/// * `matrix` - The abundance matrix to filter
/// * `min_prevalence` - Minimum fraction of samples where the feature is present
/// * `min_abundance` - Minimum mean abundance across samples
pub fn filter_low_abundance(
    matrix: &AbundanceMatrix,
    min_prevalence: f64,
    min_abundance: f64,
) -> AbundanceMatrix {
    let n_samples = matrix.n_samples();

    let keep_indices: Vec<usize> = (0..matrix.n_features())
        .into_par_iter()
        .filter(|&row| {
            let values = matrix.row(row);
            let (prevalence, mean) = if n_samples == 0 {
                (0.0, 0.0)
            } else {
                let present = values.iter().filter(|&&v| v > 0.0).count();
                let total: f64 = values.iter().sum();
                (
                    present as f64 / n_samples as f64,
                    total / n_samples as f64,
                )
            };
            prevalence >= min_prevalence && mean >= min_abundance
        })
        .collect();

    debug!(
        "Abundance filter kept {} of {} features",
        keep_indices.len(),
        matrix.n_features()
    );

    matrix.select_features(&keep_indices)
}

/// Result of abundance filtering with statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterResult {
    /// Number of features before filtering.
    pub n_before: usize,
    /// Number of features after filtering.
    pub n_after: usize,
    /// Number of features removed.
    pub n_removed: usize,
    /// Proportion of features retained.
    pub retention_rate: f64,
}

impl std::fmt::Display for FilterResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Filter Result")?;
        writeln!(f, "  Before:    {} features", self.n_before)?;
        writeln!(f, "  After:     {} features", self.n_after)?;
        writeln!(f, "  Removed:   {} features", self.n_removed)?;
        writeln!(f, "  Retained:  {:.1}%", self.retention_rate * 100.0)?;
        Ok(())
    }
}

/// Filter with statistics about what was filtered.
pub fn filter_low_abundance_with_stats(
    matrix: &AbundanceMatrix,
    min_prevalence: f64,
    min_abundance: f64,
) -> (AbundanceMatrix, FilterResult) {
    let n_before = matrix.n_features();
    let filtered = filter_low_abundance(matrix, min_prevalence, min_abundance);
    let n_after = filtered.n_features();

    let result = FilterResult {
        n_before,
        n_after,
        n_removed: n_before - n_after,
        retention_rate: if n_before > 0 {
            n_after as f64 / n_before as f64
        } else {
            0.0
        },
    };

    (filtered, result)
}
