//! Two-group differential abundance of individual features.
//!
//! Every feature row is split into the two named groups, compared with a
//! rank-sum test, and summarised by a log2 fold change. Features absent from
//! both groups are skipped. Benjamini-Hochberg correction runs over all
//! retained features once scoring is complete.

use crate::correct::fdr_correction;
use crate::data::{AbundanceMatrix, DifferentialAbundanceResult, FeatureResult, GroupLabeling};
use crate::error::{EcoError, Result};
use crate::numeric::{mean, round_decimals};
use crate::test::{MannWhitneyU, RankSumTest};
use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Default significance threshold for adjusted p-values.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Default pseudocount for fold changes.
pub const DEFAULT_PSEUDOCOUNT: f64 = 1.0;

/// log2((mean2 + pseudocount) / (mean1 + pseudocount)).
///
/// Positive values mean higher abundance in group 2.
pub fn log2_fold_change(mean1: f64, mean2: f64, pseudocount: f64) -> f64 {
    ((mean2 + pseudocount) / (mean1 + pseudocount)).log2()
}

/// Parameters of one two-group comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupComparison {
    /// Reference group.
    pub group1: String,
    /// Comparison group; fold changes are relative to `group1`.
    pub group2: String,
    pub alpha: f64,
    pub pseudocount: f64,
}

impl GroupComparison {
    pub fn new(group1: impl Into<String>, group2: impl Into<String>) -> Self {
        Self {
            group1: group1.into(),
            group2: group2.into(),
            alpha: DEFAULT_ALPHA,
            pseudocount: DEFAULT_PSEUDOCOUNT,
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_pseudocount(mut self, pseudocount: f64) -> Self {
        self.pseudocount = pseudocount;
        self
    }

    fn validate(&self) -> Result<()> {
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
        Ok(())
    }
}

/// Compare two groups with the Mann-Whitney U test at α = 0.05.
pub fn compare_groups(
    matrix: &AbundanceMatrix,
    labels: &GroupLabeling,
    group1: &str,
    group2: &str,
) -> Result<DifferentialAbundanceResult> {
    compare_groups_with(
        matrix,
        labels,
        &GroupComparison::new(group1, group2),
        &MannWhitneyU::default(),
    )
}

/// Compare two groups of samples feature by feature.
///
/// # Arguments
/// * `matrix` - Abundance matrix (features × samples)
/// * `labels` - Group tag per sample; unlabeled samples are left out
/// * `comparison` - Group names, α and fold-change pseudocount
/// * `test` - Rank-sum test applied to each feature
///
/// # Returns
/// Results sorted by adjusted p-value. Empty when either group has no
/// samples in the matrix.
pub fn compare_groups_with(
    matrix: &AbundanceMatrix,
    labels: &GroupLabeling,
    comparison: &GroupComparison,
    test: &dyn RankSumTest,
) -> Result<DifferentialAbundanceResult> {
    comparison.validate()?;

    let idx1 = labels.indices_in(matrix.sample_ids(), &comparison.group1);
    let idx2 = labels.indices_in(matrix.sample_ids(), &comparison.group2);

    let empty = || {
        DifferentialAbundanceResult::new(
            comparison.group1.clone(),
            comparison.group2.clone(),
            comparison.alpha,
            Vec::new(),
        )
    };
    if idx1.is_empty() || idx2.is_empty() {
        warn!(
            "Group comparison '{}' vs '{}' has {} and {} samples; skipping",
            comparison.group1,
            comparison.group2,
            idx1.len(),
            idx2.len()
        );
        return Ok(empty());
    }

    let data = matrix.data();
    let scored: Vec<FeatureResult> = (0..matrix.n_features())
        .into_par_iter()
        .filter_map(|row| {
            let values1: Vec<f64> = idx1.iter().map(|&j| data[(row, j)]).collect();
            let values2: Vec<f64> = idx2.iter().map(|&j| data[(row, j)]).collect();

            if values1.iter().sum::<f64>() == 0.0 && values2.iter().sum::<f64>() == 0.0 {
                return None;
            }

            let mean1 = mean(&values1);
            let mean2 = mean(&values2);
            let lfc = round_decimals(log2_fold_change(mean1, mean2, comparison.pseudocount), 4);
            let tested = test.rank_sum(&values1, &values2);

            Some(FeatureResult::new(
                matrix.feature_ids()[row].clone(),
                mean1,
                mean2,
                lfc,
                tested.statistic,
                tested.p_value,
            ))
        })
        .collect();

    debug!(
        "Scored {} of {} features with {} ({} vs {} samples)",
        scored.len(),
        matrix.n_features(),
        test.name(),
        idx1.len(),
        idx2.len()
    );

    let mut results = fdr_correction(scored, comparison.alpha);
    results.sort_by(|a, b| {
        a.p_adjusted
            .partial_cmp(&b.p_adjusted)
            .unwrap_or(Ordering::Equal)
    });

    let mut outcome = empty();
    outcome.results = results;
    Ok(outcome)
}
