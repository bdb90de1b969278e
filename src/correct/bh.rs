//! Benjamini-Hochberg false discovery rate correction.

use crate::data::FeatureResult;
use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Result of BH correction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BhCorrected {
    /// Feature IDs in original order.
    pub feature_ids: Vec<String>,
    /// Original p-values.
    pub p_values: Vec<f64>,
    /// Adjusted p-values (q-values).
    pub q_values: Vec<f64>,
    /// Number of tests.
    pub n_tests: usize,
}

impl BhCorrected {
    /// Count significant results at a threshold.
    pub fn n_significant(&self, alpha: f64) -> usize {
        self.q_values.iter().filter(|&&q| q < alpha).count()
    }
}

fn ascending_order(p_values: &[f64]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..p_values.len()).collect();
    indices.sort_by(|&a, &b| {
        p_values[a]
            .partial_cmp(&p_values[b])
            .unwrap_or(Ordering::Equal)
    });
    indices
}

/// Apply Benjamini-Hochberg FDR correction.
///
/// The BH procedure controls the false discovery rate (FDR) at level α.
/// For each p-value, the adjusted p-value (q-value) is calculated as:
/// q[i] = min(p[i] * n / rank[i], q[i+1], 1)
///
/// # Arguments
/// * `p_values` - Raw p-values
/// * `feature_ids` - Feature identifiers (same order as p_values)
///
/// # Returns
/// BhCorrected containing q-values in input order.
pub fn correct_bh(p_values: &[f64], feature_ids: &[String]) -> BhCorrected {
    let n = p_values.len();
    if n == 0 {
        return BhCorrected {
            feature_ids: vec![],
            p_values: vec![],
            q_values: vec![],
            n_tests: 0,
        };
    }

    let indices = ascending_order(p_values);

    let mut q_sorted = vec![0.0; n];
    let n_f64 = n as f64;

    // Largest p-value has rank n, so its candidate is p itself
    q_sorted[n - 1] = p_values[indices[n - 1]].min(1.0);

    for i in (0..n - 1).rev() {
        let rank = i + 1;
        let adjusted = p_values[indices[i]] * n_f64 / rank as f64;
        q_sorted[i] = adjusted.min(q_sorted[i + 1]).min(1.0);
    }

    let mut q_values = vec![0.0; n];
    for (i, &orig_idx) in indices.iter().enumerate() {
        q_values[orig_idx] = q_sorted[i];
    }

    BhCorrected {
        feature_ids: feature_ids.to_vec(),
        p_values: p_values.to_vec(),
        q_values,
        n_tests: n,
    }
}

/// Fill `p_adjusted` and `significant` on a set of feature results.
///
/// Corrects over the raw `p_value` of every result, so applying it again
/// gives the same output.
///
/// # Returns
/// The results sorted by raw p-value ascending (stable), each flagged
/// significant iff its adjusted p-value is below `alpha`.
pub fn fdr_correction(results: Vec<FeatureResult>, alpha: f64) -> Vec<FeatureResult> {
    let p_values: Vec<f64> = results.iter().map(|r| r.p_value).collect();
    let feature_ids: Vec<String> = results.iter().map(|r| r.feature.clone()).collect();
    let bh = correct_bh(&p_values, &feature_ids);
    debug!(
        "BH correction over {} tests: {} below q < {}",
        bh.n_tests,
        bh.n_significant(alpha),
        alpha
    );

    let mut adjusted: Vec<FeatureResult> = results
        .into_iter()
        .zip(bh.q_values)
        .map(|(mut result, q)| {
            result.p_adjusted = q;
            result.significant = q < alpha;
            result
        })
        .collect();

    adjusted.sort_by(|a, b| {
        a.p_value
            .partial_cmp(&b.p_value)
            .unwrap_or(Ordering::Equal)
    });
    adjusted
}
