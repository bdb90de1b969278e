//! Aggregation of ARG rows by drug class, resistance mechanism, or any other
//! feature → category annotation.

use crate::data::AbundanceMatrix;
use crate::error::Result;
use nalgebra::DMatrix;
use std::collections::{BTreeMap, HashMap};

/// Category assigned to features without an annotation.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Sum feature rows that share a category.
///
/// Features missing from `feature_to_category` are pooled under
/// [`UNKNOWN_CATEGORY`]. The output has one row per distinct category, sorted
/// by category name; sample order is unchanged.
pub fn aggregate_by_category(
    matrix: &AbundanceMatrix,
    feature_to_category: &HashMap<String, String>,
) -> Result<AbundanceMatrix> {
    let mut members: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (row, feature_id) in matrix.feature_ids().iter().enumerate() {
        let category = feature_to_category
            .get(feature_id)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_CATEGORY);
        members.entry(category).or_default().push(row);
    }

    let n_samples = matrix.n_samples();
    let mut data = DMatrix::zeros(members.len(), n_samples);
    for (out_row, rows) in members.values().enumerate() {
        for &row in rows {
            for col in 0..n_samples {
                data[(out_row, col)] += matrix.get(row, col);
            }
        }
    }

    let category_ids = members.keys().map(|c| c.to_string()).collect();
    AbundanceMatrix::new(data, category_ids, matrix.sample_ids().to_vec())
}
