//! Alpha diversity: within-sample richness and evenness.
//!
//! Every index takes one sample vector, drops zero entries, and returns 0.0
//! for empty or otherwise degenerate input.
//!
//! ```
//! use arg_ecology::alpha::calculate_all;
//!
//! let metrics = calculate_all(&[100.0, 50.0, 30.0, 20.0, 10.0, 5.0, 3.0, 2.0, 1.0, 1.0]);
//! assert_eq!(metrics.observed_richness, 10);
//! assert_eq!(metrics.shannon_index, 1.5566);
//! ```

use crate::data::AbundanceMatrix;
use crate::numeric::round_decimals;
use rayon::prelude::*;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::io::Write;

fn present(counts: &[f64]) -> impl Iterator<Item = f64> + '_ {
    counts.iter().copied().filter(|&c| c > 0.0)
}

/// Shannon diversity index H' = -Σ p_i ln(p_i).
pub fn shannon_index(counts: &[f64]) -> f64 {
    let total: f64 = present(counts).sum();
    if total <= 0.0 {
        return 0.0;
    }
    -present(counts)
        .map(|c| {
            let p = c / total;
            p * p.ln()
        })
        .sum::<f64>()
}

/// Simpson diversity 1 - D, with D = Σ n_i(n_i - 1) / (N(N - 1)).
///
/// Higher values mean more diverse. Returns 0.0 when N ≤ 1.
pub fn simpson_index(counts: &[f64]) -> f64 {
    let n_total: f64 = present(counts).sum();
    if n_total <= 1.0 {
        return 0.0;
    }
    let d = present(counts).map(|c| c * (c - 1.0)).sum::<f64>() / (n_total * (n_total - 1.0));
    1.0 - d
}

/// Chao1 richness estimate S_obs + f1² / (2 f2).
///
/// f1 and f2 are the numbers of singletons and doubletons. Without
/// doubletons the bias-corrected S_obs + f1(f1 - 1) / 2 is used.
pub fn chao1_estimator(counts: &[f64]) -> f64 {
    let s_obs = observed_richness(counts) as f64;
    let f1 = present(counts).filter(|&c| c == 1.0).count() as f64;
    let f2 = present(counts).filter(|&c| c == 2.0).count() as f64;

    if f2 == 0.0 {
        return s_obs + f1 * (f1 - 1.0) / 2.0;
    }
    s_obs + (f1 * f1) / (2.0 * f2)
}

/// Number of features with a positive value.
pub fn observed_richness(counts: &[f64]) -> usize {
    present(counts).count()
}

/// Pielou evenness J' = H' / ln(S). Returns 0.0 when S ≤ 1.
pub fn pielou_evenness(counts: &[f64]) -> f64 {
    let richness = observed_richness(counts);
    if richness <= 1 {
        return 0.0;
    }
    shannon_index(counts) / (richness as f64).ln()
}

/// The full alpha metric set for one sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlphaMetrics {
    pub observed_richness: usize,
    pub shannon_index: f64,
    pub simpson_index: f64,
    pub chao1_estimator: f64,
    pub pielou_evenness: f64,
}

/// Compute all metrics, rounding the floating indices to 4 decimals.
pub fn calculate_all(counts: &[f64]) -> AlphaMetrics {
    AlphaMetrics {
        observed_richness: observed_richness(counts),
        shannon_index: round_decimals(shannon_index(counts), 4),
        simpson_index: round_decimals(simpson_index(counts), 4),
        chao1_estimator: round_decimals(chao1_estimator(counts), 4),
        pielou_evenness: round_decimals(pielou_evenness(counts), 4),
    }
}

/// Per-sample alpha metrics, in matrix sample order.
///
/// Serializes as a JSON object keyed by sample ID.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiversityReport {
    entries: Vec<(String, AlphaMetrics)>,
}

impl DiversityReport {
    /// Metrics for one sample.
    pub fn get(&self, sample_id: &str) -> Option<&AlphaMetrics> {
        self.entries
            .iter()
            .find(|(sid, _)| sid == sample_id)
            .map(|(_, m)| m)
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(sample_id, metrics)`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AlphaMetrics)> {
        self.entries.iter().map(|(sid, m)| (sid.as_str(), m))
    }

    /// Write a TSV table with one row per sample.
    pub fn write_tsv<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        writeln!(
            writer,
            "sample_id\tobserved_richness\tshannon_index\tsimpson_index\tchao1_estimator\tpielou_evenness"
        )?;
        for (sample_id, m) in &self.entries {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{}\t{}",
                sample_id,
                m.observed_richness,
                m.shannon_index,
                m.simpson_index,
                m.chao1_estimator,
                m.pielou_evenness
            )?;
        }
        Ok(())
    }
}

impl Serialize for DiversityReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (sample_id, metrics) in &self.entries {
            map.serialize_entry(sample_id, metrics)?;
        }
        map.end()
    }
}

/// Compute the alpha metric set for every sample column.
pub fn alpha_diversity(matrix: &AbundanceMatrix) -> DiversityReport {
    let metrics: Vec<AlphaMetrics> = (0..matrix.n_samples())
        .into_par_iter()
        .map(|col| calculate_all(&matrix.column(col)))
        .collect();

    DiversityReport {
        entries: matrix.sample_ids().iter().cloned().zip(metrics).collect(),
    }
}
