//! Result types for two-group differential abundance analysis.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Per-feature outcome of a two-group comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureResult {
    /// Feature identifier.
    pub feature: String,
    /// Mean abundance in the reference group.
    pub mean_group1: f64,
    /// Mean abundance in the comparison group.
    pub mean_group2: f64,
    /// log2((mean_group2 + pseudo) / (mean_group1 + pseudo)).
    pub log2_fold_change: f64,
    /// Rank-sum U statistic for group 1.
    pub statistic: f64,
    /// Raw two-sided p-value.
    pub p_value: f64,
    /// Benjamini-Hochberg adjusted p-value.
    pub p_adjusted: f64,
    /// `p_adjusted < alpha`.
    pub significant: bool,
}

impl FeatureResult {
    /// Create an unadjusted result; `p_adjusted` starts equal to `p_value`.
    pub fn new(
        feature: String,
        mean_group1: f64,
        mean_group2: f64,
        log2_fold_change: f64,
        statistic: f64,
        p_value: f64,
    ) -> Self {
        Self {
            feature,
            mean_group1,
            mean_group2,
            log2_fold_change,
            statistic,
            p_value,
            p_adjusted: p_value,
            significant: false,
        }
    }

    /// Check if significant at a custom threshold.
    pub fn is_significant_at(&self, alpha: f64) -> bool {
        self.p_adjusted < alpha
    }
}

/// All feature results of one comparison, sorted by adjusted p-value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifferentialAbundanceResult {
    /// Reference group name.
    pub group1: String,
    /// Comparison group name.
    pub group2: String,
    /// Significance threshold used for the `significant` flags.
    pub alpha: f64,
    /// Individual results.
    pub results: Vec<FeatureResult>,
}

impl DifferentialAbundanceResult {
    /// Create a new result set.
    pub fn new(group1: String, group2: String, alpha: f64, results: Vec<FeatureResult>) -> Self {
        Self {
            group1,
            group2,
            alpha,
            results,
        }
    }

    /// Number of results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Result for a specific feature.
    pub fn get(&self, feature: &str) -> Option<&FeatureResult> {
        self.results.iter().find(|r| r.feature == feature)
    }

    /// Results flagged significant.
    pub fn significant(&self) -> Vec<&FeatureResult> {
        self.results.iter().filter(|r| r.significant).collect()
    }

    /// Iterate over results.
    pub fn iter(&self) -> impl Iterator<Item = &FeatureResult> {
        self.results.iter()
    }

    /// Consume into the underlying records.
    pub fn into_results(self) -> Vec<FeatureResult> {
        self.results
    }

    /// Count significant results at various thresholds.
    pub fn summary(&self) -> ResultSummary {
        let below = |t: f64| self.results.iter().filter(|r| r.p_adjusted < t).count();
        ResultSummary {
            total: self.len(),
            significant_001: below(0.001),
            significant_01: below(0.01),
            significant_05: below(0.05),
            significant_10: below(0.10),
        }
    }

    /// Write results to a TSV file.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(
            writer,
            "feature\tmean_group1\tmean_group2\tlog2_fold_change\tstatistic\tp_value\tp_adjusted\tsignificant"
        )?;

        for r in &self.results {
            writeln!(
                writer,
                "{}\t{:.6}\t{:.6}\t{:.4}\t{:.1}\t{:.4e}\t{:.4e}\t{}",
                r.feature,
                r.mean_group1,
                r.mean_group2,
                r.log2_fold_change,
                r.statistic,
                r.p_value,
                r.p_adjusted,
                r.significant
            )?;
        }
        writer.flush()?;

        Ok(())
    }
}

/// Summary statistics for a result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSummary {
    pub total: usize,
    pub significant_001: usize,
    pub significant_01: usize,
    pub significant_05: usize,
    pub significant_10: usize,
}

impl std::fmt::Display for ResultSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Total features tested: {}", self.total)?;
        writeln!(f, "Significant at q < 0.001: {}", self.significant_001)?;
        writeln!(f, "Significant at q < 0.01:  {}", self.significant_01)?;
        writeln!(f, "Significant at q < 0.05:  {}", self.significant_05)?;
        writeln!(f, "Significant at q < 0.10:  {}", self.significant_10)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::NamedTempFile;

    fn result(feature: &str, p: f64, q: f64) -> FeatureResult {
        let mut r = FeatureResult::new(feature.to_string(), 1.0, 2.0, 0.585, 3.0, p);
        r.p_adjusted = q;
        r.significant = q < 0.05;
        r
    }

    #[test]
    fn test_result_set_summary() {
        let set = DifferentialAbundanceResult::new(
            "non_medical".into(),
            "medical_influenced".into(),
            0.05,
            vec![
                result("tetM", 0.0001, 0.0005),
                result("sul1", 0.01, 0.02),
                result("ermB", 0.1, 0.15),
                result("qnrS", 0.5, 0.6),
            ],
        );
        let summary = set.summary();

        assert_eq!(summary.total, 4);
        assert_eq!(summary.significant_001, 1);
        assert_eq!(summary.significant_05, 2);
        assert_eq!(summary.significant_10, 2);
        assert_eq!(set.significant().len(), 2);
        assert!(set.get("ermB").is_some());
    }

    #[test]
    fn test_to_tsv() {
        let set = DifferentialAbundanceResult::new(
            "a".into(),
            "b".into(),
            0.05,
            vec![result("tetM", 0.001, 0.002)],
        );
        let mut file = NamedTempFile::new().unwrap();
        set.to_tsv(file.path()).unwrap();

        let mut contents = String::new();
        file.read_to_string(&mut contents).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("feature\tmean_group1"));
        assert!(lines[1].starts_with("tetM\t"));
        assert!(lines[1].ends_with("true"));
    }
}
