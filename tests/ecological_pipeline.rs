//! Integration tests for the end-to-end ecological analysis.

use arg_ecology::prelude::*;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use tempfile::{tempdir, NamedTempFile};

const N_FEATURES: usize = 15;
const N_SAMPLES: usize = 20;

/// Synthetic ARG table with known group effects.
///
/// Samples 0-9 are `non_medical`, 10-19 `medical_influenced`.
/// - Features 0-4: strong increase in the medical group (4x)
/// - Features 5-9: no effect
/// - Features 10-12: present in every other sample, no effect
/// - Features 13-14: absent everywhere
fn write_synthetic_abundance(path: &Path) {
    let mut rng_seed = 42u64;
    let simple_rand = |seed: &mut u64| -> f64 {
        *seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
        ((*seed >> 16) & 0x7FFF) as f64 / 32768.0
    };

    let mut file = std::fs::File::create(path).unwrap();
    let header: Vec<String> = (0..N_SAMPLES).map(|i| format!("WW{:02}", i)).collect();
    writeln!(file, "gene\t{}", header.join("\t")).unwrap();

    for feat in 0..N_FEATURES {
        let values: Vec<String> = (0..N_SAMPLES)
            .map(|sample| {
                let medical = sample >= 10;
                let base = match feat {
                    0..=4 => 100.0 * if medical { 4.0 } else { 1.0 },
                    5..=9 => 200.0,
                    10..=12 if sample % 2 == 0 => 80.0,
                    _ => 0.0,
                };
                let noise = 0.9 + 0.2 * simple_rand(&mut rng_seed);
                format!("{}", (base * noise).round())
            })
            .collect();
        writeln!(file, "ARG_{}\t{}", feat, values.join("\t")).unwrap();
    }
}

fn write_metadata(path: &Path) {
    let mut file = std::fs::File::create(path).unwrap();
    writeln!(file, "sample_id\tsample_type\tcity").unwrap();
    for i in 0..N_SAMPLES {
        let group = if i < 10 { "non_medical" } else { "medical_influenced" };
        let city = if i % 3 == 0 { "Oslo" } else { "Lyon" };
        writeln!(file, "WW{:02}\t{}\t{}", i, group, city).unwrap();
    }
}

struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempdir().unwrap();
        write_synthetic_abundance(&dir.path().join("abundance.tsv"));
        write_metadata(&dir.path().join("metadata.tsv"));
        Self { dir }
    }

    fn abundance(&self) -> std::path::PathBuf {
        self.dir.path().join("abundance.tsv")
    }

    fn metadata(&self) -> std::path::PathBuf {
        self.dir.path().join("metadata.tsv")
    }

    fn config(&self) -> AnalysisConfig {
        AnalysisConfig {
            output_dir: self.dir.path().join("out"),
            ..AnalysisConfig::default()
        }
    }
}

#[test]
fn test_full_analysis_writes_document() {
    let fx = Fixture::new();
    let config = fx.config();
    let output = config.output_path();

    let result = EcologicalAnalysis::new(config)
        .run_full_analysis(fx.abundance(), fx.metadata())
        .unwrap();

    assert_eq!(result.samples_analyzed, N_SAMPLES);
    assert_eq!(result.features_analyzed, N_FEATURES);

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(json["samples_analyzed"], N_SAMPLES);
    assert_eq!(json["features_analyzed"], N_FEATURES);
    assert_eq!(json["alpha_diversity"].as_object().unwrap().len(), N_SAMPLES);
    assert!(json["alpha_diversity"]["WW00"]["chao1_estimator"].is_number());
    assert_eq!(json["beta_diversity"]["metric"], "braycurtis");
    assert_eq!(json["beta_diversity"]["distance_matrix"]["WW03"]["WW03"], 0.0);
    assert_eq!(json["beta_diversity"]["pcoa_coordinates"].as_object().unwrap().len(), 2);
    assert_eq!(json["beta_diversity"]["explained_variance"].as_array().unwrap().len(), 2);
    assert!(json["differential_abundance"].is_array());
}

#[test]
fn test_detects_group_effect() {
    let fx = Fixture::new();
    let result = EcologicalAnalysis::new(fx.config())
        .run_full_analysis(fx.abundance(), fx.metadata())
        .unwrap();

    let da = result.differential_abundance.unwrap();
    // Two features are zero in every sample.
    assert_eq!(da.len(), N_FEATURES - 2);

    for w in da.windows(2) {
        assert!(w[0].p_adjusted <= w[1].p_adjusted);
    }

    let effects = ["ARG_0", "ARG_1", "ARG_2", "ARG_3", "ARG_4"];
    // The strongest signals come first.
    for r in &da[..5] {
        assert!(effects.contains(&r.feature.as_str()), "unexpected hit {}", r.feature);
        assert!(r.significant, "{} should be significant", r.feature);
        assert!(r.log2_fold_change > 1.5);
    }
    assert!(da[5..].iter().all(|r| !r.significant));
}

#[test]
fn test_medical_group_separates_in_ordination() {
    let fx = Fixture::new();
    let result = EcologicalAnalysis::new(fx.config())
        .run_full_analysis(fx.abundance(), fx.metadata())
        .unwrap();

    let beta = result.beta_diversity.unwrap();
    let coords = &beta.pcoa_coordinates;
    let pc1: Vec<f64> = (0..N_SAMPLES).map(|i| coords.get(i, 0)).collect();

    let mean_non = pc1[..10].iter().sum::<f64>() / 10.0;
    let mean_med = pc1[10..].iter().sum::<f64>() / 10.0;
    assert!((mean_non - mean_med).abs() > 0.05);
    assert!(beta.explained_variance[0] >= beta.explained_variance[1]);
}

#[test]
fn test_capabilities_disabled_omit_sections() {
    let fx = Fixture::new();
    let mut config = fx.config();
    config.capabilities = CapabilityFlags {
        linear_algebra: false,
        statistics: false,
    };
    let output = config.output_path();

    EcologicalAnalysis::new(config)
        .run_full_analysis(fx.abundance(), fx.metadata())
        .unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    let object = json.as_object().unwrap();
    assert!(object.contains_key("alpha_diversity"));
    assert!(!object.contains_key("beta_diversity"));
    assert!(!object.contains_key("differential_abundance"));
}

#[test]
fn test_malformed_table_writes_nothing() {
    let fx = Fixture::new();
    let mut bad = NamedTempFile::new().unwrap();
    writeln!(bad, "gene\tWW00\tWW01").unwrap();
    writeln!(bad, "ARG_0\t5\tnot_a_number").unwrap();
    bad.flush().unwrap();

    let config = fx.config();
    let output_dir = config.output_dir.clone();
    let err = EcologicalAnalysis::new(config)
        .run_full_analysis(bad.path(), fx.metadata())
        .unwrap_err();

    assert!(matches!(err, EcoError::InvalidValue { .. }));
    assert!(!output_dir.exists());
}

#[test]
fn test_missing_input_file_is_fatal() {
    let fx = Fixture::new();
    let config = fx.config();
    let output_dir = config.output_dir.clone();

    let result = EcologicalAnalysis::new(config)
        .run_full_analysis(fx.dir.path().join("missing.tsv"), fx.metadata());

    assert!(result.is_err());
    assert!(!output_dir.exists());
}

#[test]
fn test_table_primitives_compose() {
    let fx = Fixture::new();
    let matrix = AbundanceMatrix::from_tsv(fx.abundance()).unwrap();

    // RPM against a uniform depth of two million reads halves every value.
    let totals: HashMap<String, u64> = matrix
        .sample_ids()
        .iter()
        .map(|s| (s.clone(), 2_000_000))
        .collect();
    let rpm = normalize_by_total_reads(&matrix, &totals, scale::RPM).unwrap();
    assert_eq!(rpm.get(0, 0), matrix.get(0, 0) / 2.0);

    let categories: HashMap<String, String> = (0..5)
        .map(|i| (format!("ARG_{}", i), "tetracycline".to_string()))
        .chain((5..10).map(|i| (format!("ARG_{}", i), "sulfonamide".to_string())))
        .collect();
    let by_class = aggregate_by_category(&rpm, &categories).unwrap();
    assert_eq!(by_class.feature_ids(), &["Unknown", "sulfonamide", "tetracycline"]);

    let filtered = filter_low_abundance(&matrix, 0.0, 0.0);
    assert_eq!(filtered, matrix);
    assert_eq!(filter_low_abundance(&matrix, 1.1, 0.0).n_features(), 0);

    let report = alpha_diversity(&matrix);
    for (_, metrics) in report.iter() {
        assert!(metrics.chao1_estimator >= metrics.observed_richness as f64);
    }
}
