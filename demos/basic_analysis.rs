//! Basic example of an in-memory resistome analysis.
//!
//! This example shows how to:
//! 1. Build a small ARG abundance table
//! 2. Compute alpha and beta diversity
//! 3. Compare hospital-influenced and non-medical wastewater samples

use arg_ecology::prelude::*;

fn main() -> Result<()> {
    println!("=== ARG Ecology Example ===\n");

    let (matrix, labels) = create_example_data()?;
    println!("Data dimensions:");
    println!("  Features: {}", matrix.n_features());
    println!("  Samples:  {}", matrix.n_samples());
    println!();

    println!("=== Alpha Diversity ===\n");
    let report = alpha_diversity(&matrix);
    for (sample_id, m) in report.iter() {
        println!(
            "  {}: richness={} shannon={:.3} simpson={:.3} chao1={:.1}",
            sample_id, m.observed_richness, m.shannon_index, m.simpson_index, m.chao1_estimator
        );
    }
    println!();

    println!("=== Beta Diversity ===\n");
    let dm = distance_matrix_for(&matrix, DistanceMetric::BrayCurtis)?;
    let ordination = pcoa(&dm, 2, &NalgebraEigensolver::default())?;
    for (axis, share) in ordination.coordinates.axes().iter().zip(&ordination.explained_variance) {
        println!("  {} explains {:.1}%", axis, share * 100.0);
    }
    println!();

    println!("=== Differential Abundance ===\n");
    let results = compare_groups(&matrix, &labels, "non_medical", "medical_influenced")?;
    print!("{}", results.summary());
    for r in results.iter() {
        println!(
            "  {:<8} log2FC={:>7.3}  p={:.3e}  q={:.3e}{}",
            r.feature,
            r.log2_fold_change,
            r.p_value,
            r.p_adjusted,
            if r.significant { "  *" } else { "" }
        );
    }

    Ok(())
}

/// Six wastewater samples; blaKPC and vanA are enriched downstream of hospitals.
fn create_example_data() -> Result<(AbundanceMatrix, GroupLabeling)> {
    let samples: Vec<String> = ["R1", "R2", "R3", "H1", "H2", "H3"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let features: Vec<String> = ["tetM", "sul1", "ermB", "blaKPC", "vanA"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let matrix = AbundanceMatrix::from_rows(
        features,
        samples.clone(),
        &[
            vec![120.0, 98.0, 143.0, 110.0, 131.0, 101.0],
            vec![300.0, 280.0, 310.0, 295.0, 330.0, 305.0],
            vec![45.0, 0.0, 38.0, 52.0, 41.0, 0.0],
            vec![0.0, 1.0, 0.0, 35.0, 48.0, 29.0],
            vec![2.0, 0.0, 1.0, 18.0, 22.0, 25.0],
        ],
    )?;

    let labels = GroupLabeling::from_pairs(samples.iter().map(|s| {
        let group = if s.starts_with('H') {
            "medical_influenced"
        } else {
            "non_medical"
        };
        (s.clone(), group)
    }))?;

    Ok((matrix, labels))
}
