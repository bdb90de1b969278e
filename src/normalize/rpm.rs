//! Reads-per-million normalization against externally supplied sequencing depth.
//!
//! ARG counts are only a small fraction of a metagenome, so dividing by the
//! ARG column sum would hide differences in resistome load. Instead each sample
//! is scaled by its total read count from the sequencing run.

use crate::data::AbundanceMatrix;
use crate::error::Result;
use log::{debug, warn};
use std::collections::HashMap;

/// Normalize abundances to reads per `scale` total reads.
///
/// # Formula
/// For sample j with `total_reads[j] = T`: RPM(x_ij) = x_ij / T * scale
///
/// Samples without an entry in `total_reads` are copied unchanged, as are
/// samples whose total is zero.
///
/// # Example
/// ```ignore
/// let rpm = normalize_by_total_reads(&counts, &totals, scale::RPM)?;
/// ```
pub fn normalize_by_total_reads(
    matrix: &AbundanceMatrix,
    total_reads: &HashMap<String, u64>,
    scale: f64,
) -> Result<AbundanceMatrix> {
    let mut data = matrix.data().clone();

    for (j, sample_id) in matrix.sample_ids().iter().enumerate() {
        match total_reads.get(sample_id) {
            Some(&0) => {
                warn!("Sample {} has zero total reads; left unnormalized", sample_id);
            }
            Some(&total) => {
                let factor = scale / total as f64;
                data.column_mut(j).iter_mut().for_each(|v| *v *= factor);
            }
            None => {
                debug!("No total reads for sample {}; left unnormalized", sample_id);
            }
        }
    }

    matrix.with_data(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::scale;
    use approx::assert_relative_eq;

    fn create_test_counts() -> AbundanceMatrix {
        AbundanceMatrix::from_rows(
            vec!["tetM".into(), "sul1".into()],
            vec!["WW1".into(), "WW2".into(), "WW3".into()],
            &[vec![50.0, 10.0, 7.0], vec![150.0, 0.0, 3.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_rpm_scaling() {
        let counts = create_test_counts();
        let totals: HashMap<String, u64> =
            [("WW1".to_string(), 2_000_000), ("WW2".to_string(), 500_000)].into();

        let rpm = normalize_by_total_reads(&counts, &totals, scale::RPM).unwrap();

        assert_relative_eq!(rpm.get(0, 0), 25.0, epsilon = 1e-10);
        assert_relative_eq!(rpm.get(1, 0), 75.0, epsilon = 1e-10);
        assert_relative_eq!(rpm.get(0, 1), 20.0, epsilon = 1e-10);
        assert_eq!(rpm.get(1, 1), 0.0);
    }

    #[test]
    fn test_missing_sample_passes_through() {
        let counts = create_test_counts();
        let totals: HashMap<String, u64> = [("WW1".to_string(), 1_000_000)].into();

        let rpm = normalize_by_total_reads(&counts, &totals, scale::RPM).unwrap();

        // WW3 has no total and keeps its raw counts.
        assert_eq!(rpm.column(2), counts.column(2));
        assert_eq!(rpm.column(1), counts.column(1));
        assert_eq!(rpm.sample_ids(), counts.sample_ids());
    }

    #[test]
    fn test_zero_total_passes_through() {
        let counts = create_test_counts();
        let totals: HashMap<String, u64> = [("WW2".to_string(), 0)].into();

        let rpm = normalize_by_total_reads(&counts, &totals, scale::RPM).unwrap();
        assert_eq!(rpm, counts);
    }

    #[test]
    fn test_custom_scale() {
        let counts = create_test_counts();
        let totals: HashMap<String, u64> = [("WW3".to_string(), 10)].into();

        let per_read = normalize_by_total_reads(&counts, &totals, 1.0).unwrap();
        assert_relative_eq!(per_read.get(0, 2), 0.7, epsilon = 1e-12);
        assert_relative_eq!(per_read.get(1, 2), 0.3, epsilon = 1e-12);
    }
}
