//! Total Sum Scaling (TSS) normalization.
//!
//! TSS divides each value by the total of its own sample column. It is the
//! fallback when sequencing depth is not known, and gives relative abundances
//! within the resistome rather than per-read loads.

use crate::data::AbundanceMatrix;
use crate::error::{EcoError, Result};
use log::warn;
use rayon::prelude::*;

/// Apply Total Sum Scaling to an abundance matrix.
///
/// # Formula
/// For sample j: TSS(x_ij) = x_ij / sum(x_j) * scale_factor
///
/// Samples whose column sums to zero stay all-zero.
///
/// # Arguments
/// * `matrix` - Abundance matrix
/// * `scale_factor` - Multiplier (1.0 for proportions, 1e6 for per-million)
pub fn norm_tss(matrix: &AbundanceMatrix, scale_factor: f64) -> Result<AbundanceMatrix> {
    if !(scale_factor > 0.0 && scale_factor.is_finite()) {
        return Err(EcoError::InvalidParameter(
            "Scale factor must be positive".to_string(),
        ));
    }

    let col_sums = matrix.col_sums();
    for (sample_id, _) in matrix
        .sample_ids()
        .iter()
        .zip(&col_sums)
        .filter(|&(_, &total)| total == 0.0)
    {
        warn!("Sample {} has zero total abundance; left as zeros", sample_id);
    }

    let normalized_cols: Vec<Vec<f64>> = (0..matrix.n_samples())
        .into_par_iter()
        .map(|j| {
            let total = col_sums[j];
            let column = matrix.column(j);
            if total == 0.0 {
                return column;
            }
            column.iter().map(|&v| v / total * scale_factor).collect()
        })
        .collect();

    let mut data = matrix.data().clone();
    for (j, col) in normalized_cols.iter().enumerate() {
        for (i, &val) in col.iter().enumerate() {
            data[(i, j)] = val;
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
            vec!["A".into(), "B".into(), "C".into()],
            vec!["S1".into(), "S2".into(), "S3".into()],
            &[
                vec![50.0, 100.0, 0.0],
                vec![30.0, 60.0, 0.0],
                vec![20.0, 40.0, 0.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_tss_proportions() {
        let tss = norm_tss(&create_test_counts(), scale::PROPORTION).unwrap();

        for j in 0..2 {
            assert_relative_eq!(tss.get(0, j), 0.50, epsilon = 1e-10);
            assert_relative_eq!(tss.get(1, j), 0.30, epsilon = 1e-10);
            assert_relative_eq!(tss.get(2, j), 0.20, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_tss_zero_column_kept() {
        let tss = norm_tss(&create_test_counts(), scale::RPM).unwrap();
        assert_eq!(tss.column(2), vec![0.0, 0.0, 0.0]);
        let col_sum: f64 = tss.column(0).iter().sum();
        assert_relative_eq!(col_sum, 1_000_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_tss_invalid_scale_factor() {
        let counts = create_test_counts();
        assert!(norm_tss(&counts, 0.0).is_err());
        assert!(norm_tss(&counts, -1.0).is_err());
    }
}
