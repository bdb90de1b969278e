//! Symmetric eigendecomposition capability used by ordination.

use crate::error::{EcoError, Result};
use nalgebra::{DMatrix, DVector, SymmetricEigen};

/// Eigenvalues with their eigenvectors.
///
/// Column `k` of `vectors` is the unit eigenvector for `values[k]`. No
/// particular ordering is implied.
#[derive(Debug, Clone)]
pub struct Eigendecomposition {
    pub values: DVector<f64>,
    pub vectors: DMatrix<f64>,
}

/// Provider of symmetric eigendecompositions.
pub trait Eigensolver: Send + Sync {
    /// Decompose a real symmetric matrix.
    fn symmetric_eigen(&self, matrix: &DMatrix<f64>) -> Result<Eigendecomposition>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

/// Eigensolver backed by nalgebra's symmetric QR iteration.
#[derive(Debug, Clone, Copy)]
pub struct NalgebraEigensolver {
    /// Convergence tolerance.
    pub eps: f64,
    /// Iteration limit; 0 iterates until convergence.
    pub max_iterations: usize,
}

impl Default for NalgebraEigensolver {
    fn default() -> Self {
        Self {
            eps: f64::EPSILON,
            max_iterations: 0,
        }
    }
}

impl Eigensolver for NalgebraEigensolver {
    fn symmetric_eigen(&self, matrix: &DMatrix<f64>) -> Result<Eigendecomposition> {
        if !matrix.is_square() {
            return Err(EcoError::DimensionMismatch {
                expected: matrix.nrows(),
                actual: matrix.ncols(),
            });
        }
        let eigen = SymmetricEigen::try_new(matrix.clone(), self.eps, self.max_iterations)
            .ok_or_else(|| {
                EcoError::Numerical(format!(
                    "Symmetric eigendecomposition of {}x{} matrix did not converge",
                    matrix.nrows(),
                    matrix.ncols()
                ))
            })?;

        Ok(Eigendecomposition {
            values: eigen.eigenvalues,
            vectors: eigen.eigenvectors,
        })
    }

    fn name(&self) -> &str {
        "nalgebra"
    }
}
