//! Principal coordinates analysis (classical multidimensional scaling).

use super::distance::DistanceMatrix;
use super::eigen::Eigensolver;
use crate::error::{EcoError, Result};
use log::{debug, warn};
use nalgebra::DMatrix;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;

/// Sample coordinates along the retained principal axes.
#[derive(Debug, Clone, PartialEq)]
pub struct PcoaCoordinates {
    sample_ids: Vec<String>,
    axes: Vec<String>,
    /// Samples × axes.
    values: DMatrix<f64>,
}

impl PcoaCoordinates {
    /// Axis labels, `PC1`, `PC2`, ...
    pub fn axes(&self) -> &[String] {
        &self.axes
    }

    /// Sample identifiers.
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Number of retained axes.
    pub fn n_axes(&self) -> usize {
        self.axes.len()
    }

    /// Coordinate of sample `sample` on axis `axis`.
    pub fn get(&self, sample: usize, axis: usize) -> f64 {
        self.values[(sample, axis)]
    }

    /// Coordinate by sample identifier.
    pub fn get_by_id(&self, sample_id: &str, axis: usize) -> Option<f64> {
        let i = self.sample_ids.iter().position(|s| s == sample_id)?;
        (axis < self.n_axes()).then(|| self.values[(i, axis)])
    }

    /// All coordinates of one sample.
    pub fn point(&self, sample: usize) -> Vec<f64> {
        self.values.row(sample).iter().copied().collect()
    }

    /// Samples × axes matrix.
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.values
    }
}

struct AxisColumn<'a> {
    coords: &'a PcoaCoordinates,
    axis: usize,
}

impl Serialize for AxisColumn<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.coords.sample_ids.len()))?;
        for (i, sid) in self.coords.sample_ids.iter().enumerate() {
            map.serialize_entry(sid, &self.coords.values[(i, self.axis)])?;
        }
        map.end()
    }
}

/// Serializes as `{"PC1": {sample: coordinate}, ...}`.
impl Serialize for PcoaCoordinates {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.axes.len()))?;
        for (axis, label) in self.axes.iter().enumerate() {
            map.serialize_entry(label, &AxisColumn { coords: self, axis })?;
        }
        map.end()
    }
}

/// Result of a principal coordinates analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PcoaResult {
    pub coordinates: PcoaCoordinates,
    /// Retained eigenvalues, descending.
    pub eigenvalues: Vec<f64>,
    /// Share of total positive inertia per retained axis.
    pub explained_variance: Vec<f64>,
}

/// Gower double-centering of the squared distances: B = -½ J D² J.
fn double_center(dm: &DistanceMatrix) -> DMatrix<f64> {
    let n = dm.n_samples();
    let squared = dm.matrix().map(|d| d * d);

    let row_means: Vec<f64> = (0..n)
        .map(|i| squared.row(i).iter().sum::<f64>() / n as f64)
        .collect();
    let col_means: Vec<f64> = (0..n)
        .map(|j| squared.column(j).iter().sum::<f64>() / n as f64)
        .collect();
    let grand_mean = squared.iter().sum::<f64>() / (n * n) as f64;

    DMatrix::from_fn(n, n, |i, j| {
        -0.5 * (squared[(i, j)] - row_means[i] - col_means[j] + grand_mean)
    })
}

/// Project samples into a low-dimensional Euclidean space.
///
/// The distance matrix is squared and double-centered, decomposed with
/// `solver`, and the top `n_components` axes are kept. Coordinates are the
/// eigenvectors scaled by the square root of their (non-negative part of
/// the) eigenvalue.
///
/// # Arguments
/// * `dm` - Sample distance matrix
/// * `n_components` - Number of axes to keep; clamped to the sample count
/// * `solver` - Symmetric eigendecomposition provider
///
/// # Returns
/// Coordinates, retained eigenvalues, and explained variance where each
/// eigenvalue is divided by the sum of all positive eigenvalues.
pub fn pcoa(dm: &DistanceMatrix, n_components: usize, solver: &dyn Eigensolver) -> Result<PcoaResult> {
    if n_components == 0 {
        return Err(EcoError::InvalidParameter(
            "PCoA needs at least one component".to_string(),
        ));
    }
    let n = dm.n_samples();
    let k = if n_components > n {
        warn!(
            "Requested {} PCoA components but only {} samples; keeping {}",
            n_components, n, n
        );
        n
    } else {
        n_components
    };

    let axes: Vec<String> = (1..=k).map(|a| format!("PC{}", a)).collect();
    if n == 0 {
        return Ok(PcoaResult {
            coordinates: PcoaCoordinates {
                sample_ids: Vec::new(),
                axes,
                values: DMatrix::zeros(0, 0),
            },
            eigenvalues: Vec::new(),
            explained_variance: Vec::new(),
        });
    }

    let centered = double_center(dm);
    let eigen = solver.symmetric_eigen(&centered)?;
    if eigen.values.len() != n || eigen.vectors.shape() != (n, n) {
        return Err(EcoError::Numerical(format!(
            "Eigensolver '{}' returned {} values and a {}x{} basis for a {}x{} matrix",
            solver.name(),
            eigen.values.len(),
            eigen.vectors.nrows(),
            eigen.vectors.ncols(),
            n,
            n
        )));
    }
    debug!("PCoA eigendecomposition via {} on {} samples", solver.name(), n);

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        eigen.values[b]
            .partial_cmp(&eigen.values[a])
            .unwrap_or(Ordering::Equal)
    });

    let eigenvalues: Vec<f64> = order[..k].iter().map(|&idx| eigen.values[idx]).collect();
    let values = DMatrix::from_fn(n, k, |i, axis| {
        let idx = order[axis];
        eigen.vectors[(i, idx)] * eigen.values[idx].max(0.0).sqrt()
    });

    let total: f64 = eigen.values.iter().map(|v| v.max(0.0)).sum();
    let explained_variance = if total > 0.0 {
        eigenvalues.iter().map(|v| v / total).collect()
    } else {
        eigenvalues.clone()
    };

    Ok(PcoaResult {
        coordinates: PcoaCoordinates {
            sample_ids: dm.sample_ids().to_vec(),
            axes,
            values,
        },
        eigenvalues,
        explained_variance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beta::distance::{distance_matrix, euclidean_distance, DistanceMetric};
    use crate::beta::eigen::{Eigendecomposition, NalgebraEigensolver};
    use approx::assert_relative_eq;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("S{}", i + 1)).collect()
    }

    fn planar_points() -> Vec<Vec<f64>> {
        vec![
            vec![0.0, 0.0],
            vec![3.0, 0.5],
            vec![1.0, 4.0],
            vec![-2.0, 1.5],
            vec![2.5, -3.0],
            vec![-1.0, -1.0],
        ]
    }

    #[test]
    fn test_recovers_euclidean_configuration() {
        let points = planar_points();
        let dm = distance_matrix(&points, &ids(points.len()), DistanceMetric::Euclidean).unwrap();
        let result = pcoa(&dm, 2, &NalgebraEigensolver::default()).unwrap();

        let coords = &result.coordinates;
        assert_eq!(coords.n_axes(), 2);
        for i in 0..points.len() {
            for j in 0..points.len() {
                let recovered = euclidean_distance(&coords.point(i), &coords.point(j));
                assert_relative_eq!(recovered, dm.get(i, j), epsilon = 1e-6);
            }
        }
        // Planar input: two axes carry all the inertia.
        assert_relative_eq!(result.explained_variance.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_eigenvalues_descending() {
        let samples = vec![
            vec![10.0, 0.0, 3.0, 1.0],
            vec![8.0, 1.0, 0.0, 0.0],
            vec![0.0, 12.0, 5.0, 2.0],
            vec![1.0, 9.0, 4.0, 0.0],
            vec![5.0, 5.0, 5.0, 5.0],
        ];
        let dm = distance_matrix(&samples, &ids(5), DistanceMetric::BrayCurtis).unwrap();
        let result = pcoa(&dm, 3, &NalgebraEigensolver::default()).unwrap();

        assert_eq!(result.eigenvalues.len(), 3);
        assert_eq!(result.explained_variance.len(), 3);
        for w in result.eigenvalues.windows(2) {
            assert!(w[0] >= w[1]);
        }
        assert!(result.explained_variance[0] > 0.0);
        assert!(result.explained_variance.iter().sum::<f64>() <= 1.0 + 1e-9);
    }

    #[test]
    fn test_components_clamped() {
        let points = planar_points();
        let dm = distance_matrix(&points[..3], &ids(3), DistanceMetric::Euclidean).unwrap();
        let result = pcoa(&dm, 10, &NalgebraEigensolver::default()).unwrap();
        assert_eq!(result.coordinates.axes(), &["PC1", "PC2", "PC3"]);
        assert_eq!(result.coordinates.matrix().shape(), (3, 3));
    }

    #[test]
    fn test_zero_components_rejected() {
        let dm = distance_matrix(&planar_points(), &ids(6), DistanceMetric::Euclidean).unwrap();
        assert!(matches!(
            pcoa(&dm, 0, &NalgebraEigensolver::default()),
            Err(EcoError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_identical_samples() {
        let samples = vec![vec![1.0, 2.0]; 3];
        let dm = distance_matrix(&samples, &ids(3), DistanceMetric::BrayCurtis).unwrap();
        let result = pcoa(&dm, 2, &NalgebraEigensolver::default()).unwrap();
        for i in 0..3 {
            for axis in 0..2 {
                assert_relative_eq!(result.coordinates.get(i, axis), 0.0, epsilon = 1e-12);
            }
        }
    }

    struct FailingSolver;

    impl Eigensolver for FailingSolver {
        fn symmetric_eigen(&self, _matrix: &DMatrix<f64>) -> Result<Eigendecomposition> {
            Err(EcoError::Numerical("no convergence".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn test_solver_failure_propagates() {
        let dm = distance_matrix(&planar_points(), &ids(6), DistanceMetric::Euclidean).unwrap();
        assert!(matches!(pcoa(&dm, 2, &FailingSolver), Err(EcoError::Numerical(_))));
    }

    #[test]
    fn test_serialized_shape() {
        let points = planar_points();
        let dm = distance_matrix(&points, &ids(6), DistanceMetric::Euclidean).unwrap();
        let result = pcoa(&dm, 2, &NalgebraEigensolver::default()).unwrap();

        let json = serde_json::to_value(&result.coordinates).unwrap();
        assert!(json["PC1"]["S1"].is_number());
        assert!(json["PC2"]["S6"].is_number());
        assert!(json.get("PC3").is_none());
    }
}
