//! Beta diversity: between-sample distances and ordination.

pub mod distance;
pub mod eigen;
pub mod pcoa;

pub use distance::{
    bray_curtis_distance, distance_matrix, distance_matrix_for, euclidean_distance,
    jaccard_distance, DistanceMatrix, DistanceMetric,
};
pub use eigen::{Eigendecomposition, Eigensolver, NalgebraEigensolver};
pub use pcoa::{pcoa, PcoaCoordinates, PcoaResult};
