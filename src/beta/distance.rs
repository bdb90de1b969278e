//! Pairwise between-sample distances.

use crate::data::AbundanceMatrix;
use crate::error::{EcoError, Result};
use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::io::Write;
use std::str::FromStr;

/// Bray-Curtis dissimilarity Σ|x_i - y_i| / Σ(x_i + y_i).
///
/// Two all-zero samples are at distance 0.
pub fn bray_curtis_distance(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    let (num, den) = x
        .iter()
        .zip(y)
        .fold((0.0, 0.0), |(num, den), (&a, &b)| {
            (num + (a - b).abs(), den + (a + b))
        });
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// Jaccard distance on presence/absence: 1 - |A ∩ B| / |A ∪ B|.
///
/// Two samples with no features present are at distance 0.
pub fn jaccard_distance(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    let (intersection, union) = x.iter().zip(y).fold((0usize, 0usize), |(inter, uni), (&a, &b)| {
        let (pa, pb) = (a > 0.0, b > 0.0);
        (inter + (pa && pb) as usize, uni + (pa || pb) as usize)
    });
    if union == 0 {
        0.0
    } else {
        1.0 - intersection as f64 / union as f64
    }
}

/// Euclidean distance.
pub fn euclidean_distance(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    x.iter()
        .zip(y)
        .map(|(&a, &b)| (a - b) * (a - b))
        .sum::<f64>()
        .sqrt()
}

/// Supported beta diversity metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Abundance-weighted Bray-Curtis dissimilarity.
    #[default]
    #[serde(alias = "bray_curtis", alias = "bray-curtis")]
    BrayCurtis,
    /// Presence/absence Jaccard distance.
    Jaccard,
    /// Euclidean distance.
    Euclidean,
}

impl DistanceMetric {
    /// Distance between two equal-length sample vectors.
    pub fn distance(&self, x: &[f64], y: &[f64]) -> f64 {
        match self {
            DistanceMetric::BrayCurtis => bray_curtis_distance(x, y),
            DistanceMetric::Jaccard => jaccard_distance(x, y),
            DistanceMetric::Euclidean => euclidean_distance(x, y),
        }
    }

    /// Canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            DistanceMetric::BrayCurtis => "braycurtis",
            DistanceMetric::Jaccard => "jaccard",
            DistanceMetric::Euclidean => "euclidean",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DistanceMetric {
    type Err = EcoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "braycurtis" | "bray_curtis" | "bray-curtis" => Ok(DistanceMetric::BrayCurtis),
            "jaccard" => Ok(DistanceMetric::Jaccard),
            "euclidean" => Ok(DistanceMetric::Euclidean),
            other => Err(EcoError::InvalidParameter(format!(
                "Unknown distance metric '{}'",
                other
            ))),
        }
    }
}

/// Symmetric, zero-diagonal sample × sample distance matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    sample_ids: Vec<String>,
    data: DMatrix<f64>,
}

impl DistanceMatrix {
    /// Wrap a precomputed square matrix.
    ///
    /// Entries must be finite and non-negative, the diagonal zero and the
    /// matrix symmetric (within [`SYMMETRY_TOLERANCE`], relative to the
    /// larger entry). Violations are reported as `InvalidValue` at the
    /// offending position.
    pub fn new(sample_ids: Vec<String>, data: DMatrix<f64>) -> Result<Self> {
        let (nrows, ncols) = data.shape();
        if nrows != ncols {
            return Err(EcoError::DimensionMismatch {
                expected: nrows,
                actual: ncols,
            });
        }
        if nrows != sample_ids.len() {
            return Err(EcoError::DimensionMismatch {
                expected: nrows,
                actual: sample_ids.len(),
            });
        }
        validate_distances(&data)?;
        Ok(Self { sample_ids, data })
    }

    /// Number of samples on each axis.
    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    /// Sample identifiers.
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Distance by position.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[(i, j)]
    }

    /// Distance by sample identifier.
    pub fn get_by_id(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.sample_ids.iter().position(|s| s == a)?;
        let j = self.sample_ids.iter().position(|s| s == b)?;
        Some(self.data[(i, j)])
    }

    /// Underlying matrix.
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// Write as a square TSV table.
    pub fn write_tsv<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        write!(writer, "sample_id")?;
        for sid in &self.sample_ids {
            write!(writer, "\t{}", sid)?;
        }
        writeln!(writer)?;
        for (i, sid) in self.sample_ids.iter().enumerate() {
            write!(writer, "{}", sid)?;
            for j in 0..self.n_samples() {
                write!(writer, "\t{}", self.data[(i, j)])?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }
}

/// Tolerance for symmetry and zero-diagonal checks on precomputed matrices.
pub const SYMMETRY_TOLERANCE: f64 = 1e-10;

fn validate_distances(data: &DMatrix<f64>) -> Result<()> {
    let invalid = |value: f64, row: usize, col: usize| EcoError::InvalidValue {
        value: value.to_string(),
        row,
        col,
    };

    let n = data.nrows();
    for i in 0..n {
        for j in 0..n {
            let d = data[(i, j)];
            if !d.is_finite() || d < 0.0 {
                return Err(invalid(d, i, j));
            }
        }
        if data[(i, i)] > SYMMETRY_TOLERANCE {
            return Err(invalid(data[(i, i)], i, i));
        }
    }
    for i in 0..n {
        for j in (i + 1)..n {
            let (a, b) = (data[(i, j)], data[(j, i)]);
            if (a - b).abs() > SYMMETRY_TOLERANCE * a.max(b).max(1.0) {
                return Err(invalid(b, j, i));
            }
        }
    }
    Ok(())
}

struct DistanceColumn<'a> {
    matrix: &'a DistanceMatrix,
    col: usize,
}

impl Serialize for DistanceColumn<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.matrix.n_samples()))?;
        for (row, sid) in self.matrix.sample_ids.iter().enumerate() {
            map.serialize_entry(sid, &self.matrix.data[(row, self.col)])?;
        }
        map.end()
    }
}

/// Serializes as `{column_sample: {row_sample: distance}}` in sample order.
impl Serialize for DistanceMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.n_samples()))?;
        for (col, sid) in self.sample_ids.iter().enumerate() {
            map.serialize_entry(sid, &DistanceColumn { matrix: self, col })?;
        }
        map.end()
    }
}

/// Compute all pairwise distances between samples.
///
/// # Arguments
/// * `samples` - One abundance vector per sample (samples × features)
/// * `sample_ids` - Identifiers in the same order as `samples`
/// * `metric` - Distance to apply to every pair
pub fn distance_matrix(
    samples: &[Vec<f64>],
    sample_ids: &[String],
    metric: DistanceMetric,
) -> Result<DistanceMatrix> {
    if samples.len() != sample_ids.len() {
        return Err(EcoError::DimensionMismatch {
            expected: sample_ids.len(),
            actual: samples.len(),
        });
    }
    let n = samples.len();
    if let Some(first) = samples.first() {
        if let Some(bad) = samples.iter().find(|s| s.len() != first.len()) {
            return Err(EcoError::DimensionMismatch {
                expected: first.len(),
                actual: bad.len(),
            });
        }
    }

    // Upper triangle, one row per task.
    let upper: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|i| {
            ((i + 1)..n)
                .map(|j| metric.distance(&samples[i], &samples[j]))
                .collect()
        })
        .collect();

    let mut data = DMatrix::zeros(n, n);
    for (i, row) in upper.iter().enumerate() {
        for (offset, &d) in row.iter().enumerate() {
            let j = i + 1 + offset;
            data[(i, j)] = d;
            data[(j, i)] = d;
        }
    }

    DistanceMatrix::new(sample_ids.to_vec(), data)
}

/// Distance matrix between the sample columns of an abundance matrix.
pub fn distance_matrix_for(matrix: &AbundanceMatrix, metric: DistanceMetric) -> Result<DistanceMatrix> {
    distance_matrix(&matrix.samples_as_rows(), matrix.sample_ids(), metric)
}
