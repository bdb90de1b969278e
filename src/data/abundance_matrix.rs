//! Dense abundance matrix for resistance gene counts or normalized values.

use crate::error::{EcoError, Result};
use nalgebra::DMatrix;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// A features × samples matrix of non-negative abundances.
///
/// Rows are features (ARGs, drug classes, ...), columns are samples. Both axes
/// carry unique identifiers whose order is the stored index order and is kept
/// by every derived matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct AbundanceMatrix {
    /// Dense values (features × samples).
    data: DMatrix<f64>,
    /// Feature identifiers (row names).
    feature_ids: Vec<String>,
    /// Sample identifiers (column names).
    sample_ids: Vec<String>,
}

impl AbundanceMatrix {
    /// Create a new AbundanceMatrix, validating shape, identifiers and values.
    pub fn new(
        data: DMatrix<f64>,
        feature_ids: Vec<String>,
        sample_ids: Vec<String>,
    ) -> Result<Self> {
        let (nrows, ncols) = data.shape();
        if nrows != feature_ids.len() {
            return Err(EcoError::DimensionMismatch {
                expected: nrows,
                actual: feature_ids.len(),
            });
        }
        if ncols != sample_ids.len() {
            return Err(EcoError::DimensionMismatch {
                expected: ncols,
                actual: sample_ids.len(),
            });
        }
        check_unique(&feature_ids)?;
        check_unique(&sample_ids)?;

        for row in 0..nrows {
            for col in 0..ncols {
                let value = data[(row, col)];
                if !value.is_finite() || value < 0.0 {
                    return Err(EcoError::InvalidValue {
                        value: value.to_string(),
                        row,
                        col,
                    });
                }
            }
        }

        Ok(Self {
            data,
            feature_ids,
            sample_ids,
        })
    }

    /// Build a matrix from row vectors (one per feature).
    pub fn from_rows(
        feature_ids: Vec<String>,
        sample_ids: Vec<String>,
        rows: &[Vec<f64>],
    ) -> Result<Self> {
        if rows.len() != feature_ids.len() {
            return Err(EcoError::DimensionMismatch {
                expected: feature_ids.len(),
                actual: rows.len(),
            });
        }
        let n_samples = sample_ids.len();
        let mut flat = Vec::with_capacity(rows.len() * n_samples);
        for row in rows {
            if row.len() != n_samples {
                return Err(EcoError::DimensionMismatch {
                    expected: n_samples,
                    actual: row.len(),
                });
            }
            flat.extend_from_slice(row);
        }
        let data = DMatrix::from_row_slice(rows.len(), n_samples, &flat);
        Self::new(data, feature_ids, sample_ids)
    }

    /// Load an abundance table from a TSV file.
    ///
    /// Expected format:
    /// - First row: header with sample IDs (first cell names the feature column)
    /// - Subsequent rows: feature ID followed by one value per sample
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let header = reader.headers()?.clone();
        if header.len() < 2 {
            return Err(EcoError::EmptyData(
                "Abundance table must have at least one sample column".to_string(),
            ));
        }
        let sample_ids: Vec<String> = header.iter().skip(1).map(String::from).collect();
        let n_samples = sample_ids.len();

        let mut feature_ids = Vec::new();
        let mut values: Vec<f64> = Vec::new();

        for (row_idx, record) in reader.records().enumerate() {
            let record = record?;
            if record.iter().all(|field| field.is_empty()) {
                continue;
            }
            if record.len() != n_samples + 1 {
                return Err(EcoError::DimensionMismatch {
                    expected: n_samples + 1,
                    actual: record.len(),
                });
            }
            feature_ids.push(record[0].to_string());

            for (col_idx, field) in record.iter().skip(1).enumerate() {
                let value = field
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite() && *v >= 0.0)
                    .ok_or_else(|| EcoError::InvalidValue {
                        value: field.to_string(),
                        row: row_idx,
                        col: col_idx,
                    })?;
                values.push(value);
            }
        }

        if feature_ids.is_empty() {
            return Err(EcoError::EmptyData(
                "No features in abundance table".to_string(),
            ));
        }

        let data = DMatrix::from_row_slice(feature_ids.len(), n_samples, &values);
        Self::new(data, feature_ids, sample_ids)
    }

    /// Write the matrix to a TSV file.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        write!(writer, "feature_id")?;
        for sample_id in &self.sample_ids {
            write!(writer, "\t{}", sample_id)?;
        }
        writeln!(writer)?;

        for (row_idx, feature_id) in self.feature_ids.iter().enumerate() {
            write!(writer, "{}", feature_id)?;
            for col_idx in 0..self.n_samples() {
                write!(writer, "\t{}", self.get(row_idx, col_idx))?;
            }
            writeln!(writer)?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Get the value at (row, col).
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[(row, col)]
    }

    /// Number of features (rows).
    #[inline]
    pub fn n_features(&self) -> usize {
        self.data.nrows()
    }

    /// Number of samples (columns).
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.data.ncols()
    }

    /// Feature identifiers.
    #[inline]
    pub fn feature_ids(&self) -> &[String] {
        &self.feature_ids
    }

    /// Sample identifiers.
    #[inline]
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Get the underlying dense matrix.
    #[inline]
    pub fn data(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// Position of a feature by identifier.
    pub fn feature_index(&self, feature_id: &str) -> Option<usize> {
        self.feature_ids.iter().position(|f| f == feature_id)
    }

    /// Position of a sample by identifier.
    pub fn sample_index(&self, sample_id: &str) -> Option<usize> {
        self.sample_ids.iter().position(|s| s == sample_id)
    }

    /// Values of one feature across all samples.
    pub fn row(&self, row: usize) -> Vec<f64> {
        self.data.row(row).iter().copied().collect()
    }

    /// Values of one sample across all features.
    pub fn column(&self, col: usize) -> Vec<f64> {
        self.data.column(col).iter().copied().collect()
    }

    /// One vector per sample, in sample order (the transposed view).
    pub fn samples_as_rows(&self) -> Vec<Vec<f64>> {
        (0..self.n_samples()).map(|col| self.column(col)).collect()
    }

    /// Total abundance per feature.
    pub fn row_sums(&self) -> Vec<f64> {
        (0..self.n_features())
            .into_par_iter()
            .map(|row| self.data.row(row).sum())
            .collect()
    }

    /// Total abundance per sample.
    pub fn col_sums(&self) -> Vec<f64> {
        (0..self.n_samples())
            .map(|col| self.data.column(col).sum())
            .collect()
    }

    /// Subset the matrix to include only specified features (by index).
    pub fn subset_features(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.n_features()) {
            return Err(EcoError::InvalidParameter(format!(
                "Feature index {} out of bounds",
                bad
            )));
        }
        check_unique_indices(indices)?;
        Ok(self.select_features(indices))
    }

    /// Subset the matrix to include only specified samples (by index).
    pub fn subset_samples(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.n_samples()) {
            return Err(EcoError::InvalidParameter(format!(
                "Sample index {} out of bounds",
                bad
            )));
        }
        check_unique_indices(indices)?;

        let data = DMatrix::from_fn(self.n_features(), indices.len(), |row, col| {
            self.data[(row, indices[col])]
        });
        let sample_ids = indices.iter().map(|&i| self.sample_ids[i].clone()).collect();

        Ok(Self {
            data,
            feature_ids: self.feature_ids.clone(),
            sample_ids,
        })
    }

    /// Row selection for indices already known to be valid and distinct.
    pub(crate) fn select_features(&self, indices: &[usize]) -> Self {
        let data = DMatrix::from_fn(indices.len(), self.n_samples(), |row, col| {
            self.data[(indices[row], col)]
        });
        let feature_ids = indices.iter().map(|&i| self.feature_ids[i].clone()).collect();

        Self {
            data,
            feature_ids,
            sample_ids: self.sample_ids.clone(),
        }
    }

    /// Replace the values while keeping identifiers. Shape must match.
    pub(crate) fn with_data(&self, data: DMatrix<f64>) -> Result<Self> {
        Self::new(data, self.feature_ids.clone(), self.sample_ids.clone())
    }
}

fn check_unique(ids: &[String]) -> Result<()> {
    let mut seen = HashSet::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(id.as_str()) {
            return Err(EcoError::DuplicateId(id.clone()));
        }
    }
    Ok(())
}

fn check_unique_indices(indices: &[usize]) -> Result<()> {
    let mut seen = HashSet::with_capacity(indices.len());
    for &i in indices {
        if !seen.insert(i) {
            return Err(EcoError::InvalidParameter(format!(
                "Index {} selected more than once",
                i
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_matrix() -> AbundanceMatrix {
        // 3 features × 4 samples
        AbundanceMatrix::from_rows(
            vec!["tetM".into(), "sul1".into(), "blaTEM".into()],
            vec!["S1".into(), "S2".into(), "S3".into(), "S4".into()],
            &[
                vec![10.0, 20.0, 0.0, 5.0],
                vec![100.0, 200.0, 150.0, 175.0],
                vec![1.0, 0.0, 0.0, 0.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_dimensions() {
        let mat = create_test_matrix();
        assert_eq!(mat.n_features(), 3);
        assert_eq!(mat.n_samples(), 4);
        assert_eq!(mat.get(1, 2), 150.0);
    }

    #[test]
    fn test_row_and_column() {
        let mat = create_test_matrix();
        assert_eq!(mat.row(0), vec![10.0, 20.0, 0.0, 5.0]);
        assert_eq!(mat.column(0), vec![10.0, 100.0, 1.0]);
        assert_eq!(mat.samples_as_rows().len(), 4);
    }

    #[test]
    fn test_sums() {
        let mat = create_test_matrix();
        assert_eq!(mat.row_sums(), vec![35.0, 625.0, 1.0]);
        assert_eq!(mat.col_sums(), vec![111.0, 220.0, 150.0, 180.0]);
    }

    #[test]
    fn test_rejects_negative_values() {
        let result = AbundanceMatrix::from_rows(
            vec!["a".into()],
            vec!["S1".into(), "S2".into()],
            &[vec![1.0, -2.0]],
        );
        assert!(matches!(
            result,
            Err(EcoError::InvalidValue { row: 0, col: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let result = AbundanceMatrix::from_rows(
            vec!["a".into(), "a".into()],
            vec!["S1".into()],
            &[vec![1.0], vec![2.0]],
        );
        assert!(matches!(result, Err(EcoError::DuplicateId(_))));
    }

    #[test]
    fn test_tsv_roundtrip() {
        let mat = create_test_matrix();

        let temp_file = NamedTempFile::new().unwrap();
        mat.to_tsv(temp_file.path()).unwrap();

        let loaded = AbundanceMatrix::from_tsv(temp_file.path()).unwrap();
        assert_eq!(loaded, mat);
    }

    #[test]
    fn test_from_tsv_rejects_non_numeric() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "gene\tS1\tS2").unwrap();
        writeln!(file, "tetM\t1\tabc").unwrap();
        file.flush().unwrap();

        let result = AbundanceMatrix::from_tsv(file.path());
        assert!(matches!(
            result,
            Err(EcoError::InvalidValue { row: 0, col: 1, .. })
        ));
    }

    #[test]
    fn test_from_tsv_rejects_ragged_rows() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "gene\tS1\tS2").unwrap();
        writeln!(file, "tetM\t1").unwrap();
        file.flush().unwrap();

        assert!(AbundanceMatrix::from_tsv(file.path()).is_err());
    }

    #[test]
    fn test_from_tsv_missing_file() {
        assert!(AbundanceMatrix::from_tsv("/nonexistent/abundance.tsv").is_err());
    }

    #[test]
    fn test_subset_features() {
        let mat = create_test_matrix();
        let subset = mat.subset_features(&[0, 2]).unwrap();

        assert_eq!(subset.n_features(), 2);
        assert_eq!(subset.feature_ids(), &["tetM", "blaTEM"]);
        assert_eq!(subset.get(1, 0), 1.0);
        assert!(mat.subset_features(&[5]).is_err());
    }

    #[test]
    fn test_subset_samples() {
        let mat = create_test_matrix();
        let subset = mat.subset_samples(&[1, 3]).unwrap();

        assert_eq!(subset.n_samples(), 2);
        assert_eq!(subset.sample_ids(), &["S2", "S4"]);
        assert_eq!(subset.get(0, 0), 20.0);
        assert_eq!(subset.get(0, 1), 5.0);
    }

    #[test]
    fn test_index_lookup() {
        let mat = create_test_matrix();
        assert_eq!(mat.feature_index("sul1"), Some(1));
        assert_eq!(mat.sample_index("S4"), Some(3));
        assert_eq!(mat.sample_index("S9"), None);
    }
}
