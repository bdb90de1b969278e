//! Sample metadata (bioproject, sample type, location, ...) keyed by sample ID.

use crate::data::GroupLabeling;
use crate::error::{EcoError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

/// A metadata value: categorical text, a number, or missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Variable {
    /// Categorical variable with string levels.
    Categorical(String),
    /// Continuous numeric variable.
    Continuous(f64),
    /// Missing value.
    Missing,
}

impl Variable {
    /// Check if this is a missing value.
    pub fn is_missing(&self) -> bool {
        matches!(self, Variable::Missing)
    }

    /// Try to get as categorical string.
    pub fn as_categorical(&self) -> Option<&str> {
        match self {
            Variable::Categorical(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as continuous f64.
    pub fn as_continuous(&self) -> Option<f64> {
        match self {
            Variable::Continuous(v) => Some(*v),
            _ => None,
        }
    }

    /// Text form used for group labels; `None` when missing.
    pub fn as_label(&self) -> Option<String> {
        match self {
            Variable::Categorical(s) => Some(s.clone()),
            Variable::Continuous(v) => Some(v.to_string()),
            Variable::Missing => None,
        }
    }
}

/// Inferred type of a metadata column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableType {
    Categorical,
    Continuous,
}

/// Sample metadata table.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    /// Sample IDs in file order.
    sample_ids: Vec<String>,
    /// Column names (excluding the sample ID column).
    column_names: Vec<String>,
    /// sample_id -> column_name -> value.
    data: HashMap<String, HashMap<String, Variable>>,
    /// Inferred type for each column.
    column_types: HashMap<String, VariableType>,
}

fn is_missing_token(raw: &str) -> bool {
    raw.is_empty() || raw == "NA" || raw == "na"
}

impl Metadata {
    /// Create empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load metadata from a TSV file.
    ///
    /// The first column holds sample IDs. A column is continuous if every
    /// present value parses as a number, otherwise categorical. Empty cells,
    /// `NA` and `na` are missing; short rows are padded with missing values.
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
                "Metadata must have at least one variable column".to_string(),
            ));
        }
        let column_names: Vec<String> = header.iter().skip(1).map(String::from).collect();

        let mut raw_rows: Vec<(String, Vec<String>)> = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.iter().all(|field| field.is_empty()) {
                continue;
            }
            let sample_id = record[0].to_string();
            let values = record.iter().skip(1).map(String::from).collect();
            raw_rows.push((sample_id, values));
        }

        if raw_rows.is_empty() {
            return Err(EcoError::EmptyData("No samples in metadata".to_string()));
        }

        let column_types: HashMap<String, VariableType> = column_names
            .iter()
            .enumerate()
            .map(|(col_idx, name)| {
                let all_numeric = raw_rows.iter().all(|(_, values)| {
                    values
                        .get(col_idx)
                        .map(|v| is_missing_token(v) || v.parse::<f64>().is_ok())
                        .unwrap_or(true)
                });
                let var_type = if all_numeric {
                    VariableType::Continuous
                } else {
                    VariableType::Categorical
                };
                (name.clone(), var_type)
            })
            .collect();

        let mut sample_ids = Vec::with_capacity(raw_rows.len());
        let mut data = HashMap::with_capacity(raw_rows.len());

        for (sample_id, values) in raw_rows {
            if data.contains_key(&sample_id) {
                return Err(EcoError::DuplicateId(sample_id));
            }
            let sample_data: HashMap<String, Variable> = column_names
                .iter()
                .enumerate()
                .map(|(col_idx, name)| {
                    let var = match values.get(col_idx).map(String::as_str) {
                        None => Variable::Missing,
                        Some(raw) if is_missing_token(raw) => Variable::Missing,
                        Some(raw) => match column_types.get(name) {
                            Some(VariableType::Continuous) => raw
                                .parse::<f64>()
                                .map(Variable::Continuous)
                                .unwrap_or(Variable::Missing),
                            _ => Variable::Categorical(raw.to_string()),
                        },
                    };
                    (name.clone(), var)
                })
                .collect();
            sample_ids.push(sample_id.clone());
            data.insert(sample_id, sample_data);
        }

        Ok(Self {
            sample_ids,
            column_names,
            data,
            column_types,
        })
    }

    /// Sample IDs in order.
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Column names.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Number of samples.
    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    /// Number of columns (variables).
    pub fn n_columns(&self) -> usize {
        self.column_names.len()
    }

    /// Get a value for a specific sample and column.
    pub fn get(&self, sample_id: &str, column: &str) -> Option<&Variable> {
        self.data.get(sample_id).and_then(|m| m.get(column))
    }

    /// Get all values for a column, in sample order.
    pub fn column(&self, column: &str) -> Result<Vec<&Variable>> {
        if !self.has_column(column) {
            return Err(EcoError::MissingColumn(column.to_string()));
        }
        Ok(self
            .sample_ids
            .iter()
            .map(|sid| self.get(sid, column).unwrap_or(&Variable::Missing))
            .collect())
    }

    /// Get the inferred type of a column.
    pub fn column_type(&self, column: &str) -> Option<VariableType> {
        self.column_types.get(column).copied()
    }

    /// Distinct present values of a column, sorted.
    pub fn levels(&self, column: &str) -> Result<Vec<String>> {
        let levels: BTreeSet<String> = self
            .column(column)?
            .iter()
            .filter_map(|v| v.as_label())
            .collect();
        Ok(levels.into_iter().collect())
    }

    /// Group labels taken from one column.
    ///
    /// Samples with a missing value are left unlabeled, which excludes them
    /// from group comparisons.
    pub fn group_labeling(&self, column: &str) -> Result<GroupLabeling> {
        let values = self.column(column)?;
        let pairs = self
            .sample_ids
            .iter()
            .zip(values)
            .filter_map(|(sid, var)| var.as_label().map(|label| (sid.clone(), label)));
        GroupLabeling::from_pairs(pairs)
    }

    /// Check if a sample exists.
    pub fn has_sample(&self, sample_id: &str) -> bool {
        self.data.contains_key(sample_id)
    }

    /// Check if a column exists.
    pub fn has_column(&self, column: &str) -> bool {
        self.column_names.iter().any(|c| c == column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_tsv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "sample_id\tbioproject\tsample_type\tcountry\tdepth").unwrap();
        writeln!(file, "WW1\tPRJNA1\tmedical_influenced\tDE\t12").unwrap();
        writeln!(file, "WW2\tPRJNA1\tnon_medical\tDE\t15").unwrap();
        writeln!(file, "WW3\tPRJNA2\tmedical_influenced\tNL\t9").unwrap();
        writeln!(file, "WW4\tPRJNA2\tNA\tNL").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_metadata() {
        let file = create_test_tsv();
        let meta = Metadata::from_tsv(file.path()).unwrap();

        assert_eq!(meta.n_samples(), 4);
        assert_eq!(meta.n_columns(), 4);
        assert_eq!(meta.sample_ids(), &["WW1", "WW2", "WW3", "WW4"]);
        assert!(meta.has_column("sample_type"));
        assert!(meta.has_sample("WW3"));
    }

    #[test]
    fn test_column_type_inference() {
        let file = create_test_tsv();
        let meta = Metadata::from_tsv(file.path()).unwrap();

        assert_eq!(meta.column_type("sample_type"), Some(VariableType::Categorical));
        assert_eq!(meta.column_type("depth"), Some(VariableType::Continuous));
        assert_eq!(meta.get("WW2", "depth").unwrap().as_continuous(), Some(15.0));
    }

    #[test]
    fn test_missing_values() {
        let file = create_test_tsv();
        let meta = Metadata::from_tsv(file.path()).unwrap();

        assert!(meta.get("WW4", "sample_type").unwrap().is_missing());
        // Short row is padded.
        assert!(meta.get("WW4", "depth").unwrap().is_missing());
    }

    #[test]
    fn test_levels() {
        let file = create_test_tsv();
        let meta = Metadata::from_tsv(file.path()).unwrap();

        let levels = meta.levels("sample_type").unwrap();
        assert_eq!(levels, vec!["medical_influenced", "non_medical"]);
        assert!(meta.levels("location").is_err());
    }

    #[test]
    fn test_group_labeling_skips_missing() {
        let file = create_test_tsv();
        let meta = Metadata::from_tsv(file.path()).unwrap();

        let labels = meta.group_labeling("sample_type").unwrap();
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.get("WW1"), Some("medical_influenced"));
        assert_eq!(labels.get("WW4"), None);
    }

    #[test]
    fn test_missing_column() {
        let file = create_test_tsv();
        let meta = Metadata::from_tsv(file.path()).unwrap();
        assert!(matches!(
            meta.group_labeling("treatment"),
            Err(EcoError::MissingColumn(_))
        ));
    }
}
