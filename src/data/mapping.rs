//! Loaders for the external key → value tables that feed normalization and
//! aggregation: total reads per sample and feature → category annotations.

use crate::error::{EcoError, Result};
use std::collections::HashMap;
use std::path::Path;

fn tsv_reader<P: AsRef<Path>>(path: P) -> Result<csv::Reader<std::fs::File>> {
    Ok(csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?)
}

/// Read total sequencing reads per sample.
///
/// Expected format: header row, then `sample_id <TAB> total_reads`.
pub fn read_total_reads<P: AsRef<Path>>(path: P) -> Result<HashMap<String, u64>> {
    let mut reader = tsv_reader(path)?;
    let mut totals = HashMap::new();

    for (row_idx, record) in reader.records().enumerate() {
        let record = record?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        if record.len() < 2 {
            return Err(EcoError::DimensionMismatch {
                expected: 2,
                actual: record.len(),
            });
        }
        let reads: u64 = record[1].parse().map_err(|_| EcoError::InvalidValue {
            value: record[1].to_string(),
            row: row_idx,
            col: 1,
        })?;
        if totals.insert(record[0].to_string(), reads).is_some() {
            return Err(EcoError::DuplicateId(record[0].to_string()));
        }
    }

    Ok(totals)
}

/// Read a feature → category mapping from one named column of an annotation
/// table (first column is the feature ID; e.g. `drug_class`).
///
/// Empty and `NA` categories are skipped, so those features fall into the
/// unknown bucket when aggregating.
pub fn read_feature_categories<P: AsRef<Path>>(
    path: P,
    column: &str,
) -> Result<HashMap<String, String>> {
    let mut reader = tsv_reader(path)?;
    let header = reader.headers()?.clone();
    let col_idx = header
        .iter()
        .skip(1)
        .position(|h| h == column)
        .map(|i| i + 1)
        .ok_or_else(|| EcoError::MissingColumn(column.to_string()))?;

    let mut categories = HashMap::new();
    for record in reader.records() {
        let record = record?;
        let Some(feature) = record.get(0).filter(|f| !f.is_empty()) else {
            continue;
        };
        match record.get(col_idx) {
            Some(category) if !category.is_empty() && category != "NA" => {
                categories.insert(feature.to_string(), category.to_string());
            }
            _ => {}
        }
    }

    Ok(categories)
}
