//! Sample → group label assignments used by two-group comparisons.

use crate::error::{EcoError, Result};
use std::collections::{BTreeSet, HashMap};

/// Mapping from sample ID to a group tag, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupLabeling {
    samples: Vec<String>,
    labels: HashMap<String, String>,
}

impl GroupLabeling {
    /// Create an empty labeling.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(sample_id, group)` pairs. A sample may appear only once.
    pub fn from_pairs<I, S, G>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, G)>,
        S: Into<String>,
        G: Into<String>,
    {
        let mut labeling = Self::new();
        for (sample, group) in pairs {
            labeling.insert(sample.into(), group.into())?;
        }
        Ok(labeling)
    }

    /// Assign a group to a sample.
    pub fn insert(&mut self, sample_id: String, group: String) -> Result<()> {
        if self.labels.contains_key(&sample_id) {
            return Err(EcoError::DuplicateId(sample_id));
        }
        self.samples.push(sample_id.clone());
        self.labels.insert(sample_id, group);
        Ok(())
    }

    /// Group of a sample, if labeled.
    pub fn get(&self, sample_id: &str) -> Option<&str> {
        self.labels.get(sample_id).map(String::as_str)
    }

    /// Number of labeled samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Labeled sample IDs in insertion order.
    pub fn sample_ids(&self) -> &[String] {
        &self.samples
    }

    /// Distinct group tags, sorted.
    pub fn levels(&self) -> Vec<String> {
        self.labels
            .values()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Positions within `sample_ids` whose label equals `group`.
    ///
    /// Unlabeled samples never match.
    pub fn indices_in(&self, sample_ids: &[String], group: &str) -> Vec<usize> {
        sample_ids
            .iter()
            .enumerate()
            .filter(|(_, sid)| self.get(sid) == Some(group))
            .map(|(i, _)| i)
            .collect()
    }
}
