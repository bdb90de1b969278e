//! Data structures for resistome ecology analysis.

mod abundance_matrix;
mod groups;
pub mod mapping;
mod metadata;
mod result;

pub use abundance_matrix::AbundanceMatrix;
pub use groups::GroupLabeling;
pub use mapping::{read_feature_categories, read_total_reads};
pub use metadata::{Metadata, Variable, VariableType};
pub use result::{DifferentialAbundanceResult, FeatureResult, ResultSummary};
