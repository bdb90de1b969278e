//! Filtering primitives for abundance matrices.

pub mod abundance;

pub use abundance::{filter_low_abundance, filter_low_abundance_with_stats, FilterResult};
