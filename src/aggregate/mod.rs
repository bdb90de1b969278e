//! Collapsing feature rows into higher-level annotation categories.

pub mod category;

pub use category::{aggregate_by_category, UNKNOWN_CATEGORY};
