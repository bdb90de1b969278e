//! Normalization methods for abundance tables.
//!
//! - **RPM**: reads per million using externally supplied sequencing depth
//! - **TSS**: total sum scaling over the observed column totals

pub mod rpm;
pub mod tss;

pub use rpm::normalize_by_total_reads;
pub use tss::norm_tss;

/// Common scale factors.
pub mod scale {
    /// Proportions (sum to 1.0 per sample under TSS).
    pub const PROPORTION: f64 = 1.0;
    /// Reads per million.
    pub const RPM: f64 = 1_000_000.0;
    /// Per 100 (percentages).
    pub const PERCENT: f64 = 100.0;
}
