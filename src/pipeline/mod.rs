//! End-to-end ecological analysis: configuration, capabilities and the
//! orchestrating runner.

mod capability;
mod config;
mod runner;

pub use capability::Capabilities;
pub use config::{AnalysisConfig, CapabilityFlags, FilterConfig};
pub use runner::{AnalysisResult, BetaDiversityResult, EcologicalAnalysis};
