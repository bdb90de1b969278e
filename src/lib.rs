//! Ecological analysis of antibiotic resistance gene (ARG) abundance tables.
//!
//! This library provides the building blocks of a resistome ecology study
//! over a features × samples abundance matrix.
//!
//! # Overview
//!
//! - **data**: Core data structures (AbundanceMatrix, Metadata, GroupLabeling, results)
//! - **normalize**: Reads-per-million and total-sum scaling
//! - **aggregate**: Collapsing genes into drug class / mechanism categories
//! - **filter**: Low-abundance feature filtering
//! - **alpha**: Within-sample diversity (Shannon, Simpson, Chao1, Pielou)
//! - **beta**: Between-sample distances and PCoA ordination
//! - **test**: Rank-sum hypothesis testing (Mann-Whitney U)
//! - **correct**: Multiple testing correction (Benjamini-Hochberg)
//! - **differential**: Two-group differential abundance
//! - **pipeline**: Capability-gated end-to-end analysis
//!
//! # Example
//!
//! ```no_run
//! use arg_ecology::prelude::*;
//!
//! let config = AnalysisConfig {
//!     output_dir: "results".into(),
//!     ..AnalysisConfig::default()
//! };
//! let result = EcologicalAnalysis::new(config)
//!     .run_full_analysis("arg_abundance.tsv", "sample_metadata.tsv")
//!     .unwrap();
//!
//! println!("{} samples analyzed", result.samples_analyzed);
//! ```

pub mod aggregate;
pub mod alpha;
pub mod beta;
pub mod correct;
pub mod data;
pub mod differential;
pub mod error;
pub mod filter;
pub mod normalize;
pub mod numeric;
pub mod pipeline;
pub mod test;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::aggregate::{aggregate_by_category, UNKNOWN_CATEGORY};
    pub use crate::alpha::{
        alpha_diversity, calculate_all, chao1_estimator, observed_richness, pielou_evenness,
        shannon_index, simpson_index, AlphaMetrics, DiversityReport,
    };
    pub use crate::beta::{
        bray_curtis_distance, distance_matrix, distance_matrix_for, euclidean_distance,
        jaccard_distance, pcoa, DistanceMatrix, DistanceMetric, Eigendecomposition, Eigensolver,
        NalgebraEigensolver, PcoaCoordinates, PcoaResult,
    };
    pub use crate::correct::{correct_bh, fdr_correction, BhCorrected};
    pub use crate::data::{
        read_feature_categories, read_total_reads, AbundanceMatrix, DifferentialAbundanceResult,
        FeatureResult, GroupLabeling, Metadata, ResultSummary, Variable, VariableType,
    };
    pub use crate::differential::{
        compare_groups, compare_groups_with, log2_fold_change, GroupComparison,
    };
    pub use crate::error::{EcoError, Result};
    pub use crate::filter::{filter_low_abundance, filter_low_abundance_with_stats, FilterResult};
    pub use crate::normalize::{norm_tss, normalize_by_total_reads, scale};
    pub use crate::pipeline::{
        AnalysisConfig, AnalysisResult, BetaDiversityResult, Capabilities, CapabilityFlags,
        EcologicalAnalysis, FilterConfig,
    };
    pub use crate::test::{
        wilcoxon_rank_sum, MannWhitneyU, RankSumMethod, RankSumResult, RankSumTest,
    };
}
