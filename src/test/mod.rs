//! Statistical hypothesis testing for differential abundance.


pub use rank_sum::{wilcoxon_rank_sum, MannWhitneyU, RankSumMethod, RankSumResult, RankSumTest};
