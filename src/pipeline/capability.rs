//! Optional numerical capabilities, resolved once per analysis.

use super::config::CapabilityFlags;
use crate::beta::{Eigensolver, NalgebraEigensolver};
use crate::test::{MannWhitneyU, RankSumTest};
use std::fmt;
use std::sync::Arc;

/// Numerical back ends available to the orchestrator.
///
/// A missing capability disables the stage that needs it.
#[derive(Clone, Default)]
pub struct Capabilities {
    eigensolver: Option<Arc<dyn Eigensolver>>,
    rank_sum: Option<Arc<dyn RankSumTest>>,
}

impl Capabilities {
    /// No capabilities: only alpha diversity runs.
    pub fn none() -> Self {
        Self::default()
    }

    /// Built-in back ends for every enabled flag.
    pub fn from_flags(flags: &CapabilityFlags) -> Self {
        let mut capabilities = Self::none();
        if flags.linear_algebra {
            capabilities = capabilities.with_eigensolver(Arc::new(NalgebraEigensolver::default()));
        }
        if flags.statistics {
            capabilities = capabilities.with_rank_sum(Arc::new(MannWhitneyU::default()));
        }
        capabilities
    }

    pub fn with_eigensolver(mut self, solver: Arc<dyn Eigensolver>) -> Self {
        self.eigensolver = Some(solver);
        self
    }

    pub fn with_rank_sum(mut self, test: Arc<dyn RankSumTest>) -> Self {
        self.rank_sum = Some(test);
        self
    }

    pub fn eigensolver(&self) -> Option<&dyn Eigensolver> {
        self.eigensolver.as_deref()
    }

    pub fn rank_sum(&self) -> Option<&dyn RankSumTest> {
        self.rank_sum.as_deref()
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("eigensolver", &self.eigensolver().map(|s| s.name()))
            .field("rank_sum", &self.rank_sum().map(|t| t.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flags() {
        let all = Capabilities::from_flags(&CapabilityFlags::default());
        assert_eq!(all.eigensolver().map(|s| s.name()), Some("nalgebra"));
        assert_eq!(all.rank_sum().map(|t| t.name()), Some("mann-whitney-u"));

        let stats_only = Capabilities::from_flags(&CapabilityFlags {
            linear_algebra: false,
            statistics: true,
        });
        assert!(stats_only.eigensolver().is_none());
        assert!(stats_only.rank_sum().is_some());
    }

    #[test]
    fn test_none_and_injection() {
        let caps = Capabilities::none();
        assert!(caps.eigensolver().is_none());
        assert!(caps.rank_sum().is_none());

        let caps = caps.with_eigensolver(Arc::new(NalgebraEigensolver::default()));
        assert!(caps.eigensolver().is_some());
        assert!(format!("{:?}", caps).contains("nalgebra"));
    }
}
