use std::time::Duration;

use super::template::SlotLayout;

/// Tunables for enumeration, admission and reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Largest combination space walked exactly; larger spaces are counted.
    pub enumeration_ceiling: u64,
    /// Wall-clock allowance for an exact walk before it falls back to counting.
    pub enumeration_time_budget: Option<Duration>,
    /// Pairs scoring at or below this value are treated as vetoed.
    pub min_pair_score: f64,
    pub top_outfit_limit: usize,
    pub default_capsule_size: i64,
    /// Marginal-gain evaluations one capsule selection may spend before it
    /// settles for the best capsule found so far.
    pub selection_evaluation_limit: u64,
    /// Opening bundles the capsule selector completes, the greedy one included.
    pub capsule_restarts: usize,
    pub layout: SlotLayout,
    pub insights: InsightThresholds,
}

impl EngineConfig {
    /// Iterations an exact walk may spend before failing closed.
    pub(crate) fn step_limit(&self) -> u64 {
        self.enumeration_ceiling.saturating_mul(4).max(1)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enumeration_ceiling: 100_000,
            enumeration_time_budget: Some(Duration::from_millis(250)),
            min_pair_score: 0.0,
            top_outfit_limit: 10,
            default_capsule_size: 20,
            selection_evaluation_limit: 500_000,
            capsule_restarts: 4,
            layout: SlotLayout::standard(),
            insights: InsightThresholds::default(),
        }
    }
}

/// Presentation thresholds for generated insight text.
#[derive(Debug, Clone, PartialEq)]
pub struct InsightThresholds {
    pub high_compatibility_avg: f64,
    pub minimum_catalog_size: usize,
}

impl Default for InsightThresholds {
    fn default() -> Self {
        Self {
            high_compatibility_avg: 70.0,
            minimum_catalog_size: 5,
        }
    }
}
