//! Outfit compatibility, enumeration, utilization and capsule selection.
//!
//! Everything here is a pure computation over a [`CatalogSnapshot`]; the
//! engine never reads or writes the catalog itself.

pub mod capsule;
pub mod compatibility;
pub mod config;
mod counting;
pub mod enumerator;
pub mod error;
pub mod filters;
pub mod insights;
pub mod template;
pub mod utilization;

use serde::Serialize;

use crate::catalog::{CatalogSnapshot, ClothingItem, CompatibilityMatrix};

pub use capsule::{CapsuleEntry, CapsuleRecommendation, CapsuleSelector};
pub use compatibility::CompatibilityEvaluator;
pub use config::{EngineConfig, InsightThresholds};
pub use enumerator::{EnumerationMode, EnumerationResult, Outfit, OutfitEnumerator};
pub use error::EngineError;
pub use filters::{
    Budget, CapsulePreferences, Climate, FormalityFilter, Lifestyle, OutfitFilters, SeasonFilter,
};
pub use template::{LayoutError, OutfitSlotTemplate, SlotLayout};
pub use utilization::{aggregate, utilization_percentage, UtilizationRecord, UtilizationSummary};

/// Result of a filtered compatibility analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityReport {
    pub total_outfits: u64,
    pub items_analyzed: usize,
    pub avg_utilization: f64,
    pub item_utilization: Vec<UtilizationRecord>,
    pub insights: Vec<String>,
    pub mode: EnumerationMode,
    /// Highest-scoring outfits; empty when the counting path was used.
    pub top_outfits: Vec<Outfit>,
}

#[derive(Debug, Clone, Default)]
pub struct OutfitEngine {
    config: EngineConfig,
}

impl OutfitEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn evaluator<'a>(
        &'a self,
        scores: &'a CompatibilityMatrix,
        filters: &'a OutfitFilters,
    ) -> CompatibilityEvaluator<'a> {
        CompatibilityEvaluator::new(scores, filters, self.config.min_pair_score)
    }

    pub fn enumerate(
        &self,
        snapshot: &CatalogSnapshot,
        filters: &OutfitFilters,
    ) -> EnumerationResult {
        let items: Vec<&ClothingItem> = snapshot.items.iter().collect();
        OutfitEnumerator::new(&self.config, self.evaluator(&snapshot.scores, filters))
            .enumerate(&items)
    }

    pub fn analyze_compatibility(
        &self,
        snapshot: &CatalogSnapshot,
        filters: &OutfitFilters,
    ) -> CompatibilityReport {
        let mut result = self.enumerate(snapshot, filters);
        let analyzed: Vec<&ClothingItem> = snapshot
            .items
            .iter()
            .filter(|item| filters.admits(item))
            .collect();
        let summary = aggregate(&result, &analyzed);
        let insights = insights::compatibility_insights(
            &self.config.insights,
            &self.config.layout,
            &result,
            summary.average,
        );
        result.outfits.truncate(self.config.top_outfit_limit);

        CompatibilityReport {
            total_outfits: result.total_outfits,
            items_analyzed: result.items_analyzed,
            avg_utilization: summary.average,
            item_utilization: summary.records,
            insights,
            mode: result.mode,
            top_outfits: result.outfits,
        }
    }

    /// Utilization of every item with no formality or season restriction.
    pub fn analyze_utilization(&self, snapshot: &CatalogSnapshot) -> UtilizationSummary {
        let result = self.enumerate(snapshot, &OutfitFilters::default());
        let items: Vec<&ClothingItem> = snapshot.items.iter().collect();
        aggregate(&result, &items)
    }

    pub fn recommend_capsule(
        &self,
        snapshot: &CatalogSnapshot,
        desired_size: i64,
        preferences: &CapsulePreferences,
    ) -> Result<CapsuleRecommendation, EngineError> {
        let items: Vec<&ClothingItem> = snapshot.items.iter().collect();
        CapsuleSelector::new(&self.config, &snapshot.scores).select(
            &items,
            desired_size,
            preferences,
        )
    }
}
