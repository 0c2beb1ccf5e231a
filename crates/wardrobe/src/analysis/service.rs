use std::sync::Arc;

use tracing::debug;

use super::views::{CapsuleRequest, CompatibilityRequest};
use crate::catalog::{CatalogError, ItemCatalog};
use crate::engine::{
    CapsuleRecommendation, CompatibilityReport, EngineConfig, EngineError, OutfitEngine,
    UtilizationRecord,
};

/// Service composing the catalog collaborator with the outfit engine.
pub struct WardrobeAnalysisService<C> {
    catalog: Arc<C>,
    engine: Arc<OutfitEngine>,
}

impl<C> WardrobeAnalysisService<C>
where
    C: ItemCatalog,
{
    pub fn new(catalog: Arc<C>, config: EngineConfig) -> Self {
        Self {
            catalog,
            engine: Arc::new(OutfitEngine::new(config)),
        }
    }

    pub fn engine(&self) -> &OutfitEngine {
        &self.engine
    }

    pub fn catalog(&self) -> &Arc<C> {
        &self.catalog
    }

    /// Validate filters, snapshot the catalog once, and analyse it.
    pub fn analyze_compatibility(
        &self,
        request: &CompatibilityRequest,
    ) -> Result<CompatibilityReport, AnalysisServiceError> {
        let filters = request.filters()?;
        let snapshot = self.catalog.snapshot()?;
        debug!(
            items = snapshot.items.len(),
            scored_pairs = snapshot.scores.len(),
            "analysing outfit compatibility"
        );
        Ok(self.engine.analyze_compatibility(&snapshot, &filters))
    }

    /// Per-item utilization across the whole catalog.
    pub fn analyze_utilization(&self) -> Result<Vec<UtilizationRecord>, AnalysisServiceError> {
        let snapshot = self.catalog.snapshot()?;
        Ok(self.engine.analyze_utilization(&snapshot).records)
    }

    pub fn recommend_capsule(
        &self,
        request: &CapsuleRequest,
    ) -> Result<CapsuleRecommendation, AnalysisServiceError> {
        let preferences = request.preferences()?;
        let desired_size = request.desired_size(self.engine.config().default_capsule_size)?;
        if desired_size <= 0 {
            return Err(EngineError::InvalidCapsuleSize(desired_size.to_string()).into());
        }

        let snapshot = self.catalog.snapshot()?;
        let recommendation = self
            .engine
            .recommend_capsule(&snapshot, desired_size, &preferences)?;
        Ok(recommendation)
    }
}

/// Error raised by the analysis service.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisServiceError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("analysis task failed: {0}")]
    Worker(String),
}
