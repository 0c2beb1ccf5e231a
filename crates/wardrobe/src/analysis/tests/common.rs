use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::analysis::{analysis_router, WardrobeAnalysisService};
use crate::catalog::{
    CatalogError, Category, ClothingItem, CompatibilityMatrix, Formality, ItemCatalog, ItemId,
    NewClothingItem, Season,
};
use crate::engine::EngineConfig;

#[derive(Default)]
pub(super) struct MemoryCatalog {
    items: Mutex<BTreeMap<ItemId, ClothingItem>>,
    scores: Mutex<CompatibilityMatrix>,
    snapshots: Mutex<usize>,
}

impl MemoryCatalog {
    pub(super) fn with_items(items: Vec<ClothingItem>) -> Self {
        let catalog = Self::default();
        {
            let mut stored = catalog.items.lock().expect("catalog mutex poisoned");
            for item in items {
                stored.insert(item.id.clone(), item);
            }
        }
        catalog
    }

    pub(super) fn veto(self, a: &str, b: &str) -> Self {
        self.scores
            .lock()
            .expect("scores mutex poisoned")
            .insert(ItemId::from(a), ItemId::from(b), 0.0)
            .expect("valid pair");
        self
    }

    pub(super) fn snapshot_count(&self) -> usize {
        *self.snapshots.lock().expect("counter mutex poisoned")
    }
}

impl ItemCatalog for MemoryCatalog {
    fn list_items(&self) -> Result<Vec<ClothingItem>, CatalogError> {
        *self.snapshots.lock().expect("counter mutex poisoned") += 1;
        Ok(self
            .items
            .lock()
            .expect("catalog mutex poisoned")
            .values()
            .cloned()
            .collect())
    }

    fn get_item(&self, id: &ItemId) -> Result<Option<ClothingItem>, CatalogError> {
        Ok(self
            .items
            .lock()
            .expect("catalog mutex poisoned")
            .get(id)
            .cloned())
    }

    fn insert_item(&self, item: NewClothingItem) -> Result<ClothingItem, CatalogError> {
        let mut items = self.items.lock().expect("catalog mutex poisoned");
        let id = ItemId(format!("item-{:03}", items.len() + 1));
        let stored = item.into_item(id.clone(), None);
        items.insert(id, stored.clone());
        Ok(stored)
    }

    fn remove_item(&self, id: &ItemId) -> Result<ClothingItem, CatalogError> {
        let removed = self
            .items
            .lock()
            .expect("catalog mutex poisoned")
            .remove(id)
            .ok_or_else(|| CatalogError::NotFound(id.clone()))?;
        self.scores
            .lock()
            .expect("scores mutex poisoned")
            .remove_item(id);
        Ok(removed)
    }

    fn compatibility_scores(&self) -> Result<CompatibilityMatrix, CatalogError> {
        Ok(self.scores.lock().expect("scores mutex poisoned").clone())
    }

    fn set_compatibility(&self, a: &ItemId, b: &ItemId, score: f64) -> Result<(), CatalogError> {
        self.scores
            .lock()
            .expect("scores mutex poisoned")
            .insert(a.clone(), b.clone(), score)
    }
}

pub(super) struct UnavailableCatalog;

impl ItemCatalog for UnavailableCatalog {
    fn list_items(&self) -> Result<Vec<ClothingItem>, CatalogError> {
        Err(CatalogError::Unavailable("database offline".to_string()))
    }

    fn get_item(&self, _id: &ItemId) -> Result<Option<ClothingItem>, CatalogError> {
        Err(CatalogError::Unavailable("database offline".to_string()))
    }

    fn insert_item(&self, _item: NewClothingItem) -> Result<ClothingItem, CatalogError> {
        Err(CatalogError::Unavailable("database offline".to_string()))
    }

    fn remove_item(&self, _id: &ItemId) -> Result<ClothingItem, CatalogError> {
        Err(CatalogError::Unavailable("database offline".to_string()))
    }

    fn compatibility_scores(&self) -> Result<CompatibilityMatrix, CatalogError> {
        Err(CatalogError::Unavailable("database offline".to_string()))
    }

    fn set_compatibility(
        &self,
        _a: &ItemId,
        _b: &ItemId,
        _score: f64,
    ) -> Result<(), CatalogError> {
        Err(CatalogError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn item(
    id: &str,
    name: &str,
    category: Category,
    formality: Formality,
    season: Season,
) -> ClothingItem {
    ClothingItem {
        id: ItemId::from(id),
        name: name.to_string(),
        category,
        color: "navy".to_string(),
        formality,
        season,
        notes: None,
        created_at: None,
    }
}

/// White shirt, blue jeans and sneakers: exactly one outfit.
pub(super) fn casual_basics() -> Vec<ClothingItem> {
    vec![
        item("shirt", "White Shirt", Category::Top, Formality::Casual, Season::All),
        item("jeans", "Blue Jeans", Category::Bottom, Formality::Casual, Season::All),
        item("sneakers", "Sneakers", Category::Shoes, Formality::Casual, Season::All),
    ]
}

/// Mixed casual and business pieces with one seasonal item.
pub(super) fn office_and_weekend() -> Vec<ClothingItem> {
    vec![
        item("blazer", "Navy Blazer", Category::Jacket, Formality::Business, Season::All),
        item("chinos", "Chinos", Category::Bottom, Formality::Business, Season::All),
        item("jeans", "Blue Jeans", Category::Bottom, Formality::Casual, Season::All),
        item("loafers", "Loafers", Category::Shoes, Formality::Business, Season::All),
        item("oxford", "Oxford Shirt", Category::Top, Formality::Business, Season::All),
        item("sandals", "Sandals", Category::Shoes, Formality::Casual, Season::Summer),
        item("sneakers", "Sneakers", Category::Shoes, Formality::Casual, Season::All),
        item("tee", "Grey Tee", Category::Top, Formality::Casual, Season::All),
    ]
}

pub(super) fn build_service(catalog: MemoryCatalog) -> WardrobeAnalysisService<MemoryCatalog> {
    WardrobeAnalysisService::new(Arc::new(catalog), EngineConfig::default())
}

pub(super) fn analysis_router_with_service(
    service: WardrobeAnalysisService<MemoryCatalog>,
) -> axum::Router {
    analysis_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
