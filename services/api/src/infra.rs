use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;
use wardrobe::catalog::{
    CatalogError, CatalogSnapshot, ClothingItem, CompatibilityMatrix, ItemCatalog, ItemId,
    NewClothingItem,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct CatalogState {
    items: BTreeMap<ItemId, ClothingItem>,
    scores: CompatibilityMatrix,
    next_id: u64,
}

/// Process-local catalog used by the HTTP service until a durable store is
/// wired in. Removing an item also drops every score that mentions it.
#[derive(Default, Clone)]
pub(crate) struct InMemoryItemCatalog {
    state: Arc<Mutex<CatalogState>>,
}

impl InMemoryItemCatalog {
    /// Catalog pre-populated from an existing snapshot, keeping its ids.
    pub(crate) fn seeded(snapshot: CatalogSnapshot) -> Self {
        let items = snapshot
            .items
            .into_iter()
            .map(|item| (item.id.clone(), item))
            .collect::<BTreeMap<_, _>>();
        let next_id = items.len() as u64;
        Self {
            state: Arc::new(Mutex::new(CatalogState {
                items,
                scores: snapshot.scores,
                next_id,
            })),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, CatalogState>, CatalogError> {
        self.state
            .lock()
            .map_err(|_| CatalogError::Unavailable("catalog mutex poisoned".to_string()))
    }
}

impl ItemCatalog for InMemoryItemCatalog {
    fn list_items(&self) -> Result<Vec<ClothingItem>, CatalogError> {
        Ok(self.lock()?.items.values().cloned().collect())
    }

    fn get_item(&self, id: &ItemId) -> Result<Option<ClothingItem>, CatalogError> {
        Ok(self.lock()?.items.get(id).cloned())
    }

    fn insert_item(&self, item: NewClothingItem) -> Result<ClothingItem, CatalogError> {
        let mut guard = self.lock()?;
        let id = loop {
            guard.next_id += 1;
            let candidate = ItemId(format!("item-{:06}", guard.next_id));
            if !guard.items.contains_key(&candidate) {
                break candidate;
            }
        };
        let stored = item.into_item(id.clone(), Some(Utc::now()));
        guard.items.insert(id, stored.clone());
        Ok(stored)
    }

    fn remove_item(&self, id: &ItemId) -> Result<ClothingItem, CatalogError> {
        let mut guard = self.lock()?;
        let removed = guard
            .items
            .remove(id)
            .ok_or_else(|| CatalogError::NotFound(id.clone()))?;
        guard.scores.remove_item(id);
        Ok(removed)
    }

    fn compatibility_scores(&self) -> Result<CompatibilityMatrix, CatalogError> {
        Ok(self.lock()?.scores.clone())
    }

    fn set_compatibility(&self, a: &ItemId, b: &ItemId, score: f64) -> Result<(), CatalogError> {
        let mut guard = self.lock()?;
        for id in [a, b] {
            if !guard.items.contains_key(id) {
                return Err(CatalogError::NotFound(id.clone()));
            }
        }
        guard.scores.insert(a.clone(), b.clone(), score)
    }

    fn snapshot(&self) -> Result<CatalogSnapshot, CatalogError> {
        let guard = self.lock()?;
        Ok(CatalogSnapshot::new(
            guard.items.values().cloned().collect(),
            guard.scores.clone(),
        ))
    }
}
