use super::domain::{ClothingItem, ItemId, NewClothingItem};
use super::matrix::CompatibilityMatrix;

/// Immutable view of the catalog taken once per analysis request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogSnapshot {
    pub items: Vec<ClothingItem>,
    pub scores: CompatibilityMatrix,
}

impl CatalogSnapshot {
    pub fn new(items: Vec<ClothingItem>, scores: CompatibilityMatrix) -> Self {
        Self { items, scores }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Storage abstraction owning clothing records and their pairwise scores.
pub trait ItemCatalog: Send + Sync {
    fn list_items(&self) -> Result<Vec<ClothingItem>, CatalogError>;
    fn get_item(&self, id: &ItemId) -> Result<Option<ClothingItem>, CatalogError>;
    fn insert_item(&self, item: NewClothingItem) -> Result<ClothingItem, CatalogError>;
    fn remove_item(&self, id: &ItemId) -> Result<ClothingItem, CatalogError>;
    fn compatibility_scores(&self) -> Result<CompatibilityMatrix, CatalogError>;
    fn set_compatibility(&self, a: &ItemId, b: &ItemId, score: f64) -> Result<(), CatalogError>;

    fn snapshot(&self) -> Result<CatalogSnapshot, CatalogError> {
        Ok(CatalogSnapshot {
            items: self.list_items()?,
            scores: self.compatibility_scores()?,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("item {0} not found")]
    NotFound(ItemId),
    #[error("invalid catalog record: {0}")]
    InvalidRecord(String),
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}
