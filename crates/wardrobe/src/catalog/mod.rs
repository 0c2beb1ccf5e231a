//! Item catalog contract: clothing records, the pairwise compatibility
//! relation, and the adapters that load them.

pub mod domain;
pub mod import;
pub mod matrix;
pub mod repository;
pub mod router;

pub use domain::{
    Category, ClothingItem, Formality, ItemId, NewClothingItem, Season, UnknownValue,
};
pub use import::{CatalogCsvImporter, CatalogImportError};
pub use matrix::{CompatibilityEntry, CompatibilityMatrix, DEFAULT_PAIR_SCORE};
pub use repository::{CatalogError, CatalogSnapshot, ItemCatalog};
pub use router::catalog_router;
