use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::ItemId;
use super::repository::CatalogError;

/// Score assumed for any pair the catalog has no opinion about.
pub const DEFAULT_PAIR_SCORE: f64 = 1.0;

/// Symmetric pairwise compatibility relation keyed by unordered item pairs.
///
/// A score of `0.0` is a hard veto; anything in `(0, 1)` is advisory and only
/// influences outfit ranking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CompatibilityEntry>", into = "Vec<CompatibilityEntry>")]
pub struct CompatibilityMatrix {
    scores: BTreeMap<(ItemId, ItemId), f64>,
}

/// Wire form of one matrix cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityEntry {
    pub item_a: ItemId,
    pub item_b: ItemId,
    pub score: f64,
}

fn pair_key(a: &ItemId, b: &ItemId) -> (ItemId, ItemId) {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

impl CompatibilityMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a score for the unordered pair, clamping it into `[0, 1]`.
    pub fn insert(&mut self, a: ItemId, b: ItemId, score: f64) -> Result<(), CatalogError> {
        if a == b {
            return Err(CatalogError::InvalidRecord(format!(
                "item {a} cannot be scored against itself"
            )));
        }
        if !score.is_finite() {
            return Err(CatalogError::InvalidRecord(format!(
                "compatibility score for {a}/{b} must be a finite number"
            )));
        }

        self.scores.insert(pair_key(&a, &b), score.clamp(0.0, 1.0));
        Ok(())
    }

    pub fn score(&self, a: &ItemId, b: &ItemId) -> f64 {
        self.scores
            .get(&pair_key(a, b))
            .copied()
            .unwrap_or(DEFAULT_PAIR_SCORE)
    }

    pub fn is_vetoed(&self, a: &ItemId, b: &ItemId) -> bool {
        self.score(a, b) <= 0.0
    }

    /// Drop every entry that references `id`.
    pub fn remove_item(&mut self, id: &ItemId) -> usize {
        let before = self.scores.len();
        self.scores.retain(|(a, b), _| a != id && b != id);
        before - self.scores.len()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&ItemId, &ItemId, f64)> {
        self.scores.iter().map(|((a, b), score)| (a, b, *score))
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

impl TryFrom<Vec<CompatibilityEntry>> for CompatibilityMatrix {
    type Error = CatalogError;

    /// Fails on the first entry [`insert`](Self::insert) would reject.
    fn try_from(entries: Vec<CompatibilityEntry>) -> Result<Self, Self::Error> {
        let mut matrix = CompatibilityMatrix::new();
        for entry in entries {
            matrix.insert(entry.item_a, entry.item_b, entry.score)?;
        }
        Ok(matrix)
    }
}

impl From<CompatibilityMatrix> for Vec<CompatibilityEntry> {
    fn from(matrix: CompatibilityMatrix) -> Self {
        matrix
            .scores
            .into_iter()
            .map(|((item_a, item_b), score)| CompatibilityEntry {
                item_a,
                item_b,
                score,
            })
            .collect()
    }
}
