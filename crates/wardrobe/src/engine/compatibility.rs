use std::collections::BTreeMap;

use super::filters::OutfitFilters;
use crate::catalog::{Category, ClothingItem, CompatibilityMatrix, ItemId};

/// Pure admission rules for combining items into one outfit.
pub struct CompatibilityEvaluator<'a> {
    scores: &'a CompatibilityMatrix,
    filters: &'a OutfitFilters,
    min_pair_score: f64,
}

impl<'a> CompatibilityEvaluator<'a> {
    pub fn new(
        scores: &'a CompatibilityMatrix,
        filters: &'a OutfitFilters,
        min_pair_score: f64,
    ) -> Self {
        Self {
            scores,
            filters,
            min_pair_score,
        }
    }

    pub fn pair_score(&self, a: &ItemId, b: &ItemId) -> f64 {
        self.scores.score(a, b)
    }

    /// Whether the item survives the active formality and season filters.
    pub fn admits_item(&self, item: &ClothingItem) -> bool {
        self.filters.admits(item)
    }

    /// Pairwise admission: distinct categories, no veto, and matching
    /// formality when the filter demands uniform outfits.
    pub fn admits_pair(&self, a: &ClothingItem, b: &ClothingItem) -> bool {
        if a.id == b.id || a.category == b.category {
            return false;
        }
        if self.filters.formality.requires_uniform() && a.formality != b.formality {
            return false;
        }
        self.pair_score(&a.id, &b.id) > self.min_pair_score
    }

    pub fn is_compatible(&self, items: &[&ClothingItem]) -> bool {
        if !items.iter().all(|item| self.admits_item(item)) {
            return false;
        }
        items.iter().enumerate().all(|(index, item)| {
            items[index + 1..]
                .iter()
                .all(|other| self.admits_pair(item, other))
        })
    }

    /// Geometric mean of every pairwise score; used for ranking only.
    pub fn combination_score(&self, items: &[&ClothingItem]) -> f64 {
        geometric_mean(items.iter().enumerate().flat_map(|(index, item)| {
            items[index + 1..]
                .iter()
                .map(move |other| self.pair_score(&item.id, &other.id))
        }))
    }

    /// Filters, deduplicates and indexes the items an enumeration will walk.
    pub(crate) fn pool<'i>(&self, items: &[&'i ClothingItem]) -> ItemPool<'i> {
        let mut admitted: Vec<&'i ClothingItem> = items
            .iter()
            .copied()
            .filter(|item| self.admits_item(item))
            .collect();
        admitted.sort_by(|a, b| a.id.cmp(&b.id));
        admitted.dedup_by(|a, b| a.id == b.id);

        let mut slots: BTreeMap<Category, Vec<usize>> = BTreeMap::new();
        for (index, item) in admitted.iter().enumerate() {
            slots.entry(item.category).or_default().push(index);
        }

        let n = admitted.len();
        let mut rows = vec![IndexSet::empty(n); n];
        let mut scores = vec![1.0; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let score = self.pair_score(&admitted[i].id, &admitted[j].id);
                if self.admits_pair(admitted[i], admitted[j]) {
                    rows[i].insert(j);
                    rows[j].insert(i);
                }
                scores[i * n + j] = score;
                scores[j * n + i] = score;
            }
        }

        let masks = slots
            .iter()
            .map(|(category, members)| (*category, IndexSet::from_indices(n, members)))
            .collect();

        ItemPool {
            items: admitted,
            slots,
            uniform_formality: self.filters.formality.requires_uniform(),
            masks,
            rows,
            scores,
        }
    }
}

/// Geometric mean rounded to three decimals; any zero score yields zero and
/// an empty set of pairs yields 1.0.
fn geometric_mean(scores: impl Iterator<Item = f64>) -> f64 {
    let mut log_sum = 0.0;
    let mut pairs = 0u32;
    for score in scores {
        if score <= 0.0 {
            return 0.0;
        }
        log_sum += score.ln();
        pairs += 1;
    }
    if pairs == 0 {
        return 1.0;
    }
    ((log_sum / f64::from(pairs)).exp() * 1000.0).round() / 1000.0
}

/// Fixed-width bit set over pool indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IndexSet {
    words: Vec<u64>,
}

impl IndexSet {
    pub(crate) fn empty(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(64)],
        }
    }

    pub(crate) fn from_indices(len: usize, indices: &[usize]) -> Self {
        let mut set = Self::empty(len);
        for &index in indices {
            set.insert(index);
        }
        set
    }

    pub(crate) fn insert(&mut self, index: usize) {
        self.words[index / 64] |= 1u64 << (index % 64);
    }

    pub(crate) fn contains(&self, index: usize) -> bool {
        self.words
            .get(index / 64)
            .is_some_and(|word| word & (1u64 << (index % 64)) != 0)
    }

    pub(crate) fn intersect_with(&mut self, other: &IndexSet) {
        for (word, mask) in self.words.iter_mut().zip(&other.words) {
            *word &= mask;
        }
    }

    pub(crate) fn intersection(&self, other: &IndexSet) -> IndexSet {
        let mut set = self.clone();
        set.intersect_with(other);
        set
    }

    pub(crate) fn intersection_len(&self, other: &IndexSet) -> u64 {
        self.words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| u64::from((a & b).count_ones()))
            .sum()
    }

    pub(crate) fn len(&self) -> u64 {
        self.words.iter().map(|word| u64::from(word.count_ones())).sum()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.words.iter().all(|word| *word == 0)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(position, &word)| {
            let mut rest = word;
            std::iter::from_fn(move || {
                if rest == 0 {
                    return None;
                }
                let bit = rest.trailing_zeros() as usize;
                rest &= rest - 1;
                Some(position * 64 + bit)
            })
        })
    }
}

/// Admitted items indexed by category, with one adjacency row per item.
pub(crate) struct ItemPool<'i> {
    pub(crate) items: Vec<&'i ClothingItem>,
    pub(crate) slots: BTreeMap<Category, Vec<usize>>,
    /// Outfits may not mix formality levels.
    pub(crate) uniform_formality: bool,
    masks: BTreeMap<Category, IndexSet>,
    /// Bit `b` of row `a` is set when `a` and `b` may share an outfit.
    rows: Vec<IndexSet>,
    scores: Vec<f64>,
}

impl<'i> ItemPool<'i> {
    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn slot(&self, category: Category) -> &[usize] {
        self.slots
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn slot_mask(&self, category: Category) -> IndexSet {
        self.masks
            .get(&category)
            .cloned()
            .unwrap_or_else(|| IndexSet::empty(self.len()))
    }

    pub(crate) fn row(&self, index: usize) -> &IndexSet {
        &self.rows[index]
    }

    pub(crate) fn admits(&self, a: usize, b: usize) -> bool {
        self.rows[a].contains(b)
    }

    pub(crate) fn score(&self, a: usize, b: usize) -> f64 {
        self.scores[a * self.items.len() + b]
    }

    pub(crate) fn combination_score(&self, chosen: &[usize]) -> f64 {
        geometric_mean(chosen.iter().enumerate().flat_map(|(position, &a)| {
            chosen[position + 1..]
                .iter()
                .map(move |&b| self.score(a, b))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Formality, Season};
    use crate::engine::filters::FormalityFilter;

    fn item(id: &str, category: Category, formality: Formality) -> ClothingItem {
        ClothingItem {
            id: ItemId::from(id),
            name: id.to_string(),
            category,
            color: "black".to_string(),
            formality,
            season: Season::All,
            notes: None,
            created_at: None,
        }
    }

    #[test]
    fn hard_veto_rejects_the_whole_combination() {
        let shirt = item("shirt", Category::Top, Formality::Casual);
        let jeans = item("jeans", Category::Bottom, Formality::Casual);
        let sneakers = item("sneakers", Category::Shoes, Formality::Casual);
        let mut matrix = CompatibilityMatrix::new();
        matrix
            .insert(shirt.id.clone(), sneakers.id.clone(), 0.0)
            .expect("valid");
        let filters = OutfitFilters::default();
        let evaluator = CompatibilityEvaluator::new(&matrix, &filters, 0.0);

        assert!(evaluator.is_compatible(&[&shirt, &jeans]));
        assert!(!evaluator.is_compatible(&[&shirt, &jeans, &sneakers]));
        assert_eq!(evaluator.combination_score(&[&shirt, &jeans, &sneakers]), 0.0);
    }

    #[test]
    fn advisory_scores_feed_geometric_mean() {
        let shirt = item("shirt", Category::Top, Formality::Casual);
        let jeans = item("jeans", Category::Bottom, Formality::Casual);
        let sneakers = item("sneakers", Category::Shoes, Formality::Casual);
        let mut matrix = CompatibilityMatrix::new();
        matrix
            .insert(shirt.id.clone(), jeans.id.clone(), 0.25)
            .expect("valid");
        let filters = OutfitFilters::default();
        let evaluator = CompatibilityEvaluator::new(&matrix, &filters, 0.0);

        assert!(evaluator.is_compatible(&[&shirt, &jeans, &sneakers]));
        // cube root of 0.25 * 1.0 * 1.0
        assert_eq!(evaluator.combination_score(&[&shirt, &jeans, &sneakers]), 0.63);
        assert_eq!(evaluator.combination_score(&[&shirt]), 1.0);
    }

    #[test]
    fn same_category_never_combines() {
        let tee = item("tee", Category::Top, Formality::Casual);
        let polo = item("polo", Category::Top, Formality::Casual);
        let matrix = CompatibilityMatrix::new();
        let filters = OutfitFilters::default();
        let evaluator = CompatibilityEvaluator::new(&matrix, &filters, 0.0);

        assert!(!evaluator.is_compatible(&[&tee, &polo]));
    }

    #[test]
    fn formality_mixing_depends_on_filter() {
        let gown = item("gown", Category::Dress, Formality::Formal);
        let trainers = item("trainers", Category::Shoes, Formality::Athletic);
        let matrix = CompatibilityMatrix::new();

        let unfiltered = OutfitFilters::default();
        let evaluator = CompatibilityEvaluator::new(&matrix, &unfiltered, 0.0);
        assert!(evaluator.is_compatible(&[&gown, &trainers]));

        let within = OutfitFilters::new(
            FormalityFilter::Within([Formality::Formal, Formality::Athletic].into()),
            Default::default(),
        );
        let evaluator = CompatibilityEvaluator::new(&matrix, &within, 0.0);
        assert!(!evaluator.is_compatible(&[&gown, &trainers]));
    }

    #[test]
    fn threshold_above_zero_turns_low_scores_into_vetoes() {
        let shirt = item("shirt", Category::Top, Formality::Casual);
        let jeans = item("jeans", Category::Bottom, Formality::Casual);
        let mut matrix = CompatibilityMatrix::new();
        matrix
            .insert(shirt.id.clone(), jeans.id.clone(), 0.3)
            .expect("valid");
        let filters = OutfitFilters::default();

        let lenient = CompatibilityEvaluator::new(&matrix, &filters, 0.0);
        let strict = CompatibilityEvaluator::new(&matrix, &filters, 0.5);
        assert!(lenient.is_compatible(&[&shirt, &jeans]));
        assert!(!strict.is_compatible(&[&shirt, &jeans]));
    }

    #[test]
    fn pool_rows_mirror_pair_admission() {
        let items = vec![
            item("b1", Category::Bottom, Formality::Casual),
            item("s1", Category::Shoes, Formality::Casual),
            item("t1", Category::Top, Formality::Casual),
            item("t2", Category::Top, Formality::Casual),
        ];
        let refs: Vec<&ClothingItem> = items.iter().collect();
        let mut matrix = CompatibilityMatrix::new();
        matrix
            .insert(ItemId::from("t2"), ItemId::from("s1"), 0.0)
            .expect("valid");
        let filters = OutfitFilters::default();
        let pool = CompatibilityEvaluator::new(&matrix, &filters, 0.0).pool(&refs);

        // b1, s1, t1, t2
        assert_eq!(pool.row(1).iter().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(pool.row(3).iter().collect::<Vec<_>>(), vec![0]);
        assert!(!pool.admits(2, 3));
        assert_eq!(pool.slot_mask(Category::Top).len(), 2);
        assert_eq!(pool.row(0).intersection_len(&pool.slot_mask(Category::Top)), 2);
    }

    #[test]
    fn index_set_spans_word_boundaries() {
        let mut set = IndexSet::empty(130);
        for index in [0, 63, 64, 129] {
            set.insert(index);
        }
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 63, 64, 129]);
        assert_eq!(set.len(), 4);
        assert!(!set.contains(65));

        let other = IndexSet::from_indices(130, &[63, 129, 100]);
        assert_eq!(set.intersection(&other).iter().collect::<Vec<_>>(), vec![63, 129]);
        assert!(IndexSet::empty(130).is_empty());
    }
}
