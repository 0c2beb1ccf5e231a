use std::collections::BTreeMap;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, warn};

use super::compatibility::{CompatibilityEvaluator, ItemPool};
use super::config::EngineConfig;
use super::counting;
use crate::catalog::{Category, ClothingItem, ItemId};

/// How the totals in an [`EnumerationResult`] were produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnumerationMode {
    /// Every valid outfit was walked.
    Exact,
    /// Totals come from combinatorial counting without materialising tuples.
    Counted,
}

/// A valid combination: one item per required slot plus any add-ons.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Outfit {
    pub items: Vec<ItemId>,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumerationResult {
    /// Ranked by score, best first. Empty when counting was used or when
    /// materialisation was not requested.
    pub outfits: Vec<Outfit>,
    pub per_item_count: BTreeMap<ItemId, u64>,
    /// Outfits each item could appear in if nothing were vetoed.
    pub item_capacity: BTreeMap<ItemId, u64>,
    pub category_sizes: BTreeMap<Category, usize>,
    pub total_outfits: u64,
    pub items_analyzed: usize,
    pub mode: EnumerationMode,
}

impl EnumerationResult {
    pub fn outfit_count(&self, id: &ItemId) -> u64 {
        self.per_item_count.get(id).copied().unwrap_or(0)
    }

    pub fn capacity(&self, id: &ItemId) -> u64 {
        self.item_capacity.get(id).copied().unwrap_or(0)
    }

    pub fn category_size(&self, category: Category) -> usize {
        self.category_sizes.get(&category).copied().unwrap_or(0)
    }
}

/// Walks a filtered catalog and produces valid outfits and per-item counts.
pub struct OutfitEnumerator<'a> {
    config: &'a EngineConfig,
    evaluator: CompatibilityEvaluator<'a>,
}

impl<'a> OutfitEnumerator<'a> {
    pub fn new(config: &'a EngineConfig, evaluator: CompatibilityEvaluator<'a>) -> Self {
        Self { config, evaluator }
    }

    /// Enumerate and keep every outfit when the exact path is taken.
    pub fn enumerate(&self, items: &[&ClothingItem]) -> EnumerationResult {
        self.run(items, true)
    }

    /// Same totals as [`enumerate`](Self::enumerate), counted without walking
    /// or collecting outfits.
    pub fn count(&self, items: &[&ClothingItem]) -> EnumerationResult {
        self.run(items, false)
    }

    fn run(&self, items: &[&ClothingItem], materialize: bool) -> EnumerationResult {
        let pool = self.evaluator.pool(items);
        let layout = &self.config.layout;
        let space = counting::combination_space(&pool, layout);

        let exact = if !materialize {
            None
        } else if space <= u128::from(self.config.enumeration_ceiling) {
            let mut walk = Walk::new(&pool, EnumerationBudget::from_config(self.config));
            match walk.run(self.config) {
                Ok(()) => Some(walk),
                Err(BudgetExceeded { steps }) => {
                    warn!(
                        items = pool.len(),
                        steps, "enumeration budget exhausted, switching to counting"
                    );
                    None
                }
            }
        } else {
            debug!(
                items = pool.len(),
                space = %space,
                ceiling = self.config.enumeration_ceiling,
                "combination space above ceiling, counting without enumeration"
            );
            None
        };

        let (counts, total, mut outfits, mode) = match exact {
            Some(walk) => (walk.counts, walk.total, walk.outfits, EnumerationMode::Exact),
            None => {
                let counted = counting::count(&pool, layout);
                (counted.counts, counted.total, Vec::new(), EnumerationMode::Counted)
            }
        };

        outfits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.items.cmp(&b.items)));

        let capacity = counting::capacity(&pool, layout);
        let per_item_count = pool
            .items
            .iter()
            .zip(counts)
            .map(|(item, count)| (item.id.clone(), count))
            .collect();
        let item_capacity = pool
            .items
            .iter()
            .zip(capacity)
            .map(|(item, capacity)| (item.id.clone(), capacity))
            .collect();
        let category_sizes = pool
            .slots
            .iter()
            .map(|(category, members)| (*category, members.len()))
            .collect();

        debug!(items = pool.len(), total, ?mode, "enumeration finished");

        EnumerationResult {
            outfits,
            per_item_count,
            item_capacity,
            category_sizes,
            total_outfits: total,
            items_analyzed: pool.len(),
            mode,
        }
    }
}

#[derive(Debug)]
struct BudgetExceeded {
    steps: u64,
}

/// Iteration and wall-clock allowance for one exact walk.
struct EnumerationBudget {
    limit: u64,
    deadline: Option<Instant>,
    steps: u64,
}

impl EnumerationBudget {
    const CLOCK_CHECK_INTERVAL: u64 = 1024;

    fn from_config(config: &EngineConfig) -> Self {
        Self {
            limit: config.step_limit(),
            deadline: config
                .enumeration_time_budget
                .and_then(|budget| Instant::now().checked_add(budget)),
            steps: 0,
        }
    }

    fn tick(&mut self) -> Result<(), BudgetExceeded> {
        self.steps += 1;
        if self.steps > self.limit {
            return Err(BudgetExceeded { steps: self.steps });
        }
        if self.steps % Self::CLOCK_CHECK_INTERVAL == 0 {
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    return Err(BudgetExceeded { steps: self.steps });
                }
            }
        }
        Ok(())
    }
}

struct Slot<'p> {
    members: &'p [usize],
    optional: bool,
}

/// Depth-first walk over template slots, pruning on the first inadmissible pair.
struct Walk<'p, 'i> {
    pool: &'p ItemPool<'i>,
    budget: EnumerationBudget,
    chosen: Vec<usize>,
    counts: Vec<u64>,
    total: u64,
    outfits: Vec<Outfit>,
}

impl<'p, 'i> Walk<'p, 'i> {
    fn new(pool: &'p ItemPool<'i>, budget: EnumerationBudget) -> Self {
        Self {
            pool,
            budget,
            chosen: Vec::new(),
            counts: vec![0; pool.len()],
            total: 0,
            outfits: Vec::new(),
        }
    }

    fn run(&mut self, config: &EngineConfig) -> Result<(), BudgetExceeded> {
        let pool = self.pool;
        for template in config.layout.templates() {
            let mut slots: Vec<Slot<'p>> = Vec::new();
            for category in &template.required {
                let members = pool.slot(*category);
                if members.is_empty() {
                    slots.clear();
                    break;
                }
                slots.push(Slot {
                    members,
                    optional: false,
                });
            }
            if slots.is_empty() {
                continue;
            }
            for category in config.layout.optional() {
                let members = pool.slot(*category);
                if !members.is_empty() {
                    slots.push(Slot {
                        members,
                        optional: true,
                    });
                }
            }

            self.descend(&slots, 0)?;
        }
        Ok(())
    }

    fn descend(&mut self, slots: &[Slot<'p>], depth: usize) -> Result<(), BudgetExceeded> {
        let Some(slot) = slots.get(depth) else {
            self.record();
            return Ok(());
        };

        if slot.optional {
            self.descend(slots, depth + 1)?;
        }

        for &candidate in slot.members {
            self.budget.tick()?;
            let pool = self.pool;
            if self.chosen.iter().all(|&picked| pool.admits(picked, candidate)) {
                self.chosen.push(candidate);
                let outcome = self.descend(slots, depth + 1);
                self.chosen.pop();
                outcome?;
            }
        }

        Ok(())
    }

    fn record(&mut self) {
        self.total += 1;
        for &index in &self.chosen {
            self.counts[index] += 1;
        }
        self.outfits.push(Outfit {
            items: self
                .chosen
                .iter()
                .map(|&index| self.pool.items[index].id.clone())
                .collect(),
            score: self.pool.combination_score(&self.chosen),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CompatibilityMatrix, Formality, Season};
    use crate::engine::filters::{FormalityFilter, OutfitFilters, SeasonFilter};

    fn item(id: &str, category: Category) -> ClothingItem {
        ClothingItem {
            id: ItemId::from(id),
            name: id.to_string(),
            category,
            color: "navy".to_string(),
            formality: Formality::Casual,
            season: Season::All,
            notes: None,
            created_at: None,
        }
    }

    fn run(
        config: &EngineConfig,
        items: &[ClothingItem],
        matrix: &CompatibilityMatrix,
        filters: &OutfitFilters,
    ) -> EnumerationResult {
        let refs: Vec<&ClothingItem> = items.iter().collect();
        let evaluator = CompatibilityEvaluator::new(matrix, filters, config.min_pair_score);
        OutfitEnumerator::new(config, evaluator).enumerate(&refs)
    }

    #[test]
    fn optional_slots_multiply_by_one_plus_their_size() {
        let items = vec![
            item("t1", Category::Top),
            item("b1", Category::Bottom),
            item("s1", Category::Shoes),
            item("j1", Category::Jacket),
            item("j2", Category::Jacket),
            item("a1", Category::Accessory),
        ];
        let result = run(
            &EngineConfig::default(),
            &items,
            &CompatibilityMatrix::new(),
            &OutfitFilters::default(),
        );

        assert_eq!(result.mode, EnumerationMode::Exact);
        assert_eq!(result.total_outfits, 6);
        assert_eq!(result.outfits.len(), 6);
        assert_eq!(result.outfit_count(&ItemId::from("t1")), 6);
        assert_eq!(result.outfit_count(&ItemId::from("j1")), 2);
        assert_eq!(result.outfit_count(&ItemId::from("a1")), 3);
        assert_eq!(result.capacity(&ItemId::from("j1")), 2);
    }

    #[test]
    fn dress_template_counts_alongside_separates() {
        let items = vec![
            item("t1", Category::Top),
            item("b1", Category::Bottom),
            item("d1", Category::Dress),
            item("d2", Category::Dress),
            item("s1", Category::Shoes),
        ];
        let result = run(
            &EngineConfig::default(),
            &items,
            &CompatibilityMatrix::new(),
            &OutfitFilters::default(),
        );

        assert_eq!(result.total_outfits, 3);
        assert_eq!(result.outfit_count(&ItemId::from("s1")), 3);
        assert_eq!(result.capacity(&ItemId::from("s1")), 3);
        assert_eq!(result.outfit_count(&ItemId::from("d2")), 1);
    }

    #[test]
    fn veto_on_optional_item_only_removes_add_on_variants() {
        let items = vec![
            item("t1", Category::Top),
            item("b1", Category::Bottom),
            item("s1", Category::Shoes),
            item("j1", Category::Jacket),
        ];
        let mut matrix = CompatibilityMatrix::new();
        matrix
            .insert(ItemId::from("j1"), ItemId::from("b1"), 0.0)
            .expect("valid");
        let result = run(
            &EngineConfig::default(),
            &items,
            &matrix,
            &OutfitFilters::default(),
        );

        assert_eq!(result.total_outfits, 1);
        assert_eq!(result.outfit_count(&ItemId::from("j1")), 0);
        assert_eq!(result.capacity(&ItemId::from("j1")), 1);
    }

    #[test]
    fn outfits_are_ranked_by_advisory_score() {
        let items = vec![
            item("t1", Category::Top),
            item("t2", Category::Top),
            item("b1", Category::Bottom),
            item("s1", Category::Shoes),
        ];
        let mut matrix = CompatibilityMatrix::new();
        matrix
            .insert(ItemId::from("t1"), ItemId::from("b1"), 0.5)
            .expect("valid");
        let result = run(
            &EngineConfig::default(),
            &items,
            &matrix,
            &OutfitFilters::default(),
        );

        assert_eq!(result.outfits.len(), 2);
        assert_eq!(result.outfits[0].items[0], ItemId::from("t2"));
        assert_eq!(result.outfits[0].score, 1.0);
        assert!(result.outfits[1].score < 1.0);
    }

    #[test]
    fn filters_shrink_the_pool_before_enumeration() {
        let mut winter_boots = item("s2", Category::Shoes);
        winter_boots.season = Season::Winter;
        let mut suit_top = item("t2", Category::Top);
        suit_top.formality = Formality::Business;
        let items = vec![
            item("t1", Category::Top),
            suit_top,
            item("b1", Category::Bottom),
            item("s1", Category::Shoes),
            winter_boots,
        ];
        let filters = OutfitFilters::new(
            FormalityFilter::only(Formality::Casual),
            SeasonFilter::only(Season::Summer),
        );
        let result = run(
            &EngineConfig::default(),
            &items,
            &CompatibilityMatrix::new(),
            &filters,
        );

        assert_eq!(result.items_analyzed, 3);
        assert_eq!(result.total_outfits, 1);
        assert!(!result.per_item_count.contains_key(&ItemId::from("s2")));
    }

    #[test]
    fn space_above_ceiling_is_counted_not_walked() {
        let items = vec![
            item("t1", Category::Top),
            item("t2", Category::Top),
            item("b1", Category::Bottom),
            item("b2", Category::Bottom),
            item("s1", Category::Shoes),
        ];
        let config = EngineConfig {
            enumeration_ceiling: 1,
            ..EngineConfig::default()
        };
        let result = run(
            &config,
            &items,
            &CompatibilityMatrix::new(),
            &OutfitFilters::default(),
        );

        assert_eq!(result.mode, EnumerationMode::Counted);
        assert_eq!(result.total_outfits, 4);
        assert!(result.outfits.is_empty());
    }

    #[test]
    fn budget_trips_once_the_step_limit_is_passed() {
        let items = vec![
            item("t1", Category::Top),
            item("b1", Category::Bottom),
            item("b2", Category::Bottom),
            item("s1", Category::Shoes),
        ];
        let mut budget = EnumerationBudget {
            limit: 2,
            deadline: None,
            steps: 0,
        };
        assert!(budget.tick().is_ok());
        assert!(budget.tick().is_ok());
        assert!(budget.tick().is_err());

        let config = EngineConfig {
            enumeration_ceiling: 2,
            ..EngineConfig::default()
        };
        let result = run(
            &config,
            &items,
            &CompatibilityMatrix::new(),
            &OutfitFilters::default(),
        );
        assert_eq!(result.total_outfits, 2);
    }

    #[test]
    fn counting_and_walking_agree_when_vetoes_overlap() {
        let items = vec![
            item("t1", Category::Top),
            item("b1", Category::Bottom),
            item("b2", Category::Bottom),
            item("s1", Category::Shoes),
            item("a1", Category::Accessory),
        ];
        let mut matrix = CompatibilityMatrix::new();
        for (a, b) in [("t1", "b1"), ("b1", "s1")] {
            matrix
                .insert(ItemId::from(a), ItemId::from(b), 0.0)
                .expect("valid");
        }
        let filters = OutfitFilters::default();
        let walked = run(&EngineConfig::default(), &items, &matrix, &filters);
        let counted = run(
            &EngineConfig {
                enumeration_ceiling: 2,
                ..EngineConfig::default()
            },
            &items,
            &matrix,
            &filters,
        );

        assert_eq!(walked.mode, EnumerationMode::Exact);
        assert_eq!(counted.mode, EnumerationMode::Counted);
        assert_eq!(walked.total_outfits, 2);
        assert_eq!(counted.total_outfits, walked.total_outfits);
        assert_eq!(counted.per_item_count, walked.per_item_count);
    }

    #[test]
    fn count_never_walks() {
        let items = vec![
            item("t1", Category::Top),
            item("b1", Category::Bottom),
            item("s1", Category::Shoes),
        ];
        let config = EngineConfig::default();
        let matrix = CompatibilityMatrix::new();
        let filters = OutfitFilters::default();
        let refs: Vec<&ClothingItem> = items.iter().collect();
        let evaluator = CompatibilityEvaluator::new(&matrix, &filters, config.min_pair_score);
        let result = OutfitEnumerator::new(&config, evaluator).count(&refs);

        assert_eq!(result.mode, EnumerationMode::Counted);
        assert_eq!(result.total_outfits, 1);
        assert!(result.outfits.is_empty());
    }
}
