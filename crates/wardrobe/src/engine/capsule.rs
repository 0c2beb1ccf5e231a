use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::compatibility::{CompatibilityEvaluator, IndexSet, ItemPool};
use super::config::EngineConfig;
use super::counting;
use super::error::EngineError;
use super::filters::{Budget, CapsulePreferences, Climate, Lifestyle};
use super::insights::{self, plural};
use super::template::SlotLayout;
use super::utilization::utilization_percentage;
use crate::catalog::{Category, ClothingItem, CompatibilityMatrix, ItemId};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapsuleEntry {
    pub id: ItemId,
    pub name: String,
    pub color: String,
    /// Why the selector picked this item.
    pub reason: String,
    /// Outfits unlocked by the selection step that added this item.
    pub added_outfits: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapsuleRecommendation {
    pub name: String,
    pub capsule_size: usize,
    pub potential_outfits: u64,
    pub catalog_size: usize,
    pub reduction_percentage: f64,
    /// Selection order.
    pub items: Vec<ItemId>,
    pub items_by_category: BTreeMap<Category, Vec<CapsuleEntry>>,
    pub recommendations: Vec<String>,
    pub lifestyle: Lifestyle,
    pub climate: Climate,
    pub budget: Budget,
}

/// Candidate bundle that completes at least one outfit in a single step.
/// Members are pool indices, which follow id order.
#[derive(Debug, Clone)]
struct Bundle {
    items: Vec<usize>,
    companions: Vec<usize>,
    gain: u64,
    total: u64,
    potential: u64,
}

impl Bundle {
    /// Higher gain per added item first, then raw gain, then stronger
    /// candidates, then the lexically smaller id list.
    fn rank(&self, other: &Bundle) -> Ordering {
        let per_item = (u128::from(self.gain) * other.items.len() as u128)
            .cmp(&(u128::from(other.gain) * self.items.len() as u128));
        per_item
            .then(self.gain.cmp(&other.gain))
            .then(self.potential.cmp(&other.potential))
            .then_with(|| other.items.cmp(&self.items))
    }
}

#[derive(Debug)]
struct SelectionExhausted {
    evaluations: u64,
}

/// Deterministic allowance of marginal-gain evaluations for one selection.
struct SelectionBudget {
    limit: u64,
    evaluations: u64,
}

impl SelectionBudget {
    fn new(limit: u64) -> Self {
        Self {
            limit: limit.max(1),
            evaluations: 0,
        }
    }

    fn spend(&mut self) -> Result<(), SelectionExhausted> {
        self.evaluations += 1;
        if self.evaluations > self.limit {
            return Err(SelectionExhausted {
                evaluations: self.evaluations,
            });
        }
        Ok(())
    }
}

/// Outfit counts and no-veto capacity of every candidate in the filtered pool.
struct PoolPotential {
    counts: Vec<u64>,
    capacity: Vec<u64>,
}

impl PoolPotential {
    fn of(pool: &ItemPool<'_>, layout: &SlotLayout) -> Self {
        Self {
            counts: counting::count(pool, layout).counts,
            capacity: counting::capacity(pool, layout),
        }
    }

    fn outfit_count(&self, index: usize) -> u64 {
        self.counts.get(index).copied().unwrap_or(0)
    }

    fn utilization(&self, index: usize) -> f64 {
        utilization_percentage(
            self.outfit_count(index),
            self.capacity.get(index).copied().unwrap_or(0),
        )
    }
}

/// Greedy maximum-coverage selection of a bounded capsule.
pub struct CapsuleSelector<'a> {
    config: &'a EngineConfig,
    scores: &'a CompatibilityMatrix,
}

impl<'a> CapsuleSelector<'a> {
    pub fn new(config: &'a EngineConfig, scores: &'a CompatibilityMatrix) -> Self {
        Self { config, scores }
    }

    pub fn select(
        &self,
        catalog: &[&ClothingItem],
        desired_size: i64,
        preferences: &CapsulePreferences,
    ) -> Result<CapsuleRecommendation, EngineError> {
        if desired_size <= 0 {
            return Err(EngineError::InvalidCapsuleSize(desired_size.to_string()));
        }

        let filters = preferences.filters();
        let evaluator =
            CompatibilityEvaluator::new(self.scores, &filters, self.config.min_pair_score);
        let pool = evaluator.pool(catalog);
        let layout = &self.config.layout;
        let potential = PoolPotential::of(&pool, layout);
        let greedy = Greedy {
            layout,
            pool: &pool,
            potential: &potential,
            limit: usize::try_from(desired_size)
                .unwrap_or(usize::MAX)
                .min(pool.len()),
        };

        let mut budget = SelectionBudget::new(self.config.selection_evaluation_limit);
        let mut best = Selection::empty(pool.len());
        let mut outcome = greedy.complete(&mut best, &mut budget);

        if outcome.is_ok() && self.config.capsule_restarts > 1 {
            match greedy.alternative_openings(self.config.capsule_restarts, &mut budget) {
                Ok(openings) => {
                    for opening in openings {
                        let mut run = Selection::empty(pool.len());
                        run.apply_bundle(&pool, &opening);
                        let finished = greedy.complete(&mut run, &mut budget);
                        if run.total > best.total {
                            debug!(
                                from = best.total,
                                to = run.total,
                                "alternative opening improved the capsule"
                            );
                            best = run;
                        }
                        if finished.is_err() {
                            outcome = finished;
                            break;
                        }
                    }
                }
                Err(exhausted) => outcome = Err(exhausted),
            }
        }

        if let Err(SelectionExhausted { evaluations }) = outcome {
            warn!(
                evaluations,
                selected = best.chosen.len(),
                "capsule selection budget exhausted, keeping the best capsule so far"
            );
        }

        let recommendation = self.recommendation(&pool, catalog.len(), preferences, best);
        info!(
            requested = desired_size,
            candidates = pool.len(),
            selected = recommendation.capsule_size,
            outfits = recommendation.potential_outfits,
            evaluations = budget.evaluations,
            "capsule selected"
        );
        Ok(recommendation)
    }

    fn recommendation(
        &self,
        pool: &ItemPool<'_>,
        catalog_size: usize,
        preferences: &CapsulePreferences,
        state: Selection,
    ) -> CapsuleRecommendation {
        let capsule_size = state.chosen.len();
        let mut items_by_category: BTreeMap<Category, Vec<CapsuleEntry>> = BTreeMap::new();
        for (&index, entry) in state.chosen.iter().zip(state.entries) {
            items_by_category
                .entry(pool.items[index].category)
                .or_default()
                .push(entry);
        }

        let recommendations = insights::capsule_recommendations(
            preferences,
            &self.config.layout,
            capsule_size,
            state.total,
            |category| {
                items_by_category
                    .get(&category)
                    .map(Vec::len)
                    .unwrap_or(0)
            },
        );

        CapsuleRecommendation {
            name: format!(
                "{} {} Capsule",
                title_case(preferences.lifestyle.label()),
                title_case(preferences.climate.label())
            ),
            capsule_size,
            potential_outfits: state.total,
            catalog_size,
            reduction_percentage: reduction_percentage(capsule_size, catalog_size),
            items: state
                .chosen
                .iter()
                .map(|&index| pool.items[index].id.clone())
                .collect(),
            items_by_category,
            recommendations,
            lifestyle: preferences.lifestyle,
            climate: preferences.climate,
            budget: preferences.budget,
        }
    }
}

/// One greedy pass over a fixed candidate pool.
struct Greedy<'s, 'p, 'i> {
    layout: &'s SlotLayout,
    pool: &'p ItemPool<'i>,
    potential: &'s PoolPotential,
    limit: usize,
}

impl Greedy<'_, '_, '_> {
    fn complete(
        &self,
        state: &mut Selection,
        budget: &mut SelectionBudget,
    ) -> Result<(), SelectionExhausted> {
        while state.chosen.len() < self.limit {
            if let Some((index, gain)) = self.best_single(state, budget)? {
                state.add(
                    self.pool,
                    index,
                    gain,
                    format!(
                        "adds {}",
                        plural(gain, "new outfit combination", "new outfit combinations")
                    ),
                );
                state.total += gain;
                continue;
            }

            let remaining = self.limit - state.chosen.len();
            let Some(bundle) = self.bundles(state, remaining, budget)?.into_iter().next() else {
                break;
            };
            state.apply_bundle(self.pool, &bundle);
        }
        Ok(())
    }

    /// Opening bundles other than the one a plain greedy pass starts with,
    /// best first. Empty when a single item already forms an outfit.
    fn alternative_openings(
        &self,
        restarts: usize,
        budget: &mut SelectionBudget,
    ) -> Result<Vec<Bundle>, SelectionExhausted> {
        let empty = Selection::empty(self.pool.len());
        if self.limit == 0 || self.best_single(&empty, budget)?.is_some() {
            return Ok(Vec::new());
        }
        Ok(self
            .bundles(&empty, self.limit, budget)?
            .into_iter()
            .skip(1)
            .take(restarts - 1)
            .collect())
    }

    /// Outfits gained per candidate are those containing it whose other
    /// pieces are already chosen.
    fn best_single(
        &self,
        state: &Selection,
        budget: &mut SelectionBudget,
    ) -> Result<Option<(usize, u64)>, SelectionExhausted> {
        let mut best: Option<(usize, u64, f64)> = None;
        for index in 0..self.pool.len() {
            if state.contains(index) {
                continue;
            }
            budget.spend()?;
            let gain = counting::count_containing(self.pool, self.layout, &state.members, index);
            if gain == 0 {
                continue;
            }
            let utilization = self.potential.utilization(index);
            let better = match best {
                None => true,
                // Indices follow id order, so equal keys keep the earlier id.
                Some((_, best_gain, best_utilization)) => {
                    gain > best_gain || (gain == best_gain && utilization > best_utilization)
                }
            };
            if better {
                best = Some((index, gain, utilization));
            }
        }
        Ok(best.map(|(index, gain, _)| (index, gain)))
    }

    /// Every completion bundle that fits in `remaining`, best first. Used
    /// when no single item adds an outfit on its own.
    fn bundles(
        &self,
        state: &Selection,
        remaining: usize,
        budget: &mut SelectionBudget,
    ) -> Result<Vec<Bundle>, SelectionExhausted> {
        let pool = self.pool;
        let category = |index: usize| pool.items[index].category;

        let mut bundles = Vec::new();
        for template in self.layout.templates() {
            let Some((&anchor_category, rest)) = template.required.split_first() else {
                continue;
            };

            for &anchor in pool.slot(anchor_category) {
                let mut members = vec![anchor];
                for &wanted in rest {
                    let fits = |candidate: usize| {
                        members
                            .iter()
                            .all(|&member| pool.admits(member, candidate))
                    };
                    let pick = state
                        .chosen
                        .iter()
                        .copied()
                        .filter(|&index| category(index) == wanted)
                        .find(|&index| fits(index))
                        .or_else(|| {
                            pool.slot(wanted)
                                .iter()
                                .copied()
                                .filter(|&index| fits(index))
                                .max_by(|&a, &b| {
                                    self.potential
                                        .outfit_count(a)
                                        .cmp(&self.potential.outfit_count(b))
                                        .then_with(|| b.cmp(&a))
                                })
                        });
                    match pick {
                        Some(index) => members.push(index),
                        None => {
                            members.clear();
                            break;
                        }
                    }
                }
                if members.is_empty() {
                    continue;
                }

                let (companions, new_items): (Vec<usize>, Vec<usize>) =
                    members.into_iter().partition(|&index| state.contains(index));
                if new_items.is_empty() || new_items.len() > remaining {
                    continue;
                }
                budget.spend()?;
                let mut widened = state.members.clone();
                for &index in &new_items {
                    widened.insert(index);
                }
                let total = counting::count_within(pool, self.layout, &widened);
                let gain = total.saturating_sub(state.total);
                if gain == 0 {
                    continue;
                }
                bundles.push(Bundle {
                    potential: new_items
                        .iter()
                        .map(|&index| self.potential.outfit_count(index))
                        .fold(0u64, u64::saturating_add),
                    items: new_items,
                    companions,
                    gain,
                    total,
                });
            }
        }

        bundles.sort_by(|a, b| b.rank(a));
        Ok(bundles)
    }
}

struct Selection {
    chosen: Vec<usize>,
    members: IndexSet,
    entries: Vec<CapsuleEntry>,
    total: u64,
}

impl Selection {
    fn empty(pool_size: usize) -> Self {
        Self {
            chosen: Vec::new(),
            members: IndexSet::empty(pool_size),
            entries: Vec::new(),
            total: 0,
        }
    }

    fn contains(&self, index: usize) -> bool {
        self.members.contains(index)
    }

    fn add(&mut self, pool: &ItemPool<'_>, index: usize, added_outfits: u64, reason: String) {
        let item = pool.items[index];
        self.members.insert(index);
        self.chosen.push(index);
        self.entries.push(CapsuleEntry {
            id: item.id.clone(),
            name: item.name.clone(),
            color: item.color.clone(),
            reason,
            added_outfits,
        });
    }

    fn apply_bundle(&mut self, pool: &ItemPool<'_>, bundle: &Bundle) {
        for &index in &bundle.items {
            let partners: Vec<&str> = bundle
                .companions
                .iter()
                .chain(bundle.items.iter())
                .filter(|&&other| other != index)
                .map(|&other| pool.items[other].name.as_str())
                .collect();
            self.add(
                pool,
                index,
                bundle.gain,
                format!(
                    "completes {} with {}",
                    plural(bundle.gain, "new outfit", "new outfits"),
                    partners.join(", ")
                ),
            );
        }
        self.total = bundle.total;
    }
}

fn title_case(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Share of the catalog left out of the capsule, one decimal.
fn reduction_percentage(capsule_size: usize, catalog_size: usize) -> f64 {
    if catalog_size == 0 {
        return 0.0;
    }
    let kept = capsule_size.min(catalog_size) as f64 / catalog_size as f64;
    ((1.0 - kept) * 1000.0).round() / 10.0
}
