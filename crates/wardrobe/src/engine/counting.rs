//! Outfit counting for pools too large to walk.
//!
//! Counts are exact. Every slot of a template except the two widest is
//! chosen member by member; the outfits left for each such prefix are
//! counted by intersecting adjacency rows, so no tuple is ever built.

use std::collections::BTreeMap;

use super::compatibility::{IndexSet, ItemPool};
use super::template::{OutfitSlotTemplate, SlotLayout};
use crate::catalog::{Category, Formality};

pub(crate) struct Counted {
    pub(crate) counts: Vec<u64>,
    pub(crate) total: u64,
}

/// Number of choices for each slot of one template: the slot size for a
/// required category, one more than that for an optional one.
struct TemplateChoices {
    choices: Vec<(Category, u128)>,
}

impl TemplateChoices {
    fn build(
        template: &OutfitSlotTemplate,
        optional: &[Category],
        sizes: &BTreeMap<Category, u128>,
    ) -> Option<Self> {
        let size = |category: &Category| sizes.get(category).copied().unwrap_or(0);
        let mut choices = Vec::with_capacity(template.required.len() + optional.len());
        for category in &template.required {
            let n = size(category);
            if n == 0 {
                return None;
            }
            choices.push((*category, n));
        }
        for category in optional {
            choices.push((*category, size(category) + 1));
        }
        Some(Self { choices })
    }

    fn contains(&self, category: Category) -> bool {
        self.choices.iter().any(|(slot, _)| *slot == category)
    }

    fn product_except(&self, excluded: &[Category]) -> u128 {
        self.choices
            .iter()
            .filter(|(category, _)| !excluded.contains(category))
            .fold(1u128, |acc, (_, n)| acc.saturating_mul(*n))
    }
}

/// Groups of pool indices that may share an outfit at all.
fn partitions(pool: &ItemPool<'_>) -> Vec<Vec<usize>> {
    if !pool.uniform_formality {
        return vec![(0..pool.len()).collect()];
    }
    let mut groups: BTreeMap<Formality, Vec<usize>> = BTreeMap::new();
    for (index, item) in pool.items.iter().enumerate() {
        groups.entry(item.formality).or_default().push(index);
    }
    groups.into_values().collect()
}

fn templates_for(
    pool: &ItemPool<'_>,
    layout: &SlotLayout,
    members: &[usize],
) -> Vec<TemplateChoices> {
    let mut sizes: BTreeMap<Category, u128> = BTreeMap::new();
    for &index in members {
        *sizes.entry(pool.items[index].category).or_default() += 1;
    }
    layout
        .templates()
        .iter()
        .filter_map(|template| TemplateChoices::build(template, layout.optional(), &sizes))
        .collect()
}

fn clamp(value: u128) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

/// Size of the unfiltered combination space across every template.
pub(crate) fn combination_space(pool: &ItemPool<'_>, layout: &SlotLayout) -> u128 {
    let everything: Vec<usize> = (0..pool.len()).collect();
    templates_for(pool, layout, &everything)
        .iter()
        .fold(0u128, |acc, template| {
            acc.saturating_add(template.product_except(&[]))
        })
}

/// Outfits each item could join if no pair were vetoed.
pub(crate) fn capacity(pool: &ItemPool<'_>, layout: &SlotLayout) -> Vec<u64> {
    let mut capacity = vec![0u128; pool.len()];
    for members in partitions(pool) {
        for template in templates_for(pool, layout, &members) {
            for &index in &members {
                let category = pool.items[index].category;
                if template.contains(category) {
                    capacity[index] =
                        capacity[index].saturating_add(template.product_except(&[category]));
                }
            }
        }
    }
    capacity.into_iter().map(clamp).collect()
}

/// Exact outfit total and per-item outfit counts for the whole pool.
pub(crate) fn count(pool: &ItemPool<'_>, layout: &SlotLayout) -> Counted {
    tally(pool, layout, Scope::default(), true)
}

/// Outfits built only from the items in `allowed`.
pub(crate) fn count_within(pool: &ItemPool<'_>, layout: &SlotLayout, allowed: &IndexSet) -> u64 {
    let scope = Scope {
        allowed: Some(allowed),
        anchor: None,
    };
    tally(pool, layout, scope, false).total
}

/// Outfits that contain `anchor` with every other piece taken from `allowed`.
pub(crate) fn count_containing(
    pool: &ItemPool<'_>,
    layout: &SlotLayout,
    allowed: &IndexSet,
    anchor: usize,
) -> u64 {
    let scope = Scope {
        allowed: Some(allowed),
        anchor: Some(anchor),
    };
    tally(pool, layout, scope, false).total
}

#[derive(Default, Clone, Copy)]
struct Scope<'s> {
    allowed: Option<&'s IndexSet>,
    anchor: Option<usize>,
}

fn tally(pool: &ItemPool<'_>, layout: &SlotLayout, scope: Scope<'_>, per_item: bool) -> Counted {
    let mut tally = Tally {
        pool,
        counts: per_item.then(|| vec![0u128; pool.len()]),
        total: 0,
        chosen: Vec::new(),
    };
    for template in layout.templates() {
        if let Some(slots) = count_slots(pool, template, layout.optional(), scope) {
            tally.template(&slots);
        }
    }

    Counted {
        counts: tally
            .counts
            .map(|counts| counts.into_iter().map(clamp).collect())
            .unwrap_or_default(),
        total: clamp(tally.total),
    }
}

struct CountSlot {
    candidates: IndexSet,
    optional: bool,
}

impl CountSlot {
    fn width(&self) -> u64 {
        self.candidates.len() + u64::from(self.optional)
    }
}

/// Candidate sets for one template, narrowest first. `None` when a required
/// slot has no candidate or the anchor cannot take part in the template.
fn count_slots(
    pool: &ItemPool<'_>,
    template: &OutfitSlotTemplate,
    optional: &[Category],
    scope: Scope<'_>,
) -> Option<Vec<CountSlot>> {
    let anchor_category = scope.anchor.map(|anchor| pool.items[anchor].category);
    if let Some(category) = anchor_category {
        if !template.contains(category) && !optional.contains(&category) {
            return None;
        }
    }

    let candidates = |category: Category| {
        let mut set = pool.slot_mask(category);
        if let Some(allowed) = scope.allowed {
            set.intersect_with(allowed);
        }
        if let Some(anchor) = scope.anchor {
            set.intersect_with(pool.row(anchor));
        }
        set
    };

    let mut slots = Vec::with_capacity(template.required.len() + optional.len());
    for &category in &template.required {
        if anchor_category == Some(category) {
            continue;
        }
        let set = candidates(category);
        if set.is_empty() {
            return None;
        }
        slots.push(CountSlot {
            candidates: set,
            optional: false,
        });
    }
    for &category in optional {
        if anchor_category == Some(category) {
            continue;
        }
        let set = candidates(category);
        if !set.is_empty() {
            slots.push(CountSlot {
                candidates: set,
                optional: true,
            });
        }
    }
    slots.sort_by_key(CountSlot::width);
    Some(slots)
}

struct Tally<'p, 'i> {
    pool: &'p ItemPool<'i>,
    counts: Option<Vec<u128>>,
    total: u128,
    chosen: Vec<usize>,
}

impl Tally<'_, '_> {
    fn template(&mut self, slots: &[CountSlot]) {
        let open: Vec<IndexSet> = slots.iter().map(|slot| slot.candidates.clone()).collect();
        self.descend(slots, slots.len().saturating_sub(2), &open);
    }

    /// `open[k]` holds the members of `slots[k]` that fit every chosen item.
    fn descend(&mut self, slots: &[CountSlot], prefix: usize, open: &[IndexSet]) {
        if prefix == 0 {
            let outfits = self.pairs(slots, open);
            self.total = self.total.saturating_add(outfits);
            for position in 0..self.chosen.len() {
                self.credit(self.chosen[position], outfits);
            }
            return;
        }

        let (slot, rest_slots) = (&slots[0], &slots[1..]);
        let (members, rest) = (&open[0], &open[1..]);
        if slot.optional {
            self.descend(rest_slots, prefix - 1, rest);
        }

        let pool = self.pool;
        for member in members.iter() {
            let row = pool.row(member);
            let narrowed: Vec<IndexSet> = rest.iter().map(|set| set.intersection(row)).collect();
            let dead = narrowed
                .iter()
                .zip(rest_slots)
                .any(|(set, slot)| set.is_empty() && !slot.optional);
            if dead {
                continue;
            }
            self.chosen.push(member);
            self.descend(rest_slots, prefix - 1, &narrowed);
            self.chosen.pop();
        }
    }

    /// Completions of the current prefix from the last one or two slots.
    fn pairs(&mut self, slots: &[CountSlot], open: &[IndexSet]) -> u128 {
        let pool = self.pool;
        let first = slots.first().zip(open.first());
        let second = slots.get(1).zip(open.get(1));
        match (first, second) {
            (None, _) => 1,
            (Some((x, xs)), None) => {
                for member in xs.iter() {
                    self.credit(member, 1);
                }
                u128::from(xs.len()) + u128::from(x.optional)
            }
            (Some((x, xs)), Some((y, ys))) => {
                let mut outfits = 0u128;
                for member in xs.iter() {
                    let with = u128::from(pool.row(member).intersection_len(ys) + u64::from(y.optional));
                    self.credit(member, with);
                    outfits += with;
                }
                if x.optional {
                    outfits += u128::from(ys.len()) + u128::from(y.optional);
                }
                if self.counts.is_some() {
                    for member in ys.iter() {
                        let with = pool.row(member).intersection_len(xs) + u64::from(x.optional);
                        self.credit(member, u128::from(with));
                    }
                }
                outfits
            }
        }
    }

    fn credit(&mut self, index: usize, outfits: u128) {
        if let Some(counts) = self.counts.as_mut() {
            counts[index] = counts[index].saturating_add(outfits);
        }
    }
}
