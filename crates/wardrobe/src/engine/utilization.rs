use serde::Serialize;

use super::enumerator::EnumerationResult;
use crate::catalog::{Category, ClothingItem, ItemId};

/// How much of an item's theoretical outfit potential the catalog realises.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UtilizationRecord {
    pub id: ItemId,
    pub name: String,
    pub category: Category,
    pub outfit_count: u64,
    pub utilization_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UtilizationSummary {
    pub records: Vec<UtilizationRecord>,
    pub average: f64,
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Percentage of `capacity` realised by `count`, in `[0, 100]`.
///
/// Zero exactly when `count` is zero; a non-zero count that would round to
/// zero reports the smallest visible value instead.
pub fn utilization_percentage(count: u64, capacity: u64) -> f64 {
    if count == 0 || capacity == 0 {
        return 0.0;
    }
    let raw = (count as f64 / capacity as f64 * 100.0).clamp(0.0, 100.0);
    round_one_decimal(raw).max(0.1)
}

/// Builds one record per catalog item. Items the filters removed from the
/// enumeration are reported with a zero count.
pub fn aggregate(result: &EnumerationResult, catalog: &[&ClothingItem]) -> UtilizationSummary {
    let mut records: Vec<UtilizationRecord> = catalog
        .iter()
        .map(|item| {
            let count = result.outfit_count(&item.id);
            UtilizationRecord {
                id: item.id.clone(),
                name: item.name.clone(),
                category: item.category,
                outfit_count: count,
                utilization_percentage: utilization_percentage(count, result.capacity(&item.id)),
            }
        })
        .collect();
    records.sort_by(|a, b| {
        b.outfit_count
            .cmp(&a.outfit_count)
            .then_with(|| a.id.cmp(&b.id))
    });
    records.dedup_by(|a, b| a.id == b.id);

    let average = if records.is_empty() {
        0.0
    } else {
        let sum: f64 = records.iter().map(|record| record.utilization_percentage).sum();
        round_one_decimal(sum / records.len() as f64)
    };

    UtilizationSummary { records, average }
}
