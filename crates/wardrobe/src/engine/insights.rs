use super::config::InsightThresholds;
use super::enumerator::EnumerationResult;
use super::filters::{Budget, CapsulePreferences, Climate, Lifestyle};
use super::template::SlotLayout;
use crate::catalog::Category;

pub(crate) fn plural(count: u64, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

/// Required categories with no items, for the template that is closest to
/// being complete.
pub fn missing_categories(
    layout: &SlotLayout,
    category_size: impl Fn(Category) -> usize,
) -> Vec<Category> {
    layout
        .templates()
        .iter()
        .map(|template| {
            template
                .required
                .iter()
                .copied()
                .filter(|category| category_size(*category) == 0)
                .collect::<Vec<_>>()
        })
        .min_by_key(Vec::len)
        .unwrap_or_default()
}

pub fn compatibility_insights(
    thresholds: &InsightThresholds,
    layout: &SlotLayout,
    result: &EnumerationResult,
    average_utilization: f64,
) -> Vec<String> {
    let mut insights = Vec::with_capacity(4);

    if result.items_analyzed > 0 {
        insights.push(format!(
            "Found {} compatible items for outfit building",
            result.items_analyzed
        ));
    } else {
        insights.push("Add items to your wardrobe to begin analysis".to_string());
    }

    if average_utilization >= thresholds.high_compatibility_avg {
        insights.push("Your wardrobe has great compatibility!".to_string());
    } else {
        insights.push("Consider adding more versatile items".to_string());
    }

    if result.items_analyzed < thresholds.minimum_catalog_size {
        insights.push("A capsule wardrobe typically has 10-30 items".to_string());
    } else {
        insights.push("You have a good foundation to work with".to_string());
    }

    if result.total_outfits == 0 && result.items_analyzed > 0 {
        let missing = missing_categories(layout, |category| result.category_size(category));
        if missing.is_empty() {
            insights.push(
                "None of your items currently pair up; review vetoed combinations".to_string(),
            );
        } else {
            insights.push(format!(
                "Add {} to complete your first outfit",
                category_list(&missing)
            ));
        }
    }

    insights
}

fn category_list(categories: &[Category]) -> String {
    categories
        .iter()
        .map(|category| category.plural())
        .collect::<Vec<_>>()
        .join(" and ")
}

/// Advice lines attached to a capsule recommendation.
pub fn capsule_recommendations(
    preferences: &CapsulePreferences,
    layout: &SlotLayout,
    capsule_size: usize,
    potential_outfits: u64,
    category_size: impl Fn(Category) -> usize,
) -> Vec<String> {
    let mut lines = vec![format!(
        "This {capsule_size}-item capsule creates {}",
        plural(potential_outfits, "outfit combination", "outfit combinations")
    )];

    if potential_outfits == 0 {
        let missing = missing_categories(layout, &category_size);
        if missing.is_empty() {
            lines.push("No complete outfits yet; the selected pieces do not pair up".to_string());
        } else {
            lines.push(format!(
                "No complete outfits yet; add {} to finish one",
                category_list(&missing)
            ));
        }
    }
    let tops = category_size(Category::Top);
    let bottoms = category_size(Category::Bottom);
    if tops >= 5 {
        lines.push(format!("You have {tops} tops - great for versatility!"));
    }
    if bottoms >= 4 {
        lines.push(format!(
            "You have {bottoms} bottoms - good mix for different occasions"
        ));
    }

    lines.push(
        match preferences.lifestyle {
            Lifestyle::Professional => {
                "Consider adding 1-2 more structured pieces for professional settings"
            }
            Lifestyle::Casual => "Your capsule is tailored for casual, relaxed styling",
            Lifestyle::Mixed => "Your mixed lifestyle capsule balances professional and casual wear",
            Lifestyle::Creative => "Your creative capsule mixes formality levels freely",
        }
        .to_string(),
    );
    match preferences.climate {
        Climate::Cold => {
            lines.push("Consider adding more layering pieces and outerwear".to_string())
        }
        Climate::Tropical => lines.push("Focus on breathable, lightweight fabrics".to_string()),
        Climate::Varied => {
            lines.push("Keep transitional pieces on hand for changing weather".to_string())
        }
        Climate::Temperate => {}
    }
    lines.push(
        match preferences.budget {
            Budget::Budget => "Start with versatile basics before adding statement pieces",
            Budget::Medium => "Balance quality staples with a few trend pieces",
            Budget::Premium => "Invest in high-quality pieces that last for years",
        }
        .to_string(),
    );

    lines
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::engine::enumerator::EnumerationMode;
    use crate::engine::template::OutfitSlotTemplate;

    fn result(items: usize, total: u64, sizes: &[(Category, usize)]) -> EnumerationResult {
        EnumerationResult {
            outfits: Vec::new(),
            per_item_count: BTreeMap::new(),
            item_capacity: BTreeMap::new(),
            category_sizes: sizes.iter().copied().collect(),
            total_outfits: total,
            items_analyzed: items,
            mode: EnumerationMode::Exact,
        }
    }

    #[test]
    fn empty_catalog_asks_for_items() {
        let insights = compatibility_insights(
            &InsightThresholds::default(),
            &SlotLayout::standard(),
            &result(0, 0, &[]),
            0.0,
        );
        assert_eq!(insights[0], "Add items to your wardrobe to begin analysis");
        assert_eq!(insights.len(), 3);
    }

    #[test]
    fn thresholds_drive_the_wording() {
        let thresholds = InsightThresholds {
            high_compatibility_avg: 50.0,
            minimum_catalog_size: 3,
        };
        let insights = compatibility_insights(
            &thresholds,
            &SlotLayout::standard(),
            &result(
                3,
                1,
                &[(Category::Top, 1), (Category::Bottom, 1), (Category::Shoes, 1)],
            ),
            100.0,
        );
        assert_eq!(
            insights,
            vec![
                "Found 3 compatible items for outfit building",
                "Your wardrobe has great compatibility!",
                "You have a good foundation to work with",
            ]
        );
    }

    #[test]
    fn zero_outfits_names_the_missing_category() {
        let insights = compatibility_insights(
            &InsightThresholds::default(),
            &SlotLayout::standard(),
            &result(2, 0, &[(Category::Top, 1), (Category::Bottom, 1)]),
            0.0,
        );
        assert_eq!(
            insights.last().map(String::as_str),
            Some("Add shoes to complete your first outfit")
        );
    }

    fn sized(sizes: &[(Category, usize)]) -> impl Fn(Category) -> usize + '_ {
        move |category| {
            sizes
                .iter()
                .find(|(known, _)| *known == category)
                .map_or(0, |(_, size)| *size)
        }
    }

    #[test]
    fn empty_capsule_names_what_the_layout_still_needs() {
        let layout = SlotLayout::new(
            vec![OutfitSlotTemplate::new([Category::Top, Category::Bottom])],
            vec![Category::Jacket],
        )
        .expect("valid layout");
        let lines = capsule_recommendations(
            &CapsulePreferences::default(),
            &layout,
            2,
            0,
            sized(&[(Category::Top, 1), (Category::Jacket, 1)]),
        );
        assert_eq!(lines[1], "No complete outfits yet; add bottoms to finish one");

        let standard = capsule_recommendations(
            &CapsulePreferences::default(),
            &SlotLayout::standard(),
            2,
            0,
            sized(&[(Category::Dress, 1), (Category::Shoes, 1)]),
        );
        assert_eq!(
            standard[1],
            "No complete outfits yet; the selected pieces do not pair up"
        );
    }

    #[test]
    fn capsule_lines_follow_preferences() {
        let preferences = CapsulePreferences {
            lifestyle: Lifestyle::Professional,
            climate: Climate::Cold,
            budget: Budget::Premium,
        };
        let sizes = [(Category::Top, 5), (Category::Bottom, 4)];
        let lines = capsule_recommendations(
            &preferences,
            &SlotLayout::standard(),
            12,
            1,
            sized(&sizes),
        );
        assert_eq!(lines[0], "This 12-item capsule creates 1 outfit combination");
        assert!(lines.contains(&"You have 5 tops - great for versatility!".to_string()));
        assert!(lines.contains(&"Consider adding more layering pieces and outerwear".to_string()));
        assert_eq!(
            lines.last().map(String::as_str),
            Some("Invest in high-quality pieces that last for years")
        );
    }
}
