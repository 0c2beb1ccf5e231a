use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use wardrobe::analysis::AnalysisServiceError;
use wardrobe::catalog::{
    CatalogCsvImporter, CatalogSnapshot, Category, ClothingItem, CompatibilityMatrix, Formality,
    ItemId, NewClothingItem, Season,
};
use wardrobe::config::AppConfig;
use wardrobe::engine::{
    CapsulePreferences, CapsuleRecommendation, CompatibilityReport, EngineConfig,
    EnumerationMode, OutfitEngine, OutfitFilters,
};
use wardrobe::error::AppError;
use wardrobe::telemetry;

#[derive(Args, Debug, Default)]
pub(crate) struct SourceArgs {
    /// Item CSV export (id,name,category,color,formality,season,notes).
    /// Defaults to the built-in sample wardrobe.
    #[arg(long)]
    pub(crate) items: Option<PathBuf>,
    /// Pairwise score CSV export (item_a,item_b,score)
    #[arg(long, requires = "items")]
    pub(crate) compatibility: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct AnalyzeArgs {
    #[command(flatten)]
    pub(crate) source: SourceArgs,
    /// Formality level to restrict outfits to, or "all"
    #[arg(long)]
    pub(crate) formality: Option<String>,
    /// Season to restrict outfits to, or "all"
    #[arg(long)]
    pub(crate) season: Option<String>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct CapsuleArgs {
    #[command(flatten)]
    pub(crate) source: SourceArgs,
    /// Desired capsule size (defaults to WARDROBE_DEFAULT_CAPSULE_SIZE)
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) size: Option<i64>,
    /// professional, casual, mixed or creative
    #[arg(long)]
    pub(crate) lifestyle: Option<String>,
    /// temperate, cold, tropical or varied
    #[arg(long)]
    pub(crate) climate: Option<String>,
    /// budget, medium or premium
    #[arg(long)]
    pub(crate) budget: Option<String>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Capsule size used for the selection step of the demo
    #[arg(long, default_value_t = 8)]
    pub(crate) capsule_size: i64,
    /// Print the full capsule payload as JSON after the summary
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let engine = cli_engine()?;
    let snapshot = load_snapshot(args.source)?;
    let report = analyze(
        &engine,
        &snapshot,
        args.formality.as_deref(),
        args.season.as_deref(),
    )?;
    print_json(&report)
}

pub(crate) fn run_capsule(args: CapsuleArgs) -> Result<(), AppError> {
    let engine = cli_engine()?;
    let snapshot = load_snapshot(args.source)?;
    let preferences = CapsulePreferences::parse(
        args.lifestyle.as_deref(),
        args.climate.as_deref(),
        args.budget.as_deref(),
    )
    .map_err(AnalysisServiceError::from)?;
    let size = args.size.unwrap_or(engine.config().default_capsule_size);
    let capsule = recommend(&engine, &snapshot, size, &preferences)?;
    print_json(&capsule)
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let engine = OutfitEngine::new(EngineConfig::default());
    let snapshot = sample_wardrobe();

    println!("Wardrobe analysis demo");
    println!(
        "Catalog: {} items, {} scored pairs",
        snapshot.items.len(),
        snapshot.scores.len()
    );

    let report = analyze(&engine, &snapshot, None, None)?;
    render_compatibility(&report);

    let business = analyze(&engine, &snapshot, Some("business"), None)?;
    println!(
        "\nBusiness-only outfits: {} from {} items",
        business.total_outfits, business.items_analyzed
    );

    let capsule = recommend(
        &engine,
        &snapshot,
        args.capsule_size,
        &CapsulePreferences::default(),
    )?;
    render_capsule(&capsule);

    if args.json {
        print_json(&capsule)?;
    }
    Ok(())
}

fn cli_engine() -> Result<OutfitEngine, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    Ok(OutfitEngine::new(config.engine))
}

pub(crate) fn load_snapshot(source: SourceArgs) -> Result<CatalogSnapshot, AppError> {
    match source.items {
        Some(items) => Ok(CatalogCsvImporter::from_path(items, source.compatibility)?),
        None => Ok(sample_wardrobe()),
    }
}

pub(crate) fn analyze(
    engine: &OutfitEngine,
    snapshot: &CatalogSnapshot,
    formality: Option<&str>,
    season: Option<&str>,
) -> Result<CompatibilityReport, AppError> {
    let filters = OutfitFilters::parse(formality, season).map_err(AnalysisServiceError::from)?;
    Ok(engine.analyze_compatibility(snapshot, &filters))
}

pub(crate) fn recommend(
    engine: &OutfitEngine,
    snapshot: &CatalogSnapshot,
    size: i64,
    preferences: &CapsulePreferences,
) -> Result<CapsuleRecommendation, AppError> {
    engine
        .recommend_capsule(snapshot, size, preferences)
        .map_err(|err| AppError::from(AnalysisServiceError::from(err)))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::Io(std::io::Error::other(err)))?;
    println!("{rendered}");
    Ok(())
}

fn render_compatibility(report: &CompatibilityReport) {
    println!(
        "\nCompatibility: {} outfits from {} items ({} path), average utilization {:.1}%",
        report.total_outfits,
        report.items_analyzed,
        match report.mode {
            EnumerationMode::Exact => "exact",
            EnumerationMode::Counted => "counted",
        },
        report.avg_utilization
    );

    println!("Most worn pieces");
    for record in report.item_utilization.iter().take(5) {
        println!(
            "- {} ({}): {} outfits, {:.1}%",
            record.name,
            record.category.label(),
            record.outfit_count,
            record.utilization_percentage
        );
    }

    if let Some(best) = report.top_outfits.first() {
        let pieces: Vec<&str> = best.items.iter().map(ItemId::as_str).collect();
        println!("Best scoring outfit: {} (score {:.3})", pieces.join(" + "), best.score);
    }

    if !report.insights.is_empty() {
        println!("Insights");
        for insight in &report.insights {
            println!("- {insight}");
        }
    }
}

fn render_capsule(capsule: &CapsuleRecommendation) {
    println!(
        "\n{}: {} of {} items, {} outfits, {:.1}% smaller wardrobe",
        capsule.name,
        capsule.capsule_size,
        capsule.catalog_size,
        capsule.potential_outfits,
        capsule.reduction_percentage
    );
    for (category, entries) in &capsule.items_by_category {
        println!("{}", category.plural());
        for entry in entries {
            println!("  - {} [{}]: {}", entry.name, entry.color, entry.reason);
        }
    }
    for line in &capsule.recommendations {
        println!("* {line}");
    }
}

/// Sixteen-piece wardrobe mixing office and weekend wear with a few clashes.
pub(crate) fn sample_wardrobe() -> CatalogSnapshot {
    let pieces = [
        ("white-oxford", "White Oxford Shirt", Category::Top, "white", Formality::Business, Season::All),
        ("grey-tee", "Grey Crew Tee", Category::Top, "grey", Formality::Casual, Season::All),
        ("silk-blouse", "Ivory Silk Blouse", Category::Top, "ivory", Formality::Business, Season::Spring),
        ("linen-shirt", "Sage Linen Shirt", Category::Top, "sage", Formality::Casual, Season::Summer),
        ("charcoal-trousers", "Charcoal Trousers", Category::Bottom, "charcoal", Formality::Business, Season::All),
        ("dark-jeans", "Dark Wash Jeans", Category::Bottom, "indigo", Formality::Casual, Season::All),
        ("linen-shorts", "Linen Shorts", Category::Bottom, "sand", Formality::Casual, Season::Summer),
        ("black-sheath", "Black Sheath Dress", Category::Dress, "black", Formality::Business, Season::All),
        ("floral-sundress", "Floral Sundress", Category::Dress, "coral", Formality::Casual, Season::Summer),
        ("oxford-brogues", "Brown Brogues", Category::Shoes, "brown", Formality::Business, Season::All),
        ("white-sneakers", "White Sneakers", Category::Shoes, "white", Formality::Casual, Season::All),
        ("leather-sandals", "Leather Sandals", Category::Shoes, "tan", Formality::Casual, Season::Summer),
        ("ankle-boots", "Suede Ankle Boots", Category::Shoes, "taupe", Formality::Casual, Season::Winter),
        ("navy-blazer", "Navy Blazer", Category::Jacket, "navy", Formality::Business, Season::All),
        ("wool-coat", "Camel Wool Coat", Category::Jacket, "camel", Formality::Casual, Season::Winter),
        ("silk-scarf", "Patterned Silk Scarf", Category::Accessory, "multi", Formality::Casual, Season::All),
    ];

    let items: Vec<ClothingItem> = pieces
        .into_iter()
        .map(|(id, name, category, color, formality, season)| {
            NewClothingItem {
                name: name.to_string(),
                category,
                color: color.to_string(),
                formality,
                season,
                notes: None,
            }
            .into_item(ItemId::from(id), None)
        })
        .collect();

    let mut scores = CompatibilityMatrix::new();
    for (a, b, score) in [
        ("linen-shorts", "oxford-brogues", 0.0),
        ("floral-sundress", "ankle-boots", 0.0),
        ("charcoal-trousers", "white-sneakers", 0.3),
        ("white-oxford", "charcoal-trousers", 0.95),
    ] {
        // ids above are distinct, so inserts cannot fail
        let _ = scores.insert(ItemId::from(a), ItemId::from(b), score);
    }

    CatalogSnapshot::new(items, scores)
}
