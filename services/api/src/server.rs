use crate::cli::ServeArgs;
use crate::demo::sample_wardrobe;
use crate::infra::{AppState, InMemoryItemCatalog};
use crate::routes::with_wardrobe_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;
use wardrobe::analysis::WardrobeAnalysisService;
use wardrobe::catalog::CatalogCsvImporter;
use wardrobe::config::AppConfig;
use wardrobe::error::AppError;
use wardrobe::telemetry;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let catalog = match (args.items.take(), args.sample) {
        (Some(items), _) => {
            let snapshot = CatalogCsvImporter::from_path(items, args.compatibility.take())?;
            info!(items = snapshot.items.len(), "catalog seeded from CSV export");
            InMemoryItemCatalog::seeded(snapshot)
        }
        (None, true) => InMemoryItemCatalog::seeded(sample_wardrobe()),
        (None, false) => InMemoryItemCatalog::default(),
    };
    let service = Arc::new(WardrobeAnalysisService::new(
        Arc::new(catalog),
        config.engine.clone(),
    ));

    let app = with_wardrobe_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "wardrobe analysis service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
