use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Router,
};
use serde_json::json;

use super::domain::{ItemId, NewClothingItem};
use super::matrix::CompatibilityEntry;
use super::repository::{CatalogError, ItemCatalog};

/// Router exposing clothing CRUD and pairwise score maintenance.
pub fn catalog_router<C>(catalog: Arc<C>) -> Router
where
    C: ItemCatalog + 'static,
{
    Router::new()
        .route(
            "/api/clothing",
            get(list_handler::<C>).post(create_handler::<C>),
        )
        .route(
            "/api/clothing/:item_id",
            get(fetch_handler::<C>).delete(delete_handler::<C>),
        )
        .route("/api/compatibility", put(compatibility_handler::<C>))
        .with_state(catalog)
}

pub(crate) async fn list_handler<C>(State(catalog): State<Arc<C>>) -> Response
where
    C: ItemCatalog + 'static,
{
    match catalog.list_items() {
        Ok(mut items) => {
            items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
            (StatusCode::OK, axum::Json(items)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn create_handler<C>(
    State(catalog): State<Arc<C>>,
    axum::Json(draft): axum::Json<NewClothingItem>,
) -> Response
where
    C: ItemCatalog + 'static,
{
    if let Some(field) = draft.missing_field() {
        let payload = json!({
            "error": format!("Missing required fields: name, category, color ({field} is blank)"),
        });
        return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
    }

    match catalog.insert_item(draft) {
        Ok(item) => (StatusCode::CREATED, axum::Json(item)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn fetch_handler<C>(
    State(catalog): State<Arc<C>>,
    Path(item_id): Path<String>,
) -> Response
where
    C: ItemCatalog + 'static,
{
    let id = ItemId(item_id);
    match catalog.get_item(&id) {
        Ok(Some(item)) => (StatusCode::OK, axum::Json(item)).into_response(),
        Ok(None) => error_response(CatalogError::NotFound(id)),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_handler<C>(
    State(catalog): State<Arc<C>>,
    Path(item_id): Path<String>,
) -> Response
where
    C: ItemCatalog + 'static,
{
    match catalog.remove_item(&ItemId(item_id)) {
        Ok(item) => {
            let payload = json!({
                "message": "Item deleted successfully",
                "item": item,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn compatibility_handler<C>(
    State(catalog): State<Arc<C>>,
    axum::Json(entry): axum::Json<CompatibilityEntry>,
) -> Response
where
    C: ItemCatalog + 'static,
{
    match catalog.set_compatibility(&entry.item_a, &entry.item_b, entry.score) {
        Ok(()) => (StatusCode::OK, axum::Json(entry)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: CatalogError) -> Response {
    let status = match err {
        CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
        CatalogError::InvalidRecord(_) => StatusCode::BAD_REQUEST,
        CatalogError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}
