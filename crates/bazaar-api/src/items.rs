use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use bazaar_db::models::ItemRow;
use bazaar_types::api::AddItemRequest;
use bazaar_types::models::Item;

use crate::auth::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PurchaseQuery {
    #[serde(default)]
    pub id: String,
}

pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let keyword = query.q.filter(|q| !q.is_empty());

    // Run blocking DB reads off the async runtime
    let rows = tokio::task::spawn_blocking(move || match keyword.as_deref() {
        Some(kw) => db.db.search_items(kw),
        None => db.db.list_items(),
    })
    .await
    .map_err(|e| ApiError::Storage(anyhow::anyhow!("spawn_blocking join error: {}", e)))?;

    // A failed read degrades to an empty listing so browsing UIs stay up.
    let rows = match rows {
        Ok(rows) => rows,
        Err(e) => {
            error!("item listing failed: {:#}", e);
            Vec::new()
        }
    };

    let items: Vec<Item> = rows.into_iter().map(item_from_row).collect();
    Ok(Json(items))
}

pub async fn add_item(
    State(state): State<AppState>,
    Json(req): Json<AddItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let item = Item::new(&req.name, req.price, &req.description, req.image_url)?;

    state.db.insert_item(
        &item.id,
        &item.name,
        item.price,
        &item.description,
        item.image_url.as_deref(),
        &item.created_at,
    )?;

    info!("item {} listed: {}", item.id, item.name);
    Ok((StatusCode::CREATED, Json(item)))
}

/// Purchasing an unknown id is a 404; re-purchasing a sold item succeeds
/// silently so the operation stays idempotent.
pub async fn purchase_item(
    State(state): State<AppState>,
    Query(query): Query<PurchaseQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if query.id.is_empty() {
        return Err(ApiError::Validation("id parameter is required".into()));
    }

    let updated = state.db.purchase_item(&query.id)?;
    if !updated {
        return Err(ApiError::NotFound("item not found".into()));
    }

    Ok(Json(json!({ "message": "Purchase successful" })))
}

fn item_from_row(row: ItemRow) -> Item {
    Item {
        id: row.id,
        name: row.name,
        price: row.price,
        description: row.description,
        sold_out: row.sold_out,
        image_url: row.image_url,
        like_count: row.like_count,
        created_at: row.created_at,
    }
}
