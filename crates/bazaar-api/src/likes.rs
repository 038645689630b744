use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use bazaar_types::api::ToggleLikeRequest;

use crate::auth::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct LikesQuery {
    #[serde(default)]
    pub user_id: String,
}

pub async fn toggle_like(
    State(state): State<AppState>,
    Json(req): Json<ToggleLikeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.user_id.is_empty() || req.item_id.is_empty() {
        return Err(ApiError::Validation(
            "user_id and item_id must not be empty".into(),
        ));
    }

    let liked = state.db.toggle_like(&req.user_id, &req.item_id)?;

    Ok(Json(json!({ "liked": liked })))
}

pub async fn get_likes(
    State(state): State<AppState>,
    Query(query): Query<LikesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if query.user_id.is_empty() {
        return Err(ApiError::Validation("user_id parameter is required".into()));
    }

    let ids = state.db.get_liked_item_ids(&query.user_id)?;
    Ok(Json(ids))
}
