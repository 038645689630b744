use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use bazaar_types::api::SendMessageRequest;
use bazaar_types::models::Message;

use crate::auth::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    #[serde(default)]
    pub item_id: String,
}

/// GET /messages?item_id= returns oldest first; the stored timestamps
/// sort the same as strings and as times.
pub async fn get_messages(
    State(state): State<AppState>,
    Query(query): Query<MessagesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if query.item_id.is_empty() {
        return Err(ApiError::Validation("item_id parameter is required".into()));
    }

    let db = state.clone();
    let item_id = query.item_id;
    let rows = tokio::task::spawn_blocking(move || db.db.get_messages(&item_id))
        .await
        .map_err(|e| ApiError::Storage(anyhow::anyhow!("spawn_blocking join error: {}", e)))??;

    let messages: Vec<Message> = rows
        .into_iter()
        .map(|r| Message {
            id: r.id,
            item_id: r.item_id,
            sender_id: r.sender_id,
            content: r.content,
            created_at: r.created_at,
        })
        .collect();

    Ok(Json(messages))
}

pub async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let msg = Message::new(&req.item_id, &req.sender_id, &req.content)?;

    state
        .db
        .insert_message(&msg.id, &msg.item_id, &msg.sender_id, &msg.content, &msg.created_at)?;

    Ok(Json(msg))
}
