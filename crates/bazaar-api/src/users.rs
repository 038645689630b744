use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use bazaar_types::api::{CreateUserResponse, RegisterRequest};
use bazaar_types::models::User;

use crate::auth::{self, AppState};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub name: String,
}

/// GET /user?name= does an exact name match; zero hits is an empty array.
pub async fn search_users(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if query.name.is_empty() {
        return Err(ApiError::Validation("name parameter is required".into()));
    }

    let rows = state.db.find_users_by_name(&query.name)?;

    let users: Vec<User> = rows
        .into_iter()
        .map(|r| User {
            id: r.id,
            name: r.name,
            email: r.email,
        })
        .collect();

    Ok(Json(users))
}

/// POST /user: registration that answers with just the generated id.
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = auth::create_user(&state, &req)?;
    Ok((StatusCode::CREATED, Json(CreateUserResponse { id: user.id })))
}
