use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::info;

use bazaar_ai::AiClient;
use bazaar_db::Database;
use bazaar_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest};
use bazaar_types::models::User;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub ai: AiClient,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = create_user(&state, &req)?;
    info!("registered user {} ({})", user.id, user.name);
    Ok((StatusCode::CREATED, Json(user)))
}

/// Registration shared by POST /register and POST /user: same operation,
/// different response shapes.
pub(crate) fn create_user(state: &AppStateInner, req: &RegisterRequest) -> Result<User, ApiError> {
    if req.password.is_empty() {
        return Err(ApiError::Validation("password must not be empty".into()));
    }

    let user = User::new(&req.name, &req.email)?;

    // Check if the email is taken; the UNIQUE constraint backs this up
    // against races.
    if state.db.get_user_by_email(&req.email)?.is_some() {
        return Err(ApiError::Conflict("email is already registered".into()));
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Storage(anyhow::anyhow!("password hash failed: {}", e)))?
        .to_string();

    state
        .db
        .create_user(&user.id, &user.name, &user.email, &password_hash)?;

    Ok(user)
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_user_by_email(&req.email)?
        .ok_or_else(|| ApiError::Auth("invalid email or password".into()))?;

    let parsed_hash = PasswordHash::new(&row.password)
        .map_err(|e| ApiError::Storage(anyhow::anyhow!("stored hash is corrupt: {}", e)))?;

    // Argon2 verification, constant-time under the hood
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Auth("invalid email or password".into()))?;

    let token = create_token(&state.jwt_secret, &row.id, &row.name).map_err(ApiError::Storage)?;

    Ok(Json(LoginResponse {
        token,
        user: User {
            id: row.id,
            name: row.name,
            email: row.email,
        },
    }))
}

fn create_token(secret: &str, user_id: &str, name: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id.to_string(),
        name: name.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::hours(24)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            jwt_secret: "test-secret".into(),
            ai: AiClient::new("test-key".into(), "test-model".into()).unwrap(),
        })
    }

    fn register_req() -> RegisterRequest {
        RegisterRequest {
            name: "Taro".into(),
            email: "taro@x.com".into(),
            password: "pw".into(),
        }
    }

    #[tokio::test]
    async fn register_then_login_round_trip() {
        let state = state();

        let user = create_user(&state, &register_req()).unwrap();
        assert_eq!(user.name, "Taro");

        // Same email registers exactly once
        let err = create_user(&state, &register_req()).unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        let ok = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "taro@x.com".into(),
                password: "pw".into(),
            }),
        )
        .await;
        assert!(ok.is_ok());

        let err = login(
            State(state),
            Json(LoginRequest {
                email: "taro@x.com".into(),
                password: "wrong".into(),
            }),
        )
        .await
        .map(|r| r.into_response())
        .err()
        .unwrap();
        assert!(matches!(err, ApiError::Auth(_)));
    }

    #[test]
    fn registration_validates_field_presence() {
        let state = state();

        let mut req = register_req();
        req.password = String::new();
        assert!(matches!(
            create_user(&state, &req).unwrap_err(),
            ApiError::Validation(_)
        ));

        let mut req = register_req();
        req.name = String::new();
        assert!(matches!(
            create_user(&state, &req).unwrap_err(),
            ApiError::Validation(_)
        ));
    }
}
