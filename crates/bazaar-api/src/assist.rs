use axum::{
    Json,
    extract::{Multipart, State},
    http::{HeaderName, header},
    response::IntoResponse,
};
use serde_json::json;
use tracing::warn;

use bazaar_ai::AnalysisMode;
use bazaar_types::api::{CheckContentRequest, GenerateDescriptionRequest};

use crate::auth::{AppState, AppStateInner};
use crate::error::ApiError;

/// POST /generate-description. The model already answers with
/// `{"description": "..."}` JSON, so the reply is relayed verbatim.
pub async fn generate_description(
    State(state): State<AppState>,
    Json(req): Json<GenerateDescriptionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.product_name.is_empty() {
        return Err(ApiError::Validation("productName must not be empty".into()));
    }

    let text = state.ai.generate_description(&req.product_name).await?;
    Ok(json_body(text))
}

/// POST /analyze-image: repair assessment from a photo.
pub async fn analyze_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    analyze(&state, multipart, AnalysisMode::Repair).await
}

/// POST /analyze-listing: listing draft from a photo.
pub async fn analyze_listing(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    analyze(&state, multipart, AnalysisMode::Listing).await
}

async fn analyze(
    state: &AppStateInner,
    mut multipart: Multipart,
    mode: AnalysisMode,
) -> Result<([(HeaderName, &'static str); 1], String), ApiError> {
    let mut image: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let declared = field
            .content_type()
            .filter(|m| m.starts_with("image/"))
            .map(str::to_string);
        let filename = field.file_name().map(str::to_string);

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::Validation(format!("could not read image: {e}")))?;

        let mime = declared.unwrap_or_else(|| {
            mime_from_filename(filename.as_deref().unwrap_or_default()).to_string()
        });

        image = Some((bytes.to_vec(), mime));
        break;
    }

    let (bytes, mime) = image
        .ok_or_else(|| ApiError::Validation("missing \"image\" field in multipart form".into()))?;

    let analysis = state.ai.analyze_image(&bytes, &mime, mode).await?;
    Ok(json_body(analysis))
}

/// POST /check-content. Fails closed: when the moderation call errors
/// out, the content is reported unsafe rather than waved through.
pub async fn check_content(
    State(state): State<AppState>,
    Json(req): Json<CheckContentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let is_safe = match state.ai.moderate_content(&req.content).await {
        Ok(verdict) => verdict,
        Err(e) => {
            warn!("moderation call failed, failing closed: {}", e);
            false
        }
    };

    Ok(Json(json!({ "is_safe": is_safe })))
}

/// The gateway replies are already JSON text; send them through with the
/// right content type instead of re-encoding.
fn json_body(text: String) -> ([(HeaderName, &'static str); 1], String) {
    ([(header::CONTENT_TYPE, "application/json")], text)
}

fn mime_from_filename(filename: &str) -> &'static str {
    let lower = filename.to_ascii_lowercase();
    if lower.ends_with(".png") {
        "image/png"
    } else if lower.ends_with(".webp") {
        "image/webp"
    } else if lower.ends_with(".heic") {
        "image/heic"
    } else {
        "image/jpeg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_falls_back_by_extension() {
        assert_eq!(mime_from_filename("photo.PNG"), "image/png");
        assert_eq!(mime_from_filename("photo.webp"), "image/webp");
        assert_eq!(mime_from_filename("photo.heic"), "image/heic");
        assert_eq!(mime_from_filename("photo.jpg"), "image/jpeg");
        assert_eq!(mime_from_filename(""), "image/jpeg");
    }
}
