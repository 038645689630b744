pub mod prompts;

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-1.5-flash-002";

/// Outbound calls are bounded; a stuck provider must not pin a request
/// worker forever.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum AiError {
    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,
    #[error("request to AI provider failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("AI provider returned {status}: {body}")]
    Provider { status: u16, body: String },
    #[error("could not decode AI provider response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("AI provider returned no candidates")]
    EmptyResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    /// Repair-assessment: is the pictured item worth fixing up before resale?
    Repair,
    /// Listing-assistant: draft a sellable listing from a photo.
    Listing,
}

pub struct AiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl AiClient {
    /// Reads `GEMINI_API_KEY` (required) and `BAZAAR_AI_MODEL` (optional).
    /// A missing key is a configuration error the caller should treat as
    /// fatal at startup.
    pub fn from_env() -> Result<Self, AiError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map(|k| k.trim().to_string())
            .unwrap_or_default();
        if api_key.is_empty() {
            return Err(AiError::MissingApiKey);
        }

        let model = std::env::var("BAZAAR_AI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
        Self::new(api_key, model)
    }

    pub fn new(api_key: String, model: String) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            api_key,
            model,
        })
    }

    /// Text-only generation. The model replies with
    /// `{"description": "..."}` JSON, relayed to the caller as-is.
    pub async fn generate_description(&self, product_name: &str) -> Result<String, AiError> {
        self.generate(prompts::description(product_name), None).await
    }

    /// Vision call with an inlined base64 image and a mode-specific
    /// structured-output prompt. Fences are stripped from the reply.
    pub async fn analyze_image(
        &self,
        image: &[u8],
        mime_type: &str,
        mode: AnalysisMode,
    ) -> Result<String, AiError> {
        let prompt = match mode {
            AnalysisMode::Repair => prompts::REPAIR,
            AnalysisMode::Listing => prompts::LISTING,
        };

        let text = self
            .generate(prompt.to_string(), Some((image, mime_type)))
            .await?;
        Ok(strip_code_fences(&text))
    }

    /// Classification call. Returns true when the content is safe.
    pub async fn moderate_content(&self, content: &str) -> Result<bool, AiError> {
        let reply = self.generate(prompts::moderation(content), None).await?;
        Ok(is_safe_verdict(&reply))
    }

    async fn generate(
        &self,
        prompt: String,
        image: Option<(&[u8], &str)>,
    ) -> Result<String, AiError> {
        let url = format!(
            "{API_BASE}/models/{}:generateContent?key={}",
            self.model, self.api_key
        );
        debug!(
            "Gemini request ({}) start, key {}",
            self.model,
            mask_key(&self.api_key)
        );

        let mut parts = vec![Part {
            text: Some(prompt),
            inline_data: None,
        }];
        if let Some((bytes, mime)) = image {
            parts.push(Part {
                text: None,
                inline_data: Some(InlineData {
                    mime_type: mime.to_string(),
                    data: B64.encode(bytes),
                }),
            });
        }

        let body = GenerateRequest {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        let resp = self.http.post(&url).json(&body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if status == reqwest::StatusCode::NOT_FOUND {
            // Usually a bad model id. Log what the provider does offer.
            error!("model {} not found (404)", self.model);
            self.log_available_models().await;
        }

        if !status.is_success() {
            error!("Gemini error body: {}", text.replace('\n', " "));
            return Err(AiError::Provider {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&text)?;
        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or(AiError::EmptyResponse)
    }

    async fn log_available_models(&self) {
        let url = format!("{API_BASE}/models?key={}", self.api_key);
        match self.http.get(&url).send().await {
            Ok(resp) => match resp.text().await {
                Ok(body) => warn!("available models: {}", body.replace('\n', " ")),
                Err(e) => warn!("failed to read model listing: {}", e),
            },
            Err(e) => warn!("failed to list models: {}", e),
        }
    }
}

/// Models asked for JSON output still wrap it in markdown fences sometimes;
/// strip them before relaying.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

fn is_safe_verdict(reply: &str) -> bool {
    !reply.contains("UNSAFE")
}

fn mask_key(key: &str) -> String {
    if key.len() > 8 {
        format!("{}....{}", &key[..4], &key[key.len() - 4..])
    } else {
        "****".to_string()
    }
}

// -- Wire types for the generateContent endpoint --

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Deserialize, Default)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<TextPart>,
}

#[derive(Deserialize)]
struct TextPart {
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fences_are_stripped() {
        let fenced = "```json\n{\"title\": \"Chair\"}\n```";
        assert_eq!(strip_code_fences(fenced), "{\"title\": \"Chair\"}");

        let bare = "{\"title\": \"Chair\"}";
        assert_eq!(strip_code_fences(bare), bare);
    }

    #[test]
    fn moderation_verdicts() {
        assert!(is_safe_verdict("{\"result\": \"SAFE\"}"));
        assert!(!is_safe_verdict("{\"result\": \"UNSAFE\"}"));
        // A bare token still counts
        assert!(!is_safe_verdict("UNSAFE"));
    }

    #[test]
    fn masked_keys_keep_only_the_edges() {
        assert_eq!(mask_key("AIzaSyExample1234"), "AIza....1234");
        assert_eq!(mask_key("short"), "****");
    }

    #[test]
    fn request_body_shape() {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part {
                        text: Some("describe this".into()),
                        inline_data: None,
                    },
                    Part {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: "image/png".into(),
                            data: B64.encode(b"img"),
                        }),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "describe this");
        assert_eq!(
            json["contents"][0]["parts"][1]["inlineData"]["mimeType"],
            "image/png"
        );
        // Unset sides of a part are omitted, not null
        assert!(json["contents"][0]["parts"][0].get("inlineData").is_none());
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
    }

    #[test]
    fn response_text_extraction() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"hello"}]}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text);
        assert_eq!(text.as_deref(), Some("hello"));

        let empty: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.candidates.is_empty());
    }
}
