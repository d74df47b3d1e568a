//! Google Gemini provider over the Generative Language REST API.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use decknotes_core::error::{GenerationErrorKind, NotesError, NotesResult};
use decknotes_core::traits::{
    BackendConfig, BackendMessage, GenerativeBackend, Part, DEFAULT_MODEL,
};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini generative backend.
pub struct GeminiBackend {
    client: Client,
    api_key: SecretString,
    model: String,
    base_url: String,
    temperature: Option<f32>,
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationSettings>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

impl GeminiBackend {
    /// Create a new Gemini backend.
    pub fn new(config: BackendConfig) -> NotesResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                NotesError::Configuration(
                    "Google API Key not found. Please set the API_KEY (or GOOGLE_API_KEY) environment variable."
                        .to_string(),
                )
            })?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| GEMINI_API_URL.to_string());
        Url::parse(&base_url).map_err(|e| {
            NotesError::Configuration(format!("Invalid backend URL '{}': {}", base_url, e))
        })?;

        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| NotesError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        let model = if config.model.trim().is_empty() {
            DEFAULT_MODEL.to_string()
        } else {
            config.model.clone()
        };

        Ok(Self {
            client,
            api_key: SecretString::new(api_key),
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn build_request(&self, messages: &[BackendMessage]) -> GenerateContentRequest {
        let contents = messages
            .iter()
            .map(|message| GeminiContent {
                role: message.role.as_str(),
                parts: message.parts.iter().map(to_gemini_part).collect(),
            })
            .collect();

        let generation_config = if self.temperature.is_some() || self.max_output_tokens.is_some() {
            Some(GenerationSettings {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            })
        } else {
            None
        };

        GenerateContentRequest {
            contents,
            generation_config,
        }
    }
}

fn to_gemini_part(part: &Part) -> GeminiPart {
    match part {
        Part::Text(text) => GeminiPart::Text { text: text.clone() },
        Part::Image { mime_type, data } => GeminiPart::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.clone(),
                data: STANDARD.encode(data),
            },
        },
    }
}

fn transport_error(err: reqwest::Error) -> NotesError {
    let message = if err.is_timeout() {
        "Gemini API request timed out".to_string()
    } else if err.is_connect() {
        "Could not connect to the Gemini API".to_string()
    } else {
        format!("Gemini API request failed: {}", err)
    };
    NotesError::generation_with_source(GenerationErrorKind::Network, message, err)
}

fn reply_text(response: GenerateContentResponse) -> NotesResult<String> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates returned".to_string());
        return Err(NotesError::invalid_response(format!(
            "Gemini returned no answer: {}",
            reason
        )));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "empty content".to_string());
        return Err(NotesError::invalid_response(format!(
            "Gemini returned no text: {}",
            reason
        )));
    }
    Ok(text)
}

#[async_trait]
impl GenerativeBackend for GeminiBackend {
    async fn complete(&self, messages: &[BackendMessage]) -> NotesResult<String> {
        let request = self.build_request(messages);
        debug!(
            model = %self.model,
            messages = messages.len(),
            "Sending Gemini request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            warn!(status = status.as_u16(), "Gemini API error");
            return Err(NotesError::from_http_status(status.as_u16(), &message));
        }

        let response: GenerateContentResponse = serde_json::from_str(&body).map_err(|e| {
            NotesError::invalid_response(format!("Failed to parse Gemini response: {}", e))
        })?;
        reply_text(response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use decknotes_core::types::ChatTurn;
    use serde_json::json;

    fn config() -> BackendConfig {
        BackendConfig {
            api_key: Some("test-key".to_string()),
            ..BackendConfig::default()
        }
    }

    #[test]
    fn test_missing_api_key() {
        let result = GeminiBackend::new(BackendConfig::default());
        assert!(matches!(result, Err(NotesError::Configuration(_))));
    }

    #[test]
    fn test_invalid_base_url() {
        let result = GeminiBackend::new(BackendConfig {
            base_url: Some("not a url".to_string()),
            ..config()
        });
        assert!(matches!(result, Err(NotesError::Configuration(_))));
    }

    #[test]
    fn test_endpoint_uses_model() {
        let backend = GeminiBackend::new(BackendConfig {
            base_url: Some("http://localhost:9999/v1beta/".to_string()),
            model: "gemini-1.5-pro".to_string(),
            ..config()
        })
        .unwrap();
        assert_eq!(
            backend.endpoint(),
            "http://localhost:9999/v1beta/models/gemini-1.5-pro:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let backend = GeminiBackend::new(BackendConfig {
            temperature: Some(0.4),
            ..config()
        })
        .unwrap();
        let messages = vec![
            BackendMessage::from(&ChatTurn::user("seed")),
            BackendMessage::from(&ChatTurn::model("ok")),
            BackendMessage::user(vec![Part::text("look"), Part::image("image/png", vec![1, 2, 3])]),
        ];

        let body = serde_json::to_value(backend.build_request(&messages)).unwrap();
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][2]["parts"][0], json!({"text": "look"}));
        assert_eq!(
            body["contents"][2]["parts"][1],
            json!({"inlineData": {"mimeType": "image/png", "data": "AQID"}})
        );
        assert_eq!(body["generationConfig"]["temperature"], json!(0.4f32));
        assert!(body["generationConfig"].get("maxOutputTokens").is_none());
    }

    #[test]
    fn test_no_generation_config_by_default() {
        let backend = GeminiBackend::new(config()).unwrap();
        let body = serde_json::to_value(backend.build_request(&[])).unwrap();
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn test_reply_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "# Notes"}, {"text": "\n- a"}]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        assert_eq!(reply_text(response).unwrap(), "# Notes\n- a");
    }

    #[test]
    fn test_blocked_prompt_is_invalid_response() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        let err = reply_text(response).unwrap_err();
        assert_eq!(err.generation_kind(), Some(GenerationErrorKind::InvalidResponse));
        assert!(err.to_string().contains("SAFETY"));
    }
}
