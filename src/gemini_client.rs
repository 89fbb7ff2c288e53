use crate::config::Config;
use crate::errors::AppError;
use crate::gateway::TextGenerator;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Client for the Gemini `generateContent` endpoint.
///
/// Single-shot: a failed call is reported, never retried.
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

// ============ Response envelope ============

#[derive(Debug, Default, Deserialize)]
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
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate; empty when the model produced none.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

impl GeminiClient {
    /// Creates a new `GeminiClient` from the service configuration.
    ///
    /// A missing API key is not an error here; it is reported on the first call.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| {
                AppError::InternalError(format!("Failed to create Gemini client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            model: config.gemini_model.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, system_instruction: &str, prompt: &str) -> Result<String, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(AppError::CredentialMissing)?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        tracing::info!("Requesting analysis from Gemini model {}", self.model);
        // Key travels in a header so it never shows up in logged URLs
        tracing::debug!("Gemini URL: {}", url);

        let body = json!({
            "systemInstruction": {
                "parts": [{ "text": system_instruction }]
            },
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "responseMimeType": "application/json"
            }
        });

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::TransportError(format!("Gemini request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("Gemini returned error {}: {}", status, error_text);
            return Err(AppError::TransportError(format!(
                "Gemini returned {}: {}",
                status, error_text
            )));
        }

        let envelope: GenerateContentResponse = response.json().await.map_err(|e| {
            AppError::TransportError(format!("Failed to parse Gemini response: {}", e))
        })?;

        if let Some(reason) = envelope
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            tracing::warn!("Gemini blocked the prompt: {}", reason);
        }
        if let Some(reason) = envelope
            .candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
        {
            tracing::debug!("Gemini finish reason: {}", reason);
        }

        Ok(envelope.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::ValidationMode;

    fn config() -> Config {
        Config {
            port: 3000,
            api_key: None,
            gemini_base_url: "https://example.com/".to_string(),
            gemini_model: "gemini-2.5-flash".to_string(),
            request_timeout_secs: 5,
            validation_mode: ValidationMode::Structural,
        }
    }

    #[tokio::test]
    async fn test_client_creation() {
        let client = GeminiClient::new(&config()).unwrap();
        assert_eq!(client.base_url, "https://example.com");
        assert_eq!(client.model(), "gemini-2.5-flash");
    }

    #[tokio::test]
    async fn test_generate_without_key_fails_before_io() {
        let client = GeminiClient::new(&config()).unwrap();
        let err = client.generate("sys", "prompt").await.unwrap_err();
        assert_eq!(err, AppError::CredentialMissing);
    }

    #[test]
    fn test_envelope_text_joins_parts_of_first_candidate() {
        let envelope: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                {"content": {"parts": [{"text": "{\"a\":"}, {"text": " 1}"}]}, "finishReason": "STOP"},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }))
        .unwrap();
        assert_eq!(envelope.text(), "{\"a\": 1}");
    }

    #[test]
    fn test_envelope_without_candidates_is_empty() {
        let envelope: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        assert_eq!(envelope.text(), "");
    }
}
