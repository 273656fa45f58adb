/// Google Gemini via the `generateContent` REST endpoint
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::{AppError, AppResult},
    services::llm::LanguageModel,
};

pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Clone)]
pub struct GeminiModel {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

impl GeminiModel {
    pub fn new(
        http_client: HttpClient,
        api_key: String,
        api_url: Option<String>,
        model: Option<String>,
    ) -> Self {
        Self {
            http_client,
            api_key,
            api_url: api_url
                .unwrap_or_else(|| DEFAULT_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }
}

/// Concatenated text parts of the first candidate
fn response_text(response: GenerateResponse) -> Option<String> {
    let content = response.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
    (!text.trim().is_empty()).then_some(text)
}

#[async_trait::async_trait]
impl LanguageModel for GeminiModel {
    async fn complete(&self, prompt: &str) -> AppResult<String> {
        let url = format!("{}/models/{}:generateContent", self.api_url, self.model);
        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({
                "contents": [{ "role": "user", "parts": [{ "text": prompt }] }]
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Llm(format!(
                "Gemini API returned status {}: {}",
                status, body
            )));
        }

        let body: GenerateResponse = response.json().await?;
        let text = response_text(body)
            .ok_or_else(|| AppError::Llm("Gemini returned no text".to_string()))?;

        tracing::debug!(model = %self.model, chars = text.len(), "Gemini completion received");
        Ok(text)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_text_joins_parts() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{"text": "```json\n{"}, {"text": "}\n```"}] },
                "finishReason": "STOP"
            }]
        }))
        .unwrap();

        assert_eq!(response_text(response).unwrap(), "```json\n{}\n```");
    }

    #[test]
    fn test_response_text_blocked_prompt() {
        let response: GenerateResponse =
            serde_json::from_value(json!({ "promptFeedback": { "blockReason": "SAFETY" } }))
                .unwrap();
        assert!(response_text(response).is_none());
    }

    #[test]
    fn test_defaults() {
        let model = GeminiModel::new(reqwest::Client::new(), "k".to_string(), None, None);
        assert_eq!(model.name(), DEFAULT_MODEL);
        assert_eq!(model.api_url, DEFAULT_API_URL);
    }
}
