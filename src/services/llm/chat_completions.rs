/// OpenAI-compatible `/chat/completions` endpoint (Groq by default)
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::{AppError, AppResult},
    services::llm::LanguageModel,
};

pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Clone)]
pub struct ChatCompletionsModel {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

impl ChatCompletionsModel {
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

#[async_trait::async_trait]
impl LanguageModel for ChatCompletionsModel {
    async fn complete(&self, prompt: &str) -> AppResult<String> {
        let url = format!("{}/chat/completions", self.api_url);
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "messages": [{ "role": "user", "content": prompt }],
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Llm(format!(
                "Chat completions API returned status {}: {}",
                status, body
            )));
        }

        let body: CompletionResponse = response.json().await?;
        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| AppError::Llm("Model returned no content".to_string()))?;

        tracing::debug!(model = %self.model, chars = text.len(), "Chat completion received");
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
    fn test_completion_response_shape() {
        let body: CompletionResponse = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": "pong" } }]
        }))
        .unwrap();

        assert_eq!(body.choices[0].message.content.as_deref(), Some("pong"));
    }

    #[test]
    fn test_custom_endpoint_trailing_slash() {
        let model = ChatCompletionsModel::new(
            reqwest::Client::new(),
            "k".to_string(),
            Some("http://localhost:11434/v1/".to_string()),
            Some("llama3".to_string()),
        );
        assert_eq!(model.api_url, "http://localhost:11434/v1");
        assert_eq!(model.name(), "llama3");
    }
}
