/// Hosted language model abstraction
///
/// The model is prompted for a JSON object and answers with free text; turning
/// that text into structured data is the caller's job (see `enrichment`).
use crate::error::AppResult;

pub mod chat_completions;
pub mod gemini;

pub use chat_completions::ChatCompletionsModel;
pub use gemini::GeminiModel;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    /// Sends a single user prompt and returns the model's text reply
    async fn complete(&self, prompt: &str) -> AppResult<String>;

    /// Model name for logging and debugging
    fn name(&self) -> &str;
}
