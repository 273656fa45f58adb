use serde::Deserialize;

/// Which hosted language model backs entry enrichment
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Google Gemini `generateContent`
    Gemini,
    /// Any OpenAI-compatible `/chat/completions` endpoint (Groq by default)
    Openai,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path to the Google service-account JSON key.
    /// Without it entries are kept in memory only.
    #[serde(default)]
    pub google_credentials_path: Option<String>,

    /// Spreadsheet id; resolved from `spreadsheet_name` when absent
    #[serde(default)]
    pub spreadsheet_id: Option<String>,

    #[serde(default = "default_spreadsheet_name")]
    pub spreadsheet_name: String,

    /// Worksheet (tab) holding the log
    #[serde(default = "default_worksheet")]
    pub worksheet: String,

    /// TMDB API key; posters and recommendations are disabled without it
    #[serde(default)]
    pub tmdb_api_key: Option<String>,

    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    #[serde(default = "default_tmdb_image_url")]
    pub tmdb_image_url: String,

    #[serde(default = "default_tmdb_language")]
    pub tmdb_language: String,

    #[serde(default = "default_llm_provider")]
    pub llm_provider: LlmProvider,

    /// Language model API key
    pub llm_api_key: String,

    /// Overrides the provider's default endpoint
    #[serde(default)]
    pub llm_api_url: Option<String>,

    /// Overrides the provider's default model
    #[serde(default)]
    pub llm_model: Option<String>,

    /// Language the model writes cast/crew names in
    #[serde(default = "default_content_language")]
    pub content_language: String,

    /// Default length of the recommendation chain
    #[serde(default = "default_recommendation_steps")]
    pub recommendation_steps: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_spreadsheet_name() -> String {
    "media_db".to_string()
}

fn default_worksheet() -> String {
    "Sheet1".to_string()
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

fn default_tmdb_language() -> String {
    "ko-KR".to_string()
}

fn default_llm_provider() -> LlmProvider {
    LlmProvider::Gemini
}

fn default_content_language() -> String {
    "Korean".to_string()
}

fn default_recommendation_steps() -> usize {
    5
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Socket address the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_optional_fields() {
        let vars = vec![("LLM_API_KEY".to_string(), "secret".to_string())];
        let config: Config = envy::from_iter(vars).unwrap();

        assert_eq!(config.bind_addr(), "127.0.0.1:3000");
        assert_eq!(config.spreadsheet_name, "media_db");
        assert_eq!(config.worksheet, "Sheet1");
        assert_eq!(config.tmdb_language, "ko-KR");
        assert_eq!(config.llm_provider, LlmProvider::Gemini);
        assert_eq!(config.recommendation_steps, 5);
        assert!(config.google_credentials_path.is_none());
        assert!(config.tmdb_api_key.is_none());
    }

    #[test]
    fn test_provider_parsed_from_env() {
        let vars = vec![
            ("LLM_API_KEY".to_string(), "secret".to_string()),
            ("LLM_PROVIDER".to_string(), "openai".to_string()),
            ("PORT".to_string(), "8080".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();

        assert_eq!(config.llm_provider, LlmProvider::Openai);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_missing_api_key_is_an_error() {
        let vars: Vec<(String, String)> = Vec::new();
        assert!(envy::from_iter::<_, Config>(vars).is_err());
    }
}
