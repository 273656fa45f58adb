/// TMDB provider
///
/// API Flow:
/// 1. Search: /search/multi → movies, shows and people; people are dropped
/// 2. Recommendations: /{movie|tv}/{id}/recommendations
///
/// The API key travels as a query parameter. Every request asks for the
/// configured language and the first page only.
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;

use crate::{
    error::{AppError, AppResult},
    models::{metadata::ApiPage, MediaKind, MediaMatch},
    services::metadata::MetadataProvider,
};

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    image_url: String,
    language: String,
}

impl TmdbProvider {
    pub fn new(
        http_client: HttpClient,
        api_key: String,
        api_url: String,
        image_url: String,
        language: String,
    ) -> Self {
        Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            image_url: image_url.trim_end_matches('/').to_string(),
            language,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);
        tracing::debug!(url = %url, "TMDB request");

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", self.language.as_str()),
                ("page", "1"),
            ])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbProvider {
    async fn search(&self, query: &str) -> AppResult<Vec<MediaMatch>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        let page: ApiPage = self.get_json("/search/multi", &[("query", query)]).await?;
        let matches: Vec<MediaMatch> = page
            .results
            .into_iter()
            .filter_map(|result| result.into_match(None))
            .collect();

        tracing::info!(
            query = %query,
            results = matches.len(),
            provider = "tmdb",
            "Title search completed"
        );

        Ok(matches)
    }

    async fn recommendations(&self, kind: MediaKind, id: u64) -> AppResult<Vec<MediaMatch>> {
        let path = format!("/{}/{}/recommendations", kind.path(), id);
        let page: ApiPage = self.get_json(&path, &[]).await?;
        let matches: Vec<MediaMatch> = page
            .results
            .into_iter()
            .filter_map(|result| result.into_match(Some(kind)))
            .collect();

        tracing::info!(
            kind = %kind,
            id,
            results = matches.len(),
            provider = "tmdb",
            "Recommendations fetched"
        );

        Ok(matches)
    }

    fn image_url(&self, poster_path: &str) -> String {
        format!("{}{}", self.image_url, poster_path)
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_provider() -> TmdbProvider {
        TmdbProvider::new(
            reqwest::Client::new(),
            "test_key".to_string(),
            "http://test.local/3/".to_string(),
            "https://image.tmdb.org/t/p/w500/".to_string(),
            "ko-KR".to_string(),
        )
    }

    #[test]
    fn test_image_url_joins_without_double_slash() {
        let provider = create_test_provider();
        assert_eq!(
            provider.image_url("/poster.jpg"),
            "https://image.tmdb.org/t/p/w500/poster.jpg"
        );
    }

    #[tokio::test]
    async fn test_empty_query_rejected_before_any_request() {
        let provider = create_test_provider();
        let result = provider.search("   ").await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}
