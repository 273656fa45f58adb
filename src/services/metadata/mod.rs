/// Media metadata provider abstraction
///
/// Posters for new entries and the recommendation chain both come from a
/// metadata catalogue. `TmdbProvider` is the real implementation;
/// `Unconfigured` stands in when no API key is set and finds nothing.
use crate::{
    error::AppResult,
    models::{MediaKind, MediaMatch},
};

pub mod tmdb;

pub use tmdb::TmdbProvider;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Searches movies and shows by name (people are skipped)
    async fn search(&self, query: &str) -> AppResult<Vec<MediaMatch>>;

    /// Titles the catalogue recommends for a given movie or show
    async fn recommendations(&self, kind: MediaKind, id: u64) -> AppResult<Vec<MediaMatch>>;

    /// Expands a poster path into a full image URL
    fn image_url(&self, poster_path: &str) -> String;

    /// Poster of the first search result that has one
    async fn poster_url(&self, query: &str) -> AppResult<Option<String>> {
        let matches = self.search(query).await?;
        Ok(matches
            .iter()
            .find_map(|m| m.poster_path.as_deref())
            .map(|path| self.image_url(path)))
    }

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Provider used when no metadata API key is configured
pub struct Unconfigured;

#[async_trait::async_trait]
impl MetadataProvider for Unconfigured {
    async fn search(&self, _query: &str) -> AppResult<Vec<MediaMatch>> {
        Ok(Vec::new())
    }

    async fn recommendations(&self, _kind: MediaKind, _id: u64) -> AppResult<Vec<MediaMatch>> {
        Ok(Vec::new())
    }

    fn image_url(&self, poster_path: &str) -> String {
        poster_path.to_string()
    }

    fn name(&self) -> &'static str {
        "unconfigured"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(title: &str, poster: Option<&str>) -> MediaMatch {
        MediaMatch {
            kind: MediaKind::Movie,
            id: 1,
            title: title.to_string(),
            poster_path: poster.map(str::to_string),
            release_date: None,
            overview: String::new(),
            vote_average: None,
        }
    }

    struct Fixed(Vec<MediaMatch>);

    #[async_trait::async_trait]
    impl MetadataProvider for Fixed {
        async fn search(&self, _query: &str) -> AppResult<Vec<MediaMatch>> {
            Ok(self.0.clone())
        }

        async fn recommendations(&self, _kind: MediaKind, _id: u64) -> AppResult<Vec<MediaMatch>> {
            Ok(Vec::new())
        }

        fn image_url(&self, poster_path: &str) -> String {
            format!("https://img.test/w500{}", poster_path)
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_poster_url_skips_results_without_poster() {
        let provider = Fixed(vec![sample("A", None), sample("B", Some("/b.jpg"))]);
        let url = provider.poster_url("query").await.unwrap();
        assert_eq!(url, Some("https://img.test/w500/b.jpg".to_string()));
    }

    #[tokio::test]
    async fn test_poster_url_none_when_nothing_matches() {
        let provider = Fixed(vec![sample("A", None)]);
        assert_eq!(provider.poster_url("query").await.unwrap(), None);
        assert_eq!(Unconfigured.poster_url("query").await.unwrap(), None);
    }
}
