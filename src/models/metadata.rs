use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Kind of title in the metadata catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Tv,
}

impl MediaKind {
    /// Path segment used by the metadata API
    pub fn path(self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Tv => "tv",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "movie" => Some(MediaKind::Movie),
            "tv" => Some(MediaKind::Tv),
            _ => None,
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// A movie or show returned by a metadata search or recommendation lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaMatch {
    pub kind: MediaKind,
    pub id: u64,
    pub title: String,
    pub poster_path: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub overview: String,
    pub vote_average: Option<f64>,
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// One page of `search/multi` or `{kind}/{id}/recommendations`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiPage {
    #[serde(default)]
    pub results: Vec<ApiMediaResult>,
}

/// Raw result; movies carry `title`/`release_date`, shows `name`/`first_air_date`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiMediaResult {
    pub id: u64,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
}

impl ApiMediaResult {
    /// Converts to a `MediaMatch`. People and untitled results are dropped.
    /// `fallback` applies when the result does not name its media type.
    pub fn into_match(self, fallback: Option<MediaKind>) -> Option<MediaMatch> {
        let kind = match self.media_type.as_deref() {
            Some(raw) => MediaKind::parse(raw)?,
            None => fallback?,
        };
        let title = self
            .title
            .or(self.name)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())?;
        let release_date = self
            .release_date
            .or(self.first_air_date)
            .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok());

        Some(MediaMatch {
            kind,
            id: self.id,
            title,
            poster_path: self.poster_path.filter(|p| !p.is_empty()),
            release_date,
            overview: self.overview.unwrap_or_default(),
            vote_average: self.vote_average,
        })
    }
}
