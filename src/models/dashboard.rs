use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{MediaEntry, MediaKind};

/// Time window the dashboard aggregates over
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    #[default]
    All,
    /// Entries watched in the current calendar year
    Year,
}

impl Period {
    pub fn includes(self, entry: &MediaEntry, today: NaiveDate) -> bool {
        match self {
            Period::All => true,
            Period::Year => entry
                .watched_on
                .is_some_and(|d| d.year() == today.year()),
        }
    }
}

/// Aggregate figures for the selected period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_titles: usize,
    pub total_minutes: u64,
    pub hours: u64,
    pub minutes: u64,
    /// Mean over rated entries, one decimal
    pub average_rating: Option<f64>,
    pub best_title: Option<String>,
}

/// A cast or crew name with how many highly rated entries mention it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FavoriteName {
    pub rank: usize,
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub period: Period,
    pub stats: DashboardStats,
    pub favorites: Vec<FavoriteName>,
    /// Newest first
    pub feed: Vec<MediaEntry>,
}

/// One step of the recommendation chain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainLink {
    pub step: usize,
    /// Title this link was recommended from
    pub recommended_from: String,
    pub title: String,
    pub kind: MediaKind,
    pub poster_url: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub overview: String,
    pub vote_average: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationChain {
    pub seed: Option<String>,
    pub links: Vec<ChainLink>,
}

/// Outcome of collapsing repeated titles
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DedupReport {
    pub before: usize,
    pub after: usize,
    pub removed: usize,
}

/// Result of probing one external collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub ok: bool,
    pub detail: String,
}
