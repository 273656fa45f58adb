//! Server-rendered HTML for the record form, dashboard and recommendation chain.
//!
//! Templates live in `templates/` and are compiled into the binary. Tera
//! autoescapes every `.html` template, so values are inserted as plain text.

use chrono::Datelike;
use lazy_static::lazy_static;
use serde::Serialize;
use tera::{Context, Tera};

use crate::{
    api::state::Draft,
    error::{AppError, AppResult},
    models::{ChainLink, Dashboard, MediaEntry, Period, RecommendationChain},
    services::archive::SaveAction,
};

lazy_static! {
    static ref TEMPLATES: Result<Tera, tera::Error> = load_templates();
}

fn load_templates() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("base.html", include_str!("../../templates/base.html")),
        ("record_form.html", include_str!("../../templates/record_form.html")),
        ("entry_card.html", include_str!("../../templates/entry_card.html")),
        ("index.html", include_str!("../../templates/index.html")),
        ("preview.html", include_str!("../../templates/preview.html")),
        ("saved.html", include_str!("../../templates/saved.html")),
        ("dashboard.html", include_str!("../../templates/dashboard.html")),
        ("chain.html", include_str!("../../templates/chain.html")),
        ("error.html", include_str!("../../templates/error.html")),
    ])?;
    Ok(tera)
}

/// Navigation tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Record,
    Dashboard,
    Recommendations,
}

impl Tab {
    fn as_str(self) -> &'static str {
        match self {
            Tab::Record => "record",
            Tab::Dashboard => "dashboard",
            Tab::Recommendations => "recommendations",
        }
    }
}

/// Values echoed back into the record form
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormValues {
    pub title: String,
    pub comment: String,
    pub watched_on: String,
}

#[derive(Debug, Serialize)]
struct EntryCard {
    title: String,
    stars: String,
    date: String,
    platform: String,
    minutes: u32,
    release: String,
    cast: String,
    comment: String,
    /// Empty when the entry has no usable poster
    image_url: String,
}

impl From<&MediaEntry> for EntryCard {
    fn from(entry: &MediaEntry) -> Self {
        Self {
            title: entry.title.clone(),
            stars: entry.rating.map(|r| r.stars()).unwrap_or_default(),
            date: entry
                .watched_on
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            platform: entry.platform.clone(),
            minutes: entry.running_time,
            release: entry
                .release_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            cast: entry.cast_crew.clone(),
            comment: entry.comment.clone(),
            image_url: if entry.has_image() {
                entry.image_url.clone()
            } else {
                String::new()
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct StatsView {
    total_titles: usize,
    hours: u64,
    minutes: u64,
    average: String,
    best: String,
}

#[derive(Debug, Serialize)]
struct LinkView {
    step: usize,
    title: String,
    kind: String,
    year: String,
    vote: String,
    recommended_from: String,
    overview: String,
    poster_url: Option<String>,
}

impl From<&ChainLink> for LinkView {
    fn from(link: &ChainLink) -> Self {
        Self {
            step: link.step,
            title: link.title.clone(),
            kind: link.kind.to_string(),
            year: link
                .release_date
                .map(|d| d.year().to_string())
                .unwrap_or_default(),
            vote: link
                .vote_average
                .map(|v| format!("{:.1}", v))
                .unwrap_or_default(),
            recommended_from: link.recommended_from.clone(),
            overview: link.overview.clone(),
            poster_url: link.poster_url.clone(),
        }
    }
}

fn render(template: &str, tab: Tab, mut context: Context) -> AppResult<String> {
    let tera = TEMPLATES
        .as_ref()
        .map_err(|e| AppError::Internal(format!("Templates failed to load: {}", e)))?;
    context.insert("tab", tab.as_str());
    Ok(tera.render(template, &context)?)
}

/// Record tab, optionally with an error shown above the form
pub fn index_page(values: &FormValues, error: Option<&str>) -> AppResult<String> {
    let mut context = Context::new();
    context.insert("form", values);
    context.insert("error", &error);
    render("index.html", Tab::Record, context)
}

/// Confirmation step between analysis and saving
pub fn preview_page(draft: &Draft) -> AppResult<String> {
    let mut context = Context::new();
    context.insert("entry", &EntryCard::from(&draft.entry));
    context.insert("draft_id", &draft.id.to_string());
    context.insert("existing", &draft.existing_row.is_some());
    render("preview.html", Tab::Record, context)
}

/// Shown after a draft has been written
pub fn saved_page(entry: &MediaEntry, action: SaveAction) -> AppResult<String> {
    let card = EntryCard::from(entry);
    let message = match action {
        SaveAction::Appended => format!("Saved! ({})", card.stars),
        SaveAction::Updated { .. } => format!("Updated! ({})", card.stars),
    };

    let mut context = Context::new();
    context.insert("message", &message);
    context.insert("entry", &card);
    context.insert("form", &FormValues::default());
    render("saved.html", Tab::Record, context)
}

/// Stats, favorites and the review feed
pub fn dashboard_page(dashboard: &Dashboard, year: i32) -> AppResult<String> {
    let stats = &dashboard.stats;
    let period = match dashboard.period {
        Period::All => "all",
        Period::Year => "year",
    };
    let feed: Vec<EntryCard> = dashboard.feed.iter().map(EntryCard::from).collect();

    let mut context = Context::new();
    context.insert("period", period);
    context.insert("year", &year);
    context.insert(
        "stats",
        &StatsView {
            total_titles: stats.total_titles,
            hours: stats.hours,
            minutes: stats.minutes,
            average: stats
                .average_rating
                .map(|a| format!("{:.1}", a))
                .unwrap_or_else(|| "-".to_string()),
            best: stats.best_title.clone().unwrap_or_else(|| "-".to_string()),
        },
    );
    context.insert("favorites", &dashboard.favorites);
    context.insert("feed", &feed);
    render("dashboard.html", Tab::Dashboard, context)
}

/// Recommendation chain, seed first
pub fn chain_page(chain: &RecommendationChain) -> AppResult<String> {
    let links: Vec<LinkView> = chain.links.iter().map(LinkView::from).collect();

    let mut context = Context::new();
    context.insert("seed", &chain.seed);
    context.insert("links", &links);
    render("chain.html", Tab::Recommendations, context)
}

/// Standalone error page
pub fn error_page(message: &str) -> AppResult<String> {
    let mut context = Context::new();
    context.insert("message", message);
    render("error.html", Tab::Record, context)
}
