use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{same_title, MediaEntry, Rating, StoredEntry},
    services::{
        enrichment, llm::LanguageModel, metadata::MetadataProvider, store::EntryStore,
    },
};

/// What the user typed into the record form
#[derive(Debug, Clone, Deserialize)]
pub struct EntryInput {
    pub title: String,
    pub comment: String,
    #[serde(default)]
    pub watched_on: Option<NaiveDate>,
}

/// An enriched entry that has not been written yet
#[derive(Debug, Clone, Serialize)]
pub struct PreparedEntry {
    pub entry: MediaEntry,
    /// Row of the existing entry this one will merge into
    pub existing_row: Option<usize>,
}

/// How an entry reached the sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SaveAction {
    Appended,
    Updated { row: usize },
}

/// Title and comment are both required
pub fn validate(input: &EntryInput) -> AppResult<()> {
    if input.title.trim().is_empty() || input.comment.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Both a title and a comment are required".to_string(),
        ));
    }
    Ok(())
}

/// First stored row with the given title
pub fn find_existing<'a>(entries: &'a [StoredEntry], title: &str) -> Option<&'a StoredEntry> {
    entries.iter().find(|stored| same_title(&stored.entry.title, title))
}

/// Enriches an entry without saving it.
///
/// A title that is already logged merges with its row: the comments are
/// joined with " / " and the model's new rating is averaged with the stored
/// one. A failed poster lookup leaves the image empty; a failed model call
/// aborts.
pub async fn prepare_entry(
    store: &dyn EntryStore,
    metadata: &dyn MetadataProvider,
    model: &dyn LanguageModel,
    input: &EntryInput,
    language: &str,
    today: NaiveDate,
) -> AppResult<PreparedEntry> {
    validate(input)?;
    let title = input.title.trim();
    let comment = input.comment.trim();

    let entries = store.list_entries().await?;
    let existing = find_existing(&entries, title);

    let combined_comment = match existing {
        Some(stored) if !stored.entry.comment.trim().is_empty() => {
            format!("{} / {}", stored.entry.comment.trim(), comment)
        }
        _ => comment.to_string(),
    };

    if let Some(stored) = existing {
        tracing::info!(title = %title, row = stored.row, "Merging into existing entry");
    }

    let enriched = enrichment::analyze(model, title, &combined_comment, language).await?;

    let rating = match existing.and_then(|stored| stored.entry.rating) {
        Some(previous) => Rating::average(previous, enriched.rating),
        None => enriched.rating,
    };

    let image_url = match metadata.poster_url(title).await {
        Ok(url) => url.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(title = %title, error = %e, "Poster lookup failed");
            String::new()
        }
    };

    let entry = MediaEntry {
        watched_on: Some(input.watched_on.or(enriched.release_date).unwrap_or(today)),
        title: title.to_string(),
        platform: enriched.platform,
        rating: Some(rating),
        comment: combined_comment,
        release_date: enriched.release_date,
        image_url,
        running_time: enriched.running_time,
        cast_crew: enriched.cast_crew,
    };

    Ok(PreparedEntry {
        entry,
        existing_row: existing.map(|stored| stored.row),
    })
}

/// Writes an entry, updating the row that holds its title or appending.
/// The row is looked up again so drafts confirmed later still land correctly.
pub async fn save_entry(store: &dyn EntryStore, entry: &MediaEntry) -> AppResult<SaveAction> {
    let entries = store.list_entries().await?;

    match find_existing(&entries, &entry.title) {
        Some(stored) => {
            store.update_entry(stored.row, entry).await?;
            Ok(SaveAction::Updated { row: stored.row })
        }
        None => {
            store.append_entry(entry).await?;
            Ok(SaveAction::Appended)
        }
    }
}

/// Prepares and immediately saves an entry
pub async fn record_entry(
    store: &dyn EntryStore,
    metadata: &dyn MetadataProvider,
    model: &dyn LanguageModel,
    input: &EntryInput,
    language: &str,
    today: NaiveDate,
) -> AppResult<(MediaEntry, SaveAction)> {
    let prepared = prepare_entry(store, metadata, model, input, language, today).await?;
    let action = save_entry(store, &prepared.entry).await?;

    tracing::info!(
        title = %prepared.entry.title,
        store = store.name(),
        action = ?action,
        "Entry recorded"
    );

    Ok((prepared.entry, action))
}
