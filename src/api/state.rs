use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    config::{Config, LlmProvider},
    error::{AppError, AppResult},
    models::{Dashboard, MediaEntry, Period, RecommendationChain, StoredEntry},
    services::{
        archive::{self, EntryInput, SaveAction},
        dashboard,
        llm::{ChatCompletionsModel, GeminiModel, LanguageModel},
        metadata::{MetadataProvider, TmdbProvider, Unconfigured},
        recommendations,
        store::{
            credentials::{ServiceAccountKey, TokenSource},
            EntryStore, GoogleSheetsStore, MemoryStore,
        },
    },
};

/// Drafts older than this are dropped the next time one is created
const DRAFT_TTL_MINUTES: i64 = 60;

/// An enriched entry waiting for the user to confirm or discard it
#[derive(Debug, Clone, Serialize)]
pub struct Draft {
    pub id: Uuid,
    pub entry: MediaEntry,
    pub existing_row: Option<usize>,
    pub created_at: DateTime<Utc>,
}

/// Behaviour knobs that come from configuration
#[derive(Debug, Clone)]
pub struct Settings {
    pub content_language: String,
    pub recommendation_steps: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            content_language: "Korean".to_string(),
            recommendation_steps: 5,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EntryStore>,
    pub metadata: Arc<dyn MetadataProvider>,
    pub model: Arc<dyn LanguageModel>,
    pub settings: Settings,
    pub inner: Arc<RwLock<AppStateInner>>,
}

/// Inner state that can be modified
#[derive(Default)]
pub struct AppStateInner {
    pub drafts: HashMap<Uuid, Draft>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn EntryStore>,
        metadata: Arc<dyn MetadataProvider>,
        model: Arc<dyn LanguageModel>,
        settings: Settings,
    ) -> Self {
        Self {
            store,
            metadata,
            model,
            settings,
            inner: Arc::new(RwLock::new(AppStateInner::default())),
        }
    }

    /// Wires the real collaborators described by `config`
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let store: Arc<dyn EntryStore> = match &config.google_credentials_path {
            Some(path) => {
                let key = ServiceAccountKey::from_file(path)?;
                let tokens = TokenSource::new(http_client.clone(), key)?;
                Arc::new(GoogleSheetsStore::new(
                    http_client.clone(),
                    tokens,
                    config.spreadsheet_id.clone(),
                    config.spreadsheet_name.clone(),
                    config.worksheet.clone(),
                ))
            }
            None => {
                tracing::warn!("No Google credentials configured; entries are kept in memory only");
                Arc::new(MemoryStore::new())
            }
        };

        let metadata: Arc<dyn MetadataProvider> = match &config.tmdb_api_key {
            Some(api_key) if !api_key.trim().is_empty() => Arc::new(TmdbProvider::new(
                http_client.clone(),
                api_key.clone(),
                config.tmdb_api_url.clone(),
                config.tmdb_image_url.clone(),
                config.tmdb_language.clone(),
            )),
            _ => {
                tracing::warn!("No TMDB API key configured; posters and recommendations are disabled");
                Arc::new(Unconfigured)
            }
        };

        if config.llm_api_key.trim().is_empty() {
            return Err(AppError::Config("LLM_API_KEY is empty".to_string()));
        }
        let model: Arc<dyn LanguageModel> = match config.llm_provider {
            LlmProvider::Gemini => Arc::new(GeminiModel::new(
                http_client.clone(),
                config.llm_api_key.clone(),
                config.llm_api_url.clone(),
                config.llm_model.clone(),
            )),
            LlmProvider::Openai => Arc::new(ChatCompletionsModel::new(
                http_client,
                config.llm_api_key.clone(),
                config.llm_api_url.clone(),
                config.llm_model.clone(),
            )),
        };

        tracing::info!(
            store = store.name(),
            metadata = metadata.name(),
            model = %model.name(),
            "Collaborators configured"
        );

        Ok(Self::new(
            store,
            metadata,
            model,
            Settings {
                content_language: config.content_language.clone(),
                recommendation_steps: config.recommendation_steps,
            },
        ))
    }

    /// Local calendar date used for defaults and the "this year" filter
    pub fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    pub async fn stored_entries(&self) -> AppResult<Vec<StoredEntry>> {
        self.store.list_entries().await
    }

    async fn entries(&self) -> AppResult<Vec<MediaEntry>> {
        Ok(self
            .store
            .list_entries()
            .await?
            .into_iter()
            .map(|stored| stored.entry)
            .collect())
    }

    /// Enriches and saves in one step
    pub async fn record(&self, input: &EntryInput) -> AppResult<(MediaEntry, SaveAction)> {
        archive::record_entry(
            self.store.as_ref(),
            self.metadata.as_ref(),
            self.model.as_ref(),
            input,
            &self.settings.content_language,
            Self::today(),
        )
        .await
    }

    /// Enriches an entry and parks it as a draft
    pub async fn preview(&self, input: &EntryInput) -> AppResult<Draft> {
        let prepared = archive::prepare_entry(
            self.store.as_ref(),
            self.metadata.as_ref(),
            self.model.as_ref(),
            input,
            &self.settings.content_language,
            Self::today(),
        )
        .await?;

        let draft = Draft {
            id: Uuid::new_v4(),
            entry: prepared.entry,
            existing_row: prepared.existing_row,
            created_at: Utc::now(),
        };

        let mut inner = self.inner.write().await;
        let cutoff = draft.created_at - Duration::minutes(DRAFT_TTL_MINUTES);
        inner.drafts.retain(|_, d| d.created_at > cutoff);
        inner.drafts.insert(draft.id, draft.clone());

        tracing::info!(draft_id = %draft.id, title = %draft.entry.title, "Draft created");
        Ok(draft)
    }

    pub async fn draft(&self, id: Uuid) -> AppResult<Draft> {
        let inner = self.inner.read().await;
        inner
            .drafts
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Draft {} not found or expired", id)))
    }

    /// Saves a draft. A failed save keeps the draft so it can be retried.
    pub async fn confirm(&self, id: Uuid) -> AppResult<(MediaEntry, SaveAction)> {
        let draft = self
            .inner
            .write()
            .await
            .drafts
            .remove(&id)
            .ok_or_else(|| AppError::NotFound(format!("Draft {} not found or expired", id)))?;

        match archive::save_entry(self.store.as_ref(), &draft.entry).await {
            Ok(action) => {
                tracing::info!(draft_id = %id, action = ?action, "Draft confirmed");
                Ok((draft.entry, action))
            }
            Err(e) => {
                self.inner.write().await.drafts.insert(id, draft);
                Err(e)
            }
        }
    }

    /// Drops a draft; returns whether it existed
    pub async fn discard(&self, id: Uuid) -> bool {
        let removed = self.inner.write().await.drafts.remove(&id).is_some();
        if removed {
            tracing::info!(draft_id = %id, "Draft discarded");
        }
        removed
    }

    pub async fn dashboard(&self, period: Period) -> AppResult<Dashboard> {
        let entries = self.entries().await?;
        Ok(dashboard::build_dashboard(&entries, period, Self::today()))
    }

    pub async fn recommendation_chain(
        &self,
        seed: Option<&str>,
        steps: Option<usize>,
    ) -> AppResult<RecommendationChain> {
        let entries = self.entries().await?;
        let seed = recommendations::pick_seed(&entries, seed);
        recommendations::build_chain(
            self.metadata.as_ref(),
            &entries,
            seed,
            steps.unwrap_or(self.settings.recommendation_steps),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::llm::MockLanguageModel;

    fn test_state() -> AppState {
        let mut model = MockLanguageModel::new();
        model
            .expect_complete()
            .returning(|_| Ok(r#"{"platform": "Cinema", "rating": 4}"#.to_string()));
        model.expect_name().return_const("mock".to_string());

        AppState::new(
            Arc::new(MemoryStore::new()),
            Arc::new(Unconfigured),
            Arc::new(model),
            Settings::default(),
        )
    }

    fn draft_aged(title: &str, minutes: i64) -> Draft {
        Draft {
            id: Uuid::new_v4(),
            entry: MediaEntry::new(title, "c"),
            existing_row: None,
            created_at: Utc::now() - Duration::minutes(minutes),
        }
    }

    #[tokio::test]
    async fn test_preview_drops_expired_drafts() {
        let state = test_state();
        let stale = draft_aged("Old", DRAFT_TTL_MINUTES + 1);
        let recent = draft_aged("Recent", 5);
        {
            let mut inner = state.inner.write().await;
            inner.drafts.insert(stale.id, stale.clone());
            inner.drafts.insert(recent.id, recent.clone());
        }

        let fresh = state
            .preview(&EntryInput {
                title: "Dune".to_string(),
                comment: "sand".to_string(),
                watched_on: None,
            })
            .await
            .unwrap();

        assert!(matches!(
            state.draft(stale.id).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(state.draft(recent.id).await.unwrap().entry.title, "Recent");
        assert_eq!(state.draft(fresh.id).await.unwrap().entry.title, "Dune");
        assert_eq!(state.inner.read().await.drafts.len(), 2);
    }

    #[tokio::test]
    async fn test_discard_is_single_use() {
        let state = test_state();
        let draft = draft_aged("Dune", 0);
        state.inner.write().await.drafts.insert(draft.id, draft.clone());

        assert!(state.discard(draft.id).await);
        assert!(!state.discard(draft.id).await);
    }
}
