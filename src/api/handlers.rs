use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{CheckResult, Dashboard, DedupReport, MediaEntry, Period, RecommendationChain},
    services::{
        archive::{EntryInput, SaveAction},
        diagnostics, maintenance,
    },
};

use super::{AppState, Draft};

// Request/Response types

#[derive(Debug, Serialize)]
pub struct EntryResponse {
    pub row: Option<usize>,
    #[serde(flatten)]
    pub entry: MediaEntry,
    pub stars: String,
}

impl EntryResponse {
    fn new(row: Option<usize>, entry: MediaEntry) -> Self {
        let stars = entry.rating.map(|r| r.stars()).unwrap_or_default();
        Self { row, entry, stars }
    }
}

#[derive(Debug, Serialize)]
pub struct SavedResponse {
    /// "appended" or "updated"
    pub action: &'static str,
    pub entry: EntryResponse,
}

impl SavedResponse {
    fn new(entry: MediaEntry, action: SaveAction) -> Self {
        match action {
            SaveAction::Appended => Self {
                action: "appended",
                entry: EntryResponse::new(None, entry),
            },
            SaveAction::Updated { row } => Self {
                action: "updated",
                entry: EntryResponse::new(Some(row), entry),
            },
        }
    }

    fn status(&self) -> StatusCode {
        if self.action == "appended" {
            StatusCode::CREATED
        } else {
            StatusCode::OK
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DraftResponse {
    pub id: Uuid,
    pub existing_row: Option<usize>,
    pub created_at: DateTime<Utc>,
    pub entry: EntryResponse,
}

impl From<Draft> for DraftResponse {
    fn from(draft: Draft) -> Self {
        Self {
            id: draft.id,
            existing_row: draft.existing_row,
            created_at: draft.created_at,
            entry: EntryResponse::new(None, draft.entry),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub period: Period,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationsQuery {
    pub seed: Option<String>,
    pub steps: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct DiagnosticsResponse {
    pub ok: bool,
    pub checks: Vec<CheckResult>,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// All logged entries with their sheet rows
pub async fn list_entries(State(state): State<AppState>) -> AppResult<Json<Vec<EntryResponse>>> {
    let entries = state.stored_entries().await?;
    Ok(Json(
        entries
            .into_iter()
            .map(|stored| EntryResponse::new(Some(stored.row), stored.entry))
            .collect(),
    ))
}

/// Enrich and save in one call
pub async fn create_entry(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(input): Json<EntryInput>,
) -> AppResult<(StatusCode, Json<SavedResponse>)> {
    tracing::info!(request_id = %request_id, title = %input.title, "Recording entry");

    let (entry, action) = state.record(&input).await?;
    let response = SavedResponse::new(entry, action);
    Ok((response.status(), Json(response)))
}

/// Enrich without saving; returns a draft to confirm later
pub async fn preview_entry(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(input): Json<EntryInput>,
) -> AppResult<(StatusCode, Json<DraftResponse>)> {
    tracing::info!(request_id = %request_id, title = %input.title, "Previewing entry");

    let draft = state.preview(&input).await?;
    Ok((StatusCode::CREATED, Json(DraftResponse::from(draft))))
}

/// A pending draft, while it has not expired
pub async fn get_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DraftResponse>> {
    Ok(Json(DraftResponse::from(state.draft(id).await?)))
}

pub async fn confirm_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<SavedResponse>)> {
    let (entry, action) = state.confirm(id).await?;
    let response = SavedResponse::new(entry, action);
    Ok((response.status(), Json(response)))
}

pub async fn discard_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if state.discard(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Draft {} not found or expired", id)))
    }
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> AppResult<Json<Dashboard>> {
    Ok(Json(state.dashboard(query.period).await?))
}

pub async fn get_recommendations(
    State(state): State<AppState>,
    Query(query): Query<RecommendationsQuery>,
) -> AppResult<Json<RecommendationChain>> {
    let chain = state
        .recommendation_chain(query.seed.as_deref(), query.steps)
        .await?;
    Ok(Json(chain))
}

/// Removes repeated titles from the sheet, keeping the first row of each
pub async fn dedup(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<DedupReport>> {
    tracing::info!(request_id = %request_id, "Removing duplicate entries");
    Ok(Json(maintenance::remove_duplicates(state.store.as_ref()).await?))
}

/// Connectivity check against every collaborator
pub async fn diagnostics(State(state): State<AppState>) -> Json<DiagnosticsResponse> {
    let checks = diagnostics::run_checks(
        state.store.as_ref(),
        state.metadata.as_ref(),
        state.model.as_ref(),
    )
    .await;

    Json(DiagnosticsResponse {
        ok: checks.iter().all(|c| c.ok),
        checks,
    })
}
