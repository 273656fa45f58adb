//! HTML handlers. They call the same state methods as the JSON API and
//! render the result with [`views`].

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use chrono::Datelike;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{entry::parse_date, Period},
    services::archive::EntryInput,
};

use super::{views, AppState};

/// Renders an [`AppError`] as an HTML page with the matching status
pub struct PageError(AppError);

impl From<AppError> for PageError {
    fn from(error: AppError) -> Self {
        Self(error)
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = self.0.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Page request failed");
        }
        match views::error_page(&self.0.message()) {
            Ok(page) => (status, Html(page)).into_response(),
            // the page itself failed to render; fall back to the JSON body
            Err(e) => {
                tracing::error!(error = %e, "Error page failed to render");
                self.0.into_response()
            }
        }
    }
}

type PageResult = Result<Response, PageError>;

#[derive(Debug, Deserialize)]
pub struct RecordForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub watched_on: String,
}

impl RecordForm {
    fn values(&self) -> views::FormValues {
        views::FormValues {
            title: self.title.clone(),
            comment: self.comment.clone(),
            watched_on: self.watched_on.clone(),
        }
    }

    fn to_input(&self) -> Result<EntryInput, AppError> {
        let watched_on = match self.watched_on.trim() {
            "" => None,
            raw => Some(parse_date(raw).ok_or_else(|| {
                AppError::InvalidInput(format!("Could not read the date '{}'", raw))
            })?),
        };
        Ok(EntryInput {
            title: self.title.clone(),
            comment: self.comment.clone(),
            watched_on,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct DashboardParams {
    #[serde(default)]
    pub period: Period,
}

/// Steps arrive as text so an empty field does not fail the request
#[derive(Debug, Deserialize)]
pub struct ChainParams {
    pub seed: Option<String>,
    pub steps: Option<String>,
}

pub async fn index() -> PageResult {
    let page = views::index_page(&views::FormValues::default(), None)?;
    Ok(Html(page).into_response())
}

/// Analyzes the form and shows the draft for confirmation
pub async fn record(State(state): State<AppState>, Form(form): Form<RecordForm>) -> PageResult {
    let input = match form.to_input() {
        Ok(input) => input,
        Err(e) => return form_error(&form, e),
    };

    match state.preview(&input).await {
        Ok(draft) => Ok(Html(views::preview_page(&draft)?).into_response()),
        Err(e @ AppError::InvalidInput(_)) => form_error(&form, e),
        Err(e) => Err(e.into()),
    }
}

/// Re-renders the form with the user's input and the error above it
fn form_error(form: &RecordForm, error: AppError) -> PageResult {
    let page = views::index_page(&form.values(), Some(&error.message()))?;
    Ok((error.status(), Html(page)).into_response())
}

pub async fn confirm(State(state): State<AppState>, Path(id): Path<Uuid>) -> PageResult {
    let (entry, action) = state.confirm(id).await?;
    Ok(Html(views::saved_page(&entry, action)?).into_response())
}

pub async fn discard(State(state): State<AppState>, Path(id): Path<Uuid>) -> Redirect {
    state.discard(id).await;
    Redirect::to("/")
}

pub async fn dashboard(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> PageResult {
    let dashboard = state.dashboard(params.period).await?;
    let year = AppState::today().year();
    Ok(Html(views::dashboard_page(&dashboard, year)?).into_response())
}

pub async fn recommendations(
    State(state): State<AppState>,
    Query(params): Query<ChainParams>,
) -> PageResult {
    let steps = params
        .steps
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|_| AppError::InvalidInput(format!("Steps must be a number, got '{}'", s)))
        })
        .transpose()?;

    let chain = state
        .recommendation_chain(params.seed.as_deref(), steps)
        .await?;
    Ok((StatusCode::OK, Html(views::chain_page(&chain)?)).into_response())
}
