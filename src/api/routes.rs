use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{handlers, pages, AppState};
use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

/// Creates the main router: HTML pages, the JSON API and shared layers
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Pages
        .route("/", get(pages::index))
        .route("/record", post(pages::record))
        .route("/drafts/:id/confirm", post(pages::confirm))
        .route("/drafts/:id/discard", post(pages::discard))
        .route("/dashboard", get(pages::dashboard))
        .route("/recommendations", get(pages::recommendations))
        .nest("/api/v1", api_routes())
        // Outermost first; tracing runs after the request id is attached
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(axum::middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        // Entries
        .route("/entries", get(handlers::list_entries))
        .route("/entries", post(handlers::create_entry))
        .route("/entries/preview", post(handlers::preview_entry))
        // Drafts
        .route("/drafts/:id/confirm", post(handlers::confirm_draft))
        .route(
            "/drafts/:id",
            get(handlers::get_draft).delete(handlers::discard_draft),
        )
        // Views
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/recommendations", get(handlers::get_recommendations))
        // Operations
        .route("/maintenance/dedup", post(handlers::dedup))
        .route("/diagnostics", get(handlers::diagnostics))
}
