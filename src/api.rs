use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::config::ProfilesConfig;
use crate::ingest::{NewsPipeline, PipelineReport};
use crate::store::ArticleStore;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<NewsPipeline>,
    pub profiles: ProfilesConfig,
    /// `None` when no persistence backend is configured.
    pub store: Option<Arc<dyn ArticleStore>>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/articles", get(articles))
        .route("/admin/fetch-and-store", post(fetch_and_store))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Deserialize)]
struct ArticlesQuery {
    #[serde(default)]
    profile: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

async fn articles(
    State(state): State<AppState>,
    Query(q): Query<ArticlesQuery>,
) -> Result<Json<PipelineReport>, (StatusCode, String)> {
    let name = q.profile.as_deref().unwrap_or("feed");
    let mut profile = state
        .profiles
        .get(name)
        .ok_or_else(|| (StatusCode::BAD_REQUEST, format!("unknown profile: {name}")))?;
    if let Some(limit) = q.limit {
        profile = profile.with_limit(limit);
    }

    Ok(Json(state.pipeline.fetch_fresh(&profile).await))
}

async fn fetch_and_store(State(state): State<AppState>) -> Response {
    let Some(store) = state.store.clone() else {
        return (StatusCode::SERVICE_UNAVAILABLE, "no article store configured").into_response();
    };
    let summary = state
        .pipeline
        .fetch_and_store(store.as_ref(), &state.profiles.batch)
        .await;
    Json(summary).into_response()
}
