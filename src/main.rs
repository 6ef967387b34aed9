//! CRC News Pipeline: binary entrypoint
//! Boots the Axum HTTP server, wiring the pipeline, optional store, scheduler and metrics.

use std::sync::Arc;
use std::time::Duration;

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crc_news_pipeline::ai_bootstrap::enhancer_from_path;
use crc_news_pipeline::api::{self, AppState};
use crc_news_pipeline::config::{ai::DEFAULT_AI_CONFIG_PATH, AppConfig};
use crc_news_pipeline::ingest::scheduler::spawn_daily_fetch_and_store;
use crc_news_pipeline::ingest::NewsPipeline;
use crc_news_pipeline::metrics::Metrics;
use crc_news_pipeline::store::{ArticleStore, MemoryStore, SupabaseStore};

/// Compact logs by default, JSON with LOG_FORMAT=json.
/// The runtime may already have installed a subscriber; that one wins.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("crc_news_pipeline=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::load_default()?;
    let enhancer = enhancer_from_path(DEFAULT_AI_CONFIG_PATH);
    let pipeline = Arc::new(NewsPipeline::from_config(&cfg)?.with_enhancer(enhancer));

    let store: Arc<dyn ArticleStore> = match SupabaseStore::from_env(&cfg.store)? {
        Some(s) => {
            tracing::info!(table = %cfg.store.table, "using Supabase article store");
            Arc::new(s)
        }
        None => {
            tracing::warn!(
                url_env = %cfg.store.url_env,
                "Supabase not configured; articles are kept in memory only"
            );
            Arc::new(MemoryStore::new())
        }
    };

    if cfg.scheduler.enabled {
        spawn_daily_fetch_and_store(
            pipeline.clone(),
            store.clone(),
            cfg.profiles.batch,
            Duration::from_secs(cfg.scheduler.interval_secs),
        );
    }

    let state = AppState {
        pipeline,
        profiles: cfg.profiles.clone(),
        store: Some(store),
    };
    let mut router = api::router(state);

    match Metrics::init() {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => tracing::warn!(error = ?e, "metrics recorder not installed"),
    }

    tracing::info!(sources = cfg.sources.len(), "crc news pipeline ready");
    Ok(router.into())
}
