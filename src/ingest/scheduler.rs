// src/ingest/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::task::JoinHandle;

use crate::dedup::RankProfile;
use crate::ingest::NewsPipeline;
use crate::store::ArticleStore;

/// Spawn the periodic fetch-and-store job. The first run happens immediately,
/// then once per `interval`. A bad run is logged; the loop keeps going.
pub fn spawn_daily_fetch_and_store(
    pipeline: Arc<NewsPipeline>,
    store: Arc<dyn ArticleStore>,
    profile: RankProfile,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval.max(Duration::from_secs(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            counter!("news_scheduler_runs_total").increment(1);

            let summary = pipeline.fetch_and_store(store.as_ref(), &profile).await;
            let all_sources_down = !pipeline.sources().is_empty()
                && summary.source_errors.len() == pipeline.sources().len();

            if all_sources_down {
                tracing::warn!(
                    target: "ingest",
                    source_errors = summary.source_errors.len(),
                    "scheduled run: every source failed"
                );
            } else {
                tracing::info!(
                    target: "ingest",
                    inserted = summary.inserted,
                    already_present = summary.already_present,
                    failed = summary.failed,
                    store = store.name(),
                    "scheduled run finished"
                );
            }
        }
    })
}
