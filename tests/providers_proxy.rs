// tests/providers_proxy.rs
//
// RssProxyFetcher against a local fake proxy (127.0.0.1:0), no external network.

use std::collections::HashMap;
use std::time::Duration;

use axum::{extract::Query, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;

use crc_news_pipeline::article::ContentKind;
use crc_news_pipeline::ingest::error::SourceError;
use crc_news_pipeline::ingest::providers::RssProxyFetcher;
use crc_news_pipeline::ingest::types::{FeedFetcher, FeedSource};

async fn fake_proxy(Query(q): Query<HashMap<String, String>>) -> impl IntoResponse {
    let feed = q.get("rss_url").cloned().unwrap_or_default();
    match feed.as_str() {
        "https://ok.test/rss" => Json(json!({
            "status": "ok",
            "feed": { "title": "OK feed" },
            "items": [
                {
                    "title": "Colonoscopy &amp; you",
                    "link": "https://ok.test/a",
                    "pubDate": "2026-03-01 09:30:00",
                    "description": "<p>Screening basics</p>",
                    "count_seen": q.get("count").cloned()
                },
                { "title": "missing link" }
            ]
        }))
        .into_response(),
        "https://broken.test/rss" => Json(json!({
            "status": "error",
            "message": "Cannot download this RSS feed, make sure the Rss URL is correct."
        }))
        .into_response(),
        "https://garbage.test/rss" => "<html>not json</html>".into_response(),
        "https://slow.test/rss" => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(json!({ "status": "ok", "items": [] })).into_response()
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
    }
}

async fn spawn_proxy() -> String {
    let app = Router::new().route("/v1/api.json", get(fake_proxy));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}/v1/api.json")
}

fn src(url: &str) -> FeedSource {
    FeedSource {
        name: "test".into(),
        url: url.into(),
        source_label: "Test".into(),
        kind: ContentKind::News,
    }
}

fn fetcher(base: &str) -> RssProxyFetcher {
    RssProxyFetcher::new(base, 10, Duration::from_millis(800)).expect("client")
}

#[tokio::test]
async fn ok_feed_yields_valid_items_only() {
    let base = spawn_proxy().await;
    let items = fetcher(&base).fetch(&src("https://ok.test/rss")).await.unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].link, "https://ok.test/a");
    assert_eq!(items[0].title, "Colonoscopy &amp; you", "decoding happens in the classifier");
    assert_eq!(items[0].published_at_raw.as_deref(), Some("2026-03-01 09:30:00"));
}

#[tokio::test]
async fn proxy_status_error_maps_to_upstream() {
    let base = spawn_proxy().await;
    let err = fetcher(&base)
        .fetch(&src("https://broken.test/rss"))
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::Upstream(ref m) if m.starts_with("Cannot download")));
}

#[tokio::test]
async fn non_json_body_is_malformed() {
    let base = spawn_proxy().await;
    let err = fetcher(&base)
        .fetch(&src("https://garbage.test/rss"))
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::Malformed(_)), "got {err:?}");
}

#[tokio::test]
async fn server_error_maps_to_http_status() {
    let base = spawn_proxy().await;
    let err = fetcher(&base)
        .fetch(&src("https://unknown.test/rss"))
        .await
        .unwrap_err();
    assert_eq!(err, SourceError::HttpStatus(500));
}

#[tokio::test]
async fn hung_proxy_times_out() {
    let base = spawn_proxy().await;
    let err = fetcher(&base)
        .fetch(&src("https://slow.test/rss"))
        .await
        .unwrap_err();
    assert_eq!(err, SourceError::Timeout);
}

#[tokio::test]
async fn unreachable_proxy_is_a_network_error() {
    // Bind then drop to get a port with nothing listening.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = fetcher(&format!("http://{addr}/v1/api.json"))
        .fetch(&src("https://ok.test/rss"))
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::Network(_)), "got {err:?}");
}
