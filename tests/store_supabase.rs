// tests/store_supabase.rs
//
// SupabaseStore against a minimal fake PostgREST on 127.0.0.1:0.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use crc_news_pipeline::article::{article_id, Article, ContentKind};
use crc_news_pipeline::store::{ArticleStore, InsertOutcome, StoreError, SupabaseStore};

const KEY: &str = "service-role-test";

#[derive(Clone, Default)]
struct Db {
    rows: Arc<Mutex<Vec<Value>>>,
}

fn authorized(h: &HeaderMap) -> bool {
    let apikey = h.get("apikey").and_then(|v| v.to_str().ok());
    let bearer = h.get("authorization").and_then(|v| v.to_str().ok());
    apikey == Some(KEY) && bearer == Some("Bearer service-role-test")
}

async fn select(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "no key"}))).into_response();
    }
    let link = q
        .get("link")
        .and_then(|v| v.strip_prefix("eq."))
        .unwrap_or_default()
        .to_string();
    let rows = db.rows.lock().unwrap();
    let hits: Vec<Value> = rows
        .iter()
        .filter(|r| r["link"] == link.as_str())
        .map(|_| json!({"id": 1}))
        .collect();
    Json(hits).into_response()
}

async fn insert(State(db): State<Db>, headers: HeaderMap, Json(row): Json<Value>) -> StatusCode {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED;
    }
    let mut rows = db.rows.lock().unwrap();
    if rows.iter().any(|r| r["link"] == row["link"]) {
        return StatusCode::CONFLICT;
    }
    rows.push(row);
    StatusCode::CREATED
}

async fn spawn_postgrest(db: Db) -> String {
    let app = Router::new()
        .route("/rest/v1/crc_news", get(select).post(insert))
        .route(
            "/rest/v1/broken",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "db down") }),
        )
        .with_state(db);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}/")
}

fn sample(link: &str) -> Article {
    let title = "Colonoscopy access expands in rural counties";
    let summary = "Mobile units reached new patients.";
    let mut a = Article {
        id: article_id(title, summary),
        title: title.into(),
        link: link.into(),
        source_label: "Medical Xpress".into(),
        published_at: None,
        summary: summary.into(),
        relevance_score: 0,
        is_sticky: false,
        sticky_priority: 0,
        kind: ContentKind::News,
        is_fallback: false,
    };
    a.set_score(6);
    a
}

#[tokio::test]
async fn insert_if_absent_is_idempotent() {
    let db = Db::default();
    let base = spawn_postgrest(db.clone()).await;
    let store = SupabaseStore::new(base, KEY, "crc_news", Duration::from_secs(2)).unwrap();

    let a = sample("https://mx.test/rural");
    assert!(!store.exists_by_link(&a.link).await.unwrap());
    assert_eq!(store.insert_if_absent(&a).await.unwrap(), InsertOutcome::Inserted);
    assert!(store.exists_by_link(&a.link).await.unwrap());
    assert_eq!(
        store.insert_if_absent(&a).await.unwrap(),
        InsertOutcome::AlreadyPresent
    );

    let rows = db.rows.lock().unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row["source"], "Medical Xpress");
    assert_eq!(row["content_type"], "news");
    assert_eq!(row["relevance_score"], 6);
    assert_eq!(row["sticky_priority"], 999);
    assert_eq!(row["article_hash"], a.id.as_str());
    assert!(row["published_at"].is_null());
}

#[tokio::test]
async fn unique_conflict_on_insert_is_already_present() {
    let db = Db::default();
    let base = spawn_postgrest(db.clone()).await;
    let store = SupabaseStore::new(base, KEY, "crc_news", Duration::from_secs(2)).unwrap();

    let a = sample("https://mx.test/race");
    assert_eq!(store.insert(&a).await.unwrap(), InsertOutcome::Inserted);
    assert_eq!(store.insert(&a).await.unwrap(), InsertOutcome::AlreadyPresent);
}

#[tokio::test]
async fn wrong_key_and_server_errors_surface_as_status() {
    let base = spawn_postgrest(Db::default()).await;

    let bad =
        SupabaseStore::new(base.clone(), "wrong", "crc_news", Duration::from_secs(2)).unwrap();
    let err = bad.exists_by_link("https://mx.test/x").await.unwrap_err();
    assert!(matches!(err, StoreError::Status { status: 401, .. }), "got {err:?}");

    let broken = SupabaseStore::new(base, KEY, "broken", Duration::from_secs(2)).unwrap();
    match broken.exists_by_link("https://mx.test/x").await.unwrap_err() {
        StoreError::Status { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "db down");
        }
        other => panic!("unexpected {other:?}"),
    }
}
