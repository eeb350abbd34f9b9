//! End-to-end checks of the signup flow with lead forwarding switched on.
//!
//! A throwaway axum server on 127.0.0.1 stands in for the Conversions API and
//! records every batch it receives.

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{Request, StatusCode, Uri},
    routing::post,
};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tower::ServiceExt;

use waitlist_gateway::analytics::{AnalyticsConfig, AnalyticsForwarder, hash_email};
use waitlist_gateway::rate_limit::{DEFAULT_RATE_LIMIT, DEFAULT_RATE_WINDOW, InMemoryRateLimiter};
use waitlist_gateway::store::MemoryStore;
use waitlist_gateway::{AppState, create_router};

#[derive(Clone)]
struct Collector {
    received: Arc<Mutex<Vec<(String, Value)>>>,
    status: StatusCode,
}

impl Collector {
    fn received(&self) -> Vec<(String, Value)> {
        self.received.lock().unwrap().clone()
    }
}

async fn collect(State(collector): State<Collector>, uri: Uri, Json(body): Json<Value>) -> StatusCode {
    collector.received.lock().unwrap().push((uri.to_string(), body));
    collector.status
}

async fn spawn_collector(status: StatusCode) -> (String, Collector) {
    let collector = Collector {
        received: Arc::new(Mutex::new(Vec::new())),
        status,
    };
    let app = Router::new()
        .route("/{pixel_id}/events", post(collect))
        .with_state(collector.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), collector)
}

fn gateway(api_base: &str, store: Arc<MemoryStore>) -> Router {
    let config = AnalyticsConfig {
        pixel_id: "px-1".to_string(),
        access_token: "tok".to_string(),
        api_base: api_base.to_string(),
        event_source_url: "https://landing.test".to_string(),
    };
    let state = AppState::new(
        store,
        Arc::new(InMemoryRateLimiter::new(DEFAULT_RATE_LIMIT, DEFAULT_RATE_WINDOW)),
        AnalyticsForwarder::new(reqwest::Client::new(), Some(config)),
    );
    create_router(Arc::new(state))
}

fn signup(body: &str, client: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/waitlist")
        .header("content-type", "application/json")
        .header("user-agent", "Mozilla/5.0 (integration)");
    if let Some(ip) = client {
        builder = builder.header("x-forwarded-for", ip);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn signup_forwards_hashed_lead_event() {
    let (api_base, collector) = spawn_collector(StatusCode::OK).await;
    let store = Arc::new(MemoryStore::new());
    let app = gateway(&api_base, store.clone());

    let response = app
        .oneshot(signup(r#"{"email":" User@Example.com "}"#, Some("203.0.113.9, 10.0.0.1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(store.contains("user@example.com"));

    // the handler waits for delivery, so the batch is already here
    let received = collector.received();
    assert_eq!(received.len(), 1);

    let (uri, batch) = &received[0];
    assert_eq!(uri, "/px-1/events?access_token=tok");

    let event = &batch["data"][0];
    assert_eq!(event["event_name"], "Lead");
    assert_eq!(event["action_source"], "website");
    assert_eq!(event["event_source_url"], "https://landing.test");
    assert!(event["event_id"].as_str().unwrap().starts_with("lead_"));
    assert_eq!(event["user_data"]["em"][0], hash_email("user@example.com"));
    assert_eq!(event["user_data"]["client_ip_address"], "203.0.113.9");
    assert_eq!(event["user_data"]["client_user_agent"], "Mozilla/5.0 (integration)");

    assert!(!batch.to_string().contains("user@example.com"));
}

#[tokio::test]
async fn unknown_client_ip_is_not_forwarded() {
    let (api_base, collector) = spawn_collector(StatusCode::OK).await;
    let app = gateway(&api_base, Arc::new(MemoryStore::new()));

    let response = app
        .oneshot(signup(r#"{"email":"anon@example.com"}"#, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let received = collector.received();
    assert!(received[0].1["data"][0]["user_data"].get("client_ip_address").is_none());
}

#[tokio::test]
async fn rejected_submissions_send_nothing() {
    let (api_base, collector) = spawn_collector(StatusCode::OK).await;
    let app = gateway(&api_base, Arc::new(MemoryStore::new()));

    let first = app
        .clone()
        .oneshot(signup(r#"{"email":"once@example.com"}"#, Some("198.51.100.1")))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let duplicate = app
        .clone()
        .oneshot(signup(r#"{"email":"ONCE@example.com"}"#, Some("198.51.100.1")))
        .await
        .unwrap();
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let honeypot = app
        .clone()
        .oneshot(signup(
            r#"{"email":"bot@example.com","honeypot":"filled"}"#,
            Some("198.51.100.1"),
        ))
        .await
        .unwrap();
    assert_eq!(honeypot.status(), StatusCode::CREATED);

    let invalid = app
        .oneshot(signup(r#"{"email":"nope"}"#, Some("198.51.100.1")))
        .await
        .unwrap();
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

    assert_eq!(collector.received().len(), 1);
}

#[tokio::test]
async fn collector_error_does_not_change_response() {
    let (api_base, collector) = spawn_collector(StatusCode::BAD_REQUEST).await;
    let store = Arc::new(MemoryStore::new());
    let app = gateway(&api_base, store.clone());

    let response = app
        .oneshot(signup(r#"{"email":"still@example.com"}"#, Some("198.51.100.2")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(store.contains("still@example.com"));
    assert_eq!(collector.received().len(), 1);
}

#[tokio::test]
async fn unreachable_collector_does_not_change_response() {
    // nothing listens on port 1
    let store = Arc::new(MemoryStore::new());
    let app = gateway("http://127.0.0.1:1", store.clone());

    let response = app
        .oneshot(signup(r#"{"email":"offline@example.com"}"#, Some("198.51.100.3")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(store.contains("offline@example.com"));
}
