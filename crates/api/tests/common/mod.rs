//! Shared fixtures for API integration tests.
//!
//! Mirrors the router construction in `main.rs` so tests exercise the same
//! middleware stack (CORS, request ID, deadline, tracing, panic recovery)
//! that production uses.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use chrono::{Duration, Utc};
use tessera_api::config::ServerConfig;
use tessera_api::router::build_app_router;
use tessera_api::state::AppState;
use tessera_db::models::event::CreateEvent;
use tessera_db::models::event_guest::CreateEventGuest;
use tessera_db::repositories::{EventGuestRepo, EventRepo, TicketRepo};

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_deadline_ms: 2_000,
        db_statement_timeout_ms: 500,
        rate_limit_capacity: 5,
        rate_limit_refill_per_sec: 1.0,
        min_scan_interval_ms: 30_000,
        batch_max_items: 50,
        qr_supported_versions: vec!["v1".to_string()],
    }
}

/// Build the full application router with the default test configuration.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, test_config())
}

/// Build the full application router with a custom configuration.
pub fn build_test_app_with(pool: PgPool, config: ServerConfig) -> Router {
    let state = AppState::new(pool, config.clone());
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            builder.body(Body::from(json.to_string())).unwrap()
        }
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    read_json(response).await
}

async fn read_json(response: Response) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

pub async fn post_json(
    app: &Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn patch_json(
    app: &Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, Method::PATCH, uri, Some(body)).await
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, Method::GET, uri, None).await
}

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

/// Options for seeding an event. `Default` gives an active event running
/// from one hour ago to one hour from now with plenty of capacity.
pub struct EventSeed {
    pub publish: bool,
    pub starts_at: chrono::DateTime<Utc>,
    pub ends_at: chrono::DateTime<Utc>,
    pub max_attendees: Option<i32>,
    pub allowed_scan_zones: Option<Vec<String>>,
}

impl Default for EventSeed {
    fn default() -> Self {
        Self {
            publish: true,
            starts_at: Utc::now() - Duration::hours(1),
            ends_at: Utc::now() + Duration::hours(1),
            max_attendees: Some(100),
            allowed_scan_zones: None,
        }
    }
}

/// Create an event per the seed options, returning its ID.
pub async fn seed_event(pool: &PgPool, seed: EventSeed) -> i64 {
    let event = EventRepo::create(
        pool,
        &CreateEvent {
            title: "Test Event".to_string(),
            starts_at: seed.starts_at,
            ends_at: seed.ends_at,
            max_attendees: seed.max_attendees,
            allowed_scan_zones: seed.allowed_scan_zones,
            window_start_minute: None,
            window_end_minute: None,
        },
    )
    .await
    .unwrap();
    if seed.publish {
        EventRepo::publish(pool, event.id).await.unwrap();
    }
    event.id
}

/// Create a guest plus an active ticket on the event. Returns
/// `(guest_id, ticket_id)`.
pub async fn seed_ticket(pool: &PgPool, event_id: i64, code: &str, max_scans: i32) -> (i64, i64) {
    let guest = EventGuestRepo::create(
        pool,
        event_id,
        &CreateEventGuest {
            guest_name: format!("Guest {code}"),
            invitation_code: format!("inv-{code}"),
        },
    )
    .await
    .unwrap();
    let ticket = TicketRepo::issue(pool, guest.id, code, None, max_scans)
        .await
        .unwrap();
    (guest.id, ticket.id)
}

/// Standard validate-ticket request body.
pub fn validate_body(ticket_id: i64, event_id: i64, device: &str, location: &str) -> serde_json::Value {
    serde_json::json!({
        "ticket_id": ticket_id,
        "event_id": event_id,
        "scan_context": {
            "location": location,
            "device_id": device,
            "timestamp": Utc::now().to_rfc3339(),
        }
    })
}
