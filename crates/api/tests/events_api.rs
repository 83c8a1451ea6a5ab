//! End-to-end tests for event provisioning, ticket issuance, the event
//! scannability probe, and the health endpoints.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use tessera_core::qr;
use tessera_db::repositories::TicketRepo;

use common::{build_test_app, get_json, post_json, seed_event, EventSeed};

fn event_body(starts_in_hours: i64, ends_in_hours: i64) -> serde_json::Value {
    serde_json::json!({
        "title": "Gala Night",
        "starts_at": (Utc::now() + Duration::hours(starts_in_hours)).to_rfc3339(),
        "ends_at": (Utc::now() + Duration::hours(ends_in_hours)).to_rfc3339(),
        "max_attendees": 10,
    })
}

#[sqlx::test(migrations = "../db/migrations")]
async fn provisioning_flow_issues_a_scannable_ticket(pool: PgPool) {
    let app = build_test_app(pool.clone());

    // Create draft event.
    let (status, json) = post_json(&app, "/internal/events", event_body(-1, 2)).await;
    assert_eq!(status, StatusCode::OK);
    let event_id = json["data"]["id"].as_i64().unwrap();
    assert_eq!(json["data"]["status_id"], 1);

    // Publish it.
    let (status, json) = post_json(&app, &format!("/internal/events/{event_id}/publish"), serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status_id"], 2);

    // Register a guest.
    let (status, json) = post_json(
        &app,
        &format!("/internal/events/{event_id}/guests"),
        serde_json::json!({ "guest_name": "Ada", "invitation_code": "INV-1" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let guest_id = json["data"]["id"].as_i64().unwrap();

    // Issue a ticket.
    let (status, json) = post_json(
        &app,
        &format!("/internal/guests/{guest_id}/tickets"),
        serde_json::json!({ "max_scans": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let ticket_id = json["data"]["id"].as_i64().unwrap();
    let ticket_code = json["data"]["ticket_code"].as_str().unwrap().to_string();
    assert!(ticket_code.starts_with("TKT-"));

    // The stored QR payload decodes to the ticket's identity.
    let ticket = TicketRepo::find_by_id(&pool, ticket_id).await.unwrap().unwrap();
    let payload = qr::decode(ticket.qr_payload.as_deref().unwrap()).unwrap();
    assert_eq!(payload.ticket_id, ticket_id);
    assert_eq!(payload.event_id, event_id);
    assert_eq!(payload.version, "v1");

    // And the ticket admits end to end.
    let (status, json) = post_json(
        &app,
        "/internal/validation/validate-ticket-by-code",
        serde_json::json!({
            "ticket_code": ticket_code,
            "scan_context": { "location": "gate-A", "device_id": "D1" }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["admitted"], true);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn draft_event_rejects_scans_until_published(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let event_id = seed_event(
        &pool,
        EventSeed {
            publish: false,
            ..Default::default()
        },
    )
    .await;
    let (_, ticket_id) = common::seed_ticket(&pool, event_id, "T-D1", 1).await;

    let (status, json) = post_json(
        &app,
        "/internal/validation/validate-ticket",
        common::validate_body(ticket_id, event_id, "D1", "gate-A"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "EVENT_NOT_ACTIVE");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn publish_twice_is_a_conflict(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, json) = post_json(&app, "/internal/events", event_body(-1, 2)).await;
    let event_id = json["data"]["id"].as_i64().unwrap();

    let (status, _) =
        post_json(&app, &format!("/internal/events/{event_id}/publish"), serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let (status, json) =
        post_json(&app, &format!("/internal/events/{event_id}/publish"), serde_json::json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn invalid_event_bodies_are_rejected(pool: PgPool) {
    let app = build_test_app(pool.clone());

    // Ends before it starts.
    let (status, _) = post_json(&app, "/internal/events", event_body(2, 1)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Empty title.
    let (status, _) = post_json(
        &app,
        "/internal/events",
        serde_json::json!({
            "title": "  ",
            "starts_at": Utc::now().to_rfc3339(),
            "ends_at": (Utc::now() + Duration::hours(1)).to_rfc3339(),
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn duplicate_invitation_code_is_a_conflict(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let event_id = seed_event(&pool, EventSeed::default()).await;

    let body = serde_json::json!({ "guest_name": "Ada", "invitation_code": "INV-DUP" });
    let (status, _) = post_json(&app, &format!("/internal/events/{event_id}/guests"), body.clone()).await;
    assert_eq!(status, StatusCode::OK);
    let (status, json) = post_json(&app, &format!("/internal/events/{event_id}/guests"), body).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
}

// ---------------------------------------------------------------------------
// Scannability probe
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn probe_answers_scannable_for_a_live_event(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let event_id = seed_event(&pool, EventSeed::default()).await;

    let (status, json) = get_json(&app, &format!("/internal/events/{event_id}/validate")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["scannable"], true);
    assert!(json["data"].get("code").is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn probe_reports_not_started(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let event_id = seed_event(
        &pool,
        EventSeed {
            starts_at: Utc::now() + Duration::hours(1),
            ends_at: Utc::now() + Duration::hours(3),
            ..Default::default()
        },
    )
    .await;

    let (_, json) = get_json(&app, &format!("/internal/events/{event_id}/validate")).await;
    assert_eq!(json["data"]["scannable"], false);
    assert_eq!(json["data"]["code"], "EVENT_NOT_STARTED");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn probe_reports_draft_as_not_active(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let event_id = seed_event(
        &pool,
        EventSeed {
            publish: false,
            ..Default::default()
        },
    )
    .await;

    let (_, json) = get_json(&app, &format!("/internal/events/{event_id}/validate")).await;
    assert_eq!(json["data"]["scannable"], false);
    assert_eq!(json["data"]["code"], "EVENT_NOT_ACTIVE");
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn health_endpoints_answer_ok(pool: PgPool) {
    let app = build_test_app(pool.clone());

    for uri in [
        "/health",
        "/internal/validation/health",
        "/internal/events/health",
        "/internal/tickets/health",
    ] {
        let (status, json) = get_json(&app, uri).await;
        assert_eq!(status, StatusCode::OK, "health at {uri}");
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["status"], "ok");
    }
}
