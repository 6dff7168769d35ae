use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use salonbook::clock::FixedClock;
use salonbook::config::AppConfig;
use salonbook::db;
use salonbook::routes;
use salonbook::state::AppState;

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
    }
}

/// State with the clock pinned to 2025-06-01 12:00 UTC so past-date guards
/// behave the same on every run.
fn test_state() -> Arc<AppState> {
    let conn = db::init_db(":memory:").unwrap();
    Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: test_config(),
        clock: Box::new(FixedClock(
            chrono::NaiveDate::from_ymd_opt(2025, 6, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        )),
    })
}

async fn send(
    state: &Arc<AppState>,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let app = routes::router(state.clone());

    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let res = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Seed one customer, two staff members, and a 60-minute 150.00 service.
async fn seed(state: &Arc<AppState>) {
    let (status, _) = send(
        state,
        "POST",
        "/api/customers",
        Some(serde_json::json!({"first_name": "Alice", "last_name": "Moreno"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    for name in ["Bea", "Carla"] {
        let (status, _) = send(
            state,
            "POST",
            "/api/staff",
            Some(serde_json::json!({"first_name": name, "last_name": "Stylist", "role": "stylist"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, _) = send(
        state,
        "POST",
        "/api/services",
        Some(serde_json::json!({
            "name": "Haircut",
            "duration_minutes": 60,
            "base_price": "150.00"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

fn booking_body(staff_id: i64, date: &str, start: &str) -> serde_json::Value {
    serde_json::json!({
        "customer_id": 1,
        "staff_id": staff_id,
        "service_id": 1,
        "booking_date": date,
        "start_time": start
    })
}

// ── Health ──

#[tokio::test]
async fn test_health() {
    let state = test_state();
    let (status, json) = send(&state, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

// ── Booking lifecycle ──

#[tokio::test]
async fn test_booking_full_lifecycle() {
    let state = test_state();
    seed(&state).await;

    // Create: 60-minute service at 150.00, 2025-06-10 09:00.
    let (status, json) = send(
        &state,
        "POST",
        "/api/bookings",
        Some(booking_body(1, "2025-06-10", "09:00")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "pending");
    assert_eq!(json["end_time"], "10:00");
    assert_eq!(json["total_price"], "150.00");
    let id = json["id"].as_i64().unwrap();

    // Confirm.
    let (status, json) = send(
        &state,
        "POST",
        &format!("/api/bookings/{id}/confirm"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "confirmed");

    // Same staff, 09:30 overlaps [09:00, 10:00) — rejected.
    let (status, json) = send(
        &state,
        "POST",
        "/api/bookings",
        Some(booking_body(1, "2025-06-10", "09:30")),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        json["error"],
        "Staff member is already booked for this time slot"
    );

    // Complete.
    let (status, json) = send(
        &state,
        "POST",
        &format!("/api/bookings/{id}/complete"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "completed");

    // Cancelling a completed booking is rejected.
    let (status, json) = send(
        &state,
        "POST",
        &format!("/api/bookings/{id}/cancel"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"], "Completed booking cannot be cancelled");
}

#[tokio::test]
async fn test_booking_past_date_rejected() {
    let state = test_state();
    seed(&state).await;

    let (status, json) = send(
        &state,
        "POST",
        "/api/bookings",
        Some(booking_body(1, "2025-05-20", "09:00")),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"], "Cannot create a booking in the past");
}

#[tokio::test]
async fn test_adjacent_and_other_staff_slots_allowed() {
    let state = test_state();
    seed(&state).await;

    let (status, _) = send(
        &state,
        "POST",
        "/api/bookings",
        Some(booking_body(1, "2025-06-10", "09:00")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Starts exactly when the first ends — no overlap.
    let (status, _) = send(
        &state,
        "POST",
        "/api/bookings",
        Some(booking_body(1, "2025-06-10", "10:00")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Identical window, different staff member.
    let (status, _) = send(
        &state,
        "POST",
        "/api/bookings",
        Some(booking_body(2, "2025-06-10", "09:00")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_update_does_not_conflict_with_itself() {
    let state = test_state();
    seed(&state).await;

    let (_, json) = send(
        &state,
        "POST",
        "/api/bookings",
        Some(booking_body(1, "2025-06-10", "09:00")),
    )
    .await;
    let id = json["id"].as_i64().unwrap();

    // Re-submitting the same slot must pass the overlap check.
    let (status, json) = send(
        &state,
        "PUT",
        &format!("/api/bookings/{id}"),
        Some(serde_json::json!({
            "staff_id": 1,
            "service_id": 1,
            "booking_date": "2025-06-10",
            "start_time": "09:00",
            "notes": "keep the slot"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["notes"], "keep the slot");
}

#[tokio::test]
async fn test_update_rejected_after_confirm() {
    let state = test_state();
    seed(&state).await;

    let (_, json) = send(
        &state,
        "POST",
        "/api/bookings",
        Some(booking_body(1, "2025-06-10", "09:00")),
    )
    .await;
    let id = json["id"].as_i64().unwrap();

    send(&state, "POST", &format!("/api/bookings/{id}/confirm"), None).await;

    let (status, json) = send(
        &state,
        "PUT",
        &format!("/api/bookings/{id}"),
        Some(serde_json::json!({
            "staff_id": 1,
            "service_id": 1,
            "booking_date": "2025-06-11",
            "start_time": "09:00"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"], "Only pending bookings can be updated");
}

#[tokio::test]
async fn test_booking_not_found() {
    let state = test_state();
    seed(&state).await;

    let (status, _) = send(&state, "GET", "/api/bookings/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = send(&state, "POST", "/api/bookings/999/confirm", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Booking with id 999 not found");
}

#[tokio::test]
async fn test_unknown_service_not_found() {
    let state = test_state();
    seed(&state).await;

    let (status, json) = send(
        &state,
        "POST",
        "/api/bookings",
        Some(serde_json::json!({
            "customer_id": 1,
            "staff_id": 1,
            "service_id": 42,
            "booking_date": "2025-06-10",
            "start_time": "09:00"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Service with id 42 not found");
}

#[tokio::test]
async fn test_invalid_date_format_rejected() {
    let state = test_state();
    seed(&state).await;

    let (status, json) = send(
        &state,
        "POST",
        "/api/bookings",
        Some(booking_body(1, "junk", "09:00")),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["error"].as_str().unwrap().contains("Invalid date"));
}

// ── Soft delete ──

#[tokio::test]
async fn test_soft_delete_hides_from_default_listing() {
    let state = test_state();
    seed(&state).await;

    let (_, json) = send(
        &state,
        "POST",
        "/api/bookings",
        Some(booking_body(1, "2025-06-10", "09:00")),
    )
    .await;
    let id = json["id"].as_i64().unwrap();

    let (status, _) = send(&state, "DELETE", &format!("/api/bookings/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    // Deleting again is rejected and the flag stays set.
    let (status, json) = send(&state, "DELETE", &format!("/api/bookings/{id}"), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"], "Booking is already deleted");

    let (_, json) = send(&state, "GET", "/api/bookings", None).await;
    assert_eq!(json.as_array().unwrap().len(), 0);

    let (_, json) = send(&state, "GET", "/api/bookings?include_deleted=true", None).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["is_deleted"], true);
}

// ── Sales ──

#[tokio::test]
async fn test_sale_refund_flow() {
    let state = test_state();
    seed(&state).await;

    let (_, json) = send(
        &state,
        "POST",
        "/api/bookings",
        Some(booking_body(1, "2025-06-10", "09:00")),
    )
    .await;
    let id = json["id"].as_i64().unwrap();
    send(&state, "POST", &format!("/api/bookings/{id}/confirm"), None).await;
    send(&state, "POST", &format!("/api/bookings/{id}/complete"), None).await;

    let (status, json) = send(
        &state,
        "POST",
        "/api/sales",
        Some(serde_json::json!({
            "booking_id": id,
            "customer_id": 1,
            "amount": "150.00",
            "payment_method": "card"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "paid");
    let sale_id = json["id"].as_i64().unwrap();

    let (status, json) = send(
        &state,
        "POST",
        &format!("/api/sales/{sale_id}/refund"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "refunded");

    // Terminal: a refunded sale cannot be voided.
    let (status, json) = send(&state, "POST", &format!("/api/sales/{sale_id}/void"), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"], "Only paid sales can be voided");
}

#[tokio::test]
async fn test_sale_requires_completed_booking() {
    let state = test_state();
    seed(&state).await;

    let (_, json) = send(
        &state,
        "POST",
        "/api/bookings",
        Some(booking_body(1, "2025-06-10", "09:00")),
    )
    .await;
    let id = json["id"].as_i64().unwrap();

    let (status, json) = send(
        &state,
        "POST",
        "/api/sales",
        Some(serde_json::json!({
            "booking_id": id,
            "customer_id": 1,
            "amount": "150.00"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"], "Only completed bookings can be charged");
}

// ── Catalog CRUD ──

#[tokio::test]
async fn test_customer_crud_and_soft_delete() {
    let state = test_state();

    let (status, json) = send(
        &state,
        "POST",
        "/api/customers",
        Some(serde_json::json!({"first_name": "Dana", "last_name": "Lee", "phone": "+15551110000"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = json["id"].as_i64().unwrap();

    let (status, json) = send(&state, "GET", &format!("/api/customers/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["first_name"], "Dana");

    let (status, _) = send(&state, "DELETE", &format!("/api/customers/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = send(&state, "GET", "/api/customers", None).await;
    assert_eq!(json.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_service_price_change_does_not_touch_booking() {
    let state = test_state();
    seed(&state).await;

    let (_, json) = send(
        &state,
        "POST",
        "/api/bookings",
        Some(booking_body(1, "2025-06-10", "09:00")),
    )
    .await;
    let id = json["id"].as_i64().unwrap();
    assert_eq!(json["total_price"], "150.00");

    // Raise the service price after the booking was made.
    let (status, _) = send(
        &state,
        "PUT",
        "/api/services/1",
        Some(serde_json::json!({
            "name": "Haircut",
            "duration_minutes": 60,
            "base_price": "200.00"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = send(&state, "GET", &format!("/api/bookings/{id}"), None).await;
    assert_eq!(json["total_price"], "150.00");
}

#[tokio::test]
async fn test_inactive_service_rejected() {
    let state = test_state();
    seed(&state).await;

    let (status, _) = send(
        &state,
        "PUT",
        "/api/services/1",
        Some(serde_json::json!({
            "name": "Haircut",
            "duration_minutes": 60,
            "base_price": "150.00",
            "status": "inactive"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(
        &state,
        "POST",
        "/api/bookings",
        Some(booking_body(1, "2025-06-10", "09:00")),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"], "Service is not active");
}

// ── Audit & stats ──

#[tokio::test]
async fn test_audit_records_transitions() {
    let state = test_state();
    seed(&state).await;

    let (_, json) = send(
        &state,
        "POST",
        "/api/bookings",
        Some(booking_body(1, "2025-06-10", "09:00")),
    )
    .await;
    let id = json["id"].as_i64().unwrap();
    send(&state, "POST", &format!("/api/bookings/{id}/confirm"), None).await;

    let (status, json) = send(&state, "GET", "/api/audit", None).await;
    assert_eq!(status, StatusCode::OK);
    let entries = json.as_array().unwrap();

    // Newest first: confirm, then the booking create, then the seed records.
    assert_eq!(entries[0]["entity_name"], "Booking");
    assert_eq!(entries[0]["action"], "confirm");
    assert_eq!(entries[0]["actor"], "system");
    assert_eq!(entries[1]["action"], "create");
    assert!(entries[1]["new_values"]["id"].as_i64().is_some());
}

#[tokio::test]
async fn test_stats() {
    let state = test_state();
    seed(&state).await;

    send(
        &state,
        "POST",
        "/api/bookings",
        Some(booking_body(1, "2025-06-10", "09:00")),
    )
    .await;

    let (status, json) = send(&state, "GET", "/api/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["bookings_today"], 0);
    assert_eq!(json["upcoming_bookings"], 1);
    assert_eq!(json["active_customers"], 1);
    assert_eq!(json["revenue_this_month"], "0");
}
