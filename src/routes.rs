use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/bookings", post(handlers::bookings::create_booking))
        .route("/api/bookings", get(handlers::bookings::list_bookings))
        .route("/api/bookings/:id", get(handlers::bookings::get_booking))
        .route("/api/bookings/:id", put(handlers::bookings::update_booking))
        .route(
            "/api/bookings/:id",
            delete(handlers::bookings::delete_booking),
        )
        .route(
            "/api/bookings/:id/confirm",
            post(handlers::bookings::confirm_booking),
        )
        .route(
            "/api/bookings/:id/cancel",
            post(handlers::bookings::cancel_booking),
        )
        .route(
            "/api/bookings/:id/complete",
            post(handlers::bookings::complete_booking),
        )
        .route("/api/customers", post(handlers::customers::create_customer))
        .route("/api/customers", get(handlers::customers::list_customers))
        .route("/api/customers/:id", get(handlers::customers::get_customer))
        .route(
            "/api/customers/:id",
            put(handlers::customers::update_customer),
        )
        .route(
            "/api/customers/:id",
            delete(handlers::customers::delete_customer),
        )
        .route("/api/staff", post(handlers::staff::create_staff))
        .route("/api/staff", get(handlers::staff::list_staff))
        .route("/api/staff/:id", get(handlers::staff::get_staff))
        .route("/api/staff/:id", put(handlers::staff::update_staff))
        .route("/api/staff/:id", delete(handlers::staff::delete_staff))
        .route("/api/services", post(handlers::services::create_service))
        .route("/api/services", get(handlers::services::list_services))
        .route("/api/services/:id", get(handlers::services::get_service))
        .route("/api/services/:id", put(handlers::services::update_service))
        .route(
            "/api/services/:id",
            delete(handlers::services::delete_service),
        )
        .route("/api/sales", post(handlers::sales::create_sale))
        .route("/api/sales", get(handlers::sales::list_sales))
        .route("/api/sales/:id/refund", post(handlers::sales::refund_sale))
        .route("/api/sales/:id/void", post(handlers::sales::void_sale))
        .route("/api/audit", get(handlers::audit::list_audit))
        .route("/api/stats", get(handlers::stats::get_stats))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
