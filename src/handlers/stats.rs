use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct StatsResponse {
    pub bookings_today: i64,
    pub upcoming_bookings: i64,
    pub active_customers: i64,
    pub revenue_this_month: Decimal,
}

// GET /api/stats
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatsResponse>, AppError> {
    let db = state.db.lock().unwrap();
    let stats = queries::get_dashboard_stats(&db, state.clock.today())?;

    Ok(Json(StatsResponse {
        bookings_today: stats.bookings_today,
        upcoming_bookings: stats.upcoming_bookings,
        active_customers: stats.active_customers,
        revenue_this_month: stats.revenue_this_month,
    }))
}
