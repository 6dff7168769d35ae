use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::queries::{self, BookingFilter};
use crate::errors::AppError;
use crate::models::Booking;
use crate::services::bookings::{self, CreateBookingInput, UpdateBookingInput};
use crate::state::AppState;

use super::{actor_from, parse_date, parse_time};

#[derive(Serialize)]
pub struct BookingResponse {
    pub id: i64,
    pub customer_id: i64,
    pub staff_id: i64,
    pub service_id: i64,
    pub booking_date: String,
    pub start_time: String,
    pub end_time: String,
    pub total_price: Decimal,
    pub status: String,
    pub notes: Option<String>,
    pub is_deleted: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            customer_id: b.customer_id,
            staff_id: b.staff_id,
            service_id: b.service_id,
            booking_date: b.booking_date.format("%Y-%m-%d").to_string(),
            start_time: b.start_time.format("%H:%M").to_string(),
            end_time: b.end_time.format("%H:%M").to_string(),
            total_price: b.total_price,
            status: b.status.as_str().to_string(),
            notes: b.notes,
            is_deleted: b.is_deleted,
            created_at: b.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            updated_at: b.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

// POST /api/bookings
#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub customer_id: i64,
    pub staff_id: i64,
    pub service_id: i64,
    pub booking_date: String,
    pub start_time: String,
    pub notes: Option<String>,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let input = CreateBookingInput {
        customer_id: body.customer_id,
        staff_id: body.staff_id,
        service_id: body.service_id,
        booking_date: parse_date(&body.booking_date)?,
        start_time: parse_time(&body.start_time)?,
        notes: body.notes,
    };

    let db = state.db.lock().unwrap();
    let booking = bookings::create_booking(&db, state.clock.as_ref(), &actor_from(&headers), input)?;
    Ok(Json(booking.into()))
}

// GET /api/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
    pub staff_id: Option<i64>,
    pub date: Option<String>,
    pub include_deleted: Option<bool>,
    pub limit: Option<i64>,
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let date = match query.date.as_deref() {
        Some(s) => Some(parse_date(s)?),
        None => None,
    };

    let db = state.db.lock().unwrap();
    let bookings = queries::list_bookings(
        &db,
        &BookingFilter {
            status: query.status.as_deref(),
            staff_id: query.staff_id,
            date,
            include_deleted: query.include_deleted.unwrap_or(false),
            limit: query.limit.unwrap_or(100),
        },
    )?;

    Ok(Json(bookings.into_iter().map(Into::into).collect()))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<BookingResponse>, AppError> {
    let db = state.db.lock().unwrap();
    let booking =
        queries::get_booking_by_id(&db, id)?.ok_or_else(|| AppError::not_found("Booking", id))?;
    Ok(Json(booking.into()))
}

// PUT /api/bookings/:id
#[derive(Deserialize)]
pub struct UpdateBookingRequest {
    pub staff_id: i64,
    pub service_id: i64,
    pub booking_date: String,
    pub start_time: String,
    pub notes: Option<String>,
}

pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<UpdateBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let input = UpdateBookingInput {
        staff_id: body.staff_id,
        service_id: body.service_id,
        booking_date: parse_date(&body.booking_date)?,
        start_time: parse_time(&body.start_time)?,
        notes: body.notes,
    };

    let db = state.db.lock().unwrap();
    let booking =
        bookings::update_booking(&db, state.clock.as_ref(), &actor_from(&headers), id, input)?;
    Ok(Json(booking.into()))
}

// POST /api/bookings/:id/confirm
pub async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<BookingResponse>, AppError> {
    let db = state.db.lock().unwrap();
    let booking = bookings::confirm_booking(&db, state.clock.as_ref(), &actor_from(&headers), id)?;
    Ok(Json(booking.into()))
}

// POST /api/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<BookingResponse>, AppError> {
    let db = state.db.lock().unwrap();
    let booking = bookings::cancel_booking(&db, state.clock.as_ref(), &actor_from(&headers), id)?;
    Ok(Json(booking.into()))
}

// POST /api/bookings/:id/complete
pub async fn complete_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<BookingResponse>, AppError> {
    let db = state.db.lock().unwrap();
    let booking = bookings::complete_booking(&db, state.clock.as_ref(), &actor_from(&headers), id)?;
    Ok(Json(booking.into()))
}

// DELETE /api/bookings/:id
pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = state.db.lock().unwrap();
    bookings::soft_delete_booking(&db, state.clock.as_ref(), &actor_from(&headers), id)?;
    Ok(Json(serde_json::json!({"ok": true})))
}
