use chrono::{Duration, NaiveDate, NaiveTime};
use rusqlite::Connection;

use crate::clock::Clock;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, Service};
use crate::services::audit;

pub struct CreateBookingInput {
    pub customer_id: i64,
    pub staff_id: i64,
    pub service_id: i64,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub notes: Option<String>,
}

pub struct UpdateBookingInput {
    pub staff_id: i64,
    pub service_id: i64,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub notes: Option<String>,
}

fn resolve_service(conn: &Connection, service_id: i64) -> Result<Service, AppError> {
    let service = queries::get_service_by_id(conn, service_id)?
        .ok_or_else(|| AppError::not_found("Service", service_id))?;
    if !service.is_active() {
        return Err(AppError::domain("Service is not active"));
    }
    Ok(service)
}

fn check_customer_exists(conn: &Connection, customer_id: i64) -> Result<(), AppError> {
    match queries::get_customer_by_id(conn, customer_id)? {
        Some(c) if !c.is_deleted => Ok(()),
        _ => Err(AppError::not_found("Customer", customer_id)),
    }
}

fn check_staff_exists(conn: &Connection, staff_id: i64) -> Result<(), AppError> {
    match queries::get_staff_by_id(conn, staff_id)? {
        Some(s) if !s.is_deleted => Ok(()),
        _ => Err(AppError::not_found("Staff", staff_id)),
    }
}

/// Derive the end of a slot. `NaiveTime` addition wraps at midnight, which
/// would store an interval with `end < start` and blind the overlap check,
/// so a slot that does not fit inside its calendar day is rejected.
fn end_of(start: NaiveTime, duration_minutes: i32) -> Result<NaiveTime, AppError> {
    let end = start + Duration::minutes(i64::from(duration_minutes));
    if end <= start {
        return Err(AppError::domain("Booking cannot extend past midnight"));
    }
    Ok(end)
}

fn load_booking(conn: &Connection, id: i64) -> Result<Booking, AppError> {
    queries::get_booking_by_id(conn, id)?.ok_or_else(|| AppError::not_found("Booking", id))
}

/// Create a new Pending booking. The overlap check runs before any write;
/// a conflicting slot rejects the request rather than adjusting it.
pub fn create_booking(
    conn: &Connection,
    clock: &dyn Clock,
    actor: &str,
    input: CreateBookingInput,
) -> Result<Booking, AppError> {
    let service = resolve_service(conn, input.service_id)?;
    check_customer_exists(conn, input.customer_id)?;
    check_staff_exists(conn, input.staff_id)?;

    let end_time = end_of(input.start_time, service.duration_minutes)?;

    if queries::exists_overlapping_booking(
        conn,
        input.staff_id,
        input.booking_date,
        input.start_time,
        end_time,
        None,
    )? {
        return Err(AppError::domain(
            "Staff member is already booked for this time slot",
        ));
    }

    let mut booking = Booking::new(
        input.customer_id,
        input.staff_id,
        input.service_id,
        input.booking_date,
        input.start_time,
        end_time,
        service.base_price,
        input.notes,
        clock.today(),
        clock.now(),
    )?;

    booking.id = queries::insert_booking(conn, &booking)?;

    audit::record(
        conn,
        "Booking",
        booking.id,
        "create",
        &format!(
            "Booking created for {} at {}",
            booking.booking_date, booking.start_time
        ),
        actor,
        None::<&Booking>,
        Some(&booking),
    );

    Ok(booking)
}

/// Move an existing Pending booking to a new slot. The overlap check
/// excludes the booking's own id so it cannot conflict with itself.
pub fn update_booking(
    conn: &Connection,
    clock: &dyn Clock,
    actor: &str,
    id: i64,
    input: UpdateBookingInput,
) -> Result<Booking, AppError> {
    let mut booking = load_booking(conn, id)?;
    let before = booking.clone();

    let service = resolve_service(conn, input.service_id)?;
    check_staff_exists(conn, input.staff_id)?;

    let end_time = end_of(input.start_time, service.duration_minutes)?;

    if queries::exists_overlapping_booking(
        conn,
        input.staff_id,
        input.booking_date,
        input.start_time,
        end_time,
        Some(id),
    )? {
        return Err(AppError::domain(
            "Staff member is already booked for this time slot",
        ));
    }

    booking.reschedule(
        input.staff_id,
        input.service_id,
        input.booking_date,
        input.start_time,
        end_time,
        service.base_price,
        input.notes,
        clock.today(),
        clock.now(),
    )?;

    queries::save_booking(conn, &booking)?;

    audit::record(
        conn,
        "Booking",
        booking.id,
        "update",
        &format!(
            "Booking moved to {} at {}",
            booking.booking_date, booking.start_time
        ),
        actor,
        Some(&before),
        Some(&booking),
    );

    Ok(booking)
}

pub fn confirm_booking(
    conn: &Connection,
    clock: &dyn Clock,
    actor: &str,
    id: i64,
) -> Result<Booking, AppError> {
    transition(conn, actor, id, "confirm", "Booking confirmed", |b| {
        b.confirm(clock.now())
    })
}

pub fn cancel_booking(
    conn: &Connection,
    clock: &dyn Clock,
    actor: &str,
    id: i64,
) -> Result<Booking, AppError> {
    transition(conn, actor, id, "cancel", "Booking cancelled", |b| {
        b.cancel(clock.now())
    })
}

pub fn complete_booking(
    conn: &Connection,
    clock: &dyn Clock,
    actor: &str,
    id: i64,
) -> Result<Booking, AppError> {
    transition(conn, actor, id, "complete", "Booking completed", |b| {
        b.complete(clock.now())
    })
}

pub fn soft_delete_booking(
    conn: &Connection,
    clock: &dyn Clock,
    actor: &str,
    id: i64,
) -> Result<Booking, AppError> {
    transition(conn, actor, id, "delete", "Booking deleted", |b| {
        b.soft_delete(clock.now())
    })
}

fn transition<F>(
    conn: &Connection,
    actor: &str,
    id: i64,
    action: &str,
    description: &str,
    apply: F,
) -> Result<Booking, AppError>
where
    F: FnOnce(&mut Booking) -> Result<(), AppError>,
{
    let mut booking = load_booking(conn, id)?;
    let before = booking.clone();

    apply(&mut booking)?;
    queries::save_booking(conn, &booking)?;

    audit::record(
        conn,
        "Booking",
        booking.id,
        action,
        description,
        actor,
        Some(&before),
        Some(&booking),
    );

    Ok(booking)
}
