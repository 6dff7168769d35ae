use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::clock::Clock;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{BookingStatus, PaymentMethod, Sale, SaleStatus};
use crate::services::audit;

pub struct CreateSaleInput {
    pub booking_id: Option<i64>,
    pub customer_id: i64,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
}

/// Record a payment. When tied to a booking the booking must exist and be
/// completed; the amount defaults to the booking's snapshotted price upstream.
pub fn create_sale(
    conn: &Connection,
    clock: &dyn Clock,
    actor: &str,
    input: CreateSaleInput,
) -> Result<Sale, AppError> {
    match queries::get_customer_by_id(conn, input.customer_id)? {
        Some(c) if !c.is_deleted => {}
        _ => return Err(AppError::not_found("Customer", input.customer_id)),
    }

    if let Some(booking_id) = input.booking_id {
        let booking = queries::get_booking_by_id(conn, booking_id)?
            .ok_or_else(|| AppError::not_found("Booking", booking_id))?;
        if booking.status != BookingStatus::Completed {
            return Err(AppError::domain(
                "Only completed bookings can be charged",
            ));
        }
        if booking.customer_id != input.customer_id {
            return Err(AppError::domain(
                "Sale customer does not match the booking",
            ));
        }
    }

    if input.amount <= Decimal::ZERO {
        return Err(AppError::domain("Sale amount must be positive"));
    }

    let now = clock.now();
    let mut sale = Sale {
        id: 0,
        booking_id: input.booking_id,
        customer_id: input.customer_id,
        amount: input.amount,
        payment_method: input.payment_method,
        status: SaleStatus::Paid,
        created_at: now,
        updated_at: now,
    };
    sale.id = queries::insert_sale(conn, &sale)?;

    audit::record(
        conn,
        "Sale",
        sale.id,
        "create",
        &format!("Sale recorded for {}", sale.amount),
        actor,
        None::<&Sale>,
        Some(&sale),
    );

    Ok(sale)
}

pub fn refund_sale(
    conn: &Connection,
    clock: &dyn Clock,
    actor: &str,
    id: i64,
) -> Result<Sale, AppError> {
    transition(conn, actor, id, "refund", "Sale refunded", |s| {
        s.refund(clock.now())
    })
}

pub fn void_sale(
    conn: &Connection,
    clock: &dyn Clock,
    actor: &str,
    id: i64,
) -> Result<Sale, AppError> {
    transition(conn, actor, id, "void", "Sale voided", |s| {
        s.void_sale(clock.now())
    })
}

fn transition<F>(
    conn: &Connection,
    actor: &str,
    id: i64,
    action: &str,
    description: &str,
    apply: F,
) -> Result<Sale, AppError>
where
    F: FnOnce(&mut Sale) -> Result<(), AppError>,
{
    let mut sale =
        queries::get_sale_by_id(conn, id)?.ok_or_else(|| AppError::not_found("Sale", id))?;
    let before = sale.clone();

    apply(&mut sale)?;
    queries::save_sale(conn, &sale)?;

    audit::record(
        conn,
        "Sale",
        sale.id,
        action,
        description,
        actor,
        Some(&before),
        Some(&sale),
    );

    Ok(sale)
}
