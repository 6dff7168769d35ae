use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

pub const MAX_NOTES_LEN: usize = 500;

/// A single appointment. The entity owns every status transition and field
/// guard; nothing outside this impl is allowed to set `status` directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub customer_id: i64,
    pub staff_id: i64,
    pub service_id: i64,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub total_price: Decimal,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub is_deleted: bool,
    pub deleted_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "confirmed" => BookingStatus::Confirmed,
            "completed" => BookingStatus::Completed,
            "cancelled" => BookingStatus::Cancelled,
            _ => BookingStatus::Pending,
        }
    }
}

impl Booking {
    /// Construct a new booking in Pending. `today` is the current UTC date
    /// from the injected clock; dates already past are rejected.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        customer_id: i64,
        staff_id: i64,
        service_id: i64,
        booking_date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        total_price: Decimal,
        notes: Option<String>,
        today: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<Self, AppError> {
        if booking_date < today {
            return Err(AppError::domain("Cannot create a booking in the past"));
        }
        check_notes(notes.as_deref())?;

        Ok(Self {
            id: 0,
            customer_id,
            staff_id,
            service_id,
            booking_date,
            start_time,
            end_time,
            total_price,
            status: BookingStatus::Pending,
            notes,
            is_deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace the slot and snapshot fields. Only Pending bookings may move.
    #[allow(clippy::too_many_arguments)]
    pub fn reschedule(
        &mut self,
        staff_id: i64,
        service_id: i64,
        booking_date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        total_price: Decimal,
        notes: Option<String>,
        today: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<(), AppError> {
        if self.status != BookingStatus::Pending {
            return Err(AppError::domain("Only pending bookings can be updated"));
        }
        if booking_date < today {
            return Err(AppError::domain("Cannot create a booking in the past"));
        }
        check_notes(notes.as_deref())?;

        self.staff_id = staff_id;
        self.service_id = service_id;
        self.booking_date = booking_date;
        self.start_time = start_time;
        self.end_time = end_time;
        self.total_price = total_price;
        self.notes = notes;
        self.updated_at = now;
        Ok(())
    }

    pub fn confirm(&mut self, now: NaiveDateTime) -> Result<(), AppError> {
        if self.status != BookingStatus::Pending {
            return Err(AppError::domain("Only pending bookings can be confirmed"));
        }
        self.status = BookingStatus::Confirmed;
        self.updated_at = now;
        Ok(())
    }

    pub fn complete(&mut self, now: NaiveDateTime) -> Result<(), AppError> {
        if self.status != BookingStatus::Confirmed {
            return Err(AppError::domain("Booking must be confirmed first"));
        }
        self.status = BookingStatus::Completed;
        self.updated_at = now;
        Ok(())
    }

    pub fn cancel(&mut self, now: NaiveDateTime) -> Result<(), AppError> {
        match self.status {
            BookingStatus::Completed => {
                Err(AppError::domain("Completed booking cannot be cancelled"))
            }
            BookingStatus::Cancelled => Err(AppError::domain("Booking is already cancelled")),
            _ => {
                self.status = BookingStatus::Cancelled;
                self.updated_at = now;
                Ok(())
            }
        }
    }

    /// Hide the booking from default listings. Allowed at any status, once.
    pub fn soft_delete(&mut self, now: NaiveDateTime) -> Result<(), AppError> {
        if self.is_deleted {
            return Err(AppError::domain("Booking is already deleted"));
        }
        self.is_deleted = true;
        self.deleted_at = Some(now);
        self.updated_at = now;
        Ok(())
    }
}

fn check_notes(notes: Option<&str>) -> Result<(), AppError> {
    if let Some(n) = notes {
        if n.chars().count() > MAX_NOTES_LEN {
            return Err(AppError::domain("Notes cannot exceed 500 characters"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn time(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    fn now() -> NaiveDateTime {
        date("2025-06-01").and_hms_opt(12, 0, 0).unwrap()
    }

    fn make(status: BookingStatus) -> Booking {
        let mut b = Booking::new(
            1,
            1,
            1,
            date("2025-06-10"),
            time("09:00"),
            time("10:00"),
            Decimal::new(15000, 2),
            None,
            date("2025-06-01"),
            now(),
        )
        .unwrap();
        b.status = status;
        b
    }

    #[test]
    fn test_new_booking_is_pending() {
        let b = make(BookingStatus::Pending);
        assert_eq!(b.status, BookingStatus::Pending);
        assert!(!b.is_deleted);
    }

    #[test]
    fn test_past_date_rejected() {
        let result = Booking::new(
            1,
            1,
            1,
            date("2025-05-31"),
            time("09:00"),
            time("10:00"),
            Decimal::new(15000, 2),
            None,
            date("2025-06-01"),
            now(),
        );
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            "Cannot create a booking in the past"
        );
    }

    #[test]
    fn test_same_day_booking_allowed() {
        let result = Booking::new(
            1,
            1,
            1,
            date("2025-06-01"),
            time("09:00"),
            time("10:00"),
            Decimal::new(15000, 2),
            None,
            date("2025-06-01"),
            now(),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_notes_length_guard() {
        let long = "x".repeat(501);
        let result = Booking::new(
            1,
            1,
            1,
            date("2025-06-10"),
            time("09:00"),
            time("10:00"),
            Decimal::new(15000, 2),
            Some(long),
            date("2025-06-01"),
            now(),
        );
        assert!(result.is_err());

        let exactly_500 = "x".repeat(500);
        let result = Booking::new(
            1,
            1,
            1,
            date("2025-06-10"),
            time("09:00"),
            time("10:00"),
            Decimal::new(15000, 2),
            Some(exactly_500),
            date("2025-06-01"),
            now(),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_confirm_only_from_pending() {
        let mut b = make(BookingStatus::Pending);
        assert!(b.confirm(now()).is_ok());
        assert_eq!(b.status, BookingStatus::Confirmed);

        for status in [
            BookingStatus::Confirmed,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
        ] {
            let mut b = make(status);
            let err = b.confirm(now()).unwrap_err();
            assert_eq!(err.to_string(), "Only pending bookings can be confirmed");
            assert_eq!(b.status, status, "status must not change on rejection");
        }
    }

    #[test]
    fn test_complete_only_from_confirmed() {
        let mut b = make(BookingStatus::Confirmed);
        assert!(b.complete(now()).is_ok());
        assert_eq!(b.status, BookingStatus::Completed);

        for status in [
            BookingStatus::Pending,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
        ] {
            let mut b = make(status);
            let err = b.complete(now()).unwrap_err();
            assert_eq!(err.to_string(), "Booking must be confirmed first");
            assert_eq!(b.status, status);
        }
    }

    #[test]
    fn test_cancel_from_pending_and_confirmed() {
        let mut b = make(BookingStatus::Pending);
        assert!(b.cancel(now()).is_ok());
        assert_eq!(b.status, BookingStatus::Cancelled);

        let mut b = make(BookingStatus::Confirmed);
        assert!(b.cancel(now()).is_ok());
        assert_eq!(b.status, BookingStatus::Cancelled);
    }

    #[test]
    fn test_cancel_terminal_states_distinct_messages() {
        let mut b = make(BookingStatus::Completed);
        assert_eq!(
            b.cancel(now()).unwrap_err().to_string(),
            "Completed booking cannot be cancelled"
        );

        let mut b = make(BookingStatus::Cancelled);
        assert_eq!(
            b.cancel(now()).unwrap_err().to_string(),
            "Booking is already cancelled"
        );
    }

    #[test]
    fn test_reschedule_only_while_pending() {
        for status in [
            BookingStatus::Confirmed,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
        ] {
            let mut b = make(status);
            let err = b
                .reschedule(
                    2,
                    2,
                    date("2025-06-11"),
                    time("11:00"),
                    time("12:00"),
                    Decimal::new(20000, 2),
                    None,
                    date("2025-06-01"),
                    now(),
                )
                .unwrap_err();
            assert_eq!(err.to_string(), "Only pending bookings can be updated");
        }

        let mut b = make(BookingStatus::Pending);
        b.reschedule(
            2,
            2,
            date("2025-06-11"),
            time("11:00"),
            time("12:00"),
            Decimal::new(20000, 2),
            Some("trim".to_string()),
            date("2025-06-01"),
            now(),
        )
        .unwrap();
        assert_eq!(b.staff_id, 2);
        assert_eq!(b.total_price, Decimal::new(20000, 2));
        assert_eq!(b.notes.as_deref(), Some("trim"));
    }

    #[test]
    fn test_reschedule_past_date_rejected() {
        let mut b = make(BookingStatus::Pending);
        let err = b
            .reschedule(
                1,
                1,
                date("2025-05-20"),
                time("09:00"),
                time("10:00"),
                Decimal::new(15000, 2),
                None,
                date("2025-06-01"),
                now(),
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot create a booking in the past");
    }

    #[test]
    fn test_soft_delete_once() {
        let mut b = make(BookingStatus::Confirmed);
        assert!(b.soft_delete(now()).is_ok());
        assert!(b.is_deleted);
        assert!(b.deleted_at.is_some());

        let err = b.soft_delete(now()).unwrap_err();
        assert_eq!(err.to_string(), "Booking is already deleted");
        assert!(b.is_deleted, "delete flag is never reversed");
    }
}
