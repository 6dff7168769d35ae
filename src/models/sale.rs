use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Payment record. Same guarded-transition shape as the booking state
/// machine: Paid is the only mutable state, Refunded and Voided are terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: i64,
    pub booking_id: Option<i64>,
    pub customer_id: i64,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub status: SaleStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Transfer => "transfer",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "card" => PaymentMethod::Card,
            "transfer" => PaymentMethod::Transfer,
            _ => PaymentMethod::Cash,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    Paid,
    Refunded,
    Voided,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Paid => "paid",
            SaleStatus::Refunded => "refunded",
            SaleStatus::Voided => "voided",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "refunded" => SaleStatus::Refunded,
            "voided" => SaleStatus::Voided,
            _ => SaleStatus::Paid,
        }
    }
}

impl Sale {
    pub fn refund(&mut self, now: NaiveDateTime) -> Result<(), AppError> {
        if self.status != SaleStatus::Paid {
            return Err(AppError::domain("Only paid sales can be refunded"));
        }
        self.status = SaleStatus::Refunded;
        self.updated_at = now;
        Ok(())
    }

    pub fn void_sale(&mut self, now: NaiveDateTime) -> Result<(), AppError> {
        if self.status != SaleStatus::Paid {
            return Err(AppError::domain("Only paid sales can be voided"));
        }
        self.status = SaleStatus::Voided;
        self.updated_at = now;
        Ok(())
    }
}
