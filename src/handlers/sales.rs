use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{PaymentMethod, Sale};
use crate::services::sales::{self, CreateSaleInput};
use crate::state::AppState;

use super::actor_from;
use super::customers::ListQuery;

#[derive(Serialize)]
pub struct SaleResponse {
    pub id: i64,
    pub booking_id: Option<i64>,
    pub customer_id: i64,
    pub amount: Decimal,
    pub payment_method: String,
    pub status: String,
    pub created_at: String,
}

impl From<Sale> for SaleResponse {
    fn from(s: Sale) -> Self {
        Self {
            id: s.id,
            booking_id: s.booking_id,
            customer_id: s.customer_id,
            amount: s.amount,
            payment_method: s.payment_method.as_str().to_string(),
            status: s.status.as_str().to_string(),
            created_at: s.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

// POST /api/sales
#[derive(Deserialize)]
pub struct CreateSaleRequest {
    pub booking_id: Option<i64>,
    pub customer_id: i64,
    pub amount: Decimal,
    pub payment_method: Option<String>,
}

pub async fn create_sale(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateSaleRequest>,
) -> Result<Json<SaleResponse>, AppError> {
    let input = CreateSaleInput {
        booking_id: body.booking_id,
        customer_id: body.customer_id,
        amount: body.amount,
        payment_method: body
            .payment_method
            .as_deref()
            .map(PaymentMethod::parse)
            .unwrap_or(PaymentMethod::Cash),
    };

    let db = state.db.lock().unwrap();
    let sale = sales::create_sale(&db, state.clock.as_ref(), &actor_from(&headers), input)?;
    Ok(Json(sale.into()))
}

pub async fn list_sales(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<SaleResponse>>, AppError> {
    let db = state.db.lock().unwrap();
    let sales = queries::list_sales(&db, query.limit.unwrap_or(100))?;
    Ok(Json(sales.into_iter().map(Into::into).collect()))
}

// POST /api/sales/:id/refund
pub async fn refund_sale(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<SaleResponse>, AppError> {
    let db = state.db.lock().unwrap();
    let sale = sales::refund_sale(&db, state.clock.as_ref(), &actor_from(&headers), id)?;
    Ok(Json(sale.into()))
}

// POST /api/sales/:id/void
pub async fn void_sale(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<SaleResponse>, AppError> {
    let db = state.db.lock().unwrap();
    let sale = sales::void_sale(&db, state.clock.as_ref(), &actor_from(&headers), id)?;
    Ok(Json(sale.into()))
}
