use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Customer;
use crate::services::audit;
use crate::state::AppState;

use super::actor_from;

#[derive(Serialize)]
pub struct CustomerResponse {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
}

impl From<Customer> for CustomerResponse {
    fn from(c: Customer) -> Self {
        Self {
            id: c.id,
            first_name: c.first_name,
            last_name: c.last_name,
            phone: c.phone,
            email: c.email,
            notes: c.notes,
            created_at: c.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

#[derive(Deserialize)]
pub struct CustomerRequest {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
}

pub async fn create_customer(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CustomerRequest>,
) -> Result<Json<CustomerResponse>, AppError> {
    if body.first_name.trim().is_empty() {
        return Err(AppError::domain("First name is required"));
    }

    let now = state.clock.now();
    let mut customer = Customer {
        id: 0,
        first_name: body.first_name,
        last_name: body.last_name,
        phone: body.phone,
        email: body.email,
        notes: body.notes,
        is_deleted: false,
        deleted_at: None,
        created_at: now,
        updated_at: now,
    };

    let db = state.db.lock().unwrap();
    customer.id = queries::insert_customer(&db, &customer)?;

    audit::record(
        &db,
        "Customer",
        customer.id,
        "create",
        &format!("Customer {} {} created", customer.first_name, customer.last_name),
        &actor_from(&headers),
        None::<&Customer>,
        Some(&customer),
    );

    Ok(Json(customer.into()))
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

pub async fn list_customers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<CustomerResponse>>, AppError> {
    let db = state.db.lock().unwrap();
    let customers = queries::list_customers(&db, query.limit.unwrap_or(100))?;
    Ok(Json(customers.into_iter().map(Into::into).collect()))
}

pub async fn get_customer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<CustomerResponse>, AppError> {
    let db = state.db.lock().unwrap();
    let customer =
        queries::get_customer_by_id(&db, id)?.ok_or_else(|| AppError::not_found("Customer", id))?;
    Ok(Json(customer.into()))
}

pub async fn update_customer(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<CustomerRequest>,
) -> Result<Json<CustomerResponse>, AppError> {
    let db = state.db.lock().unwrap();
    let mut customer =
        queries::get_customer_by_id(&db, id)?.ok_or_else(|| AppError::not_found("Customer", id))?;
    let before = customer.clone();

    customer.first_name = body.first_name;
    customer.last_name = body.last_name;
    customer.phone = body.phone;
    customer.email = body.email;
    customer.notes = body.notes;
    customer.updated_at = state.clock.now();
    queries::save_customer(&db, &customer)?;

    audit::record(
        &db,
        "Customer",
        customer.id,
        "update",
        "Customer updated",
        &actor_from(&headers),
        Some(&before),
        Some(&customer),
    );

    Ok(Json(customer.into()))
}

pub async fn delete_customer(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = state.db.lock().unwrap();
    let mut customer =
        queries::get_customer_by_id(&db, id)?.ok_or_else(|| AppError::not_found("Customer", id))?;
    if customer.is_deleted {
        return Err(AppError::domain("Customer is already deleted"));
    }

    let now = state.clock.now();
    customer.is_deleted = true;
    customer.deleted_at = Some(now);
    customer.updated_at = now;
    queries::save_customer(&db, &customer)?;

    audit::record(
        &db,
        "Customer",
        customer.id,
        "delete",
        "Customer deleted",
        &actor_from(&headers),
        None::<&Customer>,
        Some(&customer),
    );

    Ok(Json(serde_json::json!({"ok": true})))
}
