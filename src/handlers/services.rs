use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Service, ServiceStatus};
use crate::services::audit;
use crate::state::AppState;

use super::actor_from;
use super::customers::ListQuery;

#[derive(Serialize)]
pub struct ServiceResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub base_price: Decimal,
    pub status: String,
    pub created_at: String,
}

impl From<Service> for ServiceResponse {
    fn from(s: Service) -> Self {
        Self {
            id: s.id,
            name: s.name,
            description: s.description,
            duration_minutes: s.duration_minutes,
            base_price: s.base_price,
            status: s.status.as_str().to_string(),
            created_at: s.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

#[derive(Deserialize)]
pub struct ServiceRequest {
    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub base_price: Decimal,
    pub status: Option<String>,
}

fn check_service_fields(body: &ServiceRequest) -> Result<(), AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::domain("Service name is required"));
    }
    if body.duration_minutes <= 0 {
        return Err(AppError::domain("Service duration must be positive"));
    }
    if body.base_price < Decimal::ZERO {
        return Err(AppError::domain("Service price cannot be negative"));
    }
    Ok(())
}

pub async fn create_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ServiceRequest>,
) -> Result<Json<ServiceResponse>, AppError> {
    check_service_fields(&body)?;

    let now = state.clock.now();
    let mut service = Service {
        id: 0,
        name: body.name,
        description: body.description,
        duration_minutes: body.duration_minutes,
        base_price: body.base_price,
        status: body
            .status
            .as_deref()
            .map(ServiceStatus::parse)
            .unwrap_or(ServiceStatus::Active),
        is_deleted: false,
        deleted_at: None,
        created_at: now,
        updated_at: now,
    };

    let db = state.db.lock().unwrap();
    service.id = queries::insert_service(&db, &service)?;

    audit::record(
        &db,
        "Service",
        service.id,
        "create",
        &format!("Service {} created", service.name),
        &actor_from(&headers),
        None::<&Service>,
        Some(&service),
    );

    Ok(Json(service.into()))
}

pub async fn list_services(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ServiceResponse>>, AppError> {
    let db = state.db.lock().unwrap();
    let services = queries::list_services(&db, query.limit.unwrap_or(100))?;
    Ok(Json(services.into_iter().map(Into::into).collect()))
}

pub async fn get_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ServiceResponse>, AppError> {
    let db = state.db.lock().unwrap();
    let service =
        queries::get_service_by_id(&db, id)?.ok_or_else(|| AppError::not_found("Service", id))?;
    Ok(Json(service.into()))
}

/// Price or duration changes here never touch existing bookings; each
/// booking keeps the values snapshotted when it was made.
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<ServiceRequest>,
) -> Result<Json<ServiceResponse>, AppError> {
    check_service_fields(&body)?;

    let db = state.db.lock().unwrap();
    let mut service =
        queries::get_service_by_id(&db, id)?.ok_or_else(|| AppError::not_found("Service", id))?;
    let before = service.clone();

    service.name = body.name;
    service.description = body.description;
    service.duration_minutes = body.duration_minutes;
    service.base_price = body.base_price;
    if let Some(status) = body.status.as_deref() {
        service.status = ServiceStatus::parse(status);
    }
    service.updated_at = state.clock.now();
    queries::save_service(&db, &service)?;

    audit::record(
        &db,
        "Service",
        service.id,
        "update",
        "Service updated",
        &actor_from(&headers),
        Some(&before),
        Some(&service),
    );

    Ok(Json(service.into()))
}

pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = state.db.lock().unwrap();
    let mut service =
        queries::get_service_by_id(&db, id)?.ok_or_else(|| AppError::not_found("Service", id))?;
    if service.is_deleted {
        return Err(AppError::domain("Service is already deleted"));
    }

    let now = state.clock.now();
    service.is_deleted = true;
    service.deleted_at = Some(now);
    service.updated_at = now;
    queries::save_service(&db, &service)?;

    audit::record(
        &db,
        "Service",
        service.id,
        "delete",
        "Service deleted",
        &actor_from(&headers),
        None::<&Service>,
        Some(&service),
    );

    Ok(Json(serde_json::json!({"ok": true})))
}
