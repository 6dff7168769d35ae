use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Staff, StaffStatus};
use crate::services::audit;
use crate::state::AppState;

use super::actor_from;
use super::customers::ListQuery;

#[derive(Serialize)]
pub struct StaffResponse {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub status: String,
    pub created_at: String,
}

impl From<Staff> for StaffResponse {
    fn from(s: Staff) -> Self {
        Self {
            id: s.id,
            first_name: s.first_name,
            last_name: s.last_name,
            phone: s.phone,
            email: s.email,
            role: s.role,
            status: s.status.as_str().to_string(),
            created_at: s.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

#[derive(Deserialize)]
pub struct StaffRequest {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
}

pub async fn create_staff(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<StaffRequest>,
) -> Result<Json<StaffResponse>, AppError> {
    if body.first_name.trim().is_empty() {
        return Err(AppError::domain("First name is required"));
    }

    let now = state.clock.now();
    let mut staff = Staff {
        id: 0,
        first_name: body.first_name,
        last_name: body.last_name,
        phone: body.phone,
        email: body.email,
        role: body.role,
        status: body
            .status
            .as_deref()
            .map(StaffStatus::parse)
            .unwrap_or(StaffStatus::Active),
        is_deleted: false,
        deleted_at: None,
        created_at: now,
        updated_at: now,
    };

    let db = state.db.lock().unwrap();
    staff.id = queries::insert_staff(&db, &staff)?;

    audit::record(
        &db,
        "Staff",
        staff.id,
        "create",
        &format!("Staff member {} {} created", staff.first_name, staff.last_name),
        &actor_from(&headers),
        None::<&Staff>,
        Some(&staff),
    );

    Ok(Json(staff.into()))
}

pub async fn list_staff(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<StaffResponse>>, AppError> {
    let db = state.db.lock().unwrap();
    let staff = queries::list_staff(&db, query.limit.unwrap_or(100))?;
    Ok(Json(staff.into_iter().map(Into::into).collect()))
}

pub async fn get_staff(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<StaffResponse>, AppError> {
    let db = state.db.lock().unwrap();
    let staff =
        queries::get_staff_by_id(&db, id)?.ok_or_else(|| AppError::not_found("Staff", id))?;
    Ok(Json(staff.into()))
}

pub async fn update_staff(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<StaffRequest>,
) -> Result<Json<StaffResponse>, AppError> {
    let db = state.db.lock().unwrap();
    let mut staff =
        queries::get_staff_by_id(&db, id)?.ok_or_else(|| AppError::not_found("Staff", id))?;
    let before = staff.clone();

    staff.first_name = body.first_name;
    staff.last_name = body.last_name;
    staff.phone = body.phone;
    staff.email = body.email;
    staff.role = body.role;
    if let Some(status) = body.status.as_deref() {
        staff.status = StaffStatus::parse(status);
    }
    staff.updated_at = state.clock.now();
    queries::save_staff(&db, &staff)?;

    audit::record(
        &db,
        "Staff",
        staff.id,
        "update",
        "Staff member updated",
        &actor_from(&headers),
        Some(&before),
        Some(&staff),
    );

    Ok(Json(staff.into()))
}

pub async fn delete_staff(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = state.db.lock().unwrap();
    let mut staff =
        queries::get_staff_by_id(&db, id)?.ok_or_else(|| AppError::not_found("Staff", id))?;
    if staff.is_deleted {
        return Err(AppError::domain("Staff member is already deleted"));
    }

    let now = state.clock.now();
    staff.is_deleted = true;
    staff.deleted_at = Some(now);
    staff.updated_at = now;
    queries::save_staff(&db, &staff)?;

    audit::record(
        &db,
        "Staff",
        staff.id,
        "delete",
        "Staff member deleted",
        &actor_from(&headers),
        None::<&Staff>,
        Some(&staff),
    );

    Ok(Json(serde_json::json!({"ok": true})))
}
