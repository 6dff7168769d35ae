use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Serialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::state::AppState;

use super::customers::ListQuery;

#[derive(Serialize)]
pub struct AuditResponse {
    pub id: i64,
    pub entity_name: String,
    pub entity_id: i64,
    pub action: String,
    pub description: String,
    pub actor: String,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub created_at: String,
}

// GET /api/audit
pub async fn list_audit(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<AuditResponse>>, AppError> {
    let db = state.db.lock().unwrap();
    let entries = queries::list_audit_entries(&db, query.limit.unwrap_or(100))?;

    let response = entries
        .into_iter()
        .map(|e| AuditResponse {
            id: e.id,
            entity_name: e.entity_name,
            entity_id: e.entity_id,
            action: e.action,
            description: e.description,
            actor: e.actor,
            old_values: e.old_values.and_then(|v| serde_json::from_str(&v).ok()),
            new_values: e.new_values.and_then(|v| serde_json::from_str(&v).ok()),
            created_at: e.created_at,
        })
        .collect();

    Ok(Json(response))
}
