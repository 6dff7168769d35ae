use rusqlite::Connection;
use serde::Serialize;

use crate::db::queries;

/// Write an audit record. Fire-and-forget: a failed write is logged and
/// never fails the request that produced it.
#[allow(clippy::too_many_arguments)]
pub fn record<O: Serialize, N: Serialize>(
    conn: &Connection,
    entity_name: &str,
    entity_id: i64,
    action: &str,
    description: &str,
    actor: &str,
    old_snapshot: Option<&O>,
    new_snapshot: Option<&N>,
) {
    let old_values = old_snapshot.and_then(|s| serde_json::to_string(s).ok());
    let new_values = new_snapshot.and_then(|s| serde_json::to_string(s).ok());

    if let Err(e) = queries::insert_audit_entry(
        conn,
        entity_name,
        entity_id,
        action,
        description,
        actor,
        old_values.as_deref(),
        new_values.as_deref(),
    ) {
        tracing::warn!("failed to write audit entry for {entity_name}#{entity_id}: {e}");
    }
}
