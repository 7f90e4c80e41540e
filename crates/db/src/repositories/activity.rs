use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use helioflow_core::activity::{
    ActivityAction, ActivityEntry, ActivityRecordError, ActivityRecorder,
};
use helioflow_core::domain::lead::{ActorId, LeadId};

use super::RepositoryError;
use crate::DbPool;

/// Durable sink for the append-only activity trail.
pub struct SqlActivityRecorder {
    pool: DbPool,
}

impl SqlActivityRecorder {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_lead(
        &self,
        lead_id: &LeadId,
    ) -> Result<Vec<ActivityEntry>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, lead_id, actor_id, action, entity_type, entity_id, new_value, recorded_at
             FROM activity_log WHERE lead_id = ? ORDER BY recorded_at DESC, id DESC",
        )
        .bind(&lead_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_entry).collect::<Result<Vec<_>, _>>()
    }
}

fn parse_action(raw: &str) -> Result<ActivityAction, RepositoryError> {
    match raw {
        "complete_step" => Ok(ActivityAction::CompleteStep),
        "skip_step" => Ok(ActivityAction::SkipStep),
        "admin_override_complete" => Ok(ActivityAction::AdminOverrideComplete),
        "admin_override_skip" => Ok(ActivityAction::AdminOverrideSkip),
        other => Err(RepositoryError::Decode(format!("unknown activity action `{other}`"))),
    }
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<ActivityEntry, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let lead_id: String =
        row.try_get("lead_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let actor_id: String =
        row.try_get("actor_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let action_str: String =
        row.try_get("action").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let entity_type: String =
        row.try_get("entity_type").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let entity_id: String =
        row.try_get("entity_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let new_value_raw: String =
        row.try_get("new_value").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let recorded_at_str: String =
        row.try_get("recorded_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let new_value = serde_json::from_str(&new_value_raw)
        .map_err(|e| RepositoryError::Decode(format!("new_value: {e}")))?;
    let recorded_at = DateTime::parse_from_rfc3339(&recorded_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("recorded_at: {e}")))?;

    Ok(ActivityEntry {
        id,
        lead_id: LeadId(lead_id),
        actor_id: ActorId(actor_id),
        action: parse_action(&action_str)?,
        entity_type,
        entity_id,
        new_value,
        recorded_at,
    })
}

#[async_trait]
impl ActivityRecorder for SqlActivityRecorder {
    async fn record(&self, entry: ActivityEntry) -> Result<(), ActivityRecordError> {
        let new_value = serde_json::to_string(&entry.new_value)
            .map_err(|e| ActivityRecordError(e.to_string()))?;

        sqlx::query(
            "INSERT INTO activity_log (id, lead_id, actor_id, action, entity_type, entity_id,
                                       new_value, recorded_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.id)
        .bind(&entry.lead_id.0)
        .bind(&entry.actor_id.0)
        .bind(entry.action.as_str())
        .bind(&entry.entity_type)
        .bind(&entry.entity_id)
        .bind(&new_value)
        .bind(entry.recorded_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| ActivityRecordError(e.to_string()))?;

        Ok(())
    }
}
