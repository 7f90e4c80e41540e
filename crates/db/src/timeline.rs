//! Transactional orchestration of the timeline engine.
//!
//! Every mutation runs the pure engine checks against rows loaded inside a
//! single database transaction, applies the resulting plan with an optimistic
//! status guard, and activates the successor before committing. The activity
//! trail is written after commit; a failing trail write is logged and
//! swallowed so audit degradation never costs availability.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use sqlx::Row;
use thiserror::Error;
use tracing::warn;

use helioflow_core::activity::{ActivityEntry, ActivityRecorder};
use helioflow_core::domain::document::DocumentCategory;
use helioflow_core::domain::lead::{ActorId, LeadId};
use helioflow_core::domain::role::Role;
use helioflow_core::domain::step::{
    AttachmentRef, LeadStepInstance, StepDefinition, StepDefinitionId, StepInstanceId, StepStatus,
};
use helioflow_core::errors::TimelineError;
use helioflow_core::timeline::{CompletionKind, CompletionRequest, TimelineEngine};

use crate::repositories::{RepositoryError, SqlActivityRecorder};
use crate::DbPool;

#[derive(Debug, Error)]
pub enum TimelineServiceError {
    #[error("{entity} `{id}` was not found")]
    NotFound { entity: &'static str, id: String },
    #[error(transparent)]
    Timeline(#[from] TimelineError),
}

impl From<sqlx::Error> for TimelineServiceError {
    fn from(error: sqlx::Error) -> Self {
        Self::Timeline(TimelineError::Database(error.to_string()))
    }
}

impl From<RepositoryError> for TimelineServiceError {
    fn from(error: RepositoryError) -> Self {
        Self::Timeline(TimelineError::Database(error.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InitializeOutcome {
    pub created_count: u32,
    pub already_initialized: bool,
}

/// Actor input for a complete or skip call; the service decides the
/// completion kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepAction {
    pub actor: ActorId,
    pub actor_role: Role,
    pub remarks: Option<String>,
    pub attachments: Vec<AttachmentRef>,
    pub admin_override: bool,
}

/// Read projection for timeline display: instance state with the definition
/// fields flattened in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TimelineStepView {
    pub instance_id: StepInstanceId,
    pub step_definition_id: StepDefinitionId,
    pub name: String,
    pub order_index: i64,
    pub allowed_roles: BTreeSet<Role>,
    pub remarks_required: bool,
    pub attachments_allowed: bool,
    pub customer_upload_allowed: bool,
    pub status: StepStatus,
    pub completed_by: Option<ActorId>,
    pub completed_at: Option<DateTime<Utc>>,
    pub remarks: Option<String>,
    pub attachments: Vec<AttachmentRef>,
}

pub struct TimelineService {
    pool: DbPool,
    engine: TimelineEngine,
    recorder: Arc<dyn ActivityRecorder>,
}

impl TimelineService {
    pub fn new(pool: DbPool) -> Self {
        let recorder = Arc::new(SqlActivityRecorder::new(pool.clone()));
        Self { pool, engine: TimelineEngine, recorder }
    }

    pub fn with_recorder(pool: DbPool, recorder: Arc<dyn ActivityRecorder>) -> Self {
        Self { pool, engine: TimelineEngine, recorder }
    }

    /// Instantiates the catalog for a lead: one instance per definition, the
    /// lowest `order_index` pending, the rest upcoming. Idempotent — callers
    /// may invoke it opportunistically right after lead creation.
    pub async fn initialize(
        &self,
        lead_id: &LeadId,
    ) -> Result<InitializeOutcome, TimelineServiceError> {
        let mut tx = self.pool.begin().await?;

        let lead_exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lead WHERE id = ?")
            .bind(&lead_id.0)
            .fetch_one(&mut *tx)
            .await?;
        if lead_exists == 0 {
            return Err(TimelineServiceError::NotFound {
                entity: "lead",
                id: lead_id.0.clone(),
            });
        }

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lead_step WHERE lead_id = ?")
            .bind(&lead_id.0)
            .fetch_one(&mut *tx)
            .await?;
        if existing > 0 {
            return Ok(InitializeOutcome { created_count: 0, already_initialized: true });
        }

        let definition_ids: Vec<String> =
            sqlx::query_scalar("SELECT id FROM step_definition ORDER BY order_index ASC")
                .fetch_all(&mut *tx)
                .await?;
        if definition_ids.is_empty() {
            return Err(TimelineError::Database(
                "step catalog is empty; cannot initialize a timeline".to_string(),
            )
            .into());
        }

        let now = Utc::now().to_rfc3339();
        for (position, definition_id) in definition_ids.iter().enumerate() {
            sqlx::query(
                "INSERT INTO lead_step (id, lead_id, step_definition_id, status, attachments,
                                        created_at)
                 VALUES (?, ?, ?, ?, '[]', ?)",
            )
            .bind(StepInstanceId::generate().0)
            .bind(&lead_id.0)
            .bind(definition_id)
            .bind(TimelineEngine::initial_status(position).as_str())
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(InitializeOutcome {
            created_count: definition_ids.len() as u32,
            already_initialized: false,
        })
    }

    pub async fn complete_step(
        &self,
        lead_id: &LeadId,
        instance_id: &StepInstanceId,
        action: StepAction,
    ) -> Result<LeadStepInstance, TimelineServiceError> {
        self.apply(lead_id, instance_id, CompletionKind::Complete, action).await
    }

    pub async fn skip_step(
        &self,
        lead_id: &LeadId,
        instance_id: &StepInstanceId,
        action: StepAction,
    ) -> Result<LeadStepInstance, TimelineServiceError> {
        self.apply(lead_id, instance_id, CompletionKind::Skip, action).await
    }

    async fn apply(
        &self,
        lead_id: &LeadId,
        instance_id: &StepInstanceId,
        kind: CompletionKind,
        action: StepAction,
    ) -> Result<LeadStepInstance, TimelineServiceError> {
        let request = CompletionRequest {
            actor: action.actor,
            actor_role: action.actor_role,
            kind,
            remarks: action.remarks,
            attachments: action.attachments,
            admin_override: action.admin_override,
        };

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT ls.id AS instance_id, ls.lead_id, ls.step_definition_id, ls.status,
                    ls.completed_by, ls.completed_at, ls.remarks, ls.attachments,
                    sd.name, sd.order_index, sd.allowed_roles, sd.remarks_required,
                    sd.attachments_allowed, sd.customer_upload_allowed
             FROM lead_step ls
             JOIN step_definition sd ON sd.id = ls.step_definition_id
             WHERE ls.id = ? AND ls.lead_id = ?",
        )
        .bind(&instance_id.0)
        .bind(&lead_id.0)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Err(TimelineServiceError::NotFound {
                entity: "step instance",
                id: instance_id.0.clone(),
            });
        };
        let (instance, definition) = decode_timeline_row(&row)?;

        // The document gate only applies to a non-override completion, so
        // the lookup is skipped everywhere else.
        let missing_documents = if kind == CompletionKind::Complete && !request.admin_override {
            self.missing_documents(&mut tx, lead_id, &definition.id).await?
        } else {
            Vec::new()
        };

        let plan = self.engine.plan(
            &definition,
            &instance,
            &request,
            &missing_documents,
            Utc::now(),
        )?;

        let attachments_json = serde_json::to_string(&plan.attachments)
            .map_err(|e| TimelineError::Database(e.to_string()))?;
        let updated = sqlx::query(
            "UPDATE lead_step
             SET status = ?, completed_by = ?, completed_at = ?, remarks = ?, attachments = ?
             WHERE id = ? AND status = ?",
        )
        .bind(plan.new_status.as_str())
        .bind(&plan.completed_by.0)
        .bind(plan.completed_at.to_rfc3339())
        .bind(&plan.remarks)
        .bind(&attachments_json)
        .bind(&instance.id.0)
        .bind(instance.status.as_str())
        .execute(&mut *tx)
        .await?;

        // Optimistic guard: a concurrent writer that finished first leaves
        // zero rows to update, and the caller sees a clean conflict.
        if updated.rows_affected() == 0 {
            return Err(TimelineError::AlreadyCompleted {
                instance: instance.id.clone(),
                status: instance.status,
            }
            .into());
        }

        self.activate_successor(&mut tx, lead_id, definition.order_index).await?;

        tx.commit().await?;

        let completed = LeadStepInstance {
            id: instance.id,
            lead_id: instance.lead_id,
            step_definition_id: instance.step_definition_id,
            status: plan.new_status,
            completed_by: Some(plan.completed_by.clone()),
            completed_at: Some(plan.completed_at),
            remarks: plan.remarks.clone(),
            attachments: plan.attachments.clone(),
        };

        let entry = ActivityEntry::new(
            lead_id.clone(),
            plan.completed_by,
            plan.action,
            "lead_step",
            completed.id.0.clone(),
            json!({
                "step": definition.name,
                "status": plan.new_status.as_str(),
                "remarks": plan.remarks,
                "attachments": plan.attachments,
            }),
        );
        if let Err(error) = self.recorder.record(entry).await {
            warn!(
                event_name = "timeline.activity_record_failed",
                lead_id = %lead_id.0,
                step_instance_id = %completed.id.0,
                error = %error,
                "activity trail write failed; timeline mutation kept"
            );
        }

        Ok(completed)
    }

    /// Ordered read projection for display: one view per instance, sorted by
    /// catalog order.
    pub async fn list_steps(
        &self,
        lead_id: &LeadId,
    ) -> Result<Vec<TimelineStepView>, TimelineServiceError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT ls.id AS instance_id, ls.lead_id, ls.step_definition_id, ls.status,
                    ls.completed_by, ls.completed_at, ls.remarks, ls.attachments,
                    sd.name, sd.order_index, sd.allowed_roles, sd.remarks_required,
                    sd.attachments_allowed, sd.customer_upload_allowed
             FROM lead_step ls
             JOIN step_definition sd ON sd.id = ls.step_definition_id
             WHERE ls.lead_id = ?
             ORDER BY sd.order_index ASC",
        )
        .bind(&lead_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let (instance, definition) = decode_timeline_row(row)?;
                Ok(TimelineStepView {
                    instance_id: instance.id,
                    step_definition_id: definition.id,
                    name: definition.name,
                    order_index: definition.order_index,
                    allowed_roles: definition.allowed_roles,
                    remarks_required: definition.remarks_required,
                    attachments_allowed: definition.attachments_allowed,
                    customer_upload_allowed: definition.customer_upload_allowed,
                    status: instance.status,
                    completed_by: instance.completed_by,
                    completed_at: instance.completed_at,
                    remarks: instance.remarks,
                    attachments: instance.attachments,
                })
            })
            .collect()
    }

    async fn missing_documents(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        lead_id: &LeadId,
        definition_id: &StepDefinitionId,
    ) -> Result<Vec<DocumentCategory>, TimelineServiceError> {
        let required: Vec<String> = sqlx::query_scalar(
            "SELECT document_category FROM step_required_document
             WHERE step_definition_id = ? ORDER BY document_category ASC",
        )
        .bind(&definition_id.0)
        .fetch_all(&mut **tx)
        .await?;

        let mut missing = Vec::new();
        for category in required {
            let present: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM document
                 WHERE lead_id = ? AND category = ? AND is_submitted = 1 AND status = 'valid'",
            )
            .bind(&lead_id.0)
            .bind(&category)
            .fetch_one(&mut **tx)
            .await?;
            if present == 0 {
                missing.push(DocumentCategory(category));
            }
        }
        Ok(missing)
    }

    /// Transitions the immediate successor upcoming → pending within the
    /// caller's transaction. An already-activated or terminal successor is
    /// left untouched.
    async fn activate_successor(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        lead_id: &LeadId,
        completed_order: i64,
    ) -> Result<(), TimelineServiceError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT ls.id, ls.status, sd.order_index
             FROM lead_step ls
             JOIN step_definition sd ON sd.id = ls.step_definition_id
             WHERE ls.lead_id = ?
             ORDER BY sd.order_index ASC",
        )
        .bind(&lead_id.0)
        .fetch_all(&mut **tx)
        .await?;

        let mut ids = Vec::with_capacity(rows.len());
        let mut steps = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: String =
                row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
            let status_str: String =
                row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
            let order_index: i64 =
                row.try_get("order_index").map_err(|e| RepositoryError::Decode(e.to_string()))?;
            ids.push(id);
            steps.push((order_index, parse_step_status(&status_str)?));
        }

        if let Some(position) = TimelineEngine::successor_to_activate(&steps, completed_order) {
            sqlx::query("UPDATE lead_step SET status = 'pending' WHERE id = ? AND status = 'upcoming'")
                .bind(&ids[position])
                .execute(&mut **tx)
                .await?;
        }
        Ok(())
    }
}

fn parse_step_status(raw: &str) -> Result<StepStatus, RepositoryError> {
    match raw {
        "upcoming" => Ok(StepStatus::Upcoming),
        "pending" => Ok(StepStatus::Pending),
        "completed" => Ok(StepStatus::Completed),
        "skipped" => Ok(StepStatus::Skipped),
        other => Err(RepositoryError::Decode(format!("unknown step status `{other}`"))),
    }
}

fn decode_timeline_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<(LeadStepInstance, StepDefinition), RepositoryError> {
    let instance_id: String =
        row.try_get("instance_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let lead_id: String =
        row.try_get("lead_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let step_definition_id: String =
        row.try_get("step_definition_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status_str: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let completed_by: Option<String> =
        row.try_get("completed_by").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let completed_at_str: Option<String> =
        row.try_get("completed_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let remarks: Option<String> =
        row.try_get("remarks").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let attachments_raw: String =
        row.try_get("attachments").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let order_index: i64 =
        row.try_get("order_index").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let allowed_roles_raw: String =
        row.try_get("allowed_roles").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let remarks_required: bool =
        row.try_get("remarks_required").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let attachments_allowed: bool =
        row.try_get("attachments_allowed").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let customer_upload_allowed: bool = row
        .try_get("customer_upload_allowed")
        .map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let completed_at = completed_at_str
        .as_deref()
        .map(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| RepositoryError::Decode(format!("completed_at: {e}")))
        })
        .transpose()?;
    let attachments: Vec<AttachmentRef> = serde_json::from_str(&attachments_raw)
        .map_err(|e| RepositoryError::Decode(format!("attachments: {e}")))?;
    let allowed_roles: BTreeSet<Role> = serde_json::from_str(&allowed_roles_raw)
        .map_err(|e| RepositoryError::Decode(format!("allowed_roles: {e}")))?;

    let instance = LeadStepInstance {
        id: StepInstanceId(instance_id),
        lead_id: LeadId(lead_id),
        step_definition_id: StepDefinitionId(step_definition_id.clone()),
        status: parse_step_status(&status_str)?,
        completed_by: completed_by.map(ActorId),
        completed_at,
        remarks,
        attachments,
    };
    let definition = StepDefinition {
        id: StepDefinitionId(step_definition_id),
        name,
        order_index,
        allowed_roles,
        remarks_required,
        attachments_allowed,
        customer_upload_allowed,
    };

    Ok((instance, definition))
}
