use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::lead::{ActorId, LeadId};

/// Tag describing which timeline mutation produced an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    CompleteStep,
    SkipStep,
    AdminOverrideComplete,
    AdminOverrideSkip,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CompleteStep => "complete_step",
            Self::SkipStep => "skip_step",
            Self::AdminOverrideComplete => "admin_override_complete",
            Self::AdminOverrideSkip => "admin_override_skip",
        }
    }
}

/// Append-only audit record. Immutable once written; exactly one entry is
/// recorded per successful timeline mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: String,
    pub lead_id: LeadId,
    pub actor_id: ActorId,
    pub action: ActivityAction,
    pub entity_type: String,
    pub entity_id: String,
    pub new_value: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}

impl ActivityEntry {
    pub fn new(
        lead_id: LeadId,
        actor_id: ActorId,
        action: ActivityAction,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        new_value: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            lead_id,
            actor_id,
            action,
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            new_value,
            recorded_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("activity record failed: {0}")]
pub struct ActivityRecordError(pub String);

/// Sink for the audit trail. A failing sink degrades observability only;
/// callers log the error and keep the timeline mutation that triggered it.
#[async_trait]
pub trait ActivityRecorder: Send + Sync {
    async fn record(&self, entry: ActivityEntry) -> Result<(), ActivityRecordError>;
}

#[derive(Clone, Default)]
pub struct InMemoryActivityRecorder {
    entries: Arc<Mutex<Vec<ActivityEntry>>>,
}

impl InMemoryActivityRecorder {
    pub fn entries(&self) -> Vec<ActivityEntry> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl ActivityRecorder for InMemoryActivityRecorder {
    async fn record(&self, entry: ActivityEntry) -> Result<(), ActivityRecordError> {
        match self.entries.lock() {
            Ok(mut entries) => entries.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
        Ok(())
    }
}
