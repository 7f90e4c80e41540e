use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::document::DocumentCategory;
use crate::domain::lead::{ActorId, LeadId};
use crate::domain::role::Role;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepDefinitionId(pub String);

impl StepDefinitionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepInstanceId(pub String);

impl StepInstanceId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Upcoming,
    Pending,
    Completed,
    Skipped,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Skipped => "skipped",
        }
    }

    /// Completed and skipped instances never change status again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Skipped)
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Admin-authored catalog entry describing one stage of the installation
/// lifecycle. `order_index` values are spaced by 1000 so a mid-sequence
/// insert never requires renumbering existing definitions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDefinition {
    pub id: StepDefinitionId,
    pub name: String,
    pub order_index: i64,
    pub allowed_roles: BTreeSet<Role>,
    pub remarks_required: bool,
    pub attachments_allowed: bool,
    pub customer_upload_allowed: bool,
}

impl StepDefinition {
    pub fn allows(&self, role: Role) -> bool {
        self.allowed_roles.contains(&role)
    }
}

/// Catalog creation input; the repository assigns `id` and `order_index`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStepDefinition {
    pub name: String,
    pub allowed_roles: BTreeSet<Role>,
    pub remarks_required: bool,
    pub attachments_allowed: bool,
    pub customer_upload_allowed: bool,
    #[serde(default)]
    pub required_documents: Vec<DocumentCategory>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttachmentRef(pub String);

/// Per-lead instantiation of a catalog entry with live status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadStepInstance {
    pub id: StepInstanceId,
    pub lead_id: LeadId,
    pub step_definition_id: StepDefinitionId,
    pub status: StepStatus,
    pub completed_by: Option<ActorId>,
    pub completed_at: Option<DateTime<Utc>>,
    pub remarks: Option<String>,
    pub attachments: Vec<AttachmentRef>,
}
