use chrono::{DateTime, Utc};

use crate::activity::ActivityAction;
use crate::domain::document::DocumentCategory;
use crate::domain::lead::ActorId;
use crate::domain::role::Role;
use crate::domain::step::{AttachmentRef, LeadStepInstance, StepDefinition, StepStatus};
use crate::errors::TimelineError;

/// Whether the actor is finishing the step or waving it through.
/// Skip is a terminal variant of completion, not a separate lifecycle branch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompletionKind {
    Complete,
    Skip,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionRequest {
    pub actor: ActorId,
    pub actor_role: Role,
    pub kind: CompletionKind,
    pub remarks: Option<String>,
    pub attachments: Vec<AttachmentRef>,
    pub admin_override: bool,
}

/// The mutation to apply once every gate has passed. Producing a plan never
/// touches storage; the caller applies it inside its own transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionPlan {
    pub new_status: StepStatus,
    pub completed_by: ActorId,
    pub completed_at: DateTime<Utc>,
    pub remarks: Option<String>,
    pub attachments: Vec<AttachmentRef>,
    pub action: ActivityAction,
}

/// Pure decision logic for timeline progression: authorization, state
/// preconditions, remarks validation, and the document-completeness gate.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimelineEngine;

impl TimelineEngine {
    /// Status assigned to the instance at `position` in a freshly
    /// instantiated timeline: the first step is actionable, the rest wait.
    pub fn initial_status(position: usize) -> StepStatus {
        if position == 0 {
            StepStatus::Pending
        } else {
            StepStatus::Upcoming
        }
    }

    /// Runs all gates in order and returns the mutation to apply, or the
    /// first gate failure. `missing_documents` lists required categories that
    /// have no valid submitted document for the lead; callers may pass an
    /// empty slice when the gate does not apply (admin override, skip).
    pub fn plan(
        &self,
        definition: &StepDefinition,
        instance: &LeadStepInstance,
        request: &CompletionRequest,
        missing_documents: &[DocumentCategory],
        now: DateTime<Utc>,
    ) -> Result<CompletionPlan, TimelineError> {
        self.authorize(definition, request)?;
        self.check_state(instance, request)?;
        self.check_remarks(definition, request)?;
        self.check_documents(request, missing_documents)?;

        Ok(CompletionPlan {
            new_status: match request.kind {
                CompletionKind::Complete => StepStatus::Completed,
                CompletionKind::Skip => StepStatus::Skipped,
            },
            completed_by: request.actor.clone(),
            completed_at: now,
            remarks: request.remarks.clone(),
            attachments: request.attachments.clone(),
            action: Self::action_for(request.kind, request.admin_override),
        })
    }

    /// Completion is open to the definition's allowed roles plus admin; skip
    /// and the override flag are admin privileges.
    pub fn authorize(
        &self,
        definition: &StepDefinition,
        request: &CompletionRequest,
    ) -> Result<(), TimelineError> {
        let role = request.actor_role;
        let authorized = match request.kind {
            CompletionKind::Complete => definition.allows(role) || role.is_admin(),
            CompletionKind::Skip => role.is_admin(),
        };
        if !authorized || (request.admin_override && !role.is_admin()) {
            return Err(TimelineError::NotAuthorized { role, step: definition.name.clone() });
        }
        Ok(())
    }

    fn check_state(
        &self,
        instance: &LeadStepInstance,
        request: &CompletionRequest,
    ) -> Result<(), TimelineError> {
        match instance.status {
            StepStatus::Pending => Ok(()),
            StepStatus::Upcoming if request.admin_override => Ok(()),
            StepStatus::Upcoming => Err(TimelineError::Validation(format!(
                "step instance {} is not yet active",
                instance.id.0
            ))),
            status => {
                Err(TimelineError::AlreadyCompleted { instance: instance.id.clone(), status })
            }
        }
    }

    fn check_remarks(
        &self,
        definition: &StepDefinition,
        request: &CompletionRequest,
    ) -> Result<(), TimelineError> {
        if !definition.remarks_required {
            return Ok(());
        }
        let supplied =
            request.remarks.as_deref().map(|remarks| !remarks.trim().is_empty()).unwrap_or(false);
        if supplied {
            Ok(())
        } else {
            Err(TimelineError::Validation(format!(
                "remarks are required to complete step `{}`",
                definition.name
            )))
        }
    }

    fn check_documents(
        &self,
        request: &CompletionRequest,
        missing_documents: &[DocumentCategory],
    ) -> Result<(), TimelineError> {
        if request.admin_override || request.kind == CompletionKind::Skip {
            return Ok(());
        }
        if missing_documents.is_empty() {
            return Ok(());
        }
        let mut categories: Vec<String> =
            missing_documents.iter().map(|category| category.0.clone()).collect();
        categories.sort();
        Err(TimelineError::MissingDocuments { categories })
    }

    /// Given `(order_index, status)` pairs for every instance of a lead,
    /// returns the position of the instance to transition upcoming → pending
    /// after the step at `completed_order` reached a terminal status. Only
    /// the immediate successor is considered; an already-activated or
    /// terminal successor is left untouched.
    pub fn successor_to_activate(
        steps: &[(i64, StepStatus)],
        completed_order: i64,
    ) -> Option<usize> {
        let (position, &(_, status)) = steps
            .iter()
            .enumerate()
            .filter(|(_, (order, _))| *order > completed_order)
            .min_by_key(|(_, (order, _))| *order)?;

        match status {
            StepStatus::Upcoming => Some(position),
            _ => None,
        }
    }

    fn action_for(kind: CompletionKind, admin_override: bool) -> ActivityAction {
        match (kind, admin_override) {
            (CompletionKind::Complete, false) => ActivityAction::CompleteStep,
            (CompletionKind::Complete, true) => ActivityAction::AdminOverrideComplete,
            (CompletionKind::Skip, false) => ActivityAction::SkipStep,
            (CompletionKind::Skip, true) => ActivityAction::AdminOverrideSkip,
        }
    }
}
