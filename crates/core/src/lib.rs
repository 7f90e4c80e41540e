pub mod activity;
pub mod config;
pub mod domain;
pub mod errors;
pub mod timeline;

pub use activity::{
    ActivityAction, ActivityEntry, ActivityRecordError, ActivityRecorder, InMemoryActivityRecorder,
};
pub use domain::document::{Document, DocumentCategory, DocumentId, DocumentStatus};
pub use domain::lead::{ActorId, Lead, LeadId};
pub use domain::role::{Role, UnknownRole};
pub use domain::step::{
    AttachmentRef, LeadStepInstance, NewStepDefinition, StepDefinition, StepDefinitionId,
    StepInstanceId, StepStatus,
};
pub use errors::TimelineError;
pub use timeline::{CompletionKind, CompletionPlan, CompletionRequest, TimelineEngine};
