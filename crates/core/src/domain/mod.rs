pub mod document;
pub mod lead;
pub mod role;
pub mod step;

pub use document::{Document, DocumentCategory, DocumentId, DocumentStatus};
pub use lead::{ActorId, Lead, LeadId};
pub use role::{Role, UnknownRole};
pub use step::{
    AttachmentRef, LeadStepInstance, NewStepDefinition, StepDefinition, StepDefinitionId,
    StepInstanceId, StepStatus,
};
