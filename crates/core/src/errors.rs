use thiserror::Error;

use crate::domain::role::Role;
use crate::domain::step::{StepInstanceId, StepStatus};

/// Error taxonomy for timeline mutations. Every variant aborts before any
/// partial write; callers map variants to transport status codes by tag,
/// never by message text.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TimelineError {
    #[error("role `{role}` is not permitted to act on step `{step}`")]
    NotAuthorized { role: Role, step: String },
    #[error("step instance {} is already {status}", instance.0)]
    AlreadyCompleted { instance: StepInstanceId, status: StepStatus },
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("missing required documents: {categories:?}")]
    MissingDocuments { categories: Vec<String> },
    #[error("database error: {0}")]
    Database(String),
}

impl TimelineError {
    /// Stable tag for log fields and transport mapping.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::NotAuthorized { .. } => "not_authorized",
            Self::AlreadyCompleted { .. } => "already_completed",
            Self::Validation(_) => "validation",
            Self::MissingDocuments { .. } => "missing_documents",
            Self::Database(_) => "database",
        }
    }
}
