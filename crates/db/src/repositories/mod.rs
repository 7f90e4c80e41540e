use async_trait::async_trait;
use thiserror::Error;

use helioflow_core::domain::document::{Document, DocumentCategory};
use helioflow_core::domain::lead::{Lead, LeadId};
use helioflow_core::domain::step::{NewStepDefinition, StepDefinition, StepDefinitionId};

pub mod activity;
pub mod document;
pub mod lead;
pub mod step_catalog;

pub use activity::SqlActivityRecorder;
pub use document::SqlDocumentRepository;
pub use lead::SqlLeadRepository;
pub use step_catalog::SqlStepCatalogRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait LeadRepository: Send + Sync {
    async fn find_by_id(&self, id: &LeadId) -> Result<Option<Lead>, RepositoryError>;
    async fn save(&self, lead: Lead) -> Result<(), RepositoryError>;
}

/// Read-mostly catalog of step definitions. `create` is admin-only; the
/// check lives with the caller because the repository has no actor context.
#[async_trait]
pub trait StepCatalogRepository: Send + Sync {
    /// All definitions, ordered by `order_index` ascending.
    async fn list(&self) -> Result<Vec<StepDefinition>, RepositoryError>;

    async fn find_by_id(
        &self,
        id: &StepDefinitionId,
    ) -> Result<Option<StepDefinition>, RepositoryError>;

    /// Appends a definition with `order_index = max + 1000`, leaving room
    /// for future mid-sequence inserts without renumbering.
    async fn create(&self, definition: NewStepDefinition) -> Result<StepDefinition, RepositoryError>;

    async fn required_documents(
        &self,
        id: &StepDefinitionId,
    ) -> Result<Vec<DocumentCategory>, RepositoryError>;
}

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn save(&self, document: Document) -> Result<(), RepositoryError>;

    async fn list_for_lead(&self, lead_id: &LeadId) -> Result<Vec<Document>, RepositoryError>;

    /// Required categories with no submitted+valid document for the lead.
    async fn missing_valid_categories(
        &self,
        lead_id: &LeadId,
        required: &[DocumentCategory],
    ) -> Result<Vec<DocumentCategory>, RepositoryError>;
}
