use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::lead::{ActorId, LeadId};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentCategory(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub String);

impl DocumentId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    PendingReview,
    Valid,
    Rejected,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingReview => "pending_review",
            Self::Valid => "valid",
            Self::Rejected => "rejected",
        }
    }
}

/// A customer or back-office upload tied to a lead. Only submitted documents
/// that passed review count towards the completion gate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub lead_id: LeadId,
    pub category: DocumentCategory,
    pub file_ref: String,
    pub is_submitted: bool,
    pub status: DocumentStatus,
    pub uploaded_by: ActorId,
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn satisfies_gate(&self) -> bool {
        self.is_submitted && self.status == DocumentStatus::Valid
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{Document, DocumentCategory, DocumentId, DocumentStatus};
    use crate::domain::lead::{ActorId, LeadId};

    fn document(is_submitted: bool, status: DocumentStatus) -> Document {
        Document {
            id: DocumentId("doc-1".to_string()),
            lead_id: LeadId("lead-1".to_string()),
            category: DocumentCategory("aadhaar_card".to_string()),
            file_ref: "uploads/lead-1/aadhaar.pdf".to_string(),
            is_submitted,
            status,
            uploaded_by: ActorId("actor-1".to_string()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn only_submitted_valid_documents_satisfy_the_gate() {
        assert!(document(true, DocumentStatus::Valid).satisfies_gate());
        assert!(!document(false, DocumentStatus::Valid).satisfies_gate());
        assert!(!document(true, DocumentStatus::PendingReview).satisfies_gate());
        assert!(!document(true, DocumentStatus::Rejected).satisfies_gate());
    }
}
