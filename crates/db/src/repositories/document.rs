use chrono::{DateTime, Utc};
use sqlx::Row;

use helioflow_core::domain::document::{Document, DocumentCategory, DocumentId, DocumentStatus};
use helioflow_core::domain::lead::{ActorId, LeadId};

use super::{DocumentRepository, RepositoryError};
use crate::DbPool;

pub struct SqlDocumentRepository {
    pool: DbPool,
}

impl SqlDocumentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn parse_status(raw: &str) -> Result<DocumentStatus, RepositoryError> {
    match raw {
        "pending_review" => Ok(DocumentStatus::PendingReview),
        "valid" => Ok(DocumentStatus::Valid),
        "rejected" => Ok(DocumentStatus::Rejected),
        other => Err(RepositoryError::Decode(format!("unknown document status `{other}`"))),
    }
}

fn row_to_document(row: &sqlx::sqlite::SqliteRow) -> Result<Document, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let lead_id: String =
        row.try_get("lead_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let category: String =
        row.try_get("category").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let file_ref: String =
        row.try_get("file_ref").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let is_submitted: bool =
        row.try_get("is_submitted").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status_str: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let uploaded_by: String =
        row.try_get("uploaded_by").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("created_at: {e}")))?;

    Ok(Document {
        id: DocumentId(id),
        lead_id: LeadId(lead_id),
        category: DocumentCategory(category),
        file_ref,
        is_submitted,
        status: parse_status(&status_str)?,
        uploaded_by: ActorId(uploaded_by),
        created_at,
    })
}

#[async_trait::async_trait]
impl DocumentRepository for SqlDocumentRepository {
    async fn save(&self, document: Document) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO document (id, lead_id, category, file_ref, is_submitted, status,
                                   uploaded_by, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 file_ref = excluded.file_ref,
                 is_submitted = excluded.is_submitted,
                 status = excluded.status",
        )
        .bind(&document.id.0)
        .bind(&document.lead_id.0)
        .bind(&document.category.0)
        .bind(&document.file_ref)
        .bind(document.is_submitted)
        .bind(document.status.as_str())
        .bind(&document.uploaded_by.0)
        .bind(document.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_for_lead(&self, lead_id: &LeadId) -> Result<Vec<Document>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, lead_id, category, file_ref, is_submitted, status, uploaded_by, created_at
             FROM document WHERE lead_id = ? ORDER BY created_at DESC",
        )
        .bind(&lead_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_document).collect::<Result<Vec<_>, _>>()
    }

    async fn missing_valid_categories(
        &self,
        lead_id: &LeadId,
        required: &[DocumentCategory],
    ) -> Result<Vec<DocumentCategory>, RepositoryError> {
        let mut missing = Vec::new();
        for category in required {
            let present: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM document
                 WHERE lead_id = ? AND category = ? AND is_submitted = 1 AND status = 'valid'",
            )
            .bind(&lead_id.0)
            .bind(&category.0)
            .fetch_one(&self.pool)
            .await?;

            if present == 0 {
                missing.push(category.clone());
            }
        }
        Ok(missing)
    }
}
