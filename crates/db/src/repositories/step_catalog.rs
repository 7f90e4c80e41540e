use std::collections::BTreeSet;

use chrono::Utc;
use sqlx::Row;

use helioflow_core::domain::document::DocumentCategory;
use helioflow_core::domain::role::Role;
use helioflow_core::domain::step::{NewStepDefinition, StepDefinition, StepDefinitionId};

use super::{RepositoryError, StepCatalogRepository};
use crate::DbPool;

/// Spacing between appended `order_index` values; leaves room for future
/// mid-sequence inserts without renumbering.
const ORDER_INDEX_STRIDE: i64 = 1000;

pub struct SqlStepCatalogRepository {
    pool: DbPool,
}

impl SqlStepCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode_roles(raw: &str) -> Result<BTreeSet<Role>, RepositoryError> {
    serde_json::from_str::<BTreeSet<Role>>(raw)
        .map_err(|e| RepositoryError::Decode(format!("allowed_roles: {e}")))
}

pub(crate) fn row_to_definition(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<StepDefinition, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
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

    Ok(StepDefinition {
        id: StepDefinitionId(id),
        name,
        order_index,
        allowed_roles: decode_roles(&allowed_roles_raw)?,
        remarks_required,
        attachments_allowed,
        customer_upload_allowed,
    })
}

#[async_trait::async_trait]
impl StepCatalogRepository for SqlStepCatalogRepository {
    async fn list(&self) -> Result<Vec<StepDefinition>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, name, order_index, allowed_roles, remarks_required,
                    attachments_allowed, customer_upload_allowed
             FROM step_definition ORDER BY order_index ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_definition).collect::<Result<Vec<_>, _>>()
    }

    async fn find_by_id(
        &self,
        id: &StepDefinitionId,
    ) -> Result<Option<StepDefinition>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, order_index, allowed_roles, remarks_required,
                    attachments_allowed, customer_upload_allowed
             FROM step_definition WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_definition(r)?)),
            None => Ok(None),
        }
    }

    async fn create(
        &self,
        definition: NewStepDefinition,
    ) -> Result<StepDefinition, RepositoryError> {
        let allowed_roles = serde_json::to_string(&definition.allowed_roles)
            .map_err(|e| RepositoryError::Decode(format!("allowed_roles: {e}")))?;

        let mut tx = self.pool.begin().await?;

        // max + stride inside the transaction so two concurrent creates
        // cannot claim the same index.
        let max_order: Option<i64> =
            sqlx::query_scalar("SELECT MAX(order_index) FROM step_definition")
                .fetch_one(&mut *tx)
                .await?;
        let order_index = max_order.unwrap_or(0) + ORDER_INDEX_STRIDE;

        let id = StepDefinitionId::generate();
        sqlx::query(
            "INSERT INTO step_definition (id, name, order_index, allowed_roles,
                                          remarks_required, attachments_allowed,
                                          customer_upload_allowed, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id.0)
        .bind(&definition.name)
        .bind(order_index)
        .bind(&allowed_roles)
        .bind(definition.remarks_required)
        .bind(definition.attachments_allowed)
        .bind(definition.customer_upload_allowed)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;

        for category in &definition.required_documents {
            sqlx::query(
                "INSERT INTO step_required_document (step_definition_id, document_category)
                 VALUES (?, ?)",
            )
            .bind(&id.0)
            .bind(&category.0)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(StepDefinition {
            id,
            name: definition.name,
            order_index,
            allowed_roles: definition.allowed_roles,
            remarks_required: definition.remarks_required,
            attachments_allowed: definition.attachments_allowed,
            customer_upload_allowed: definition.customer_upload_allowed,
        })
    }

    async fn required_documents(
        &self,
        id: &StepDefinitionId,
    ) -> Result<Vec<DocumentCategory>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT document_category FROM step_required_document
             WHERE step_definition_id = ? ORDER BY document_category ASC",
        )
        .bind(&id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                row.try_get::<String, _>("document_category")
                    .map(DocumentCategory)
                    .map_err(|e| RepositoryError::Decode(e.to_string()))
            })
            .collect()
    }
}
