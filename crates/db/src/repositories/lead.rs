use chrono::{DateTime, Utc};
use sqlx::Row;

use helioflow_core::domain::lead::{ActorId, Lead, LeadId};

use super::{LeadRepository, RepositoryError};
use crate::DbPool;

pub struct SqlLeadRepository {
    pool: DbPool,
}

impl SqlLeadRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_lead(row: &sqlx::sqlite::SqliteRow) -> Result<Lead, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let customer_name: String =
        row.try_get("customer_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let site_address: String =
        row.try_get("site_address").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_by: String =
        row.try_get("created_by").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("created_at: {e}")))?;

    Ok(Lead {
        id: LeadId(id),
        customer_name,
        site_address,
        created_by: ActorId(created_by),
        created_at,
    })
}

#[async_trait::async_trait]
impl LeadRepository for SqlLeadRepository {
    async fn find_by_id(&self, id: &LeadId) -> Result<Option<Lead>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, customer_name, site_address, created_by, created_at
             FROM lead WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_lead(r)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, lead: Lead) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO lead (id, customer_name, site_address, created_by, created_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 customer_name = excluded.customer_name,
                 site_address = excluded.site_address",
        )
        .bind(&lead.id.0)
        .bind(&lead.customer_name)
        .bind(&lead.site_address)
        .bind(&lead.created_by.0)
        .bind(lead.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use helioflow_core::domain::lead::{ActorId, Lead, LeadId};

    use super::SqlLeadRepository;
    use crate::repositories::LeadRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    #[tokio::test]
    async fn save_and_find_by_id() {
        let pool = setup().await;
        let repo = SqlLeadRepository::new(pool);

        let lead = Lead {
            id: LeadId("lead-1".to_string()),
            customer_name: "Asha Deshmukh".to_string(),
            site_address: "14 MG Road, Pune".to_string(),
            created_by: ActorId("agent-7".to_string()),
            created_at: Utc::now(),
        };
        repo.save(lead.clone()).await.expect("save");

        let found = repo.find_by_id(&LeadId("lead-1".to_string())).await.expect("find");
        let found = found.expect("should exist");
        assert_eq!(found.customer_name, "Asha Deshmukh");
        assert_eq!(found.created_by, ActorId("agent-7".to_string()));
    }

    #[tokio::test]
    async fn missing_lead_is_none() {
        let pool = setup().await;
        let repo = SqlLeadRepository::new(pool);

        let found = repo.find_by_id(&LeadId("nope".to_string())).await.expect("find");
        assert!(found.is_none());
    }
}
