//! Demo seed data: the standard rooftop-solar step catalog plus one sample
//! lead with an initialized timeline. Used by `helioflow seed` and by local
//! development setups.

use std::collections::BTreeSet;

use chrono::Utc;
use tracing::info;

use helioflow_core::domain::document::DocumentCategory;
use helioflow_core::domain::lead::{ActorId, Lead, LeadId};
use helioflow_core::domain::role::Role;
use helioflow_core::domain::step::NewStepDefinition;

use crate::repositories::{
    LeadRepository, RepositoryError, SqlLeadRepository, SqlStepCatalogRepository,
    StepCatalogRepository,
};
use crate::timeline::{TimelineService, TimelineServiceError};
use crate::DbPool;

struct CatalogSeed {
    name: &'static str,
    allowed_roles: &'static [Role],
    remarks_required: bool,
    attachments_allowed: bool,
    customer_upload_allowed: bool,
    required_documents: &'static [&'static str],
}

/// The standard residential installation pipeline, in order. `order_index`
/// spacing is assigned by the catalog repository at insert time.
const CATALOG: &[CatalogSeed] = &[
    CatalogSeed {
        name: "KYC",
        allowed_roles: &[Role::Agent],
        remarks_required: false,
        attachments_allowed: true,
        customer_upload_allowed: true,
        required_documents: &["aadhaar_card", "electricity_bill"],
    },
    CatalogSeed {
        name: "Site Survey",
        allowed_roles: &[Role::Surveyor],
        remarks_required: true,
        attachments_allowed: true,
        customer_upload_allowed: false,
        required_documents: &[],
    },
    CatalogSeed {
        name: "Quotation",
        allowed_roles: &[Role::Agent, Role::Accounts],
        remarks_required: false,
        attachments_allowed: true,
        customer_upload_allowed: false,
        required_documents: &[],
    },
    CatalogSeed {
        name: "Subsidy Documents",
        allowed_roles: &[Role::Agent],
        remarks_required: false,
        attachments_allowed: true,
        customer_upload_allowed: true,
        required_documents: &["subsidy_application", "bank_passbook"],
    },
    CatalogSeed {
        name: "Materials Dispatch",
        allowed_roles: &[Role::Dispatch],
        remarks_required: true,
        attachments_allowed: true,
        customer_upload_allowed: false,
        required_documents: &[],
    },
    CatalogSeed {
        name: "Installation",
        allowed_roles: &[Role::Installer],
        remarks_required: true,
        attachments_allowed: true,
        customer_upload_allowed: false,
        required_documents: &[],
    },
    CatalogSeed {
        name: "Net Metering",
        allowed_roles: &[Role::Agent, Role::Installer],
        remarks_required: false,
        attachments_allowed: true,
        customer_upload_allowed: false,
        required_documents: &["net_meter_application"],
    },
    CatalogSeed {
        name: "Commissioning",
        allowed_roles: &[Role::Installer],
        remarks_required: true,
        attachments_allowed: true,
        customer_upload_allowed: false,
        required_documents: &[],
    },
];

const DEMO_LEAD_ID: &str = "lead-demo-001";

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct SeedResult {
    pub step_definitions_created: u32,
    pub leads_created: u32,
    pub timeline_steps_created: u32,
    pub already_seeded: bool,
}

/// Seeds the catalog and a demo lead. Safe to call repeatedly: a non-empty
/// catalog short-circuits with `already_seeded`.
pub async fn seed_demo_data(pool: &DbPool) -> Result<SeedResult, TimelineServiceError> {
    let catalog = SqlStepCatalogRepository::new(pool.clone());
    if !catalog.list().await.map_err(repo_err)?.is_empty() {
        return Ok(SeedResult {
            step_definitions_created: 0,
            leads_created: 0,
            timeline_steps_created: 0,
            already_seeded: true,
        });
    }

    for seed in CATALOG {
        catalog
            .create(NewStepDefinition {
                name: seed.name.to_string(),
                allowed_roles: seed.allowed_roles.iter().copied().collect::<BTreeSet<_>>(),
                remarks_required: seed.remarks_required,
                attachments_allowed: seed.attachments_allowed,
                customer_upload_allowed: seed.customer_upload_allowed,
                required_documents: seed
                    .required_documents
                    .iter()
                    .map(|c| DocumentCategory(c.to_string()))
                    .collect(),
            })
            .await
            .map_err(repo_err)?;
    }

    let lead_id = LeadId(DEMO_LEAD_ID.to_string());
    SqlLeadRepository::new(pool.clone())
        .save(Lead {
            id: lead_id.clone(),
            customer_name: "Asha Deshmukh".to_string(),
            site_address: "14 MG Road, Pune, Maharashtra".to_string(),
            created_by: ActorId("seed".to_string()),
            created_at: Utc::now(),
        })
        .await
        .map_err(repo_err)?;

    let outcome = TimelineService::new(pool.clone()).initialize(&lead_id).await?;

    info!(
        event_name = "fixtures.seeded",
        step_definitions = CATALOG.len(),
        lead_id = DEMO_LEAD_ID,
        "seeded demo catalog and lead"
    );

    Ok(SeedResult {
        step_definitions_created: CATALOG.len() as u32,
        leads_created: 1,
        timeline_steps_created: outcome.created_count,
        already_seeded: false,
    })
}

fn repo_err(error: RepositoryError) -> TimelineServiceError {
    TimelineServiceError::from(error)
}
