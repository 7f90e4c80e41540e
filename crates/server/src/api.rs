//! HTTP surface for the installation timeline.
//!
//! All routes live under `/api/v1`. Authentication is handled upstream; the
//! caller's identity and role arrive as claims in the request body, and the
//! engine enforces authorization from there. Errors map to status codes by
//! taxonomy tag, never by message text.

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use helioflow_core::domain::document::{Document, DocumentCategory, DocumentId, DocumentStatus};
use helioflow_core::domain::lead::{ActorId, Lead, LeadId};
use helioflow_core::domain::role::Role;
use helioflow_core::domain::step::{AttachmentRef, NewStepDefinition, StepInstanceId};
use helioflow_core::errors::TimelineError;
use helioflow_db::repositories::{
    DocumentRepository, LeadRepository, RepositoryError, SqlActivityRecorder,
    SqlDocumentRepository, SqlLeadRepository, SqlStepCatalogRepository, StepCatalogRepository,
};
use helioflow_db::{DbPool, StepAction, TimelineService, TimelineServiceError};

#[derive(Clone)]
pub struct ApiState {
    db_pool: DbPool,
    timeline: Arc<TimelineService>,
}

impl ApiState {
    pub fn new(db_pool: DbPool) -> Self {
        let timeline = Arc::new(TimelineService::new(db_pool.clone()));
        Self { db_pool, timeline }
    }
}

pub fn router(db_pool: DbPool) -> Router {
    let state = ApiState::new(db_pool);
    Router::new()
        .route("/api/v1/leads", post(create_lead))
        .route("/api/v1/leads/{lead_id}/timeline", get(get_timeline))
        .route("/api/v1/leads/{lead_id}/timeline/initialize", post(initialize_timeline))
        .route("/api/v1/leads/{lead_id}/timeline/{step_id}/complete", post(complete_step))
        .route("/api/v1/leads/{lead_id}/timeline/{step_id}/skip", post(skip_step))
        .route("/api/v1/steps", get(list_steps).post(create_step))
        .route("/api/v1/leads/{lead_id}/documents", post(upload_document))
        .route("/api/v1/leads/{lead_id}/activity", get(get_activity))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_categories: Option<Vec<String>>,
}

type ApiError = (StatusCode, Json<ApiErrorBody>);

fn error_response(error: TimelineServiceError) -> ApiError {
    match error {
        TimelineServiceError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            Json(ApiErrorBody {
                error: "not_found",
                message: format!("{entity} `{id}` was not found"),
                missing_categories: None,
            }),
        ),
        TimelineServiceError::Timeline(inner) => {
            let status = match &inner {
                TimelineError::NotAuthorized { .. } => StatusCode::FORBIDDEN,
                TimelineError::AlreadyCompleted { .. } => StatusCode::CONFLICT,
                TimelineError::Validation(_) | TimelineError::MissingDocuments { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                TimelineError::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            };
            let missing_categories = match &inner {
                TimelineError::MissingDocuments { categories } => Some(categories.clone()),
                _ => None,
            };
            (
                status,
                Json(ApiErrorBody {
                    error: inner.tag(),
                    message: inner.to_string(),
                    missing_categories,
                }),
            )
        }
    }
}

fn repository_error(error: RepositoryError) -> ApiError {
    error_response(TimelineServiceError::from(error))
}

#[derive(Debug, Deserialize)]
pub struct CreateLeadRequest {
    pub customer_name: String,
    pub site_address: String,
    pub actor_id: String,
}

#[derive(Debug, Serialize)]
pub struct CreateLeadResponse {
    pub id: String,
    pub customer_name: String,
    pub site_address: String,
    pub timeline_steps_created: u32,
}

/// Creates a lead and opportunistically initializes its timeline. An empty
/// catalog is not fatal here: the lead is kept and the timeline can be
/// initialized later once steps exist.
async fn create_lead(
    State(state): State<ApiState>,
    Json(request): Json<CreateLeadRequest>,
) -> Result<(StatusCode, Json<CreateLeadResponse>), ApiError> {
    if request.customer_name.trim().is_empty() {
        return Err(validation("customer_name must not be blank"));
    }
    if request.site_address.trim().is_empty() {
        return Err(validation("site_address must not be blank"));
    }

    let lead = Lead {
        id: LeadId::generate(),
        customer_name: request.customer_name,
        site_address: request.site_address,
        created_by: ActorId(request.actor_id),
        created_at: Utc::now(),
    };
    SqlLeadRepository::new(state.db_pool.clone())
        .save(lead.clone())
        .await
        .map_err(repository_error)?;

    let timeline_steps_created = match state.timeline.initialize(&lead.id).await {
        Ok(outcome) => outcome.created_count,
        Err(TimelineServiceError::Timeline(TimelineError::Database(detail))) => {
            tracing::warn!(
                event_name = "api.lead.timeline_deferred",
                lead_id = %lead.id.0,
                detail = %detail,
                "lead created without timeline; initialize it once the catalog exists"
            );
            0
        }
        Err(error) => return Err(error_response(error)),
    };

    info!(
        event_name = "api.lead.created",
        lead_id = %lead.id.0,
        timeline_steps_created,
        "lead created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateLeadResponse {
            id: lead.id.0,
            customer_name: lead.customer_name,
            site_address: lead.site_address,
            timeline_steps_created,
        }),
    ))
}

async fn get_timeline(
    State(state): State<ApiState>,
    Path(lead_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let lead_id = LeadId(lead_id);
    let lead = SqlLeadRepository::new(state.db_pool.clone())
        .find_by_id(&lead_id)
        .await
        .map_err(repository_error)?;
    if lead.is_none() {
        return Err(not_found("lead", &lead_id.0));
    }

    let steps = state.timeline.list_steps(&lead_id).await.map_err(error_response)?;
    Ok(Json(serde_json::json!({ "lead_id": lead_id.0, "steps": steps })))
}

async fn initialize_timeline(
    State(state): State<ApiState>,
    Path(lead_id): Path<String>,
) -> Result<(StatusCode, Json<helioflow_db::InitializeOutcome>), ApiError> {
    let outcome =
        state.timeline.initialize(&LeadId(lead_id)).await.map_err(error_response)?;
    let status =
        if outcome.already_initialized { StatusCode::OK } else { StatusCode::CREATED };
    Ok((status, Json(outcome)))
}

#[derive(Debug, Deserialize)]
pub struct CompleteStepRequest {
    pub actor_id: String,
    pub actor_role: Role,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub attachments: Vec<AttachmentRef>,
    #[serde(default)]
    pub admin_override: bool,
}

async fn complete_step(
    State(state): State<ApiState>,
    Path((lead_id, step_id)): Path<(String, String)>,
    Json(request): Json<CompleteStepRequest>,
) -> Result<Json<helioflow_db::TimelineStepView>, ApiError> {
    let action = StepAction {
        actor: ActorId(request.actor_id),
        actor_role: request.actor_role,
        remarks: request.remarks,
        attachments: request.attachments,
        admin_override: request.admin_override,
    };
    let lead_id = LeadId(lead_id);
    let step_id = StepInstanceId(step_id);

    state
        .timeline
        .complete_step(&lead_id, &step_id, action)
        .await
        .map_err(error_response)?;
    updated_view(&state, &lead_id, &step_id).await
}

#[derive(Debug, Deserialize)]
pub struct SkipStepRequest {
    pub actor_id: String,
    pub actor_role: Role,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub admin_override: bool,
}

async fn skip_step(
    State(state): State<ApiState>,
    Path((lead_id, step_id)): Path<(String, String)>,
    Json(request): Json<SkipStepRequest>,
) -> Result<Json<helioflow_db::TimelineStepView>, ApiError> {
    let action = StepAction {
        actor: ActorId(request.actor_id),
        actor_role: request.actor_role,
        remarks: request.remarks,
        attachments: Vec::new(),
        admin_override: request.admin_override,
    };
    let lead_id = LeadId(lead_id);
    let step_id = StepInstanceId(step_id);

    state.timeline.skip_step(&lead_id, &step_id, action).await.map_err(error_response)?;
    updated_view(&state, &lead_id, &step_id).await
}

/// Re-reads the mutated instance so the response reflects committed state,
/// including any successor activation visible in a follow-up timeline fetch.
async fn updated_view(
    state: &ApiState,
    lead_id: &LeadId,
    step_id: &StepInstanceId,
) -> Result<Json<helioflow_db::TimelineStepView>, ApiError> {
    let steps = state.timeline.list_steps(lead_id).await.map_err(error_response)?;
    steps
        .into_iter()
        .find(|step| &step.instance_id == step_id)
        .map(Json)
        .ok_or_else(|| not_found("step instance", &step_id.0))
}

#[derive(Debug, Serialize)]
pub struct StepDefinitionView {
    pub id: String,
    pub name: String,
    pub order_index: i64,
    pub allowed_roles: BTreeSet<Role>,
    pub remarks_required: bool,
    pub attachments_allowed: bool,
    pub customer_upload_allowed: bool,
    pub required_documents: Vec<String>,
}

async fn list_steps(
    State(state): State<ApiState>,
) -> Result<Json<Vec<StepDefinitionView>>, ApiError> {
    let catalog = SqlStepCatalogRepository::new(state.db_pool.clone());
    let definitions = catalog.list().await.map_err(repository_error)?;

    let mut views = Vec::with_capacity(definitions.len());
    for definition in definitions {
        let required =
            catalog.required_documents(&definition.id).await.map_err(repository_error)?;
        views.push(StepDefinitionView {
            id: definition.id.0,
            name: definition.name,
            order_index: definition.order_index,
            allowed_roles: definition.allowed_roles,
            remarks_required: definition.remarks_required,
            attachments_allowed: definition.attachments_allowed,
            customer_upload_allowed: definition.customer_upload_allowed,
            required_documents: required.into_iter().map(|c| c.0).collect(),
        });
    }
    Ok(Json(views))
}

#[derive(Debug, Deserialize)]
pub struct CreateStepRequest {
    pub actor_role: Role,
    pub name: String,
    pub allowed_roles: BTreeSet<Role>,
    #[serde(default)]
    pub remarks_required: bool,
    #[serde(default = "default_true")]
    pub attachments_allowed: bool,
    #[serde(default)]
    pub customer_upload_allowed: bool,
    #[serde(default)]
    pub required_documents: Vec<String>,
}

fn default_true() -> bool {
    true
}

/// Catalog mutation is an admin-only operation; new definitions always
/// append at the end of the sequence.
async fn create_step(
    State(state): State<ApiState>,
    Json(request): Json<CreateStepRequest>,
) -> Result<(StatusCode, Json<StepDefinitionView>), ApiError> {
    if !request.actor_role.is_admin() {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ApiErrorBody {
                error: "not_authorized",
                message: format!(
                    "role `{}` may not modify the step catalog",
                    request.actor_role
                ),
                missing_categories: None,
            }),
        ));
    }
    if request.name.trim().is_empty() {
        return Err(validation("name must not be blank"));
    }
    if request.allowed_roles.is_empty() {
        return Err(validation("allowed_roles must not be empty"));
    }

    let catalog = SqlStepCatalogRepository::new(state.db_pool.clone());
    let required_documents: Vec<DocumentCategory> =
        request.required_documents.iter().cloned().map(DocumentCategory).collect();
    let created = catalog
        .create(NewStepDefinition {
            name: request.name,
            allowed_roles: request.allowed_roles,
            remarks_required: request.remarks_required,
            attachments_allowed: request.attachments_allowed,
            customer_upload_allowed: request.customer_upload_allowed,
            required_documents: required_documents.clone(),
        })
        .await
        .map_err(repository_error)?;

    info!(
        event_name = "api.step_definition.created",
        step_definition_id = %created.id.0,
        order_index = created.order_index,
        "step definition appended to catalog"
    );

    Ok((
        StatusCode::CREATED,
        Json(StepDefinitionView {
            id: created.id.0,
            name: created.name,
            order_index: created.order_index,
            allowed_roles: created.allowed_roles,
            remarks_required: created.remarks_required,
            attachments_allowed: created.attachments_allowed,
            customer_upload_allowed: created.customer_upload_allowed,
            required_documents: required_documents.into_iter().map(|c| c.0).collect(),
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct UploadDocumentRequest {
    pub category: String,
    pub file_ref: String,
    pub actor_id: String,
    /// Review outcome, if the uploader is also the reviewer. Defaults to
    /// `pending_review`.
    #[serde(default)]
    pub status: Option<DocumentStatus>,
}

#[derive(Debug, Serialize)]
pub struct UploadDocumentResponse {
    pub id: String,
    pub category: String,
    pub status: &'static str,
}

async fn upload_document(
    State(state): State<ApiState>,
    Path(lead_id): Path<String>,
    Json(request): Json<UploadDocumentRequest>,
) -> Result<(StatusCode, Json<UploadDocumentResponse>), ApiError> {
    let lead_id = LeadId(lead_id);
    let lead = SqlLeadRepository::new(state.db_pool.clone())
        .find_by_id(&lead_id)
        .await
        .map_err(repository_error)?;
    if lead.is_none() {
        return Err(not_found("lead", &lead_id.0));
    }
    if request.category.trim().is_empty() {
        return Err(validation("category must not be blank"));
    }
    if request.file_ref.trim().is_empty() {
        return Err(validation("file_ref must not be blank"));
    }

    let document = Document {
        id: DocumentId::generate(),
        lead_id,
        category: DocumentCategory(request.category),
        file_ref: request.file_ref,
        is_submitted: true,
        status: request.status.unwrap_or(DocumentStatus::PendingReview),
        uploaded_by: ActorId(request.actor_id),
        created_at: Utc::now(),
    };
    SqlDocumentRepository::new(state.db_pool.clone())
        .save(document.clone())
        .await
        .map_err(repository_error)?;

    Ok((
        StatusCode::CREATED,
        Json(UploadDocumentResponse {
            id: document.id.0,
            category: document.category.0,
            status: document.status.as_str(),
        }),
    ))
}

async fn get_activity(
    State(state): State<ApiState>,
    Path(lead_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let lead_id = LeadId(lead_id);
    let entries = SqlActivityRecorder::new(state.db_pool.clone())
        .list_for_lead(&lead_id)
        .await
        .map_err(repository_error)?;
    Ok(Json(serde_json::json!({ "lead_id": lead_id.0, "entries": entries })))
}

fn validation(message: &str) -> ApiError {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ApiErrorBody {
            error: "validation",
            message: message.to_string(),
            missing_categories: None,
        }),
    )
}

fn not_found(entity: &'static str, id: &str) -> ApiError {
    error_response(TimelineServiceError::NotFound { entity, id: id.to_string() })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::Json;

    use helioflow_core::domain::document::DocumentStatus;
    use helioflow_core::domain::role::Role;
    use helioflow_db::{connect_with_settings, fixtures, migrations};

    use super::{
        complete_step, create_lead, create_step, initialize_timeline, skip_step, upload_document,
        ApiState, CompleteStepRequest, CreateLeadRequest, CreateStepRequest, SkipStepRequest,
        UploadDocumentRequest,
    };

    async fn setup_state() -> ApiState {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        ApiState::new(pool)
    }

    fn complete_request(role: Role) -> CompleteStepRequest {
        CompleteStepRequest {
            actor_id: "actor-1".to_string(),
            actor_role: role,
            remarks: Some("done".to_string()),
            attachments: Vec::new(),
            admin_override: false,
        }
    }

    async fn seeded_lead(state: &ApiState) -> (String, Vec<helioflow_db::TimelineStepView>) {
        fixtures::seed_demo_data(&state.db_pool).await.expect("seed");
        let (status, Json(lead)) = create_lead(
            State(state.clone()),
            Json(CreateLeadRequest {
                customer_name: "Ravi Kulkarni".to_string(),
                site_address: "7 FC Road, Pune".to_string(),
                actor_id: "agent-1".to_string(),
            }),
        )
        .await
        .expect("create lead");
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(lead.timeline_steps_created, 8);

        let steps = state
            .timeline
            .list_steps(&helioflow_core::domain::lead::LeadId(lead.id.clone()))
            .await
            .expect("list steps");
        (lead.id, steps)
    }

    #[tokio::test]
    async fn create_lead_initializes_the_timeline() {
        let state = setup_state().await;
        let (_, steps) = seeded_lead(&state).await;
        assert_eq!(steps.len(), 8);
    }

    #[tokio::test]
    async fn create_lead_without_catalog_still_creates_the_lead() {
        let state = setup_state().await;
        let (status, Json(lead)) = create_lead(
            State(state.clone()),
            Json(CreateLeadRequest {
                customer_name: "Ravi Kulkarni".to_string(),
                site_address: "7 FC Road, Pune".to_string(),
                actor_id: "agent-1".to_string(),
            }),
        )
        .await
        .expect("lead creation tolerates an empty catalog");
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(lead.timeline_steps_created, 0);
    }

    #[tokio::test]
    async fn initialize_is_idempotent_over_http() {
        let state = setup_state().await;
        let (lead_id, _) = seeded_lead(&state).await;

        let (status, Json(outcome)) =
            initialize_timeline(State(state.clone()), Path(lead_id)).await.expect("initialize");
        assert_eq!(status, StatusCode::OK);
        assert!(outcome.already_initialized);
        assert_eq!(outcome.created_count, 0);
    }

    #[tokio::test]
    async fn unauthorized_completion_maps_to_forbidden() {
        let state = setup_state().await;
        let (lead_id, steps) = seeded_lead(&state).await;
        let survey = steps.iter().find(|s| s.name == "Site Survey").expect("survey step");

        let (status, Json(body)) = complete_step(
            State(state.clone()),
            Path((lead_id, survey.instance_id.0.clone())),
            Json(complete_request(Role::Installer)),
        )
        .await
        .expect_err("installer may not complete a survey");
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body.error, "not_authorized");
    }

    #[tokio::test]
    async fn missing_documents_map_to_unprocessable_with_categories() {
        let state = setup_state().await;
        let (lead_id, steps) = seeded_lead(&state).await;
        let kyc = steps.iter().find(|s| s.name == "KYC").expect("kyc step");

        let (status, Json(body)) = complete_step(
            State(state.clone()),
            Path((lead_id, kyc.instance_id.0.clone())),
            Json(complete_request(Role::Agent)),
        )
        .await
        .expect_err("document gate must block");
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.error, "missing_documents");
        assert_eq!(
            body.missing_categories,
            Some(vec!["aadhaar_card".to_string(), "electricity_bill".to_string()])
        );
    }

    #[tokio::test]
    async fn valid_documents_unblock_completion() {
        let state = setup_state().await;
        let (lead_id, steps) = seeded_lead(&state).await;
        let kyc = steps.iter().find(|s| s.name == "KYC").expect("kyc step");

        for category in ["aadhaar_card", "electricity_bill"] {
            let (status, _) = upload_document(
                State(state.clone()),
                Path(lead_id.clone()),
                Json(UploadDocumentRequest {
                    category: category.to_string(),
                    file_ref: format!("uploads/{category}.pdf"),
                    actor_id: "agent-1".to_string(),
                    status: Some(DocumentStatus::Valid),
                }),
            )
            .await
            .expect("upload");
            assert_eq!(status, StatusCode::CREATED);
        }

        let Json(view) = complete_step(
            State(state.clone()),
            Path((lead_id, kyc.instance_id.0.clone())),
            Json(complete_request(Role::Agent)),
        )
        .await
        .expect("gate satisfied");
        assert_eq!(view.status, helioflow_core::domain::step::StepStatus::Completed);
    }

    #[tokio::test]
    async fn double_completion_maps_to_conflict() {
        let state = setup_state().await;
        let (lead_id, steps) = seeded_lead(&state).await;
        let kyc = steps.iter().find(|s| s.name == "KYC").expect("kyc step");

        let mut first = complete_request(Role::Admin);
        first.admin_override = true;
        complete_step(
            State(state.clone()),
            Path((lead_id.clone(), kyc.instance_id.0.clone())),
            Json(first),
        )
        .await
        .expect("override completes");

        let mut second = complete_request(Role::Admin);
        second.admin_override = true;
        let (status, Json(body)) = complete_step(
            State(state.clone()),
            Path((lead_id, kyc.instance_id.0.clone())),
            Json(second),
        )
        .await
        .expect_err("second completion conflicts");
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.error, "already_completed");
    }

    #[tokio::test]
    async fn skip_requires_the_admin_role() {
        let state = setup_state().await;
        let (lead_id, steps) = seeded_lead(&state).await;
        let kyc = steps.iter().find(|s| s.name == "KYC").expect("kyc step");

        let (status, _) = skip_step(
            State(state.clone()),
            Path((lead_id.clone(), kyc.instance_id.0.clone())),
            Json(SkipStepRequest {
                actor_id: "agent-1".to_string(),
                actor_role: Role::Agent,
                remarks: None,
                admin_override: false,
            }),
        )
        .await
        .expect_err("agents cannot skip");
        assert_eq!(status, StatusCode::FORBIDDEN);

        let Json(view) = skip_step(
            State(state.clone()),
            Path((lead_id, kyc.instance_id.0.clone())),
            Json(SkipStepRequest {
                actor_id: "admin-1".to_string(),
                actor_role: Role::Admin,
                remarks: Some("customer already verified".to_string()),
                admin_override: false,
            }),
        )
        .await
        .expect("admin skips");
        assert_eq!(view.status, helioflow_core::domain::step::StepStatus::Skipped);
    }

    #[tokio::test]
    async fn catalog_creation_is_admin_only() {
        let state = setup_state().await;

        let request = CreateStepRequest {
            actor_role: Role::Agent,
            name: "Warranty Handover".to_string(),
            allowed_roles: [Role::Agent].into_iter().collect::<BTreeSet<_>>(),
            remarks_required: false,
            attachments_allowed: true,
            customer_upload_allowed: false,
            required_documents: Vec::new(),
        };
        let (status, _) = create_step(State(state.clone()), Json(request))
            .await
            .expect_err("agents cannot extend the catalog");
        assert_eq!(status, StatusCode::FORBIDDEN);

        let request = CreateStepRequest {
            actor_role: Role::Admin,
            name: "Warranty Handover".to_string(),
            allowed_roles: [Role::Agent].into_iter().collect::<BTreeSet<_>>(),
            remarks_required: false,
            attachments_allowed: true,
            customer_upload_allowed: false,
            required_documents: vec!["warranty_card".to_string()],
        };
        let (status, Json(created)) =
            create_step(State(state.clone()), Json(request)).await.expect("admin creates");
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.order_index, 1000);
        assert_eq!(created.required_documents, vec!["warranty_card".to_string()]);
    }

    #[tokio::test]
    async fn router_resolves_timeline_routes() {
        use axum::body::Body;
        use axum::http::Request;
        use tower::ServiceExt;

        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        let app = super::router(pool);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/leads/ghost/timeline")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_lead_maps_to_not_found() {
        let state = setup_state().await;
        let (status, Json(body)) = initialize_timeline(
            State(state.clone()),
            Path("ghost".to_string()),
        )
        .await
        .expect_err("unknown lead");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "not_found");
    }
}
