use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use datapull_core::job::DEFAULT_MAX_LEADS;
use datapull_core::matching::resolve_business_type;
use datapull_core::query::parse_complex_query;
use datapull_core::{FetchLeadsJob, JobRecord, JobStatusView};
use datapull_places::fetch::validate_fields;
use serde::{Deserialize, Serialize};

use crate::auth::RequireApiKey;
use crate::error::ApiError;
use crate::state::ApiState;

#[derive(Debug, Serialize, Deserialize)]
pub struct FetchLeadsRequest {
    pub query: String,
    #[serde(default = "default_max_leads")]
    pub max_leads: i64,
    #[serde(default)]
    pub fields: Option<Vec<String>>,
    pub user_id: String,
    #[serde(default)]
    pub enrich_contacts: bool,
}

fn default_max_leads() -> i64 {
    i64::from(DEFAULT_MAX_LEADS)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskAccepted {
    pub task_id: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusParams {
    pub user_id: String,
}

/// Validates a lead request and queues it for the workers
pub async fn create_google_maps_task(
    _auth: RequireApiKey,
    State(state): State<ApiState>,
    payload: Result<Json<FetchLeadsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TaskAccepted>), ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::Unprocessable(e.body_text()))?;

    let max_leads = u32::try_from(request.max_leads).unwrap_or(0);
    let job = FetchLeadsJob::new(request.query, max_leads, request.user_id);
    job.validate()?;

    let fields = validate_fields(request.fields.as_deref().unwrap_or_default())?;

    let parsed = parse_complex_query(&job.query);
    if !parsed.is_complete() {
        return Err(ApiError::BadRequest(
            "Could not extract business type and location from query.".to_string(),
        ));
    }

    let business_type = resolve_business_type(&parsed.business_type);
    tracing::info!(
        "Query {:?} parsed as {:?} in {:?}, resolved type {:?}",
        job.query,
        parsed.business_type,
        parsed.location,
        business_type
    );

    let job = job
        .with_fields(fields)
        .with_business_type(business_type)
        .with_contact_enrichment(request.enrich_contacts);

    state.statuses.save_record(&JobRecord::new(job.clone())).await?;
    state.queue.enqueue(&job).await?;
    tracing::info!("Queued job {} for user {}", job.id, job.user_id);

    Ok((
        StatusCode::ACCEPTED,
        Json(TaskAccepted {
            task_id: job.id,
            status: "pending".to_string(),
        }),
    ))
}

/// Current status of a job owned by `user_id`
pub async fn get_google_maps_task_status(
    _auth: RequireApiKey,
    State(state): State<ApiState>,
    Path(task_id): Path<String>,
    params: Result<Query<StatusParams>, QueryRejection>,
) -> Result<Json<JobStatusView>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::Unprocessable(e.body_text()))?;

    let record = state
        .statuses
        .get_record(&task_id)
        .await?
        .filter(|record| record.job.user_id == params.user_id)
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(record.status_view()))
}
