use crate::convert::ConversionMode;
use crate::error::MarkifyError;
use crate::jobs::{Job, JobParams, JobStatus};
use crate::server::AppContext;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub fn api_routes() -> Router<AppContext> {
    Router::new()
        .route("/jobs", post(submit_job).get(list_jobs))
        .route("/jobs/:id", get(get_job_status).delete(delete_job))
        .route("/jobs/:id/result", get(download_result))
}

/// Transport-level error wrapper mapping the core taxonomy onto HTTP.
enum ApiError {
    Core(MarkifyError),
    BadRequest(String),
}

impl From<MarkifyError> for ApiError {
    fn from(e: MarkifyError) -> Self {
        ApiError::Core(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Core(e) => {
                let status = match &e {
                    MarkifyError::UnsupportedMode(_) => StatusCode::BAD_REQUEST,
                    MarkifyError::JobNotFound(_) => StatusCode::NOT_FOUND,
                    MarkifyError::JobNotReady(_) => StatusCode::TOO_EARLY,
                    MarkifyError::JobFailed(_) => StatusCode::CONFLICT,
                    MarkifyError::QueueFull(_)
                    | MarkifyError::StorageFull(_)
                    | MarkifyError::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
                    MarkifyError::InvalidTransition { .. }
                    | MarkifyError::Conversion(_)
                    | MarkifyError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.to_string())
            }
        };

        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}

#[derive(Serialize)]
struct SubmitJobResponse {
    job_id: Uuid,
}

#[derive(Serialize)]
struct JobStatusResponse {
    job_id: Uuid,
    status: JobStatus,
    filename: String,
    params: JobParams,
    error: Option<String>,
}

impl From<Job> for JobStatusResponse {
    fn from(job: Job) -> Self {
        Self {
            job_id: job.id,
            status: job.status,
            filename: job.filename,
            params: job.params,
            error: job.error,
        }
    }
}

/// Upload a file and start a conversion job.
///
/// Multipart fields: `file` (required) and `mode` (optional, defaults to
/// fast). Responds 202 with the job id; processing is asynchronous.
async fn submit_job(
    State(ctx): State<AppContext>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitJobResponse>), ApiError> {
    let mut filename: Option<String> = None;
    let mut content: Option<Vec<u8>> = None;
    let mut mode = ConversionMode::Fast;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        match field.name() {
            Some("file") => {
                filename = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {e}")))?;
                content = Some(bytes.to_vec());
            }
            Some("mode") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read mode: {e}")))?;
                mode = text.parse()?;
            }
            _ => {}
        }
    }

    let content = content.ok_or_else(|| ApiError::BadRequest("missing 'file' field".into()))?;
    let filename = filename.unwrap_or_else(|| "upload".to_string());

    let job = ctx
        .service
        .submit(&filename, JobParams { mode }, content)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitJobResponse { job_id: job.id }),
    ))
}

#[derive(Deserialize)]
struct ListJobsQuery {
    page: Option<usize>,
    limit: Option<usize>,
}

async fn list_jobs(
    State(ctx): State<AppContext>,
    Query(params): Query<ListJobsQuery>,
) -> Json<Vec<JobStatusResponse>> {
    let page = params.page.unwrap_or(0);
    let limit = params.limit.unwrap_or(10).clamp(1, 100);

    let jobs = ctx
        .service
        .list_jobs(page, limit)
        .into_iter()
        .map(JobStatusResponse::from)
        .collect();
    Json(jobs)
}

async fn get_job_status(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobStatusResponse>, ApiError> {
    let job = ctx.service.get_status(id)?;
    Ok(Json(job.into()))
}

/// Download the Markdown artifact of a completed job.
async fn download_result(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let (job, bytes) = ctx.service.read_result(id)?;

    let disposition = format!("attachment; filename=\"{}.md\"", job.filename);
    Ok((
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

async fn delete_job(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    ctx.service.delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}
