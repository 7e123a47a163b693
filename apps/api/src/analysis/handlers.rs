//! Axum route handlers for the Resume Analysis API.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::feedback::FeedbackSummary;
use crate::analysis::pipeline::{AnalysisPipeline, AnalyzeRequest};
use crate::convert::UploadedFile;
use crate::errors::AppError;
use crate::models::resume::{record_key, ResumeRecord, RECORD_KEY_PATTERN};
use crate::state::AppState;
use crate::storage::KvStore;

/// Largest accepted résumé upload.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub id: Uuid,
    pub redirect: String,
    pub status: String,
    pub history: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ResumeDetailResponse {
    pub resume: ResumeRecord,
    pub summary: Option<FeedbackSummary>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resumes
///
/// Multipart form: `companyName`, `jobTitle`, `jobDescription`, `file`.
/// Runs the full analysis pipeline; on success the client should navigate to `redirect`.
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<AnalyzeResponse>), AppError> {
    let request = read_analyze_form(multipart).await?;
    info!(
        "Analyzing {} ({} bytes) for {} at {}",
        request.file.name,
        request.file.data.len(),
        request.job_title,
        request.company_name
    );

    let analysis = AnalysisPipeline::from_state(&state).run(request).await;
    let done = analysis
        .outcome
        .map_err(|_| AppError::Analysis(analysis.progress.status.clone()))?;

    Ok((
        StatusCode::CREATED,
        Json(AnalyzeResponse {
            id: done.record.id,
            redirect: done.redirect,
            status: analysis.progress.status,
            history: analysis.progress.history,
        }),
    ))
}

/// GET /api/v1/resumes
///
/// Every stored record. Entries that no longer deserialize are skipped.
pub async fn handle_list_resumes(
    State(state): State<AppState>,
) -> Result<Json<Vec<ResumeRecord>>, AppError> {
    let entries = state.kv.list(RECORD_KEY_PATTERN).await?;
    let records: Vec<ResumeRecord> = entries
        .into_iter()
        .filter_map(|(key, value)| match serde_json::from_str::<ResumeRecord>(&value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping unreadable record {key}: {e}");
                None
            }
        })
        .collect();
    Ok(Json(records))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeDetailResponse>, AppError> {
    let resume = load_record(state.kv.as_ref(), id).await?;
    let summary = resume.feedback.as_ref().map(|f| f.summary());
    Ok(Json(ResumeDetailResponse { resume, summary }))
}

/// GET /api/v1/resumes/:id/file
pub async fn handle_get_resume_file(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let record = load_record(state.kv.as_ref(), id).await?;
    let data = state.files.read(&record.resume_path).await?;
    Ok(binary_response("application/pdf", data))
}

/// GET /api/v1/resumes/:id/image
pub async fn handle_get_resume_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let record = load_record(state.kv.as_ref(), id).await?;
    let data = state.files.read(&record.image_path).await?;
    Ok(binary_response("image/png", data))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn load_record(kv: &dyn KvStore, id: Uuid) -> Result<ResumeRecord, AppError> {
    let raw = kv
        .get(&record_key(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;
    Ok(serde_json::from_str(&raw)?)
}

fn binary_response(content_type: &'static str, data: Bytes) -> Response {
    ([(header::CONTENT_TYPE, content_type)], data).into_response()
}

async fn read_analyze_form(mut multipart: Multipart) -> Result<AnalyzeRequest, AppError> {
    let mut company_name = String::new();
    let mut job_title = String::new();
    let mut job_description = String::new();
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("resume.pdf").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Could not read file: {e}")))?;
                file = Some(UploadedFile {
                    name: file_name,
                    content_type,
                    data,
                });
            }
            "companyName" | "company-name" | "company_name" => {
                company_name = read_text(field).await?;
            }
            "jobTitle" | "job-title" | "job_title" => {
                job_title = read_text(field).await?;
            }
            "jobDescription" | "job-description" | "job_description" => {
                job_description = read_text(field).await?;
            }
            other => {
                warn!("Ignoring unexpected form field '{other}'");
            }
        }
    }

    Ok(AnalyzeRequest {
        company_name,
        job_title,
        job_description,
        file: validate_upload(file)?,
    })
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Could not read form field: {e}")))
}

/// A file is the only required input: it must be present, non-empty, a PDF,
/// and no larger than `MAX_UPLOAD_BYTES`.
pub fn validate_upload(file: Option<UploadedFile>) -> Result<UploadedFile, AppError> {
    let mut file = file
        .filter(|f| !f.data.is_empty())
        .ok_or_else(|| AppError::Validation("A resume file is required".to_string()))?;

    if file.data.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::Validation(format!(
            "File is too large ({} bytes); the limit is 20 MB",
            file.data.len()
        )));
    }

    let declared_pdf = file.content_type.eq_ignore_ascii_case("application/pdf")
        || file.name.to_ascii_lowercase().ends_with(".pdf");
    if !declared_pdf && !file.data.starts_with(b"%PDF") {
        return Err(AppError::Validation(
            "Only PDF files are supported".to_string(),
        ));
    }

    file.content_type = "application/pdf".to_string();
    Ok(file)
}
