//! Résumé analysis pipeline.
//!
//! Flow: upload PDF → render preview → upload preview → persist pending record →
//!       AI feedback → extract text → strip fences → parse → validate →
//!       persist feedback → redirect to the detail view.
//!
//! Each step runs only if the previous one succeeded. A failed step stops the
//! run and leaves a human-readable status; nothing is retried or rolled back.

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::feedback::{parse_feedback, FeedbackError};
use crate::analysis::prompts::prepare_instructions;
use crate::analysis::response::{extract_text, strip_code_fences};
use crate::convert::{ConvertError, PdfConverter, UploadedFile};
use crate::errors::AppError;
use crate::llm_client::{FeedbackService, LlmError};
use crate::models::resume::ResumeRecord;
use crate::state::AppState;
use crate::storage::{FileStore, KvStore, StorageError};

pub const STATUS_UPLOADING: &str = "Uploading the file...";
pub const STATUS_CONVERTING: &str = "Converting to image...";
pub const STATUS_UPLOADING_IMAGE: &str = "Uploading the image...";
pub const STATUS_PREPARING: &str = "Preparing data...";
pub const STATUS_ANALYZING: &str = "Analyzing...";
pub const STATUS_COMPLETE: &str = "Analysis complete, redirecting...";

/// Form input for one analysis.
#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    pub file: UploadedFile,
}

/// Why a run stopped. `Display` is the status shown to the user; the cause is
/// kept as the error source for logs.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Error: Failed to upload file")]
    Upload(#[source] StorageError),

    #[error("Error: Failed to convert PDF to image")]
    Convert(#[source] ConvertError),

    #[error("Error: Failed to upload image")]
    ImageUpload(#[source] StorageError),

    #[error("Error: Failed to analyze resume")]
    Analyze(#[source] LlmError),

    #[error("Error: No text content in AI response")]
    EmptyResponse,

    #[error("Error: Failed to parse AI response")]
    Parse(#[source] FeedbackError),

    #[error("Error: Invalid feedback format")]
    InvalidFormat(#[source] FeedbackError),

    #[error("Error: {0}")]
    Unexpected(#[from] AppError),
}

/// Processing flag and status text of a run, plus every status it went through.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Progress {
    pub processing: bool,
    pub status: String,
    pub history: Vec<String>,
}

impl Progress {
    fn begin() -> Self {
        Progress {
            processing: true,
            ..Progress::default()
        }
    }

    fn set_status(&mut self, status: impl Into<String>) {
        let status = status.into();
        info!("{status}");
        self.history.push(status.clone());
        self.status = status;
    }

    fn finish(&mut self, status: impl Into<String>) {
        self.set_status(status);
        self.processing = false;
    }
}

#[derive(Debug, Clone)]
pub struct Completed {
    pub record: ResumeRecord,
    /// Client route to navigate to: `/resume/<id>`.
    pub redirect: String,
}

#[derive(Debug)]
pub struct Analysis {
    pub progress: Progress,
    pub outcome: Result<Completed, PipelineError>,
}

pub struct AnalysisPipeline<'a> {
    files: &'a dyn FileStore,
    kv: &'a dyn KvStore,
    converter: &'a dyn PdfConverter,
    ai: &'a dyn FeedbackService,
}

impl<'a> AnalysisPipeline<'a> {
    pub fn new(
        files: &'a dyn FileStore,
        kv: &'a dyn KvStore,
        converter: &'a dyn PdfConverter,
        ai: &'a dyn FeedbackService,
    ) -> Self {
        Self {
            files,
            kv,
            converter,
            ai,
        }
    }

    pub fn from_state(state: &'a AppState) -> Self {
        Self::new(
            state.files.as_ref(),
            state.kv.as_ref(),
            state.converter.as_ref(),
            state.ai.as_ref(),
        )
    }

    /// Runs every step and reports how far it got. Never returns early with an
    /// error: failures end up in `outcome` with the processing flag cleared.
    pub async fn run(&self, request: AnalyzeRequest) -> Analysis {
        let mut progress = Progress::begin();
        let outcome = self.execute(request, &mut progress).await;

        match &outcome {
            Ok(done) => {
                progress.finish(STATUS_COMPLETE);
                info!("Resume {} analyzed, redirecting to {}", done.record.id, done.redirect);
            }
            Err(e) => {
                warn!("Resume analysis stopped: {e:?}");
                progress.finish(e.to_string());
            }
        }

        Analysis { progress, outcome }
    }

    async fn execute(
        &self,
        request: AnalyzeRequest,
        progress: &mut Progress,
    ) -> Result<Completed, PipelineError> {
        let AnalyzeRequest {
            company_name,
            job_title,
            job_description,
            file,
        } = request;

        // Step 1: Store the original PDF
        progress.set_status(STATUS_UPLOADING);
        let uploaded = self
            .files
            .upload(&file.name, file.data.clone(), &file.content_type)
            .await
            .map_err(PipelineError::Upload)?;

        // Step 2: Render the first page
        progress.set_status(STATUS_CONVERTING);
        let image = self
            .converter
            .convert(&file)
            .await
            .map_err(PipelineError::Convert)?;

        // Step 3: Store the preview
        progress.set_status(STATUS_UPLOADING_IMAGE);
        let uploaded_image = self
            .files
            .upload(&image.name, image.data, &image.content_type)
            .await
            .map_err(PipelineError::ImageUpload)?;

        // Step 4: Persist the pending record
        progress.set_status(STATUS_PREPARING);
        let mut record = ResumeRecord {
            id: Uuid::new_v4(),
            resume_path: uploaded.path,
            image_path: uploaded_image.path,
            company_name,
            job_title,
            job_description,
            feedback: None,
        };
        self.persist(&record).await?;

        // Step 5: Ask for feedback
        progress.set_status(STATUS_ANALYZING);
        let instructions = prepare_instructions(&record.job_title, &record.job_description);
        let response = self
            .ai
            .feedback(&record.resume_path, &instructions)
            .await
            .map_err(PipelineError::Analyze)?;

        // Steps 6-9: Extract, clean, parse, validate
        let text = extract_text(&response.message.content).ok_or(PipelineError::EmptyResponse)?;
        let cleaned = strip_code_fences(text);
        let feedback = parse_feedback(&cleaned).map_err(|e| match e {
            FeedbackError::Malformed(_) => PipelineError::Parse(e),
            other => PipelineError::InvalidFormat(other),
        })?;

        // Step 10: Persist feedback and hand back the detail route
        record.feedback = Some(feedback);
        self.persist(&record).await?;

        let redirect = record.detail_path();
        Ok(Completed { record, redirect })
    }

    async fn persist(&self, record: &ResumeRecord) -> Result<(), PipelineError> {
        let value = serde_json::to_string(record).map_err(AppError::from)?;
        self.kv
            .set(&record.key(), &value)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }
}
