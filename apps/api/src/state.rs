use std::sync::Arc;

use crate::convert::PdfConverter;
use crate::llm_client::FeedbackService;
use crate::storage::{FileStore, KvStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Uploaded résumés and their rendered previews. Default: S3 / MinIO.
    pub files: Arc<dyn FileStore>,
    /// Résumé records keyed by `resume:<id>`. Default: Redis.
    pub kv: Arc<dyn KvStore>,
    pub converter: Arc<dyn PdfConverter>,
    pub ai: Arc<dyn FeedbackService>,
}
