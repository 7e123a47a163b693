use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::prompts::json_system;
use super::{LlmClient, LlmError, RequestBlock};
use crate::analysis::prompts::ANALYSIS_SYSTEM;
use crate::analysis::response::{AiMessage, AiResponse, MessageContent};
use crate::storage::FileStore;

/// AI review of a stored document.
///
/// Carried in `AppState` as `Arc<dyn FeedbackService>` so the pipeline can be
/// exercised without network access.
#[async_trait]
pub trait FeedbackService: Send + Sync {
    /// Reviews the document stored at `path` following `instructions`.
    async fn feedback(&self, path: &str, instructions: &str) -> Result<AiResponse, LlmError>;
}

/// Sends the stored PDF to Claude as a document block.
pub struct ClaudeFeedbackService {
    llm: LlmClient,
    files: Arc<dyn FileStore>,
}

impl ClaudeFeedbackService {
    pub fn new(llm: LlmClient, files: Arc<dyn FileStore>) -> Self {
        Self { llm, files }
    }
}

#[async_trait]
impl FeedbackService for ClaudeFeedbackService {
    async fn feedback(&self, path: &str, instructions: &str) -> Result<AiResponse, LlmError> {
        let pdf = self
            .files
            .read(path)
            .await
            .map_err(|e| LlmError::Document(e.to_string()))?;

        info!("Requesting feedback for {path} ({} bytes)", pdf.len());

        let response = self
            .llm
            .call(
                vec![RequestBlock::pdf(&pdf), RequestBlock::text(instructions)],
                &json_system(ANALYSIS_SYSTEM),
            )
            .await?;

        Ok(AiResponse {
            message: AiMessage {
                content: MessageContent::Items(response.content),
            },
        })
    }
}
