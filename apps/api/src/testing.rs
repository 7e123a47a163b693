//! In-memory stand-ins for the external services, shared by unit and router tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use uuid::Uuid;

use crate::analysis::response::{AiMessage, AiResponse, ContentItem, MessageContent};
use crate::convert::{image_file_name, ConvertError, PdfConverter, UploadedFile};
use crate::llm_client::{FeedbackService, LlmError};
use crate::state::AppState;
use crate::storage::files::object_key;
use crate::storage::{FileStore, KvStore, StorageError, StoredFile};

pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake";

pub fn sample_pdf() -> UploadedFile {
    UploadedFile {
        name: "resume.pdf".to_string(),
        content_type: "application/pdf".to_string(),
        data: Bytes::from_static(b"%PDF-1.4\n1 0 obj\n<<>>\nendobj\n%%EOF"),
    }
}

pub fn well_formed_feedback() -> Value {
    serde_json::json!({
        "overallScore": 78,
        "ATS": {"score": 82, "tips": [{"type": "good", "tip": "Clear headings"}]},
        "toneAndStyle": {"score": 70, "tips": []},
        "content": {"score": 65, "tips": []},
        "structure": {"score": 88, "tips": []},
        "skills": {"score": 45, "tips": []}
    })
}

#[derive(Default)]
pub struct MemoryFileStore {
    objects: Mutex<BTreeMap<String, (Bytes, String)>>,
    uploads: AtomicUsize,
    /// Zero-based index of the upload call that should fail.
    fail_upload: Option<usize>,
}

impl MemoryFileStore {
    pub fn failing_upload(index: usize) -> Self {
        Self {
            fail_upload: Some(index),
            ..Self::default()
        }
    }

    pub fn paths(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn content_type(&self, path: &str) -> Option<String> {
        self.objects
            .lock()
            .unwrap()
            .get(path)
            .map(|(_, content_type)| content_type.clone())
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn upload(
        &self,
        name: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<StoredFile, StorageError> {
        let call = self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.fail_upload == Some(call) {
            return Err(StorageError::S3("bucket unavailable".to_string()));
        }
        let path = object_key(Uuid::new_v4(), name);
        self.objects
            .lock()
            .unwrap()
            .insert(path.clone(), (data, content_type.to_string()));
        Ok(StoredFile { path })
    }

    async fn read(&self, path: &str) -> Result<Bytes, StorageError> {
        self.objects
            .lock()
            .unwrap()
            .get(path)
            .map(|(data, _)| data.clone())
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }
}

#[derive(Default)]
pub struct MemoryKvStore {
    entries: Mutex<BTreeMap<String, String>>,
    writes: Mutex<Vec<(String, String)>>,
    fail_writes: bool,
}

impl MemoryKvStore {
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    /// Every `set` call in order, including overwrites.
    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Redis(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "connection refused",
            ))));
        }
        self.writes
            .lock()
            .unwrap()
            .push((key.to_string(), value.to_string()));
        self.insert(key, value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn list(&self, pattern: &str) -> Result<Vec<(String, String)>, StorageError> {
        let prefix = pattern.trim_end_matches('*');
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

#[derive(Default)]
pub struct StaticConverter {
    fail: bool,
    calls: AtomicUsize,
}

impl StaticConverter {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PdfConverter for StaticConverter {
    async fn convert(&self, file: &UploadedFile) -> Result<UploadedFile, ConvertError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ConvertError::ToolFailed {
                command: "pdftoppm".to_string(),
                stderr: "Syntax Error: Couldn't read xref table".to_string(),
            });
        }
        Ok(UploadedFile {
            name: image_file_name(&file.name),
            content_type: "image/png".to_string(),
            data: Bytes::from_static(PNG_BYTES),
        })
    }
}

/// Replies with a fixed response and records what it was asked.
pub struct ScriptedFeedback {
    reply: Result<MessageContent, String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedFeedback {
    pub fn content(content: MessageContent) -> Self {
        Self {
            reply: Ok(content),
            calls: Mutex::new(vec![]),
        }
    }

    /// A block-array reply with one text block.
    pub fn text_block(text: &str) -> Self {
        Self::content(MessageContent::Items(vec![ContentItem::text(text)]))
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            calls: Mutex::new(vec![]),
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedbackService for ScriptedFeedback {
    async fn feedback(&self, path: &str, instructions: &str) -> Result<AiResponse, LlmError> {
        self.calls
            .lock()
            .unwrap()
            .push((path.to_string(), instructions.to_string()));
        match &self.reply {
            Ok(content) => Ok(AiResponse {
                message: AiMessage {
                    content: content.clone(),
                },
            }),
            Err(message) => Err(LlmError::Api {
                status: 500,
                message: message.clone(),
            }),
        }
    }
}

/// The fakes behind an `AppState`, kept so tests can inspect them afterwards.
pub struct Fakes {
    pub files: Arc<MemoryFileStore>,
    pub kv: Arc<MemoryKvStore>,
    pub converter: Arc<StaticConverter>,
    pub ai: Arc<ScriptedFeedback>,
}

impl Fakes {
    pub fn new(ai: ScriptedFeedback) -> Self {
        Self {
            files: Arc::new(MemoryFileStore::default()),
            kv: Arc::new(MemoryKvStore::default()),
            converter: Arc::new(StaticConverter::default()),
            ai: Arc::new(ai),
        }
    }

    pub fn state(&self) -> AppState {
        AppState {
            files: self.files.clone(),
            kv: self.kv.clone(),
            converter: self.converter.clone(),
            ai: self.ai.clone(),
        }
    }
}
