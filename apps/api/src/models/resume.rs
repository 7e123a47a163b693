use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::feedback::Feedback;

/// KV key prefix for résumé records.
pub const RECORD_KEY_PREFIX: &str = "resume:";
/// Glob matching every résumé record.
pub const RECORD_KEY_PATTERN: &str = "resume:*";

/// One analysis request and, once inference succeeds, its feedback.
///
/// Stored as JSON under `resume:<id>`. `feedback` is written as `""` while the
/// analysis is pending and as the validated feedback object afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRecord {
    pub id: Uuid,
    pub resume_path: String,
    pub image_path: String,
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    #[serde(default, with = "pending_feedback")]
    pub feedback: Option<Feedback>,
}

impl ResumeRecord {
    pub fn key(&self) -> String {
        record_key(self.id)
    }

    /// Client route of the detail view for this record.
    pub fn detail_path(&self) -> String {
        format!("/resume/{}", self.id)
    }
}

pub fn record_key(id: Uuid) -> String {
    format!("{RECORD_KEY_PREFIX}{id}")
}

mod pending_feedback {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::analysis::feedback::Feedback;

    pub fn serialize<S: Serializer>(value: &Option<Feedback>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            None => s.serialize_str(""),
            Some(feedback) => feedback.serialize(s),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Feedback>, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Stored {
            Pending(String),
            Ready(Feedback),
        }

        match Stored::deserialize(d)? {
            Stored::Pending(s) if s.is_empty() => Ok(None),
            Stored::Pending(_) => Err(D::Error::custom(
                "feedback must be an empty string or a feedback object",
            )),
            Stored::Ready(feedback) => Ok(Some(feedback)),
        }
    }
}
