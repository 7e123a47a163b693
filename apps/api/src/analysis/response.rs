//! Shapes of an AI feedback response and the text-extraction rules applied to it.
//!
//! Providers disagree on how a message body looks: some return a bare string,
//! others an array of typed content blocks. Both are accepted here.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiResponse {
    pub message: AiMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiMessage {
    pub content: MessageContent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Items(Vec<ContentItem>),
}

/// One block of a structured message body. Fields are kept loose: unknown block
/// types may carry non-string payloads and must not break deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
}

impl ContentItem {
    #[cfg(test)]
    pub fn text(text: impl Into<String>) -> Self {
        ContentItem {
            kind: Some("text".to_string()),
            text: Some(Value::String(text.into())),
            content: None,
        }
    }

    fn is_text_candidate(&self) -> bool {
        self.kind.as_deref() == Some("text")
            || is_present(self.text.as_ref())
            || is_present(self.content.as_ref())
    }

    fn body(&self) -> Option<&str> {
        non_empty_str(self.text.as_ref()).or_else(|| non_empty_str(self.content.as_ref()))
    }
}

/// JSON truthiness for the values a content block may carry.
fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().map_or(true, |f| f != 0.0),
        Some(_) => true,
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Returns the textual body of a response.
///
/// A string body is returned as-is. For block arrays the first block that is
/// typed `text` or carries a `text`/`content` field wins; its `text` is
/// preferred over `content`. `None` means there is nothing to parse.
pub fn extract_text(content: &MessageContent) -> Option<&str> {
    match content {
        MessageContent::Text(text) => Some(text.as_str()).filter(|t| !t.is_empty()),
        MessageContent::Items(items) => items
            .iter()
            .find(|item| item.is_text_candidate())
            .and_then(ContentItem::body),
    }
}

/// Removes every ```` ```json ```` and ```` ``` ```` marker, then trims.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string()
}
