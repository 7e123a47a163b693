// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Appended to every system prompt that expects structured output.
pub const JSON_ONLY_SYSTEM: &str = "\
    Do NOT include any text outside the JSON object. \
    Do NOT include explanations or apologies.";

/// Joins a service system prompt with the shared JSON-only fragment.
pub fn json_system(service_system: &str) -> String {
    format!("{service_system} {JSON_ONLY_SYSTEM}")
}
