// Resume analysis: upload → render → persist → AI feedback → validate → persist.
// All LLM calls go through llm_client. No direct Anthropic calls here.

pub mod feedback;
pub mod handlers;
pub mod pipeline;
pub mod prompts;
pub mod response;
