pub mod ollama;

pub use ollama::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Ollama is not running at {0}")]
    Connection(String),

    #[error("Ollama returned error (status {status}): {body}")]
    Upstream { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("JSON parsing error: {0}")]
    JsonParsing(String),
}

/// Text-generation client abstraction (allows mocking).
///
/// The response is untrusted free text that is *expected*, not guaranteed,
/// to contain one embedded JSON block; callers go through
/// [`extract_json_block`] and must degrade gracefully when it is absent.
pub trait LlmClient {
    fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Extract the first top-level JSON block from LLM response text.
/// Handles responses that include prose before/after the JSON.
pub fn extract_json_block(response: &str) -> Result<&str, LlmError> {
    let trimmed = response.trim();

    // Strip markdown code fences if present
    if let Some(start) = trimmed.find("```json") {
        let after_fence = &trimmed[start + 7..];
        if let Some(end) = after_fence.find("```") {
            return Ok(after_fence[..end].trim());
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        if let Some(end) = after_fence.find("```") {
            let block = after_fence[..end].trim();
            if block.starts_with('{') || block.starts_with('[') {
                return Ok(block);
            }
        }
    }

    // Find the first { and last }
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            return Ok(&trimmed[start..=end]);
        }
    }

    Err(LlmError::JsonParsing(
        "No JSON block found in LLM response".to_string(),
    ))
}
