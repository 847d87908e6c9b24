//! Grounded generation abstraction and request/response types.
//!
//! A "grounded" generation is one where the external service searches a
//! named persistent store before answering and returns the retrieved
//! passages alongside the generated text.

use fsc_core::AppResult;
use serde::{Deserialize, Serialize};

/// Request for an answer grounded in one or more persistent stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundedRequest {
    /// The user's question, sent verbatim
    pub question: String,

    /// Model identifier (e.g., "gemini-2.5-flash")
    pub model: String,

    /// Stores the retrieval tool is allowed to search
    pub store_names: Vec<String>,

    /// Temperature for sampling (0.0 - 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,

    /// System instruction (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
}

impl GroundedRequest {
    /// Create a new request with the required fields.
    pub fn new(question: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            model: model.into(),
            store_names: Vec::new(),
            temperature: None,
            max_output_tokens: None,
            system_instruction: None,
        }
    }

    /// Add a store to search.
    pub fn with_store(mut self, store_name: impl Into<String>) -> Self {
        self.store_names.push(store_name.into());
        self
    }

    /// Set the temperature for sampling.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum tokens to generate.
    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    /// Set the system instruction. Blank instructions are ignored.
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        let instruction = instruction.into();
        if !instruction.trim().is_empty() {
            self.system_instruction = Some(instruction);
        }
        self
    }
}

/// One retrieved passage the service used to ground its answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundingChunk {
    /// Document title as stored by the service (usually its internal id)
    pub title: Option<String>,

    /// Resource URI of the document
    pub uri: Option<String>,

    /// Retrieved text
    pub text: Option<String>,
}

impl GroundingChunk {
    /// The identifier the service used for the source document.
    ///
    /// Prefers the title; falls back to the last segment of the URI.
    pub fn document_id(&self) -> Option<&str> {
        if let Some(title) = self.title.as_deref().filter(|t| !t.trim().is_empty()) {
            return Some(title);
        }

        self.uri
            .as_deref()
            .and_then(|uri| uri.trim_end_matches('/').rsplit('/').next())
            .filter(|segment| !segment.is_empty())
    }
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

/// Normalized response of a grounded generation call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroundedResponse {
    /// Generated text (may be empty if the model produced nothing)
    pub text: String,

    /// Retrieved passages, in the order the service returned them
    pub chunks: Vec<GroundingChunk>,

    /// Why generation stopped, as reported by the service
    pub finish_reason: Option<String>,

    /// Usage statistics, when reported
    pub usage: Option<TokenUsage>,
}

/// Metadata about a persistent store, as reported by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreDescriptor {
    pub name: String,
    pub display_name: Option<String>,
    pub active_documents_count: Option<u64>,
    pub create_time: Option<String>,
}

/// Trait for grounded generation backends.
///
/// The query engine only depends on this trait, so tests and alternative
/// providers can substitute their own implementation.
#[async_trait::async_trait]
pub trait GroundedGenerator: Send + Sync {
    /// Get the provider name (e.g., "gemini").
    fn provider_name(&self) -> &str;

    /// Generate an answer grounded in the request's stores.
    ///
    /// Issues exactly one network call. Never retries.
    async fn generate(&self, request: &GroundedRequest) -> AppResult<GroundedResponse>;

    /// Fetch store metadata; used to validate credentials and the store id.
    async fn describe_store(&self, store_name: &str) -> AppResult<StoreDescriptor>;
}
