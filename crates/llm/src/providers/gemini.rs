//! Gemini File Search provider implementation.
//!
//! Talks to the Generative Language REST API. The retrieval step runs
//! inside the service through the `fileSearch` tool; this client only
//! shapes the request and normalizes the response.

use crate::client::{
    GroundedGenerator, GroundedRequest, GroundedResponse, GroundingChunk, StoreDescriptor,
    TokenUsage,
};
use crate::types::{
    Content, ErrorEnvelope, FileSearch, FileSearchStoreResource, GenerateContentRequest,
    GenerateContentResponse, GenerationParams, Tool,
};
use fsc_core::{ApiKey, AppError, AppResult};
use reqwest::StatusCode;
use std::time::Duration;

const API_VERSION: &str = "v1beta";

/// Gemini client.
pub struct GeminiClient {
    /// Base URL, without the API version segment
    base_url: String,

    /// Sent as `x-goog-api-key`
    api_key: ApiKey,

    /// HTTP client
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a client. `timeout` of `None` keeps reqwest's default.
    pub fn new(
        base_url: impl Into<String>,
        api_key: ApiKey,
        timeout: Option<Duration>,
    ) -> AppResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    fn generate_url(&self, model: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!(
            "{}/{}/models/{}:generateContent",
            self.base_url, API_VERSION, model
        )
    }

    fn store_url(&self, store_name: &str) -> String {
        format!("{}/{}/{}", self.base_url, API_VERSION, store_name)
    }

    /// Convert a GroundedRequest to the wire format.
    fn to_wire_request(&self, request: &GroundedRequest) -> GenerateContentRequest {
        let tools = if request.store_names.is_empty() {
            Vec::new()
        } else {
            vec![Tool {
                file_search: FileSearch {
                    file_search_store_names: request.store_names.clone(),
                },
            }]
        };

        GenerateContentRequest {
            contents: vec![Content::user_text(request.question.clone())],
            system_instruction: request
                .system_instruction
                .as_ref()
                .map(|s| Content::system_text(s.clone())),
            tools,
            generation_config: GenerationParams {
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens,
            },
        }
    }

    async fn send_json(&self, request: reqwest::RequestBuilder) -> AppResult<String> {
        let response = request
            .header("x-goog-api-key", self.api_key.expose())
            .send()
            .await
            .map_err(describe_transport_failure)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Service(format!("Failed to read Gemini response body: {}", e)))?;

        if !status.is_success() {
            return Err(describe_http_failure(status, &body));
        }

        Ok(body)
    }
}

/// Normalize a wire response.
///
/// Only the first candidate is used. A response without candidates is a
/// service error; the block reason is reported when the prompt was refused.
pub(crate) fn convert_response(response: GenerateContentResponse) -> AppResult<GroundedResponse> {
    let usage = response.usage_metadata.map(|u| TokenUsage {
        prompt_tokens: u.prompt_token_count,
        output_tokens: u.candidates_token_count,
        total_tokens: u.total_token_count,
    });

    let candidate = match response.candidates.into_iter().next() {
        Some(candidate) => candidate,
        None => {
            let reason = response
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .map(|r| format!("prompt was blocked ({})", r))
                .unwrap_or_else(|| "response contained no candidates".to_string());
            return Err(AppError::Service(format!("Gemini returned no answer: {}", reason)));
        }
    };

    let text = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter(|part| part.thought != Some(true))
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    let chunks = candidate
        .grounding_metadata
        .map(|metadata| {
            metadata
                .grounding_chunks
                .into_iter()
                .filter_map(|chunk| chunk.retrieved_context)
                .map(|ctx| GroundingChunk {
                    title: ctx.title,
                    uri: ctx.uri,
                    text: ctx.text,
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(GroundedResponse {
        text,
        chunks,
        finish_reason: candidate.finish_reason,
        usage,
    })
}

/// Map a non-success HTTP status to a service error with a useful cause.
pub(crate) fn describe_http_failure(status: StatusCode, body: &str) -> AppError {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|env| match env.error.status {
            Some(code) => format!("{}: {}", code, env.error.message),
            None => env.error.message,
        })
        .unwrap_or_else(|_| body.chars().take(200).collect());

    let kind = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => "authentication failed",
        StatusCode::TOO_MANY_REQUESTS => "rate limited",
        StatusCode::NOT_FOUND => "resource not found",
        StatusCode::BAD_REQUEST => "request rejected",
        s if s.is_server_error() => "service unavailable",
        _ => "unexpected response",
    };

    AppError::Service(format!("Gemini {} (HTTP {}): {}", kind, status.as_u16(), detail))
}

fn describe_transport_failure(err: reqwest::Error) -> AppError {
    let kind = if err.is_timeout() {
        "request timed out"
    } else if err.is_connect() {
        "could not connect"
    } else {
        "request failed"
    };
    AppError::Service(format!("Gemini {}: {}", kind, err))
}

#[async_trait::async_trait]
impl GroundedGenerator for GeminiClient {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: &GroundedRequest) -> AppResult<GroundedResponse> {
        tracing::info!(model = %request.model, stores = request.store_names.len(), "Sending grounded generation request to Gemini");

        let wire = self.to_wire_request(request);
        let body = self
            .send_json(self.client.post(self.generate_url(&request.model)).json(&wire))
            .await?;

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::Service(format!("Malformed Gemini response: {}", e)))?;

        let response = convert_response(parsed)?;

        tracing::info!(
            chunks = response.chunks.len(),
            finish_reason = response.finish_reason.as_deref().unwrap_or("unknown"),
            "Received grounded answer from Gemini"
        );
        if let Some(usage) = response.usage {
            tracing::debug!(
                "Token usage - Prompt: {}, Output: {}, Total: {}",
                usage.prompt_tokens,
                usage.output_tokens,
                usage.total_tokens
            );
        }

        Ok(response)
    }

    async fn describe_store(&self, store_name: &str) -> AppResult<StoreDescriptor> {
        tracing::debug!("Fetching store metadata for {}", store_name);

        let body = self
            .send_json(self.client.get(self.store_url(store_name)))
            .await?;

        let resource: FileSearchStoreResource = serde_json::from_str(&body)
            .map_err(|e| AppError::Service(format!("Malformed store metadata: {}", e)))?;

        Ok(StoreDescriptor {
            name: resource.name,
            display_name: resource.display_name,
            active_documents_count: resource
                .active_documents_count
                .and_then(|n| n.parse().ok()),
            create_time: resource.create_time,
        })
    }
}
