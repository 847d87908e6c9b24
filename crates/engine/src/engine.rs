//! Query engine.
//!
//! The single point of contact with the external RAG service. An engine
//! value only exists once its store metadata has been loaded, so there is
//! no "uninitialized" engine to guard against at query time.

use crate::sources::extract_sources;
use crate::store::StoreInfo;
use crate::types::{EngineStatus, RagResponse, DEFAULT_CONFIDENCE, ENGINE_NAME};
use chrono::Utc;
use fsc_core::{AppConfig, AppError, AppResult, GenerationConfig, PricingConfig};
use fsc_llm::{GroundedGenerator, GroundedRequest, StoreDescriptor};
use std::sync::Arc;
use std::time::Instant;

/// Rough tokens-per-character ratio for mixed Chinese/English text.
const TOKENS_PER_CHAR: f64 = 1.5;

/// Capability contract for answering questions.
///
/// The presentation layer only depends on this trait, so an alternative
/// backend can be dropped in without touching it.
#[async_trait::async_trait]
pub trait QueryEngine: Send + Sync {
    /// Display name of the engine.
    fn name(&self) -> &str;

    /// Store and model status; never touches the network.
    fn status(&self) -> EngineStatus;

    /// Answer a question.
    ///
    /// # Errors
    /// - `InvalidInput` for a blank question (no network call is made)
    /// - `Service` for any failure of the external call, including an
    ///   empty answer
    async fn query(&self, question: &str) -> AppResult<RagResponse>;
}

/// Engine backed by a persistent File Search store.
pub struct FileSearchEngine {
    generation: GenerationConfig,
    pricing: PricingConfig,
    store: StoreInfo,
    generator: Arc<dyn GroundedGenerator>,
}

impl FileSearchEngine {
    /// Create an engine from already-loaded store metadata.
    pub fn new(
        generation: GenerationConfig,
        pricing: PricingConfig,
        store: StoreInfo,
        generator: Arc<dyn GroundedGenerator>,
    ) -> Self {
        Self {
            generation,
            pricing,
            store,
            generator,
        }
    }

    /// Load store metadata from the configured path and build the engine.
    ///
    /// # Arguments
    /// * `config` - Application config; supplies the store path, model
    ///   parameters and pricing
    /// * `generator` - Client for the external service, usually from
    ///   `fsc_llm::create_generator`
    ///
    /// # Example
    /// ```no_run
    /// use fsc_core::AppConfig;
    /// use fsc_engine::FileSearchEngine;
    /// use fsc_llm::create_generator;
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = AppConfig::load()?;
    /// let engine = FileSearchEngine::from_config(&config, create_generator(&config)?)?;
    /// println!("store: {}", engine.store().store_id);
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    /// `AppError::Config` if the metadata file is missing or malformed.
    pub fn from_config(
        config: &AppConfig,
        generator: Arc<dyn GroundedGenerator>,
    ) -> AppResult<Self> {
        let store = StoreInfo::load(&config.store_info_path())?;

        tracing::info!(
            model = %config.generation.model,
            provider = generator.provider_name(),
            "Query engine ready"
        );

        Ok(Self::new(
            config.generation.clone(),
            config.pricing,
            store,
            generator,
        ))
    }

    /// Validate credentials and the store id with one round trip.
    pub async fn verify(&self) -> AppResult<StoreDescriptor> {
        let descriptor = self
            .generator
            .describe_store(&self.store.store_id)
            .await
            .map_err(into_service_error)?;

        tracing::info!(
            store = %descriptor.name,
            display_name = descriptor.display_name.as_deref().unwrap_or("-"),
            active_documents = ?descriptor.active_documents_count,
            "Verified store with the external service"
        );

        Ok(descriptor)
    }

    /// Loaded store metadata.
    pub fn store(&self) -> &StoreInfo {
        &self.store
    }

    fn build_request(&self, question: &str) -> GroundedRequest {
        let mut request = GroundedRequest::new(question, &self.generation.model)
            .with_store(&self.store.store_id)
            .with_temperature(self.generation.temperature)
            .with_max_output_tokens(self.generation.max_output_tokens);

        if let Some(ref instruction) = self.generation.system_instruction {
            request = request.with_system_instruction(instruction);
        }

        request
    }
}

#[async_trait::async_trait]
impl QueryEngine for FileSearchEngine {
    fn name(&self) -> &str {
        ENGINE_NAME
    }

    fn status(&self) -> EngineStatus {
        store_status(&self.generation.model, &self.store)
    }

    async fn query(&self, question: &str) -> AppResult<RagResponse> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::InvalidInput(
                "Please enter a question".to_string(),
            ));
        }

        tracing::info!(chars = question.chars().count(), "Running query");

        let request = self.build_request(question);
        let start = Instant::now();
        let raw = self
            .generator
            .generate(&request)
            .await
            .map_err(into_service_error)?;
        let latency = start.elapsed().as_secs_f64();

        if raw.text.trim().is_empty() {
            return Err(AppError::Service(format!(
                "The service returned an empty answer (finish reason: {})",
                raw.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        let sources = extract_sources(&raw.chunks, &self.store);
        if sources.is_empty() {
            tracing::warn!("Answer carried no grounding sources");
        }

        let cost_estimate = estimate_cost(question, &raw.text, &self.pricing);

        tracing::info!(
            latency_secs = latency,
            sources = sources.len(),
            cost_estimate,
            "Query completed"
        );

        Ok(RagResponse {
            answer: raw.text,
            sources,
            confidence: DEFAULT_CONFIDENCE,
            latency,
            cost_estimate,
            engine_name: ENGINE_NAME.to_string(),
        })
    }
}

/// Status of a loaded store. Needs no credentials and no network.
pub fn store_status(model: &str, store: &StoreInfo) -> EngineStatus {
    EngineStatus {
        engine_name: ENGINE_NAME.to_string(),
        model: model.to_string(),
        store_id: store.store_id.clone(),
        file_count: store.file_count(),
        created_time: store.created_display(),
        age_hours: store.age_hours(Utc::now()),
    }
}

/// Everything that goes wrong on the external call is a service error.
fn into_service_error(err: AppError) -> AppError {
    match err {
        AppError::Service(_) => err,
        other => AppError::Service(other.to_string()),
    }
}

/// Heuristic cost in USD: characters × 1.5 tokens, priced per million.
pub fn estimate_cost(question: &str, answer: &str, pricing: &PricingConfig) -> f64 {
    let input_tokens = question.chars().count() as f64 * TOKENS_PER_CHAR;
    let output_tokens = answer.chars().count() as f64 * TOKENS_PER_CHAR;

    input_tokens / 1_000_000.0 * pricing.input_price
        + output_tokens / 1_000_000.0 * pricing.output_price
}
