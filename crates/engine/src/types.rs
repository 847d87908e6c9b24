//! Query engine response types.

use serde::{Deserialize, Serialize};

/// Label reported as the engine name in every response.
pub const ENGINE_NAME: &str = "Gemini File Search";

/// The service does not report confidence; this placeholder is shown instead.
pub const DEFAULT_CONFIDENCE: f64 = 0.85;

/// A cited source document.
///
/// This is the user-facing representation: the title is the original
/// filename whenever the mapping knows the document id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Original filename, or the raw document id when unmapped
    pub title: String,

    /// Retrieved text the answer was grounded on (truncated)
    pub excerpt: String,

    /// 1-based position in the order the service returned citations
    pub rank: usize,

    /// Internal: the service's document id. Never sent to clients.
    #[serde(skip)]
    pub document_id: Option<String>,
}

/// Normalized answer of a single query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagResponse {
    /// Generated answer; never empty
    pub answer: String,

    /// Cited sources, in service order
    pub sources: Vec<Source>,

    /// Constant placeholder (see `DEFAULT_CONFIDENCE`)
    pub confidence: f64,

    /// Wall-clock seconds spent on the external call
    pub latency: f64,

    /// Heuristic USD estimate, not billing-accurate
    pub cost_estimate: f64,

    pub engine_name: String,
}

/// Snapshot of engine readiness for status displays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStatus {
    pub engine_name: String,
    pub model: String,
    pub store_id: String,
    pub file_count: usize,
    pub created_time: Option<String>,
    pub age_hours: Option<f64>,
}
