//! Query engine for the FSC penalty-case Q&A service.
//!
//! Retrieval and generation happen in the external service; this crate
//! loads the store metadata, issues one grounded request per question and
//! normalizes the response into an answer plus cited sources.

pub mod engine;
pub mod sources;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use engine::{estimate_cost, store_status, FileSearchEngine, QueryEngine};
pub use sources::extract_sources;
pub use store::StoreInfo;
pub use types::{EngineStatus, RagResponse, Source, DEFAULT_CONFIDENCE, ENGINE_NAME};
