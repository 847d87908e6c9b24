//! Command handlers for the FSC Q&A CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod serve;
pub mod status;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use serve::ServeCommand;
pub use status::StatusCommand;

use fsc_core::{AppConfig, AppResult};
use fsc_engine::FileSearchEngine;
use fsc_llm::create_generator;

/// Build the production engine: Gemini client plus the on-disk store metadata.
pub(crate) fn build_engine(config: &AppConfig) -> AppResult<FileSearchEngine> {
    let generator = create_generator(config)?;
    FileSearchEngine::from_config(config, generator)
}
