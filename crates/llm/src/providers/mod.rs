//! Grounded generation providers.

pub mod gemini;

pub use gemini::GeminiClient;
