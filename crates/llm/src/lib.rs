//! External RAG service boundary.
//!
//! This crate owns the only outbound call type the system makes: "generate
//! an answer for a question, grounded in a named persistent store". The
//! `GroundedGenerator` trait is the seam; `GeminiClient` is the production
//! implementation.
//!
//! # Example
//! ```no_run
//! use fsc_core::ApiKey;
//! use fsc_llm::{GeminiClient, GroundedGenerator, GroundedRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GeminiClient::new(
//!     "https://generativelanguage.googleapis.com",
//!     ApiKey::new("..."),
//!     None,
//! )?;
//! let request = GroundedRequest::new("哪些銀行因理專挪用客戶款項被裁罰？", "gemini-2.5-flash")
//!     .with_store("fileSearchStores/example");
//! let response = client.generate(&request).await?;
//! println!("{}", response.text);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{
    GroundedGenerator, GroundedRequest, GroundedResponse, GroundingChunk, StoreDescriptor,
    TokenUsage,
};
pub use factory::create_generator;
pub use providers::GeminiClient;
