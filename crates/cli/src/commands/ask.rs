//! Ask command handler.
//!
//! Runs a single query against the store and prints the answer.

use super::build_engine;
use clap::Args;
use fsc_core::AppConfig;
use fsc_engine::{QueryEngine, RagResponse};

/// Ask a question about the penalty cases
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing ask command");

        let engine = build_engine(config)?;
        let response = engine.query(&self.question).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&response)?);
        } else {
            print!("{}", format_response(&response));
        }

        Ok(())
    }
}

/// Plain-text rendering for the terminal.
fn format_response(response: &RagResponse) -> String {
    let mut out = String::new();
    out.push_str(response.answer.trim_end());
    out.push_str("\n\n");

    if response.sources.is_empty() {
        out.push_str("(no sources cited)\n");
    } else {
        out.push_str(&format!("Sources ({}):\n", response.sources.len()));
        for (i, source) in response.sources.iter().enumerate() {
            out.push_str(&format!("  [{}] {}\n", i + 1, source.title));
        }
    }

    out.push_str(&format!(
        "\nlatency {:.2}s | est. cost ${:.6} | {}\n",
        response.latency, response.cost_estimate, response.engine_name
    ));
    out
}
