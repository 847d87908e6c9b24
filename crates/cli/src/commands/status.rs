//! Status command handler.
//!
//! Reports what the store metadata says without contacting the service.

use anyhow::Context;
use clap::Args;
use fsc_core::AppConfig;
use fsc_engine::{store_status, EngineStatus, StoreInfo};

/// Show store status
#[derive(Args, Debug)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatusCommand {
    pub fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing status command");

        let path = config.store_info_path();
        let store = StoreInfo::load(&path)
            .with_context(|| format!("Cannot read store metadata at {:?}", path))?;
        let status = store_status(&config.generation.model, &store);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&status)?);
        } else {
            print!("{}", format_status(&status));
        }

        Ok(())
    }
}

fn format_status(status: &EngineStatus) -> String {
    let mut out = String::new();
    out.push_str(&format!("Engine:       {}\n", status.engine_name));
    out.push_str(&format!("Model:        {}\n", status.model));
    out.push_str(&format!("Store:        {}\n", status.store_id));
    out.push_str(&format!("Files:        {}\n", status.file_count));
    if let Some(ref created) = status.created_time {
        out.push_str(&format!("Created:      {}\n", created));
    }
    if let Some(hours) = status.age_hours {
        out.push_str(&format!("Age:          {:.1} hours\n", hours));
    }
    out
}
