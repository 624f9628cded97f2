//! Cancel command

use clap::Args;
use tracing::info;

use gantry_tasks::CancelOutcome;

use crate::cli::output::{self, id_style};
use crate::cli::workspace::{block_on, Workspace};
use crate::cli::{Cli, OutputFormat};

/// Cancel a patch
#[derive(Debug, Args)]
pub struct CancelCommand {
    /// Patch id
    pub patch_id: String,
}

impl CancelCommand {
    /// Execute the cancel command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(patch = %self.patch_id, "executing cancel command");
        block_on(self.execute_async(cli))?
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        let workspace = Workspace::load()?;
        let orchestrator = workspace.orchestrator().await?;
        let outcome = orchestrator.cancel(&self.patch_id).await?;

        match cli.format {
            OutputFormat::Json => {
                let output = match &outcome {
                    CancelOutcome::Aborted { version_id } => {
                        serde_json::json!({ "patch": self.patch_id, "aborted_version": version_id })
                    }
                    CancelOutcome::Removed => {
                        serde_json::json!({ "patch": self.patch_id, "removed": true })
                    }
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text if !cli.quiet => match outcome {
                CancelOutcome::Aborted { version_id } => output::success(&format!(
                    "Aborted version {}",
                    id_style().apply_to(version_id)
                )),
                CancelOutcome::Removed => output::success(&format!(
                    "Removed pending patch {}",
                    id_style().apply_to(&self.patch_id)
                )),
            },
            OutputFormat::Text => {}
        }
        Ok(())
    }
}
