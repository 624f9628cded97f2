//! Schedule command

use clap::Args;
use tracing::info;

use gantry_core::model::{pairs_to_variant_tasks, TVPair};
use gantry_tasks::{ScheduleOutcome, ScheduleRequest};

use super::parse_pair;
use crate::cli::output::{self, id_style};
use crate::cli::workspace::{block_on, Workspace};
use crate::cli::{Cli, OutputFormat};

/// Finalize a pending patch or extend a finalized one
#[derive(Debug, Args)]
pub struct ScheduleCommand {
    /// Patch id
    pub patch_id: String,

    /// Requested pair as variant:task (repeatable)
    #[arg(long = "pair", value_parser = parse_pair)]
    pub pairs: Vec<TVPair>,

    /// Variants for the variants x tasks form
    #[arg(long, value_delimiter = ',')]
    pub variants: Vec<String>,

    /// Tasks for the variants x tasks form
    #[arg(long, value_delimiter = ',')]
    pub tasks: Vec<String>,

    /// New patch description
    #[arg(short, long)]
    pub description: Option<String>,
}

impl ScheduleCommand {
    /// Build the request from the arguments
    fn request(&self) -> ScheduleRequest {
        ScheduleRequest {
            variants_tasks: pairs_to_variant_tasks(&self.pairs),
            variants: self.variants.clone(),
            tasks: self.tasks.clone(),
            description: self.description.clone(),
        }
    }

    /// Execute the schedule command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(patch = %self.patch_id, pairs = self.pairs.len(), "executing schedule command");
        block_on(self.execute_async(cli))?
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        let workspace = Workspace::load()?;
        let orchestrator = workspace.orchestrator().await?;
        let outcome = orchestrator.schedule(&self.patch_id, &self.request()).await?;

        match (cli.format, outcome) {
            (OutputFormat::Json, ScheduleOutcome::Finalized(version)) => {
                let output = serde_json::json!({ "finalized": version });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            (OutputFormat::Json, ScheduleOutcome::Extended(extended)) => {
                let output = serde_json::json!({
                    "extended": {
                        "new_tasks": extended.new_tasks,
                        "new_variants": extended.new_variants,
                        "created_builds": extended.created_builds,
                        "created_tasks": extended.created_tasks,
                    }
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            (OutputFormat::Text, _) if cli.quiet => {}
            (OutputFormat::Text, ScheduleOutcome::Finalized(version)) => {
                output::success(&format!(
                    "Finalized patch {} as version {}",
                    id_style().apply_to(&self.patch_id),
                    id_style().apply_to(&version.id)
                ));
                println!("{}", output::key_value("builds", &version.build_ids.len().to_string()));
            }
            (OutputFormat::Text, ScheduleOutcome::Extended(extended)) => {
                if extended.is_noop() {
                    output::info("Nothing new to schedule");
                } else {
                    output::success(&format!(
                        "Extended patch {}",
                        id_style().apply_to(&self.patch_id)
                    ));
                    println!(
                        "{}",
                        output::key_value("new builds", &extended.created_builds.len().to_string())
                    );
                    println!(
                        "{}",
                        output::key_value("new tasks", &extended.created_tasks.len().to_string())
                    );
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_from_args() {
        let cmd = ScheduleCommand {
            patch_id: "p1".to_string(),
            pairs: vec![TVPair::new("linux", "test"), TVPair::new("linux", "compile")],
            variants: Vec::new(),
            tasks: Vec::new(),
            description: Some("try it".to_string()),
        };
        let request = cmd.request();
        assert_eq!(request.variants_tasks.len(), 1);
        assert_eq!(request.variants_tasks[0].tasks.len(), 2);
        assert_eq!(request.description.as_deref(), Some("try it"));
    }
}
