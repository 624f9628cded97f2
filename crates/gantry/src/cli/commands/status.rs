//! Status command

use clap::Args;
use console::style;
use tracing::info;

use gantry_store::Store;
use gantry_tasks::EngineError;

use crate::cli::output::{self, id_style, variant_style};
use crate::cli::workspace::{block_on, Workspace};
use crate::cli::{Cli, OutputFormat};

/// Show a patch with its version, builds and tasks
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Patch id
    pub patch_id: String,
}

impl StatusCommand {
    /// Execute the status command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(patch = %self.patch_id, "executing status command");
        block_on(self.execute_async(cli))?
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        let workspace = Workspace::load()?;
        let store = workspace.open_store().await?;

        let patch = store
            .find_patch_by_id(&self.patch_id)
            .await?
            .ok_or_else(|| EngineError::patch_not_found(&self.patch_id))?;

        let version = if patch.is_finalized() {
            store.find_version_by_id(&patch.version).await?
        } else {
            None
        };
        let builds = match &version {
            Some(v) => store.find_builds_by_ids(&v.build_ids).await?,
            None => Vec::new(),
        };
        let mut tasks = Vec::new();
        for build in &builds {
            tasks.extend(store.find_tasks_by_ids(&build.task_ids).await?);
        }

        match cli.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "patch": patch,
                    "version": version,
                    "builds": builds,
                    "tasks": tasks,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => {
                println!(
                    "{} {}",
                    style("Patch").bold(),
                    id_style().apply_to(&patch.id)
                );
                println!("{}", output::key_value("project", &patch.project));
                println!("{}", output::key_value("githash", &patch.githash));
                if !patch.description.is_empty() {
                    println!("{}", output::key_value("description", &patch.description));
                }

                let Some(version) = version else {
                    println!("{}", output::key_value("state", "pending"));
                    return Ok(());
                };
                println!("{}", output::key_value("version", &version.id));
                println!("{}", output::key_value("status", &output::status(version.status)));
                println!();

                for build in &builds {
                    println!(
                        "{} {} [{}] {}",
                        variant_style().apply_to(&build.display_name),
                        id_style().apply_to(&build.id),
                        output::status(build.status),
                        output::activated(build.activated)
                    );
                    for task in tasks.iter().filter(|t| t.build_id == build.id) {
                        println!(
                            "  {:<24} {}",
                            task.display_name,
                            output::task_status(task.status)
                        );
                    }
                }
            }
        }
        Ok(())
    }
}
