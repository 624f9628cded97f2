//! Patchable task listing command

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use gantry_tasks::patchable_tasks;

use crate::cli::output::{self, variant_style};
use crate::cli::workspace::load_project;
use crate::cli::{Cli, OutputFormat};

/// List the tasks a patch may request, per variant
#[derive(Debug, Args)]
pub struct TasksCommand {
    /// Project definition file
    #[arg(short, long)]
    pub project: PathBuf,
}

impl TasksCommand {
    /// Execute the tasks command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(project = %self.project.display(), "executing tasks command");
        let (project, _) = load_project(&self.project)?;
        let listing = patchable_tasks(&project);

        match cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&listing)?);
            }
            OutputFormat::Text => {
                if listing.is_empty() {
                    output::warning("No patchable tasks");
                    return Ok(());
                }
                for group in &listing {
                    let display = project
                        .variant(&group.variant)
                        .map(|v| v.display())
                        .unwrap_or(&group.variant);
                    println!("{}", variant_style().apply_to(display));
                    for task in &group.tasks {
                        println!("  {}", task);
                    }
                }
            }
        }
        Ok(())
    }
}
