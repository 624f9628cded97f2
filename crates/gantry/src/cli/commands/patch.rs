//! Patch management commands

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Subcommand};
use tracing::info;

use gantry_core::model::Patch;
use gantry_store::Store;

use crate::cli::output::{self, id_style};
use crate::cli::workspace::{block_on, load_project, Workspace};
use crate::cli::{Cli, OutputFormat};

/// Manage pending patches
#[derive(Debug, Args)]
pub struct PatchCommand {
    #[command(subcommand)]
    pub command: PatchSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum PatchSubcommand {
    /// Store a pending patch for a project definition
    Create(PatchCreateCommand),
}

impl PatchCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.command {
            PatchSubcommand::Create(cmd) => cmd.execute(cli),
        }
    }
}

/// Store a pending patch
#[derive(Debug, Args)]
pub struct PatchCreateCommand {
    /// Project definition with the patch applied
    #[arg(short, long)]
    pub project: PathBuf,

    /// Patch id
    #[arg(long)]
    pub id: String,

    /// Base revision
    #[arg(long)]
    pub githash: String,

    /// Patch description
    #[arg(short, long)]
    pub description: Option<String>,
}

impl PatchCreateCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(id = %self.id, project = %self.project.display(), "executing patch create command");
        block_on(self.execute_async(cli))?
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        let (project, content) = load_project(&self.project)?;
        let workspace = Workspace::load()?;
        let store = workspace.open_store().await?;

        let mut patch = Patch::new(&self.id, &project.identifier, &self.githash, content);
        if let Some(description) = &self.description {
            patch = patch.with_description(description);
        }
        store
            .insert_patch(&patch)
            .await
            .with_context(|| format!("failed to store patch {}", self.id))?;

        match cli.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&patch)?),
            OutputFormat::Text => {
                if !cli.quiet {
                    output::success(&format!(
                        "Created pending patch {}",
                        id_style().apply_to(&patch.id)
                    ));
                }
            }
        }
        Ok(())
    }
}
