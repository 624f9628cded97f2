//! Closure preview command

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use gantry_core::model::{pairs_to_variant_tasks, TVPair};
use gantry_tasks::compute_closure;

use super::parse_pair;
use crate::cli::output::{self, variant_style};
use crate::cli::workspace::load_project;
use crate::cli::{Cli, OutputFormat};

/// Preview the dependency closure of a request
#[derive(Debug, Args)]
pub struct ClosureCommand {
    /// Project definition file
    #[arg(short, long)]
    pub project: PathBuf,

    /// Requested pairs as variant:task
    #[arg(required = true, value_parser = parse_pair)]
    pub pairs: Vec<TVPair>,
}

impl ClosureCommand {
    /// Execute the closure command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(project = %self.project.display(), pairs = self.pairs.len(), "executing closure command");
        let (project, _) = load_project(&self.project)?;
        let closure = compute_closure(&project, &self.pairs)?;

        match cli.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "requested": self.pairs.iter().map(|p| p.to_string()).collect::<Vec<_>>(),
                    "closure": pairs_to_variant_tasks(&closure),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => {
                if !cli.quiet {
                    println!(
                        "{}",
                        output::header(&format!(
                            "{} requested, {} in closure",
                            self.pairs.len(),
                            closure.len()
                        ))
                    );
                }
                for group in pairs_to_variant_tasks(&closure) {
                    println!("{}", variant_style().apply_to(&group.variant));
                    for task in &group.tasks {
                        let pulled_in = !self.pairs.contains(&TVPair::new(&group.variant, task));
                        if pulled_in {
                            println!("  {} (dependency)", task);
                        } else {
                            println!("  {}", task);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
