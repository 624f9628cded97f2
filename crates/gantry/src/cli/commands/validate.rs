//! Validate command

use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use gantry_core::config::{load_config_from_dir, validation::validate_config};
use gantry_core::{ConfigError, GantryError};

use crate::cli::workspace::load_project;
use crate::cli::{Cli, OutputFormat};
use crate::exit_codes;

/// Validate configuration and a project definition
#[derive(Debug, Args)]
pub struct ValidateCommand {
    /// Project definition file to check as well
    #[arg(short, long)]
    pub project: Option<PathBuf>,

    /// Strict mode - treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

impl ValidateCommand {
    /// Execute the validate command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(strict = self.strict, "executing validate command");
        let cwd = std::env::current_dir()?;

        let mut errors: Vec<String> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();

        let config_path = match load_config_from_dir(&cwd) {
            Ok((config, path)) => {
                if let Err(e) = validate_config(&config) {
                    errors.push(format!("Configuration validation: {}", e));
                }
                Some(path)
            }
            Err(GantryError::Config(ConfigError::NotFound(_))) => {
                warnings.push("No configuration file found, defaults apply".to_string());
                None
            }
            Err(e) => {
                errors.push(format!("Configuration: {}", e));
                None
            }
        };

        let mut variants = 0;
        if let Some(path) = &self.project {
            match load_project(path) {
                Ok((project, _)) => {
                    variants = project.build_variants.len();
                    if project.patchable_tasks().is_empty() {
                        warnings.push("Project has no patchable tasks".to_string());
                    }
                }
                Err(e) => errors.push(format!("Project: {:#}", e)),
            }
        }

        if self.strict {
            errors.append(&mut warnings);
        }

        let passed = errors.is_empty();

        match cli.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "valid": passed,
                    "config_path": config_path.map(|p| p.to_string_lossy().to_string()),
                    "variants": variants,
                    "errors": errors,
                    "warnings": warnings
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => {
                if !cli.quiet {
                    println!("{}", style("Validation Results").bold());
                    println!();

                    if let Some(path) = config_path {
                        println!("Config: {}", style(path.display()).cyan());
                        println!();
                    }

                    if !errors.is_empty() {
                        println!("{}", style("Errors:").red().bold());
                        for error in &errors {
                            println!("  {} {}", style("✗").red(), error);
                        }
                        println!();
                    }

                    if !warnings.is_empty() {
                        println!("{}", style("Warnings:").yellow().bold());
                        for warning in &warnings {
                            println!("  {} {}", style("!").yellow(), warning);
                        }
                        println!();
                    }

                    if passed {
                        println!("{}", style("✓ All checks passed").green().bold());
                    } else {
                        println!(
                            "{} with {} error(s)",
                            style("✗ Validation failed").red().bold(),
                            errors.len()
                        );
                    }
                }
            }
        }

        if !passed {
            std::process::exit(exit_codes::VALIDATION_ERROR);
        }

        Ok(())
    }
}
