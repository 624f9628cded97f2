//! CLI definition and command handling

pub mod commands;
pub mod output;
pub mod workspace;

use clap::{Parser, Subcommand};

use commands::{
    CancelCommand, ClosureCommand, CompletionsCommand, InitCommand, PatchCommand,
    ScheduleCommand, StatusCommand, TasksCommand, ValidateCommand,
};

/// Gantry - patch scheduling for CI
#[derive(Debug, Parser)]
#[command(name = "gantry")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Initialize a new Gantry configuration
    Init(InitCommand),

    /// Preview the dependency closure of a request
    Closure(ClosureCommand),

    /// List the tasks a patch may request
    Tasks(TasksCommand),

    /// Manage pending patches
    Patch(PatchCommand),

    /// Finalize or extend a patch
    Schedule(ScheduleCommand),

    /// Cancel a patch
    Cancel(CancelCommand),

    /// Show a patch with its version, builds and tasks
    Status(StatusCommand),

    /// Validate configuration and a project definition
    Validate(ValidateCommand),

    /// Generate shell completions
    Completions(CompletionsCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(&self) -> anyhow::Result<()> {
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)?;
        }

        match &self.command {
            Commands::Init(cmd) => cmd.execute(self),
            Commands::Closure(cmd) => cmd.execute(self),
            Commands::Tasks(cmd) => cmd.execute(self),
            Commands::Patch(cmd) => cmd.execute(self),
            Commands::Schedule(cmd) => cmd.execute(self),
            Commands::Cancel(cmd) => cmd.execute(self),
            Commands::Status(cmd) => cmd.execute(self),
            Commands::Validate(cmd) => cmd.execute(self),
            Commands::Completions(cmd) => cmd.execute(self),
        }
    }
}
