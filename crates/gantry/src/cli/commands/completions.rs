//! Shell completions command

use std::io::Write;
use std::path::PathBuf;

use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};
use tracing::info;

use crate::cli::output::{self, path_style};
use crate::cli::Cli;

const BIN_NAME: &str = "gantry";

/// Generate shell completions
#[derive(Debug, Args)]
pub struct CompletionsCommand {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl CompletionsCommand {
    /// Execute the completions command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(shell = %self.shell, "executing completions command");

        match &self.output {
            Some(path) => {
                let mut file = std::fs::File::create(path)?;
                render(self.shell, &mut file);
                file.flush()?;
                if !cli.quiet {
                    output::success(&format!(
                        "Completions written to {}",
                        path_style().apply_to(path.display())
                    ));
                }
            }
            None => render(self.shell, &mut std::io::stdout()),
        }
        Ok(())
    }
}

fn render(shell: Shell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, BIN_NAME, out);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bash_script_covers_subcommands() {
        let mut buf = Vec::new();
        render(Shell::Bash, &mut buf);
        let script = String::from_utf8(buf).unwrap();
        assert!(script.contains(BIN_NAME));
        assert!(script.contains("schedule"));
        assert!(script.contains("cancel"));
    }
}
