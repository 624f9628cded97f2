//! Init command

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use gantry_core::config::defaults::{DEFAULT_CONFIG_TEMPLATE, DEFAULT_CONFIG_TOML, DEFAULT_CONFIG_YAML};
use gantry_core::config::Config;

use crate::cli::output::{self, path_style};
use crate::cli::Cli;

/// Initialize a new Gantry configuration
#[derive(Debug, Args)]
pub struct InitCommand {
    /// Force overwrite existing configuration
    #[arg(short, long)]
    pub force: bool,

    /// Write TOML instead of YAML
    #[arg(long)]
    pub toml: bool,

    /// Output file path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl InitCommand {
    /// Execute the init command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(force = self.force, toml = self.toml, "executing init command");
        let cwd = std::env::current_dir()?;
        let default_name = if self.toml {
            DEFAULT_CONFIG_TOML
        } else {
            DEFAULT_CONFIG_YAML
        };
        let config_path = self
            .output
            .clone()
            .unwrap_or_else(|| cwd.join(default_name));

        if config_path.exists() && !self.force {
            anyhow::bail!(
                "Configuration file already exists at {}. Use --force to overwrite.",
                config_path.display()
            );
        }

        let content = render_config(self.toml)?;
        std::fs::write(&config_path, &content)?;

        if !cli.quiet {
            output::success(&format!(
                "Created {}",
                path_style().apply_to(config_path.display())
            ));
        }
        Ok(())
    }
}

fn render_config(toml: bool) -> anyhow::Result<String> {
    if toml {
        let config: Config = serde_yaml::from_str(DEFAULT_CONFIG_TEMPLATE)?;
        Ok(toml::to_string_pretty(&config)?)
    } else {
        Ok(DEFAULT_CONFIG_TEMPLATE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendered_configs_parse_back() {
        let yaml = render_config(false).unwrap();
        let from_yaml: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(from_yaml, Config::default());

        let toml_text = render_config(true).unwrap();
        let from_toml: Config = toml::from_str(&toml_text).unwrap();
        assert_eq!(from_toml, Config::default());
    }
}
