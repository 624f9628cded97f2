//! Configuration loading

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{ConfigError, Result};

use super::defaults::config_file_names;
use super::types::Config;
use super::validation::validate_config;

/// Load configuration from a file
pub fn load_config(path: &Path) -> Result<Config> {
    let format = if path.extension().is_some_and(|e| e == "toml") {
        "TOML"
    } else {
        "YAML"
    };
    info!(path = %path.display(), format, "loading config");

    let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

    let config: Config = if format == "TOML" {
        toml::from_str(&content).map_err(ConfigError::TomlError)?
    } else {
        serde_yaml::from_str(&content).map_err(ConfigError::YamlError)?
    };

    validate_config(&config)?;
    debug!(path = %path.display(), "config loaded and validated");
    Ok(config)
}

/// Find configuration file in directory or parent directories.
///
/// At each directory level the search checks `<dir>/<name>` and then
/// `<dir>/.github/<name>`. The first match wins.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    debug!(start_dir = %start_dir.display(), "searching for config file");
    let mut current = start_dir.to_path_buf();

    loop {
        for name in config_file_names() {
            let config_path = current.join(name);
            if config_path.exists() {
                info!(path = %config_path.display(), "found config file");
                return Some(config_path);
            }

            let github_path = current.join(".github").join(name);
            if github_path.exists() {
                info!(path = %github_path.display(), "found config file in .github/");
                return Some(github_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    debug!("no config file found");
    None
}

/// Load configuration from directory (searching parent directories)
pub fn load_config_from_dir(dir: &Path) -> Result<(Config, PathBuf)> {
    let config_path = find_config(dir).ok_or_else(|| ConfigError::NotFound(dir.to_path_buf()))?;

    let config = load_config(&config_path)?;
    Ok((config, config_path))
}

/// Load configuration or use defaults
pub fn load_config_or_default(dir: &Path) -> (Config, Option<PathBuf>) {
    match load_config_from_dir(dir) {
        Ok((config, path)) => (config, Some(path)),
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "no usable config found, using defaults");
            (Config::default(), None)
        }
    }
}

/// Resolve the store root: relative paths are taken from the directory that
/// holds the config file, or from `dir` when running on defaults.
pub fn resolve_store_path(config: &Config, config_path: Option<&Path>, dir: &Path) -> PathBuf {
    if config.store.path.is_absolute() {
        return config.store.path.clone();
    }
    let base = config_path
        .and_then(|p| p.parent())
        .map(|p| {
            if p.file_name().is_some_and(|n| n == ".github") {
                p.parent().unwrap_or(p)
            } else {
                p
            }
        })
        .unwrap_or(dir);
    base.join(&config.store.path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_yaml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("gantry.yaml");
        std::fs::write(&config_path, "ids:\n  digest_len: 12\n").unwrap();

        let found = find_config(temp.path());
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_prefers_yaml_over_toml() {
        let temp = TempDir::new().unwrap();
        let toml_path = temp.path().join("gantry.toml");
        let yaml_path = temp.path().join("gantry.yaml");
        std::fs::write(&toml_path, "[ids]\ndigest_len = 12\n").unwrap();
        std::fs::write(&yaml_path, "ids:\n  digest_len: 12\n").unwrap();

        let found = find_config(temp.path()).unwrap();
        assert_eq!(found, yaml_path);
    }

    #[test]
    fn test_find_config_in_github_dir() {
        let temp = TempDir::new().unwrap();
        let github_dir = temp.path().join(".github");
        std::fs::create_dir_all(&github_dir).unwrap();
        let config_path = github_dir.join("gantry.toml");
        std::fs::write(&config_path, "[ids]\ndigest_len = 12\n").unwrap();

        let found = find_config(temp.path());
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_walks_up() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("gantry.yaml");
        std::fs::write(&config_path, "ids:\n  digest_len: 12\n").unwrap();
        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_config(&nested), Some(config_path));
    }

    #[test]
    fn test_load_config_toml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("gantry.toml");
        std::fs::write(
            &config_path,
            "[ids]\ndigest_len = 16\n\n[patch]\nallow_legacy_matrix = false\n",
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.ids.digest_len, 16);
        assert!(!config.patch.allow_legacy_matrix);
    }

    #[test]
    fn test_load_config_rejects_invalid_values() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("gantry.yaml");
        std::fs::write(&config_path, "ids:\n  digest_len: 2\n").unwrap();

        assert!(load_config(&config_path).is_err());
    }

    #[test]
    fn test_resolve_store_path_relative_to_config() {
        let temp = TempDir::new().unwrap();
        let github_dir = temp.path().join(".github");
        let config_path = github_dir.join("gantry.yaml");
        let config = Config::default();

        let resolved = resolve_store_path(&config, Some(&config_path), Path::new("/elsewhere"));
        assert_eq!(resolved, temp.path().join(".gantry/store"));

        let resolved = resolve_store_path(&config, None, Path::new("/work"));
        assert_eq!(resolved, PathBuf::from("/work/.gantry/store"));
    }
}
