//! Default configuration values

use super::types::Config;

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "gantry.yaml";

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "gantry.toml";

/// Alternative configuration file name
pub const ALT_CONFIG_FILE: &str = ".gantry.yaml";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_YAML,
        DEFAULT_CONFIG_TOML,
        ALT_CONFIG_FILE,
        ".gantry.toml",
    ]
}

/// Generate default configuration YAML
pub fn default_config_yaml() -> String {
    let config = Config::default();
    serde_yaml::to_string(&config).unwrap_or_else(|_| DEFAULT_CONFIG_TEMPLATE.to_string())
}

/// Default configuration template
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Gantry Configuration

store:
  path: .gantry/store

ids:
  # hex characters of SHA-256 appended to task and build ids (4-64)
  digest_len: 10

patch:
  requester: patch_request
  # activate_on_extend: true
  allow_legacy_matrix: true
"#;
