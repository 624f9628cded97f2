//! Configuration types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::model::PATCH_REQUESTER;

/// Main configuration for Gantry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Version of the config schema
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Storage configuration
    pub store: StoreConfig,

    /// Id allocation configuration
    pub ids: IdsConfig,

    /// Patch scheduling configuration
    pub patch: PatchConfig,
}

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Root directory of the file store, relative to the config file
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".gantry/store"),
        }
    }
}

/// Id allocation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdsConfig {
    /// Number of hex digest characters appended to task and build ids
    pub digest_len: usize,
}

/// Default number of digest characters in allocated ids
pub const DEFAULT_DIGEST_LEN: usize = 10;

impl Default for IdsConfig {
    fn default() -> Self {
        Self {
            digest_len: DEFAULT_DIGEST_LEN,
        }
    }
}

/// Patch scheduling configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchConfig {
    /// Requester recorded on versions, builds and tasks
    pub requester: String,

    /// Activation for builds created when a patch is extended.
    /// Falls back to the patch's own activation when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activate_on_extend: Option<bool>,

    /// Accept the `variants` x `tasks` request form
    pub allow_legacy_matrix: bool,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            requester: PATCH_REQUESTER.to_string(),
            activate_on_extend: None,
            allow_legacy_matrix: true,
        }
    }
}

/// Runtime settings handed to the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Number of hex digest characters in allocated ids
    pub digest_len: usize,
    /// Requester recorded on created records
    pub requester: String,
    /// Activation override for builds created by extend
    pub activate_on_extend: Option<bool>,
    /// Accept the `variants` x `tasks` request form
    pub allow_legacy_matrix: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for Settings {
    fn from(config: &Config) -> Self {
        Self {
            digest_len: config.ids.digest_len,
            requester: config.patch.requester.clone(),
            activate_on_extend: config.patch.activate_on_extend,
            allow_legacy_matrix: config.patch.allow_legacy_matrix,
        }
    }
}

impl Settings {
    /// Set the digest length
    pub fn with_digest_len(mut self, digest_len: usize) -> Self {
        self.digest_len = digest_len;
        self
    }

    /// Set the extend activation override
    pub fn with_activate_on_extend(mut self, activated: bool) -> Self {
        self.activate_on_extend = Some(activated);
        self
    }

    /// Disable the legacy request form
    pub fn without_legacy_matrix(mut self) -> Self {
        self.allow_legacy_matrix = false;
        self
    }
}
