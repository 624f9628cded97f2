//! Configuration validation

use tracing::debug;

use crate::error::{ConfigError, Result};

use super::types::Config;

/// Accepted range for `ids.digest_len`
pub const DIGEST_LEN_RANGE: std::ops::RangeInclusive<usize> = 4..=64;

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_store(config)?;
    validate_ids(config)?;
    validate_patch(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn validate_store(config: &Config) -> Result<()> {
    if config.store.path.as_os_str().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "store.path".to_string(),
            message: "path cannot be empty".to_string(),
        }
        .into());
    }
    Ok(())
}

fn validate_ids(config: &Config) -> Result<()> {
    if !DIGEST_LEN_RANGE.contains(&config.ids.digest_len) {
        return Err(ConfigError::InvalidValue {
            field: "ids.digest_len".to_string(),
            message: format!(
                "must be between {} and {}",
                DIGEST_LEN_RANGE.start(),
                DIGEST_LEN_RANGE.end()
            ),
        }
        .into());
    }
    Ok(())
}

fn validate_patch(config: &Config) -> Result<()> {
    if config.patch.requester.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "patch.requester".to_string(),
            message: "requester cannot be empty".to_string(),
        }
        .into());
    }
    Ok(())
}
