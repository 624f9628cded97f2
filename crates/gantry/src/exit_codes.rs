//! Exit codes for the CLI

use gantry_core::{ConfigError, GantryError, ProjectError};
use gantry_store::StoreError;
use gantry_tasks::EngineError;

/// Success
#[allow(dead_code)]
pub const SUCCESS: i32 = 0;

/// General error
pub const ERROR: i32 = 1;

/// Configuration error
pub const CONFIG_ERROR: i32 = 2;

/// Request or project definition rejected
pub const VALIDATION_ERROR: i32 = 3;

/// Patch is in the wrong state, or a record id is taken
pub const STATE_ERROR: i32 = 4;

/// Patch or version not found
pub const NOT_FOUND: i32 = 5;

/// Store failure
pub const STORE_ERROR: i32 = 6;

/// Pick the exit code for an error returned by a command
pub fn for_error(err: &anyhow::Error) -> i32 {
    if let Some(e) = err.downcast_ref::<EngineError>() {
        return for_engine_error(e);
    }
    if let Some(e) = err.downcast_ref::<StoreError>() {
        return match e {
            StoreError::NotFound { .. } => NOT_FOUND,
            StoreError::Conflict { .. } => STATE_ERROR,
            _ => STORE_ERROR,
        };
    }
    if err.downcast_ref::<ConfigError>().is_some() {
        return CONFIG_ERROR;
    }
    if err.downcast_ref::<ProjectError>().is_some() {
        return VALIDATION_ERROR;
    }
    if let Some(e) = err.downcast_ref::<GantryError>() {
        return match e {
            GantryError::Config(_) => CONFIG_ERROR,
            GantryError::Project(_) => VALIDATION_ERROR,
        };
    }
    ERROR
}

fn for_engine_error(err: &EngineError) -> i32 {
    match err.root() {
        EngineError::Closure(_)
        | EngineError::UnknownVariant { .. }
        | EngineError::UnknownTask { .. }
        | EngineError::MissingTaskId { .. }
        | EngineError::ProjectParse { .. }
        | EngineError::InvalidRequest(_) => VALIDATION_ERROR,
        EngineError::AlreadyFinalized { .. }
        | EngineError::NotFinalized { .. }
        | EngineError::StoreConflict { .. } => STATE_ERROR,
        EngineError::NotFound { .. } => NOT_FOUND,
        EngineError::Store(_) => STORE_ERROR,
        EngineError::PartialMaterialization { .. } => ERROR,
    }
}
