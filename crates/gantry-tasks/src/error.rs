//! Engine error types

use gantry_core::model::TVPair;
use gantry_core::ProjectError;
use gantry_store::{Collection, StoreError};
use thiserror::Error;

/// Errors raised while expanding a request into its dependency closure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClosureError {
    /// A requested variant is not defined by the project
    #[error("Unknown build variant '{0}'")]
    UnknownVariant(String),

    /// A requested task is not listed by its variant
    #[error("Build variant '{variant}' has no task '{task}'")]
    UnknownTask { variant: String, task: String },

    /// A requested or required task is disabled
    #[error("Task '{}' is disabled", .0)]
    DisabledTask(TVPair),

    /// A dependency points at a variant or task the project does not provide
    #[error("'{dependent}' depends on '{missing}', which the project does not define")]
    UnresolvedDependency { dependent: TVPair, missing: TVPair },
}

/// Errors raised by the materializer and the patch orchestrator
#[derive(Debug, Error)]
pub enum EngineError {
    /// Request could not be expanded
    #[error(transparent)]
    Closure(#[from] ClosureError),

    /// Patch already has a version
    #[error("Patch '{patch_id}' is already finalized")]
    AlreadyFinalized { patch_id: String },

    /// Patch has no version to extend
    #[error("Patch '{patch_id}' has not been finalized")]
    NotFinalized { patch_id: String },

    /// Materializer was asked for a variant the project does not define
    #[error("Unknown build variant '{variant}'")]
    UnknownVariant { variant: String },

    /// Materializer was asked for a task its variant does not list
    #[error("Build variant '{variant}' has no task '{task}'")]
    UnknownTask { variant: String, task: String },

    /// Id table has no entry for a task or dependency
    #[error("No task id allocated for '{variant}:{task}'")]
    MissingTaskId { variant: String, task: String },

    /// A build failed after others in the same batch were written
    #[error("Failed to materialize variant '{variant}' after creating {} build(s): {source}", .created_builds.len())]
    PartialMaterialization {
        variant: String,
        created_builds: Vec<String>,
        #[source]
        source: Box<EngineError>,
    },

    /// An id is taken by a record that is not the one being written
    #[error("{} '{id}' exists with different contents", .collection.record())]
    StoreConflict { collection: Collection, id: String },

    /// Any other store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Patch carries a project definition that does not decode
    #[error("Patch '{patch_id}' has an invalid project definition: {source}")]
    ProjectParse {
        patch_id: String,
        #[source]
        source: ProjectError,
    },

    /// Patch or version is missing
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Request names nothing to schedule, or uses a disabled form
    #[error("Invalid schedule request: {0}")]
    InvalidRequest(String),
}

impl EngineError {
    /// Missing patch
    pub fn patch_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "patch",
            id: id.into(),
        }
    }

    /// Missing version
    pub fn version_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "version",
            id: id.into(),
        }
    }

    /// The error behind any partial-materialization wrapper
    pub fn root(&self) -> &EngineError {
        match self {
            Self::PartialMaterialization { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
