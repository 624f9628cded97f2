//! Store error types

use std::fmt;

use thiserror::Error;

/// Record collections held by a store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Patches,
    Versions,
    Builds,
    Tasks,
}

impl Collection {
    /// All collections
    pub const ALL: [Collection; 4] = [Self::Patches, Self::Versions, Self::Builds, Self::Tasks];

    /// Collection name, also used as the file store directory
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Patches => "patches",
            Self::Versions => "versions",
            Self::Builds => "builds",
            Self::Tasks => "tasks",
        }
    }

    /// Singular record name for messages
    pub fn record(&self) -> &'static str {
        match self {
            Self::Patches => "patch",
            Self::Versions => "version",
            Self::Builds => "build",
            Self::Tasks => "task",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Store-related errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// One or more inserted ids already exist
    #[error("Duplicate {} id(s): {}", .collection.record(), .ids.join(", "))]
    Conflict {
        collection: Collection,
        ids: Vec<String>,
    },

    /// Record to update does not exist
    #[error("{} not found: {id}", .collection.record())]
    NotFound { collection: Collection, id: String },

    /// Id cannot be used as a record key
    #[error("Invalid record id: '{0}'")]
    InvalidId(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// Conflict on a single id
    pub fn conflict(collection: Collection, id: impl Into<String>) -> Self {
        Self::Conflict {
            collection,
            ids: vec![id.into()],
        }
    }

    /// Missing record
    pub fn not_found(collection: Collection, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection,
            id: id.into(),
        }
    }

    /// Ids rejected as duplicates, if this is a conflict
    pub fn conflicting_ids(&self) -> Option<&[String]> {
        match self {
            Self::Conflict { ids, .. } => Some(ids),
            _ => None,
        }
    }
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
