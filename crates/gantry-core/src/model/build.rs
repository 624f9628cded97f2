//! Build records: one variant's worth of work within a version

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::Status;

/// A build: the tasks of one variant for one version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Build {
    /// Build id
    pub id: String,
    /// Owning version id
    pub version: String,
    /// Project identifier
    pub project: String,
    /// Build variant name
    pub build_variant: String,
    /// Human-readable variant name
    pub display_name: String,
    /// Revision being built
    pub revision: String,
    /// When the build was created
    pub create_time: DateTime<Utc>,
    /// Task ids, in creation order
    #[serde(default)]
    pub task_ids: Vec<String>,
    /// Whether the build's tasks may be dispatched
    pub activated: bool,
    /// Lifecycle state
    #[serde(default)]
    pub status: Status,
    /// What created the build
    #[serde(default)]
    pub requester: String,
}

impl Build {
    /// Whether the build already references a task id
    pub fn has_task(&self, task_id: &str) -> bool {
        self.task_ids.iter().any(|id| id == task_id)
    }

    /// Compare the fields fixed at creation time, ignoring timestamps and
    /// membership that may have grown since
    pub fn same_identity(&self, other: &Build) -> bool {
        self.id == other.id
            && self.version == other.version
            && self.project == other.project
            && self.build_variant == other.build_variant
    }
}
