//! Task records: single units of executable work

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::TaskStatus;

/// A materialized task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Task id, allocated before the record is written
    pub id: String,
    /// Owning build id
    pub build_id: String,
    /// Owning version id
    pub version: String,
    /// Project identifier
    pub project: String,
    /// Build variant name
    pub build_variant: String,
    /// Task name
    pub display_name: String,
    /// Revision being built
    pub revision: String,
    /// When the task was created
    pub create_time: DateTime<Utc>,
    /// Ids of tasks that must finish first
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Whether the task may be dispatched
    pub activated: bool,
    /// Lifecycle state
    #[serde(default)]
    pub status: TaskStatus,
    /// What created the task
    #[serde(default)]
    pub requester: String,
}

impl Task {
    /// Compare the fields fixed at creation time.
    ///
    /// Two writers racing on the same deterministic id produce records that
    /// agree here even though their timestamps differ.
    pub fn same_identity(&self, other: &Task) -> bool {
        self.id == other.id
            && self.build_id == other.build_id
            && self.version == other.version
            && self.build_variant == other.build_variant
            && self.display_name == other.display_name
            && self.depends_on == other.depends_on
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(deps: &[&str]) -> Task {
        Task {
            id: "t1".to_string(),
            build_id: "b1".to_string(),
            version: "v1".to_string(),
            project: "widgets".to_string(),
            build_variant: "linux".to_string(),
            display_name: "test".to_string(),
            revision: "abc".to_string(),
            create_time: Utc::now(),
            depends_on: deps.iter().map(|d| d.to_string()).collect(),
            activated: true,
            status: TaskStatus::Undispatched,
            requester: String::new(),
        }
    }

    #[test]
    fn test_same_identity() {
        let a = task(&["t0"]);
        let mut b = task(&["t0"]);
        b.create_time = Utc::now() + chrono::Duration::seconds(5);
        b.activated = false;
        assert!(a.same_identity(&b));
    }

    #[test]
    fn test_different_edges_are_not_same_identity() {
        let a = task(&["t0"]);
        let b = task(&["t9"]);
        assert!(!a.same_identity(&b));
    }
}
