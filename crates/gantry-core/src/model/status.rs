//! Lifecycle states for versions, builds and tasks

use serde::{Deserialize, Serialize};

/// Lifecycle of a version or build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Records exist, nothing has run
    #[default]
    Created,
    /// At least one task has started
    Started,
    /// Every task succeeded
    Success,
    /// At least one task failed
    Failed,
    /// Cancelled by a user
    Aborted,
}

impl Status {
    /// Returns the string representation of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Started => "started",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Aborted => "aborted",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle of a single task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Not yet handed to an agent
    #[default]
    Undispatched,
    /// Assigned to an agent
    Dispatched,
    /// Running on an agent
    Started,
    /// Finished successfully
    Success,
    /// Finished unsuccessfully
    Failed,
}

impl TaskStatus {
    /// Returns the string representation of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Undispatched => "undispatched",
            Self::Dispatched => "dispatched",
            Self::Started => "started",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    /// Whether the task has not been picked up yet
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Undispatched)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&Status::Aborted).unwrap();
        assert_eq!(json, r#""aborted""#);
        let parsed: Status = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Status::Aborted);
    }

    #[test]
    fn test_task_status_defaults_to_undispatched() {
        assert_eq!(TaskStatus::default(), TaskStatus::Undispatched);
        assert!(TaskStatus::default().is_pending());
        assert!(!TaskStatus::Started.is_pending());
    }

    #[test]
    fn test_display() {
        assert_eq!(Status::Created.to_string(), "created");
        assert_eq!(TaskStatus::Undispatched.to_string(), "undispatched");
    }
}
