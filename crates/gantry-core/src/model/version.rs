//! Version records: one schedulable unit of work

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::Status;

/// Requester recorded on versions created from patches
pub const PATCH_REQUESTER: &str = "patch_request";

/// Summary of one build inside a version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStatus {
    /// Build variant name
    pub build_variant: String,
    /// Build id
    pub build_id: String,
    /// Whether the build is activated
    pub activated: bool,
}

/// A commit or finalized patch, expanded into builds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    /// Version id
    pub id: String,
    /// When the version was created
    pub create_time: DateTime<Utc>,
    /// Project identifier
    pub identifier: String,
    /// Revision the version builds
    pub revision: String,
    /// Build ids, in creation order
    #[serde(default)]
    pub build_ids: Vec<String>,
    /// Per-build summaries, parallel to `build_ids`
    #[serde(default)]
    pub build_variants: Vec<BuildStatus>,
    /// Project definition the version was expanded from
    #[serde(default)]
    pub config: String,
    /// Lifecycle state
    #[serde(default)]
    pub status: Status,
    /// What created the version
    #[serde(default)]
    pub requester: String,
}

impl Version {
    /// Id of the version created when a patch is finalized
    pub fn id_for_patch(patch_id: &str) -> String {
        format!("{}_{}", patch_id, 0)
    }

    /// Create a version with no builds
    pub fn new(
        id: impl Into<String>,
        identifier: impl Into<String>,
        revision: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            create_time: Utc::now(),
            identifier: identifier.into(),
            revision: revision.into(),
            build_ids: Vec::new(),
            build_variants: Vec::new(),
            config: String::new(),
            status: Status::Created,
            requester: PATCH_REQUESTER.to_string(),
        }
    }

    /// Build id for a variant, if the version has one
    pub fn build_for_variant(&self, variant: &str) -> Option<&str> {
        self.build_variants
            .iter()
            .find(|b| b.build_variant == variant)
            .map(|b| b.build_id.as_str())
    }

    /// Append a build reference
    pub fn push_build(&mut self, status: BuildStatus) {
        self.build_ids.push(status.build_id.clone());
        self.build_variants.push(status);
    }
}
