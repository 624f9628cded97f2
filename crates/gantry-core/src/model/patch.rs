//! Patch records: user-submitted change requests

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::pair::{variant_tasks_to_pairs, TVPair, VariantTasks};

/// A pending or finalized change request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    /// Patch identifier
    pub id: String,
    /// Project identifier
    pub project: String,
    /// Base revision the patch applies to
    pub githash: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Every task name requested so far
    #[serde(default)]
    pub tasks: Vec<String>,
    /// Every variant name requested so far
    #[serde(default)]
    pub build_variants: Vec<String>,
    /// Every (variant, tasks) grouping requested so far
    #[serde(default)]
    pub variants_tasks: Vec<VariantTasks>,
    /// Version id; empty until the patch is finalized
    #[serde(default)]
    pub version: String,
    /// Whether builds created for the patch are activated
    #[serde(default)]
    pub activated: bool,
    /// Project definition with the patch applied (YAML)
    #[serde(default)]
    pub patched_config: String,
    /// When the patch was submitted
    pub create_time: DateTime<Utc>,
}

impl Patch {
    /// Create a new pending patch
    pub fn new(
        id: impl Into<String>,
        project: impl Into<String>,
        githash: impl Into<String>,
        patched_config: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            project: project.into(),
            githash: githash.into(),
            description: String::new(),
            tasks: Vec::new(),
            build_variants: Vec::new(),
            variants_tasks: Vec::new(),
            version: String::new(),
            activated: false,
            patched_config: patched_config.into(),
            create_time: Utc::now(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the requested groupings
    pub fn with_variants_tasks(mut self, variants_tasks: Vec<VariantTasks>) -> Self {
        self.variants_tasks = variants_tasks;
        self
    }

    /// Whether a version has been created for this patch
    pub fn is_finalized(&self) -> bool {
        !self.version.is_empty()
    }

    /// Requested work as pairs
    pub fn requested_pairs(&self) -> Vec<TVPair> {
        variant_tasks_to_pairs(&self.variants_tasks)
    }
}
