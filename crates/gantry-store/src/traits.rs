//! Store trait

use std::sync::Arc;

use gantry_core::model::{Build, BuildStatus, Patch, Status, Task, VariantTasks, Version};

use crate::error::Result;

/// Shared handle to a store
pub type SharedStore = Arc<dyn Store>;

/// Persistence for the four record collections.
///
/// Every method touches a single document unless stated otherwise. Inserts
/// fail with [`StoreError::Conflict`](crate::StoreError::Conflict) when the
/// id is taken; updates fail with
/// [`StoreError::NotFound`](crate::StoreError::NotFound) when it is not.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Get the store name
    fn name(&self) -> &str;

    async fn find_patch_by_id(&self, id: &str) -> Result<Option<Patch>>;

    async fn find_version_by_id(&self, id: &str) -> Result<Option<Version>>;

    async fn find_build_by_id(&self, id: &str) -> Result<Option<Build>>;

    /// Builds for the given ids, in input order. Missing ids are skipped.
    async fn find_builds_by_ids(&self, ids: &[String]) -> Result<Vec<Build>>;

    async fn find_task_by_id(&self, id: &str) -> Result<Option<Task>>;

    /// Tasks for the given ids, in input order. Missing ids are skipped.
    async fn find_tasks_by_ids(&self, ids: &[String]) -> Result<Vec<Task>>;

    async fn insert_patch(&self, patch: &Patch) -> Result<()>;

    async fn insert_version(&self, version: &Version) -> Result<()>;

    /// Append build references to a version, skipping build ids it already holds
    async fn update_version_append_builds(
        &self,
        version_id: &str,
        builds: &[BuildStatus],
    ) -> Result<()>;

    async fn insert_build(&self, build: &Build) -> Result<()>;

    /// Append task ids to a build, skipping ids it already holds
    async fn update_build_append_tasks(&self, build_id: &str, task_ids: &[String]) -> Result<()>;

    /// Insert every task whose id is free. When some ids are taken the rest
    /// are still written and the conflict lists the taken ids.
    async fn insert_tasks(&self, tasks: &[Task]) -> Result<()>;

    /// Replace a patch's cumulative request
    async fn update_patch_variants_and_tasks(
        &self,
        patch_id: &str,
        build_variants: &[String],
        tasks: &[String],
        variants_tasks: &[VariantTasks],
    ) -> Result<()>;

    /// Set the patch's version and activation only if its version is still
    /// empty. Returns whether this call performed the transition.
    async fn update_patch_set_version(
        &self,
        patch_id: &str,
        version_id: &str,
        activated: bool,
    ) -> Result<bool>;

    async fn update_patch_description(&self, patch_id: &str, description: &str) -> Result<()>;

    /// Set activation on a version, each of its builds and their tasks.
    /// One document at a time.
    async fn set_version_activation(&self, version_id: &str, activated: bool) -> Result<()>;

    async fn set_version_status(&self, version_id: &str, status: Status) -> Result<()>;

    async fn remove_patch(&self, patch_id: &str) -> Result<()>;
}

/// Append `extra` to `list`, skipping values already present
pub(crate) fn append_missing(list: &mut Vec<String>, extra: &[String]) {
    for item in extra {
        if !list.contains(item) {
            list.push(item.clone());
        }
    }
}

/// Append build statuses to a version, skipping builds it already holds
pub(crate) fn append_build_statuses(version: &mut Version, builds: &[BuildStatus]) {
    for status in builds {
        if !version.build_ids.contains(&status.build_id) {
            version.push_build(status.clone());
        }
    }
}
