//! In-memory store

use std::collections::HashMap;

use gantry_core::model::{Build, BuildStatus, Patch, Status, Task, VariantTasks, Version};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Collection, Result, StoreError};
use crate::traits::{append_build_statuses, append_missing, Store};

/// In-memory store for tests and embedding. Not durable.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    patches: HashMap<String, Patch>,
    versions: HashMap<String, Version>,
    builds: HashMap<String, Build>,
    tasks: HashMap<String, Task>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in a collection
    pub async fn count(&self, collection: Collection) -> usize {
        let inner = self.inner.lock().await;
        match collection {
            Collection::Patches => inner.patches.len(),
            Collection::Versions => inner.versions.len(),
            Collection::Builds => inner.builds.len(),
            Collection::Tasks => inner.tasks.len(),
        }
    }
}

fn insert_unique<T: Clone>(
    map: &mut HashMap<String, T>,
    collection: Collection,
    id: &str,
    record: &T,
) -> Result<()> {
    if map.contains_key(id) {
        return Err(StoreError::conflict(collection, id));
    }
    map.insert(id.to_string(), record.clone());
    Ok(())
}

fn get_mut<'a, T>(
    map: &'a mut HashMap<String, T>,
    collection: Collection,
    id: &str,
) -> Result<&'a mut T> {
    map.get_mut(id)
        .ok_or_else(|| StoreError::not_found(collection, id))
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn find_patch_by_id(&self, id: &str) -> Result<Option<Patch>> {
        Ok(self.inner.lock().await.patches.get(id).cloned())
    }

    async fn find_version_by_id(&self, id: &str) -> Result<Option<Version>> {
        Ok(self.inner.lock().await.versions.get(id).cloned())
    }

    async fn find_build_by_id(&self, id: &str) -> Result<Option<Build>> {
        Ok(self.inner.lock().await.builds.get(id).cloned())
    }

    async fn find_builds_by_ids(&self, ids: &[String]) -> Result<Vec<Build>> {
        let inner = self.inner.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.builds.get(id).cloned())
            .collect())
    }

    async fn find_task_by_id(&self, id: &str) -> Result<Option<Task>> {
        Ok(self.inner.lock().await.tasks.get(id).cloned())
    }

    async fn find_tasks_by_ids(&self, ids: &[String]) -> Result<Vec<Task>> {
        let inner = self.inner.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.tasks.get(id).cloned())
            .collect())
    }

    async fn insert_patch(&self, patch: &Patch) -> Result<()> {
        let mut inner = self.inner.lock().await;
        insert_unique(&mut inner.patches, Collection::Patches, &patch.id, patch)
    }

    async fn insert_version(&self, version: &Version) -> Result<()> {
        let mut inner = self.inner.lock().await;
        insert_unique(
            &mut inner.versions,
            Collection::Versions,
            &version.id,
            version,
        )
    }

    async fn update_version_append_builds(
        &self,
        version_id: &str,
        builds: &[BuildStatus],
    ) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let version = get_mut(&mut inner.versions, Collection::Versions, version_id)?;
        append_build_statuses(version, builds);
        Ok(())
    }

    async fn insert_build(&self, build: &Build) -> Result<()> {
        let mut inner = self.inner.lock().await;
        insert_unique(&mut inner.builds, Collection::Builds, &build.id, build)
    }

    async fn update_build_append_tasks(&self, build_id: &str, task_ids: &[String]) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let build = get_mut(&mut inner.builds, Collection::Builds, build_id)?;
        append_missing(&mut build.task_ids, task_ids);
        Ok(())
    }

    async fn insert_tasks(&self, tasks: &[Task]) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let mut conflicts = Vec::new();
        for task in tasks {
            if inner.tasks.contains_key(&task.id) {
                conflicts.push(task.id.clone());
                continue;
            }
            inner.tasks.insert(task.id.clone(), task.clone());
        }
        if conflicts.is_empty() {
            Ok(())
        } else {
            debug!(count = conflicts.len(), "task insert hit existing ids");
            Err(StoreError::Conflict {
                collection: Collection::Tasks,
                ids: conflicts,
            })
        }
    }

    async fn update_patch_variants_and_tasks(
        &self,
        patch_id: &str,
        build_variants: &[String],
        tasks: &[String],
        variants_tasks: &[VariantTasks],
    ) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let patch = get_mut(&mut inner.patches, Collection::Patches, patch_id)?;
        patch.build_variants = build_variants.to_vec();
        patch.tasks = tasks.to_vec();
        patch.variants_tasks = variants_tasks.to_vec();
        Ok(())
    }

    async fn update_patch_set_version(
        &self,
        patch_id: &str,
        version_id: &str,
        activated: bool,
    ) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        let patch = get_mut(&mut inner.patches, Collection::Patches, patch_id)?;
        if patch.is_finalized() {
            return Ok(false);
        }
        patch.version = version_id.to_string();
        patch.activated = activated;
        Ok(true)
    }

    async fn update_patch_description(&self, patch_id: &str, description: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let patch = get_mut(&mut inner.patches, Collection::Patches, patch_id)?;
        patch.description = description.to_string();
        Ok(())
    }

    async fn set_version_activation(&self, version_id: &str, activated: bool) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let version = get_mut(&mut inner.versions, Collection::Versions, version_id)?;
        for status in &mut version.build_variants {
            status.activated = activated;
        }
        let build_ids = version.build_ids.clone();

        let mut task_ids = Vec::new();
        for id in &build_ids {
            if let Some(build) = inner.builds.get_mut(id) {
                build.activated = activated;
                task_ids.extend(build.task_ids.iter().cloned());
            }
        }
        for id in &task_ids {
            if let Some(task) = inner.tasks.get_mut(id) {
                task.activated = activated;
            }
        }
        Ok(())
    }

    async fn set_version_status(&self, version_id: &str, status: Status) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let version = get_mut(&mut inner.versions, Collection::Versions, version_id)?;
        version.status = status;
        Ok(())
    }

    async fn remove_patch(&self, patch_id: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner
            .patches
            .remove(patch_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(Collection::Patches, patch_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gantry_core::model::TaskStatus;

    fn task(id: &str) -> Task {
        Task {
            id: id.to_string(),
            build_id: "b1".to_string(),
            version: "v1".to_string(),
            project: "widgets".to_string(),
            build_variant: "linux".to_string(),
            display_name: id.to_string(),
            revision: "abc".to_string(),
            create_time: Utc::now(),
            depends_on: Vec::new(),
            activated: true,
            status: TaskStatus::Undispatched,
            requester: String::new(),
        }
    }

    fn build(id: &str, tasks: &[&str]) -> Build {
        Build {
            id: id.to_string(),
            version: "v1".to_string(),
            project: "widgets".to_string(),
            build_variant: "linux".to_string(),
            display_name: "Linux".to_string(),
            revision: "abc".to_string(),
            create_time: Utc::now(),
            task_ids: tasks.iter().map(|t| t.to_string()).collect(),
            activated: true,
            status: Status::Created,
            requester: String::new(),
        }
    }

    #[tokio::test]
    async fn test_insert_patch_conflict() {
        let store = MemoryStore::new();
        let patch = Patch::new("p1", "widgets", "abc", "");
        store.insert_patch(&patch).await.unwrap();

        let err = store.insert_patch(&patch).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Conflict {
                collection: Collection::Patches,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_set_version_is_conditional() {
        let store = MemoryStore::new();
        store
            .insert_patch(&Patch::new("p1", "widgets", "abc", ""))
            .await
            .unwrap();

        assert!(store.update_patch_set_version("p1", "p1_0", true).await.unwrap());
        assert!(!store.update_patch_set_version("p1", "other", true).await.unwrap());

        let patch = store.find_patch_by_id("p1").await.unwrap().unwrap();
        assert_eq!(patch.version, "p1_0");
        assert!(patch.activated);
    }

    #[tokio::test]
    async fn test_insert_tasks_reports_only_taken_ids() {
        let store = MemoryStore::new();
        store.insert_tasks(&[task("t1")]).await.unwrap();

        let err = store
            .insert_tasks(&[task("t1"), task("t2")])
            .await
            .unwrap_err();
        assert_eq!(err.conflicting_ids(), Some(&["t1".to_string()][..]));
        assert!(store.find_task_by_id("t2").await.unwrap().is_some());
        assert_eq!(store.count(Collection::Tasks).await, 2);
    }

    #[tokio::test]
    async fn test_append_tasks_skips_existing() {
        let store = MemoryStore::new();
        store.insert_build(&build("b1", &["t1"])).await.unwrap();
        store
            .update_build_append_tasks("b1", &["t1".to_string(), "t2".to_string()])
            .await
            .unwrap();

        let build = store.find_build_by_id("b1").await.unwrap().unwrap();
        assert_eq!(build.task_ids, vec!["t1", "t2"]);
    }

    #[tokio::test]
    async fn test_find_by_ids_keeps_order_and_skips_missing() {
        let store = MemoryStore::new();
        store.insert_tasks(&[task("a"), task("b")]).await.unwrap();

        let found = store
            .find_tasks_by_ids(&["b".to_string(), "zz".to_string(), "a".to_string()])
            .await
            .unwrap();
        let ids: Vec<_> = found.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_set_version_activation_cascades() {
        let store = MemoryStore::new();
        let mut version = Version::new("v1", "widgets", "abc");
        version.push_build(BuildStatus {
            build_variant: "linux".to_string(),
            build_id: "b1".to_string(),
            activated: true,
        });
        store.insert_version(&version).await.unwrap();
        store.insert_build(&build("b1", &["t1"])).await.unwrap();
        store.insert_tasks(&[task("t1")]).await.unwrap();

        store.set_version_activation("v1", false).await.unwrap();

        let version = store.find_version_by_id("v1").await.unwrap().unwrap();
        assert!(!version.build_variants[0].activated);
        assert!(!store.find_build_by_id("b1").await.unwrap().unwrap().activated);
        assert!(!store.find_task_by_id("t1").await.unwrap().unwrap().activated);
    }

    #[tokio::test]
    async fn test_updates_on_missing_records() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.update_patch_description("nope", "x").await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.remove_patch("nope").await,
            Err(StoreError::NotFound { .. })
        ));
    }
}
