//! File-backed store: one JSON document per record

use std::io::Write;
use std::path::{Path, PathBuf};

use gantry_core::model::{Build, BuildStatus, Patch, Status, Task, VariantTasks, Version};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Collection, Result, StoreError};
use crate::traits::{append_build_statuses, append_missing, Store};

/// Extension of the marker that records a patch's finalization
const CLAIM_EXTENSION: &str = "finalized";

/// Contents of a patch's finalization marker
#[derive(Debug, Serialize, Deserialize)]
struct FinalizeClaim {
    version: String,
    activated: bool,
}

/// Store that keeps each record in `<root>/<collection>/<id>.json`.
///
/// Every write goes through a uniquely named temporary file. Inserts link
/// it into place without replacing, so a taken id is reported as a conflict
/// even across processes, and updates rename it over the document.
///
/// Finalizing a patch creates `patches/<id>.finalized` the same way;
/// whoever creates it wins, in any process. Patch reads apply the marker, so
/// a patch document rewritten by a stale reader still shows its version.
/// Other read-modify-write updates are serialized within one `FileStore`
/// instance only.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open a store rooted at `root`, creating the collection directories
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for collection in Collection::ALL {
            tokio::fs::create_dir_all(root.join(collection.as_str())).await?;
        }
        info!(root = %root.display(), "opened file store");
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    /// Store root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, collection: Collection, id: &str) -> Result<PathBuf> {
        validate_id(id)?;
        Ok(self
            .root
            .join(collection.as_str())
            .join(format!("{}.json", id)))
    }

    fn claim_path(&self, patch_id: &str) -> Result<PathBuf> {
        validate_id(patch_id)?;
        Ok(self
            .root
            .join(Collection::Patches.as_str())
            .join(format!("{}.{}", patch_id, CLAIM_EXTENSION)))
    }

    async fn read<T: DeserializeOwned>(&self, collection: Collection, id: &str) -> Result<Option<T>> {
        let path = self.path_for(collection, id)?;
        read_json(&path).await
    }

    async fn read_many<T: DeserializeOwned>(
        &self,
        collection: Collection,
        ids: &[String],
    ) -> Result<Vec<T>> {
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(record) = self.read(collection, id).await? {
                records.push(record);
            }
        }
        Ok(records)
    }

    async fn read_existing<T: DeserializeOwned>(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<T> {
        self.read(collection, id)
            .await?
            .ok_or_else(|| StoreError::not_found(collection, id))
    }

    /// Read a patch with its finalization marker applied
    async fn read_patch(&self, id: &str) -> Result<Option<Patch>> {
        let Some(mut patch) = self.read::<Patch>(Collection::Patches, id).await? else {
            return Ok(None);
        };
        if !patch.is_finalized() {
            if let Some(claim) = read_json::<FinalizeClaim>(&self.claim_path(id)?).await? {
                patch.version = claim.version;
                patch.activated = claim.activated;
            }
        }
        Ok(Some(patch))
    }

    async fn read_existing_patch(&self, id: &str) -> Result<Patch> {
        self.read_patch(id)
            .await?
            .ok_or_else(|| StoreError::not_found(Collection::Patches, id))
    }

    async fn create<T: Serialize>(&self, collection: Collection, id: &str, record: &T) -> Result<()> {
        let path = self.path_for(collection, id)?;
        if !create_new(&path, &serde_json::to_vec_pretty(record)?).await? {
            return Err(StoreError::conflict(collection, id));
        }
        debug!(collection = %collection, id, "record created");
        Ok(())
    }

    async fn replace<T: Serialize>(&self, collection: Collection, id: &str, record: &T) -> Result<()> {
        let path = self.path_for(collection, id)?;
        let bytes = serde_json::to_vec_pretty(record)?;
        tokio::task::spawn_blocking(move || write_atomic(&path, &bytes))
            .await
            .map_err(|e| StoreError::Other(format!("write task failed: {}", e)))??;
        debug!(collection = %collection, id, "record replaced");
        Ok(())
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Write `bytes` to a file that must not exist yet. Returns false if it does.
async fn create_new(path: &Path, bytes: &[u8]) -> Result<bool> {
    let path = path.to_path_buf();
    let bytes = bytes.to_vec();
    let created = tokio::task::spawn_blocking(move || write_new(&path, &bytes))
        .await
        .map_err(|e| StoreError::Other(format!("write task failed: {}", e)))??;
    Ok(created)
}

fn temp_with(path: &Path, bytes: &[u8]) -> std::io::Result<tempfile::NamedTempFile> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

/// Readers never see a partly written record
fn write_new(path: &Path, bytes: &[u8]) -> std::io::Result<bool> {
    match temp_with(path, bytes)?.persist_noclobber(path) {
        Ok(_) => Ok(true),
        Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e.error),
    }
}

/// Replace `path` through a temporary file unique to this write
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    temp_with(path, bytes)?.persist(path)?;
    Ok(())
}

/// Ids become file names, so they must be a single plain path component
fn validate_id(id: &str) -> Result<()> {
    let valid = !id.is_empty()
        && id != "."
        && id != ".."
        && !id.starts_with('.')
        && !id.contains(['/', '\\', '\0']);
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidId(id.to_string()))
    }
}

#[async_trait::async_trait]
impl Store for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn find_patch_by_id(&self, id: &str) -> Result<Option<Patch>> {
        self.read_patch(id).await
    }

    async fn find_version_by_id(&self, id: &str) -> Result<Option<Version>> {
        self.read(Collection::Versions, id).await
    }

    async fn find_build_by_id(&self, id: &str) -> Result<Option<Build>> {
        self.read(Collection::Builds, id).await
    }

    async fn find_builds_by_ids(&self, ids: &[String]) -> Result<Vec<Build>> {
        self.read_many(Collection::Builds, ids).await
    }

    async fn find_task_by_id(&self, id: &str) -> Result<Option<Task>> {
        self.read(Collection::Tasks, id).await
    }

    async fn find_tasks_by_ids(&self, ids: &[String]) -> Result<Vec<Task>> {
        self.read_many(Collection::Tasks, ids).await
    }

    async fn insert_patch(&self, patch: &Patch) -> Result<()> {
        self.create(Collection::Patches, &patch.id, patch).await
    }

    async fn insert_version(&self, version: &Version) -> Result<()> {
        self.create(Collection::Versions, &version.id, version).await
    }

    async fn update_version_append_builds(
        &self,
        version_id: &str,
        builds: &[BuildStatus],
    ) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut version: Version = self.read_existing(Collection::Versions, version_id).await?;
        append_build_statuses(&mut version, builds);
        self.replace(Collection::Versions, version_id, &version).await
    }

    async fn insert_build(&self, build: &Build) -> Result<()> {
        self.create(Collection::Builds, &build.id, build).await
    }

    async fn update_build_append_tasks(&self, build_id: &str, task_ids: &[String]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut build: Build = self.read_existing(Collection::Builds, build_id).await?;
        append_missing(&mut build.task_ids, task_ids);
        self.replace(Collection::Builds, build_id, &build).await
    }

    async fn insert_tasks(&self, tasks: &[Task]) -> Result<()> {
        let mut conflicts = Vec::new();
        for task in tasks {
            match self.create(Collection::Tasks, &task.id, task).await {
                Ok(()) => {}
                Err(StoreError::Conflict { ids, .. }) => conflicts.extend(ids),
                Err(e) => return Err(e),
            }
        }
        if conflicts.is_empty() {
            Ok(())
        } else {
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
        let _guard = self.write_lock.lock().await;
        let mut patch = self.read_existing_patch(patch_id).await?;
        patch.build_variants = build_variants.to_vec();
        patch.tasks = tasks.to_vec();
        patch.variants_tasks = variants_tasks.to_vec();
        self.replace(Collection::Patches, patch_id, &patch).await
    }

    async fn update_patch_set_version(
        &self,
        patch_id: &str,
        version_id: &str,
        activated: bool,
    ) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut patch = self.read_existing_patch(patch_id).await?;
        if patch.is_finalized() {
            return Ok(false);
        }

        let claim = FinalizeClaim {
            version: version_id.to_string(),
            activated,
        };
        let path = self.claim_path(patch_id)?;
        if !create_new(&path, &serde_json::to_vec(&claim)?).await? {
            debug!(patch = patch_id, "finalization claimed elsewhere");
            return Ok(false);
        }

        patch.version = claim.version;
        patch.activated = claim.activated;
        self.replace(Collection::Patches, patch_id, &patch).await?;
        Ok(true)
    }

    async fn update_patch_description(&self, patch_id: &str, description: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut patch = self.read_existing_patch(patch_id).await?;
        patch.description = description.to_string();
        self.replace(Collection::Patches, patch_id, &patch).await
    }

    async fn set_version_activation(&self, version_id: &str, activated: bool) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut version: Version = self.read_existing(Collection::Versions, version_id).await?;
        for status in &mut version.build_variants {
            status.activated = activated;
        }
        self.replace(Collection::Versions, version_id, &version)
            .await?;

        for build_id in &version.build_ids {
            let Some(mut build) = self.read::<Build>(Collection::Builds, build_id).await? else {
                continue;
            };
            build.activated = activated;
            self.replace(Collection::Builds, build_id, &build).await?;

            for task_id in &build.task_ids {
                if let Some(mut task) = self.read::<Task>(Collection::Tasks, task_id).await? {
                    task.activated = activated;
                    self.replace(Collection::Tasks, task_id, &task).await?;
                }
            }
        }
        Ok(())
    }

    async fn set_version_status(&self, version_id: &str, status: Status) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut version: Version = self.read_existing(Collection::Versions, version_id).await?;
        version.status = status;
        self.replace(Collection::Versions, version_id, &version)
            .await
    }

    async fn remove_patch(&self, patch_id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.path_for(Collection::Patches, patch_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::not_found(Collection::Patches, patch_id));
            }
            Err(e) => return Err(e.into()),
        }
        match tokio::fs::remove_file(self.claim_path(patch_id)?).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
