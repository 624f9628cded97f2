//! Patch lifecycle: finalize, extend, schedule and cancel

use std::collections::HashMap;
use std::sync::Arc;

use gantry_core::model::{
    pairs_to_variant_tasks, union_pairs, variant_tasks_to_pairs, Build, BuildStatus, Patch,
    Project, Status, TVPair, Task, Version,
};
use gantry_core::Settings;
use gantry_store::{Collection, SharedStore, StoreError};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, instrument, warn};

use crate::closure::compute_closure;
use crate::error::{EngineError, Result};
use crate::id_table::TaskIdTable;
use crate::materialize::{BuildPlan, Materializer};
use crate::reporter::{PatchEvent, PatchReporterRegistry};
use crate::request::ScheduleRequest;

/// What extending a patch added
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtendOutcome {
    /// Task names the patch had not requested before
    pub new_tasks: Vec<String>,
    /// Variant names the patch had not requested before
    pub new_variants: Vec<String>,
    /// Builds created for variants the version did not have
    pub created_builds: Vec<String>,
    /// Task ids written, in new and existing builds
    pub created_tasks: Vec<String>,
}

impl ExtendOutcome {
    /// Whether nothing was written
    pub fn is_noop(&self) -> bool {
        self.created_builds.is_empty() && self.created_tasks.is_empty()
    }
}

/// Result of a schedule call
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleOutcome {
    /// The patch was pending and now has a version
    Finalized(Version),
    /// The patch was already finalized and was extended
    Extended(ExtendOutcome),
}

/// Result of a cancel call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The version was deactivated and aborted
    Aborted { version_id: String },
    /// The pending patch was removed
    Removed,
}

/// One planned change to a finalized version
enum ExtendStep<'b> {
    /// Add tasks to a build the version already has
    AddTasks { build: &'b Build, tasks: Vec<Task> },
    /// Create a build for a variant the version lacks
    NewBuild(BuildPlan),
}

/// Turns patches into versions, builds and tasks.
///
/// Finalization and extension are serialized per patch within one
/// orchestrator. Across orchestrators, finalization relies on the version
/// insert and the store's conditional version update, so two of them racing
/// on one patch produce a single version.
pub struct Orchestrator {
    store: SharedStore,
    settings: Settings,
    reporters: PatchReporterRegistry,
    patch_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Orchestrator {
    pub fn new(store: SharedStore, settings: Settings) -> Self {
        Self {
            store,
            settings,
            reporters: PatchReporterRegistry::default(),
            patch_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the reporter registry
    pub fn with_reporters(mut self, reporters: PatchReporterRegistry) -> Self {
        self.reporters = reporters;
        self
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Take the per-patch lock, creating it on first use
    async fn lock_patch(&self, patch_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.patch_locks.lock().await;
            locks
                .entry(patch_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Release the per-patch lock, dropping its entry if nobody is waiting
    async fn unlock_patch(&self, patch_id: &str, guard: OwnedMutexGuard<()>) {
        drop(guard);
        let mut locks = self.patch_locks.lock().await;
        if locks
            .get(patch_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(patch_id);
        }
    }

    async fn load_patch(&self, patch_id: &str) -> Result<Patch> {
        self.store
            .find_patch_by_id(patch_id)
            .await?
            .ok_or_else(|| EngineError::patch_not_found(patch_id))
    }

    async fn load_version(&self, version_id: &str) -> Result<Version> {
        self.store
            .find_version_by_id(version_id)
            .await?
            .ok_or_else(|| EngineError::version_not_found(version_id))
    }

    fn parse_project(patch: &Patch) -> Result<Project> {
        Project::from_yaml(&patch.patched_config).map_err(|source| EngineError::ProjectParse {
            patch_id: patch.id.clone(),
            source,
        })
    }

    /// Create the version, builds and tasks for a pending patch.
    ///
    /// Every pair in the dependency closure of the patch's request becomes
    /// an activated task. The patch is then marked finalized, and a caller
    /// that loses that transition gets `AlreadyFinalized`. The stored patch,
    /// not the caller's copy, decides whether it is still pending.
    #[instrument(skip_all, fields(patch = %patch.id))]
    pub async fn finalize(&self, patch: &Patch) -> Result<Version> {
        let guard = self.lock_patch(&patch.id).await;
        let result = self.finalize_locked(patch).await;
        self.unlock_patch(&patch.id, guard).await;
        result
    }

    async fn finalize_locked(&self, patch: &Patch) -> Result<Version> {
        let already_finalized = || EngineError::AlreadyFinalized {
            patch_id: patch.id.clone(),
        };
        if patch.is_finalized() || self.load_patch(&patch.id).await?.is_finalized() {
            return Err(already_finalized());
        }

        let project = Self::parse_project(patch)?;
        let closure = compute_closure(&project, &variant_tasks_to_pairs(&patch.variants_tasks))?;

        let mut version = Version::new(
            Version::id_for_patch(&patch.id),
            &project.identifier,
            &patch.githash,
        );
        version.config = patch.patched_config.clone();
        version.requester = self.settings.requester.clone();

        let table =
            TaskIdTable::with_digest_len(&version.id, &closure, self.settings.digest_len);
        debug!(version = %version.id, ids = table.len(), "allocated task ids");

        let groups = pairs_to_variant_tasks(&closure);
        let plans = {
            let materializer = Materializer::new(self.store.as_ref(), &project, &version, &table);
            groups
                .iter()
                .map(|g| materializer.plan_build(&g.variant, true, &g.tasks))
                .collect::<Result<Vec<_>>>()?
        };
        for plan in &plans {
            version.push_build(BuildStatus {
                build_variant: plan.build.build_variant.clone(),
                build_id: plan.build.id.clone(),
                activated: true,
            });
        }

        // The version id is fixed per patch, so inserting it claims the
        // patch before any build is written.
        if !self.insert_version(&version).await? {
            warn!(version = %version.id, "version already claimed by another request");
            return Err(already_finalized());
        }

        let materializer = Materializer::new(self.store.as_ref(), &project, &version, &table);
        let mut created: Vec<String> = Vec::with_capacity(plans.len());
        for plan in &plans {
            let build_id = match materializer.write_build(plan).await {
                Ok(id) => id,
                Err(e) => {
                    if matches!(e, EngineError::StoreConflict { .. })
                        && self.load_patch(&patch.id).await?.is_finalized()
                    {
                        return Err(already_finalized());
                    }
                    return Err(partial_ids(e, &plan.build.build_variant, &created));
                }
            };
            self.reporters.broadcast(&PatchEvent::BuildCreated {
                patch_id: patch.id.clone(),
                build_id: build_id.clone(),
                variant: plan.build.build_variant.clone(),
                tasks: plan.tasks.len(),
            });
            created.push(build_id);
        }

        let won = self
            .store
            .update_patch_set_version(&patch.id, &version.id, true)
            .await?;
        if !won {
            warn!(version = %version.id, "patch was finalized concurrently");
            return Err(already_finalized());
        }

        let (variants, tasks) = names_of(&closure);
        self.store
            .update_patch_variants_and_tasks(&patch.id, &variants, &tasks, &groups)
            .await?;

        info!(
            version = %version.id,
            builds = version.build_ids.len(),
            tasks = closure.len(),
            "patch finalized"
        );
        self.reporters.broadcast(&PatchEvent::Finalized {
            patch_id: patch.id.clone(),
            version_id: version.id.clone(),
            builds: version.build_ids.len(),
            tasks: closure.len(),
        });
        Ok(version)
    }

    /// Insert a version. An identical version already in place counts as
    /// inserted; a different one returns false.
    async fn insert_version(&self, version: &Version) -> Result<bool> {
        match self.store.insert_version(version).await {
            Ok(()) => Ok(true),
            Err(StoreError::Conflict { .. }) => {
                let existing = self.load_version(&version.id).await?;
                let same = existing.identifier == version.identifier
                    && existing.revision == version.revision
                    && existing.build_ids == version.build_ids;
                if same {
                    debug!(version = %version.id, "version already exists");
                }
                Ok(same)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Add `new_pairs` to a finalized patch.
    ///
    /// Existing builds gain the tasks they lack; variants without a build
    /// get a new one. The patch's cumulative request becomes the union of
    /// what it had and `new_pairs`. Running the same extension twice writes
    /// nothing the second time. Every record is planned before the first
    /// write, so a request whose dependencies are not covered writes nothing.
    #[instrument(skip_all, fields(patch = %patch.id, pairs = new_pairs.len()))]
    pub async fn extend(
        &self,
        patch: &Patch,
        version: &Version,
        project: &Project,
        new_pairs: &[TVPair],
    ) -> Result<ExtendOutcome> {
        if !patch.is_finalized() {
            return Err(EngineError::NotFinalized {
                patch_id: patch.id.clone(),
            });
        }

        let guard = self.lock_patch(&patch.id).await;
        let result = self
            .extend_locked(&patch.id, &version.id, project, new_pairs)
            .await;
        self.unlock_patch(&patch.id, guard).await;
        result
    }

    async fn extend_locked(
        &self,
        patch_id: &str,
        version_id: &str,
        project: &Project,
        new_pairs: &[TVPair],
    ) -> Result<ExtendOutcome> {
        // Missing work is computed from what is stored now, not from the
        // caller's copies.
        let patch = self.load_patch(patch_id).await?;
        let version = self.load_version(version_id).await?;

        let mut outcome = ExtendOutcome::default();
        for pair in new_pairs {
            if !patch.tasks.contains(&pair.task_name) && !outcome.new_tasks.contains(&pair.task_name)
            {
                outcome.new_tasks.push(pair.task_name.clone());
            }
            if !patch.build_variants.contains(&pair.variant)
                && !outcome.new_variants.contains(&pair.variant)
            {
                outcome.new_variants.push(pair.variant.clone());
            }
        }

        let all_pairs = union_pairs(&variant_tasks_to_pairs(&patch.variants_tasks), new_pairs);
        let table =
            TaskIdTable::with_digest_len(&version.id, &all_pairs, self.settings.digest_len);
        let builds = self.store.find_builds_by_ids(&version.build_ids).await?;
        let activation = self.settings.activate_on_extend.unwrap_or(patch.activated);

        let materializer = Materializer::new(self.store.as_ref(), project, &version, &table);
        let mut steps = Vec::new();
        for group in pairs_to_variant_tasks(new_pairs) {
            let existing = version
                .build_for_variant(&group.variant)
                .and_then(|id| builds.iter().find(|b| b.id == id));
            let step = match existing {
                Some(build) => ExtendStep::AddTasks {
                    build,
                    tasks: materializer.plan_added_tasks(build, &group.tasks)?,
                },
                None => {
                    ExtendStep::NewBuild(materializer.plan_build(&group.variant, activation, &group.tasks)?)
                }
            };
            steps.push(step);
        }

        for step in &steps {
            match step {
                ExtendStep::AddTasks { build, tasks } => {
                    let added = materializer
                        .write_added_tasks(&build.id, tasks)
                        .await
                        .map_err(|e| partial_ids(e, &build.build_variant, &outcome.created_builds))?;
                    if !added.is_empty() {
                        self.reporters.broadcast(&PatchEvent::TasksAdded {
                            patch_id: patch.id.clone(),
                            build_id: build.id.clone(),
                            tasks: added.len(),
                        });
                    }
                    outcome.created_tasks.extend(added);
                }
                ExtendStep::NewBuild(plan) => {
                    let variant = &plan.build.build_variant;
                    let build_id = materializer
                        .write_build(plan)
                        .await
                        .map_err(|e| partial_ids(e, variant, &outcome.created_builds))?;
                    self.store
                        .update_version_append_builds(
                            &version.id,
                            &[BuildStatus {
                                build_variant: variant.clone(),
                                build_id: build_id.clone(),
                                activated: activation,
                            }],
                        )
                        .await?;
                    self.reporters.broadcast(&PatchEvent::BuildCreated {
                        patch_id: patch.id.clone(),
                        build_id: build_id.clone(),
                        variant: variant.clone(),
                        tasks: plan.tasks.len(),
                    });
                    outcome.created_tasks.extend(plan.task_ids().iter().cloned());
                    outcome.created_builds.push(build_id);
                }
            }
        }

        let mut variants = patch.build_variants.clone();
        variants.extend(outcome.new_variants.iter().cloned());
        let mut tasks = patch.tasks.clone();
        tasks.extend(outcome.new_tasks.iter().cloned());
        self.store
            .update_patch_variants_and_tasks(
                &patch.id,
                &variants,
                &tasks,
                &pairs_to_variant_tasks(&all_pairs),
            )
            .await?;

        if outcome.is_noop() {
            debug!("extension added nothing");
        } else {
            info!(
                new_builds = outcome.created_builds.len(),
                new_tasks = outcome.created_tasks.len(),
                "patch extended"
            );
        }
        self.reporters.broadcast(&PatchEvent::Extended {
            patch_id: patch.id.clone(),
            new_builds: outcome.created_builds.len(),
            new_tasks: outcome.created_tasks.len(),
        });
        Ok(outcome)
    }

    /// Apply a user request to a patch: finalize it if pending, extend it
    /// otherwise.
    ///
    /// The request is expanded to its dependency closure before either
    /// path, and the description is updated on both.
    #[instrument(skip_all, fields(patch = %patch_id))]
    pub async fn schedule(
        &self,
        patch_id: &str,
        request: &ScheduleRequest,
    ) -> Result<ScheduleOutcome> {
        let mut patch = self.load_patch(patch_id).await?;
        let project = Self::parse_project(&patch)?;
        let requested = request.pairs(self.settings.allow_legacy_matrix)?;
        let closure = compute_closure(&project, &requested)?;
        debug!(
            requested = requested.len(),
            closure = closure.len(),
            "request expanded"
        );

        if let Some(description) = &request.description {
            self.store
                .update_patch_description(patch_id, description)
                .await?;
            patch.description = description.clone();
        }

        if patch.is_finalized() {
            let version = self.load_version(&patch.version).await?;
            let outcome = self.extend(&patch, &version, &project, &closure).await?;
            Ok(ScheduleOutcome::Extended(outcome))
        } else {
            patch.variants_tasks = pairs_to_variant_tasks(&closure);
            let version = self.finalize(&patch).await?;
            Ok(ScheduleOutcome::Finalized(version))
        }
    }

    /// Cancel a patch. A finalized patch keeps its records but they are
    /// deactivated and the version is aborted; a pending patch is removed.
    #[instrument(skip_all, fields(patch = %patch_id))]
    pub async fn cancel(&self, patch_id: &str) -> Result<CancelOutcome> {
        let patch = self.load_patch(patch_id).await?;

        let outcome = if patch.is_finalized() {
            self.store
                .set_version_activation(&patch.version, false)
                .await?;
            self.store
                .set_version_status(&patch.version, Status::Aborted)
                .await?;
            info!(version = %patch.version, "version aborted");
            CancelOutcome::Aborted {
                version_id: patch.version.clone(),
            }
        } else {
            self.store.remove_patch(patch_id).await?;
            info!("pending patch removed");
            CancelOutcome::Removed
        };

        self.reporters.broadcast(&PatchEvent::Cancelled {
            patch_id: patch_id.to_string(),
            finalized: patch.is_finalized(),
        });
        Ok(outcome)
    }
}

/// Distinct variant and task names, in first-seen order
fn names_of(pairs: &[TVPair]) -> (Vec<String>, Vec<String>) {
    let mut variants: Vec<String> = Vec::new();
    let mut tasks: Vec<String> = Vec::new();
    for pair in pairs {
        if !variants.contains(&pair.variant) {
            variants.push(pair.variant.clone());
        }
        if !tasks.contains(&pair.task_name) {
            tasks.push(pair.task_name.clone());
        }
    }
    (variants, tasks)
}

/// Wrap a materialization failure once earlier builds in the batch exist
fn partial_ids(err: EngineError, variant: &str, created: &[String]) -> EngineError {
    if created.is_empty() {
        return err;
    }
    EngineError::PartialMaterialization {
        variant: variant.to_string(),
        created_builds: created.to_vec(),
        source: Box::new(err),
    }
}
