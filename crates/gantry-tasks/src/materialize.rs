//! Build and task record generation

use std::collections::HashSet;

use chrono::Utc;
use gantry_core::model::{Build, BuildVariant, Project, Status, Task, TaskStatus, Version};
use gantry_store::{Collection, Store, StoreError};
use tracing::{debug, info, instrument, warn};

use crate::error::{EngineError, Result};
use crate::id_table::TaskIdTable;

/// A build and its tasks, validated but not yet written
#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub build: Build,
    pub tasks: Vec<Task>,
}

impl BuildPlan {
    /// Ids of the planned tasks, in order
    pub fn task_ids(&self) -> &[String] {
        &self.build.task_ids
    }
}

/// Writes builds and tasks for one version.
///
/// Ids come from the table, so re-running a materialization that was cut
/// short finds its own earlier records and continues from there. Planning
/// never touches the store; every name and dependency is checked before the
/// first write.
pub struct Materializer<'a> {
    store: &'a dyn Store,
    project: &'a Project,
    version: &'a Version,
    table: &'a TaskIdTable,
    requester: &'a str,
}

impl<'a> Materializer<'a> {
    pub fn new(
        store: &'a dyn Store,
        project: &'a Project,
        version: &'a Version,
        table: &'a TaskIdTable,
    ) -> Self {
        Self {
            store,
            project,
            version,
            table,
            requester: &version.requester,
        }
    }

    /// Build the records for `variant` holding one task per name
    pub fn plan_build(
        &self,
        variant: &str,
        activated: bool,
        task_names: &[String],
    ) -> Result<BuildPlan> {
        let bv = self.checked_variant(variant, task_names)?;
        let build_id = self.table.build_id(variant);

        let mut tasks = Vec::with_capacity(task_names.len());
        for name in dedup(task_names) {
            tasks.push(self.make_task(bv, &build_id, name, activated)?);
        }

        let build = Build {
            id: build_id,
            version: self.version.id.clone(),
            project: self.project.identifier.clone(),
            build_variant: bv.name.clone(),
            display_name: bv.display().to_string(),
            revision: self.version.revision.clone(),
            create_time: Utc::now(),
            task_ids: tasks.iter().map(|t| t.id.clone()).collect(),
            activated,
            status: Status::Created,
            requester: self.requester.to_string(),
        };
        Ok(BuildPlan { build, tasks })
    }

    /// Write a planned build, then its tasks.
    ///
    /// A build already stored under the id is accepted when it has the same
    /// identity. If its version already lists it, it must also hold exactly
    /// the planned tasks; otherwise it is left over from an interrupted run
    /// and gains the planned tasks.
    #[instrument(skip_all, fields(version = %self.version.id, build = %plan.build.id, tasks = plan.tasks.len()))]
    pub async fn write_build(&self, plan: &BuildPlan) -> Result<String> {
        let build = &plan.build;
        match self.store.insert_build(build).await {
            Ok(()) => {}
            Err(StoreError::Conflict { .. }) => self.reconcile_build(build).await?,
            Err(e) => return Err(e.into()),
        }

        self.insert_tasks(&plan.tasks).await?;

        info!(tasks = plan.tasks.len(), activated = build.activated, "build created");
        Ok(build.id.clone())
    }

    /// Plan and write a build for `variant` holding one task per name.
    ///
    /// Returns the build id.
    pub async fn create_build(
        &self,
        variant: &str,
        activated: bool,
        task_names: &[String],
    ) -> Result<String> {
        let plan = self.plan_build(variant, activated, task_names)?;
        self.write_build(&plan).await
    }

    /// Tasks for the names that `build` does not already hold.
    ///
    /// New tasks take the build's activation.
    pub fn plan_added_tasks(&self, build: &Build, task_names: &[String]) -> Result<Vec<Task>> {
        let bv = self.checked_variant(&build.build_variant, task_names)?;

        let mut tasks = Vec::new();
        for name in dedup(task_names) {
            let task = self.make_task(bv, &build.id, name, build.activated)?;
            if !build.has_task(&task.id) {
                tasks.push(task);
            }
        }
        Ok(tasks)
    }

    /// Write planned tasks and append them to their build. Returns their ids.
    #[instrument(skip_all, fields(build = %build_id, tasks = tasks.len()))]
    pub async fn write_added_tasks(&self, build_id: &str, tasks: &[Task]) -> Result<Vec<String>> {
        if tasks.is_empty() {
            debug!("build already holds every requested task");
            return Ok(Vec::new());
        }

        self.insert_tasks(tasks).await?;
        let ids: Vec<String> = tasks.iter().map(|t| t.id.clone()).collect();
        self.store.update_build_append_tasks(build_id, &ids).await?;

        info!(added = ids.len(), "tasks added to build");
        Ok(ids)
    }

    /// Add the named tasks that `build` does not already hold.
    ///
    /// Returns the ids of the tasks that were added.
    pub async fn add_tasks_to_build(
        &self,
        build: &Build,
        task_names: &[String],
    ) -> Result<Vec<String>> {
        let tasks = self.plan_added_tasks(build, task_names)?;
        self.write_added_tasks(&build.id, &tasks).await
    }

    async fn reconcile_build(&self, build: &Build) -> Result<()> {
        let conflict = || EngineError::StoreConflict {
            collection: Collection::Builds,
            id: build.id.clone(),
        };
        let existing = self
            .store
            .find_build_by_id(&build.id)
            .await?
            .ok_or_else(conflict)?;
        if !existing.same_identity(build) {
            return Err(conflict());
        }

        let referenced = self
            .store
            .find_version_by_id(&build.version)
            .await?
            .is_some_and(|v| v.build_ids.contains(&build.id));
        if referenced {
            if !same_members(&existing.task_ids, &build.task_ids) {
                warn!(build = %build.id, "build already holds a different task set");
                return Err(conflict());
            }
            debug!(build = %build.id, "build already exists");
        } else {
            debug!(build = %build.id, "build already exists, completing membership");
            self.store
                .update_build_append_tasks(&build.id, &build.task_ids)
                .await?;
        }
        Ok(())
    }

    fn checked_variant(&self, variant: &str, task_names: &[String]) -> Result<&'a BuildVariant> {
        let bv = self
            .project
            .variant(variant)
            .ok_or_else(|| EngineError::UnknownVariant {
                variant: variant.to_string(),
            })?;
        if let Some(name) = task_names.iter().find(|n| !bv.has_task(n)) {
            return Err(EngineError::UnknownTask {
                variant: variant.to_string(),
                task: name.clone(),
            });
        }
        Ok(bv)
    }

    fn make_task(
        &self,
        bv: &BuildVariant,
        build_id: &str,
        name: &str,
        activated: bool,
    ) -> Result<Task> {
        let id = self.lookup(&bv.name, name)?;

        let mut depends_on = Vec::new();
        if let Some(def) = self.project.task(name) {
            for reference in &def.depends_on {
                let target = reference.target_variant(&bv.name);
                depends_on.push(self.lookup(target, &reference.name)?);
            }
        }

        Ok(Task {
            id,
            build_id: build_id.to_string(),
            version: self.version.id.clone(),
            project: self.project.identifier.clone(),
            build_variant: bv.name.clone(),
            display_name: name.to_string(),
            revision: self.version.revision.clone(),
            create_time: Utc::now(),
            depends_on,
            activated,
            status: TaskStatus::Undispatched,
            requester: self.requester.to_string(),
        })
    }

    fn lookup(&self, variant: &str, task: &str) -> Result<String> {
        self.table
            .get(variant, task)
            .map(str::to_string)
            .ok_or_else(|| EngineError::MissingTaskId {
                variant: variant.to_string(),
                task: task.to_string(),
            })
    }

    /// Insert tasks, accepting ids that already hold an identical task
    async fn insert_tasks(&self, tasks: &[Task]) -> Result<()> {
        let taken = match self.store.insert_tasks(tasks).await {
            Ok(()) => return Ok(()),
            Err(StoreError::Conflict { ids, .. }) => ids,
            Err(e) => return Err(e.into()),
        };

        let existing = self.store.find_tasks_by_ids(&taken).await?;
        for id in &taken {
            let expected = tasks.iter().find(|t| &t.id == id);
            let stored = existing.iter().find(|t| &t.id == id);
            match (expected, stored) {
                (Some(expected), Some(stored)) if stored.same_identity(expected) => {
                    debug!(task = %id, "task already exists");
                }
                _ => {
                    warn!(task = %id, "task id taken by a different record");
                    return Err(EngineError::StoreConflict {
                        collection: Collection::Tasks,
                        id: id.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn same_members(a: &[String], b: &[String]) -> bool {
    let a: HashSet<&String> = a.iter().collect();
    let b: HashSet<&String> = b.iter().collect();
    a == b
}

fn dedup(names: &[String]) -> impl Iterator<Item = &str> {
    let mut seen = HashSet::new();
    names
        .iter()
        .map(String::as_str)
        .filter(move |n| seen.insert(*n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{names, pair, scenario_project};
    use gantry_store::MemoryStore;

    fn version() -> Version {
        Version::new("p1_0", "widgets", "abc123")
    }

    #[tokio::test]
    async fn test_create_build_writes_build_and_tasks() {
        let store = MemoryStore::new();
        let project = scenario_project();
        let version = version();
        let table = TaskIdTable::new(
            &version.id,
            &[pair("linux", "compile"), pair("linux", "test")],
        );
        let m = Materializer::new(&store, &project, &version, &table);

        let build_id = m
            .create_build("linux", false, &names(&["compile", "test"]))
            .await
            .unwrap();

        let build = store.find_build_by_id(&build_id).await.unwrap().unwrap();
        assert_eq!(build.task_ids.len(), 2);
        assert!(!build.activated);
        assert_eq!(build.display_name, "Linux");

        let tasks = store.find_tasks_by_ids(&build.task_ids).await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().all(|t| !t.activated && t.status == TaskStatus::Undispatched));

        let compile_id = table.get("linux", "compile").unwrap();
        let test = tasks.iter().find(|t| t.display_name == "test").unwrap();
        assert_eq!(test.depends_on, vec![compile_id.to_string()]);
    }

    #[tokio::test]
    async fn test_create_build_validates_names() {
        let store = MemoryStore::new();
        let project = scenario_project();
        let version = version();
        let table = TaskIdTable::new(&version.id, &[pair("osx", "compile")]);
        let m = Materializer::new(&store, &project, &version, &table);

        assert!(matches!(
            m.create_build("windows", true, &names(&["compile"])).await,
            Err(EngineError::UnknownVariant { .. })
        ));
        assert!(matches!(
            m.create_build("osx", true, &names(&["test"])).await,
            Err(EngineError::UnknownTask { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_dependency_id() {
        let store = MemoryStore::new();
        let project = scenario_project();
        let version = version();
        let table = TaskIdTable::new(&version.id, &[pair("linux", "test")]);
        let m = Materializer::new(&store, &project, &version, &table);

        let err = m
            .create_build("linux", true, &names(&["test"]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::MissingTaskId { ref variant, ref task } if variant == "linux" && task == "compile"
        ));
    }

    #[tokio::test]
    async fn test_rerun_accepts_identical_records() {
        let store = MemoryStore::new();
        let project = scenario_project();
        let version = version();
        let table = TaskIdTable::new(&version.id, &[pair("osx", "compile")]);
        let m = Materializer::new(&store, &project, &version, &table);

        let first = m.create_build("osx", true, &names(&["compile"])).await.unwrap();
        let second = m.create_build("osx", true, &names(&["compile"])).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.count(Collection::Tasks).await, 1);
    }

    #[tokio::test]
    async fn test_foreign_record_on_build_id_is_conflict() {
        let store = MemoryStore::new();
        let project = scenario_project();
        let version = version();
        let table = TaskIdTable::new(&version.id, &[pair("osx", "compile")]);

        let mut squatter = crate::testutil::build_record(&table.build_id("osx"), "osx");
        squatter.version = "someone_else".to_string();
        store.insert_build(&squatter).await.unwrap();

        let m = Materializer::new(&store, &project, &version, &table);
        let err = m
            .create_build("osx", true, &names(&["compile"]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::StoreConflict {
                collection: Collection::Builds,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_add_tasks_skips_existing() {
        let store = MemoryStore::new();
        let project = scenario_project();
        let version = version();
        let table = TaskIdTable::new(
            &version.id,
            &[pair("linux", "compile"), pair("linux", "test")],
        );
        let m = Materializer::new(&store, &project, &version, &table);
        let build_id = m
            .create_build("linux", true, &names(&["compile"]))
            .await
            .unwrap();
        let build = store.find_build_by_id(&build_id).await.unwrap().unwrap();

        let added = m
            .add_tasks_to_build(&build, &names(&["compile", "test"]))
            .await
            .unwrap();
        assert_eq!(added, vec![table.get("linux", "test").unwrap().to_string()]);

        let build = store.find_build_by_id(&build_id).await.unwrap().unwrap();
        assert_eq!(build.task_ids.len(), 2);
        let again = m
            .add_tasks_to_build(&build, &names(&["compile", "test"]))
            .await
            .unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn test_planning_writes_nothing() {
        let store = MemoryStore::new();
        let project = scenario_project();
        let version = version();
        let table = TaskIdTable::new(
            &version.id,
            &[pair("linux", "compile"), pair("linux", "test")],
        );
        let m = Materializer::new(&store, &project, &version, &table);

        let plan = m
            .plan_build("linux", true, &names(&["compile", "test", "compile"]))
            .unwrap();
        assert_eq!(plan.tasks.len(), 2);
        assert_eq!(plan.task_ids(), &plan.build.task_ids[..]);
        assert_eq!(store.count(Collection::Builds).await, 0);
        assert_eq!(store.count(Collection::Tasks).await, 0);
    }

    #[tokio::test]
    async fn test_listed_build_keeps_its_task_set() {
        let store = MemoryStore::new();
        let project = scenario_project();
        let mut version = version();
        let table = TaskIdTable::new(
            &version.id,
            &[pair("linux", "compile"), pair("linux", "test")],
        );
        let build_id = table.build_id("linux");
        version.push_build(gantry_core::model::BuildStatus {
            build_variant: "linux".to_string(),
            build_id: build_id.clone(),
            activated: true,
        });
        store.insert_version(&version).await.unwrap();

        let m = Materializer::new(&store, &project, &version, &table);
        m.create_build("linux", true, &names(&["compile"])).await.unwrap();

        let err = m
            .create_build("linux", true, &names(&["compile", "test"]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::StoreConflict {
                collection: Collection::Builds,
                ..
            }
        ));
        let build = store.find_build_by_id(&build_id).await.unwrap().unwrap();
        assert_eq!(build.task_ids.len(), 1);
        assert_eq!(store.count(Collection::Tasks).await, 1);
    }

    #[tokio::test]
    async fn test_unlisted_build_is_completed() {
        let store = MemoryStore::new();
        let project = scenario_project();
        let version = version();
        let table = TaskIdTable::new(
            &version.id,
            &[pair("linux", "compile"), pair("linux", "test")],
        );
        let m = Materializer::new(&store, &project, &version, &table);

        // Left behind by a run that stopped before listing it on the version
        m.create_build("linux", true, &names(&["compile"])).await.unwrap();
        let build_id = m
            .create_build("linux", true, &names(&["compile", "test"]))
            .await
            .unwrap();

        let build = store.find_build_by_id(&build_id).await.unwrap().unwrap();
        assert_eq!(build.task_ids.len(), 2);
        assert_eq!(store.count(Collection::Tasks).await, 2);
    }
}
