//! Shared fixtures for engine tests

use std::sync::Arc;

use chrono::Utc;
use gantry_core::model::{
    Build, BuildVariant, Patch, Project, Status, TVPair, TaskDef, TaskRef, VariantTasks,
};
use gantry_core::Settings;
use gantry_store::{MemoryStore, Store};

use crate::lifecycle::Orchestrator;
use crate::reporter::PatchReporterRegistry;

/// `linux{compile, test -> compile}`, `osx{compile}`
pub const PROJECT_YAML: &str = r#"
identifier: widgets
build_variants:
  - name: linux
    display_name: Linux
    tasks:
      - name: compile
      - name: test
  - name: osx
    tasks:
      - name: compile
tasks:
  - name: compile
  - name: test
    depends_on:
      - name: compile
"#;

/// [`PROJECT_YAML`] plus `win{compile, test -> compile}`
pub const WIN_PROJECT_YAML: &str = r#"
identifier: widgets
build_variants:
  - name: linux
    tasks:
      - name: compile
      - name: test
  - name: osx
    tasks:
      - name: compile
  - name: win
    tasks:
      - name: compile
      - name: test
tasks:
  - name: compile
  - name: test
    depends_on:
      - name: compile
"#;

/// `deploy` requires a task in a variant that does not exist
pub const UNRESOLVED_PROJECT_YAML: &str = r#"
identifier: widgets
build_variants:
  - name: linux
    tasks:
      - name: deploy
tasks:
  - name: compile
  - name: deploy
    depends_on:
      - name: compile
        variant: staging
"#;

/// The project described by [`PROJECT_YAML`], built in code
pub fn scenario_project() -> Project {
    Project::new("widgets")
        .with_variant(
            BuildVariant::new("linux")
                .with_display_name("Linux")
                .with_task("compile")
                .with_task("test"),
        )
        .with_variant(BuildVariant::new("osx").with_task("compile"))
        .with_task(TaskDef::new("compile"))
        .with_task(TaskDef::new("test").with_depends_on(TaskRef::same_variant("compile")))
}

pub fn pair(variant: &str, task: &str) -> TVPair {
    TVPair::new(variant, task)
}

pub fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Orchestrator over a fresh memory store, without log reporting
pub fn orchestrator() -> (Orchestrator, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let orch = Orchestrator::new(store.clone(), Settings::default())
        .with_reporters(PatchReporterRegistry::empty());
    (orch, store)
}

/// Store a pending patch requesting `groups`
pub async fn insert_patch(
    store: &MemoryStore,
    id: &str,
    project_yaml: &str,
    groups: &[(&str, &[&str])],
) -> Patch {
    let patch = Patch::new(id, "widgets", "abc123", project_yaml).with_variants_tasks(
        groups
            .iter()
            .map(|(variant, tasks)| VariantTasks::new(*variant, tasks.iter().copied()))
            .collect(),
    );
    store.insert_patch(&patch).await.unwrap();
    patch
}

/// A bare build record
pub fn build_record(id: &str, variant: &str) -> Build {
    Build {
        id: id.to_string(),
        version: "p1_0".to_string(),
        project: "widgets".to_string(),
        build_variant: variant.to_string(),
        display_name: variant.to_string(),
        revision: "abc123".to_string(),
        create_time: Utc::now(),
        task_ids: Vec::new(),
        activated: true,
        status: Status::Created,
        requester: String::new(),
    }
}

#[test]
fn scenario_project_matches_yaml() {
    let parsed = Project::from_yaml(PROJECT_YAML).unwrap();
    let built = scenario_project();
    assert_eq!(parsed.to_yaml().unwrap(), built.to_yaml().unwrap());
}
