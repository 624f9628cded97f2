//! Project definition: build variants, tasks and their dependency edges

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ProjectError;

/// Reference from a task to a task it requires
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskRef {
    /// Name of the required task
    pub name: String,

    /// Variant the required task lives in; `None` means the dependent's own variant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

impl TaskRef {
    /// Dependency on a task in the same variant
    pub fn same_variant(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variant: None,
        }
    }

    /// Dependency on a task in another variant
    pub fn in_variant(name: impl Into<String>, variant: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variant: Some(variant.into()),
        }
    }

    /// Variant this reference points at, given the variant of the dependent task
    pub fn target_variant<'a>(&'a self, own_variant: &'a str) -> &'a str {
        self.variant.as_deref().unwrap_or(own_variant)
    }
}

/// Definition of a task in the project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDef {
    /// Task name (e.g., "compile", "test")
    pub name: String,

    /// Whether the task may be requested by a patch; unset means yes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patchable: Option<bool>,

    /// Disabled tasks are never materialized
    #[serde(default)]
    pub disabled: bool,

    /// Tasks that must run before this one
    #[serde(default)]
    pub depends_on: Vec<TaskRef>,
}

impl TaskDef {
    /// Create a new task definition
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            patchable: None,
            disabled: false,
            depends_on: Vec::new(),
        }
    }

    /// Add a dependency
    pub fn with_depends_on(mut self, dep: TaskRef) -> Self {
        self.depends_on.push(dep);
        self
    }

    /// Set the patchable flag
    pub fn with_patchable(mut self, patchable: bool) -> Self {
        self.patchable = Some(patchable);
        self
    }

    /// Mark the task disabled
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Only an explicit `patchable: false` opts a task out
    pub fn is_patchable(&self) -> bool {
        self.patchable != Some(false)
    }
}

/// A task listed by a build variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildVariantTask {
    /// Task name
    pub name: String,
}

/// A named build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildVariant {
    /// Variant name (e.g., "linux")
    pub name: String,

    /// Human-readable name
    #[serde(default)]
    pub display_name: String,

    /// Tasks run by this variant
    #[serde(default)]
    pub tasks: Vec<BuildVariantTask>,
}

impl BuildVariant {
    /// Create a new build variant
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: String::new(),
            tasks: Vec::new(),
        }
    }

    /// Set the human-readable name
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Add a task to the variant
    pub fn with_task(mut self, name: impl Into<String>) -> Self {
        self.tasks.push(BuildVariantTask { name: name.into() });
        self
    }

    /// Whether the variant lists a task
    pub fn has_task(&self, name: &str) -> bool {
        self.tasks.iter().any(|t| t.name == name)
    }

    /// Display name, falling back to the variant name
    pub fn display(&self) -> &str {
        if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }
}

/// Parsed project definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Project {
    /// Project identifier
    #[serde(default)]
    pub identifier: String,

    /// Build variants, in declaration order
    #[serde(default)]
    pub build_variants: Vec<BuildVariant>,

    /// Task definitions, in declaration order
    #[serde(default)]
    pub tasks: Vec<TaskDef>,
}

impl Project {
    /// Create an empty project
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            build_variants: Vec::new(),
            tasks: Vec::new(),
        }
    }

    /// Add a build variant
    pub fn with_variant(mut self, variant: BuildVariant) -> Self {
        self.build_variants.push(variant);
        self
    }

    /// Add a task definition
    pub fn with_task(mut self, task: TaskDef) -> Self {
        self.tasks.push(task);
        self
    }

    /// Decode and validate a project from YAML
    pub fn from_yaml(content: &str) -> Result<Self, ProjectError> {
        let project: Project = serde_yaml::from_str(content)?;
        project.validate()?;
        debug!(
            identifier = %project.identifier,
            variants = project.build_variants.len(),
            tasks = project.tasks.len(),
            "project decoded"
        );
        Ok(project)
    }

    /// Encode the project as YAML
    pub fn to_yaml(&self) -> Result<String, ProjectError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Check names are present and unique and that variants only list defined tasks.
    ///
    /// Dependency references are not checked here; the closure resolver
    /// reports them against the request that reaches them.
    pub fn validate(&self) -> Result<(), ProjectError> {
        let mut task_names = HashSet::new();
        for task in &self.tasks {
            if task.name.is_empty() {
                return Err(ProjectError::EmptyName("task"));
            }
            if !task_names.insert(task.name.as_str()) {
                return Err(ProjectError::DuplicateTask(task.name.clone()));
            }
        }

        let mut variant_names = HashSet::new();
        for variant in &self.build_variants {
            if variant.name.is_empty() {
                return Err(ProjectError::EmptyName("build variant"));
            }
            if !variant_names.insert(variant.name.as_str()) {
                return Err(ProjectError::DuplicateVariant(variant.name.clone()));
            }
            for task in &variant.tasks {
                if !task_names.contains(task.name.as_str()) {
                    return Err(ProjectError::UndefinedVariantTask {
                        variant: variant.name.clone(),
                        task: task.name.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Look up a task definition by name
    pub fn task(&self, name: &str) -> Option<&TaskDef> {
        self.tasks.iter().find(|t| t.name == name)
    }

    /// Look up a build variant by name
    pub fn variant(&self, name: &str) -> Option<&BuildVariant> {
        self.build_variants.iter().find(|v| v.name == name)
    }

    /// Whether `variant` exists and lists `task`
    pub fn variant_has_task(&self, variant: &str, task: &str) -> bool {
        self.variant(variant).is_some_and(|v| v.has_task(task))
    }

    /// Tasks a patch may request, in declaration order
    pub fn patchable_tasks(&self) -> Vec<&TaskDef> {
        self.tasks
            .iter()
            .filter(|t| t.is_patchable() && !t.disabled)
            .collect()
    }
}
