//! Schedule requests and the tasks a patch may ask for

use gantry_core::model::{
    cross_product, variant_tasks_to_pairs, Project, TVPair, VariantTasks,
};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// What a user asks to run for a patch.
///
/// Two forms are accepted: explicit `variants_tasks` groupings, or the
/// legacy `variants` x `tasks` matrix. The explicit form wins when both
/// are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    #[serde(default)]
    pub variants_tasks: Vec<VariantTasks>,
    #[serde(default)]
    pub variants: Vec<String>,
    #[serde(default)]
    pub tasks: Vec<String>,
    /// New patch description; left unchanged when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ScheduleRequest {
    /// Request explicit pairs
    pub fn from_pairs(pairs: &[TVPair]) -> Self {
        Self {
            variants_tasks: gantry_core::model::pairs_to_variant_tasks(pairs),
            ..Default::default()
        }
    }

    /// Request every task on every variant
    pub fn from_matrix(variants: Vec<String>, tasks: Vec<String>) -> Self {
        Self {
            variants,
            tasks,
            ..Default::default()
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Pairs this request names, before dependency expansion
    pub fn pairs(&self, allow_legacy_matrix: bool) -> Result<Vec<TVPair>> {
        let pairs = if !self.variants_tasks.is_empty() {
            variant_tasks_to_pairs(&self.variants_tasks)
        } else if !self.variants.is_empty() || !self.tasks.is_empty() {
            if !allow_legacy_matrix {
                return Err(EngineError::InvalidRequest(
                    "the variants x tasks form is disabled; list variant/task pairs".to_string(),
                ));
            }
            cross_product(&self.variants, &self.tasks)
        } else {
            Vec::new()
        };

        if pairs.is_empty() {
            return Err(EngineError::InvalidRequest("no tasks requested".to_string()));
        }
        Ok(pairs)
    }
}

/// Patchable tasks per variant, in declaration order. Variants with none
/// are left out.
pub fn patchable_tasks(project: &Project) -> Vec<VariantTasks> {
    let patchable: Vec<&str> = project
        .patchable_tasks()
        .into_iter()
        .map(|t| t.name.as_str())
        .collect();

    project
        .build_variants
        .iter()
        .filter_map(|bv| {
            let tasks: Vec<&str> = bv
                .tasks
                .iter()
                .map(|t| t.name.as_str())
                .filter(|name| patchable.contains(name))
                .collect();
            (!tasks.is_empty()).then(|| VariantTasks::new(&bv.name, tasks))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{names, pair, scenario_project};
    use gantry_core::model::{BuildVariant, TaskDef};

    #[test]
    fn test_explicit_form_wins() {
        let request = ScheduleRequest {
            variants_tasks: vec![VariantTasks::new("linux", ["test"])],
            variants: names(&["osx"]),
            tasks: names(&["compile"]),
            description: None,
        };
        assert_eq!(request.pairs(false).unwrap(), vec![pair("linux", "test")]);
    }

    #[test]
    fn test_matrix_form() {
        let request =
            ScheduleRequest::from_matrix(names(&["linux", "osx"]), names(&["compile"]));
        assert_eq!(
            request.pairs(true).unwrap(),
            vec![pair("linux", "compile"), pair("osx", "compile")]
        );
    }

    #[test]
    fn test_matrix_form_can_be_disabled() {
        let request = ScheduleRequest::from_matrix(names(&["linux"]), names(&["compile"]));
        assert!(matches!(
            request.pairs(false),
            Err(EngineError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_empty_request_is_rejected() {
        assert!(ScheduleRequest::default().pairs(true).is_err());
        let half = ScheduleRequest::from_matrix(names(&["linux"]), Vec::new());
        assert!(half.pairs(true).is_err());
    }

    #[test]
    fn test_patchable_tasks_per_variant() {
        let project = scenario_project()
            .with_variant(BuildVariant::new("release").with_task("publish"))
            .with_task(TaskDef::new("publish").with_patchable(false));

        let listing = patchable_tasks(&project);
        assert_eq!(
            listing,
            vec![
                VariantTasks::new("linux", ["compile", "test"]),
                VariantTasks::new("osx", ["compile"]),
            ]
        );
    }
}
