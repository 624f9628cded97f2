//! Dependency closure over (variant, task) pairs

use std::collections::{HashSet, VecDeque};

use gantry_core::model::{Project, TVPair};
use tracing::{debug, instrument};

use crate::error::ClosureError;

/// Expand `seeds` until every required task is included.
///
/// Seeds come first in the output, followed by discovered pairs in the
/// order they were reached. Each pair appears once. The traversal keeps a
/// visited set, so dependency cycles terminate.
#[instrument(skip_all, fields(project = %project.identifier, seeds = seeds.len()))]
pub fn compute_closure(project: &Project, seeds: &[TVPair]) -> Result<Vec<TVPair>, ClosureError> {
    let mut visited: HashSet<TVPair> = HashSet::new();
    let mut closure = Vec::new();
    let mut queue = VecDeque::new();

    for seed in seeds {
        check_seed(project, seed)?;
        if visited.insert(seed.clone()) {
            closure.push(seed.clone());
            queue.push_back(seed.clone());
        }
    }

    while let Some(pair) = queue.pop_front() {
        for dep in dependencies_of(project, &pair)? {
            if visited.insert(dep.clone()) {
                debug!(dependent = %pair, dependency = %dep, "pulled in dependency");
                closure.push(dep.clone());
                queue.push_back(dep);
            }
        }
    }

    debug!(
        requested = seeds.len(),
        total = closure.len(),
        "closure computed"
    );
    Ok(closure)
}

/// Direct requirements of `pair`, each checked against the project
pub fn dependencies_of(project: &Project, pair: &TVPair) -> Result<Vec<TVPair>, ClosureError> {
    let Some(def) = project.task(&pair.task_name) else {
        return Ok(Vec::new());
    };

    let mut deps = Vec::with_capacity(def.depends_on.len());
    for reference in &def.depends_on {
        let dep = TVPair::new(reference.target_variant(&pair.variant), &reference.name);
        if !project.variant_has_task(&dep.variant, &dep.task_name) {
            return Err(ClosureError::UnresolvedDependency {
                dependent: pair.clone(),
                missing: dep,
            });
        }
        if project.task(&dep.task_name).is_some_and(|t| t.disabled) {
            return Err(ClosureError::DisabledTask(dep));
        }
        deps.push(dep);
    }
    Ok(deps)
}

fn check_seed(project: &Project, seed: &TVPair) -> Result<(), ClosureError> {
    let variant = project
        .variant(&seed.variant)
        .ok_or_else(|| ClosureError::UnknownVariant(seed.variant.clone()))?;
    if !variant.has_task(&seed.task_name) {
        return Err(ClosureError::UnknownTask {
            variant: seed.variant.clone(),
            task: seed.task_name.clone(),
        });
    }
    if project.task(&seed.task_name).is_some_and(|t| t.disabled) {
        return Err(ClosureError::DisabledTask(seed.clone()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{pair, scenario_project};
    use gantry_core::model::{BuildVariant, TaskDef, TaskRef};
    use proptest::prelude::*;

    #[test]
    fn test_closure_pulls_in_same_variant_dependency() {
        let project = scenario_project();
        let closure = compute_closure(&project, &[pair("linux", "test")]).unwrap();
        assert_eq!(closure, vec![pair("linux", "test"), pair("linux", "compile")]);
    }

    #[test]
    fn test_dependency_free_seeds_are_their_own_closure() {
        let project = scenario_project();
        let seeds = vec![pair("osx", "compile"), pair("linux", "compile")];
        assert_eq!(compute_closure(&project, &seeds).unwrap(), seeds);
    }

    #[test]
    fn test_seed_order_then_discovery_order_without_duplicates() {
        let project = scenario_project();
        let seeds = vec![
            pair("linux", "test"),
            pair("osx", "compile"),
            pair("linux", "test"),
        ];
        let closure = compute_closure(&project, &seeds).unwrap();
        assert_eq!(
            closure,
            vec![
                pair("linux", "test"),
                pair("osx", "compile"),
                pair("linux", "compile"),
            ]
        );
    }

    #[test]
    fn test_cross_variant_dependency() {
        let project = Project::new("widgets")
            .with_variant(BuildVariant::new("linux").with_task("package"))
            .with_variant(BuildVariant::new("osx").with_task("compile"))
            .with_task(TaskDef::new("compile"))
            .with_task(
                TaskDef::new("package").with_depends_on(TaskRef::in_variant("compile", "osx")),
            );

        let closure = compute_closure(&project, &[pair("linux", "package")]).unwrap();
        assert_eq!(closure, vec![pair("linux", "package"), pair("osx", "compile")]);
    }

    #[test]
    fn test_cycles_terminate() {
        let project = Project::new("loop")
            .with_variant(BuildVariant::new("linux").with_task("a").with_task("b"))
            .with_task(TaskDef::new("a").with_depends_on(TaskRef::same_variant("b")))
            .with_task(TaskDef::new("b").with_depends_on(TaskRef::same_variant("a")));

        let closure = compute_closure(&project, &[pair("linux", "a")]).unwrap();
        assert_eq!(closure, vec![pair("linux", "a"), pair("linux", "b")]);
    }

    #[test]
    fn test_missing_variant_is_unresolved() {
        let project = Project::new("widgets")
            .with_variant(BuildVariant::new("linux").with_task("deploy"))
            .with_task(TaskDef::new("compile"))
            .with_task(
                TaskDef::new("deploy").with_depends_on(TaskRef::in_variant("compile", "staging")),
            );

        let err = compute_closure(&project, &[pair("linux", "deploy")]).unwrap_err();
        assert_eq!(
            err,
            ClosureError::UnresolvedDependency {
                dependent: pair("linux", "deploy"),
                missing: pair("staging", "compile"),
            }
        );
    }

    #[test]
    fn test_task_missing_from_target_variant_is_unresolved() {
        let project = scenario_project()
            .with_variant(BuildVariant::new("windows").with_task("test"));

        let err = compute_closure(&project, &[pair("windows", "test")]).unwrap_err();
        assert!(matches!(err, ClosureError::UnresolvedDependency { .. }));
    }

    #[test]
    fn test_unknown_seeds() {
        let project = scenario_project();
        assert_eq!(
            compute_closure(&project, &[pair("windows", "compile")]).unwrap_err(),
            ClosureError::UnknownVariant("windows".to_string())
        );
        assert!(matches!(
            compute_closure(&project, &[pair("osx", "test")]).unwrap_err(),
            ClosureError::UnknownTask { .. }
        ));
    }

    #[test]
    fn test_disabled_dependency_is_rejected() {
        let project = Project::new("widgets")
            .with_variant(BuildVariant::new("linux").with_task("compile").with_task("test"))
            .with_task(TaskDef::new("compile").disabled())
            .with_task(TaskDef::new("test").with_depends_on(TaskRef::same_variant("compile")));

        assert_eq!(
            compute_closure(&project, &[pair("linux", "test")]).unwrap_err(),
            ClosureError::DisabledTask(pair("linux", "compile"))
        );
        assert_eq!(
            compute_closure(&project, &[pair("linux", "compile")]).unwrap_err(),
            ClosureError::DisabledTask(pair("linux", "compile"))
        );
    }

    /// Per task, its dependencies as (task, variant or same-variant)
    type Graph = Vec<Vec<(usize, Option<usize>)>>;

    fn graph_project(variants: usize, graph: &Graph) -> Project {
        let mut project = Project::new("generated");
        for v in 0..variants {
            let mut bv = BuildVariant::new(format!("v{}", v));
            for t in 0..graph.len() {
                bv = bv.with_task(format!("t{}", t));
            }
            project = project.with_variant(bv);
        }
        for (t, deps) in graph.iter().enumerate() {
            let mut def = TaskDef::new(format!("t{}", t));
            for &(dep, variant) in deps {
                def = def.with_depends_on(match variant {
                    Some(v) => TaskRef::in_variant(format!("t{}", dep), format!("v{}", v)),
                    None => TaskRef::same_variant(format!("t{}", dep)),
                });
            }
            project = project.with_task(def);
        }
        project
    }

    /// Everything reachable from `seeds`, by fixpoint over the raw graph
    fn reachable(graph: &Graph, seeds: &[(usize, usize)]) -> HashSet<(usize, usize)> {
        let mut seen: HashSet<(usize, usize)> = seeds.iter().copied().collect();
        loop {
            let next: Vec<(usize, usize)> = seen
                .iter()
                .flat_map(|&(v, t)| graph[t].iter().map(move |&(dt, dv)| (dv.unwrap_or(v), dt)))
                .filter(|p| !seen.contains(p))
                .collect();
            if next.is_empty() {
                return seen;
            }
            seen.extend(next);
        }
    }

    fn graph_strategy() -> impl Strategy<Value = (usize, Graph, Vec<(usize, usize)>)> {
        (1usize..4, 1usize..7).prop_flat_map(|(variants, tasks)| {
            let dep = (0..tasks, proptest::option::of(0..variants));
            (
                Just(variants),
                proptest::collection::vec(proptest::collection::vec(dep, 0..4), tasks),
                proptest::collection::vec((0..variants, 0..tasks), 1..6),
            )
        })
    }

    proptest! {
        #[test]
        fn test_closure_of_generated_graph((variants, graph, seeds) in graph_strategy()) {
            let project = graph_project(variants, &graph);
            let seed_pairs: Vec<TVPair> = seeds
                .iter()
                .map(|&(v, t)| pair(&format!("v{}", v), &format!("t{}", t)))
                .collect();

            let closure = compute_closure(&project, &seed_pairs).unwrap();

            let unique: HashSet<&TVPair> = closure.iter().collect();
            prop_assert_eq!(unique.len(), closure.len());

            let mut distinct_seeds: Vec<&TVPair> = Vec::new();
            for seed in &seed_pairs {
                if !distinct_seeds.contains(&seed) {
                    distinct_seeds.push(seed);
                }
            }
            let head: Vec<&TVPair> = closure.iter().take(distinct_seeds.len()).collect();
            prop_assert_eq!(head, distinct_seeds);

            for p in &closure {
                for dep in dependencies_of(&project, p).unwrap() {
                    prop_assert!(unique.contains(&dep), "{} missing dependency {}", p, dep);
                }
            }

            let expected: HashSet<TVPair> = reachable(&graph, &seeds)
                .into_iter()
                .map(|(v, t)| pair(&format!("v{}", v), &format!("t{}", t)))
                .collect();
            let actual: HashSet<TVPair> = closure.into_iter().collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
