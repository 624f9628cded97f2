//! Variant/task pairs, the unit of requested work

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One task instance in one variant
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TVPair {
    /// Build variant name
    pub variant: String,
    /// Task name
    pub task_name: String,
}

impl TVPair {
    /// Create a new pair
    pub fn new(variant: impl Into<String>, task_name: impl Into<String>) -> Self {
        Self {
            variant: variant.into(),
            task_name: task_name.into(),
        }
    }

    /// Parse a pair from "variant:task" format
    pub fn parse(s: &str) -> Option<Self> {
        let (variant, task) = s.split_once(':')?;
        if variant.is_empty() || task.is_empty() {
            return None;
        }
        Some(Self::new(variant, task))
    }
}

impl fmt::Display for TVPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.variant, self.task_name)
    }
}

/// Tasks requested for one variant
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VariantTasks {
    /// Build variant name
    pub variant: String,
    /// Task names
    #[serde(default)]
    pub tasks: Vec<String>,
}

impl VariantTasks {
    /// Create a new grouping
    pub fn new<I, S>(variant: impl Into<String>, tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            variant: variant.into(),
            tasks: tasks.into_iter().map(Into::into).collect(),
        }
    }
}

/// Flatten grouped requests into pairs, dropping repeats
pub fn variant_tasks_to_pairs(groups: &[VariantTasks]) -> Vec<TVPair> {
    let mut seen = HashSet::new();
    let mut pairs = Vec::new();
    for group in groups {
        for task in &group.tasks {
            let pair = TVPair::new(&group.variant, task);
            if seen.insert(pair.clone()) {
                pairs.push(pair);
            }
        }
    }
    pairs
}

/// Group pairs by variant; variants and tasks keep their first-seen order
pub fn pairs_to_variant_tasks(pairs: &[TVPair]) -> Vec<VariantTasks> {
    let mut groups: Vec<VariantTasks> = Vec::new();
    for pair in pairs {
        let idx = match groups.iter().position(|g| g.variant == pair.variant) {
            Some(idx) => idx,
            None => {
                groups.push(VariantTasks {
                    variant: pair.variant.clone(),
                    tasks: Vec::new(),
                });
                groups.len() - 1
            }
        };
        let group = &mut groups[idx];
        if !group.tasks.contains(&pair.task_name) {
            group.tasks.push(pair.task_name.clone());
        }
    }
    groups
}

/// Cross product of variants and tasks (the legacy request form)
pub fn cross_product(variants: &[String], tasks: &[String]) -> Vec<TVPair> {
    variants
        .iter()
        .flat_map(|v| tasks.iter().map(move |t| TVPair::new(v, t)))
        .collect()
}

/// Union of two pair lists, keeping `base` order and appending unseen pairs from `extra`
pub fn union_pairs(base: &[TVPair], extra: &[TVPair]) -> Vec<TVPair> {
    let mut seen: HashSet<&TVPair> = HashSet::new();
    let mut out = Vec::with_capacity(base.len() + extra.len());
    for pair in base.iter().chain(extra) {
        if seen.insert(pair) {
            out.push(pair.clone());
        }
    }
    out
}
