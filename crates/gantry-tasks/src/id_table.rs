//! Deterministic id allocation for builds and tasks

use std::collections::HashMap;

use gantry_core::config::DEFAULT_DIGEST_LEN;
use gantry_core::model::TVPair;
use sha2::{Digest, Sha256};

/// Replace every character that is not ASCII alphanumeric with `_`
pub fn clean_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// First `len` hex characters of SHA-256 over `parts` joined by NUL bytes.
///
/// The digest keeps ids apart when cleaning maps two names to the same text.
fn digest(parts: &[&str], len: usize) -> String {
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update(b"\0");
        }
        hasher.update(part.as_bytes());
    }
    let hex = format!("{:x}", hasher.finalize());
    hex[..len.min(hex.len())].to_string()
}

/// Id of the task `task` in `variant` of version `version`
pub fn task_id(version: &str, variant: &str, task: &str, digest_len: usize) -> String {
    format!(
        "{}_{}_{}_{}",
        clean_name(version),
        clean_name(variant),
        clean_name(task),
        digest(&[version, variant, task], digest_len)
    )
}

/// Id of the build for `variant` of version `version`
pub fn build_id(version: &str, variant: &str, digest_len: usize) -> String {
    format!(
        "{}_{}_{}",
        clean_name(version),
        clean_name(variant),
        digest(&[version, variant], digest_len)
    )
}

/// Ids for every (variant, task) pair a version will hold.
///
/// Allocation is a pure function of the version id and the pair, so tables
/// built in different processes agree.
#[derive(Debug, Clone)]
pub struct TaskIdTable {
    version: String,
    digest_len: usize,
    ids: HashMap<TVPair, String>,
}

impl TaskIdTable {
    /// Allocate ids with the default digest length
    pub fn new(version: &str, pairs: &[TVPair]) -> Self {
        Self::with_digest_len(version, pairs, DEFAULT_DIGEST_LEN)
    }

    /// Allocate ids with a custom digest length
    pub fn with_digest_len(version: &str, pairs: &[TVPair], digest_len: usize) -> Self {
        let ids = pairs
            .iter()
            .map(|p| {
                (
                    p.clone(),
                    task_id(version, &p.variant, &p.task_name, digest_len),
                )
            })
            .collect();
        Self {
            version: version.to_string(),
            digest_len,
            ids,
        }
    }

    /// Task id for a pair, if it was allocated
    pub fn get(&self, variant: &str, task: &str) -> Option<&str> {
        self.ids
            .get(&TVPair::new(variant, task))
            .map(String::as_str)
    }

    /// Build id for a variant of this version
    pub fn build_id(&self, variant: &str) -> String {
        build_id(&self.version, variant, self.digest_len)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
