//! Patch scheduling reporting

use std::sync::{Arc, Mutex};

/// Milestones emitted while scheduling a patch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchEvent {
    /// A build record was written
    BuildCreated {
        patch_id: String,
        build_id: String,
        variant: String,
        tasks: usize,
    },
    /// Tasks were appended to an existing build
    TasksAdded {
        patch_id: String,
        build_id: String,
        tasks: usize,
    },
    /// A pending patch received its version
    Finalized {
        patch_id: String,
        version_id: String,
        builds: usize,
        tasks: usize,
    },
    /// A finalized patch gained builds or tasks
    Extended {
        patch_id: String,
        new_builds: usize,
        new_tasks: usize,
    },
    /// A patch was cancelled
    Cancelled { patch_id: String, finalized: bool },
}

/// Trait for reporting scheduling progress
pub trait PatchReporter: Send + Sync {
    /// Handle a patch event
    fn report(&self, event: &PatchEvent);
}

/// Reporter that logs to tracing
#[derive(Debug, Default)]
pub struct TracingReporter;

impl PatchReporter for TracingReporter {
    fn report(&self, event: &PatchEvent) {
        match event {
            PatchEvent::BuildCreated {
                patch_id,
                build_id,
                variant,
                tasks,
            } => {
                tracing::info!(patch = %patch_id, build = %build_id, variant = %variant, tasks, "build created");
            }
            PatchEvent::TasksAdded {
                patch_id,
                build_id,
                tasks,
            } => {
                tracing::info!(patch = %patch_id, build = %build_id, tasks, "tasks added");
            }
            PatchEvent::Finalized {
                patch_id,
                version_id,
                builds,
                tasks,
            } => {
                tracing::info!(
                    patch = %patch_id,
                    version = %version_id,
                    builds,
                    tasks,
                    "patch finalized"
                );
            }
            PatchEvent::Extended {
                patch_id,
                new_builds,
                new_tasks,
            } => {
                tracing::info!(patch = %patch_id, new_builds, new_tasks, "patch extended");
            }
            PatchEvent::Cancelled {
                patch_id,
                finalized,
            } => {
                tracing::info!(patch = %patch_id, finalized, "patch cancelled");
            }
        }
    }
}

/// Reporter that collects events for later inspection
#[derive(Debug, Default)]
pub struct CollectingReporter {
    events: Mutex<Vec<PatchEvent>>,
}

impl CollectingReporter {
    /// Get all collected events
    pub fn events(&self) -> Vec<PatchEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl PatchReporter for CollectingReporter {
    fn report(&self, event: &PatchEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event.clone());
    }
}

/// Registry of patch reporters
pub struct PatchReporterRegistry {
    reporters: Vec<Arc<dyn PatchReporter>>,
}

impl PatchReporterRegistry {
    pub fn new() -> Self {
        Self {
            reporters: vec![Arc::new(TracingReporter)],
        }
    }

    pub fn empty() -> Self {
        Self {
            reporters: Vec::new(),
        }
    }

    pub fn register(&mut self, reporter: Arc<dyn PatchReporter>) {
        self.reporters.push(reporter);
    }

    pub fn all(&self) -> &[Arc<dyn PatchReporter>] {
        &self.reporters
    }

    /// Broadcast an event to all registered reporters
    pub fn broadcast(&self, event: &PatchEvent) {
        for reporter in &self.reporters {
            reporter.report(event);
        }
    }
}

impl Default for PatchReporterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_reporter() {
        let reporter = CollectingReporter::default();
        reporter.report(&PatchEvent::Cancelled {
            patch_id: "p1".to_string(),
            finalized: false,
        });
        assert_eq!(reporter.events().len(), 1);
    }

    #[test]
    fn test_registry_broadcast() {
        let collector = Arc::new(CollectingReporter::default());
        let mut registry = PatchReporterRegistry::empty();
        registry.register(collector.clone());
        registry.register(Arc::new(TracingReporter));
        assert_eq!(registry.all().len(), 2);

        registry.broadcast(&PatchEvent::Extended {
            patch_id: "p1".to_string(),
            new_builds: 1,
            new_tasks: 2,
        });
        assert_eq!(
            collector.events(),
            vec![PatchEvent::Extended {
                patch_id: "p1".to_string(),
                new_builds: 1,
                new_tasks: 2,
            }]
        );
    }

    #[test]
    fn test_default_registry_traces() {
        assert_eq!(PatchReporterRegistry::default().all().len(), 1);
    }
}
