//! Gantry Tasks - dependency expansion and build generation
//!
//! This crate turns patch requests into versions: it expands requested
//! (variant, task) pairs into their dependency closure, allocates
//! deterministic ids, writes builds and tasks, and drives the patch
//! lifecycle through finalize, extend, schedule and cancel.

pub mod closure;
pub mod error;
pub mod id_table;
pub mod lifecycle;
pub mod materialize;
pub mod reporter;
pub mod request;

#[cfg(test)]
mod testutil;

pub use closure::{compute_closure, dependencies_of};
pub use error::{ClosureError, EngineError, Result};
pub use id_table::{build_id, clean_name, task_id, TaskIdTable};
pub use lifecycle::{CancelOutcome, ExtendOutcome, Orchestrator, ScheduleOutcome};
pub use materialize::Materializer;
pub use reporter::{
    CollectingReporter, PatchEvent, PatchReporter, PatchReporterRegistry, TracingReporter,
};
pub use request::{patchable_tasks, ScheduleRequest};
