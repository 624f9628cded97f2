//! CLI commands

mod cancel;
mod closure;
mod completions;
mod init;
mod patch;
mod schedule;
mod status;
mod tasks;
mod validate;

pub use cancel::CancelCommand;
pub use closure::ClosureCommand;
pub use completions::CompletionsCommand;
pub use init::InitCommand;
pub use patch::PatchCommand;
pub use schedule::ScheduleCommand;
pub use status::StatusCommand;
pub use tasks::TasksCommand;
pub use validate::ValidateCommand;

use gantry_core::model::TVPair;

/// Parse a `variant:task` argument
pub(crate) fn parse_pair(s: &str) -> Result<TVPair, String> {
    TVPair::parse(s).ok_or_else(|| format!("expected variant:task, got '{}'", s))
}
