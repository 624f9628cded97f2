//! Project model and persisted records

pub mod build;
pub mod pair;
pub mod patch;
pub mod project;
pub mod status;
pub mod task;
pub mod version;

pub use build::Build;
pub use pair::{
    cross_product, pairs_to_variant_tasks, union_pairs, variant_tasks_to_pairs, TVPair,
    VariantTasks,
};
pub use patch::Patch;
pub use project::{BuildVariant, BuildVariantTask, Project, TaskDef, TaskRef};
pub use status::{Status, TaskStatus};
pub use task::Task;
pub use version::{BuildStatus, Version, PATCH_REQUESTER};
