//! Gantry Core - project model, records and configuration
//!
//! This crate provides the foundational types shared by the Gantry store,
//! the scheduling engine and the command-line front end.

pub mod config;
pub mod error;
pub mod model;

pub use config::{Config, Settings};
pub use error::{ConfigError, GantryError, ProjectError, Result};
pub use model::{
    Build, BuildStatus, BuildVariant, BuildVariantTask, Patch, Project, Status, TVPair, Task,
    TaskDef, TaskRef, TaskStatus, VariantTasks, Version,
};
