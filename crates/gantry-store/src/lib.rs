//! Gantry Store - persistence for patches, versions, builds and tasks
//!
//! The [`Store`] trait offers single-document atomicity only: every insert
//! and update touches one record, and callers never assume cross-collection
//! transactions. Inserting an id that already exists is reported as
//! [`StoreError::Conflict`] so writers racing on deterministic ids can tell
//! a collision from a failure.

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use error::{Collection, Result, StoreError};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use traits::{SharedStore, Store};
