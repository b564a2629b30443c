//! Host collaborator traits for the document-store ORM runtime, plus an
//! in-memory reference implementation of both.
//!
//! [`DocumentStore`] and [`Scheduler`] are the seams `orm-engine` drives;
//! [`memory::MemoryStore`]/[`memory::MemoryScheduler`] stand in for the
//! real (out-of-scope) document database and task scheduler so the crate
//! and its tests can run without one.

pub mod error;
pub mod memory;
pub mod traits;
pub mod wire;

pub use error::StorageError;
pub use memory::{MemoryScheduler, MemoryStore};
pub use traits::{DocumentStore, ScheduledFunctions, Scheduler};
pub use wire::{
    DeleteMode, ForeignActionWire, ScheduledDeleteArgs, ScheduledMutationArgs, WorkType,
    SCHEDULED_DELETE, SCHEDULED_MUTATION_BATCH,
};
