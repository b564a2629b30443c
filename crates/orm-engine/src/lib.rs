//! The constraint-aware mutation engine and cascade executor:
//! insert/update/delete/upsert with defaults, unique/check/FK
//! enforcement, RLS gating, and the FK-graph cascade walk in both sync
//! and async execution modes.

pub mod cascade;
pub mod context;
pub mod defaults;
pub mod error;
pub mod fk;
pub mod mutation;
pub mod rls;
pub mod unique;
pub mod util;
pub mod validate;
pub mod warn;

pub use cascade::{resume_scheduled_delete, resume_scheduled_mutation, CascadeEnv};
pub use context::{MutationContext, RlsContext};
pub use error::EngineError;
pub use mutation::{
    ConflictAction, DeleteMode as EngineDeleteMode, DeleteOptions, InsertOptions, MutationEnv, UpdateOptions,
};
pub use warn::{TracingWarnSink, WarnSink};
