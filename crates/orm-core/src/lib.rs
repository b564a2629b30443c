//! Row/value model shared by every crate in the ORM runtime.
//!
//! This crate sits at the bottom of the dependency graph: it knows nothing
//! about schemas, filters, or hosts. It only defines what a row *is* and the
//! `undefined`-vs-`null` wire encoding that has to survive the scheduler
//! boundary.

pub mod error;
pub mod idgen;
pub mod value;

pub use error::CoreError;
pub use value::{Id, Patch, PatchOp, Row, Selection, Value, WireValue};
