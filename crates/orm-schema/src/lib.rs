//! Tables, columns, indexes, constraints, foreign keys, and RLS policies.
//! Depends on [`orm_filter`] because check constraints and RLS policies
//! embed filter expressions.

pub mod column;
pub mod constraint;
pub mod error;
pub mod foreign_key;
pub mod index;
pub mod options;
pub mod rls;
pub mod schema;
pub mod table;

pub use column::{boolean, id, integer, number, text, unknown, Column, ColumnConfig, ColumnKind, ColumnReference, ValueHook};
pub use constraint::CheckConstraint;
pub use error::SchemaBuildError;
pub use foreign_key::{ForeignAction, ForeignKey};
pub use index::{Index, SearchIndex, UniqueIndex, BY_CREATION_TIME_INDEX, BY_ID_INDEX};
pub use options::{Defaults, MutationExecutionMode, SchemaOptions, BYTE_SAFETY_MULTIPLIER};
pub use rls::{RlsOperation, RlsPolicy, RlsPolicyKind};
pub use schema::Schema;
pub use table::Table;
