//! A document-store ORM runtime: query planner with cursor pagination,
//! relational schema metadata, constraint-aware mutation engine with
//! cascade executor, row-level security, and sync/async execution modes.
//! This crate is the facade that wires
//! `orm-core`/`orm-filter`/`orm-schema`/`orm-relations`/`orm-query`/
//! `orm-storage`/`orm-engine`/`orm-config` into the single `Db` handle an
//! application actually holds.

pub mod db;
pub mod error;
pub mod mutation;
pub mod query;
pub mod scheduled;

pub use db::Db;
pub use error::{DbError, Result};
pub use mutation::{DeleteBuilder, InsertBuilder, MutationPage, UpdateBuilder};
pub use query::SelectBuilder;
pub use scheduled::Dispatcher;

pub use orm_core::Selection;
pub use orm_engine::{ConflictAction, RlsContext};
pub use orm_relations::{Cardinality, EdgeDeclaration, RelationEdge};
pub use orm_schema::{Schema, SchemaOptions};
