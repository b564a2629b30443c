//! Bidirectional relation edge extraction with cycle detection and
//! alias-based inverse pairing. The sole input to the cascade executor's
//! incoming-edge walk and to the planner's relation-aware sub-queries.

pub mod build;
pub mod declaration;
pub mod edge;
pub mod error;
pub mod graph;

pub use build::build_relations;
pub use declaration::{Cardinality, EdgeDeclaration};
pub use edge::{InverseRef, RelationEdge};
pub use error::RelationsError;
