//! The filter expression tree and its three visitors:
//! [`to_host_filter`] lowers to the host's filter DSL, [`evaluate`] is
//! two-valued in-memory evaluation, [`evaluate_tri`] is SQL three-valued
//! logic reserved for check constraints.

pub mod error;
pub mod evaluate;
pub mod evaluate_tri;
pub mod expr;
pub mod field;
pub mod host_filter;
pub mod strmatch;
pub mod tri;

pub use error::FilterError;
pub use evaluate::evaluate;
pub use evaluate_tri::evaluate_tri;
pub use expr::{and, array_contained, array_contains, array_overlaps, between, contains, ends_with, eq, gt, gte, ilike, in_array, is_not_null, is_null, like, lt, lte, ne, not, not_between, not_ilike, not_in_array, not_like, or, starts_with, BinaryOp, Expr, LogicalOp, Operand, Visitor};
pub use field::FieldReference;
pub use host_filter::{has_residual, to_host_filter, HostFilterExpr};
pub use tri::Tri;
