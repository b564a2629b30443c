//! Index pick, residual-filter splitting, and cursor-paginated reads
//! with split semantics.

pub mod cursor;
pub mod error;
pub mod pick;
pub mod shape;

pub use cursor::{needs_residual_pass, paginate, Cursor, Page, PageStatus};
pub use error::PlannerError;
pub use pick::{pick_index, IndexPick};
pub use shape::{flatten_where, FlatWhere, RangeClause};
