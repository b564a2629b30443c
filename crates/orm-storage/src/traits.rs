//! The external interfaces treated as out-of-scope collaborators: the
//! document store and the scheduler. Only the minimum
//! contract the core consumes is specified here; the real host
//! implementation (a production document database) is not part of this
//! crate. [`crate::memory`] provides an in-memory stand-in used by tests
//! and by the facade crate's examples.

use orm_core::{Id, Patch, Row};
use orm_schema::Table;

use crate::error::Result;
use orm_query::IndexPick;

/// `get/insert/patch/delete/query.withIndex(...).paginate(...)`.
pub trait DocumentStore: Send + Sync {
    fn get(&self, id: &Id) -> Result<Option<Row>>;

    /// Inserts `row` (already defaulted/validated by the engine) into
    /// `table`, returning the host-minted `_id`.
    fn insert(&self, table: &str, row: Row) -> Result<Id>;

    /// Applies `patch` to the row at `id`. `PatchOp::Unset` removes the
    /// field entirely (the host `undefined`-in-`patch` contract).
    fn patch(&self, id: &Id, patch: &Patch) -> Result<()>;

    fn delete(&self, id: &Id) -> Result<()>;

    /// Returns every row of `table` matching `pick`'s equality prefix,
    /// multi-probe set, and range clause, in index order. Does not apply
    /// `pick.residual` — callers run that through [`orm_filter::evaluate`]
    /// themselves.
    fn scan_index(&self, table: &Table, pick: &IndexPick) -> Result<Vec<Row>>;
}

/// `runAfter(delayMs, ref, args) -> scheduleId`, `runAt`, `cancel`.
pub trait Scheduler: Send + Sync {
    fn run_after(&self, delay_ms: u64, function_ref: &str, args: serde_json::Value) -> Result<String>;
    fn run_at(&self, timestamp_ms: i64, function_ref: &str, args: serde_json::Value) -> Result<String>;
    fn cancel(&self, schedule_id: &str) -> Result<()>;
}

/// The scheduled function references supplied at ORM construction:
/// `scheduledMutationBatch` drains a cascade continuation,
/// `scheduledDelete` performs a deferred delete honoring the
/// `deletionTime` token. The cascade executor (`orm-engine`) is the real
/// implementation; this trait is the seam the in-memory scheduler dispatches
/// through.
pub trait ScheduledFunctions: Send + Sync {
    fn dispatch(
        &self,
        store: &dyn DocumentStore,
        scheduler: &dyn Scheduler,
        function_ref: &str,
        args: serde_json::Value,
    ) -> Result<()>;
}
