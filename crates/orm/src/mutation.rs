//! The write-side builders: `insert(table)`,
//! `update(table).set(...).where_(...)`, `delete(table).where_(...)`, each
//! either `.execute()`-d in full or `.paginate(cursor, numItems)`-d through
//! the explicit bounded mutation API.

use orm_core::{Id, Patch, PatchOp, Row, Selection, Value};
use orm_engine::mutation::{
    self, ConflictAction, DeleteMode as EngineDeleteMode, DeleteOptions, InsertOptions, UpdateOptions,
};
use orm_engine::RlsContext;
use orm_filter::{and, Expr};
use orm_query::paginate;
use orm_schema::RlsOperation;

use crate::db::Db;
use crate::error::{DbError, Result};

/// `{page, numAffected, isDone, continueCursor}` from the explicit
/// paginated mutation API.
#[derive(Debug, Clone)]
pub struct MutationPage {
    pub items: Vec<Row>,
    pub num_affected: usize,
    pub is_done: bool,
    pub continue_cursor: String,
}

fn resolve_page(
    db: &Db,
    table_name: &str,
    where_expr: Option<&Expr>,
    rls: &RlsContext,
    op: RlsOperation,
    allow_full_scan: bool,
    cursor: Option<&str>,
    num_items: usize,
) -> Result<(Vec<Row>, orm_query::Page<Row>)> {
    let table = db.table(table_name)?;
    let rls_filter = orm_engine::rls::candidate_filter(db.schema(), table, rls, op);
    let combined = and([where_expr.cloned(), rls_filter]);
    let strict = db.schema().options().strict && !allow_full_scan;
    let pick = orm_query::pick_index(table, combined.as_ref(), "_creationTime", true, true, strict)?;

    // A paginated mutation always rejects a multi-probe filter, strict
    // or relaxed, since it cannot be cursor-split coherently.
    if pick.multi_probe.is_some() {
        return Err(orm_query::PlannerError::MultiProbeNotAllowedForMutationPaginate {
            table: table_name.to_string(),
        }
        .into());
    }
    if pick.is_full_scan {
        db.warn(&format!("paginated mutation on '{table_name}' resolved to a full scan (relaxed mode)"));
    }

    let rows = db.store().scan_index(table, &pick).map_err(orm_engine::EngineError::from)?;
    let residual = pick.residual.clone();
    let page = paginate(&rows, cursor, num_items, None, |r| residual.iter().all(|e| orm_filter::evaluate(e, r)))?;
    Ok((rows, page))
}

fn row_id(row: &Row, table_name: &str) -> Result<Id> {
    row.get("_id")
        .and_then(Value::as_id)
        .cloned()
        .ok_or_else(|| orm_engine::EngineError::Internal(format!("row from '{table_name}' missing _id")).into())
}

// -- Insert -----------------------------------------------------------------

pub struct InsertBuilder<'a> {
    db: &'a Db,
    table: String,
    values: Row,
    rls: RlsContext,
    conflict: Option<(Vec<String>, ConflictAction)>,
    returning: Selection,
}

impl<'a> InsertBuilder<'a> {
    pub(crate) fn new(db: &'a Db, table: &str) -> Self {
        Self {
            db,
            table: table.to_string(),
            values: Row::new(),
            rls: RlsContext::default(),
            conflict: None,
            returning: Selection::Full,
        }
    }

    /// Projects the returned row through `selection` (full row if never
    /// called).
    pub fn returning(mut self, selection: Selection) -> Self {
        self.returning = selection;
        self
    }

    pub fn set(mut self, column: impl Into<String>, value: Value) -> Self {
        self.values.insert(column.into(), value);
        self
    }

    pub fn values(mut self, values: Row) -> Self {
        self.values = values;
        self
    }

    pub fn rls(mut self, rls: RlsContext) -> Self {
        self.rls = rls;
        self
    }

    /// Resolve a collision on the unique index over `columns` with
    /// `action` instead of failing.
    pub fn on_conflict(mut self, columns: Vec<String>, action: ConflictAction) -> Self {
        self.conflict = Some((columns, action));
        self
    }

    pub fn execute(self) -> Result<Row> {
        let env = self.db.mutation_env();
        let options = InsertOptions::new(self.rls.clone());
        let row = match self.conflict {
            None => mutation::insert(&env, &self.table, self.values, &options)?,
            Some((columns, action)) => {
                let mut ctx = self.db.new_ctx(self.rls);
                let result = mutation::insert_with_conflict(&env, &mut ctx, &self.table, self.values, &columns, action, &options)?;
                result.ok_or(DbError::NotUnique)?
            }
        };
        Ok(self.returning.project(&row))
    }
}

// -- Update -------------------------------------------------------------------

pub struct UpdateBuilder<'a> {
    db: &'a Db,
    table: String,
    where_expr: Option<Expr>,
    patch: Patch,
    rls: RlsContext,
    allow_full_scan: bool,
    returning: Selection,
}

impl<'a> UpdateBuilder<'a> {
    pub(crate) fn new(db: &'a Db, table: &str) -> Self {
        Self {
            db,
            table: table.to_string(),
            where_expr: None,
            patch: Patch::new(),
            rls: RlsContext::default(),
            allow_full_scan: false,
            returning: Selection::Full,
        }
    }

    /// Projects every returned row through `selection` (full row if
    /// never called).
    pub fn returning(mut self, selection: Selection) -> Self {
        self.returning = selection;
        self
    }

    pub fn set(mut self, column: impl Into<String>, value: Value) -> Self {
        self.patch.insert(column.into(), PatchOp::Set(value));
        self
    }

    pub fn unset(mut self, column: impl Into<String>) -> Self {
        self.patch.insert(column.into(), PatchOp::Unset);
        self
    }

    pub fn where_(mut self, expr: Expr) -> Self {
        self.where_expr = and([self.where_expr, Some(expr)]);
        self
    }

    pub fn allow_full_scan(mut self, allow: bool) -> Self {
        self.allow_full_scan = allow;
        self
    }

    pub fn rls(mut self, rls: RlsContext) -> Self {
        self.rls = rls;
        self
    }

    pub fn execute(self) -> Result<Vec<Row>> {
        let env = self.db.mutation_env();
        let mut ctx = self.db.new_ctx(self.rls.clone());
        let options = UpdateOptions {
            rls: self.rls,
            allow_full_scan: self.allow_full_scan,
        };
        let rows = mutation::update(&env, &mut ctx, &self.table, self.where_expr.as_ref(), &self.patch, &options)?;
        Ok(rows.iter().map(|r| self.returning.project(r)).collect())
    }

    /// Resolves one bounded page of matching ids via the planner, then
    /// applies `patch` to exactly those rows without re-scanning the
    /// table.
    pub fn paginate(self, cursor: Option<&str>, num_items: usize) -> Result<MutationPage> {
        let (_, page) = resolve_page(
            self.db,
            &self.table,
            self.where_expr.as_ref(),
            &self.rls,
            RlsOperation::Update,
            self.allow_full_scan,
            cursor,
            num_items,
        )?;

        let env = self.db.mutation_env();
        let mut ctx = self.db.new_ctx(self.rls.clone());
        let mut items = Vec::with_capacity(page.items.len());
        for row in &page.items {
            let id = row_id(row, &self.table)?;
            let updated = mutation::update_by_id(&env, &mut ctx, &self.table, &id, &self.patch, &self.rls)?;
            items.push(self.returning.project(&updated));
        }
        let num_affected = items.len();
        Ok(MutationPage {
            items,
            num_affected,
            is_done: page.is_done,
            continue_cursor: page.continue_cursor,
        })
    }
}

// -- Delete -------------------------------------------------------------------

pub struct DeleteBuilder<'a> {
    db: &'a Db,
    table: String,
    where_expr: Option<Expr>,
    mode: EngineDeleteMode,
    rls: RlsContext,
    allow_full_scan: bool,
    returning: Selection,
}

impl<'a> DeleteBuilder<'a> {
    pub(crate) fn new(db: &'a Db, table: &str) -> Self {
        Self {
            db,
            table: table.to_string(),
            where_expr: None,
            mode: EngineDeleteMode::Hard,
            rls: RlsContext::default(),
            allow_full_scan: false,
            returning: Selection::Full,
        }
    }

    /// Projects every returned row through `selection` (full row if
    /// never called).
    pub fn returning(mut self, selection: Selection) -> Self {
        self.returning = selection;
        self
    }

    pub fn where_(mut self, expr: Expr) -> Self {
        self.where_expr = and([self.where_expr, Some(expr)]);
        self
    }

    pub fn soft(mut self) -> Self {
        self.mode = EngineDeleteMode::Soft;
        self
    }

    pub fn scheduled(mut self, delay_ms: u64) -> Self {
        self.mode = EngineDeleteMode::Scheduled { delay_ms };
        self
    }

    pub fn allow_full_scan(mut self, allow: bool) -> Self {
        self.allow_full_scan = allow;
        self
    }

    pub fn rls(mut self, rls: RlsContext) -> Self {
        self.rls = rls;
        self
    }

    pub fn execute(self) -> Result<Vec<Row>> {
        let env = self.db.mutation_env();
        let mut ctx = self.db.new_ctx(self.rls.clone());
        let options = DeleteOptions {
            rls: self.rls,
            allow_full_scan: self.allow_full_scan,
            mode: self.mode,
        };
        let rows = mutation::delete(&env, &mut ctx, &self.table, self.where_expr.as_ref(), &options)?;
        Ok(rows.iter().map(|r| self.returning.project(r)).collect())
    }

    pub fn paginate(self, cursor: Option<&str>, num_items: usize) -> Result<MutationPage> {
        let (_, page) = resolve_page(
            self.db,
            &self.table,
            self.where_expr.as_ref(),
            &self.rls,
            RlsOperation::Delete,
            self.allow_full_scan,
            cursor,
            num_items,
        )?;

        let env = self.db.mutation_env();
        let mut ctx = self.db.new_ctx(self.rls.clone());
        let mut items = Vec::with_capacity(page.items.len());
        for row in &page.items {
            let id: Id = row_id(row, &self.table)?;
            let deleted = mutation::delete_by_id(&env, &mut ctx, &self.table, &id, self.mode)?;
            items.push(self.returning.project(&deleted));
        }
        let num_affected = items.len();
        Ok(MutationPage {
            items,
            num_affected,
            is_done: page.is_done,
            continue_cursor: page.continue_cursor,
        })
    }
}
