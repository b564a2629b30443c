//! The read-side builder (`query(table).filter(...).order(...)
//! .collect()|first()|unique()|paginate(...)`): wraps [`orm_query::pick_index`]
//! and [`orm_query::paginate`] against the `Db`'s [`orm_storage::DocumentStore`],
//! applying RLS's `select_filter` the same way the mutation engine's
//! `select_rows` applies its candidate filter.

use orm_core::Row;
use orm_engine::RlsContext;
use orm_filter::{and, evaluate, Expr};
use orm_query::{paginate, IndexPick, Page};
use orm_schema::Table;

use crate::db::Db;
use crate::error::{DbError, Result};

pub struct SelectBuilder<'a> {
    db: &'a Db,
    table: String,
    where_expr: Option<Expr>,
    order_by: String,
    order_desc: bool,
    rls: RlsContext,
    allow_full_scan: bool,
}

impl<'a> SelectBuilder<'a> {
    pub(crate) fn new(db: &'a Db, table: &str) -> Self {
        Self {
            db,
            table: table.to_string(),
            where_expr: None,
            order_by: "_creationTime".to_string(),
            order_desc: false,
            rls: RlsContext::default(),
            allow_full_scan: false,
        }
    }

    pub fn filter(mut self, expr: Expr) -> Self {
        self.where_expr = and([self.where_expr, Some(expr)]);
        self
    }

    pub fn order(mut self, field: impl Into<String>, desc: bool) -> Self {
        self.order_by = field.into();
        self.order_desc = desc;
        self
    }

    pub fn rls(mut self, rls: RlsContext) -> Self {
        self.rls = rls;
        self
    }

    pub fn allow_full_scan(mut self, allow: bool) -> Self {
        self.allow_full_scan = allow;
        self
    }

    fn pick(&self, table: &Table, for_pagination: bool) -> Result<IndexPick> {
        let rls_filter = orm_engine::rls::select_filter(self.db.schema(), table, &self.rls);
        let combined = and([self.where_expr.clone(), rls_filter]);
        let strict = self.db.schema().options().strict && !self.allow_full_scan;
        let pick = orm_query::pick_index(table, combined.as_ref(), &self.order_by, self.order_desc, for_pagination, strict)?;
        if pick.is_full_scan {
            self.db.warn(&format!("query on '{}' resolved to a full scan (relaxed mode)", table.name));
        }
        Ok(pick)
    }

    fn resolve(&self) -> Result<(IndexPick, Vec<Row>)> {
        let table = self.db.table(&self.table)?;
        let pick = self.pick(table, false)?;
        let rows = self.db.store().scan_index(table, &pick).map_err(orm_engine::EngineError::from)?;
        Ok((pick, rows))
    }

    fn matches(pick: &IndexPick, rows: Vec<Row>) -> impl Iterator<Item = Row> + '_ {
        rows.into_iter().filter(move |r| pick.residual.iter().all(|e| evaluate(e, r)))
    }

    /// Materializes every matching row up to `defaults.defaultLimit`,
    /// the hard upper bound on unpaginated `findMany` result size.
    pub fn collect(self) -> Result<Vec<Row>> {
        let limit = self.db.schema().options().defaults.default_limit as usize;
        let (pick, rows) = self.resolve()?;
        Ok(Self::matches(&pick, rows).take(limit).collect())
    }

    pub fn first(self) -> Result<Option<Row>> {
        let (pick, rows) = self.resolve()?;
        Ok(Self::matches(&pick, rows).next())
    }

    /// Like [`Self::first`], but errors if more than one row matches.
    pub fn unique(self) -> Result<Option<Row>> {
        let (pick, rows) = self.resolve()?;
        let mut matches = Self::matches(&pick, rows);
        let first = matches.next();
        if first.is_some() && matches.next().is_some() {
            return Err(DbError::NotUnique);
        }
        Ok(first)
    }

    /// Cursor-paginated read. `order_by`'s field must be index-covered:
    /// `for_pagination = true` turns an uncovered order field into the
    /// documented `Pagination: Field '<f>' has no index` hard error
    /// regardless of strict/relaxed mode. A multi-probe filter (an
    /// `in`/`inArray` on an indexed column) requires `max_scan` in strict
    /// mode, or a warning in relaxed mode.
    pub fn paginate(self, cursor: Option<&str>, num_items: usize, max_scan: Option<usize>) -> Result<Page<Row>> {
        let table = self.db.table(&self.table)?;
        let pick = self.pick(table, true)?;
        let strict = self.db.schema().options().strict && !self.allow_full_scan;

        if pick.multi_probe.is_some() {
            if strict && max_scan.is_none() {
                return Err(orm_query::PlannerError::MultiProbeRequiresBudget { table: table.name.clone() }.into());
            }
            if !strict {
                self.db
                    .warn(&format!("query on '{}' paginates a multi-probe filter without maxScan (relaxed mode)", table.name));
            }
        }

        let rows = self.db.store().scan_index(table, &pick).map_err(orm_engine::EngineError::from)?;
        let residual = pick.residual;
        Ok(paginate(&rows, cursor, num_items, max_scan, |r| residual.iter().all(|e| evaluate(e, r)))?)
    }
}
