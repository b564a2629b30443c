//! `Db`: the facade that owns a frozen [`Schema`] plus the host
//! collaborators and hands out the query/mutation builders in
//! `crate::query`/`crate::mutation`. Owns one connection and is the
//! single thing every caller borrows from.

use std::collections::BTreeMap;

use orm_core::{Id, Row};
use orm_engine::{MutationContext, RlsContext, TracingWarnSink, WarnSink};
use orm_relations::{build_relations, EdgeDeclaration, RelationEdge};
use orm_schema::Schema;
use orm_storage::{DocumentStore, Scheduler};

use crate::error::{DbError, Result};
use crate::mutation::{DeleteBuilder, InsertBuilder, UpdateBuilder};
use crate::query::SelectBuilder;
use crate::scheduled::Dispatcher;

/// Owns the schema and the host seams for one isolated ORM instance.
/// Never share a `Db` across unrelated root mutations that must not
/// observe each other's in-flight state; construct one per request or
/// test, the same discipline `orm_storage::memory::MemoryStore`
/// documents for itself.
pub struct Db {
    schema: Schema,
    relations: Vec<RelationEdge>,
    store: Box<dyn DocumentStore>,
    scheduler: Option<Box<dyn Scheduler>>,
    warn: Box<dyn WarnSink>,
}

impl Db {
    pub fn new(schema: Schema, store: Box<dyn DocumentStore>) -> Self {
        Self {
            schema,
            relations: Vec::new(),
            store,
            scheduler: None,
            warn: Box::new(TracingWarnSink),
        }
    }

    /// Validates `declarations` against `schema` (edge name collisions,
    /// dangling field references, cycles, alias/field inverse pairing)
    /// and keeps the resolved edge list for introspection via
    /// [`Db::relations`]. A bad relation declaration is a
    /// `SchemaBuildError`-class failure and is therefore surfaced here,
    /// at construction, rather than lazily on first query.
    pub fn with_relations(mut self, declarations: &BTreeMap<String, Vec<EdgeDeclaration>>) -> Result<Self> {
        self.relations = build_relations(&self.schema, declarations)?;
        Ok(self)
    }

    pub fn relations(&self) -> &[RelationEdge] {
        &self.relations
    }

    pub fn with_scheduler(mut self, scheduler: Box<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn with_warn_sink(mut self, warn: Box<dyn WarnSink>) -> Self {
        self.warn = warn;
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub(crate) fn warn(&self, message: &str) {
        self.warn.warn(message);
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    /// The [`orm_storage::ScheduledFunctions`] implementation a host
    /// worker loop dispatches `scheduledMutationBatch`/`scheduledDelete`
    /// jobs through. Borrowed, not owned, since the host's scheduler
    /// drain loop and this `Db` share the same store.
    pub fn dispatcher(&self) -> Dispatcher<'_> {
        Dispatcher::new(&self.schema, self.warn.as_ref())
    }

    pub(crate) fn mutation_env(&self) -> orm_engine::mutation::MutationEnv<'_> {
        orm_engine::mutation::MutationEnv {
            schema: &self.schema,
            store: self.store.as_ref(),
            scheduler: self.scheduler.as_deref(),
            warn: self.warn.as_ref(),
        }
    }

    pub(crate) fn new_ctx(&self, rls: RlsContext) -> MutationContext {
        MutationContext::new(rls, self.schema.options().defaults.mutation_schedule_call_cap)
    }

    pub(crate) fn table(&self, name: &str) -> Result<&orm_schema::Table> {
        self.schema.table(name).ok_or_else(|| DbError::UnknownTable(name.to_string()))
    }

    pub fn get(&self, id: &Id) -> Result<Option<Row>> {
        Ok(self.store.get(id).map_err(orm_engine::EngineError::from)?)
    }

    pub fn insert(&self, table_name: &str) -> InsertBuilder<'_> {
        InsertBuilder::new(self, table_name)
    }

    pub fn query(&self, table_name: &str) -> SelectBuilder<'_> {
        SelectBuilder::new(self, table_name)
    }

    pub fn update(&self, table_name: &str) -> UpdateBuilder<'_> {
        UpdateBuilder::new(self, table_name)
    }

    pub fn delete(&self, table_name: &str) -> DeleteBuilder<'_> {
        DeleteBuilder::new(self, table_name)
    }
}
