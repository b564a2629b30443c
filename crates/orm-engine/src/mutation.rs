//! The insert/update/delete/upsert pipelines: defaults, check/unique/FK
//! enforcement, RLS gating, bounded collection, and the three delete
//! modes.

use orm_core::{Id, Patch, PatchOp, Row, Value};
use orm_filter::{and, evaluate, Expr};
use orm_query::pick_index;
use orm_schema::{RlsOperation, Schema, Table};
use orm_storage::wire::{ScheduledDeleteArgs, SCHEDULED_DELETE};
use orm_storage::{DeleteMode as WireDeleteMode, DocumentStore, Scheduler};

use crate::cascade::{self, CascadeEnv};
use crate::context::{MutationContext, RlsContext};
use crate::defaults::{fill_insert_defaults, normalize_update_patch};
use crate::error::{EngineError, Result};
use crate::fk::enforce_foreign_keys;
use crate::rls;
use crate::unique::enforce_unique;
use crate::validate::run_checks;
use crate::warn::WarnSink;

/// Everything a mutation pipeline needs to reach the host and the schema.
/// Constructed once per `Db` instance (or per test) and borrowed for every
/// call, mirroring [`crate::cascade::CascadeEnv`].
pub struct MutationEnv<'a> {
    pub schema: &'a Schema,
    pub store: &'a dyn DocumentStore,
    pub scheduler: Option<&'a dyn Scheduler>,
    pub warn: &'a dyn WarnSink,
}

impl<'a> MutationEnv<'a> {
    fn cascade_env(&self) -> CascadeEnv<'a> {
        CascadeEnv {
            schema: self.schema,
            store: self.store,
            scheduler: self.scheduler,
            warn: self.warn,
            mode: self.schema.options().defaults.mutation_execution_mode,
        }
    }

    fn table(&self, name: &str) -> Result<&'a Table> {
        self.schema
            .table(name)
            .ok_or_else(|| EngineError::Internal(format!("unknown table '{name}'")))
    }
}

fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn row_id(row: &Row) -> Result<Id> {
    row.get("_id")
        .and_then(Value::as_id)
        .cloned()
        .ok_or_else(|| EngineError::Internal("row missing _id".to_string()))
}

// -- Insert -------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct InsertOptions {
    pub rls: RlsContext,
}

impl InsertOptions {
    pub fn new(rls: RlsContext) -> Self {
        Self { rls }
    }
}

/// Fill defaults, run checks, enforce unique/FK, gate on RLS
/// `withCheck`, then hand the row to the host.
pub fn insert(env: &MutationEnv, table_name: &str, values: Row, options: &InsertOptions) -> Result<Row> {
    let table = env.table(table_name)?;
    let candidate = fill_insert_defaults(table, &values)?;
    run_checks(table, &candidate)?;
    enforce_unique(env.store, table, &candidate, None)?;
    enforce_foreign_keys(env.schema, env.store, table, &candidate)?;
    rls::check_insert(env.schema, table, &options.rls, &candidate)?;

    let id = env.store.insert(table_name, candidate)?;
    env.store
        .get(&id)?
        .ok_or_else(|| EngineError::Internal("row vanished immediately after insert".to_string()))
}

pub fn insert_many(env: &MutationEnv, table_name: &str, values: Vec<Row>, options: &InsertOptions) -> Result<Vec<Row>> {
    values.into_iter().map(|v| insert(env, table_name, v, options)).collect()
}

/// The outcome an `onConflict` clause picks on a unique-index collision.
#[derive(Debug, Clone)]
pub enum ConflictAction {
    DoNothing,
    DoUpdate(Patch),
}

/// Probes `conflict_columns` (must match a declared unique index) for an
/// existing row before inserting; on a hit, applies `action` instead of
/// failing with [`EngineError::UniqueViolation`]. Returns `None` when
/// `DoNothing` chose to skip.
pub fn insert_with_conflict(
    env: &MutationEnv,
    ctx: &mut MutationContext,
    table_name: &str,
    values: Row,
    conflict_columns: &[String],
    action: ConflictAction,
    options: &InsertOptions,
) -> Result<Option<Row>> {
    let table = env.table(table_name)?;
    let candidate = fill_insert_defaults(table, &values)?;

    let index = table
        .get_unique_indexes()
        .iter()
        .find(|idx| idx.columns == conflict_columns)
        .ok_or_else(|| EngineError::Internal(format!("no unique index on '{table_name}' over {conflict_columns:?}")))?;

    let probe_values: Vec<Value> = conflict_columns
        .iter()
        .map(|c| candidate.get(c).cloned().unwrap_or(Value::Null))
        .collect();
    let pick = orm_query::IndexPick {
        index_name: index.name.clone(),
        equality_prefix: conflict_columns.iter().cloned().zip(probe_values.iter().cloned()).collect(),
        multi_probe: None,
        range: None,
        residual: Vec::new(),
        order_desc: false,
        is_full_scan: false,
    };
    let existing = env.store.scan_index(table, &pick)?;

    match existing.into_iter().next() {
        Some(conflicting) => match action {
            ConflictAction::DoNothing => Ok(None),
            ConflictAction::DoUpdate(patch) => {
                let id = row_id(&conflicting)?;
                let updated = update_by_id(env, ctx, table_name, &id, &patch, &options.rls)?;
                Ok(Some(updated))
            }
        },
        None => {
            run_checks(table, &candidate)?;
            enforce_unique(env.store, table, &candidate, None)?;
            enforce_foreign_keys(env.schema, env.store, table, &candidate)?;
            rls::check_insert(env.schema, table, &options.rls, &candidate)?;
            let id = env.store.insert(table_name, candidate)?;
            Ok(Some(env.store.get(&id)?.ok_or_else(|| {
                EngineError::Internal("row vanished immediately after insert".to_string())
            })?))
        }
    }
}

// -- Update ---------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    pub rls: RlsContext,
    pub allow_full_scan: bool,
}

/// Selects every row matching `where_expr` via the planner, applies
/// `patch` to each (per-row: an empty normalized patch is a no-op and
/// that row is skipped), and runs the full defaults/check/unique/FK/RLS
/// gate before writing. Returns the rows actually updated, post-image.
pub fn update(
    env: &MutationEnv,
    ctx: &mut MutationContext,
    table_name: &str,
    where_expr: Option<&Expr>,
    patch: &Patch,
    options: &UpdateOptions,
) -> Result<Vec<Row>> {
    let table = env.table(table_name)?;
    let rows = select_rows(env, table, where_expr, &options.rls, RlsOperation::Update, options.allow_full_scan)?;
    bound_rows(ctx, table, rows.len(), env.schema.options().defaults.mutation_max_rows)?;

    let mut results = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(normalized) = normalize_update_patch(table, patch)? else {
            continue;
        };
        let updated = apply_update(env, ctx, table, table_name, &row, &normalized, &options.rls)?;
        results.push(updated);
    }
    Ok(results)
}

/// Applies a patch to a single known row by id, bypassing the
/// `where`/planner selection step — the path [`insert_with_conflict`]'s
/// `DoUpdate` branch and any `.patch(id, ...)` point convenience use.
pub fn update_by_id(
    env: &MutationEnv,
    ctx: &mut MutationContext,
    table_name: &str,
    id: &Id,
    patch: &Patch,
    rls_ctx: &RlsContext,
) -> Result<Row> {
    let table = env.table(table_name)?;
    let row = env
        .store
        .get(id)?
        .ok_or_else(|| EngineError::Internal(format!("update target '{id}' does not exist")))?;
    let Some(normalized) = normalize_update_patch(table, patch)? else {
        return Ok(row);
    };
    apply_update(env, ctx, table, table_name, &row, &normalized, rls_ctx)
}

fn apply_update(
    env: &MutationEnv,
    ctx: &mut MutationContext,
    table: &Table,
    table_name: &str,
    row: &Row,
    normalized: &Patch,
    rls_ctx: &RlsContext,
) -> Result<Row> {
    let mut post_image = row.clone();
    for (column, op) in normalized {
        match op {
            PatchOp::Set(value) => {
                post_image.insert(column.clone(), value.clone());
            }
            PatchOp::Unset => {
                post_image.remove(column);
            }
        }
    }

    run_checks(table, &post_image)?;
    let id = row_id(row)?;
    enforce_unique(env.store, table, &post_image, Some(&id))?;
    enforce_foreign_keys(env.schema, env.store, table, &post_image)?;
    rls::check_update(env.schema, table, rls_ctx, &post_image)?;

    env.store.patch(&id, normalized)?;

    let cascade_env = env.cascade_env();
    cascade::on_update(&cascade_env, ctx, table_name, row, &post_image)?;

    env.store
        .get(&id)?
        .ok_or_else(|| EngineError::Internal("row vanished after update".to_string()))
}

// -- Delete ---------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub enum DeleteMode {
    Hard,
    Soft,
    Scheduled { delay_ms: u64 },
}

#[derive(Debug, Clone)]
pub struct DeleteOptions {
    pub rls: RlsContext,
    pub allow_full_scan: bool,
    pub mode: DeleteMode,
}

impl Default for DeleteOptions {
    fn default() -> Self {
        Self {
            rls: RlsContext::default(),
            allow_full_scan: false,
            mode: DeleteMode::Hard,
        }
    }
}

/// Selects every row matching `where_expr`, then per `options.mode`
/// either walks the cascade executor and removes the row now (`Hard`/
/// `Soft`), or stamps `deletionTime` and hands the rest off to a
/// scheduled continuation (`Scheduled`) that a worker resumes later.
pub fn delete(
    env: &MutationEnv,
    ctx: &mut MutationContext,
    table_name: &str,
    where_expr: Option<&Expr>,
    options: &DeleteOptions,
) -> Result<Vec<Row>> {
    let table = env.table(table_name)?;
    let rows = select_rows(env, table, where_expr, &options.rls, RlsOperation::Delete, options.allow_full_scan)?;
    bound_rows(ctx, table, rows.len(), env.schema.options().defaults.mutation_max_rows)?;

    rows.into_iter().map(|row| delete_one(env, ctx, table, table_name, row, &options.mode)).collect()
}

/// Applies one delete (`Hard`/`Soft`/`Scheduled`) to an already-selected
/// `row`, without re-running RLS/the planner — the shared body behind
/// [`delete`]'s bulk loop and [`delete_by_id`]'s single-row entry point
/// (used by the facade's `.paginate()` mutation path).
fn delete_one(env: &MutationEnv, ctx: &mut MutationContext, table: &Table, table_name: &str, row: Row, mode: &DeleteMode) -> Result<Row> {
    let id = row_id(&row)?;
    match *mode {
        DeleteMode::Scheduled { delay_ms } => {
            if !table.get_columns().iter().any(|c| c.name == "deletionTime") {
                return Err(EngineError::MissingDeletionTimeColumn { table: table.name.clone() });
            }
            let scheduler = env
                .scheduler
                .ok_or_else(|| EngineError::Internal("scheduled delete requires a scheduler".to_string()))?;
            if !ctx.try_consume_schedule_call() {
                return Err(EngineError::MutationScheduleCallCapExceeded {
                    table: table.name.clone(),
                    cap: 0,
                });
            }
            let deletion_time = now_millis();
            let mut patch = Patch::new();
            patch.insert("deletionTime".to_string(), PatchOp::Set(Value::Int(deletion_time)));
            env.store.patch(&id, &patch)?;

            let args = ScheduledDeleteArgs {
                table: table_name.to_string(),
                id: id.clone(),
                cascade_mode: WireDeleteMode::Hard,
                deletion_time,
            };
            scheduler.run_after(
                delay_ms,
                SCHEDULED_DELETE,
                serde_json::to_value(&args).map_err(orm_storage::StorageError::Serialization)?,
            )?;

            let mut patched = row;
            patched.insert("deletionTime".to_string(), Value::Int(deletion_time));
            Ok(patched)
        }
        DeleteMode::Hard | DeleteMode::Soft => {
            let wire_mode = match *mode {
                DeleteMode::Hard => WireDeleteMode::Hard,
                DeleteMode::Soft => WireDeleteMode::Soft,
                DeleteMode::Scheduled { .. } => unreachable!(),
            };
            let cascade_env = env.cascade_env();
            cascade::on_delete(&cascade_env, ctx, table_name, &row, wire_mode)?;
            Ok(row)
        }
    }
}

/// Deletes a single already-known row by id, bypassing the `where`/planner
/// selection step (mirrors [`update_by_id`]). Used by the facade's
/// paginated mutation path, which resolves its own row batch via
/// [`orm_query::paginate`] rather than `select_rows`'s all-at-once scan.
pub fn delete_by_id(env: &MutationEnv, ctx: &mut MutationContext, table_name: &str, id: &Id, mode: DeleteMode) -> Result<Row> {
    let table = env.table(table_name)?;
    let row = env
        .store
        .get(id)?
        .ok_or_else(|| EngineError::Internal(format!("delete target '{id}' does not exist")))?;
    delete_one(env, ctx, table, table_name, row, &mode)
}

// -- Shared selection helper ------------------------------------------------

fn select_rows(
    env: &MutationEnv,
    table: &Table,
    where_expr: Option<&Expr>,
    rls_ctx: &RlsContext,
    rls_op: RlsOperation,
    allow_full_scan: bool,
) -> Result<Vec<Row>> {
    if where_expr.is_none() && !allow_full_scan {
        if env.schema.options().strict {
            return Err(EngineError::RequiresWhereOrAllowFullScan { table: table.name.clone() });
        }
        env.warn.warn(&format!(
            "update/delete on '{}' has no where clause; scanning every row (relaxed mode)",
            table.name
        ));
    }

    let rls_filter = rls::candidate_filter(env.schema, table, rls_ctx, rls_op);
    let combined = and([where_expr.cloned(), rls_filter]);
    let strict = env.schema.options().strict && !allow_full_scan;

    let pick = pick_index(table, combined.as_ref(), "_creationTime", true, false, strict)?;
    if pick.is_full_scan {
        env.warn
            .warn(&format!("mutation on '{}' resolved to a full scan (relaxed mode)", table.name));
    }

    let rows = env.store.scan_index(table, &pick)?;
    Ok(rows.into_iter().filter(|r| pick.residual.iter().all(|e| evaluate(e, r))).collect())
}

fn bound_rows(ctx: &mut MutationContext, table: &Table, count: usize, limit: u32) -> Result<()> {
    if !ctx.try_touch_rows(count as u32, limit) {
        return Err(EngineError::MutationMaxRowsExceeded {
            table: table.name.clone(),
            limit,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use orm_filter::eq;
    use orm_schema::{text, ColumnConfig, ForeignAction, ForeignKey, Index, SchemaOptions, Table, UniqueIndex};
    use orm_storage::memory::MemoryStore;

    fn users_schema() -> Schema {
        let users = Table::new("users")
            .column(text("email").with_config(ColumnConfig::default().not_null().unique()))
            .column(text("role").with_config(ColumnConfig::default().default(Value::Str("member".into()))))
            .unique_index(UniqueIndex::new("by_email", vec!["email".into()]))
            .index(Index::new("by_role", vec!["role".into()]));
        Schema::build(vec![users], SchemaOptions::default()).unwrap()
    }

    fn env<'a>(schema: &'a Schema, store: &'a MemoryStore) -> MutationEnv<'a> {
        MutationEnv {
            schema,
            store,
            scheduler: None,
            warn: &crate::warn::TracingWarnSink,
        }
    }

    #[test]
    fn insert_fills_default_role() {
        let schema = users_schema();
        let store = MemoryStore::new();
        let mut values = Row::new();
        values.insert("email".to_string(), Value::Str("ada@example.com".into()));
        let row = insert(&env(&schema, &store), "users", values, &InsertOptions::default()).unwrap();
        assert_eq!(row.get("role"), Some(&Value::Str("member".into())));
    }

    #[test]
    fn insert_rejects_duplicate_unique_email() {
        let schema = users_schema();
        let store = MemoryStore::new();
        let e = &env(&schema, &store);
        let mut v1 = Row::new();
        v1.insert("email".to_string(), Value::Str("ada@example.com".into()));
        insert(e, "users", v1, &InsertOptions::default()).unwrap();

        let mut v2 = Row::new();
        v2.insert("email".to_string(), Value::Str("ada@example.com".into()));
        let err = insert(e, "users", v2, &InsertOptions::default()).unwrap_err();
        assert!(matches!(err, EngineError::UniqueViolation { .. }));
    }

    #[test]
    fn update_without_where_requires_allow_full_scan_in_strict_mode() {
        let schema = users_schema();
        let store = MemoryStore::new();
        let e = env(&schema, &store);
        let mut ctx = MutationContext::new(RlsContext::default(), 8);
        let mut patch = Patch::new();
        patch.insert("role".to_string(), PatchOp::Set(Value::Str("admin".into())));
        let err = update(&e, &mut ctx, "users", None, &patch, &UpdateOptions::default()).unwrap_err();
        assert!(matches!(err, EngineError::RequiresWhereOrAllowFullScan { .. }));
    }

    #[test]
    fn update_matches_rows_by_filter_and_returns_post_image() {
        let schema = users_schema();
        let store = MemoryStore::new();
        let e = env(&schema, &store);
        let mut v = Row::new();
        v.insert("email".to_string(), Value::Str("grace@example.com".into()));
        insert(&e, "users", v, &InsertOptions::default()).unwrap();

        let mut ctx = MutationContext::new(RlsContext::default(), 8);
        let mut patch = Patch::new();
        patch.insert("role".to_string(), PatchOp::Set(Value::Str("admin".into())));
        let filter = eq("email", Value::Str("grace@example.com".into()));
        let updated = update(&e, &mut ctx, "users", Some(&filter), &patch, &UpdateOptions::default()).unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].get("role"), Some(&Value::Str("admin".into())));
    }

    #[test]
    fn delete_cascades_to_referencing_table() {
        let users = Table::new("users").column(text("name"));
        let posts = Table::new("posts_mut")
            .column(orm_schema::id("author_id", "users").with_config(ColumnConfig::default().not_null()))
            .foreign_key(
                ForeignKey::new("posts_mut", vec!["author_id".into()], "users", vec!["_id".into()])
                    .on_delete(ForeignAction::Cascade),
            )
            .index(Index::new("by_author", vec!["author_id".into()]));
        let schema = Schema::build(vec![users, posts], SchemaOptions::default()).unwrap();
        let store = MemoryStore::new();
        let e = env(&schema, &store);

        let user = insert(&e, "users", Row::new(), &InsertOptions::default()).unwrap();
        let user_id = row_id(&user).unwrap();
        let mut post = Row::new();
        post.insert("author_id".to_string(), Value::Id(user_id.clone()));
        let post = insert(&e, "posts_mut", post, &InsertOptions::default()).unwrap();
        let post_id = row_id(&post).unwrap();

        let mut ctx = MutationContext::new(RlsContext::default(), 8);
        // A single row exists; deleting the whole table exercises the same
        // cascade path as a targeted filter without depending on `_id`
        // equality being index-covered — the planner only covers declared
        // indexes.
        delete(
            &e,
            &mut ctx,
            "users",
            None,
            &DeleteOptions {
                allow_full_scan: true,
                ..DeleteOptions::default()
            },
        )
        .unwrap();

        assert!(store.get(&user_id).unwrap().is_none());
        assert!(store.get(&post_id).unwrap().is_none());
    }

    #[test]
    fn scheduled_delete_stamps_deletion_time_and_enqueues_job() {
        let users = Table::new("users_soft")
            .column(text("name"))
            .column(orm_schema::integer("deletionTime"));
        let schema = Schema::build(vec![users], SchemaOptions::default()).unwrap();
        let store = MemoryStore::new();
        let scheduler = orm_storage::memory::MemoryScheduler::new();
        let e = MutationEnv {
            schema: &schema,
            store: &store,
            scheduler: Some(&scheduler),
            warn: &crate::warn::TracingWarnSink,
        };

        let user = insert(&e, "users_soft", Row::new(), &InsertOptions::default()).unwrap();
        let id = row_id(&user).unwrap();
        let mut ctx = MutationContext::new(RlsContext::default(), 8);
        let result = delete(
            &e,
            &mut ctx,
            "users_soft",
            None,
            &DeleteOptions {
                allow_full_scan: true,
                mode: DeleteMode::Scheduled { delay_ms: 0 },
                ..DeleteOptions::default()
            },
        )
        .unwrap();

        assert_eq!(result.len(), 1);
        assert!(result[0].get("deletionTime").is_some());
        assert_eq!(scheduler.pending_count(), 1);
        // The row still exists until a worker drains the scheduled job.
        assert!(store.get(&id).unwrap().is_some());
    }

    #[test]
    fn on_update_fn_fires_only_for_columns_the_caller_did_not_touch() {
        use orm_schema::ValueHook;

        let users = Table::new("users_hook").column(text("name")).column(
            text("updated_at").with_config(ColumnConfig::default().on_update_fn(ValueHook::new(|| Value::Str("stamped".into())))),
        );
        let schema = Schema::build(vec![users], SchemaOptions::default()).unwrap();
        let store = MemoryStore::new();
        let e = env(&schema, &store);

        let mut v = Row::new();
        v.insert("name".to_string(), Value::Str("Ada".into()));
        let row = insert(&e, "users_hook", v, &InsertOptions::default()).unwrap();
        let id = row_id(&row).unwrap();

        let mut ctx = MutationContext::new(RlsContext::default(), 8);
        let mut patch = Patch::new();
        patch.insert("name".to_string(), PatchOp::Set(Value::Str("Grace".into())));
        let updated = update_by_id(&e, &mut ctx, "users_hook", &id, &patch, &RlsContext::default()).unwrap();
        assert_eq!(updated.get("updated_at"), Some(&Value::Str("stamped".into())));
    }

    #[test]
    fn empty_patch_after_normalization_is_a_no_op() {
        let schema = users_schema();
        let store = MemoryStore::new();
        let e = env(&schema, &store);
        let mut v = Row::new();
        v.insert("email".to_string(), Value::Str("ada@example.com".into()));
        insert(&e, "users", v, &InsertOptions::default()).unwrap();

        let mut ctx = MutationContext::new(RlsContext::default(), 8);
        let patch = Patch::new();
        let filter = eq("email", Value::Str("ada@example.com".into()));
        let updated = update(&e, &mut ctx, "users", Some(&filter), &patch, &UpdateOptions::default()).unwrap();
        assert!(updated.is_empty());
    }
}
