//! The cascade executor: walks the **incoming** foreign-key graph on
//! delete/update, applying the declared referential action within
//! row/byte/schedule budgets, spilling to scheduled continuations in
//! async mode.

use orm_core::{Id, Patch, PatchOp, Row, Value};
use orm_query::IndexPick;
use orm_schema::{ForeignAction, ForeignKey, MutationExecutionMode, Schema, Table, BY_ID_INDEX, BYTE_SAFETY_MULTIPLIER};
use orm_storage::wire::{ForeignActionWire, ScheduledDeleteArgs, ScheduledMutationArgs, WorkType, SCHEDULED_MUTATION_BATCH};
use orm_storage::{DeleteMode as WireDeleteMode, DocumentStore, Scheduler};

use crate::context::MutationContext;
use crate::error::{EngineError, Result};
use crate::util::{approx_json_bytes, index_covering};
use crate::warn::WarnSink;

/// Everything the cascade walk needs to reach the host, bundled so the
/// recursive functions below don't have to thread five parameters apiece.
pub struct CascadeEnv<'a> {
    pub schema: &'a Schema,
    pub store: &'a dyn DocumentStore,
    pub scheduler: Option<&'a dyn Scheduler>,
    pub warn: &'a dyn WarnSink,
    pub mode: MutationExecutionMode,
}

fn foreign_action_wire(action: ForeignAction) -> ForeignActionWire {
    match action {
        ForeignAction::Cascade => ForeignActionWire::Cascade,
        ForeignAction::Restrict => ForeignActionWire::Restrict,
        ForeignAction::SetNull => ForeignActionWire::SetNull,
        ForeignAction::SetDefault => ForeignActionWire::SetDefault,
        ForeignAction::NoAction => ForeignActionWire::NoAction,
    }
}

/// Every declared FK across the whole schema whose target is `target_table`
/// — the "incoming" edge set the cascade executor drives.
pub fn incoming_foreign_keys<'a>(schema: &'a Schema, target_table: &str) -> Vec<&'a ForeignKey> {
    schema
        .tables()
        .flat_map(|t| t.get_foreign_keys())
        .filter(|fk| fk.target_table == target_table)
        .collect()
}

fn probe_referencing(
    store: &dyn DocumentStore,
    table: &Table,
    columns: &[String],
    values: &[Value],
    index_name: Option<&str>,
) -> Result<Vec<Row>> {
    match index_name {
        Some(name) => {
            let pick = IndexPick {
                index_name: name.to_string(),
                equality_prefix: columns.iter().cloned().zip(values.iter().cloned()).collect(),
                multi_probe: None,
                range: None,
                residual: Vec::new(),
                order_desc: false,
                is_full_scan: false,
            };
            Ok(store.scan_index(table, &pick)?)
        }
        None => {
            let pick = IndexPick {
                index_name: BY_ID_INDEX.to_string(),
                equality_prefix: Vec::new(),
                multi_probe: None,
                range: None,
                residual: Vec::new(),
                order_desc: false,
                is_full_scan: true,
            };
            let rows = store.scan_index(table, &pick)?;
            Ok(rows
                .into_iter()
                .filter(|r| {
                    columns
                        .iter()
                        .zip(values.iter())
                        .all(|(c, v)| r.get(c).cloned().unwrap_or(Value::Null) == *v)
                })
                .collect())
        }
    }
}

/// Splits `rows` into the batch this pass may apply (bounded by
/// `batch_size` rows and `max_bytes` measured JSON bytes x the safety
/// multiplier) and whether more rows remain beyond it.
fn take_batch(rows: &[Row], batch_size: u32, max_bytes: u64) -> (usize, bool) {
    let cap = (batch_size as usize).min(rows.len());
    let mut count = 0usize;
    let mut bytes = 0u64;
    for row in &rows[..cap] {
        let row_bytes = approx_json_bytes(row) as u64 * BYTE_SAFETY_MULTIPLIER;
        if count > 0 && bytes + row_bytes > max_bytes {
            break;
        }
        bytes += row_bytes;
        count += 1;
    }
    let remaining = count < rows.len();
    (count, remaining)
}

fn schedule_continuation(
    env: &CascadeEnv,
    ctx: &mut MutationContext,
    root_table: &str,
    work_type: WorkType,
    operation: &str,
    fk: &ForeignKey,
    index_name: &str,
    target_values: &[Value],
    new_values: Option<&[Value]>,
    cursor: usize,
) -> Result<()> {
    let Some(scheduler) = env.scheduler else {
        return Ok(());
    };
    if !ctx.try_consume_schedule_call() {
        return Err(EngineError::MutationScheduleCallCapExceeded {
            table: root_table.to_string(),
            cap: 0,
        });
    }
    let batch_size = if work_type == WorkType::CascadeDelete && fk.on_delete == ForeignAction::Cascade {
        env.schema.options().defaults.mutation_batch_size
    } else {
        env.schema.options().defaults.mutation_leaf_batch_size
    };
    let args = ScheduledMutationArgs {
        work_type,
        mode: "async".to_string(),
        operation: operation.to_string(),
        table: fk.source_table.clone(),
        foreign_index_name: index_name.to_string(),
        foreign_source_columns: fk.source_columns.clone(),
        target_values: target_values.to_vec(),
        new_values: new_values.map(|v| v.to_vec()),
        foreign_action: foreign_action_wire(if operation == "delete" { fk.on_delete } else { fk.on_update }),
        delete_mode: None,
        cascade_mode: Some(WireDeleteMode::Hard),
        cursor: Some(cursor.to_string()),
        batch_size,
        max_bytes_per_batch: env.schema.options().defaults.mutation_max_bytes_per_batch,
        delay_ms: env.schema.options().defaults.mutation_async_delay_ms,
    };
    scheduler.run_after(
        args.delay_ms,
        SCHEDULED_MUTATION_BATCH,
        serde_json::to_value(&args).map_err(orm_storage::StorageError::Serialization)?,
    )?;
    Ok(())
}

/// Deletes or soft-deletes `id` in `table`, per `cascade_mode`.
fn remove_row(store: &dyn DocumentStore, table: &Table, id: &Id, cascade_mode: WireDeleteMode) -> Result<()> {
    match cascade_mode {
        WireDeleteMode::Hard => store.delete(id).map_err(EngineError::from),
        WireDeleteMode::Soft => {
            if !table.get_columns().iter().any(|c| c.name == "deletionTime") {
                return Err(EngineError::MissingDeletionTimeColumn {
                    table: table.name.clone(),
                });
            }
            let mut patch = Patch::new();
            patch.insert("deletionTime".to_string(), PatchOp::Set(Value::Int(now_millis())));
            store.patch(id, &patch).map_err(EngineError::from)
        }
        WireDeleteMode::Scheduled => unreachable!("cascade rows are never themselves scheduled"),
    }
}

fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Walks the incoming FK graph for a row about to be removed from
/// `root_table`, applying each edge's `onDelete` action, then removes
/// the root row itself per `cascade_mode`.
pub fn on_delete(
    env: &CascadeEnv,
    ctx: &mut MutationContext,
    root_table: &str,
    root_row: &Row,
    cascade_mode: WireDeleteMode,
) -> Result<()> {
    let root_id = root_row
        .get("_id")
        .and_then(Value::as_id)
        .cloned()
        .ok_or_else(|| EngineError::Internal("row missing _id during cascade".to_string()))?;

    if !ctx.visit(root_table, &root_id) {
        return Ok(());
    }

    for fk in incoming_foreign_keys(env.schema, root_table) {
        let target_values: Vec<Value> = fk
            .target_columns
            .iter()
            .map(|c| root_row.get(c).cloned().unwrap_or(Value::Null))
            .collect();
        if target_values.iter().any(Value::is_null) {
            continue;
        }
        let Some(source_table) = env.schema.table(&fk.source_table) else {
            continue;
        };
        let index_name = index_covering(source_table, &fk.source_columns);

        match fk.on_delete {
            ForeignAction::Restrict | ForeignAction::NoAction => {
                if index_name.is_none() {
                    env.warn.warn(&format!(
                        "cascade: no index on '{}' over {:?}; falling back to full scan for restrict check",
                        fk.source_table, fk.source_columns
                    ));
                }
                let referencing =
                    probe_referencing(env.store, source_table, &fk.source_columns, &target_values, index_name.as_deref())?;
                if !referencing.is_empty() {
                    return Err(EngineError::RestrictViolation {
                        table: fk.source_table.clone(),
                        source_table: root_table.to_string(),
                    });
                }
            }
            ForeignAction::SetNull => {
                let Some(idx) = index_name else {
                    return Err(EngineError::CascadeRequiresIndex {
                        source_table: fk.source_table.clone(),
                        columns: fk.source_columns.clone(),
                    });
                };
                if let Some(col) = fk.source_columns.iter().find(|c| {
                    source_table.get_column(c).map(|col| col.config.not_null).unwrap_or(false)
                }) {
                    return Err(EngineError::NotNullViolation {
                        table: fk.source_table.clone(),
                        column: col.clone(),
                    });
                }
                apply_delete_batch(env, ctx, root_table, fk, &idx, &target_values, BatchAction::SetNull)?;
            }
            ForeignAction::SetDefault => {
                let Some(idx) = index_name else {
                    return Err(EngineError::CascadeRequiresIndex {
                        source_table: fk.source_table.clone(),
                        columns: fk.source_columns.clone(),
                    });
                };
                apply_delete_batch(env, ctx, root_table, fk, &idx, &target_values, BatchAction::SetDefault)?;
            }
            ForeignAction::Cascade => {
                let Some(idx) = index_name else {
                    return Err(EngineError::CascadeRequiresIndex {
                        source_table: fk.source_table.clone(),
                        columns: fk.source_columns.clone(),
                    });
                };
                apply_delete_batch(env, ctx, root_table, fk, &idx, &target_values, BatchAction::CascadeDelete(cascade_mode))?;
            }
        }
    }

    let table = env
        .schema
        .table(root_table)
        .ok_or_else(|| EngineError::Internal(format!("unknown table '{root_table}' during cascade")))?;
    remove_row(env.store, table, &root_id, cascade_mode)
}

enum BatchAction {
    SetNull,
    SetDefault,
    CascadeDelete(WireDeleteMode),
}

fn apply_delete_batch(
    env: &CascadeEnv,
    ctx: &mut MutationContext,
    root_table: &str,
    fk: &ForeignKey,
    index_name: &str,
    target_values: &[Value],
    action: BatchAction,
) -> Result<()> {
    let source_table = env.schema.table(&fk.source_table).expect("validated at schema build");
    let referencing = probe_referencing(env.store, source_table, &fk.source_columns, target_values, Some(index_name))?;
    if referencing.is_empty() {
        return Ok(());
    }

    let (taken, has_more) = match env.mode {
        MutationExecutionMode::Sync => (referencing.len(), false),
        MutationExecutionMode::Async => {
            let batch_size = match action {
                BatchAction::CascadeDelete(_) => env.schema.options().defaults.mutation_batch_size,
                _ => env.schema.options().defaults.mutation_leaf_batch_size,
            };
            take_batch(&referencing, batch_size, env.schema.options().defaults.mutation_max_bytes_per_batch)
        }
    };

    if env.mode == MutationExecutionMode::Sync {
        let limit = env.schema.options().defaults.mutation_max_rows;
        if !ctx.try_touch_rows(taken as u32, limit) {
            return Err(EngineError::MutationMaxRowsExceeded {
                table: fk.source_table.clone(),
                limit,
            });
        }
    }

    for row in &referencing[..taken] {
        let id = row.get("_id").and_then(Value::as_id).cloned().expect("row has _id");
        match &action {
            BatchAction::SetNull => {
                let mut patch = Patch::new();
                for col in &fk.source_columns {
                    patch.insert(col.clone(), PatchOp::Set(Value::Null));
                }
                env.store.patch(&id, &patch)?;
            }
            BatchAction::SetDefault => {
                let mut patch = Patch::new();
                for col in &fk.source_columns {
                    let column = source_table.get_column(col).expect("validated at schema build");
                    let default = column
                        .config
                        .default_fn
                        .as_ref()
                        .map(|h| h.call())
                        .or_else(|| column.config.default.clone())
                        .ok_or_else(|| {
                            EngineError::Internal(format!(
                                "setDefault cascade on '{}.{}' but column has no default",
                                fk.source_table, col
                            ))
                        })?;
                    patch.insert(col.clone(), PatchOp::Set(default));
                }
                env.store.patch(&id, &patch)?;
            }
            BatchAction::CascadeDelete(cascade_mode) => {
                on_delete(env, ctx, &fk.source_table, row, *cascade_mode)?;
            }
        }
    }

    if has_more {
        schedule_continuation(
            env,
            ctx,
            root_table,
            WorkType::CascadeDelete,
            "delete",
            fk,
            index_name,
            target_values,
            None,
            taken,
        )?;
    }

    Ok(())
}

/// Walks the incoming FK graph for a row whose columns intersecting some
/// FK's `targetCols` just changed.
pub fn on_update(env: &CascadeEnv, ctx: &mut MutationContext, table_name: &str, old_row: &Row, new_row: &Row) -> Result<()> {
    for fk in incoming_foreign_keys(env.schema, table_name) {
        let old_values: Vec<Value> = fk
            .target_columns
            .iter()
            .map(|c| old_row.get(c).cloned().unwrap_or(Value::Null))
            .collect();
        let new_values: Vec<Value> = fk
            .target_columns
            .iter()
            .map(|c| new_row.get(c).cloned().unwrap_or(Value::Null))
            .collect();
        if old_values == new_values || old_values.iter().any(Value::is_null) {
            continue;
        }
        let Some(source_table) = env.schema.table(&fk.source_table) else {
            continue;
        };
        let Some(index_name) = index_covering(source_table, &fk.source_columns) else {
            if matches!(fk.on_update, ForeignAction::Restrict | ForeignAction::NoAction) {
                continue;
            }
            return Err(EngineError::CascadeRequiresIndex {
                source_table: fk.source_table.clone(),
                columns: fk.source_columns.clone(),
            });
        };

        match fk.on_update {
            ForeignAction::Restrict | ForeignAction::NoAction => {
                let referencing = probe_referencing(env.store, source_table, &fk.source_columns, &old_values, Some(&index_name))?;
                if !referencing.is_empty() {
                    return Err(EngineError::RestrictViolation {
                        table: fk.source_table.clone(),
                        source_table: table_name.to_string(),
                    });
                }
            }
            ForeignAction::SetNull | ForeignAction::SetDefault | ForeignAction::Cascade => {
                apply_update_batch(env, ctx, table_name, fk, &index_name, &old_values, &new_values)?;
            }
        }
    }
    Ok(())
}

fn apply_update_batch(
    env: &CascadeEnv,
    ctx: &mut MutationContext,
    root_table: &str,
    fk: &ForeignKey,
    index_name: &str,
    old_values: &[Value],
    new_values: &[Value],
) -> Result<()> {
    let source_table = env.schema.table(&fk.source_table).expect("validated at schema build");
    let referencing = probe_referencing(env.store, source_table, &fk.source_columns, old_values, Some(index_name))?;
    if referencing.is_empty() {
        return Ok(());
    }

    let (taken, has_more) = match env.mode {
        MutationExecutionMode::Sync => (referencing.len(), false),
        MutationExecutionMode::Async => {
            take_batch(&referencing, env.schema.options().defaults.mutation_leaf_batch_size, env.schema.options().defaults.mutation_max_bytes_per_batch)
        }
    };

    if env.mode == MutationExecutionMode::Sync {
        let limit = env.schema.options().defaults.mutation_max_rows;
        if !ctx.try_touch_rows(taken as u32, limit) {
            return Err(EngineError::MutationMaxRowsExceeded {
                table: fk.source_table.clone(),
                limit,
            });
        }
    }

    for row in &referencing[..taken] {
        let id = row.get("_id").and_then(Value::as_id).cloned().expect("row has _id");
        let mut patch = Patch::new();
        match fk.on_update {
            ForeignAction::SetNull => {
                for col in &fk.source_columns {
                    patch.insert(col.clone(), PatchOp::Set(Value::Null));
                }
            }
            ForeignAction::SetDefault => {
                for col in &fk.source_columns {
                    let column = source_table.get_column(col).expect("validated at schema build");
                    let default = column
                        .config
                        .default_fn
                        .as_ref()
                        .map(|h| h.call())
                        .or_else(|| column.config.default.clone())
                        .ok_or_else(|| {
                            EngineError::Internal(format!(
                                "setDefault cascade on '{}.{}' but column has no default",
                                fk.source_table, col
                            ))
                        })?;
                    patch.insert(col.clone(), PatchOp::Set(default));
                }
            }
            ForeignAction::Cascade => {
                for (col, v) in fk.source_columns.iter().zip(new_values.iter()) {
                    let column = source_table.get_column(col).expect("validated at schema build");
                    if column.config.not_null && v.is_null() {
                        return Err(EngineError::NotNullViolation {
                            table: fk.source_table.clone(),
                            column: col.clone(),
                        });
                    }
                    patch.insert(col.clone(), PatchOp::Set(v.clone()));
                }
            }
            ForeignAction::Restrict | ForeignAction::NoAction => unreachable!("handled by caller"),
        }
        env.store.patch(&id, &patch)?;
    }

    if has_more {
        schedule_continuation(
            env,
            ctx,
            root_table,
            WorkType::CascadeUpdate,
            "update",
            fk,
            index_name,
            old_values,
            Some(new_values),
            taken,
        )?;
    }

    Ok(())
}

/// Resumes a `scheduledMutationBatch` continuation: re-probes the same
/// FK edge, skips the rows a prior pass already consumed (`args.cursor`),
/// and applies the next bounded batch, scheduling a further continuation
/// if rows remain.
/// This is the facade's `ScheduledFunctions::dispatch` entry point for
/// [`orm_storage::wire::SCHEDULED_MUTATION_BATCH`]; `orm-engine` does not
/// register it itself since wiring a `Scheduler`'s worker loop to it is a
/// host concern.
pub fn resume_scheduled_mutation(env: &CascadeEnv, ctx: &mut MutationContext, args: &ScheduledMutationArgs) -> Result<()> {
    let fk = env
        .schema
        .tables()
        .flat_map(|t| t.get_foreign_keys())
        .find(|fk| fk.source_table == args.table && fk.source_columns == args.foreign_source_columns)
        .ok_or_else(|| EngineError::Internal(format!("no foreign key on '{}' over {:?} for scheduled continuation", args.table, args.foreign_source_columns)))?
        .clone();
    let source_table = env
        .schema
        .table(&args.table)
        .ok_or_else(|| EngineError::Internal(format!("unknown table '{}' during scheduled continuation", args.table)))?;

    let referencing = probe_referencing(env.store, source_table, &fk.source_columns, &args.target_values, Some(&args.foreign_index_name))?;
    let start = args.cursor.as_deref().and_then(|c| c.parse::<usize>().ok()).unwrap_or(0).min(referencing.len());
    let remainder = &referencing[start..];
    if remainder.is_empty() {
        return Ok(());
    }

    let (taken, has_more) = take_batch(remainder, args.batch_size, args.max_bytes_per_batch);

    match args.work_type {
        WorkType::CascadeDelete => {
            let cascade_mode = args.cascade_mode.unwrap_or(WireDeleteMode::Hard);
            for row in &remainder[..taken] {
                match fk.on_delete {
                    ForeignAction::Cascade => on_delete(env, ctx, &fk.source_table, row, cascade_mode)?,
                    ForeignAction::SetNull => {
                        let id = row.get("_id").and_then(Value::as_id).cloned().expect("row has _id");
                        let mut patch = Patch::new();
                        for col in &fk.source_columns {
                            patch.insert(col.clone(), PatchOp::Set(Value::Null));
                        }
                        env.store.patch(&id, &patch)?;
                    }
                    ForeignAction::SetDefault => {
                        let id = row.get("_id").and_then(Value::as_id).cloned().expect("row has _id");
                        let mut patch = Patch::new();
                        for col in &fk.source_columns {
                            let column = source_table.get_column(col).expect("validated at schema build");
                            let default = column
                                .config
                                .default_fn
                                .as_ref()
                                .map(|h| h.call())
                                .or_else(|| column.config.default.clone())
                                .ok_or_else(|| {
                                    EngineError::Internal(format!(
                                        "setDefault cascade on '{}.{}' but column has no default",
                                        fk.source_table, col
                                    ))
                                })?;
                            patch.insert(col.clone(), PatchOp::Set(default));
                        }
                        env.store.patch(&id, &patch)?;
                    }
                    ForeignAction::Restrict | ForeignAction::NoAction => {
                        return Err(EngineError::RestrictViolation {
                            table: fk.source_table.clone(),
                            source_table: args.table.clone(),
                        });
                    }
                }
            }
        }
        WorkType::CascadeUpdate => {
            let new_values = args.new_values.clone().unwrap_or_default();
            for row in &remainder[..taken] {
                let id = row.get("_id").and_then(Value::as_id).cloned().expect("row has _id");
                let mut patch = Patch::new();
                match fk.on_update {
                    ForeignAction::SetNull => {
                        for col in &fk.source_columns {
                            patch.insert(col.clone(), PatchOp::Set(Value::Null));
                        }
                    }
                    ForeignAction::SetDefault => {
                        for col in &fk.source_columns {
                            let column = source_table.get_column(col).expect("validated at schema build");
                            let default = column
                                .config
                                .default_fn
                                .as_ref()
                                .map(|h| h.call())
                                .or_else(|| column.config.default.clone())
                                .ok_or_else(|| {
                                    EngineError::Internal(format!(
                                        "setDefault cascade on '{}.{}' but column has no default",
                                        fk.source_table, col
                                    ))
                                })?;
                            patch.insert(col.clone(), PatchOp::Set(default));
                        }
                    }
                    ForeignAction::Cascade => {
                        for (col, v) in fk.source_columns.iter().zip(new_values.iter()) {
                            patch.insert(col.clone(), PatchOp::Set(v.clone()));
                        }
                    }
                    ForeignAction::Restrict | ForeignAction::NoAction => {
                        return Err(EngineError::RestrictViolation {
                            table: fk.source_table.clone(),
                            source_table: args.table.clone(),
                        });
                    }
                }
                env.store.patch(&id, &patch)?;
            }
        }
    }

    if has_more {
        schedule_continuation(
            env,
            ctx,
            &args.table,
            args.work_type,
            &args.operation,
            &fk,
            &args.foreign_index_name,
            &args.target_values,
            args.new_values.as_deref(),
            start + taken,
        )?;
    }

    Ok(())
}

/// Resumes a `scheduledDelete` continuation. No-op if the row is already
/// gone or if its `deletionTime` no longer matches the token stamped
/// when the job was scheduled — a later write already raced past this
/// job. A token mismatch is a silent no-op, not an error.
pub fn resume_scheduled_delete(env: &CascadeEnv, ctx: &mut MutationContext, args: &ScheduledDeleteArgs) -> Result<()> {
    let Some(row) = env.store.get(&args.id)? else {
        return Ok(());
    };
    if row.get("deletionTime") != Some(&Value::Int(args.deletion_time)) {
        return Ok(());
    }
    on_delete(env, ctx, &args.table, &row, args.cascade_mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RlsContext;
    use orm_core::Row as RowMap;
    use orm_schema::{id, text, ColumnConfig, ForeignKey, SchemaOptions, Table};
    use orm_storage::memory::MemoryStore;

    fn users_memberships_schema() -> Schema {
        let users = Table::new("users").column(text("slug"));
        let memberships = Table::new("memberships_cascade")
            .column(id("user_id", "users").with_config(ColumnConfig::default().not_null()))
            .foreign_key(
                ForeignKey::new("memberships_cascade", vec!["user_id".into()], "users", vec!["_id".into()])
                    .on_delete(ForeignAction::Cascade),
            )
            .index(orm_schema::Index::new("by_user", vec!["user_id".into()]));
        Schema::build(vec![users, memberships], SchemaOptions::default()).unwrap()
    }

    #[test]
    fn cascade_delete_removes_referencing_rows_sync() {
        let schema = users_memberships_schema();
        let store = MemoryStore::new();
        let user_id = store.insert("users", RowMap::new()).unwrap();
        let mut m1 = RowMap::new();
        m1.insert("user_id".to_string(), Value::Id(user_id.clone()));
        let mem_id = store.insert("memberships_cascade", m1).unwrap();

        let env = CascadeEnv {
            schema: &schema,
            store: &store,
            scheduler: None,
            warn: &crate::warn::TracingWarnSink,
            mode: MutationExecutionMode::Sync,
        };
        let mut ctx = MutationContext::new(RlsContext::default(), 8);
        let root_row = store.get(&user_id).unwrap().unwrap();
        on_delete(&env, &mut ctx, "users", &root_row, WireDeleteMode::Hard).unwrap();

        assert!(store.get(&user_id).unwrap().is_none());
        assert!(store.get(&mem_id).unwrap().is_none());
    }

    #[test]
    fn restrict_blocks_delete_when_referencing_rows_exist() {
        let users = Table::new("users").column(text("slug"));
        let posts = Table::new("posts_restrict")
            .column(id("author_id", "users").with_config(ColumnConfig::default().not_null()))
            .foreign_key(
                ForeignKey::new("posts_restrict", vec!["author_id".into()], "users", vec!["_id".into()])
                    .on_delete(ForeignAction::Restrict),
            )
            .index(orm_schema::Index::new("by_author", vec!["author_id".into()]));
        let schema = Schema::build(vec![users, posts], SchemaOptions::default()).unwrap();
        let store = MemoryStore::new();
        let user_id = store.insert("users", RowMap::new()).unwrap();
        let mut p = RowMap::new();
        p.insert("author_id".to_string(), Value::Id(user_id.clone()));
        store.insert("posts_restrict", p).unwrap();

        let env = CascadeEnv {
            schema: &schema,
            store: &store,
            scheduler: None,
            warn: &crate::warn::TracingWarnSink,
            mode: MutationExecutionMode::Sync,
        };
        let mut ctx = MutationContext::new(RlsContext::default(), 8);
        let root_row = store.get(&user_id).unwrap().unwrap();
        let err = on_delete(&env, &mut ctx, "users", &root_row, WireDeleteMode::Hard).unwrap_err();
        assert!(matches!(err, EngineError::RestrictViolation { .. }));
    }
}
