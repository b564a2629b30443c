//! An in-memory reference implementation of [`DocumentStore`] and
//! [`Scheduler`], standing in for the real (out-of-scope) document
//! database and scheduler primitive.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use orm_core::idgen::generate_document_key;
use orm_core::{Id, PatchOp, Patch, Row, Value};
use orm_query::IndexPick;
use orm_schema::{Table, BY_CREATION_TIME_INDEX, BY_ID_INDEX};

use crate::error::{Result, StorageError};
use crate::traits::{DocumentStore, ScheduledFunctions, Scheduler};

#[derive(Default)]
struct TableRows {
    rows: BTreeMap<String, Row>,
}

struct MemoryState {
    tables: BTreeMap<String, TableRows>,
    next_counter: u64,
}

/// The in-memory [`DocumentStore`]. One instance backs one `(hostDb,
/// scheduler)` tuple under the isolated-instance guarantee: construct a
/// fresh one per test or per ORM instance, never share across unrelated
/// mutations.
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                tables: BTreeMap::new(),
                next_counter: 0,
            }),
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut MemoryState) -> T) -> T {
        let mut guard = self.state.lock().expect("memory store mutex poisoned");
        f(&mut guard)
    }
}

fn resolve_index_columns(table: &Table, index_name: &str) -> Vec<String> {
    if index_name == BY_ID_INDEX {
        return vec!["_id".to_string()];
    }
    if index_name == BY_CREATION_TIME_INDEX {
        return vec!["_creationTime".to_string()];
    }
    table
        .get_indexes()
        .iter()
        .find(|i| i.name == index_name)
        .map(|i| i.columns.clone())
        .or_else(|| {
            table
                .get_unique_indexes()
                .iter()
                .find(|i| i.name == index_name)
                .map(|i| i.columns.clone())
        })
        .unwrap_or_default()
}

fn range_matches(row: &Row, range: &orm_query::RangeClause) -> bool {
    use orm_filter::expr::{BinaryOp, Operand};
    let actual = row.get(&range.field.field_name).cloned().unwrap_or(Value::Null);
    match (&range.op, &range.operand) {
        (BinaryOp::Gt, Operand::Scalar(v)) => actual.cmp_ordered(v).is_gt(),
        (BinaryOp::Gte, Operand::Scalar(v)) => actual.cmp_ordered(v).is_ge(),
        (BinaryOp::Lt, Operand::Scalar(v)) => actual.cmp_ordered(v).is_lt(),
        (BinaryOp::Lte, Operand::Scalar(v)) => actual.cmp_ordered(v).is_le(),
        _ => true,
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, id: &Id) -> Result<Option<Row>> {
        Ok(self.with_state(|s| {
            s.tables
                .get(&id.table)
                .and_then(|t| t.rows.get(&id.key))
                .cloned()
        }))
    }

    fn insert(&self, table: &str, mut row: Row) -> Result<Id> {
        let (id, creation_time) = self.with_state(|s| {
            let counter = s.next_counter;
            s.next_counter += 1;
            let key = generate_document_key(table, counter, 0);
            (Id::new(table, key), counter as i64)
        });
        row.insert("_id".to_string(), Value::Id(id.clone()));
        row.insert("_creationTime".to_string(), Value::Int(creation_time));
        self.with_state(|s| {
            s.tables
                .entry(table.to_string())
                .or_default()
                .rows
                .insert(id.key.clone(), row);
        });
        Ok(id)
    }

    fn patch(&self, id: &Id, patch: &Patch) -> Result<()> {
        self.with_state(|s| {
            let table = s
                .tables
                .get_mut(&id.table)
                .ok_or_else(|| StorageError::NotFound {
                    table: id.table.clone(),
                    id: id.key.clone(),
                })?;
            let row = table.rows.get_mut(&id.key).ok_or_else(|| StorageError::NotFound {
                table: id.table.clone(),
                id: id.key.clone(),
            })?;
            for (column, op) in patch {
                match op {
                    PatchOp::Set(value) => {
                        row.insert(column.clone(), value.clone());
                    }
                    PatchOp::Unset => {
                        row.remove(column);
                    }
                }
            }
            Ok(())
        })
    }

    fn delete(&self, id: &Id) -> Result<()> {
        self.with_state(|s| {
            let table = s
                .tables
                .get_mut(&id.table)
                .ok_or_else(|| StorageError::NotFound {
                    table: id.table.clone(),
                    id: id.key.clone(),
                })?;
            table
                .rows
                .remove(&id.key)
                .map(|_| ())
                .ok_or_else(|| StorageError::NotFound {
                    table: id.table.clone(),
                    id: id.key.clone(),
                })
        })
    }

    fn scan_index(&self, table: &Table, pick: &IndexPick) -> Result<Vec<Row>> {
        let columns = resolve_index_columns(table, &pick.index_name);
        let rows: Vec<Row> = self.with_state(|s| {
            s.tables
                .get(&table.name)
                .map(|t| t.rows.values().cloned().collect())
                .unwrap_or_default()
        });

        let mut filtered: Vec<Row> = rows
            .into_iter()
            .filter(|row| {
                pick.equality_prefix.iter().all(|(col, val)| {
                    row.get(col).cloned().unwrap_or(Value::Null) == *val
                }) && pick
                    .multi_probe
                    .as_ref()
                    .map(|(col, values)| {
                        values.contains(&row.get(col).cloned().unwrap_or(Value::Null))
                    })
                    .unwrap_or(true)
                    && pick.range.as_ref().map(|r| range_matches(row, r)).unwrap_or(true)
            })
            .collect();

        let sort_col = columns
            .get(pick.equality_prefix.len())
            .cloned()
            .unwrap_or_else(|| "_creationTime".to_string());
        filtered.sort_by(|a, b| {
            let av = a.get(&sort_col).cloned().unwrap_or(Value::Null);
            let bv = b.get(&sort_col).cloned().unwrap_or(Value::Null);
            av.cmp_ordered(&bv)
        });
        if pick.order_desc {
            filtered.reverse();
        }
        Ok(filtered)
    }
}

struct ScheduledJob {
    id: String,
    function_ref: String,
    args: serde_json::Value,
}

/// The in-memory [`Scheduler`]. Ignores `delayMs`/`runAt` timing (there is
/// no wall clock to wait on in a reference implementation) and simply
/// queues jobs in submission order; [`MemoryScheduler::drain`] runs them
/// to completion, matching a worker loop that runs until the queue is
/// drained.
pub struct MemoryScheduler {
    queue: Mutex<VecDeque<ScheduledJob>>,
    next_id: Mutex<u64>,
}

impl Default for MemoryScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryScheduler {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            next_id: Mutex::new(0),
        }
    }

    fn enqueue(&self, function_ref: &str, args: serde_json::Value) -> String {
        let mut next_id = self.next_id.lock().expect("scheduler mutex poisoned");
        let id = format!("sched_{}", *next_id);
        *next_id += 1;
        self.queue
            .lock()
            .expect("scheduler mutex poisoned")
            .push_back(ScheduledJob {
                id: id.clone(),
                function_ref: function_ref.to_string(),
                args,
            });
        id
    }

    /// Runs every queued job (including any a job enqueues while running)
    /// until the queue is empty.
    pub fn drain(&self, store: &dyn DocumentStore, handlers: &dyn ScheduledFunctions) -> Result<()> {
        loop {
            let job = self.queue.lock().expect("scheduler mutex poisoned").pop_front();
            match job {
                Some(job) => handlers.dispatch(store, self, &job.function_ref, job.args)?,
                None => return Ok(()),
            }
        }
    }

    pub fn pending_count(&self) -> usize {
        self.queue.lock().expect("scheduler mutex poisoned").len()
    }
}

impl Scheduler for MemoryScheduler {
    fn run_after(&self, _delay_ms: u64, function_ref: &str, args: serde_json::Value) -> Result<String> {
        Ok(self.enqueue(function_ref, args))
    }

    fn run_at(&self, _timestamp_ms: i64, function_ref: &str, args: serde_json::Value) -> Result<String> {
        Ok(self.enqueue(function_ref, args))
    }

    fn cancel(&self, schedule_id: &str) -> Result<()> {
        self.queue
            .lock()
            .expect("scheduler mutex poisoned")
            .retain(|j| j.id != schedule_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orm_query::pick_index;
    use orm_schema::{text, Table};
    use std::collections::BTreeMap as Map;

    fn user_row(name: &str) -> Row {
        let mut row = Map::new();
        row.insert("name".to_string(), Value::Str(name.to_string()));
        row
    }

    #[test]
    fn insert_then_get_roundtrips() {
        let store = MemoryStore::new();
        let id = store.insert("users", user_row("Ada")).unwrap();
        let row = store.get(&id).unwrap().unwrap();
        assert_eq!(row.get("name"), Some(&Value::Str("Ada".to_string())));
        assert_eq!(row.get("_id"), Some(&Value::Id(id)));
    }

    #[test]
    fn patch_sets_and_unsets() {
        let store = MemoryStore::new();
        let id = store.insert("users", user_row("Ada")).unwrap();
        let mut patch: Patch = Map::new();
        patch.insert("name".to_string(), PatchOp::Set(Value::Str("Grace".to_string())));
        store.patch(&id, &patch).unwrap();
        assert_eq!(store.get(&id).unwrap().unwrap().get("name"), Some(&Value::Str("Grace".to_string())));

        let mut unset: Patch = Map::new();
        unset.insert("name".to_string(), PatchOp::Unset);
        store.patch(&id, &unset).unwrap();
        assert_eq!(store.get(&id).unwrap().unwrap().get("name"), None);
    }

    #[test]
    fn delete_removes_row() {
        let store = MemoryStore::new();
        let id = store.insert("users", user_row("Ada")).unwrap();
        store.delete(&id).unwrap();
        assert!(store.get(&id).unwrap().is_none());
    }

    #[test]
    fn scan_index_orders_by_creation_time() {
        let store = MemoryStore::new();
        let table = Table::new("users").column(text("name"));
        store.insert("users", user_row("Ada")).unwrap();
        store.insert("users", user_row("Grace")).unwrap();
        let pick = pick_index(&table, None, "_creationTime", true, false, true).unwrap();
        let rows = store.scan_index(&table, &pick).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("name"), Some(&Value::Str("Ada".to_string())));
    }
}
