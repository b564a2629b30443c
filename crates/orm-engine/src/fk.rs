//! Foreign-key enforcement on write.

use orm_core::{Id, Row, Value};
use orm_query::IndexPick;
use orm_schema::{Schema, Table};
use orm_storage::DocumentStore;

use crate::error::{EngineError, Result};
use crate::util::index_covering;

/// Validates every FK declaration on `table` against `row`, skipping any
/// FK whose source columns contain a NULL value.
pub fn enforce_foreign_keys(schema: &Schema, store: &dyn DocumentStore, table: &Table, row: &Row) -> Result<()> {
    for fk in table.get_foreign_keys() {
        let values: Vec<Value> = fk
            .source_columns
            .iter()
            .map(|c| row.get(c).cloned().unwrap_or(Value::Null))
            .collect();
        if values.iter().any(Value::is_null) {
            continue;
        }

        let Some(target) = schema.table(&fk.target_table) else {
            return Err(EngineError::ForeignKeyMissingTarget {
                table: table.name.clone(),
                columns: fk.source_columns.clone(),
                target_table: fk.target_table.clone(),
            });
        };

        if fk.targets_id() {
            let target_id = values[0].as_id().cloned().unwrap_or_else(|| {
                Id::new(fk.target_table.clone(), values[0].as_str().unwrap_or_default().to_string())
            });
            if store.get(&target_id)?.is_none() {
                return Err(EngineError::ForeignKeyMissingTarget {
                    table: table.name.clone(),
                    columns: fk.source_columns.clone(),
                    target_table: fk.target_table.clone(),
                });
            }
            continue;
        }

        let Some(index_name) = index_covering(target, &fk.target_columns) else {
            return Err(EngineError::ForeignKeyRequiresIndex {
                table: table.name.clone(),
                columns: fk.target_columns.clone(),
                target_table: fk.target_table.clone(),
            });
        };

        let pick = IndexPick {
            index_name,
            equality_prefix: fk.target_columns.iter().cloned().zip(values.iter().cloned()).collect(),
            multi_probe: None,
            range: None,
            residual: Vec::new(),
            order_desc: false,
            is_full_scan: false,
        };
        if store.scan_index(target, &pick)?.is_empty() {
            return Err(EngineError::ForeignKeyMissingTarget {
                table: table.name.clone(),
                columns: fk.source_columns.clone(),
                target_table: fk.target_table.clone(),
            });
        }
    }
    Ok(())
}
