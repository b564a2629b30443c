//! Unique-index enforcement.

use orm_core::{Id, Row, Value};
use orm_query::IndexPick;
use orm_schema::Table;
use orm_storage::DocumentStore;

use crate::error::{EngineError, Result};

/// Probes every unique index (compound or the column-scoped shorthand)
/// whose covered columns are all present in `row`, excluding `exclude_id`
/// (the row being updated, so it doesn't conflict with itself).
pub fn enforce_unique(
    store: &dyn DocumentStore,
    table: &Table,
    row: &Row,
    exclude_id: Option<&Id>,
) -> Result<()> {
    for index in table.get_unique_indexes() {
        let values: Vec<Value> = index
            .columns
            .iter()
            .map(|c| row.get(c).cloned().unwrap_or(Value::Null))
            .collect();

        let any_null = values.iter().any(Value::is_null);
        if any_null && !index.nulls_not_distinct {
            continue;
        }

        let pick = IndexPick {
            index_name: index.name.clone(),
            equality_prefix: index.columns.iter().cloned().zip(values.iter().cloned()).collect(),
            multi_probe: None,
            range: None,
            residual: Vec::new(),
            order_desc: false,
            is_full_scan: false,
        };
        let matches = store.scan_index(table, &pick)?;
        let conflict = matches.iter().any(|candidate| {
            let candidate_id = candidate.get("_id").and_then(Value::as_id);
            match (candidate_id, exclude_id) {
                (Some(cid), Some(excl)) => cid != excl,
                _ => true,
            }
        });
        if conflict {
            return Err(EngineError::UniqueViolation {
                table: table.name.clone(),
                index: index.name.clone(),
                values,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use orm_schema::{text, UniqueIndex};
    use orm_storage::memory::MemoryStore;
    use std::collections::BTreeMap;

    fn table_with_code_unique(nulls_not_distinct: bool) -> Table {
        let mut idx = UniqueIndex::new("by_code", vec!["code".into()]);
        if nulls_not_distinct {
            idx = idx.nulls_not_distinct();
        }
        Table::new("unique_nulls").column(text("code")).unique_index(idx)
    }

    fn row_with_code(code: Option<&str>) -> Row {
        let mut row = BTreeMap::new();
        row.insert(
            "code".to_string(),
            code.map(|c| Value::Str(c.to_string())).unwrap_or(Value::Null),
        );
        row
    }

    #[test]
    fn nulls_distinct_by_default_two_nulls_coexist() {
        let table = table_with_code_unique(false);
        let store = MemoryStore::new();
        store.insert("unique_nulls", row_with_code(None)).unwrap();
        enforce_unique(&store, &table, &row_with_code(None), None).unwrap();
    }

    #[test]
    fn nulls_not_distinct_two_nulls_collide() {
        let table = table_with_code_unique(true);
        let store = MemoryStore::new();
        store.insert("unique_nulls", row_with_code(None)).unwrap();
        let err = enforce_unique(&store, &table, &row_with_code(None), None).unwrap_err();
        assert!(matches!(err, EngineError::UniqueViolation { .. }));
    }

    #[test]
    fn duplicate_non_null_value_conflicts_regardless_of_nulls_not_distinct() {
        let table = table_with_code_unique(false);
        let store = MemoryStore::new();
        store.insert("unique_nulls", row_with_code(Some("a"))).unwrap();
        let err = enforce_unique(&store, &table, &row_with_code(Some("a")), None).unwrap_err();
        assert!(matches!(err, EngineError::UniqueViolation { .. }));
    }

    #[test]
    fn excluding_own_id_does_not_conflict_on_update() {
        let table = table_with_code_unique(false);
        let store = MemoryStore::new();
        let id = store.insert("unique_nulls", row_with_code(Some("a"))).unwrap();
        enforce_unique(&store, &table, &row_with_code(Some("a")), Some(&id)).unwrap();
    }
}
