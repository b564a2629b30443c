//! Default substitution and `$onUpdateFn` hook application.

use orm_core::{Patch, PatchOp, Row, Value};
use orm_schema::Table;

use crate::error::{EngineError, Result};

/// Fills in defaults for every column the caller did not provide, in the
/// documented order `defaultFn() -> default -> onUpdateFn()`. Validates
/// nullability and rejects unknown columns. `row` is the caller-supplied
/// value set (no `_id`/`_creationTime`, those are host-managed).
pub fn fill_insert_defaults(table: &Table, row: &Row) -> Result<Row> {
    for key in row.keys() {
        if key.starts_with('_') {
            continue;
        }
        if table.get_column(key).is_none() {
            return Err(EngineError::UnknownColumn {
                table: table.name.clone(),
                column: key.clone(),
            });
        }
    }

    let mut out = Row::new();
    for column in table.get_columns() {
        match row.get(&column.name) {
            Some(value) => {
                out.insert(column.name.clone(), value.clone());
            }
            None => {
                let value = if let Some(hook) = &column.config.default_fn {
                    hook.call()
                } else if let Some(default) = &column.config.default {
                    default.clone()
                } else if let Some(hook) = &column.config.on_update_fn {
                    hook.call()
                } else {
                    Value::Null
                };
                if column.config.not_null && value.is_null() {
                    return Err(EngineError::NotNullViolation {
                        table: table.name.clone(),
                        column: column.name.clone(),
                    });
                }
                out.insert(column.name.clone(), value);
            }
        }
    }
    Ok(out)
}

/// Normalizes a caller-supplied update patch: drops `undefined` entries
/// (never present in a [`Patch`] to
/// begin with — the caller only puts keys it means to touch), rejects the
/// unset token on a `notNull` column, then merges in `onUpdateFn()` for
/// every column with such a hook that the caller did not already touch.
/// Returns `None` if the resulting patch is empty (a no-op update).
pub fn normalize_update_patch(table: &Table, patch: &Patch) -> Result<Option<Patch>> {
    for (column, op) in patch {
        let Some(col) = table.get_column(column) else {
            return Err(EngineError::UnknownColumn {
                table: table.name.clone(),
                column: column.clone(),
            });
        };
        if matches!(op, PatchOp::Unset) && col.config.not_null {
            return Err(EngineError::UnsetOnNotNull {
                table: table.name.clone(),
                column: column.clone(),
            });
        }
    }

    if patch.is_empty() {
        return Ok(None);
    }

    let mut merged = patch.clone();
    for column in table.get_columns() {
        if merged.contains_key(&column.name) {
            continue;
        }
        if let Some(hook) = &column.config.on_update_fn {
            merged.insert(column.name.clone(), PatchOp::Set(hook.call()));
        }
    }
    Ok(Some(merged))
}

#[cfg(test)]
mod tests {
    use super::*;
    use orm_schema::{text, ColumnConfig, Table};

    fn users_table() -> Table {
        Table::new("users")
            .column(text("name").with_config(ColumnConfig::default().not_null()))
            .column(text("role").with_config(ColumnConfig::default().default(Value::Str("member".into()))))
    }

    #[test]
    fn fills_default_when_missing() {
        let table = users_table();
        let mut row = Row::new();
        row.insert("name".to_string(), Value::Str("Ada".into()));
        let out = fill_insert_defaults(&table, &row).unwrap();
        assert_eq!(out.get("role"), Some(&Value::Str("member".into())));
    }

    #[test]
    fn explicit_null_is_not_overridden() {
        let table = users_table();
        let mut row = Row::new();
        row.insert("name".to_string(), Value::Str("Ada".into()));
        row.insert("role".to_string(), Value::Null);
        let out = fill_insert_defaults(&table, &row).unwrap();
        assert_eq!(out.get("role"), Some(&Value::Null));
    }

    #[test]
    fn missing_not_null_column_rejected() {
        let table = users_table();
        let row = Row::new();
        let err = fill_insert_defaults(&table, &row).unwrap_err();
        assert!(matches!(err, EngineError::NotNullViolation { .. }));
    }

    #[test]
    fn empty_patch_normalizes_to_none() {
        let table = users_table();
        let patch = Patch::new();
        assert!(normalize_update_patch(&table, &patch).unwrap().is_none());
    }

    #[test]
    fn unset_on_not_null_column_rejected() {
        let table = users_table();
        let mut patch = Patch::new();
        patch.insert("name".to_string(), PatchOp::Unset);
        let err = normalize_update_patch(&table, &patch).unwrap_err();
        assert!(matches!(err, EngineError::UnsetOnNotNull { .. }));
    }
}
