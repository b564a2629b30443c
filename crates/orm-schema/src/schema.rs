//! Schema construction: given a mapping from table name to table
//! descriptor, produces a frozen schema object.

use std::collections::BTreeMap;

use crate::error::SchemaBuildError;
use crate::options::SchemaOptions;
use crate::table::Table;

/// A frozen, validated schema. Constructed once per process via
/// [`Schema::build`]; immutable thereafter.
#[derive(Debug, Clone)]
pub struct Schema {
    tables: BTreeMap<String, Table>,
    options: SchemaOptions,
}

impl Schema {
    pub fn build(tables: Vec<Table>, options: SchemaOptions) -> Result<Schema, SchemaBuildError> {
        let mut by_name = BTreeMap::new();
        for table in tables {
            if by_name.contains_key(&table.name) {
                return Err(SchemaBuildError::DuplicateTable(table.name.clone()));
            }
            let table = table.synthesize_column_constraints();
            validate_table(&table)?;
            by_name.insert(table.name.clone(), table);
        }
        validate_foreign_keys(&by_name)?;
        Ok(Schema {
            tables: by_name,
            options,
        })
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn options(&self) -> &SchemaOptions {
        &self.options
    }
}

fn validate_table(table: &Table) -> Result<(), SchemaBuildError> {
    let mut seen_columns = std::collections::HashSet::new();
    for column in table.get_columns() {
        if !seen_columns.insert(column.name.as_str()) {
            return Err(SchemaBuildError::DuplicateColumn {
                table: table.name.clone(),
                column: column.name.clone(),
            });
        }
    }

    let mut seen_index_names = std::collections::HashSet::new();
    for index in table.get_indexes() {
        if !seen_index_names.insert(index.name.as_str()) {
            return Err(SchemaBuildError::DuplicateIndexName {
                table: table.name.clone(),
                index: index.name.clone(),
            });
        }
        for column in &index.columns {
            if !column_exists(table, column) {
                return Err(SchemaBuildError::UnknownIndexColumn {
                    table: table.name.clone(),
                    index: index.name.clone(),
                    column: column.clone(),
                });
            }
        }
    }
    for index in table.get_unique_indexes() {
        if !seen_index_names.insert(index.name.as_str()) {
            return Err(SchemaBuildError::DuplicateIndexName {
                table: table.name.clone(),
                index: index.name.clone(),
            });
        }
        for column in &index.columns {
            if !column_exists(table, column) {
                return Err(SchemaBuildError::UnknownIndexColumn {
                    table: table.name.clone(),
                    index: index.name.clone(),
                    column: column.clone(),
                });
            }
        }
    }

    for fk in table.get_foreign_keys() {
        if fk.source_columns.len() != fk.target_columns.len() {
            return Err(SchemaBuildError::ForeignKeyColumnCountMismatch {
                table: table.name.clone(),
                source_count: fk.source_columns.len(),
                target_count: fk.target_columns.len(),
            });
        }
        for column in &fk.source_columns {
            if !column_exists(table, column) {
                return Err(SchemaBuildError::UnknownIndexColumn {
                    table: table.name.clone(),
                    index: "<foreign key>".to_string(),
                    column: column.clone(),
                });
            }
        }
    }

    Ok(())
}

fn column_exists(table: &Table, column: &str) -> bool {
    column == "_id" || column == "_creationTime" || table.get_column(column).is_some()
}

fn validate_foreign_keys(tables: &BTreeMap<String, Table>) -> Result<(), SchemaBuildError> {
    for table in tables.values() {
        for fk in table.get_foreign_keys() {
            let target = tables.get(&fk.target_table).ok_or_else(|| {
                SchemaBuildError::ForeignKeyUnknownTargetTable {
                    table: table.name.clone(),
                    target_table: fk.target_table.clone(),
                }
            })?;
            for column in &fk.target_columns {
                if column != "_id" && target.get_column(column).is_none() {
                    return Err(SchemaBuildError::ForeignKeyUnknownTargetColumn {
                        table: table.name.clone(),
                        target_table: fk.target_table.clone(),
                        column: column.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{integer, text, ColumnConfig};
    use crate::foreign_key::ForeignKey;
    use crate::index::Index;

    #[test]
    fn build_accepts_valid_schema() {
        let users = Table::new("users").column(text("name").with_config(ColumnConfig::default().not_null()));
        let schema = Schema::build(vec![users], SchemaOptions::default()).unwrap();
        assert!(schema.table("users").is_some());
    }

    #[test]
    fn build_rejects_duplicate_table() {
        let a = Table::new("users");
        let b = Table::new("users");
        let err = Schema::build(vec![a, b], SchemaOptions::default()).unwrap_err();
        assert!(matches!(err, SchemaBuildError::DuplicateTable(_)));
    }

    #[test]
    fn build_rejects_index_on_unknown_column() {
        let users = Table::new("users").index(Index::new("by_missing", vec!["nope".into()]));
        let err = Schema::build(vec![users], SchemaOptions::default()).unwrap_err();
        assert!(matches!(err, SchemaBuildError::UnknownIndexColumn { .. }));
    }

    #[test]
    fn build_rejects_fk_to_unknown_table() {
        let posts = Table::new("posts")
            .column(integer("author_id"))
            .foreign_key(ForeignKey::new("posts", vec!["author_id".into()], "ghosts", vec!["_id".into()]));
        let err = Schema::build(vec![posts], SchemaOptions::default()).unwrap_err();
        assert!(matches!(err, SchemaBuildError::ForeignKeyUnknownTargetTable { .. }));
    }

    #[test]
    fn column_unique_shorthand_synthesizes_a_unique_index() {
        let users = Table::new("users").column(text("email").with_config(ColumnConfig::default().unique()));
        let schema = Schema::build(vec![users], SchemaOptions::default()).unwrap();
        let table = schema.table("users").unwrap();
        assert!(table
            .get_unique_indexes()
            .iter()
            .any(|idx| idx.columns == vec!["email".to_string()]));
    }

    #[test]
    fn column_references_shorthand_synthesizes_a_foreign_key() {
        let users = Table::new("users");
        let posts = Table::new("posts")
            .column(integer("author_id").with_config(ColumnConfig::default().references("users", "_id")));
        let schema = Schema::build(vec![users, posts], SchemaOptions::default()).unwrap();
        let table = schema.table("posts").unwrap();
        let fk = table
            .get_foreign_keys()
            .iter()
            .find(|fk| fk.source_columns == vec!["author_id".to_string()])
            .unwrap();
        assert_eq!(fk.target_table, "users");
        assert_eq!(fk.target_columns, vec!["_id".to_string()]);
    }
}
