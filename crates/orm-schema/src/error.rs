//! Errors raised building a frozen [`crate::Schema`] from table
//! descriptors. Fatal at construction time; nothing here is recoverable
//! once a process is running.

#[derive(Debug, thiserror::Error)]
pub enum SchemaBuildError {
    #[error("table '{0}' is declared more than once")]
    DuplicateTable(String),

    #[error("table '{table}' declares column '{column}' more than once")]
    DuplicateColumn { table: String, column: String },

    #[error("table '{table}' index '{index}' references undefined column '{column}'")]
    UnknownIndexColumn {
        table: String,
        index: String,
        column: String,
    },

    #[error("table '{table}' declares index name '{index}' more than once")]
    DuplicateIndexName { table: String, index: String },

    #[error("table '{table}' foreign key references undefined table '{target_table}'")]
    ForeignKeyUnknownTargetTable { table: String, target_table: String },

    #[error(
        "table '{table}' foreign key has {source_count} source column(s) but {target_count} target column(s)"
    )]
    ForeignKeyColumnCountMismatch {
        table: String,
        source_count: usize,
        target_count: usize,
    },

    #[error("table '{table}' foreign key references undefined column '{column}' on table '{target_table}'")]
    ForeignKeyUnknownTargetColumn {
        table: String,
        target_table: String,
        column: String,
    },
}
