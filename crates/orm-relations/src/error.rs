//! Errors raised building the relation edge list. Messages are matched
//! by substring in tests, so wording here is load-bearing.

#[derive(Debug, thiserror::Error)]
pub enum RelationsError {
    #[error("relation '{table}.{name}' references undefined table '{target_table}'")]
    ReferencesUndefinedTable {
        table: String,
        name: String,
        target_table: String,
    },

    #[error("relation name '{name}' collides with a column of table '{table}'")]
    RelationNameCollides { table: String, name: String },

    #[error("relation '{table}.{name}': \"from\" columns must belong to table '{table}'")]
    FromColumnsMustBelong { table: String, name: String },

    #[error("relation '{table}.{name}': \"to\" columns must belong to table '{target_table}'")]
    ToColumnsMustBelong {
        table: String,
        name: String,
        target_table: String,
    },

    #[error("Circular dependency detected among tables: {0}")]
    CircularDependency(String),
}
