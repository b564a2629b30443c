//! The facade's error type: a thin `thiserror` union over every crate
//! below it, so a caller driving `orm::Db` never has to match on more
//! than one error enum.

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error(transparent)]
    Engine(#[from] orm_engine::EngineError),

    #[error(transparent)]
    Planner(#[from] orm_query::PlannerError),

    #[error(transparent)]
    Storage(#[from] orm_storage::StorageError),

    #[error(transparent)]
    Schema(#[from] orm_schema::SchemaBuildError),

    #[error(transparent)]
    Relations(#[from] orm_relations::RelationsError),

    #[error(transparent)]
    Config(#[from] orm_config::ConfigError),

    #[error("table '{0}' is not declared in the schema")]
    UnknownTable(String),

    #[error("no unique index on '{table}' covers conflict columns {columns:?}")]
    NoConflictIndex { table: String, columns: Vec<String> },

    #[error("query returned more than one row for unique()")]
    NotUnique,
}

pub type Result<T> = std::result::Result<T, DbError>;
