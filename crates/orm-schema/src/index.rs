//! Index and unique-index declarations.

#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
}

impl Index {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UniqueIndex {
    pub name: String,
    pub columns: Vec<String>,
    pub nulls_not_distinct: bool,
}

impl UniqueIndex {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            nulls_not_distinct: false,
        }
    }

    pub fn nulls_not_distinct(mut self) -> Self {
        self.nulls_not_distinct = true;
        self
    }
}

/// A single search column plus the columns it may be filtered alongside.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchIndex {
    pub name: String,
    pub search_field: String,
    pub filter_fields: Vec<String>,
}

impl SearchIndex {
    pub fn new(name: impl Into<String>, search_field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            search_field: search_field.into(),
            filter_fields: Vec::new(),
        }
    }

    pub fn filter_fields(mut self, fields: Vec<String>) -> Self {
        self.filter_fields = fields;
        self
    }
}

/// `by_id`: the implicit index over the host-managed primary key.
pub const BY_ID_INDEX: &str = "by_id";
/// `by_creation_time`: the implicit index over the host-managed insertion
/// timestamp, and the default `orderBy` target.
pub const BY_CREATION_TIME_INDEX: &str = "by_creation_time";
