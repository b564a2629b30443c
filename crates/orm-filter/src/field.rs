//! Branded field references.

use serde::{Deserialize, Serialize};

/// A branded reference to a column, as produced by a column descriptor.
/// The planner resolves this to the column's owning table and index
/// participation; the filter tree itself only ever carries the name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldReference {
    pub field_name: String,
}

impl FieldReference {
    pub fn new(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
        }
    }
}

impl From<&str> for FieldReference {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for FieldReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.field_name)
    }
}
