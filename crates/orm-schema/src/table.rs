//! Table descriptors.

use crate::column::Column;
use crate::constraint::CheckConstraint;
use crate::foreign_key::ForeignKey;
use crate::index::{Index, SearchIndex, UniqueIndex, BY_CREATION_TIME_INDEX, BY_ID_INDEX};
use crate::rls::RlsPolicy;

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    columns: Vec<Column>,
    indexes: Vec<Index>,
    unique_indexes: Vec<UniqueIndex>,
    checks: Vec<CheckConstraint>,
    foreign_keys: Vec<ForeignKey>,
    search_indexes: Vec<SearchIndex>,
    rls_enabled: bool,
    rls_policies: Vec<RlsPolicy>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
            unique_indexes: Vec::new(),
            checks: Vec::new(),
            foreign_keys: Vec::new(),
            search_indexes: Vec::new(),
            rls_enabled: false,
            rls_policies: Vec::new(),
        }
    }

    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn unique_index(mut self, index: UniqueIndex) -> Self {
        self.unique_indexes.push(index);
        self
    }

    pub fn check(mut self, check: CheckConstraint) -> Self {
        self.checks.push(check);
        self
    }

    pub fn foreign_key(mut self, fk: ForeignKey) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    pub fn search_index(mut self, index: SearchIndex) -> Self {
        self.search_indexes.push(index);
        self
    }

    pub fn with_rls(mut self, policies: Vec<RlsPolicy>) -> Self {
        self.rls_enabled = true;
        self.rls_policies = policies;
        self
    }

    /// Turns every column-scoped `unique`/`references` shorthand into a
    /// table-level `UniqueIndex`/`ForeignKey`, so the rest of the engine
    /// (which only ever walks `get_unique_indexes`/`get_foreign_keys`)
    /// sees them without needing to know about column config at all.
    /// Called once by `Schema::build` before validation.
    pub(crate) fn synthesize_column_constraints(mut self) -> Self {
        for column in self.columns.clone() {
            if column.config.unique {
                self.unique_indexes
                    .push(UniqueIndex::new(format!("by_{}", column.name), vec![column.name.clone()]));
            }
            if let Some(reference) = &column.config.references {
                self.foreign_keys.push(
                    ForeignKey::new(
                        self.name.clone(),
                        vec![column.name.clone()],
                        reference.target_table.clone(),
                        vec![reference.target_column.clone()],
                    )
                    .on_delete(reference.on_delete)
                    .on_update(reference.on_update),
                );
            }
        }
        self
    }

    // -- Accessors -----------------------------------------------------------

    pub fn get_columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn get_indexes(&self) -> &[Index] {
        &self.indexes
    }

    pub fn get_unique_indexes(&self) -> &[UniqueIndex] {
        &self.unique_indexes
    }

    pub fn get_checks(&self) -> &[CheckConstraint] {
        &self.checks
    }

    pub fn get_foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    pub fn get_search_indexes(&self) -> &[SearchIndex] {
        &self.search_indexes
    }

    pub fn get_rls_policies(&self) -> &[RlsPolicy] {
        &self.rls_policies
    }

    pub fn is_rls_enabled(&self) -> bool {
        self.rls_enabled
    }

    /// Whether `column` is covered by a declared index prefix starting at
    /// that column, including the two implicit indexes every table has.
    pub fn has_index_on(&self, column: &str) -> bool {
        if column == "_id" || column == "_creationTime" {
            return true;
        }
        self.indexes.iter().any(|idx| idx.columns.first().map(String::as_str) == Some(column))
            || self
                .unique_indexes
                .iter()
                .any(|idx| idx.columns.first().map(String::as_str) == Some(column))
    }

    /// All index-like names this table exposes, including the implicit
    /// `by_id`/`by_creation_time` pair.
    pub fn index_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = vec![BY_ID_INDEX, BY_CREATION_TIME_INDEX];
        names.extend(self.indexes.iter().map(|i| i.name.as_str()));
        names.extend(self.unique_indexes.iter().map(|i| i.name.as_str()));
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::text;

    #[test]
    fn has_index_on_recognizes_implicit_columns() {
        let table = Table::new("users");
        assert!(table.has_index_on("_id"));
        assert!(table.has_index_on("_creationTime"));
        assert!(!table.has_index_on("_creation_time"));
    }

    #[test]
    fn has_index_on_covers_declared_index_leading_column() {
        let table = Table::new("users").column(text("email")).index(Index::new("by_email", vec!["email".into()]));
        assert!(table.has_index_on("email"));
        assert!(!table.has_index_on("nickname"));
    }
}
