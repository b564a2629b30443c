//! Column declarations.

use std::fmt;
use std::sync::Arc;

use orm_core::Value;

use crate::foreign_key::ForeignAction;

/// The data kind of a column. `unknown` is the escape hatch for
/// host-opaque JSON the schema does not constrain further.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Number,
    Boolean,
    /// `id(table)`: a branded reference to another table's `_id`.
    IdOf(String),
    Unknown,
}

/// A value-producing hook (`$defaultFn`/`$onUpdateFn`). Wrapped so
/// [`ColumnConfig`] can derive `Debug`/`Clone` without requiring the same
/// of an arbitrary closure.
#[derive(Clone)]
pub struct ValueHook(pub Arc<dyn Fn() -> Value + Send + Sync>);

impl ValueHook {
    pub fn new(f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self) -> Value {
        (self.0)()
    }
}

impl fmt::Debug for ValueHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ValueHook(..)")
    }
}

impl PartialEq for ValueHook {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// The column-scoped FK shorthand (`.references(table, column)`), distinct
/// from a table-level [`crate::foreign_key::ForeignKey`] declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnReference {
    pub target_table: String,
    pub target_column: String,
    pub on_delete: ForeignAction,
    pub on_update: ForeignAction,
}

/// Per-column configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnConfig {
    pub not_null: bool,
    pub has_default: bool,
    pub default: Option<Value>,
    pub default_fn: Option<ValueHook>,
    pub on_update_fn: Option<ValueHook>,
    pub unique: bool,
    pub references: Option<ColumnReference>,
}

impl ColumnConfig {
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn default(mut self, value: Value) -> Self {
        self.has_default = true;
        self.default = Some(value);
        self
    }

    pub fn default_fn(mut self, hook: ValueHook) -> Self {
        self.has_default = true;
        self.default_fn = Some(hook);
        self
    }

    pub fn on_update_fn(mut self, hook: ValueHook) -> Self {
        self.on_update_fn = Some(hook);
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn references(
        mut self,
        target_table: impl Into<String>,
        target_column: impl Into<String>,
    ) -> Self {
        self.references = Some(ColumnReference {
            target_table: target_table.into(),
            target_column: target_column.into(),
            on_delete: ForeignAction::NoAction,
            on_update: ForeignAction::NoAction,
        });
        self
    }

    pub fn on_delete(mut self, action: ForeignAction) -> Self {
        if let Some(r) = &mut self.references {
            r.on_delete = action;
        }
        self
    }

    pub fn on_update(mut self, action: ForeignAction) -> Self {
        if let Some(r) = &mut self.references {
            r.on_update = action;
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub config: ColumnConfig,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
            config: ColumnConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ColumnConfig) -> Self {
        self.config = config;
        self
    }
}

pub fn text(name: impl Into<String>) -> Column {
    Column::new(name, ColumnKind::Text)
}

pub fn integer(name: impl Into<String>) -> Column {
    Column::new(name, ColumnKind::Integer)
}

pub fn number(name: impl Into<String>) -> Column {
    Column::new(name, ColumnKind::Number)
}

pub fn boolean(name: impl Into<String>) -> Column {
    Column::new(name, ColumnKind::Boolean)
}

pub fn id(name: impl Into<String>, target_table: impl Into<String>) -> Column {
    Column::new(name, ColumnKind::IdOf(target_table.into()))
}

pub fn unknown(name: impl Into<String>) -> Column {
    Column::new(name, ColumnKind::Unknown)
}
