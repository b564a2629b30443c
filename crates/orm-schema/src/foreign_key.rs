//! Table-level foreign-key declarations.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForeignAction {
    Cascade,
    Restrict,
    SetNull,
    SetDefault,
    NoAction,
}

impl ForeignAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ForeignAction::Cascade => "cascade",
            ForeignAction::Restrict => "restrict",
            ForeignAction::SetNull => "set null",
            ForeignAction::SetDefault => "set default",
            ForeignAction::NoAction => "no action",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    pub source_table: String,
    pub source_columns: Vec<String>,
    pub target_table: String,
    pub target_columns: Vec<String>,
    pub on_delete: ForeignAction,
    pub on_update: ForeignAction,
}

impl ForeignKey {
    pub fn new(
        source_table: impl Into<String>,
        source_columns: Vec<String>,
        target_table: impl Into<String>,
        target_columns: Vec<String>,
    ) -> Self {
        Self {
            source_table: source_table.into(),
            source_columns,
            target_table: target_table.into(),
            target_columns,
            on_delete: ForeignAction::NoAction,
            on_update: ForeignAction::NoAction,
        }
    }

    pub fn on_delete(mut self, action: ForeignAction) -> Self {
        self.on_delete = action;
        self
    }

    pub fn on_update(mut self, action: ForeignAction) -> Self {
        self.on_update = action;
        self
    }

    /// Whether this FK targets the host-managed `_id` column — the common
    /// case, checked by a direct `get` rather than an index probe.
    pub fn targets_id(&self) -> bool {
        self.target_columns.len() == 1 && self.target_columns[0] == "_id"
    }
}
