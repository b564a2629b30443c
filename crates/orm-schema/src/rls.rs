//! Row-level security policies.

use orm_filter::Expr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RlsOperation {
    Select,
    Insert,
    Update,
    Delete,
    All,
}

impl RlsOperation {
    pub fn applies_to(self, op: RlsOperation) -> bool {
        self == RlsOperation::All || self == op
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RlsPolicyKind {
    Permissive,
    Restrictive,
}

impl Default for RlsPolicyKind {
    fn default() -> Self {
        RlsPolicyKind::Permissive
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RlsPolicy {
    pub name: String,
    pub for_operation: RlsOperation,
    pub kind: RlsPolicyKind,
    pub to_role: Option<String>,
    pub using: Option<Expr>,
    pub with_check: Option<Expr>,
    /// A policy `link`ed to another table applies to that table instead of
    /// the one it's declared on.
    pub link_table: Option<String>,
}

impl RlsPolicy {
    pub fn new(name: impl Into<String>, for_operation: RlsOperation) -> Self {
        Self {
            name: name.into(),
            for_operation,
            kind: RlsPolicyKind::Permissive,
            to_role: None,
            using: None,
            with_check: None,
            link_table: None,
        }
    }

    pub fn restrictive(mut self) -> Self {
        self.kind = RlsPolicyKind::Restrictive;
        self
    }

    pub fn to_role(mut self, role: impl Into<String>) -> Self {
        self.to_role = Some(role.into());
        self
    }

    pub fn using(mut self, expr: Expr) -> Self {
        self.using = Some(expr);
        self
    }

    pub fn with_check(mut self, expr: Expr) -> Self {
        self.with_check = Some(expr);
        self
    }

    pub fn link(mut self, table: impl Into<String>) -> Self {
        self.link_table = Some(table.into());
        self
    }

    /// Whether this policy applies given the caller's resolved roles.
    pub fn applies_to_roles(&self, roles: &[String]) -> bool {
        match &self.to_role {
            None => true,
            Some(role) => roles.iter().any(|r| r == role),
        }
    }
}
