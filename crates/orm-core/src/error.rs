//! Shared error primitives.
//!
//! Each higher crate defines its own `thiserror` enum for its own concerns
//! (schema build errors, planner errors, engine errors, ...). This one is
//! for failures that can occur while working with bare [`crate::Value`]s,
//! before any schema is involved.

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("value has unexpected kind: expected {expected}, got {actual}")]
    UnexpectedKind {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("id '{0}' is not well-formed")]
    MalformedId(String),
}
