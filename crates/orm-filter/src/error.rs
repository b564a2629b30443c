//! Errors raised while decoding a filter tree off the wire.

#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("malformed filter payload: {0}")]
    Malformed(#[from] serde_json::Error),
}
