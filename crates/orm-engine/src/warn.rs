//! The pluggable relaxed-mode warning sink. The source's relaxed-mode
//! warning channel emits via `console.warn`; this is the pluggable log
//! sink a port exposes instead.

/// Receives a human-readable warning whenever relaxed mode allows
/// something strict mode would have rejected (a full scan, an
/// unbudgeted multi-probe pagination, ...). The default implementation
/// logs through `tracing`, matching how the rest of the workspace reports
/// diagnostics; a caller may substitute its own sink (a metrics counter,
/// a UI toast) without touching the planner/engine.
pub trait WarnSink: Send + Sync {
    fn warn(&self, message: &str);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingWarnSink;

impl WarnSink for TracingWarnSink {
    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
    }
}
