//! Schema-wide options recognized on `defineSchema`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationExecutionMode {
    Sync,
    Async,
}

impl Default for MutationExecutionMode {
    fn default() -> Self {
        MutationExecutionMode::Sync
    }
}

/// The `defaults.*` family of tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub default_limit: u32,
    pub mutation_batch_size: u32,
    pub mutation_leaf_batch_size: u32,
    pub mutation_max_rows: u32,
    pub mutation_max_bytes_per_batch: u64,
    pub mutation_schedule_call_cap: u32,
    pub mutation_execution_mode: MutationExecutionMode,
    pub mutation_async_delay_ms: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            default_limit: 1000,
            mutation_batch_size: 64,
            mutation_leaf_batch_size: 32,
            mutation_max_rows: 4096,
            mutation_max_bytes_per_batch: 1_000_000,
            mutation_schedule_call_cap: 64,
            mutation_execution_mode: MutationExecutionMode::Sync,
            mutation_async_delay_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaOptions {
    /// Strict forbids read/write full-scans unless `allowFullScan: true`;
    /// relaxed warns but allows.
    pub strict: bool,
    pub defaults: Defaults,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            strict: true,
            defaults: Defaults::default(),
        }
    }
}

/// Byte-safety multiplier applied to the measured JSON size of an async
/// cascade batch before comparing it against `mutationMaxBytesPerBatch`.
/// Empirically chosen rather than derived; see `DESIGN.md` for the
/// rationale.
pub const BYTE_SAFETY_MULTIPLIER: u64 = 2;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let d = Defaults::default();
        assert_eq!(d.default_limit, 1000);
        assert_eq!(d.mutation_batch_size, 64);
        assert_eq!(d.mutation_leaf_batch_size, 32);
        assert_eq!(d.mutation_max_rows, 4096);
        assert_eq!(d.mutation_max_bytes_per_batch, 1_000_000);
        assert_eq!(d.mutation_schedule_call_cap, 64);
        assert_eq!(d.mutation_execution_mode, MutationExecutionMode::Sync);
        assert_eq!(d.mutation_async_delay_ms, 0);
    }

    #[test]
    fn schema_options_default_is_strict() {
        assert!(SchemaOptions::default().strict);
    }
}
