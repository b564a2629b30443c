//! Small helpers shared across the mutation pipelines.

use orm_schema::Table;

/// The name of a declared index (unique or plain) whose leading columns
/// are exactly `columns`, if any — used both for FK existence probes and
/// cascade fan-out probes.
pub fn index_covering(table: &Table, columns: &[String]) -> Option<String> {
    if let Some(idx) = table.get_indexes().iter().find(|idx| idx.columns.starts_with(columns)) {
        return Some(idx.name.clone());
    }
    table
        .get_unique_indexes()
        .iter()
        .find(|idx| idx.columns.starts_with(columns))
        .map(|idx| idx.name.clone())
}

/// Approximate JSON byte size of a row, for the async cascade byte
/// budget: measured JSON bytes times the safety factor.
pub fn approx_json_bytes(row: &orm_core::Row) -> usize {
    serde_json::to_vec(row).map(|b| b.len()).unwrap_or(0)
}
