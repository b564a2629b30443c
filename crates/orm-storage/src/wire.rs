//! The scheduler argument wire format. These are the
//! payload shapes `orm-engine`'s cascade executor serializes into
//! `Scheduler::run_after` and deserializes back out inside
//! `ScheduledFunctions::dispatch`.

use orm_core::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkType {
    CascadeDelete,
    CascadeUpdate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForeignActionWire {
    Cascade,
    #[serde(rename = "set null")]
    SetNull,
    #[serde(rename = "set default")]
    SetDefault,
    Restrict,
    #[serde(rename = "no action")]
    NoAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteMode {
    Hard,
    Soft,
    Scheduled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledMutationArgs {
    pub work_type: WorkType,
    pub mode: String,
    pub operation: String,
    pub table: String,
    pub foreign_index_name: String,
    pub foreign_source_columns: Vec<String>,
    pub target_values: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_values: Option<Vec<Value>>,
    pub foreign_action: ForeignActionWire,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_mode: Option<DeleteMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cascade_mode: Option<DeleteMode>,
    pub cursor: Option<String>,
    pub batch_size: u32,
    pub max_bytes_per_batch: u64,
    pub delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledDeleteArgs {
    pub table: String,
    pub id: orm_core::Id,
    pub cascade_mode: DeleteMode,
    pub deletion_time: i64,
}

pub const SCHEDULED_MUTATION_BATCH: &str = "scheduledMutationBatch";
pub const SCHEDULED_DELETE: &str = "scheduledDelete";
