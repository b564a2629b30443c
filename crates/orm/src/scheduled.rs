//! The [`orm_storage::ScheduledFunctions`] implementation a host worker
//! loop (e.g. [`orm_storage::memory::MemoryScheduler::drain`]) dispatches
//! `scheduledMutationBatch`/`scheduledDelete` jobs through.
//! Deserializes the wire args the cascade executor serialized and resumes
//! the cascade walk from its stored cursor.

use orm_engine::{resume_scheduled_delete, resume_scheduled_mutation, CascadeEnv, MutationContext, RlsContext, WarnSink};
use orm_schema::Schema;
use orm_storage::error::{Result, StorageError};
use orm_storage::wire::{ScheduledDeleteArgs, ScheduledMutationArgs, SCHEDULED_DELETE, SCHEDULED_MUTATION_BATCH};
use orm_storage::{DocumentStore, Scheduler, ScheduledFunctions};

pub struct Dispatcher<'a> {
    schema: &'a Schema,
    warn: &'a dyn WarnSink,
}

impl<'a> Dispatcher<'a> {
    pub(crate) fn new(schema: &'a Schema, warn: &'a dyn WarnSink) -> Self {
        Self { schema, warn }
    }

    /// Root mutation RLS already gated the mutation that scheduled this
    /// continuation; resuming it does not re-evaluate policies
    /// (`orm_engine::RlsContext::skipping_rules`'s documented rationale).
    fn ctx(&self) -> MutationContext {
        MutationContext::new(RlsContext::skipping_rules(), self.schema.options().defaults.mutation_schedule_call_cap)
    }
}

impl<'a> ScheduledFunctions for Dispatcher<'a> {
    fn dispatch(
        &self,
        store: &dyn DocumentStore,
        scheduler: &dyn Scheduler,
        function_ref: &str,
        args: serde_json::Value,
    ) -> Result<()> {
        let env = CascadeEnv {
            schema: self.schema,
            store,
            scheduler: Some(scheduler),
            warn: self.warn,
            mode: self.schema.options().defaults.mutation_execution_mode,
        };
        let mut ctx = self.ctx();

        match function_ref {
            SCHEDULED_MUTATION_BATCH => {
                let args: ScheduledMutationArgs = serde_json::from_value(args)?;
                resume_scheduled_mutation(&env, &mut ctx, &args).map_err(|e| StorageError::Internal(e.to_string()))
            }
            SCHEDULED_DELETE => {
                let args: ScheduledDeleteArgs = serde_json::from_value(args)?;
                resume_scheduled_delete(&env, &mut ctx, &args).map_err(|e| StorageError::Internal(e.to_string()))
            }
            other => Err(StorageError::UnknownScheduledFunction(other.to_string())),
        }
    }
}
