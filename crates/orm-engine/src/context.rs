//! Per-root-mutation state: schedule-call accounting.
//!
//! A [`MutationContext`] is constructed once at the entry point of a root
//! `insert`/`update`/`delete`/`upsert` call and threaded by `&mut`
//! reference through the cascade walk. It is never global: two concurrent
//! root mutations each get their own instance.

use std::collections::HashSet;

use orm_core::Id;

/// The caller's security context, supplied per call. `skip_rules`
/// bypasses RLS enforcement for trusted internal work — the cascade
/// executor sets it on every continuation it issues, since RLS on the
/// root row was already enforced before fan-out began.
#[derive(Debug, Clone, Default)]
pub struct RlsContext {
    pub roles: Vec<String>,
    pub skip_rules: bool,
}

impl RlsContext {
    pub fn new(roles: Vec<String>) -> Self {
        Self {
            roles,
            skip_rules: false,
        }
    }

    pub fn skipping_rules() -> Self {
        Self {
            roles: Vec::new(),
            skip_rules: true,
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

fn visited_key(table: &str, id: &Id) -> String {
    format!("{table}:{id}")
}

/// Tracks everything that must not reset between the suspension points of
/// one root mutation: the cascade visited-set, the remaining
/// `mutationScheduleCallCap` budget, and the RLS context the mutation
/// started with.
pub struct MutationContext {
    visited: HashSet<String>,
    schedule_calls_remaining: u32,
    rows_touched: u32,
    pub rls: RlsContext,
}

impl MutationContext {
    pub fn new(rls: RlsContext, schedule_call_cap: u32) -> Self {
        Self {
            visited: HashSet::new(),
            schedule_calls_remaining: schedule_call_cap,
            rows_touched: 0,
            rls,
        }
    }

    /// Accounts for `n` more rows touched by the fan-out, returning
    /// `false` if doing so would exceed `limit` (the bounded-collection
    /// cap, `mutationMaxRows`).
    pub fn try_touch_rows(&mut self, n: u32, limit: u32) -> bool {
        if self.rows_touched + n > limit {
            return false;
        }
        self.rows_touched += n;
        true
    }

    /// Marks `(table, id)` visited, returning `true` if it was not already
    /// present (i.e. the caller should proceed to visit it).
    pub fn visit(&mut self, table: &str, id: &Id) -> bool {
        self.visited.insert(visited_key(table, id))
    }

    pub fn has_visited(&self, table: &str, id: &Id) -> bool {
        self.visited.contains(&visited_key(table, id))
    }

    /// Decrements the schedule-call budget, returning `false` if it was
    /// already exhausted.
    pub fn try_consume_schedule_call(&mut self) -> bool {
        if self.schedule_calls_remaining == 0 {
            return false;
        }
        self.schedule_calls_remaining -= 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visit_is_once_only() {
        let mut ctx = MutationContext::new(RlsContext::default(), 4);
        let id = Id::new("users", "u1");
        assert!(ctx.visit("users", &id));
        assert!(!ctx.visit("users", &id));
    }

    #[test]
    fn schedule_cap_exhausts() {
        let mut ctx = MutationContext::new(RlsContext::default(), 1);
        assert!(ctx.try_consume_schedule_call());
        assert!(!ctx.try_consume_schedule_call());
    }
}
