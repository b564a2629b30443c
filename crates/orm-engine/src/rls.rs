//! Row-level security enforcement.

use orm_core::Row;
use orm_filter::expr::LogicalOp;
use orm_filter::{evaluate, is_null, Expr};
use orm_schema::{RlsOperation, RlsPolicy, RlsPolicyKind, Schema, Table};

use crate::context::RlsContext;
use crate::error::{EngineError, Result};

/// Every policy applicable to `table`: its own declared policies, plus any
/// policy declared on another table whose `.link(table)` names this one
/// (a linked policy "applies to the target", per the RLS `link` contract).
fn applicable<'a>(
    schema: &'a Schema,
    table: &'a Table,
    op: RlsOperation,
    ctx: &RlsContext,
) -> impl Iterator<Item = &'a RlsPolicy> {
    let linked = schema.tables().filter(move |t| t.name != table.name).flat_map(|t| t.get_rls_policies());
    table
        .get_rls_policies()
        .iter()
        .chain(linked.filter(move |p| p.link_table.as_deref() == Some(table.name.as_str())))
        .filter(move |p| p.for_operation.applies_to(op) && p.applies_to_roles(&ctx.roles))
}

/// Whether `table` is RLS-enabled: either declared `withRLS` directly, or
/// the target of a `link`ed policy declared on another table.
fn rls_enabled_for(schema: &Schema, table: &Table) -> bool {
    table.is_rls_enabled()
        || schema
            .tables()
            .filter(|t| t.name != table.name)
            .flat_map(|t| t.get_rls_policies())
            .any(|p| p.link_table.as_deref() == Some(table.name.as_str()))
}

fn split_by_kind<'a>(policies: impl Iterator<Item = &'a RlsPolicy>) -> (Vec<&'a RlsPolicy>, Vec<&'a RlsPolicy>) {
    let mut permissive = Vec::new();
    let mut restrictive = Vec::new();
    for p in policies {
        match p.kind {
            RlsPolicyKind::Permissive => permissive.push(p),
            RlsPolicyKind::Restrictive => restrictive.push(p),
        }
    }
    (permissive, restrictive)
}

/// A filter expression that can never match any real row — the RLS
/// default-deny baseline for reads, applied when RLS is enabled and no
/// matching policy exists.
fn deny_all() -> Expr {
    is_null("_id")
}

/// Folds every applicable `for:select`/`for:all` policy's `using` filter
/// into the extra `and` clause every read on an RLS-enabled table
/// carries. Returns `None` when RLS does not apply (disabled, or
/// `ctx.skip_rules`).
pub fn select_filter(schema: &Schema, table: &Table, ctx: &RlsContext) -> Option<Expr> {
    if !rls_enabled_for(schema, table) || ctx.skip_rules {
        return None;
    }
    let (permissive, restrictive) = split_by_kind(applicable(schema, table, RlsOperation::Select, ctx));

    let permissive_clause = if permissive.is_empty() {
        deny_all()
    } else {
        let clauses: Vec<Expr> = permissive
            .iter()
            .map(|p| p.using.clone().unwrap_or_else(|| deny_all()))
            .collect();
        Expr::Logical {
            op: LogicalOp::Or,
            operands: clauses,
        }
    };

    let mut combined = permissive_clause;
    for policy in restrictive {
        if let Some(using) = &policy.using {
            combined = Expr::Logical {
                op: LogicalOp::And,
                operands: vec![combined, using.clone()],
            };
        }
    }
    Some(combined)
}

fn evaluate_gate(policies: &[&RlsPolicy], row: &Row, expr_of: impl Fn(&RlsPolicy) -> &Option<Expr>) -> bool {
    policies.iter().any(|p| match expr_of(p) {
        Some(expr) => evaluate(expr, row),
        None => true,
    })
}

fn evaluate_all(policies: &[&RlsPolicy], row: &Row, expr_of: impl Fn(&RlsPolicy) -> &Option<Expr>) -> bool {
    policies.iter().all(|p| match expr_of(p) {
        Some(expr) => evaluate(expr, row),
        None => true,
    })
}

/// Validates a candidate row against `for:insert`/`for:all` policies'
/// `withCheck` expressions.
pub fn check_insert(schema: &Schema, table: &Table, ctx: &RlsContext, candidate: &Row) -> Result<()> {
    if !rls_enabled_for(schema, table) || ctx.skip_rules {
        return Ok(());
    }
    let (permissive, restrictive) = split_by_kind(applicable(schema, table, RlsOperation::Insert, ctx));
    if permissive.is_empty() {
        return Err(EngineError::RlsDenied {
            table: table.name.clone(),
            operation: "insert".to_string(),
        });
    }
    if !evaluate_gate(&permissive, candidate, |p| &p.with_check) {
        return Err(EngineError::RlsCheckFailed {
            table: table.name.clone(),
            operation: "insert".to_string(),
        });
    }
    if !evaluate_all(&restrictive, candidate, |p| &p.with_check) {
        return Err(EngineError::RlsCheckFailed {
            table: table.name.clone(),
            operation: "insert".to_string(),
        });
    }
    Ok(())
}

/// Validates the post-update row against `for:update`/`for:all`
/// policies' `withCheck` expressions. `using`-based candidate filtering
/// happens earlier, via
/// [`select_filter`] applied with [`RlsOperation::Update`] semantics
/// folded in by the caller.
pub fn check_update(schema: &Schema, table: &Table, ctx: &RlsContext, post_image: &Row) -> Result<()> {
    if !rls_enabled_for(schema, table) || ctx.skip_rules {
        return Ok(());
    }
    let (permissive, restrictive) = split_by_kind(applicable(schema, table, RlsOperation::Update, ctx));
    if permissive.is_empty() {
        return Err(EngineError::RlsDenied {
            table: table.name.clone(),
            operation: "update".to_string(),
        });
    }
    if !evaluate_gate(&permissive, post_image, |p| &p.with_check) {
        return Err(EngineError::RlsCheckFailed {
            table: table.name.clone(),
            operation: "update".to_string(),
        });
    }
    if !evaluate_all(&restrictive, post_image, |p| &p.with_check) {
        return Err(EngineError::RlsCheckFailed {
            table: table.name.clone(),
            operation: "update".to_string(),
        });
    }
    Ok(())
}

/// `for:update`/`for:delete` candidate filtering uses the same `using`
/// fold as reads.
pub fn candidate_filter(schema: &Schema, table: &Table, ctx: &RlsContext, op: RlsOperation) -> Option<Expr> {
    if !rls_enabled_for(schema, table) || ctx.skip_rules {
        return None;
    }
    let (permissive, restrictive) = split_by_kind(applicable(schema, table, op, ctx));
    let permissive_clause = if permissive.is_empty() {
        deny_all()
    } else {
        Expr::Logical {
            op: LogicalOp::Or,
            operands: permissive.iter().map(|p| p.using.clone().unwrap_or_else(deny_all)).collect(),
        }
    };
    let mut combined = permissive_clause;
    for policy in restrictive {
        if let Some(using) = &policy.using {
            combined = Expr::Logical {
                op: LogicalOp::And,
                operands: vec![combined, using.clone()],
            };
        }
    }
    Some(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use orm_core::Value;
    use orm_filter::eq;
    use orm_schema::{text, RlsPolicy, SchemaOptions, Table};

    fn table_with_select_policy() -> Table {
        Table::new("posts")
            .column(text("owner"))
            .with_rls(vec![RlsPolicy::new("owner_only", RlsOperation::Select)
                .using(eq("owner", Value::Str("alice".into())))])
    }

    fn schema_with(table: Table) -> Schema {
        Schema::build(vec![table], SchemaOptions::default()).unwrap()
    }

    #[test]
    fn select_filter_none_when_disabled() {
        let table = Table::new("public_posts").column(text("owner"));
        let schema = schema_with(table);
        let ctx = RlsContext::default();
        assert!(select_filter(&schema, schema.table("public_posts").unwrap(), &ctx).is_none());
    }

    #[test]
    fn select_filter_none_when_skip_rules() {
        let schema = schema_with(table_with_select_policy());
        let ctx = RlsContext::skipping_rules();
        assert!(select_filter(&schema, schema.table("posts").unwrap(), &ctx).is_none());
    }

    #[test]
    fn select_filter_default_denies_with_no_policy_for_op() {
        let table = Table::new("secret").column(text("owner")).with_rls(vec![RlsPolicy::new(
            "only_insert",
            RlsOperation::Insert,
        )]);
        let schema = schema_with(table);
        let ctx = RlsContext::default();
        let expr = select_filter(&schema, schema.table("secret").unwrap(), &ctx).unwrap();
        let mut row = Row::new();
        row.insert("owner".to_string(), Value::Str("alice".into()));
        row.insert("_id".to_string(), Value::Str("p1".into()));
        assert!(!evaluate(&expr, &row));
    }

    #[test]
    fn insert_denied_with_no_applicable_policy() {
        let table = Table::new("secret").column(text("owner")).with_rls(vec![]);
        let schema = schema_with(table);
        let ctx = RlsContext::default();
        let row = Row::new();
        let err = check_insert(&schema, schema.table("secret").unwrap(), &ctx, &row).unwrap_err();
        assert!(matches!(err, EngineError::RlsDenied { .. }));
    }

    #[test]
    fn linked_policy_on_another_table_applies_to_the_target() {
        // `comments` has no select policy of its own; `posts` declares one
        // `.link("comments")`-ed onto it, so reads against `comments` must
        // still fold in `posts`'s `using` clause.
        let comments = Table::new("comments").column(text("owner"));
        let posts = Table::new("posts").column(text("owner")).with_rls(vec![RlsPolicy::new(
            "owner_only",
            RlsOperation::Select,
        )
        .using(eq("owner", Value::Str("alice".into())))
        .link("comments")]);
        let schema = Schema::build(vec![comments, posts], SchemaOptions::default()).unwrap();
        let ctx = RlsContext::default();
        let expr = select_filter(&schema, schema.table("comments").unwrap(), &ctx).unwrap();

        let mut matching = Row::new();
        matching.insert("owner".to_string(), Value::Str("alice".into()));
        assert!(evaluate(&expr, &matching));

        let mut other = Row::new();
        other.insert("owner".to_string(), Value::Str("bob".into()));
        assert!(!evaluate(&expr, &other));
    }
}
