//! Lowering to the host's filter DSL: the `q.and/q.or/
//! q.not/q.eq/q.neq/q.field` composition a document store's query builder
//! exposes. Index-prefix/range extraction (the other half of `toIndexFilter`)
//! needs to know the chosen index's column order, so it lives one layer up
//! in the planner (`orm-query`) and calls [`to_host_filter`] only for the
//! residual portion it cannot express as an index range.

use crate::expr::{BinaryOp, Expr, LogicalOp, Operand, Visitor};
use crate::field::FieldReference;
use orm_core::Value;

/// The host's filter-builder DSL, reified. Operators the host cannot
/// express as an indexed predicate (string/array-set operators, `between`)
/// lower to [`HostFilterExpr::AlwaysTrue`] — the core re-applies them in
/// memory post-fetch via [`crate::evaluate`].
#[derive(Debug, Clone, PartialEq)]
pub enum HostFilterExpr {
    AlwaysTrue,
    Eq(FieldReference, Value),
    Neq(FieldReference, Value),
    And(Vec<HostFilterExpr>),
    Or(Vec<HostFilterExpr>),
    Not(Box<HostFilterExpr>),
}

pub fn to_host_filter(expr: &Expr) -> HostFilterExpr {
    let mut v = HostFilterVisitor;
    expr.accept(&mut v)
}

struct HostFilterVisitor;

impl Visitor for HostFilterVisitor {
    type Output = HostFilterExpr;

    fn visit_binary(&mut self, op: BinaryOp, field: &FieldReference, operand: &Operand) -> HostFilterExpr {
        match (op, operand) {
            (BinaryOp::Eq, Operand::Scalar(v)) => HostFilterExpr::Eq(field.clone(), v.clone()),
            (BinaryOp::Ne, Operand::Scalar(v)) => HostFilterExpr::Neq(field.clone(), v.clone()),
            _ => HostFilterExpr::AlwaysTrue,
        }
    }

    fn visit_logical(&mut self, op: LogicalOp, operands: &[Expr]) -> HostFilterExpr {
        let lowered: Vec<HostFilterExpr> = operands.iter().map(|e| e.accept(self)).collect();
        match op {
            LogicalOp::And => HostFilterExpr::And(lowered),
            LogicalOp::Or => HostFilterExpr::Or(lowered),
        }
    }

    fn visit_not(&mut self, expr: &Expr) -> HostFilterExpr {
        HostFilterExpr::Not(Box::new(expr.accept(self)))
    }

    fn visit_is_null(&mut self, field: &FieldReference, negate: bool) -> HostFilterExpr {
        if negate {
            HostFilterExpr::Neq(field.clone(), Value::Null)
        } else {
            HostFilterExpr::Eq(field.clone(), Value::Null)
        }
    }
}

/// Whether a lowered expression still needs the in-memory residual
/// evaluator applied post-fetch (anything touching `AlwaysTrue`).
pub fn has_residual(expr: &HostFilterExpr) -> bool {
    match expr {
        HostFilterExpr::AlwaysTrue => true,
        HostFilterExpr::Eq(..) | HostFilterExpr::Neq(..) => false,
        HostFilterExpr::And(items) | HostFilterExpr::Or(items) => items.iter().any(has_residual),
        HostFilterExpr::Not(inner) => has_residual(inner),
    }
}
