//! Decomposing a `where` expression into the clauses the index-pick
//! algorithm cares about: equality constraints, at most one multi-probe
//! set-membership clause, and at most one range clause, plus whatever
//! is left over as residual.

use orm_core::Value;
use orm_filter::expr::{BinaryOp, Expr, LogicalOp, Operand};
use orm_filter::FieldReference;

#[derive(Debug, Clone, PartialEq)]
pub struct RangeClause {
    pub field: FieldReference,
    pub op: BinaryOp,
    pub operand: Operand,
}

/// A flattened view of a top-level `AND` chain: equality clauses, at most
/// one multi-probe `inArray` clause, range clauses, and everything else
/// (residual — `OR`s, string/array operators, `isNull`, ...).
#[derive(Debug, Clone, Default)]
pub struct FlatWhere {
    pub equality: Vec<(FieldReference, Value)>,
    pub multi_probe: Option<(FieldReference, Vec<Value>)>,
    pub ranges: Vec<RangeClause>,
    pub residual: Vec<Expr>,
}

/// Flattens an `AND` chain at the top level (commutative reordering of
/// equality clauses is permitted to match a compound index order).
/// Non-`AND` top-level expressions are treated as a single-clause
/// conjunction.
pub fn flatten_where(expr: &Expr) -> FlatWhere {
    let mut conjuncts = Vec::new();
    collect_conjuncts(expr, &mut conjuncts);

    let mut flat = FlatWhere::default();
    for clause in conjuncts {
        match &clause {
            Expr::Binary {
                op: BinaryOp::Eq,
                field,
                operand: Operand::Scalar(v),
            } => flat.equality.push((field.clone(), v.clone())),
            Expr::Binary {
                op: BinaryOp::InArray,
                field,
                operand: Operand::List(values),
            } if flat.multi_probe.is_none() => {
                flat.multi_probe = Some((field.clone(), values.clone()));
            }
            Expr::Binary {
                op: op @ (BinaryOp::Gt | BinaryOp::Gte | BinaryOp::Lt | BinaryOp::Lte),
                field,
                operand,
            } => flat.ranges.push(RangeClause {
                field: field.clone(),
                op: *op,
                operand: operand.clone(),
            }),
            _ => flat.residual.push(clause),
        }
    }
    flat
}

fn collect_conjuncts(expr: &Expr, out: &mut Vec<Expr>) {
    match expr {
        Expr::Logical {
            op: LogicalOp::And,
            operands,
        } => {
            for operand in operands {
                collect_conjuncts(operand, out);
            }
        }
        other => out.push(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orm_filter::{and, eq, gt, in_array, like};

    #[test]
    fn flattens_equality_and_range() {
        let e = and([
            Some(eq("status", Value::Str("open".into()))),
            Some(gt("priority", Value::Int(1))),
        ])
        .unwrap();
        let flat = flatten_where(&e);
        assert_eq!(flat.equality.len(), 1);
        assert_eq!(flat.ranges.len(), 1);
        assert!(flat.residual.is_empty());
    }

    #[test]
    fn captures_one_multi_probe() {
        let e = in_array("status", vec![Value::Str("a".into()), Value::Str("b".into())]);
        let flat = flatten_where(&e);
        assert!(flat.multi_probe.is_some());
    }

    #[test]
    fn unsupported_clause_is_residual() {
        let e = like("title", "%foo%");
        let flat = flatten_where(&e);
        assert_eq!(flat.residual.len(), 1);
    }
}
