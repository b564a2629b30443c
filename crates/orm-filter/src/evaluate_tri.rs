//! Three-valued (SQL) evaluation, used **only** for check constraints.
//! Kept structurally separate from [`crate::evaluate`] even though both
//! walk the same tree — two-valued and three-valued semantics must never
//! collapse into one evaluator.

use orm_core::{Row, Value};

use crate::evaluate::BoolEvaluator;
use crate::expr::{BinaryOp, Expr, LogicalOp, Operand, Visitor};
use crate::field::FieldReference;
use crate::tri::Tri;

pub fn evaluate_tri(expr: &Expr, row: &Row) -> Tri {
    let mut v = TriEvaluator { row };
    expr.accept(&mut v)
}

struct TriEvaluator<'a> {
    row: &'a Row,
}

impl<'a> TriEvaluator<'a> {
    fn field_value(&self, field: &FieldReference) -> Value {
        self.row
            .get(&field.field_name)
            .cloned()
            .unwrap_or(Value::Null)
    }
}

impl<'a> Visitor for TriEvaluator<'a> {
    type Output = Tri;

    fn visit_binary(&mut self, op: BinaryOp, field: &FieldReference, operand: &Operand) -> Tri {
        let actual = self.field_value(field);
        if actual.is_null() {
            return Tri::Unknown;
        }
        // No NULL on the left-hand side: two-valued and three-valued
        // evaluation agree, so delegate to the shared scalar matching.
        let mut two_valued = BoolEvaluator { row: self.row };
        Tri::from_bool(two_valued.visit_binary(op, field, operand))
    }

    fn visit_logical(&mut self, op: LogicalOp, operands: &[Expr]) -> Tri {
        let mut results = operands.iter().map(|e| e.accept(self));
        let first = match results.next() {
            Some(t) => t,
            None => return Tri::Unknown,
        };
        match op {
            LogicalOp::And => results.fold(first, |acc, t| acc.and(t)),
            LogicalOp::Or => results.fold(first, |acc, t| acc.or(t)),
        }
    }

    fn visit_not(&mut self, expr: &Expr) -> Tri {
        expr.accept(self).not()
    }

    fn visit_is_null(&mut self, field: &FieldReference, negate: bool) -> Tri {
        // IS [NOT] NULL is always well-defined, never UNKNOWN.
        let is_null = self.field_value(field).is_null();
        Tri::from_bool(if negate { !is_null } else { is_null })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{and, eq, is_null, or};
    use std::collections::BTreeMap;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect::<BTreeMap<_, _>>()
    }

    #[test]
    fn comparison_against_missing_field_is_unknown() {
        let r = row(&[]);
        assert_eq!(evaluate_tri(&eq("age", Value::Int(21)), &r), Tri::Unknown);
    }

    #[test]
    fn comparison_against_present_field_is_definite() {
        let r = row(&[("age", Value::Int(25))]);
        assert_eq!(evaluate_tri(&eq("age", Value::Int(25)), &r), Tri::True);
        assert_eq!(evaluate_tri(&eq("age", Value::Int(1)), &r), Tri::False);
    }

    #[test]
    fn and_is_false_dominant_even_with_unknown() {
        let r = row(&[("age", Value::Int(18))]);
        let e = and([Some(eq("age", Value::Int(21))), Some(eq("missing", Value::Int(1)))]).unwrap();
        assert_eq!(evaluate_tri(&e, &r), Tri::False);
    }

    #[test]
    fn or_unknown_with_true_is_true() {
        let r = row(&[("age", Value::Int(25))]);
        let e = or([Some(eq("missing", Value::Int(1))), Some(eq("age", Value::Int(25)))]).unwrap();
        assert_eq!(evaluate_tri(&e, &r), Tri::True);
    }

    #[test]
    fn is_null_is_never_unknown() {
        let r = row(&[]);
        assert_eq!(evaluate_tri(&is_null("missing"), &r), Tri::True);
    }
}
