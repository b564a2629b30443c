//! Two-valued in-memory evaluation. Used for residual post-fetch
//! filtering; never for check constraints (see [`crate::tri`]).

use orm_core::{Row, Value};

use crate::expr::{BinaryOp, Expr, LogicalOp, Operand, Visitor};
use crate::field::FieldReference;
use crate::strmatch;

pub fn evaluate(expr: &Expr, row: &Row) -> bool {
    let mut v = BoolEvaluator { row };
    expr.accept(&mut v)
}

pub(crate) struct BoolEvaluator<'a> {
    pub(crate) row: &'a Row,
}

impl<'a> BoolEvaluator<'a> {
    fn field_value(&self, field: &FieldReference) -> Value {
        self.row
            .get(&field.field_name)
            .cloned()
            .unwrap_or(Value::Null)
    }
}

fn as_array(v: &Value) -> &[Value] {
    match v {
        Value::Array(items) => items.as_slice(),
        _ => &[],
    }
}

impl<'a> Visitor for BoolEvaluator<'a> {
    type Output = bool;

    fn visit_binary(&mut self, op: BinaryOp, field: &FieldReference, operand: &Operand) -> bool {
        let actual = self.field_value(field);
        match (op, operand) {
            (BinaryOp::Eq, Operand::Scalar(v)) => actual == *v,
            (BinaryOp::Ne, Operand::Scalar(v)) => actual != *v,
            (BinaryOp::Gt, Operand::Scalar(v)) => actual.cmp_ordered(v).is_gt(),
            (BinaryOp::Gte, Operand::Scalar(v)) => actual.cmp_ordered(v).is_ge(),
            (BinaryOp::Lt, Operand::Scalar(v)) => actual.cmp_ordered(v).is_lt(),
            (BinaryOp::Lte, Operand::Scalar(v)) => actual.cmp_ordered(v).is_le(),
            (BinaryOp::InArray, Operand::List(vs)) => vs.contains(&actual),
            (BinaryOp::NotInArray, Operand::List(vs)) => !vs.contains(&actual),
            (BinaryOp::ArrayContains, Operand::List(vs)) => {
                let have = as_array(&actual);
                vs.iter().all(|needle| have.contains(needle))
            }
            (BinaryOp::ArrayContained, Operand::List(vs)) => {
                as_array(&actual).iter().all(|item| vs.contains(item))
            }
            (BinaryOp::ArrayOverlaps, Operand::List(vs)) => {
                let have = as_array(&actual);
                vs.iter().any(|needle| have.contains(needle))
            }
            (BinaryOp::Between, Operand::Range(lo, hi)) => {
                actual.cmp_ordered(lo).is_ge() && actual.cmp_ordered(hi).is_le()
            }
            (BinaryOp::NotBetween, Operand::Range(lo, hi)) => {
                actual.cmp_ordered(lo).is_lt() || actual.cmp_ordered(hi).is_gt()
            }
            (BinaryOp::Like, Operand::Scalar(Value::Str(p))) => {
                string_match(&actual, p, strmatch::like_match, false)
            }
            (BinaryOp::Ilike, Operand::Scalar(Value::Str(p))) => {
                string_match(&actual, p, strmatch::like_match, true)
            }
            (BinaryOp::NotLike, Operand::Scalar(Value::Str(p))) => {
                !string_match(&actual, p, strmatch::like_match, false)
            }
            (BinaryOp::NotIlike, Operand::Scalar(Value::Str(p))) => {
                !string_match(&actual, p, strmatch::like_match, true)
            }
            (BinaryOp::StartsWith, Operand::Scalar(Value::Str(p))) => {
                string_match_plain(&actual, p, strmatch::starts_with_match)
            }
            (BinaryOp::EndsWith, Operand::Scalar(Value::Str(p))) => {
                string_match_plain(&actual, p, strmatch::ends_with_match)
            }
            (BinaryOp::Contains, Operand::Scalar(Value::Str(p))) => {
                string_match_plain(&actual, p, strmatch::contains_match)
            }
            _ => false,
        }
    }

    fn visit_logical(&mut self, op: LogicalOp, operands: &[Expr]) -> bool {
        match op {
            LogicalOp::And => operands.iter().all(|e| e.accept(self)),
            LogicalOp::Or => operands.iter().any(|e| e.accept(self)),
        }
    }

    fn visit_not(&mut self, expr: &Expr) -> bool {
        !expr.accept(self)
    }

    fn visit_is_null(&mut self, field: &FieldReference, negate: bool) -> bool {
        let is_null = self.field_value(field).is_null();
        if negate {
            !is_null
        } else {
            is_null
        }
    }
}

fn string_match(actual: &Value, pattern: &str, f: impl Fn(&str, &str, bool) -> bool, ci: bool) -> bool {
    match actual {
        Value::Str(s) => f(s, pattern, ci),
        _ => false,
    }
}

fn string_match_plain(actual: &Value, pattern: &str, f: impl Fn(&str, &str) -> bool) -> bool {
    match actual {
        Value::Str(s) => f(s, pattern),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{and, eq, gt, is_not_null, is_null, not, or, starts_with};
    use std::collections::BTreeMap;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect::<BTreeMap<_, _>>()
    }

    #[test]
    fn eq_matches() {
        let r = row(&[("status", Value::Str("open".into()))]);
        assert!(evaluate(&eq("status", Value::Str("open".into())), &r));
    }

    #[test]
    fn and_requires_all() {
        let r = row(&[("status", Value::Str("open".into())), ("priority", Value::Int(2))]);
        let e = and([
            Some(eq("status", Value::Str("open".into()))),
            Some(gt("priority", Value::Int(1))),
        ])
        .unwrap();
        assert!(evaluate(&e, &r));
    }

    #[test]
    fn or_requires_any() {
        let r = row(&[("status", Value::Str("closed".into()))]);
        let e = or([
            Some(eq("status", Value::Str("open".into()))),
            Some(eq("status", Value::Str("closed".into()))),
        ])
        .unwrap();
        assert!(evaluate(&e, &r));
    }

    #[test]
    fn not_negates() {
        let r = row(&[("status", Value::Str("open".into()))]);
        assert!(!evaluate(&not(eq("status", Value::Str("open".into()))), &r));
    }

    #[test]
    fn is_null_missing_field() {
        let r = row(&[]);
        assert!(evaluate(&is_null("nickname"), &r));
        assert!(!evaluate(&is_not_null("nickname"), &r));
    }

    #[test]
    fn starts_with_on_non_string_is_false() {
        let r = row(&[("count", Value::Int(3))]);
        assert!(!evaluate(&starts_with("count", "3"), &r));
    }
}
