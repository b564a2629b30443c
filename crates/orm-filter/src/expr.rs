//! The branded, immutable filter expression tree.

use orm_core::Value;
use serde::{Deserialize, Serialize};

use crate::field::FieldReference;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    InArray,
    NotInArray,
    ArrayContains,
    ArrayContained,
    ArrayOverlaps,
    Like,
    Ilike,
    NotLike,
    NotIlike,
    StartsWith,
    EndsWith,
    Contains,
    Between,
    NotBetween,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOp {
    And,
    Or,
}

/// The right-hand operand of a [`BinaryOp`]. Most operators take one
/// scalar; `inArray`/`notInArray`/the array-set operators take a list;
/// `between`/`notBetween` take an inclusive `(low, high)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    Scalar(Value),
    List(Vec<Value>),
    Range(Value, Value),
}

/// A node in the filter tree. Construct via the factory functions below
/// rather than the variants directly — the factories enforce the
/// `Logical` collapsing rule (undefined operands dropped, a single
/// surviving operand unwrapped, zero operands vanish).
///
/// Serializes to a plain JSON form usable as a scheduler payload; since
/// [`Value`] already round-trips `Id`/`Bytes` through sentinel tags, no
/// separate wire codec is needed here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Binary {
        op: BinaryOp,
        field: FieldReference,
        operand: Operand,
    },
    Logical {
        op: LogicalOp,
        operands: Vec<Expr>,
    },
    Not(Box<Expr>),
    IsNull {
        field: FieldReference,
        negate: bool,
    },
}

fn binary(op: BinaryOp, field: impl Into<FieldReference>, operand: Operand) -> Expr {
    Expr::Binary {
        op,
        field: field.into(),
        operand,
    }
}

macro_rules! scalar_op {
    ($name:ident, $op:ident) => {
        pub fn $name(field: impl Into<FieldReference>, value: Value) -> Expr {
            binary(BinaryOp::$op, field, Operand::Scalar(value))
        }
    };
}

macro_rules! string_op {
    ($name:ident, $op:ident) => {
        pub fn $name(field: impl Into<FieldReference>, pattern: impl Into<String>) -> Expr {
            binary(BinaryOp::$op, field, Operand::Scalar(Value::Str(pattern.into())))
        }
    };
}

scalar_op!(eq, Eq);
scalar_op!(ne, Ne);
scalar_op!(gt, Gt);
scalar_op!(gte, Gte);
scalar_op!(lt, Lt);
scalar_op!(lte, Lte);

string_op!(like, Like);
string_op!(ilike, Ilike);
string_op!(not_like, NotLike);
string_op!(not_ilike, NotIlike);
string_op!(starts_with, StartsWith);
string_op!(ends_with, EndsWith);
string_op!(contains, Contains);

pub fn in_array(field: impl Into<FieldReference>, values: Vec<Value>) -> Expr {
    binary(BinaryOp::InArray, field, Operand::List(values))
}

pub fn not_in_array(field: impl Into<FieldReference>, values: Vec<Value>) -> Expr {
    binary(BinaryOp::NotInArray, field, Operand::List(values))
}

pub fn array_contains(field: impl Into<FieldReference>, values: Vec<Value>) -> Expr {
    binary(BinaryOp::ArrayContains, field, Operand::List(values))
}

pub fn array_contained(field: impl Into<FieldReference>, values: Vec<Value>) -> Expr {
    binary(BinaryOp::ArrayContained, field, Operand::List(values))
}

pub fn array_overlaps(field: impl Into<FieldReference>, values: Vec<Value>) -> Expr {
    binary(BinaryOp::ArrayOverlaps, field, Operand::List(values))
}

/// Inclusive on both ends.
pub fn between(field: impl Into<FieldReference>, low: Value, high: Value) -> Expr {
    binary(BinaryOp::Between, field, Operand::Range(low, high))
}

/// Strictly outside the closed `[low, high]` range.
pub fn not_between(field: impl Into<FieldReference>, low: Value, high: Value) -> Expr {
    binary(BinaryOp::NotBetween, field, Operand::Range(low, high))
}

pub fn is_null(field: impl Into<FieldReference>) -> Expr {
    Expr::IsNull {
        field: field.into(),
        negate: false,
    }
}

pub fn is_not_null(field: impl Into<FieldReference>) -> Expr {
    Expr::IsNull {
        field: field.into(),
        negate: true,
    }
}

pub fn not(expr: Expr) -> Expr {
    Expr::Not(Box::new(expr))
}

/// `and`/`or` filter out `None` operands, unwrap a single surviving
/// operand instead of wrapping it in a one-element `Logical`, and return
/// `None` for zero operands — the dynamically-typed source's "undefined
/// operand" handling translated into `Option`.
fn logical(op: LogicalOp, operands: impl IntoIterator<Item = Option<Expr>>) -> Option<Expr> {
    let mut present: Vec<Expr> = operands.into_iter().flatten().collect();
    match present.len() {
        0 => None,
        1 => present.pop(),
        _ => Some(Expr::Logical { op, operands: present }),
    }
}

pub fn and(operands: impl IntoIterator<Item = Option<Expr>>) -> Option<Expr> {
    logical(LogicalOp::And, operands)
}

pub fn or(operands: impl IntoIterator<Item = Option<Expr>>) -> Option<Expr> {
    logical(LogicalOp::Or, operands)
}

impl Expr {
    pub fn accept<V: Visitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Expr::Binary { op, field, operand } => visitor.visit_binary(*op, field, operand),
            Expr::Logical { op, operands } => visitor.visit_logical(*op, operands),
            Expr::Not(inner) => visitor.visit_not(inner),
            Expr::IsNull { field, negate } => visitor.visit_is_null(field, *negate),
        }
    }

    /// Serializes to the plain JSON form a scheduler payload carries this
    /// tree in. `Value`'s own `Serialize` impl already tags `Id`/`Bytes`,
    /// so no separate wire codec is needed for operands.
    pub fn to_wire(&self) -> String {
        serde_json::to_string(self).expect("Expr serialization cannot fail")
    }

    /// Decodes a tree serialized by [`Expr::to_wire`], rejecting a
    /// malformed payload rather than panicking.
    pub fn from_wire(payload: &str) -> Result<Expr, crate::error::FilterError> {
        Ok(serde_json::from_str(payload)?)
    }
}

/// One method per variant; the three required evaluators ([`crate::evaluate`],
/// [`crate::evaluate_tri`], [`crate::to_host_filter`]) each implement this
/// with no shared mutable state.
pub trait Visitor {
    type Output;

    fn visit_binary(&mut self, op: BinaryOp, field: &FieldReference, operand: &Operand) -> Self::Output;
    fn visit_logical(&mut self, op: LogicalOp, operands: &[Expr]) -> Self::Output;
    fn visit_not(&mut self, expr: &Expr) -> Self::Output;
    fn visit_is_null(&mut self, field: &FieldReference, negate: bool) -> Self::Output;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_of_zero_is_none() {
        assert_eq!(and(Vec::<Option<Expr>>::new()), None);
    }

    #[test]
    fn and_of_one_unwraps() {
        let e = eq("status", Value::Str("open".into()));
        assert_eq!(and([Some(e.clone())]), Some(e));
    }

    #[test]
    fn and_of_many_wraps_in_logical() {
        let a = eq("status", Value::Str("open".into()));
        let b = gt("priority", Value::Int(1));
        match and([Some(a), None, Some(b)]) {
            Some(Expr::Logical { op, operands }) => {
                assert_eq!(op, LogicalOp::And);
                assert_eq!(operands.len(), 2);
            }
            other => panic!("expected Logical, got {other:?}"),
        }
    }

    #[test]
    fn wire_round_trips() {
        let expr = and([Some(eq("status", Value::Str("open".into()))), Some(gt("priority", Value::Int(1)))]).unwrap();
        let wire = expr.to_wire();
        assert_eq!(Expr::from_wire(&wire).unwrap(), expr);
    }

    #[test]
    fn from_wire_rejects_malformed_payload() {
        let err = Expr::from_wire("not json").unwrap_err();
        assert!(matches!(err, crate::error::FilterError::Malformed(_)));
    }
}
