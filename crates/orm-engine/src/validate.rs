//! Check-constraint enforcement: three-valued evaluation, reject only
//! on `FALSE`.

use orm_core::Row;
use orm_filter::evaluate_tri;
use orm_schema::Table;

use crate::error::{EngineError, Result};

pub fn run_checks(table: &Table, row: &Row) -> Result<()> {
    for check in table.get_checks() {
        let verdict = evaluate_tri(&check.expr, row);
        if !verdict.passes_check() {
            return Err(EngineError::CheckConstraintViolation {
                table: table.name.clone(),
                name: check.name.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use orm_core::Value;
    use orm_filter::gte;
    use orm_schema::{integer, CheckConstraint, Table};

    fn check_users_table() -> Table {
        Table::new("check_users")
            .column(integer("age"))
            .check(CheckConstraint::new("age_min", gte("age", Value::Int(21))))
    }

    #[test]
    fn rejects_row_that_fails_check() {
        let table = check_users_table();
        let mut row = Row::new();
        row.insert("age".to_string(), Value::Int(18));
        let err = run_checks(&table, &row).unwrap_err();
        assert!(matches!(err, EngineError::CheckConstraintViolation { .. }));
    }

    #[test]
    fn null_age_is_unknown_and_passes() {
        let table = check_users_table();
        let mut row = Row::new();
        row.insert("age".to_string(), Value::Null);
        assert!(run_checks(&table, &row).is_ok());
    }

    #[test]
    fn passing_row_accepted() {
        let table = check_users_table();
        let mut row = Row::new();
        row.insert("age".to_string(), Value::Int(30));
        assert!(run_checks(&table, &row).is_ok());
    }
}
