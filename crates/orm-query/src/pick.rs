//! The index-pick algorithm.

use orm_filter::expr::Expr;
use orm_schema::{Table, BY_CREATION_TIME_INDEX, BY_ID_INDEX};

use crate::error::PlannerError;
use crate::shape::{flatten_where, FlatWhere, RangeClause};

#[derive(Debug, Clone)]
pub struct IndexPick {
    pub index_name: String,
    pub equality_prefix: Vec<(String, orm_core::Value)>,
    pub multi_probe: Option<(String, Vec<orm_core::Value>)>,
    pub range: Option<RangeClause>,
    pub residual: Vec<Expr>,
    pub order_desc: bool,
    pub is_full_scan: bool,
}

struct Candidate {
    name: String,
    columns: Vec<String>,
}

fn declared_candidates(table: &Table) -> Vec<Candidate> {
    let mut out: Vec<Candidate> = table
        .get_indexes()
        .iter()
        .map(|i| Candidate {
            name: i.name.clone(),
            columns: i.columns.clone(),
        })
        .collect();
    out.extend(table.get_unique_indexes().iter().map(|i| Candidate {
        name: i.name.clone(),
        columns: i.columns.clone(),
    }));
    out
}

/// Scores `candidate` against the extracted equality clauses: the length
/// of the leading prefix of `candidate.columns` it can satisfy.
fn equality_prefix_len(candidate: &Candidate, flat: &FlatWhere) -> usize {
    let mut len = 0;
    for column in &candidate.columns {
        if flat.equality.iter().any(|(f, _)| &f.field_name == column) {
            len += 1;
        } else {
            break;
        }
    }
    len
}

fn covers_order_next(candidate: &Candidate, prefix_len: usize, order_by: &str) -> bool {
    candidate
        .columns
        .get(prefix_len)
        .map(|c| c == order_by)
        .unwrap_or(false)
}

/// Pick an index from `where`/`orderBy`, or fail per the documented
/// strict/relaxed/pagination rules.
pub fn pick_index(
    table: &Table,
    where_expr: Option<&Expr>,
    order_by: &str,
    order_desc: bool,
    for_pagination: bool,
    strict: bool,
) -> Result<IndexPick, PlannerError> {
    let flat = where_expr.map(flatten_where).unwrap_or_default();

    let candidates = declared_candidates(table);
    let best = candidates
        .iter()
        .enumerate()
        .map(|(decl_order, c)| {
            let prefix_len = equality_prefix_len(c, &flat);
            let covers_order = covers_order_next(c, prefix_len, order_by);
            (prefix_len, covers_order, decl_order, c)
        })
        .max_by(|a, b| {
            a.0.cmp(&b.0)
                .then(a.1.cmp(&b.1))
                .then(b.2.cmp(&a.2)) // smaller decl_order wins ties
        });

    if let Some((prefix_len, _, _, candidate)) = best {
        if prefix_len > 0 {
            let equality_prefix = candidate.columns[..prefix_len]
                .iter()
                .map(|col| {
                    let (_, v) = flat.equality.iter().find(|(f, _)| &f.field_name == col).unwrap();
                    (col.clone(), v.clone())
                })
                .collect();
            let range = flat
                .ranges
                .iter()
                .find(|r| candidate.columns.get(prefix_len).map(String::as_str) == Some(r.field.field_name.as_str()))
                .cloned();
            return finish(candidate.name.clone(), equality_prefix, flat, range, order_desc, false);
        }
    }

    // No equality prefix matched. _creationTime ordering is always
    // available via the implicit index; any other order column needs its
    // own leading index.
    if order_by == "_creationTime" {
        return finish(BY_CREATION_TIME_INDEX.to_string(), Vec::new(), flat, None, order_desc, false);
    }

    if let Some(candidate) = candidates.iter().find(|c| c.columns.first().map(String::as_str) == Some(order_by)) {
        return finish(candidate.name.clone(), Vec::new(), flat, None, order_desc, false);
    }

    if for_pagination {
        return Err(PlannerError::PaginationFieldHasNoIndex {
            field: order_by.to_string(),
        });
    }

    if strict {
        return Err(PlannerError::NoCoveringIndex {
            table: table.name.clone(),
        });
    }

    // Relaxed mode: warn and fall back to a full scan ordered by `order_by`
    // in memory. The caller (orm-engine/orm's facade) owns the warn sink.
    finish(BY_ID_INDEX.to_string(), Vec::new(), flat, None, order_desc, true)
}

fn finish(
    index_name: String,
    equality_prefix: Vec<(String, orm_core::Value)>,
    flat: FlatWhere,
    range: Option<RangeClause>,
    order_desc: bool,
    is_full_scan: bool,
) -> Result<IndexPick, PlannerError> {
    Ok(IndexPick {
        index_name,
        equality_prefix,
        multi_probe: flat.multi_probe.map(|(f, vs)| (f.field_name, vs)),
        range,
        residual: flat.residual,
        order_desc,
        is_full_scan,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use orm_core::Value;
    use orm_filter::eq;
    use orm_schema::{text, Index, Table};

    fn table_with_index() -> Table {
        Table::new("users")
            .column(text("status"))
            .index(Index::new("by_status", vec!["status".into()]))
    }

    #[test]
    fn picks_declared_index_on_equality_match() {
        let table = table_with_index();
        let e = eq("status", Value::Str("open".into()));
        let pick = pick_index(&table, Some(&e), "_creationTime", true, false, true).unwrap();
        assert_eq!(pick.index_name, "by_status");
        assert_eq!(pick.equality_prefix, vec![("status".to_string(), Value::Str("open".into()))]);
        assert!(!pick.is_full_scan);
    }

    #[test]
    fn falls_back_to_creation_time_index_with_no_where() {
        let table = table_with_index();
        let pick = pick_index(&table, None, "_creationTime", true, false, true).unwrap();
        assert_eq!(pick.index_name, "by_creation_time");
        assert!(!pick.is_full_scan);
    }

    #[test]
    fn strict_mode_rejects_uncovered_query() {
        let table = table_with_index();
        let e = eq("bio", Value::Str("x".into()));
        let err = pick_index(&table, Some(&e), "bio", true, false, true).unwrap_err();
        assert!(matches!(err, PlannerError::NoCoveringIndex { .. }));
    }

    #[test]
    fn pagination_on_non_indexed_order_field_is_hard_error() {
        let table = table_with_index();
        let err = pick_index(&table, None, "role", true, true, true).unwrap_err();
        match err {
            PlannerError::PaginationFieldHasNoIndex { field } => assert_eq!(field, "role"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn relaxed_mode_allows_full_scan() {
        let table = table_with_index();
        let e = eq("bio", Value::Str("x".into()));
        let pick = pick_index(&table, Some(&e), "bio", true, false, false).unwrap();
        assert!(pick.is_full_scan);
    }
}
