//! `build_relations`: the pure function that turns per-table relation
//! declarations into a flat, validated, inverse-paired edge list.

use std::collections::BTreeMap;

use orm_schema::Schema;

use crate::declaration::{Cardinality, EdgeDeclaration};
use crate::edge::{InverseRef, RelationEdge};
use crate::error::RelationsError;
use crate::graph::detect_cycle;

fn column_exists(schema: &Schema, table: &str, field: &str) -> bool {
    if field == "_id" || field == "_creationTime" {
        return true;
    }
    schema
        .table(table)
        .map(|t| t.get_column(field).is_some())
        .unwrap_or(false)
}

pub fn build_relations(
    schema: &Schema,
    declarations: &BTreeMap<String, Vec<EdgeDeclaration>>,
) -> Result<Vec<RelationEdge>, RelationsError> {
    let mut edges = Vec::new();

    for (source_table, decls) in declarations {
        let table = schema.table(source_table);
        for decl in decls {
            if let Some(t) = table {
                if t.get_column(&decl.name).is_some() {
                    return Err(RelationsError::RelationNameCollides {
                        table: source_table.clone(),
                        name: decl.name.clone(),
                    });
                }
            }

            if schema.table(&decl.target_table).is_none() {
                return Err(RelationsError::ReferencesUndefinedTable {
                    table: source_table.clone(),
                    name: decl.name.clone(),
                    target_table: decl.target_table.clone(),
                });
            }

            for field in &decl.source_fields {
                if !column_exists(schema, source_table, field) {
                    return Err(RelationsError::FromColumnsMustBelong {
                        table: source_table.clone(),
                        name: decl.name.clone(),
                    });
                }
            }
            for field in &decl.target_fields {
                if !column_exists(schema, &decl.target_table, field) {
                    return Err(RelationsError::ToColumnsMustBelong {
                        table: source_table.clone(),
                        name: decl.name.clone(),
                        target_table: decl.target_table.clone(),
                    });
                }
            }

            edges.push(RelationEdge {
                source_table: source_table.clone(),
                edge_name: decl.name.clone(),
                target_table: decl.target_table.clone(),
                cardinality: decl.cardinality,
                source_fields: decl.source_fields.clone(),
                target_fields: decl.target_fields.clone(),
                inverse_edge: None,
            });
        }
    }

    pair_by_alias(declarations, &mut edges);
    pair_by_fields(&mut edges);

    let mut dependency_edges: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for edge in &edges {
        if edge.cardinality == Cardinality::One {
            dependency_edges
                .entry(edge.source_table.clone())
                .or_default()
                .push(edge.target_table.clone());
        }
    }
    detect_cycle(&dependency_edges)?;

    Ok(edges)
}

fn pair_by_alias(declarations: &BTreeMap<String, Vec<EdgeDeclaration>>, edges: &mut [RelationEdge]) {
    // (table, edge_name) -> alias, reconstructed by walking the original
    // declarations in the same order `edges` was built.
    let mut aliases: Vec<(String, String, String)> = Vec::new();
    for (table, decls) in declarations {
        for decl in decls {
            if let Some(alias) = &decl.alias {
                aliases.push((table.clone(), decl.name.clone(), alias.clone()));
            }
        }
    }

    for i in 0..aliases.len() {
        for j in 0..aliases.len() {
            if i == j {
                continue;
            }
            let (table_a, name_a, alias_a) = &aliases[i];
            let (table_b, name_b, alias_b) = &aliases[j];
            if alias_a == alias_b && table_a != table_b {
                set_inverse(edges, table_a, name_a, table_b, name_b);
            }
        }
    }
}

fn pair_by_fields(edges: &mut [RelationEdge]) {
    let snapshot: Vec<(String, String, String, Vec<String>, Vec<String>)> = edges
        .iter()
        .map(|e| {
            (
                e.source_table.clone(),
                e.edge_name.clone(),
                e.target_table.clone(),
                e.source_fields.clone(),
                e.target_fields.clone(),
            )
        })
        .collect();

    for i in 0..snapshot.len() {
        if edges[i].inverse_edge.is_some() {
            continue;
        }
        let (src_a, name_a, tgt_a, sf_a, tf_a) = &snapshot[i];
        let mut candidates = Vec::new();
        for (j, (src_b, name_b, tgt_b, sf_b, tf_b)) in snapshot.iter().enumerate() {
            if i == j || edges[j].inverse_edge.is_some() {
                continue;
            }
            if tgt_a == src_b && src_a == tgt_b && sf_a == tf_b && tf_a == sf_b {
                candidates.push((j, src_b.clone(), name_b.clone()));
            }
        }
        if candidates.len() == 1 {
            let (j, table_b, name_b) = candidates.into_iter().next().unwrap();
            edges[i].inverse_edge = Some(InverseRef {
                table: table_b.clone(),
                edge_name: name_b.clone(),
            });
            edges[j].inverse_edge = Some(InverseRef {
                table: src_a.clone(),
                edge_name: name_a.clone(),
            });
        }
    }
}

fn set_inverse(edges: &mut [RelationEdge], table_a: &str, name_a: &str, table_b: &str, name_b: &str) {
    for edge in edges.iter_mut() {
        if edge.source_table == table_a && edge.edge_name == name_a {
            edge.inverse_edge = Some(InverseRef {
                table: table_b.to_string(),
                edge_name: name_b.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orm_schema::{id, text, ColumnConfig, Schema, SchemaOptions, Table};

    fn users_posts_schema() -> Schema {
        let users = Table::new("users").column(text("name"));
        let posts = Table::new("posts")
            .column(id("author_id", "users").with_config(ColumnConfig::default().not_null()));
        Schema::build(vec![users, posts], SchemaOptions::default()).unwrap()
    }

    #[test]
    fn pairs_inverse_edges_by_fields() {
        let schema = users_posts_schema();
        let mut decls = BTreeMap::new();
        decls.insert(
            "users".to_string(),
            vec![EdgeDeclaration::new(
                "posts",
                "posts",
                Cardinality::Many,
                vec!["_id".into()],
                vec!["author_id".into()],
            )],
        );
        decls.insert(
            "posts".to_string(),
            vec![EdgeDeclaration::new(
                "author",
                "users",
                Cardinality::One,
                vec!["author_id".into()],
                vec!["_id".into()],
            )],
        );

        let edges = build_relations(&schema, &decls).unwrap();
        let user_edge = edges.iter().find(|e| e.source_table == "users").unwrap();
        assert_eq!(
            user_edge.inverse_edge,
            Some(InverseRef {
                table: "posts".into(),
                edge_name: "author".into()
            })
        );
    }

    #[test]
    fn rejects_name_colliding_with_column() {
        let schema = users_posts_schema();
        let mut decls = BTreeMap::new();
        decls.insert(
            "users".to_string(),
            vec![EdgeDeclaration::new(
                "name",
                "posts",
                Cardinality::Many,
                vec!["_id".into()],
                vec!["author_id".into()],
            )],
        );
        let err = build_relations(&schema, &decls).unwrap_err();
        assert!(matches!(err, RelationsError::RelationNameCollides { .. }));
    }

    #[test]
    fn rejects_undefined_target_table() {
        let schema = users_posts_schema();
        let mut decls = BTreeMap::new();
        decls.insert(
            "users".to_string(),
            vec![EdgeDeclaration::new(
                "ghosts",
                "ghosts",
                Cardinality::Many,
                vec!["_id".into()],
                vec!["author_id".into()],
            )],
        );
        let err = build_relations(&schema, &decls).unwrap_err();
        assert!(matches!(err, RelationsError::ReferencesUndefinedTable { .. }));
    }

    #[test]
    fn rejects_from_column_not_belonging_to_source() {
        let schema = users_posts_schema();
        let mut decls = BTreeMap::new();
        decls.insert(
            "users".to_string(),
            vec![EdgeDeclaration::new(
                "posts",
                "posts",
                Cardinality::Many,
                vec!["not_a_column".into()],
                vec!["author_id".into()],
            )],
        );
        let err = build_relations(&schema, &decls).unwrap_err();
        assert!(matches!(err, RelationsError::FromColumnsMustBelong { .. }));
    }

    #[test]
    fn rejects_self_referencing_one_edge_as_cycle() {
        let schema = users_posts_schema();
        let mut decls = BTreeMap::new();
        decls.insert(
            "users".to_string(),
            vec![EdgeDeclaration::new(
                "manager",
                "users",
                Cardinality::One,
                vec!["_id".into()],
                vec!["_id".into()],
            )],
        );
        let err = build_relations(&schema, &decls).unwrap_err();
        assert!(matches!(err, RelationsError::CircularDependency(_)));
    }
}
