//! Output of [`crate::build_relations`]: a flat, resolved edge list.

use crate::declaration::Cardinality;

#[derive(Debug, Clone, PartialEq)]
pub struct InverseRef {
    pub table: String,
    pub edge_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationEdge {
    pub source_table: String,
    pub edge_name: String,
    pub target_table: String,
    pub cardinality: Cardinality,
    pub source_fields: Vec<String>,
    pub target_fields: Vec<String>,
    pub inverse_edge: Option<InverseRef>,
}
