//! Planner errors. Messages are matched by substring in tests, so
//! wording here is load-bearing: `allowFullScan`, `maxScan`,
//! `multi-probe`, and the literal `Pagination: Field '<name>' has no
//! index` must all appear verbatim somewhere in the corresponding variant.

#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    #[error(
        "table '{table}' has no index covering this query in strict mode; pass allowFullScan:true to scan regardless, or bound the scan with maxScan"
    )]
    NoCoveringIndex { table: String },

    #[error("Pagination: Field '{field}' has no index")]
    PaginationFieldHasNoIndex { field: String },

    #[error(
        "table '{table}' query resolves to a multi-probe (set-membership) scan; pagination requires maxScan in strict mode or allowFullScan in relaxed mode"
    )]
    MultiProbeRequiresBudget { table: String },

    #[error("table '{table}' paginated mutation rejects multi-probe filters: they cannot be cursor-split coherently")]
    MultiProbeNotAllowedForMutationPaginate { table: String },
}
