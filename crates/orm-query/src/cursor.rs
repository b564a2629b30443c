//! Cursor-paginated reads with split semantics.
//!
//! The core's contract is that cursors are opaque and host-owned; since
//! the host here is the in-memory reference store (`orm-storage::memory`),
//! this module *is* that host-paginator boundary — it owns cursor
//! encoding as well as the split-on-exhausted-scan-budget behavior. A real
//! document-store-backed port would move cursor construction across the
//! boundary into the host and keep only the split-decision logic here.

use orm_filter::expr::Expr;

use crate::error::PlannerError;

/// An opaque offset into an ordered row sequence. Encoded as a plain
/// decimal string — callers must not parse it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor(pub usize);

impl Cursor {
    pub fn encode(self) -> String {
        self.0.to_string()
    }

    pub fn decode(token: &str) -> Option<Cursor> {
        token.parse::<usize>().ok().map(Cursor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    SplitRequired,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub is_done: bool,
    pub continue_cursor: String,
    pub page_status: Option<PageStatus>,
    pub split_cursor: Option<String>,
}

/// Walks `ordered` starting at `cursor` (default: the beginning),
/// accumulating items that pass `residual` until either `limit` items are
/// collected or `max_scan` rows have been examined — whichever comes
/// first. Post-fetch predicates are applied before `limit` is counted;
/// the scan budget therefore must be larger than `limit`.
///
/// When the scan budget is exhausted before `limit` is reached and before
/// the range ends, the page carries `page_status = SplitRequired` and a
/// `split_cursor` bisecting the unscanned remainder.
pub fn paginate<T: Clone>(
    ordered: &[T],
    cursor: Option<&str>,
    limit: usize,
    max_scan: Option<usize>,
    residual: impl Fn(&T) -> bool,
) -> Result<Page<T>, PlannerError> {
    let start = cursor.and_then(Cursor::decode).map(|c| c.0).unwrap_or(0);
    let mut items = Vec::new();
    let mut scanned = 0usize;
    let mut pos = start;

    while pos < ordered.len() {
        if let Some(budget) = max_scan {
            if scanned >= budget && items.len() < limit {
                let remaining = ordered.len() - pos;
                let split_at = pos + remaining / 2;
                return Ok(Page {
                    items,
                    is_done: false,
                    continue_cursor: Cursor(pos).encode(),
                    page_status: Some(PageStatus::SplitRequired),
                    split_cursor: Some(Cursor(split_at).encode()),
                });
            }
        }
        if items.len() >= limit {
            break;
        }
        let candidate = &ordered[pos];
        scanned += 1;
        pos += 1;
        if residual(candidate) {
            items.push(candidate.clone());
        }
    }

    let is_done = pos >= ordered.len();
    Ok(Page {
        items,
        is_done,
        continue_cursor: Cursor(pos).encode(),
        page_status: None,
        split_cursor: None,
    })
}

/// Whether `residual` still needs to run a post-fetch in-memory pass —
/// true whenever the flattened `where` left clauses the host index/filter
/// DSL could not absorb.
pub fn needs_residual_pass(residual: &[Expr]) -> bool {
    !residual.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginates_in_fixed_size_pages() {
        let rows: Vec<i32> = (0..25).collect();
        let page1 = paginate(&rows, None, 10, None, |_| true).unwrap();
        assert_eq!(page1.items.len(), 10);
        assert!(!page1.is_done);

        let page2 = paginate(&rows, Some(&page1.continue_cursor), 10, None, |_| true).unwrap();
        assert_eq!(page2.items.len(), 10);

        let page3 = paginate(&rows, Some(&page2.continue_cursor), 10, None, |_| true).unwrap();
        assert_eq!(page3.items.len(), 5);
        assert!(page3.is_done);
    }

    #[test]
    fn replaying_a_cursor_is_stable() {
        let rows: Vec<i32> = (0..25).collect();
        let page1 = paginate(&rows, None, 10, None, |_| true).unwrap();
        let replay_a = paginate(&rows, Some(&page1.continue_cursor), 10, None, |_| true).unwrap();
        let replay_b = paginate(&rows, Some(&page1.continue_cursor), 10, None, |_| true).unwrap();
        assert_eq!(replay_a.items, replay_b.items);
    }

    #[test]
    fn exhausted_scan_budget_splits() {
        let rows: Vec<i32> = (0..100).collect();
        let page = paginate(&rows, None, 50, Some(5), |_| true).unwrap();
        assert_eq!(page.page_status, Some(PageStatus::SplitRequired));
        assert!(page.split_cursor.is_some());
        assert_eq!(page.items.len(), 5);
    }

    #[test]
    fn is_done_when_range_ends() {
        let rows: Vec<i32> = (0..3).collect();
        let page = paginate(&rows, None, 10, None, |_| true).unwrap();
        assert!(page.is_done);
    }
}
