use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: i64 = 1;
pub const MAX_PAGE: i64 = 1000;
pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

/// A normalized page window. `page` is always at least 1 and `limit` always
/// falls inside `[1, MAX_LIMIT]`.
#[derive(Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Debug)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(DEFAULT_PAGE).max(1),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    pub const fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    pub fn meta(&self, total: i64) -> PaginationOut {
        let total = total.max(0);
        let total_pages = (total + self.limit - 1) / self.limit;

        PaginationOut {
            page: self.page,
            limit: self.limit,
            total,
            total_pages,
            has_next_page: self.page < total_pages,
            has_prev_page: self.page > 1,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, PartialEq, Eq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PaginationOut {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_page_and_limit() {
        assert_eq!(Pagination::new(Some(0), Some(0)), Pagination { page: 1, limit: 1 });
        assert_eq!(
            Pagination::new(Some(-4), Some(500)),
            Pagination { page: 1, limit: 100 }
        );
        assert_eq!(Pagination::new(None, None), Pagination { page: 1, limit: 20 });
    }

    #[test]
    fn offset_skips_previous_pages() {
        assert_eq!(Pagination::new(Some(3), Some(10)).offset(), 20);
        assert_eq!(Pagination::new(Some(1), Some(50)).offset(), 0);
    }

    #[test]
    fn meta_for_last_partial_page() {
        let meta = Pagination::new(Some(3), Some(10)).meta(25);
        assert_eq!(meta.total_pages, 3);
        assert!(!meta.has_next_page);
        assert!(meta.has_prev_page);
    }

    #[test]
    fn meta_for_empty_result() {
        let meta = Pagination::default().meta(0);
        assert_eq!(meta.total, 0);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next_page);
        assert!(!meta.has_prev_page);
    }

    #[test]
    fn meta_for_exact_multiple() {
        let meta = Pagination::new(Some(1), Some(10)).meta(20);
        assert_eq!(meta.total_pages, 2);
        assert!(meta.has_next_page);
        assert!(!meta.has_prev_page);
    }
}
