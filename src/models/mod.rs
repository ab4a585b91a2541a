pub mod affirmation;
pub mod mood;
pub mod sleep;
pub mod stress;
pub mod user;

use serde::Serialize;

/// Standard success envelope: `{ "success": true, "data": ... }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// List envelope with count and page cursors.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub success: bool,
    pub count: usize,
    pub pagination: Pagination,
    pub data: Vec<T>,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>, pagination: Pagination) -> Self {
        Self {
            success: true,
            count: data.len(),
            pagination,
            data,
        }
    }
}

#[derive(Debug, Serialize, Default)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageRef>,
}

#[derive(Debug, Serialize)]
pub struct PageRef {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    /// Cursor links for a 1-based page over `total` rows.
    pub fn for_page(page: i64, limit: i64, total: i64) -> Self {
        let start = (page - 1) * limit;
        let end = page * limit;
        Self {
            next: (end < total).then_some(PageRef {
                page: page + 1,
                limit,
            }),
            prev: (start > 0).then_some(PageRef {
                page: page - 1,
                limit,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_first_page_has_no_prev() {
        let p = Pagination::for_page(1, 10, 25);
        assert!(p.prev.is_none());
        assert_eq!(p.next.as_ref().map(|n| n.page), Some(2));
    }

    #[test]
    fn pagination_last_page_has_no_next() {
        let p = Pagination::for_page(3, 10, 25);
        assert!(p.next.is_none());
        assert_eq!(p.prev.as_ref().map(|n| n.page), Some(2));
    }

    #[test]
    fn pagination_exact_boundary() {
        // 20 rows, 10 per page: page 2 is the last page
        let p = Pagination::for_page(2, 10, 20);
        assert!(p.next.is_none());
        assert!(p.prev.is_some());
    }
}
