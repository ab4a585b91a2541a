pub mod affirmations;
pub mod auth;
pub mod health;
pub mod mood;
pub mod roadmap;
pub mod sleep;
pub mod stress;

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

/// Normalize page/limit query params to (page, limit, offset).
pub(crate) fn page_params(page: Option<i64>, limit: Option<i64>) -> (i64, i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (page, limit, (page - 1) * limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_params_defaults() {
        assert_eq!(page_params(None, None), (1, 10, 0));
    }

    #[test]
    fn page_params_clamps() {
        assert_eq!(page_params(Some(0), Some(1000)), (1, 100, 0));
        assert_eq!(page_params(Some(3), Some(20)), (3, 20, 40));
    }
}
