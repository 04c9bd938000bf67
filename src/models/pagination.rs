//! Pagination parameters and paginated response envelope

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};

pub const DEFAULT_PER_PAGE: i64 = 20;
pub const MAX_PER_PAGE: i64 = 100;

/// Page parameters common to all listing endpoints.
/// Out-of-range values are rejected, not clamped.
#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageQuery {
    /// Validate and resolve to concrete (page, per_page)
    pub fn resolve(&self) -> AppResult<(i64, i64)> {
        let page = self.page.unwrap_or(1);
        let per_page = self.per_page.unwrap_or(DEFAULT_PER_PAGE);

        if page < 1 {
            return Err(AppError::Validation("page must be >= 1".to_string()));
        }
        if per_page < 1 || per_page > MAX_PER_PAGE {
            return Err(AppError::Validation(format!(
                "per_page must be between 1 and {}",
                MAX_PER_PAGE
            )));
        }

        Ok((page, per_page))
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        Self { page: None, per_page: None }
    }
}

/// Paginated response envelope
#[derive(Debug, Serialize, ToSchema)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, page: i64, per_page: i64, total: i64) -> Self {
        // Ceiling division; an empty result set still reports one page
        let total_pages = if total == 0 {
            1
        } else {
            (total + per_page - 1) / per_page
        };
        Self { items, page, per_page, total, total_pages }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<i64>, per_page: Option<i64>) -> PageQuery {
        PageQuery { page, per_page }
    }

    #[test]
    fn defaults_apply_when_unset() {
        assert_eq!(query(None, None).resolve().unwrap(), (1, DEFAULT_PER_PAGE));
    }

    #[test]
    fn rejects_page_below_one() {
        assert!(query(Some(0), Some(10)).resolve().is_err());
        assert!(query(Some(-3), None).resolve().is_err());
    }

    #[test]
    fn rejects_per_page_out_of_range() {
        assert!(query(Some(1), Some(0)).resolve().is_err());
        assert!(query(Some(1), Some(101)).resolve().is_err());
        assert!(query(Some(1), Some(100)).resolve().is_ok());
    }

    #[test]
    fn total_pages_is_ceiling_of_count_over_size() {
        let page: Paginated<i32> = Paginated::new(vec![], 2, 10, 25);
        assert_eq!(page.total_pages, 3);

        let exact: Paginated<i32> = Paginated::new(vec![], 1, 10, 30);
        assert_eq!(exact.total_pages, 3);

        let empty: Paginated<i32> = Paginated::new(vec![], 1, 10, 0);
        assert_eq!(empty.total_pages, 1);
    }
}
