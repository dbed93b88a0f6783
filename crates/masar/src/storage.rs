//! Shared persistence vocabulary for the directory, catalog, and acceptance stores.

use serde::Serialize;

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists: {0}")]
    Conflict(String),
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Result of an atomic set operation on a membership list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipChange {
    Added,
    Removed,
    Unchanged,
}

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_PAGE_LIMIT: usize = 20;

/// One-based page request. Zero or unparsable inputs fall back to the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub limit: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    pub fn parse(page: Option<&str>, limit: Option<&str>) -> Self {
        Self::parse_with_limit(page, limit, DEFAULT_PAGE_LIMIT)
    }

    /// Like [`parse`](Self::parse) with a listing-specific default limit.
    pub fn parse_with_limit(page: Option<&str>, limit: Option<&str>, default_limit: usize) -> Self {
        fn positive(raw: Option<&str>) -> Option<usize> {
            raw.and_then(|value| value.trim().parse::<usize>().ok())
                .filter(|value| *value > 0)
        }

        Self {
            page: positive(page).unwrap_or(DEFAULT_PAGE),
            limit: positive(limit).unwrap_or(default_limit.max(1)),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Slices an already filtered and ordered result set.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        items.into_iter().skip(self.offset()).take(self.limit).collect()
    }

    pub fn pagination(&self, total_items: usize) -> Pagination {
        Pagination {
            current_page: self.page,
            total_pages: total_items.div_ceil(self.limit),
            total_items,
            items_per_page: self.limit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub items_per_page: usize,
}
