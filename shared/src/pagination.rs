//! Page envelope for list endpoints

use serde::{Deserialize, Serialize};

/// One page of results plus the metadata needed to navigate the rest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    /// Total number of matching records
    pub total: u64,
    pub per_page: u32,
    /// 1-based page number
    pub current_page: u32,
    pub last_page: u32,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: u64, current_page: u32, per_page: u32) -> Self {
        let last_page = if per_page > 0 {
            total.div_ceil(per_page as u64).max(1) as u32
        } else {
            1
        };

        Self {
            data,
            total,
            per_page,
            current_page,
            last_page,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
            per_page: self.per_page,
            current_page: self.current_page,
            last_page: self.last_page,
        }
    }
}

/// Page request after clamping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    /// Largest page size a caller may request
    pub const MAX_PER_PAGE: u32 = 100;

    pub fn new(page: Option<u32>, per_page: Option<u32>, default_per_page: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page
                .unwrap_or(default_per_page)
                .clamp(1, Self::MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.per_page as i64
    }

    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginated_last_page() {
        let page = Paginated::new(vec![1, 2, 3], 31, 2, 15);
        assert_eq!(page.last_page, 3);
        let empty: Paginated<i32> = Paginated::new(vec![], 0, 1, 15);
        assert_eq!(empty.last_page, 1);
    }

    #[test]
    fn test_page_request_clamps() {
        let req = PageRequest::new(Some(0), Some(1000), 15);
        assert_eq!(req.page, 1);
        assert_eq!(req.per_page, PageRequest::MAX_PER_PAGE);
        assert_eq!(req.offset(), 0);

        let req = PageRequest::new(Some(3), None, 10);
        assert_eq!(req.offset(), 20);
        assert_eq!(req.limit(), 10);
    }
}
