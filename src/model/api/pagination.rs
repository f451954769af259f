use serde::{Deserialize, Serialize};

/// Pagination query parameters: `page_num` (from 1) and `page_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromForm, UriDisplayQuery)]
pub struct PaginationRequest {
    #[field(default = 1, validate = range(1..))]
    pub page_num: usize,
    #[field(default = 50, validate = range(1..=500))]
    pub page_size: usize,
}

impl Default for PaginationRequest {
    fn default() -> Self {
        Self {
            page_num: 1,
            page_size: 50,
        }
    }
}

impl PaginationRequest {
    /// How many items precede the requested page.
    pub fn skip(&self) -> u64 {
        ((self.page_num - 1) * self.page_size) as u64
    }

    /// Wrap one page of items, given the total number of items across all pages.
    pub fn to_paginated<T>(self, total: u64, items: Vec<T>) -> Paginated<T> {
        Paginated {
            pagination: PaginationResult {
                page_num: self.page_num,
                page_size: self.page_size,
                total,
            },
            items,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationResult {
    pub page_num: usize,
    pub page_size: usize,
    pub total: u64,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub pagination: PaginationResult,
    pub items: Vec<T>,
}
