// Page/limit bookkeeping shared by every list store

use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: u32 = 10;

// Search text plus page cursor sent with every list request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    pub search: String,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
            search: String::new(),
        }
    }
}

impl ListQuery {
    pub fn with_limit(limit: u32) -> Self {
        Self {
            limit: limit.max(1),
            ..Default::default()
        }
    }

    // Filters narrow the result set, so the cursor goes back to the first page
    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
        self.page = 1;
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn to_params(&self) -> Vec<(String, String)> {
        vec![
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.limit.to_string()),
            ("search".to_string(), self.search.clone()),
        ]
    }
}

// One page of a server-paginated listing
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }
}

pub fn total_pages(total: u64, limit: u32) -> u64 {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(u64::from(limit))
}

// Client-side slice for listings the API returns unpaginated (admin reviews)
pub fn paginate<T: Clone>(items: &[T], page: u32, limit: u32) -> Page<T> {
    let limit = limit.max(1) as usize;
    let start = (page.max(1) as usize - 1).saturating_mul(limit);
    let slice = items.iter().skip(start).take(limit).cloned().collect();
    Page {
        items: slice,
        total: items.len() as u64,
    }
}
