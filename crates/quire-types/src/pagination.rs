//! Page-number pagination over a known total

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    total: u64,
    per_page: u64,
}

/// One page of a paginated listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub number: u64,
    pub num_pages: u64,
    pub per_page: u64,
    pub total: u64,
}

impl Paginator {
    /// `per_page` of zero is treated as one
    pub fn new(total: u64, per_page: u64) -> Self {
        Self {
            total,
            per_page: per_page.max(1),
        }
    }

    /// Always at least one page, so an empty listing still has a first page
    pub fn num_pages(&self) -> u64 {
        self.total.div_ceil(self.per_page).max(1)
    }

    /// The requested 1-based page, or `None` when it is out of range
    pub fn page(&self, number: u64) -> Option<PageWindow> {
        if number == 0 || number > self.num_pages() {
            return None;
        }
        Some(PageWindow {
            number,
            num_pages: self.num_pages(),
            per_page: self.per_page,
            total: self.total,
        })
    }

    /// Resolve a `?page=` value: a number, `last`, or absent for the first page
    pub fn page_from_query(&self, raw: Option<&str>) -> Option<PageWindow> {
        match raw.map(str::trim) {
            None | Some("") => self.page(1),
            Some("last") => self.page(self.num_pages()),
            Some(n) => n.parse::<u64>().ok().and_then(|n| self.page(n)),
        }
    }
}

impl PageWindow {
    pub fn offset(&self) -> u64 {
        (self.number - 1) * self.per_page
    }

    pub fn limit(&self) -> u64 {
        self.per_page
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn next_number(&self) -> Option<u64> {
        self.has_next().then_some(self.number + 1)
    }

    pub fn previous_number(&self) -> Option<u64> {
        self.has_previous().then_some(self.number - 1)
    }

    /// Slice an in-memory listing down to this page
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = (self.offset() as usize).min(items.len());
        let end = (start + self.per_page as usize).min(items.len());
        &items[start..end]
    }
}
