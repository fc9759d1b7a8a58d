use std::ops::RangeInclusive;

use thiserror::Error;

pub const PAGE_SIZE: u64 = 8;

/// Inclusive row range, as sent in a `Range: from-to` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub from: u64,
    pub to: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("page {requested} is out of range (1..={last_page})")]
    OutOfRange { requested: u64, last_page: u64 },
}

/// The visible slice of the newest-first post list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    page: u64,
    page_size: u64,
    total: u64,
}

impl Default for PageWindow {
    fn default() -> Self {
        Self::new(PAGE_SIZE)
    }
}

impl PageWindow {
    pub fn new(page_size: u64) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            total: 0,
        }
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(self.page_size)
    }

    pub fn range(&self) -> RowRange {
        let from = (self.page - 1) * self.page_size;
        RowRange {
            from,
            to: from + self.page_size - 1,
        }
    }

    pub fn can_prev(&self) -> bool {
        self.page > 1
    }

    pub fn can_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Number of rows the current page should hold for the known total.
    pub fn expected_len(&self) -> u64 {
        self.total
            .saturating_sub((self.page - 1) * self.page_size)
            .min(self.page_size)
    }

    pub fn page_numbers(&self) -> RangeInclusive<u64> {
        1..=self.total_pages()
    }

    /// Page 1 is always reachable, even for an empty list.
    pub fn go_to(&mut self, page: u64) -> Result<(), PageError> {
        let last_page = self.total_pages().max(1);
        if page == 0 || page > last_page {
            return Err(PageError::OutOfRange {
                requested: page,
                last_page,
            });
        }
        self.page = page;
        Ok(())
    }

    pub fn next(&mut self) -> Result<(), PageError> {
        self.go_to(self.page + 1)
    }

    pub fn prev(&mut self) -> Result<(), PageError> {
        self.go_to(self.page.saturating_sub(1))
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }

    pub fn set_total(&mut self, total: u64) {
        self.total = total;
    }
}

#[cfg(test)]
#[path = "tests/pagination_tests.rs"]
mod tests;
