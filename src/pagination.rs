// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Client-side pagination over an already-fetched list.
//!
//! Pages are 1-based. Navigation to an out-of-range page is ignored rather
//! than clamped, and changing the page size always returns to page 1.

/// Page sizes offered by the inventory listing.
pub const INVENTORY_PAGE_SIZES: [usize; 3] = [10, 20, 30];

/// Default page size of the date-range report.
pub const REPORT_PAGE_SIZE: usize = 5;

/// How many page numbers the pager shows at once.
const MAX_VISIBLE_PAGES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    total_items: usize,
    per_page: usize,
    current: usize,
}

impl Paginator {
    /// A per-page of 0 is treated as 1.
    pub fn new(total_items: usize, per_page: usize) -> Self {
        Self {
            total_items,
            per_page: per_page.max(1),
            current: 1,
        }
    }

    pub fn current_page(&self) -> usize {
        self.current
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    pub fn total_items(&self) -> usize {
        self.total_items
    }

    pub fn total_pages(&self) -> usize {
        self.total_items.div_ceil(self.per_page)
    }

    /// Replace the item count (after a reload or a new search) and go back to page 1.
    pub fn reset(&mut self, total_items: usize) {
        self.total_items = total_items;
        self.current = 1;
    }

    pub fn set_per_page(&mut self, per_page: usize) {
        self.per_page = per_page.max(1);
        self.current = 1;
    }

    /// Jump to `page`. Returns false and leaves the pager untouched when the
    /// page does not exist.
    pub fn go_to(&mut self, page: usize) -> bool {
        if page >= 1 && page <= self.total_pages() {
            self.current = page;
            true
        } else {
            false
        }
    }

    pub fn next(&mut self) -> bool {
        self.go_to(self.current + 1)
    }

    pub fn previous(&mut self) -> bool {
        self.current > 1 && self.go_to(self.current - 1)
    }

    /// The items of the current page.
    pub fn page_items<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = (self.current - 1) * self.per_page;
        if start >= items.len() {
            return &[];
        }
        let end = (start + self.per_page).min(items.len());
        &items[start..end]
    }

    /// Page numbers to render: all of them when there are at most three,
    /// otherwise a three-wide window around the current page.
    pub fn visible_pages(&self) -> Vec<usize> {
        let total = self.total_pages();
        if total <= MAX_VISIBLE_PAGES {
            return (1..=total).collect();
        }
        let mut start = self.current.saturating_sub(1).max(1);
        let end = (start + MAX_VISIBLE_PAGES - 1).min(total);
        if end == total {
            start = end.saturating_sub(MAX_VISIBLE_PAGES - 1).max(1);
        }
        (start..=end).collect()
    }

    /// 1-based index of the first item shown, 0 when the list is empty.
    pub fn showing_from(&self) -> usize {
        if self.total_items == 0 {
            0
        } else {
            (self.current - 1) * self.per_page + 1
        }
    }

    /// 1-based index of the last item shown.
    pub fn showing_to(&self) -> usize {
        ((self.current - 1) * self.per_page + self.per_page).min(self.total_items)
    }

    /// "Showing 11-20 of 42" line for table footers.
    pub fn summary(&self) -> String {
        format!(
            "Showing {}-{} of {} (page {}/{})",
            self.showing_from(),
            self.showing_to(),
            self.total_items,
            self.current,
            self.total_pages().max(1)
        )
    }
}
