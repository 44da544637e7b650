//! Page window computation shared by the record browser and search results.
//!
//! Pure functions only: callers own their page cursor and ask for a
//! [`PageWindow`] whenever the dataset or the cursor changes.

use serde::Serialize;
use std::num::NonZeroUsize;
use std::ops::Range;

/// Upper bound on page numbers offered at once
pub const MAX_VISIBLE_PAGES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub current_page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
    /// Contiguous ascending page numbers, at most [`MAX_VISIBLE_PAGES`] long
    pub visible_pages: Vec<usize>,
}

impl PageWindow {
    pub fn compute(total_items: usize, page_size: NonZeroUsize, current_page: usize) -> Self {
        let page_size = page_size.get();
        let current_page = current_page.max(1);
        let total_pages = total_pages(total_items, page_size);

        Self {
            current_page,
            page_size,
            total_items,
            total_pages,
            visible_pages: visible_pages(current_page, total_pages),
        }
    }

    /// Index range of the current page, clamped to the dataset
    pub fn range(&self) -> Range<usize> {
        let start = (self.current_page - 1)
            .saturating_mul(self.page_size)
            .min(self.total_items);
        let end = start.saturating_add(self.page_size).min(self.total_items);
        start..end
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let range = self.range();
        let end = range.end.min(items.len());
        &items[range.start.min(end)..end]
    }

    /// Controls are hidden entirely for zero or one page
    pub fn show_controls(&self) -> bool {
        self.total_pages > 1
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}

/// A materialized page of items plus its window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub window: PageWindow,
}

impl<T: Clone> Page<T> {
    pub fn of(items: &[T], page_size: NonZeroUsize, current_page: usize) -> Self {
        let window = PageWindow::compute(items.len(), page_size, current_page);
        Self {
            items: window.slice(items).to_vec(),
            window,
        }
    }
}

pub fn total_pages(total_items: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total_items.div_ceil(page_size)
}

/// Keep a cursor inside `1..=max(1, total_pages)`
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

fn visible_pages(current_page: usize, total_pages: usize) -> Vec<usize> {
    let span = MAX_VISIBLE_PAGES - 1;
    let mut start = current_page.saturating_sub(1).max(1);
    let end = start.saturating_add(span).min(total_pages);

    if end < start.saturating_add(span) {
        start = end.saturating_sub(span).max(1);
    }

    (start..=end).collect()
}
