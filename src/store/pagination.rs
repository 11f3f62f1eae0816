//! Pagination window computation and the page-navigation controller.
//!
//! `compute` is a pure function from `(total, page_size, current_page)` to
//! the numbers a list footer needs. `Pagination` is the UI-owned state the
//! navigation actions operate on; it never touches the list itself, callers
//! pass its page and page size to the store.

use serde::Serialize;
use std::fmt;

/// Above this many pages the marker strip collapses around the current page
const MAX_FULL_PAGES: usize = 7;

/// Pages shown on each side of the current page in a collapsed strip
const WINDOW_RADIUS: usize = 2;

/// Page sizes offered to the user
pub const PAGE_SIZE_OPTIONS: [usize; 3] = [25, 50, 100];

/// Default page size of the patients list
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// One entry of the page-number strip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMarker {
    Page(usize),
    Ellipsis,
}

impl Serialize for PageMarker {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageMarker::Page(page) => serializer.serialize_u64(*page as u64),
            PageMarker::Ellipsis => serializer.serialize_str("..."),
        }
    }
}

impl fmt::Display for PageMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageMarker::Page(page) => write!(f, "{}", page),
            PageMarker::Ellipsis => f.write_str("..."),
        }
    }
}

/// Everything a list footer shows about the current page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub total_pages: usize,
    pub has_next_page: bool,
    pub has_prev_page: bool,
    /// 1-based index of the first displayed item, 0 for an empty list
    pub start_item: usize,
    pub end_item: usize,
    pub visible_pages: Vec<PageMarker>,
}

/// Compute the pagination window for a list of `total` items.
///
/// `page_size` and `current_page` are expected to be positive; a zero page
/// size is treated as 1 and a zero page as page 1. Item positions saturate,
/// so any page number is accepted.
pub fn compute(total: usize, page_size: usize, current_page: usize) -> PaginationInfo {
    let page_size = page_size.max(1);
    let current_page = current_page.max(1);

    let total_pages = total.div_ceil(page_size);
    let start_item = if total == 0 {
        0
    } else {
        (current_page - 1).saturating_mul(page_size).saturating_add(1)
    };
    let end_item = current_page.saturating_mul(page_size).min(total);

    PaginationInfo {
        total_pages,
        has_next_page: current_page < total_pages,
        has_prev_page: current_page > 1,
        start_item,
        end_item,
        visible_pages: visible_pages(total_pages, current_page),
    }
}

fn visible_pages(total_pages: usize, current_page: usize) -> Vec<PageMarker> {
    if total_pages <= MAX_FULL_PAGES {
        return (1..=total_pages).map(PageMarker::Page).collect();
    }

    let current = current_page.min(total_pages);
    let start = current.saturating_sub(WINDOW_RADIUS).max(1);
    let end = current.saturating_add(WINDOW_RADIUS).min(total_pages);

    let mut pages = Vec::with_capacity(end - start + 5);
    if start > 1 {
        pages.push(PageMarker::Page(1));
        if start > 2 {
            pages.push(PageMarker::Ellipsis);
        }
    }

    pages.extend((start..=end).map(PageMarker::Page));

    if end < total_pages {
        if end < total_pages - 1 {
            pages.push(PageMarker::Ellipsis);
        }
        pages.push(PageMarker::Page(total_pages));
    }

    pages
}

/// Page position and size as held by the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    current_page: usize,
    page_size: usize,
    total: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Pagination {
    /// Create a controller on page 1
    pub fn new(page_size: usize) -> Self {
        Self {
            current_page: 1,
            page_size: page_size.max(1),
            total: 0,
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    fn total_pages(&self) -> usize {
        self.total.div_ceil(self.page_size)
    }

    /// Update the item count the pages are computed from. A shrinking total
    /// pulls the current page back inside the valid range.
    pub fn set_total(&mut self, total: usize) {
        self.total = total;
        let last = self.total_pages().max(1);
        if self.current_page > last {
            self.current_page = last;
        }
    }

    /// Jump to `page`. Targets outside `1..=total_pages` are ignored.
    pub fn go_to_page(&mut self, page: usize) -> bool {
        if page >= 1 && page <= self.total_pages() {
            self.current_page = page;
            true
        } else {
            false
        }
    }

    /// Change the page size and return to page 1
    pub fn set_page_size(&mut self, size: usize) {
        if size == 0 {
            return;
        }
        self.page_size = size;
        self.current_page = 1;
    }

    pub fn go_to_first_page(&mut self) {
        self.current_page = 1;
    }

    pub fn go_to_last_page(&mut self) {
        self.current_page = self.total_pages().max(1);
    }

    pub fn go_to_next_page(&mut self) -> bool {
        if self.current_page < self.total_pages() {
            self.current_page += 1;
            true
        } else {
            false
        }
    }

    pub fn go_to_prev_page(&mut self) -> bool {
        if self.current_page > 1 {
            self.current_page -= 1;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PageMarker::{Ellipsis, Page};

    fn pages(numbers: &[usize]) -> Vec<PageMarker> {
        numbers.iter().copied().map(Page).collect()
    }

    #[test]
    fn test_compute_middle_page() {
        let info = compute(123, 50, 2);
        assert_eq!(info.total_pages, 3);
        assert_eq!(info.start_item, 51);
        assert_eq!(info.end_item, 100);
        assert!(info.has_prev_page);
        assert!(info.has_next_page);
        assert_eq!(info.visible_pages, pages(&[1, 2, 3]));
    }

    #[test]
    fn test_compute_empty_list() {
        let info = compute(0, 50, 1);
        assert_eq!(info.total_pages, 0);
        assert_eq!(info.start_item, 0);
        assert_eq!(info.end_item, 0);
        assert!(!info.has_prev_page);
        assert!(!info.has_next_page);
        assert!(info.visible_pages.is_empty());
    }

    #[test]
    fn test_item_range_matches_page_size() {
        for total in 1..=60usize {
            for page_size in 1..=12 {
                let total_pages = total.div_ceil(page_size);
                for current in 1..=total_pages {
                    let info = compute(total, page_size, current);
                    let shown = info.end_item - info.start_item + 1;
                    assert_eq!(
                        shown,
                        page_size.min(total - info.start_item + 1),
                        "total={} size={} page={}",
                        total,
                        page_size,
                        current
                    );
                }
            }
        }
    }

    #[test]
    fn test_huge_page_numbers_saturate() {
        let info = compute(10, 50, usize::MAX / 10);
        assert_eq!(info.total_pages, 1);
        assert_eq!(info.end_item, 10);
        assert!(info.has_prev_page);
        assert!(!info.has_next_page);
        assert_eq!(info.visible_pages, vec![Page(1)]);

        let info = compute(1_000, 1, usize::MAX);
        assert_eq!(info.start_item, usize::MAX);
        assert_eq!(info.end_item, 1_000);
        assert_eq!(info.visible_pages.last(), Some(&Page(1_000)));
    }

    #[test]
    fn test_short_lists_show_every_page() {
        for total_pages in 0..=7usize {
            for current in 1..=total_pages.max(1) {
                let info = compute(total_pages * 10, 10, current);
                assert_eq!(info.visible_pages, (1..=total_pages).map(Page).collect::<Vec<_>>());
            }
        }
    }

    #[test]
    fn test_collapsed_strip() {
        assert_eq!(
            compute(100, 10, 5).visible_pages,
            vec![Page(1), Ellipsis, Page(3), Page(4), Page(5), Page(6), Page(7), Ellipsis, Page(10)]
        );
        assert_eq!(
            compute(100, 10, 1).visible_pages,
            vec![Page(1), Page(2), Page(3), Ellipsis, Page(10)]
        );
        assert_eq!(
            compute(100, 10, 4).visible_pages,
            vec![Page(1), Page(2), Page(3), Page(4), Page(5), Page(6), Ellipsis, Page(10)]
        );
        assert_eq!(
            compute(100, 10, 10).visible_pages,
            vec![Page(1), Ellipsis, Page(8), Page(9), Page(10)]
        );
    }

    #[test]
    fn test_ellipsis_never_doubled_or_next_to_boundary() {
        for total_pages in 8..=30 {
            for current in 1..=total_pages {
                let strip = compute(total_pages, 1, current).visible_pages;
                assert_eq!(strip.first(), Some(&Page(1)));
                assert_eq!(strip.last(), Some(&Page(total_pages)));
                for pair in strip.windows(2) {
                    assert!(!(pair[0] == Ellipsis && pair[1] == Ellipsis));
                    if let (Page(a), Page(b)) = (pair[0], pair[1]) {
                        assert_eq!(b, a + 1);
                    }
                }
                for triple in strip.windows(3) {
                    if let (Page(a), Ellipsis, Page(b)) = (triple[0], triple[1], triple[2]) {
                        assert!(b > a + 1);
                    }
                }
            }
        }
    }

    #[test]
    fn test_navigation() {
        let mut pagination = Pagination::new(10);
        pagination.set_total(95);

        assert!(pagination.go_to_next_page());
        assert_eq!(pagination.current_page(), 2);

        pagination.go_to_last_page();
        assert_eq!(pagination.current_page(), 10);
        assert!(!pagination.go_to_next_page());

        assert!(pagination.go_to_prev_page());
        assert_eq!(pagination.current_page(), 9);

        pagination.go_to_first_page();
        assert!(!pagination.go_to_prev_page());
        assert_eq!(pagination.current_page(), 1);
    }

    #[test]
    fn test_go_to_page_rejects_out_of_range() {
        let mut pagination = Pagination::new(10);
        pagination.set_total(30);

        assert!(!pagination.go_to_page(0));
        assert!(!pagination.go_to_page(4));
        assert_eq!(pagination.current_page(), 1);

        assert!(pagination.go_to_page(3));
        assert_eq!(pagination.current_page(), 3);
    }

    #[test]
    fn test_set_page_size_resets_page() {
        let mut pagination = Pagination::new(25);
        pagination.set_total(500);
        pagination.go_to_page(7);

        pagination.set_page_size(100);
        assert_eq!(pagination.current_page(), 1);
        assert_eq!(pagination.page_size(), 100);

        pagination.go_to_page(3);
        pagination.set_page_size(100);
        assert_eq!(pagination.current_page(), 1);
    }

    #[test]
    fn test_shrinking_total_clamps_page() {
        let mut pagination = Pagination::new(10);
        pagination.set_total(100);
        pagination.go_to_last_page();

        pagination.set_total(42);
        assert_eq!(pagination.current_page(), 5);

        pagination.set_total(0);
        assert_eq!(pagination.current_page(), 1);
        pagination.go_to_last_page();
        assert_eq!(pagination.current_page(), 1);
    }

    #[test]
    fn test_marker_serialization() {
        let json = serde_json::to_string(&compute(100, 10, 1).visible_pages).unwrap();
        assert_eq!(json, r#"[1,2,3,"...",10]"#);
    }
}
