//! Client-side list cache with search filtering and pagination.
//!
//! The cache holds a snapshot of the whole collection plus the search term
//! and derives the displayed page from them. The view is never edited on
//! its own: every change to the snapshot, the term or the page goes through
//! `refilter`, which recomputes it from scratch.

use std::collections::HashSet;
use tracing::{debug, warn};

use crate::api::Record;

/// The currently displayed page of filtered records
#[derive(Debug, Clone, PartialEq)]
pub struct View<T> {
    pub items: Vec<T>,
    /// Number of records matching the search, across all pages
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

impl<T> View<T> {
    fn empty(page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 1,
            page_size,
        }
    }
}

/// Case-insensitive substring test over a record's searchable fields.
/// A blank term matches everything.
pub fn matches_search<T: Record>(record: &T, term: &str) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    record
        .search_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Records matching `term`, in snapshot order
pub fn filter<'a, T: Record>(records: &'a [T], term: &str) -> Vec<&'a T> {
    records.iter().filter(|r| matches_search(*r, term)).collect()
}

/// Slice out 1-based `page` of `page_size` records
pub fn paginate<T: Clone>(records: &[&T], page: usize, page_size: usize) -> Vec<T> {
    records
        .iter()
        .skip(page.saturating_sub(1).saturating_mul(page_size))
        .take(page_size)
        .map(|r| (*r).clone())
        .collect()
}

/// Full snapshot of a collection plus its derived, paginated view
#[derive(Debug, Clone)]
pub struct ListCache<T: Record> {
    snapshot: Vec<T>,
    search: String,
    view: View<T>,
}

impl<T: Record> ListCache<T> {
    /// Create an empty cache showing pages of `page_size`
    pub fn new(page_size: usize) -> Self {
        Self {
            snapshot: Vec::new(),
            search: String::new(),
            view: View::empty(page_size.max(1)),
        }
    }

    pub fn snapshot(&self) -> &[T] {
        &self.snapshot
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn view(&self) -> &View<T> {
        &self.view
    }

    /// Replace the snapshot wholesale and show page 1
    pub fn load(&mut self, records: Vec<T>) {
        let received = records.len();
        let mut seen = HashSet::with_capacity(received);
        let mut snapshot = Vec::with_capacity(received);
        for record in records {
            if seen.insert(record.id().to_string()) {
                snapshot.push(record);
            }
        }
        if snapshot.len() != received {
            warn!(
                "Dropped {} duplicate record(s) from loaded snapshot",
                received - snapshot.len()
            );
        }

        self.snapshot = snapshot;
        self.refilter(None, None);
    }

    /// Update the search term. Does not refilter; callers decide when the
    /// new term takes effect.
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    /// Recompute the view. `page` defaults to 1 so a changed filter starts
    /// from the top; `page_size` defaults to the current one.
    pub fn refilter(&mut self, page: Option<usize>, page_size: Option<usize>) {
        let page = page.unwrap_or(1).max(1);
        let page_size = page_size.unwrap_or(self.view.page_size).max(1);

        let filtered = filter(&self.snapshot, &self.search);
        self.view = View {
            items: paginate(&filtered, page, page_size),
            total: filtered.len(),
            page,
            page_size,
        };

        debug!(
            "Refiltered {} record(s) with {:?}: {} match, page {} shows {}",
            self.snapshot.len(),
            self.search,
            self.view.total,
            page,
            self.view.items.len()
        );
    }

    /// Insert a newly created record at the front and go back to page 1.
    /// A record whose id is already cached replaces the cached copy.
    pub fn apply_create(&mut self, record: T) {
        if let Some(existing) = self.snapshot.iter_mut().find(|r| r.id() == record.id()) {
            *existing = record;
        } else {
            self.snapshot.insert(0, record);
        }
        self.refilter(None, None);
    }

    /// Replace the record with the same id, staying on the current page
    pub fn apply_update(&mut self, record: T) {
        match self.snapshot.iter_mut().find(|r| r.id() == record.id()) {
            Some(existing) => *existing = record,
            None => debug!("Updated record {} is not cached", record.id()),
        }
        self.refilter(Some(self.view.page), None);
    }

    /// Remove the record with `id`, staying on the current page even if it
    /// is now empty
    pub fn apply_delete(&mut self, id: &str) {
        self.snapshot.retain(|r| r.id() != id);
        self.refilter(Some(self.view.page), None);
    }
}
