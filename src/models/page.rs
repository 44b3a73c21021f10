//! Client-side pagination over a merged result list.

use serde::Serialize;

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    /// 1-based page number after clamping
    pub current: usize,
    pub total_pages: usize,
}

/// Slices `items` into the requested page.
///
/// `page` is clamped into `1..=total_pages`. A `per_page` of zero disables
/// paging and returns everything as a single page.
pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> Page<'_, T> {
    if per_page == 0 {
        return Page {
            items,
            current: 1,
            total_pages: 1,
        };
    }

    let total_pages = items.len().div_ceil(per_page).max(1);
    let current = page.clamp(1, total_pages);
    let start = (current - 1) * per_page;
    let end = (start + per_page).min(items.len());

    Page {
        items: &items[start..end],
        current,
        total_pages,
    }
}
