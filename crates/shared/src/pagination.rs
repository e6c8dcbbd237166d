//! Page-number window calculation for paginated admin lists.
//!
//! Every paginated list (users, external accounts, user groups) renders a
//! strip of page links. [`compute_window`] decides which page numbers appear in
//! that strip and whether ellipses are needed on either side.

use serde::Serialize;

/// Default cap on the number of page links rendered at once.
pub const MAX_PAGE_LIST: u32 = 50;

/// Windowed view over a paginated list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pager {
    /// Current page (1-based).
    pub page: u32,
    /// Total number of pages.
    pub pages_count: u32,
    /// Page numbers to display, ascending.
    pub pages: Vec<u32>,
    /// Total number of items across all pages.
    pub total: i64,
    pub previous: Option<u32>,
    /// Hidden pages exist before the window.
    pub previous_dots: bool,
    pub next: Option<u32>,
    /// Hidden pages exist after the window.
    pub next_dots: bool,
}

/// Number of pages needed for `total` items at `limit` items per page.
pub fn page_count(total: i64, limit: u32) -> u32 {
    if total <= 0 || limit == 0 {
        return 0;
    }
    let limit = i64::from(limit);
    u32::try_from((total + limit - 1) / limit).unwrap_or(u32::MAX)
}

/// Offset of the first row of `page` (1-based) for SQL `OFFSET`.
pub fn page_offset(page: u32, limit: u32) -> i64 {
    i64::from(page.max(1) - 1) * i64::from(limit)
}

/// Computes the page window for a list.
///
/// The window is centered on `page`, re-expanded to `max_window` entries when
/// it touches either edge, and never contains numbers outside
/// `1..=page_count`. A `max_window` of zero is treated as one.
///
/// `_limit` is accepted so call sites pass the same tuple the list query
/// produced; the window itself only depends on page numbers.
pub fn compute_window(
    total: i64,
    _limit: u32,
    page: u32,
    page_count: u32,
    max_window: u32,
) -> Pager {
    let previous = (page > 1).then(|| page - 1);
    let next = (page < page_count).then(|| page + 1);

    let window = max_window.max(1);
    let below = window / 2;
    let above = window - 1 - below;

    let mut min = page.saturating_sub(below).max(1);
    let mut max = page_count.min(page.saturating_add(above));

    if min == 1 {
        max = window.min(page_count);
    }
    if max == page_count {
        min = (page_count + 1).saturating_sub(window).max(1);
    }

    Pager {
        page,
        pages_count: page_count,
        pages: (min..=max).collect(),
        total,
        previous,
        previous_dots: min > 1,
        next,
        next_dots: max < page_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page_of_exactly_one_window() {
        let pager = compute_window(500, 10, 1, 50, 50);
        assert_eq!(pager.pages, (1..=50).collect::<Vec<_>>());
        assert!(!pager.previous_dots);
        assert!(!pager.next_dots);
        assert_eq!(pager.previous, None);
        assert_eq!(pager.next, Some(2));
    }

    #[test]
    fn test_middle_page_of_large_list() {
        let pager = compute_window(1000, 10, 60, 100, 50);
        assert!(pager.pages.contains(&60));
        assert_eq!(pager.pages.len(), 50);
        assert_eq!(pager.pages.first(), Some(&35));
        assert_eq!(pager.pages.last(), Some(&84));
        assert!(pager.previous_dots);
        assert!(pager.next_dots);
        assert_eq!(pager.previous, Some(59));
        assert_eq!(pager.next, Some(61));
    }

    #[test]
    fn test_left_edge_reexpands_to_cap() {
        let pager = compute_window(1000, 10, 3, 100, 50);
        assert_eq!(pager.pages, (1..=50).collect::<Vec<_>>());
        assert!(!pager.previous_dots);
        assert!(pager.next_dots);
    }

    #[test]
    fn test_right_edge_reexpands_to_cap() {
        let pager = compute_window(1000, 10, 99, 100, 50);
        assert_eq!(pager.pages, (51..=100).collect::<Vec<_>>());
        assert!(pager.previous_dots);
        assert!(!pager.next_dots);
        assert_eq!(pager.next, Some(100));
    }

    #[test]
    fn test_last_page_has_no_next() {
        let pager = compute_window(100, 10, 10, 10, 50);
        assert_eq!(pager.next, None);
        assert_eq!(pager.previous, Some(9));
    }

    #[test]
    fn test_empty_list() {
        let pager = compute_window(0, 10, 1, 0, 50);
        assert!(pager.pages.is_empty());
        assert!(!pager.previous_dots);
        assert!(!pager.next_dots);
        assert_eq!(pager.previous, None);
        assert_eq!(pager.next, None);
    }

    #[test]
    fn test_page_beyond_last_page_stays_in_range() {
        let pager = compute_window(30, 10, 7, 3, 50);
        assert_eq!(pager.pages, vec![1, 2, 3]);
        assert_eq!(pager.next, None);
    }

    #[test]
    fn test_zero_window_is_treated_as_one() {
        let pager = compute_window(100, 10, 4, 10, 0);
        assert_eq!(pager.pages, vec![4]);
        assert!(pager.previous_dots);
        assert!(pager.next_dots);
    }

    #[test]
    fn test_small_lists_show_every_page() {
        for page_count in 1..=20u32 {
            for page in 1..=page_count {
                let pager = compute_window(i64::from(page_count) * 10, 10, page, page_count, 20);
                assert_eq!(pager.pages, (1..=page_count).collect::<Vec<_>>());
                assert!(!pager.previous_dots);
                assert!(!pager.next_dots);
            }
        }
    }

    #[test]
    fn test_window_invariants_hold_for_all_pages() {
        for max_window in [1u32, 2, 5, 10, 11, 50] {
            for page_count in [1u32, 7, 49, 50, 51, 120] {
                for page in 1..=page_count {
                    let pager = compute_window(0, 10, page, page_count, max_window);
                    assert!(
                        pager.pages.contains(&page),
                        "page {page} of {page_count} (window {max_window}) missing"
                    );
                    assert!(pager.pages.len() <= max_window as usize);
                    assert!(pager.pages.iter().all(|p| (1..=page_count).contains(p)));
                    assert!(pager.pages.windows(2).all(|w| w[1] == w[0] + 1));

                    let expected_previous = if page > 1 { Some(page - 1) } else { None };
                    let expected_next = if page < page_count { Some(page + 1) } else { None };
                    assert_eq!(pager.previous, expected_previous);
                    assert_eq!(pager.next, expected_next);
                    assert_eq!(pager.previous_dots, pager.pages[0] > 1);
                    assert_eq!(pager.next_dots, *pager.pages.last().unwrap() < page_count);
                }
            }
        }
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(1, 10), 1);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(5, 0), 0);
    }

    #[test]
    fn test_page_offset() {
        assert_eq!(page_offset(1, 50), 0);
        assert_eq!(page_offset(3, 50), 100);
        assert_eq!(page_offset(0, 50), 0);
    }

    #[test]
    fn test_pager_serializes_camel_case() {
        let json = serde_json::to_value(compute_window(20, 10, 1, 2, 50)).unwrap();
        assert_eq!(json["pagesCount"], 2);
        assert_eq!(json["previousDots"], false);
        assert_eq!(json["next"], 2);
        assert!(json["previous"].is_null());
    }
}
