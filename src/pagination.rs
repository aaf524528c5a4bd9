//! Page-number pagination for catalog listings
//!
//! A non-numeric page falls back to the first page and a number outside
//! `1..=num_pages` to the last one, so every request gets a page back.

use serde::Serialize;

/// Resolved position of a page within a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: usize,
    pub num_pages: usize,
    pub page_size: usize,
}

impl PageRequest {
    /// Resolve a raw `?page=` value against `total` items.
    pub fn resolve(raw: Option<&str>, total: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let num_pages = total.div_ceil(page_size).max(1);

        let number = match raw.map(str::trim).map(str::parse::<i64>) {
            None | Some(Err(_)) => 1,
            Some(Ok(n)) if n >= 1 && (n as u64) <= num_pages as u64 => n as usize,
            Some(Ok(_)) => num_pages,
        };

        Self {
            number,
            num_pages,
            page_size,
        }
    }

    pub fn offset(&self) -> usize {
        (self.number - 1) * self.page_size
    }

    pub fn limit(&self) -> usize {
        self.page_size
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    pub total: usize,
    pub has_previous: bool,
    pub has_next: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: usize) -> Self {
        Self {
            items,
            number: request.number,
            num_pages: request.num_pages,
            total,
            has_previous: request.number > 1,
            has_next: request.number < request.num_pages,
        }
    }

    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            number: 1,
            num_pages: 1,
            total: 0,
            has_previous: false,
            has_next: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_pages() {
        assert_eq!(PageRequest::resolve(None, 30, 12).number, 1);
        assert_eq!(PageRequest::resolve(Some("2"), 30, 12).number, 2);
        assert_eq!(PageRequest::resolve(Some("2"), 30, 12).offset(), 12);
        assert_eq!(PageRequest::resolve(Some("3"), 30, 12).num_pages, 3);
    }

    #[test]
    fn test_non_numeric_page_is_first() {
        assert_eq!(PageRequest::resolve(Some("abc"), 30, 12).number, 1);
        assert_eq!(PageRequest::resolve(Some(""), 30, 12).number, 1);
    }

    #[test]
    fn test_out_of_range_page_is_last() {
        assert_eq!(PageRequest::resolve(Some("99"), 30, 12).number, 3);
        assert_eq!(PageRequest::resolve(Some("0"), 30, 12).number, 3);
        assert_eq!(PageRequest::resolve(Some("-1"), 30, 12).number, 3);
    }

    #[test]
    fn test_empty_result_has_one_page() {
        let request = PageRequest::resolve(Some("5"), 0, 12);
        assert_eq!(request.number, 1);
        assert_eq!(request.num_pages, 1);
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn test_page_flags() {
        let request = PageRequest::resolve(Some("2"), 30, 12);
        let page = Page::new(vec![1, 2, 3], request, 30);
        assert!(page.has_previous);
        assert!(page.has_next);
        assert_eq!(page.items, vec![1, 2, 3]);
    }
}
