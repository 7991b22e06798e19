//! Page-size resolution, page windows and ownership counts

use serde::Serialize;
use std::fmt;

use crate::core::error::EngineResult;
use crate::core::session::Session;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Interpret a raw request value as a positive integer
pub fn positive(value: Option<i64>) -> Option<u32> {
    value
        .filter(|v| *v > 0)
        .map(|v| u32::try_from(v).unwrap_or(u32::MAX))
}

/// Requested page number, never below 1
pub fn page_number(requested: Option<i64>) -> u32 {
    positive(requested).unwrap_or(1)
}

/// Resolve the page size: request, then session, then configured default
///
/// A positive request value is also written back to the session.
pub fn resolve_page_size(
    requested: Option<i64>,
    session: &Session<'_>,
    configured: u32,
) -> EngineResult<u32> {
    if let Some(size) = positive(requested) {
        session.set_per_page(size)?;
        return Ok(size);
    }
    if let Some(size) = session.per_page()? {
        return Ok(size);
    }
    Ok(if configured > 0 {
        configured
    } else {
        DEFAULT_PAGE_SIZE
    })
}

/// Totals over the filtered source, ignoring pagination
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub total: usize,
    pub mine: usize,
    pub not_mine: usize,
}

impl Counts {
    pub fn split(total: usize, mine: usize) -> Self {
        Self {
            total,
            mine,
            not_mine: total.saturating_sub(mine),
        }
    }
}

/// 1-based record range shown on a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecordWindow {
    pub from: usize,
    pub to: usize,
    pub total: usize,
}

impl RecordWindow {
    /// `None` for an empty source or a page past the end
    pub fn for_page(page: u32, per_page: u32, total: usize) -> Option<Self> {
        let page = page.max(1) as usize;
        let per_page = per_page.max(1) as usize;
        let from = (page - 1) * per_page + 1;
        let to = (page * per_page).min(total);
        if total == 0 || from > to {
            return None;
        }
        Some(Self { from, to, total })
    }
}

impl fmt::Display for RecordWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Records {} - {} of {}",
            thousands(self.from),
            thousands(self.to),
            thousands(self.total)
        )
    }
}

/// Last page number for `total` rows, at least 1
pub fn last_page(total: usize, per_page: u32) -> u32 {
    let per_page = per_page.max(1) as usize;
    let pages = total.div_ceil(per_page).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Format with `,` thousands separators
pub fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kv::MemoryKv;

    #[test]
    fn test_request_size_is_persisted() {
        let kv = MemoryKv::new();
        let session = Session::new("s1", &kv, 60);

        assert_eq!(resolve_page_size(Some(25), &session, 10).unwrap(), 25);
        assert_eq!(resolve_page_size(None, &session, 10).unwrap(), 25);
    }

    #[test]
    fn test_non_positive_request_falls_through() {
        let kv = MemoryKv::new();
        let session = Session::new("s1", &kv, 60);

        assert_eq!(resolve_page_size(Some(0), &session, 15).unwrap(), 15);
        assert_eq!(resolve_page_size(Some(-3), &session, 0).unwrap(), DEFAULT_PAGE_SIZE);
        assert_eq!(session.per_page().unwrap(), None);
    }

    #[test]
    fn test_page_number_clamped() {
        assert_eq!(page_number(None), 1);
        assert_eq!(page_number(Some(0)), 1);
        assert_eq!(page_number(Some(-2)), 1);
        assert_eq!(page_number(Some(4)), 4);
    }

    #[test]
    fn test_counts_split() {
        let counts = Counts::split(1234, 1000);
        assert_eq!(counts.not_mine, 234);
        assert_eq!(counts.mine + counts.not_mine, counts.total);
    }

    #[test]
    fn test_record_window_label() {
        let window = RecordWindow::for_page(2, 10, 1234).unwrap();
        assert_eq!((window.from, window.to), (11, 20));
        assert_eq!(window.to_string(), "Records 11 - 20 of 1,234");

        let last = RecordWindow::for_page(124, 10, 1234).unwrap();
        assert_eq!((last.from, last.to), (1231, 1234));
    }

    #[test]
    fn test_record_window_absent() {
        assert_eq!(RecordWindow::for_page(1, 10, 0), None);
        assert_eq!(RecordWindow::for_page(5, 10, 12), None);
    }

    #[test]
    fn test_last_page() {
        assert_eq!(last_page(0, 10), 1);
        assert_eq!(last_page(10, 10), 1);
        assert_eq!(last_page(11, 10), 2);
    }

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(1234567), "1,234,567");
    }
}
