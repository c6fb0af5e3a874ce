//! Skip/limit pagination for list operations

/// Page size used when the caller gives none
pub const DEFAULT_LIMIT: i64 = 12;

/// Largest page a caller may request
pub const MAX_LIMIT: i64 = 100;

/// Sanitized skip/limit pair, ready for `LIMIT ? OFFSET ?`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Rows to skip (OFFSET)
    pub skip: i64,
    /// Rows to return (LIMIT)
    pub limit: i64,
}

impl Page {
    /// Clamp a requested page
    ///
    /// Negative skips become 0; limits are clamped to [1, MAX_LIMIT].
    ///
    /// # Examples
    /// ```
    /// use cmm_catalog::pagination::Page;
    ///
    /// let p = Page::new(-5, 1000);
    /// assert_eq!(p.skip, 0);
    /// assert_eq!(p.limit, 100);
    /// ```
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip: skip.max(0),
            limit: limit.clamp(1, MAX_LIMIT),
        }
    }

    /// Same as [`Page::new`] with optional inputs
    pub fn from_query(skip: Option<i64>, limit: Option<i64>, default_limit: i64) -> Self {
        Self::new(skip.unwrap_or(0), limit.unwrap_or(default_limit))
    }

    /// Number of pages needed for `total` rows at this page size
    pub fn total_pages(&self, total: i64) -> i64 {
        (total + self.limit - 1) / self.limit
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(0, DEFAULT_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_page() {
        let p = Page::default();
        assert_eq!(p, Page { skip: 0, limit: 12 });
    }

    #[test]
    fn test_zero_limit_clamped_to_one() {
        assert_eq!(Page::new(3, 0).limit, 1);
    }

    #[test]
    fn test_from_query_uses_default_limit() {
        let p = Page::from_query(Some(40), None, 20);
        assert_eq!(p, Page { skip: 40, limit: 20 });
    }

    #[test]
    fn test_total_pages() {
        let p = Page::new(0, 20);
        assert_eq!(p.total_pages(0), 0);
        assert_eq!(p.total_pages(20), 1);
        assert_eq!(p.total_pages(21), 2);
    }
}
