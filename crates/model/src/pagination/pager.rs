use crate::pagination::cursor::{Cursor, PageResult};

/// Drives one logical paginated query.
///
/// The pager owns the cursor between fetches; the fetch itself stays with
/// the caller as a closure over `(cursor, page_size)`. An exhausted pager
/// returns empty pages without invoking the closure, so repeating the call
/// never re-issues the underlying query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pager {
    cursor: Cursor,
    page_size: u64,
}

impl Pager {
    pub fn new(page_size: u64) -> Self {
        Pager {
            cursor: Cursor::Fresh,
            page_size,
        }
    }

    /// Resumes paging from a previously encoded cursor.
    pub fn resume(cursor: Cursor, page_size: u64) -> Self {
        Pager { cursor, page_size }
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor.is_exhausted()
    }

    /// Fetches one page and advances the cursor.
    pub fn fetch_with<T, F>(&mut self, fetch: F) -> Vec<T>
    where
        F: FnOnce(&Cursor, u64) -> (Vec<T>, PageResult),
    {
        if self.cursor.is_exhausted() {
            return Vec::new();
        }
        let (rows, page) = fetch(&self.cursor, self.page_size);
        self.cursor = self.cursor.advance(self.page_size, &page);
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::cursor::Continuation;

    /// Offset-paged fake backend over `total` numbered rows.
    fn fetch_page(total: usize, cursor: &Cursor, page_size: u64) -> (Vec<usize>, PageResult) {
        let offset = match cursor {
            Cursor::Active(Continuation::Offset(n)) => *n as usize,
            _ => 0,
        };
        let end = total.min(offset + page_size as usize);
        let rows: Vec<usize> = (offset..end).collect();
        let page = PageResult::of(rows.len());
        (rows, page)
    }

    #[test]
    fn test_exact_page_count() {
        // 10 rows, pages of 3: 10/3 rounded up is 4 fetches.
        let mut pager = Pager::new(3);
        let mut fetches = 0;
        let mut seen = Vec::new();
        while !pager.is_exhausted() {
            let rows = pager.fetch_with(|cursor, size| fetch_page(10, cursor, size));
            seen.extend(rows);
            fetches += 1;
            assert!(fetches <= 4, "pager did not terminate");
        }
        assert_eq!(fetches, 4);
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_multiple_of_page_size_needs_trailing_empty_fetch() {
        // 6 rows, pages of 3: the third fetch returns 0 rows and exhausts.
        let mut pager = Pager::new(3);
        let mut fetches = 0;
        while !pager.is_exhausted() {
            pager.fetch_with(|cursor, size| fetch_page(6, cursor, size));
            fetches += 1;
        }
        assert_eq!(fetches, 3);
    }

    #[test]
    fn test_exhausted_fetch_returns_empty_without_querying() {
        let mut pager = Pager::resume(Cursor::Exhausted, 3);
        let rows = pager.fetch_with(|_, _| -> (Vec<usize>, PageResult) {
            panic!("exhausted pager must not call the backend");
        });
        assert!(rows.is_empty());
        assert!(pager.is_exhausted());
    }

    #[test]
    fn test_resume_from_encoded_cursor() {
        let mut pager = Pager::new(4);
        pager.fetch_with(|cursor, size| fetch_page(10, cursor, size));
        let wire = pager.cursor().encode().unwrap();

        let resumed_cursor = Cursor::decode(&wire).unwrap();
        let mut resumed = Pager::resume(resumed_cursor, 4);
        let rows = resumed.fetch_with(|cursor, size| fetch_page(10, cursor, size));
        assert_eq!(rows, vec![4, 5, 6, 7]);
    }
}
