//! Opaque pagination cursors and their pure transition function.

use crate::pagination::error::PagingError;
use serde::{Deserialize, Serialize};

/// Backend-specific continuation data carried by an active cursor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Continuation {
    /// Row offset for targets that page by skipping.
    Offset(u64),

    /// Bookmark string returned by REST find endpoints.
    Bookmark(String),

    /// Raw paging-state bytes returned by wide-column stores.
    PagingState(Vec<u8>),

    /// Serialized last-evaluated-key map returned by scan targets.
    LastKey(String),
}

/// The pagination state of one logical query.
///
/// Cursors are plain values: callers thread them through
/// [`Cursor::advance`], nothing mutates in place. Equality and hashing
/// cover state and payload, so resuming with an equal cursor requests the
/// same page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cursor {
    /// No page fetched yet.
    #[default]
    Fresh,

    /// At least one page fetched, more data expected.
    Active(Continuation),

    /// A previous fetch ended the result set. Terminal.
    Exhausted,
}

/// What one backend fetch reported back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageResult {
    /// Rows returned by this fetch.
    pub row_count: usize,

    /// Continuation handed back by the backend, if it produces one.
    pub next: Option<Continuation>,

    /// True when the backend explicitly signalled the end of the result set.
    pub reached_end: bool,
}

impl PageResult {
    pub fn of(row_count: usize) -> Self {
        PageResult {
            row_count,
            next: None,
            reached_end: false,
        }
    }

    pub fn with_next(row_count: usize, next: Continuation) -> Self {
        PageResult {
            row_count,
            next: Some(next),
            reached_end: false,
        }
    }

    pub fn end(row_count: usize) -> Self {
        PageResult {
            row_count,
            next: None,
            reached_end: true,
        }
    }
}

impl Cursor {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Cursor::Exhausted)
    }

    /// Pure transition after one page fetch.
    ///
    /// A short page or an explicit end-of-data signal exhausts the cursor.
    /// Otherwise the backend continuation wins; targets without one fall
    /// into the offset family, which accumulates the rows seen so far.
    pub fn advance(&self, page_size: u64, page: &PageResult) -> Cursor {
        if self.is_exhausted() {
            return Cursor::Exhausted;
        }
        if page.reached_end || (page.row_count as u64) < page_size {
            return Cursor::Exhausted;
        }
        if let Some(next) = &page.next {
            return Cursor::Active(next.clone());
        }
        let prior = match self {
            Cursor::Active(Continuation::Offset(offset)) => *offset,
            _ => 0,
        };
        Cursor::Active(Continuation::Offset(prior + page.row_count as u64))
    }

    /// Serializes the cursor to a wire-transportable string.
    pub fn encode(&self) -> Result<String, PagingError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Inverse of [`Cursor::encode`]; round-trips byte-for-byte.
    pub fn decode(raw: &str) -> Result<Self, PagingError> {
        Ok(serde_json::from_str(raw)?)
    }
}
