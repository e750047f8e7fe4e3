//! Page windows and keyset page info.
//!
//! A page is anchored at a block number and extends `before` blocks backward
//! or `after` blocks forward. Page info is computed from the window the caller
//! asked for and the entities that actually came back, never from shared
//! state.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::cursor;
use crate::error::QueryError;
use crate::types::Paged;

// ─── PageDirection ────────────────────────────────────────────────────────────

/// Scan direction together with the page length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageDirection {
    /// `before = n`: the `n` blocks preceding the anchor.
    Backward(u64),
    /// `after = n`: the anchor and the `n - 1` blocks following it.
    Forward(u64),
}

impl PageDirection {
    /// Derive the direction from raw `before`/`after` counts.
    ///
    /// Exactly one must be set. A zero count is treated as absent.
    pub fn from_counts(before: Option<u64>, after: Option<u64>) -> Result<Self, QueryError> {
        match (before.filter(|n| *n > 0), after.filter(|n| *n > 0)) {
            (Some(_), Some(_)) => Err(QueryError::argument(
                "cannot page in 2 directions: specify either before or after",
            )),
            (Some(n), None) => Ok(Self::Backward(n)),
            (None, Some(n)) => Ok(Self::Forward(n)),
            (None, None) => Err(QueryError::argument(
                "expected exactly one of before/after in a paged query",
            )),
        }
    }

    /// Number of blocks the window spans.
    pub fn len(&self) -> u64 {
        match self {
            Self::Backward(n) | Self::Forward(n) => *n,
        }
    }

    pub fn is_forward(&self) -> bool {
        matches!(self, Self::Forward(_))
    }
}

// ─── PageWindow ───────────────────────────────────────────────────────────────

/// A contiguous span of block numbers implied by an anchor and a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageWindow {
    pub anchor: u64,
    pub direction: PageDirection,
}

impl PageWindow {
    pub fn new(anchor: u64, direction: PageDirection) -> Self {
        Self { anchor, direction }
    }

    /// Block numbers in the window, half-open on the far end.
    ///
    /// Backward: `[anchor - before, anchor)`, clamped at genesis.
    /// Forward: `[anchor, anchor + after)`.
    pub fn range(&self) -> Range<u64> {
        match self.direction {
            PageDirection::Backward(n) => self.anchor.saturating_sub(n)..self.anchor,
            PageDirection::Forward(n) => self.anchor..self.anchor.saturating_add(n),
        }
    }

    /// Forward continuation check against an observed chain head: the page
    /// has more only if `anchor + after` is at or below `boundary`.
    ///
    /// Point-in-time only; the head can move before the caller follows the
    /// cursor.
    pub fn next_window_below(&self, boundary: u64) -> bool {
        match self.direction {
            PageDirection::Forward(n) => self
                .anchor
                .checked_add(n)
                .map_or(false, |end| end <= boundary),
            PageDirection::Backward(_) => false,
        }
    }
}

// ─── PageInfo ─────────────────────────────────────────────────────────────────

/// Pagination metadata. A forward page never carries `hasPreviousPage` and a
/// backward page never carries `hasNextPage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum PageInfo {
    Forward {
        start_cursor: String,
        end_cursor: String,
        has_next_page: bool,
    },
    Backward {
        start_cursor: String,
        end_cursor: String,
        has_previous_page: bool,
    },
}

impl PageInfo {
    /// Sentinel for a page where nothing resolved: empty cursors, no continuation.
    pub fn empty(direction: PageDirection) -> Self {
        match direction {
            PageDirection::Forward(_) => Self::Forward {
                start_cursor: String::new(),
                end_cursor: String::new(),
                has_next_page: false,
            },
            PageDirection::Backward(_) => Self::Backward {
                start_cursor: String::new(),
                end_cursor: String::new(),
                has_previous_page: false,
            },
        }
    }

    pub fn start_cursor(&self) -> &str {
        match self {
            Self::Forward { start_cursor, .. } | Self::Backward { start_cursor, .. } => {
                start_cursor
            }
        }
    }

    pub fn end_cursor(&self) -> &str {
        match self {
            Self::Forward { end_cursor, .. } | Self::Backward { end_cursor, .. } => end_cursor,
        }
    }

    /// Whether the caller can keep paging in the direction it came from.
    pub fn has_more(&self) -> bool {
        match self {
            Self::Forward { has_next_page, .. } => *has_next_page,
            Self::Backward {
                has_previous_page, ..
            } => *has_previous_page,
        }
    }
}

/// Build page info for `results` fetched in `direction`.
///
/// `has_more` is only consulted for forward pages and is called at most once.
/// The forward end cursor points one past the highest block so that resuming
/// from it continues right after this page.
pub fn build_page_info<T, F>(
    direction: PageDirection,
    results: &[T],
    has_more: F,
) -> Result<PageInfo, QueryError>
where
    T: Paged,
    F: FnOnce() -> bool,
{
    let numbers = results.iter().map(Paged::block_number);
    let (lo, hi) = match (numbers.clone().min(), numbers.max()) {
        (Some(lo), Some(hi)) => (lo, hi),
        _ => return Ok(PageInfo::empty(direction)),
    };

    let start_cursor = cursor::encode(results, &lo.to_string())?;
    match direction {
        // NOTE: no check against genesis; a backward page always reports a
        // previous page, even when it starts at block 0.
        PageDirection::Backward(_) => Ok(PageInfo::Backward {
            start_cursor,
            end_cursor: cursor::encode(results, &hi.to_string())?,
            has_previous_page: true,
        }),
        PageDirection::Forward(_) => Ok(PageInfo::Forward {
            start_cursor,
            end_cursor: cursor::encode(results, &hi.saturating_add(1).to_string())?,
            has_next_page: has_more(),
        }),
    }
}

// ─── ResolvedPage ─────────────────────────────────────────────────────────────

/// One page of resolved entities plus its pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPage<T> {
    pub items: Vec<T>,
    pub page_info: PageInfo,
}

impl<T> ResolvedPage<T> {
    pub fn new(items: Vec<T>, page_info: PageInfo) -> Self {
        Self { items, page_info }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
