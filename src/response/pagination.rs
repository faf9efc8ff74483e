use crate::{FredError, Result};

/// An `(offset, limit)` slice applied to a preview. Exports never paginate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: usize,
    pub limit: usize,
}

/// The rows selected by a [`Window`] together with the size of the full result
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a, T> {
    pub rows: &'a [T],
    pub total: usize,
}

impl Window {
    /// Build a window from caller-supplied integers. Negative values are
    /// rejected, zero is allowed.
    #[inline]
    pub fn new(offset: i64, limit: i64) -> Result<Self> {
        let offset = usize::try_from(offset).map_err(|_| {
            FredError::Validation(format!("offset must be zero or greater, got {offset}"))
        })?;
        let limit = usize::try_from(limit).map_err(|_| {
            FredError::Validation(format!("limit must be zero or greater, got {limit}"))
        })?;
        Ok(Self { offset, limit })
    }
}

impl<T> Page<'_, T> {
    #[inline]
    pub fn shown(&self) -> usize {
        self.rows.len()
    }
}

/// Select rows `[offset, offset + limit)`, clamped to the rows available.
/// An offset past the end yields an empty page.
#[inline]
pub fn paginate<T>(rows: &[T], window: Window) -> Page<'_, T> {
    let start = window.offset.min(rows.len());
    let end = start.saturating_add(window.limit).min(rows.len());
    Page {
        rows: &rows[start..end],
        total: rows.len(),
    }
}
