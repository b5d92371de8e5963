#![forbid(unsafe_code)]

//! The cell-selection proxy.
//!
//! A 2-D bitmap of selected cells plus the current cell. Batch
//! operations consult the model's flags (through a caller-supplied
//! predicate) to skip non-selectable cells.

use super::model::ItemFlags;

/// Batch selection operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionFlag {
    /// Add the region to the selection.
    Select,
    /// Remove the region from the selection.
    Deselect,
    /// Clear everything, then select the region.
    Clear,
}

/// The table's selection bitmap and current cell.
#[derive(Debug, Clone, Default)]
pub struct SelectionProxy {
    rows: usize,
    cols: usize,
    bits: Vec<u64>,
    current: Option<(usize, usize)>,
}

impl SelectionProxy {
    /// Create an empty proxy for a `rows x cols` table.
    #[must_use]
    pub fn new(rows: usize, cols: usize) -> Self {
        let words = (rows * cols).div_ceil(64);
        Self {
            rows,
            cols,
            bits: vec![0; words],
            current: None,
        }
    }

    /// Resize to new model dimensions, clearing the selection.
    pub fn reset(&mut self, rows: usize, cols: usize) {
        *self = Self::new(rows, cols);
    }

    /// Table dimensions this proxy covers.
    #[must_use]
    pub const fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// The current cell `(row, col)`.
    #[must_use]
    pub const fn current(&self) -> Option<(usize, usize)> {
        self.current
    }

    /// Move the current cell.
    pub fn set_current(&mut self, cell: Option<(usize, usize)>) {
        self.current = cell.filter(|&(r, c)| r < self.rows && c < self.cols);
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then_some(row * self.cols + col)
    }

    /// Check a single cell.
    #[must_use]
    pub fn is_selected(&self, row: usize, col: usize) -> bool {
        match self.index(row, col) {
            Some(i) => self.bits[i / 64] & (1u64 << (i % 64)) != 0,
            None => false,
        }
    }

    /// Mark a single cell.
    pub fn set(&mut self, row: usize, col: usize, selected: bool) {
        if let Some(i) = self.index(row, col) {
            if selected {
                self.bits[i / 64] |= 1u64 << (i % 64);
            } else {
                self.bits[i / 64] &= !(1u64 << (i % 64));
            }
        }
    }

    /// Clear the whole bitmap.
    pub fn clear(&mut self) {
        self.bits.fill(0);
    }

    /// Check whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&w| w == 0)
    }

    /// Apply a batch operation over a rectangle.
    ///
    /// `selectable` reports each cell's model flags; cells lacking
    /// `SELECTABLE` are skipped.
    pub fn set_selection(
        &mut self,
        pos: (usize, usize),
        size: (usize, usize),
        flag: SelectionFlag,
        mut flags: impl FnMut(usize, usize) -> ItemFlags,
    ) {
        if flag == SelectionFlag::Clear {
            self.clear();
        }
        let select = !matches!(flag, SelectionFlag::Deselect);
        let (row0, col0) = pos;
        let (rows, cols) = size;
        for row in row0..(row0 + rows).min(self.rows) {
            for col in col0..(col0 + cols).min(self.cols) {
                if !flags(row, col).contains(ItemFlags::SELECTABLE) {
                    continue;
                }
                self.set(row, col, select);
            }
        }
    }

    /// Select every selectable cell.
    pub fn select_all(&mut self, flags: impl FnMut(usize, usize) -> ItemFlags) {
        self.set_selection((0, 0), (self.rows, self.cols), SelectionFlag::Select, flags);
    }

    /// `true` iff every selectable cell in the row is selected.
    #[must_use]
    pub fn is_row_selected(
        &self,
        row: usize,
        mut flags: impl FnMut(usize, usize) -> ItemFlags,
    ) -> bool {
        (0..self.cols).all(|col| {
            !flags(row, col).contains(ItemFlags::SELECTABLE) || self.is_selected(row, col)
        })
    }

    /// `true` iff every selectable cell in the column is selected.
    #[must_use]
    pub fn is_col_selected(
        &self,
        col: usize,
        mut flags: impl FnMut(usize, usize) -> ItemFlags,
    ) -> bool {
        (0..self.rows).all(|row| {
            !flags(row, col).contains(ItemFlags::SELECTABLE) || self.is_selected(row, col)
        })
    }

    /// Iterate selected cells, row-major.
    pub fn iter_selected(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.rows)
            .flat_map(move |r| (0..self.cols).map(move |c| (r, c)))
            .filter(|&(r, c)| self.is_selected(r, c))
    }

    /// Rows containing at least one selected cell, ascending.
    #[must_use]
    pub fn selected_rows(&self) -> Vec<usize> {
        (0..self.rows)
            .filter(|&r| (0..self.cols).any(|c| self.is_selected(r, c)))
            .collect()
    }

    /// Bounding box of the selection: `(pos, size)`.
    #[must_use]
    pub fn bounding_box(&self) -> Option<((usize, usize), (usize, usize))> {
        let mut min_r = usize::MAX;
        let mut min_c = usize::MAX;
        let mut max_r = 0usize;
        let mut max_c = 0usize;
        let mut any = false;
        for (r, c) in self.iter_selected() {
            any = true;
            min_r = min_r.min(r);
            min_c = min_c.min(c);
            max_r = max_r.max(r);
            max_c = max_c.max(c);
        }
        any.then(|| ((min_r, min_c), (max_r - min_r + 1, max_c - min_c + 1)))
    }
}
