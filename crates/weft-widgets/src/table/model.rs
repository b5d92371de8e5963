#![forbid(unsafe_code)]

//! The abstract table model and the list-backed stock model.

use std::cmp::Ordering;

use bitflags::bitflags;
use tracing::warn;

use weft_signal::Signal;
use weft_text::RichText;

bitflags! {
    /// Per-cell capabilities reported by a model.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ItemFlags: u8 {
        /// The cell responds to interaction.
        const ENABLED    = 0b001;
        /// The cell accepts in-place editing.
        const EDITABLE   = 0b010;
        /// The cell participates in selections.
        const SELECTABLE = 0b100;
    }
}

impl Default for ItemFlags {
    fn default() -> Self {
        Self::ENABLED | Self::SELECTABLE
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

impl SortOrder {
    /// The opposite order.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// Header axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderOrientation {
    /// The column header strip along the top.
    Horizontal,
    /// The row header strip along the left.
    Vertical,
}

/// A rectangular region of cells (for change notifications).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRegion {
    /// First row.
    pub row: usize,
    /// First column.
    pub col: usize,
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
}

impl TableRegion {
    /// A single-cell region.
    #[must_use]
    pub const fn cell(row: usize, col: usize) -> Self {
        Self {
            row,
            col,
            rows: 1,
            cols: 1,
        }
    }
}

/// A model cell value: a tagged sum routing each variant to the
/// matching editor and sort comparator.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CellValue {
    /// Empty cell.
    #[default]
    None,
    /// Integer value (numeric spin editor).
    Int(i64),
    /// Floating-point value (numeric spin editor).
    Float(f64),
    /// Plain text (single-line editor).
    Text(String),
    /// Rich text (multi-line rich editor).
    Rich(RichText),
}

impl CellValue {
    /// Rendered form for display.
    #[must_use]
    pub fn to_rich(&self) -> RichText {
        match self {
            Self::None => RichText::new(),
            Self::Int(v) => RichText::raw(&v.to_string()),
            Self::Float(v) => RichText::raw(&v.to_string()),
            Self::Text(s) => RichText::raw(s),
            Self::Rich(r) => r.clone(),
        }
    }

    /// Plain-text form (for clipboard text and string comparison).
    #[must_use]
    pub fn to_plain(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::Int(v) => v.to_string(),
            Self::Float(v) => v.to_string(),
            Self::Text(s) => s.clone(),
            Self::Rich(r) => r.to_plain(),
        }
    }

    /// Numeric interpretation, if any. Text that parses as a number
    /// counts.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Rich(r) => r.to_plain().trim().parse().ok(),
            Self::None => None,
        }
    }

    /// Check for the empty value.
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Sort comparator: numeric when both sides are numbers, stable
    /// string comparison otherwise.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            _ => self.to_plain().cmp(&other.to_plain()),
        }
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<RichText> for CellValue {
    fn from(v: RichText) -> Self {
        Self::Rich(v)
    }
}

/// Change-notification signals every model embeds.
#[derive(Debug, Default)]
pub struct TableModelSignals {
    /// Cell contents changed in the given region.
    pub data_changed: Signal<TableRegion>,
    /// The model shape or ordering changed wholesale.
    pub model_changed: Signal<()>,
}

/// The abstract table model contract.
///
/// Out-of-range accesses return sentinels and log at WARN; they never
/// panic. Structural operations default to unsupported (`false`).
#[allow(unused_variables)]
pub trait TableModel {
    /// Number of rows.
    fn row_count(&self) -> usize;

    /// Number of columns.
    fn column_count(&self) -> usize;

    /// Cell value at `(row, col)`.
    fn data(&self, row: usize, col: usize) -> CellValue;

    /// Store a value. Returns `false` when rejected.
    fn set_data(&mut self, row: usize, col: usize, value: CellValue) -> bool {
        false
    }

    /// Capabilities of a cell.
    fn flags(&self, row: usize, col: usize) -> ItemFlags {
        ItemFlags::default() | ItemFlags::EDITABLE
    }

    /// Header label for a row or column.
    fn header_data(&self, index: usize, orientation: HeaderOrientation) -> RichText {
        let _ = orientation;
        RichText::raw(&(index + 1).to_string())
    }

    /// Sort by `column` (`-1` restores the original order).
    fn sort(&mut self, column: i32, order: SortOrder) {}

    /// Insert `count` rows before `row`. Returns `false` when
    /// unsupported.
    fn insert_rows(&mut self, row: usize, count: usize) -> bool {
        warn!(row, count, "model does not support row insertion");
        false
    }

    /// Remove `count` rows starting at `row`.
    fn remove_rows(&mut self, row: usize, count: usize) -> bool {
        warn!(row, count, "model does not support row removal");
        false
    }

    /// Insert `count` columns before `col`.
    fn insert_columns(&mut self, col: usize, count: usize) -> bool {
        warn!(col, count, "model does not support column insertion");
        false
    }

    /// Remove `count` columns starting at `col`.
    fn remove_columns(&mut self, col: usize, count: usize) -> bool {
        warn!(col, count, "model does not support column removal");
        false
    }

    /// The model's change signals.
    fn signals(&self) -> &TableModelSignals;
}

/// A `Vec`-of-rows backed model with full sorting support.
///
/// Each row keeps an insertion identity so `sort(-1, ..)` restores the
/// original order exactly, edits included.
pub struct TableList {
    rows: Vec<(usize, Vec<CellValue>)>,
    cols: usize,
    next_identity: usize,
    signals: TableModelSignals,
}

impl TableList {
    /// Build from rows of values.
    #[must_use]
    pub fn new(data: Vec<Vec<CellValue>>) -> Self {
        let cols = data.iter().map(Vec::len).max().unwrap_or(0);
        let rows: Vec<(usize, Vec<CellValue>)> = data.into_iter().enumerate().collect();
        let next_identity = rows.len();
        Self {
            rows,
            cols,
            next_identity,
            signals: TableModelSignals::default(),
        }
    }

    /// Build from anything convertible to cell values.
    #[must_use]
    pub fn from_rows<V: Into<CellValue>>(data: Vec<Vec<V>>) -> Self {
        Self::new(
            data.into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        )
    }

    /// Append one row.
    pub fn push_row(&mut self, row: Vec<CellValue>) {
        self.cols = self.cols.max(row.len());
        self.rows.push((self.next_identity, row));
        self.next_identity += 1;
        self.signals.model_changed.emit_unit();
    }
}

impl TableModel for TableList {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_count(&self) -> usize {
        self.cols
    }

    fn data(&self, row: usize, col: usize) -> CellValue {
        match self.rows.get(row).and_then(|(_, r)| r.get(col)) {
            Some(v) => v.clone(),
            None => {
                warn!(row, col, "data access out of range");
                CellValue::None
            }
        }
    }

    fn set_data(&mut self, row: usize, col: usize, value: CellValue) -> bool {
        if col >= self.cols {
            warn!(row, col, "set_data column out of range");
            return false;
        }
        let Some((_, cells)) = self.rows.get_mut(row) else {
            warn!(row, col, "set_data row out of range");
            return false;
        };
        if cells.len() <= col {
            cells.resize(col + 1, CellValue::None);
        }
        if cells[col] == value {
            return true;
        }
        cells[col] = value;
        self.signals.data_changed.emit(&TableRegion::cell(row, col));
        true
    }

    fn sort(&mut self, column: i32, order: SortOrder) {
        if column < 0 {
            self.rows.sort_by_key(|(identity, _)| *identity);
        } else {
            let col = column as usize;
            // Stable sort keeps equal keys in their prior order.
            self.rows.sort_by(|(_, a), (_, b)| {
                let av = a.get(col).cloned().unwrap_or(CellValue::None);
                let bv = b.get(col).cloned().unwrap_or(CellValue::None);
                let ord = av.compare(&bv);
                match order {
                    SortOrder::Ascending => ord,
                    SortOrder::Descending => ord.reverse(),
                }
            });
        }
        self.signals.model_changed.emit_unit();
    }

    fn insert_rows(&mut self, row: usize, count: usize) -> bool {
        if row > self.rows.len() {
            warn!(row, "insert_rows out of range");
            return false;
        }
        for i in 0..count {
            self.rows.insert(
                row + i,
                (self.next_identity, vec![CellValue::None; self.cols]),
            );
            self.next_identity += 1;
        }
        self.signals.model_changed.emit_unit();
        true
    }

    fn remove_rows(&mut self, row: usize, count: usize) -> bool {
        if row + count > self.rows.len() {
            warn!(row, count, "remove_rows out of range");
            return false;
        }
        self.rows.drain(row..row + count);
        self.signals.model_changed.emit_unit();
        true
    }

    fn insert_columns(&mut self, col: usize, count: usize) -> bool {
        if col > self.cols {
            warn!(col, "insert_columns out of range");
            return false;
        }
        for (_, cells) in &mut self.rows {
            if cells.len() < col {
                cells.resize(col, CellValue::None);
            }
            for i in 0..count {
                cells.insert(col + i, CellValue::None);
            }
        }
        self.cols += count;
        self.signals.model_changed.emit_unit();
        true
    }

    fn remove_columns(&mut self, col: usize, count: usize) -> bool {
        if col + count > self.cols {
            warn!(col, count, "remove_columns out of range");
            return false;
        }
        for (_, cells) in &mut self.rows {
            if cells.len() > col {
                let end = (col + count).min(cells.len());
                cells.drain(col..end);
            }
        }
        self.cols -= count;
        self.signals.model_changed.emit_unit();
        true
    }

    fn signals(&self) -> &TableModelSignals {
        &self.signals
    }
}
