#![forbid(unsafe_code)]

//! The table view: a scroll-area viewport over an abstract
//! [`TableModel`].
//!
//! State held here: the column right-edge and row bottom-edge arrays
//! (monotonically increasing separator positions in content
//! coordinates), separator visibility flags, the current cell, the
//! selection proxy, the drag rectangle, the hover cell, a separator
//! grab for column resizing, the sort column/order, the in-place cell
//! editor, and the undo history.

use weft_canvas::Canvas;
use weft_core::event::{KeyCode, KeyEvent, Modifiers, MouseButton, MouseEvent, MouseEventKind};
use weft_core::geometry::{Point, Size};
use weft_signal::Signal;
use weft_style::Color;
use weft_text::{Alignment, RichText};

use crate::scroll::{ScrollContainer, Viewport};
use crate::widget::{ClipboardData, EventCtx, WidgetCore};

use super::model::{CellValue, HeaderOrientation, ItemFlags, SortOrder, TableModel};
use super::selection::{SelectionFlag, SelectionProxy};
use super::undo::{CellChange, Snapshot, UndoHistory};

/// A table widget: the view wrapped in its scroll area.
pub type Table = ScrollContainer<TableView>;

/// Build a table over a model.
#[must_use]
pub fn table(model: Box<dyn TableModel>) -> Table {
    ScrollContainer::new(TableView::new(model))
}

/// Default column width in cells.
const DEFAULT_COL_WIDTH: i32 = 10;

/// Column resize never drags separator `i` left of `(i + 1) *
/// MIN_COL_STRIDE`: the visual minimum is tied to the separator's
/// position, so every column keeps at least a sliver of content.
pub const MIN_COL_STRIDE: i32 = 4;

/// Padding added by resize-to-contents.
const RESIZE_PADDING: i32 = 1;

/// Fast-mode resize scans this many rows either side of the visible
/// middle.
const FAST_RESIZE_WINDOW: usize = 100;

/// Quadrant glyphs indexed by the selection bits of the four cells
/// meeting at a separator crossing: bit 0 = top-left, bit 1 =
/// top-right, bit 2 = bottom-left, bit 3 = bottom-right.
const QUADRANTS: [char; 16] = [
    ' ', '▘', '▝', '▀', '▖', '▌', '▞', '▛', '▗', '▚', '▐', '▜', '▄', '▙', '▟', '█',
];

/// Content-scan mode for resize-to-contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeMode {
    /// Scan every row.
    Exact,
    /// Scan a bounded window around the visible middle.
    Fast,
}

/// Colors used by the table renderer.
#[derive(Debug, Clone)]
pub struct TableStyle {
    /// Separator lines.
    pub line: Color,
    /// Header strips.
    pub header: Color,
    /// Selected cells.
    pub selected: Color,
    /// Hovered cell.
    pub hover: Color,
    /// The current cell.
    pub current: Color,
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            line: Color::fg("bright black"),
            header: Color::fgbg("#dddddd", "#444444").bold(),
            selected: Color::bg("#004488"),
            hover: Color::bg("#0066aa"),
            current: Color::bg("#0077cc"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditorKind {
    SpinInt,
    SpinFloat,
    Line,
    Multi,
}

#[derive(Debug, Clone)]
struct CellEditor {
    row: usize,
    col: usize,
    kind: EditorKind,
    text: String,
    /// Cursor as a char index into `text`.
    cursor: usize,
}

impl CellEditor {
    fn insert(&mut self, s: &str) {
        let byte = char_to_byte(&self.text, self.cursor);
        self.text.insert_str(byte, s);
        self.cursor += s.chars().count();
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let start = char_to_byte(&self.text, self.cursor - 1);
        let end = char_to_byte(&self.text, self.cursor);
        self.text.replace_range(start..end, "");
        self.cursor -= 1;
    }

    fn delete(&mut self) {
        let chars = self.text.chars().count();
        if self.cursor >= chars {
            return;
        }
        let start = char_to_byte(&self.text, self.cursor);
        let end = char_to_byte(&self.text, self.cursor + 1);
        self.text.replace_range(start..end, "");
    }

    fn accepts(&self, s: &str) -> bool {
        match self.kind {
            EditorKind::SpinInt => s
                .chars()
                .all(|c| c.is_ascii_digit() || (c == '-' && self.cursor == 0)),
            EditorKind::SpinFloat => s
                .chars()
                .all(|c| c.is_ascii_digit() || c == '.' || (c == '-' && self.cursor == 0)),
            EditorKind::Line | EditorKind::Multi => !s.chars().any(char::is_control),
        }
    }

    fn value(&self, previous: &CellValue) -> CellValue {
        match self.kind {
            EditorKind::SpinInt => self
                .text
                .trim()
                .parse::<i64>()
                .map(CellValue::Int)
                .unwrap_or_else(|_| previous.clone()),
            EditorKind::SpinFloat => self
                .text
                .trim()
                .parse::<f64>()
                .map(CellValue::Float)
                .unwrap_or_else(|_| previous.clone()),
            EditorKind::Line => CellValue::Text(self.text.clone()),
            EditorKind::Multi => CellValue::Rich(RichText::raw(&self.text)),
        }
    }

    fn step(&mut self, delta: i64) {
        match self.kind {
            EditorKind::SpinInt => {
                let v: i64 = self.text.trim().parse().unwrap_or(0);
                self.text = (v + delta).to_string();
                self.cursor = self.text.chars().count();
            }
            EditorKind::SpinFloat => {
                let v: f64 = self.text.trim().parse().unwrap_or(0.0);
                self.text = (v + delta as f64).to_string();
                self.cursor = self.text.chars().count();
            }
            _ => {}
        }
    }
}

fn char_to_byte(s: &str, idx: usize) -> usize {
    s.char_indices()
        .nth(idx)
        .map(|(b, _)| b)
        .unwrap_or(s.len())
}

/// The scrollable table viewport.
pub struct TableView {
    model: Box<dyn TableModel>,
    /// Column separator positions, strictly increasing.
    col_edges: Vec<i32>,
    /// Row separator positions, strictly increasing.
    row_edges: Vec<i32>,
    show_h_separators: bool,
    show_v_separators: bool,
    show_h_header: bool,
    show_v_header: bool,
    sorting_enabled: bool,
    sort_col: i32,
    sort_order: SortOrder,
    selection: SelectionProxy,
    drag_start: Option<(usize, usize)>,
    hover: Option<(i32, i32)>,
    sep_grab: Option<usize>,
    editor: Option<CellEditor>,
    undo: UndoHistory,
    style: TableStyle,
    /// Last paint's offset and displayed size (for fast-mode resize
    /// and page navigation).
    last_offset: Point,
    last_displayed: Size,
    /// Emitted when a cell's value is committed through the view.
    pub cell_changed: Signal<(usize, usize)>,
    /// Emitted when the current cell moves: `(row, col)`.
    pub current_changed: Signal<(usize, usize)>,
}

impl TableView {
    /// Create a view over a model.
    #[must_use]
    pub fn new(model: Box<dyn TableModel>) -> Self {
        let mut view = Self {
            model,
            col_edges: Vec::new(),
            row_edges: Vec::new(),
            show_h_separators: true,
            show_v_separators: true,
            show_h_header: true,
            show_v_header: true,
            sorting_enabled: true,
            sort_col: -1,
            sort_order: SortOrder::Ascending,
            selection: SelectionProxy::default(),
            drag_start: None,
            hover: None,
            sep_grab: None,
            editor: None,
            undo: UndoHistory::default(),
            style: TableStyle::default(),
            last_offset: Point::new(0, 0),
            last_displayed: Size::new(80, 24),
            cell_changed: Signal::new(),
            current_changed: Signal::new(),
        };
        view.rebuild_geometry();
        view
    }

    /// The model.
    #[must_use]
    pub fn model(&self) -> &dyn TableModel {
        self.model.as_ref()
    }

    /// Mutable model access.
    pub fn model_mut(&mut self) -> &mut dyn TableModel {
        self.model.as_mut()
    }

    /// The selection proxy.
    #[must_use]
    pub fn selection(&self) -> &SelectionProxy {
        &self.selection
    }

    /// Separator visibility.
    pub fn set_separator_visibility(&mut self, horizontal: bool, vertical: bool) {
        self.show_h_separators = horizontal;
        self.show_v_separators = vertical;
    }

    /// Header visibility.
    pub fn set_header_visibility(&mut self, horizontal: bool, vertical: bool) {
        self.show_h_header = horizontal;
        self.show_v_header = vertical;
    }

    /// Enable or disable header-click sorting.
    pub fn set_sorting_enabled(&mut self, enabled: bool) {
        self.sorting_enabled = enabled;
    }

    /// The current sort column (`-1` = unsorted) and order.
    #[must_use]
    pub fn sort_state(&self) -> (i32, SortOrder) {
        (self.sort_col, self.sort_order)
    }

    /// The current cell.
    #[must_use]
    pub fn current_cell(&self) -> Option<(usize, usize)> {
        self.selection.current()
    }

    /// Whether an in-place editor is open.
    #[must_use]
    pub fn is_editing(&self) -> bool {
        self.editor.is_some()
    }

    // --- geometry ---------------------------------------------------

    fn rebuild_geometry(&mut self) {
        let rows = self.model.row_count();
        let cols = self.model.column_count();
        self.col_edges = (0..cols)
            .map(|c| (c as i32 + 1) * (DEFAULT_COL_WIDTH + 1) - 1)
            .collect();
        self.row_edges = (0..rows).map(|r| (r as i32 + 1) * 2 - 1).collect();
        self.selection.reset(rows, cols);
    }

    /// Re-sync with the model after external shape changes; the edge
    /// arrays are only rebuilt when the counts moved.
    pub fn sync_with_model(&mut self) {
        if self.col_edges.len() != self.model.column_count()
            || self.row_edges.len() != self.model.row_count()
        {
            self.rebuild_geometry();
        }
    }

    fn header_sizes(&self) -> (i32, i32) {
        let hhs = i32::from(self.show_h_header);
        let vhs = if self.show_v_header {
            let rows = self.model.row_count().max(1);
            (rows.to_string().len() as i32 + 2).max(4)
        } else {
            0
        };
        (hhs, vhs)
    }

    fn col_span(&self, col: usize) -> (i32, i32) {
        let start = if col == 0 {
            0
        } else {
            self.col_edges[col - 1] + 1
        };
        (start, self.col_edges[col])
    }

    fn row_span(&self, row: usize) -> (i32, i32) {
        let start = if row == 0 {
            0
        } else {
            self.row_edges[row - 1] + 1
        };
        (start, self.row_edges[row])
    }

    /// Column width in cells (excluding the separator).
    #[must_use]
    pub fn column_width(&self, col: usize) -> i32 {
        let (start, edge) = self.col_span(col);
        edge - start
    }

    /// Set a column's width, shifting every later edge.
    pub fn set_column_width(&mut self, col: usize, width: i32) {
        if col >= self.col_edges.len() {
            return;
        }
        let width = width.max(1);
        let delta = width - self.column_width(col);
        for edge in self.col_edges.iter_mut().skip(col) {
            *edge += delta;
        }
    }

    /// Measure a column's content width.
    ///
    /// `Fast` mode scans a bounded window centered on the visible
    /// middle; `Exact` scans every row.
    #[must_use]
    pub fn column_contents_width(&self, col: usize, mode: SizeMode) -> i32 {
        let rows = self.model.row_count();
        let (from, to) = match mode {
            SizeMode::Exact => (0, rows),
            SizeMode::Fast => {
                let mid_y = self.last_offset.y + i32::from(self.last_displayed.height) / 2;
                let mid = self
                    .row_at(mid_y)
                    .unwrap_or(0);
                (
                    mid.saturating_sub(FAST_RESIZE_WINDOW),
                    (mid + FAST_RESIZE_WINDOW).min(rows),
                )
            }
        };
        let mut width = self
            .model
            .header_data(col, HeaderOrientation::Horizontal)
            .term_width() as i32;
        for row in from..to {
            let rich = self.model.data(row, col).to_rich();
            for line in rich.split('\n') {
                width = width.max(line.term_width() as i32);
            }
        }
        width
    }

    /// Resize one column to its contents.
    pub fn resize_column_to_contents(&mut self, col: usize, mode: SizeMode) {
        let width = self.column_contents_width(col, mode) + RESIZE_PADDING;
        self.set_column_width(col, width);
    }

    /// Resize every column to its contents (exact scan).
    pub fn resize_columns_to_contents(&mut self) {
        for col in 0..self.col_edges.len() {
            self.resize_column_to_contents(col, SizeMode::Exact);
        }
    }

    fn row_at(&self, content_y: i32) -> Option<usize> {
        if content_y < 0 {
            return None;
        }
        self.row_edges.iter().position(|&e| e >= content_y)
    }

    fn col_at(&self, content_x: i32) -> Option<usize> {
        if content_x < 0 {
            return None;
        }
        self.col_edges.iter().position(|&e| e >= content_x)
    }

    /// Hit test widget coordinates against cells and headers.
    ///
    /// Returns `(row, col)` with `-1` marking the header strip on that
    /// axis; `(-1, -1)` is the corner. Misses past the table return
    /// `None`.
    #[must_use]
    pub fn find_cell(&self, x: i32, y: i32, include_headers: bool) -> Option<(i32, i32)> {
        let (hhs, vhs) = self.header_sizes();
        let (ox, oy) = (self.last_offset.x, self.last_offset.y);

        let row = if include_headers && y < hhs {
            -1
        } else {
            self.row_at(y + oy - hhs).map(|r| r as i32)?
        };
        let col = if include_headers && x < vhs {
            -1
        } else {
            self.col_at(x + ox - vhs).map(|c| c as i32)?
        };
        Some((row, col))
    }

    /// The column whose separator sits at widget x, if any.
    fn separator_at(&self, x: i32, y: i32) -> Option<usize> {
        let (hhs, vhs) = self.header_sizes();
        if y >= hhs {
            return None;
        }
        let content_x = x + self.last_offset.x - vhs;
        self.col_edges.iter().position(|&e| e == content_x)
    }

    // --- sorting ----------------------------------------------------

    /// Sort by a column (`-1` restores the original order).
    pub fn sort_by_column(&mut self, column: i32, order: SortOrder) {
        self.sort_col = column;
        self.sort_order = order;
        self.model.sort(column, order);
    }

    // --- selection --------------------------------------------------

    /// Batch-select a rectangle, consulting model flags.
    pub fn set_selection(&mut self, pos: (usize, usize), size: (usize, usize), flag: SelectionFlag) {
        let model = &self.model;
        self.selection
            .set_selection(pos, size, flag, |r, c| model.flags(r, c));
    }

    /// Select every selectable cell.
    pub fn select_all(&mut self) {
        let model = &self.model;
        self.selection.select_all(|r, c| model.flags(r, c));
    }

    /// Select one row.
    pub fn select_row(&mut self, row: usize) {
        self.set_selection((row, 0), (1, self.model.column_count()), SelectionFlag::Select);
    }

    /// Select one column.
    pub fn select_column(&mut self, col: usize) {
        self.set_selection((0, col), (self.model.row_count(), 1), SelectionFlag::Select);
    }

    /// `true` iff every selectable cell in the row is selected.
    #[must_use]
    pub fn is_row_selected(&self, row: usize) -> bool {
        let model = &self.model;
        self.selection.is_row_selected(row, |r, c| model.flags(r, c))
    }

    /// `true` iff every selectable cell in the column is selected.
    #[must_use]
    pub fn is_col_selected(&self, col: usize) -> bool {
        let model = &self.model;
        self.selection.is_col_selected(col, |r, c| model.flags(r, c))
    }

    // --- current cell -----------------------------------------------

    /// Move the current cell by a delta.
    ///
    /// With `border_stop` the move clamps at the edges; without, it
    /// wraps across row boundaries (Tab semantics).
    pub fn move_current(&mut self, dc: i32, dr: i32, border_stop: bool) {
        let rows = self.model.row_count() as i32;
        let cols = self.model.column_count() as i32;
        if rows == 0 || cols == 0 {
            return;
        }
        let (mut row, mut col) = self
            .selection
            .current()
            .map(|(r, c)| (r as i32, c as i32))
            .unwrap_or((0, 0));
        row += dr;
        col += dc;
        if border_stop {
            row = row.clamp(0, rows - 1);
            col = col.clamp(0, cols - 1);
        } else {
            if col >= cols {
                col = 0;
                row += 1;
            }
            if col < 0 {
                col = cols - 1;
                row -= 1;
            }
            if row >= rows {
                row = 0;
            }
            if row < 0 {
                row = rows - 1;
            }
        }
        self.set_current_cell(row as usize, col as usize);
    }

    /// Place the current cell.
    pub fn set_current_cell(&mut self, row: usize, col: usize) {
        self.selection.set_current(Some((row, col)));
        self.current_changed.emit(&(row, col));
    }

    // --- editing ----------------------------------------------------

    fn editor_kind_for(&self, row: usize, col: usize) -> EditorKind {
        match self.model.data(row, col) {
            CellValue::Int(_) => EditorKind::SpinInt,
            CellValue::Float(_) => EditorKind::SpinFloat,
            CellValue::Rich(_) => EditorKind::Multi,
            CellValue::Text(_) | CellValue::None => EditorKind::Line,
        }
    }

    /// Open the in-place editor on a cell, optionally seeded with
    /// typed text replacing the old value.
    pub fn edit_cell(&mut self, row: usize, col: usize, seed: Option<&str>) -> bool {
        if !self.model.flags(row, col).contains(ItemFlags::EDITABLE) {
            return false;
        }
        let kind = self.editor_kind_for(row, col);
        let text = match seed {
            Some(s) => s.to_string(),
            None => self.model.data(row, col).to_plain(),
        };
        let cursor = text.chars().count();
        self.editor = Some(CellEditor {
            row,
            col,
            kind,
            text,
            cursor,
        });
        true
    }

    /// Commit the open editor through the model, as one undo step.
    pub fn commit_editor(&mut self) {
        let Some(editor) = self.editor.take() else {
            return;
        };
        let previous = self.model.data(editor.row, editor.col);
        let value = editor.value(&previous);
        self.apply_edit(vec![(editor.row, editor.col, value)]);
    }

    /// Discard the open editor.
    pub fn cancel_editor(&mut self) {
        self.editor = None;
    }

    /// Apply edits as a single undo snapshot.
    ///
    /// Non-editable cells are dropped; unchanged values produce no
    /// snapshot entry.
    pub fn apply_edit(&mut self, edits: Vec<(usize, usize, CellValue)>) {
        let mut changes = Vec::new();
        for (row, col, new) in edits {
            if !self.model.flags(row, col).contains(ItemFlags::EDITABLE) {
                continue;
            }
            let old = self.model.data(row, col);
            if old == new {
                continue;
            }
            if self.model.set_data(row, col, new.clone()) {
                self.cell_changed.emit(&(row, col));
                changes.push(CellChange { row, col, old, new });
            }
        }
        if changes.is_empty() {
            return;
        }
        let cursor = self.selection.current().unwrap_or((0, 0));
        self.undo.push(Snapshot { changes, cursor });
    }

    /// Whether an undo step is available.
    #[must_use]
    pub fn is_undo_available(&self) -> bool {
        self.undo.can_undo()
    }

    /// Whether a redo step is available.
    #[must_use]
    pub fn is_redo_available(&self) -> bool {
        self.undo.can_redo()
    }

    /// Undo the last edit, restoring values, selection, and cursor.
    pub fn undo(&mut self) {
        let Some(snapshot) = self.undo.undo().cloned() else {
            return;
        };
        self.restore_snapshot(&snapshot, false);
    }

    /// Redo the next edit.
    pub fn redo(&mut self) {
        let Some(snapshot) = self.undo.redo().cloned() else {
            return;
        };
        self.restore_snapshot(&snapshot, true);
    }

    fn restore_snapshot(&mut self, snapshot: &Snapshot, new_data: bool) {
        self.selection.clear();
        for change in &snapshot.changes {
            let value = if new_data {
                change.new.clone()
            } else {
                change.old.clone()
            };
            self.model.set_data(change.row, change.col, value);
            self.cell_changed.emit(&(change.row, change.col));
            let model = &self.model;
            self.selection.set_selection(
                (change.row, change.col),
                (1, 1),
                SelectionFlag::Select,
                |r, c| model.flags(r, c),
            );
        }
        self.selection.set_current(Some(snapshot.cursor));
    }

    // --- clipboard --------------------------------------------------

    /// Serialize the selection into a rectangular clipboard payload.
    pub fn copy(&mut self, ctx: &mut EventCtx) {
        let Some(((row0, col0), (rows, cols))) = self.selection.bounding_box() else {
            return;
        };
        let mut cells = Vec::with_capacity(rows);
        let mut lines = Vec::with_capacity(rows);
        for r in 0..rows {
            let mut line = Vec::with_capacity(cols);
            let mut texts = Vec::with_capacity(cols);
            for c in 0..cols {
                let value = if self.selection.is_selected(row0 + r, col0 + c) {
                    self.model.data(row0 + r, col0 + c)
                } else {
                    CellValue::None
                };
                texts.push(value.to_plain());
                line.push(value);
            }
            lines.push(texts.join("\t"));
            cells.push(line);
        }
        ctx.clipboard.set(ClipboardData::Cells {
            text: lines.join("\n"),
            cells,
        });
    }

    /// Copy, then clear the selected editable cells (one undo step).
    pub fn cut(&mut self, ctx: &mut EventCtx) {
        self.copy(ctx);
        let edits: Vec<(usize, usize, CellValue)> = self
            .selection
            .iter_selected()
            .map(|(r, c)| (r, c, CellValue::None))
            .collect();
        self.apply_edit(edits);
    }

    /// Paste the clipboard at the current cell (one undo step).
    ///
    /// A structured cell payload re-lays its rectangle; plain text
    /// lands in the current cell.
    pub fn paste(&mut self, ctx: &mut EventCtx) {
        let Some(data) = ctx.clipboard.get().cloned() else {
            return;
        };
        let (row, col) = self.selection.current().unwrap_or((0, 0));
        match data {
            ClipboardData::Cells { cells, .. } => {
                let rows = self.model.row_count();
                let cols = self.model.column_count();
                let mut edits = Vec::new();
                for (dr, line) in cells.iter().enumerate() {
                    for (dc, value) in line.iter().enumerate() {
                        if value.is_none() {
                            continue;
                        }
                        let (r, c) = (row + dr, col + dc);
                        if r < rows && c < cols {
                            edits.push((r, c, value.clone()));
                        }
                    }
                }
                self.apply_edit(edits);
            }
            ClipboardData::Text(text) => {
                self.apply_edit(vec![(row, col, CellValue::Text(text))]);
            }
        }
    }

    // --- event handling ---------------------------------------------

    fn editor_key(&mut self, ev: &KeyEvent) -> bool {
        let Some(mut editor) = self.editor.take() else {
            return false;
        };
        match &ev.code {
            KeyCode::Escape => {
                // Dropped: edit cancelled.
            }
            KeyCode::Enter => {
                if editor.kind == EditorKind::Multi && ev.alt() {
                    editor.insert("\n");
                    self.editor = Some(editor);
                } else {
                    self.editor = Some(editor);
                    self.commit_editor();
                }
            }
            KeyCode::Left => {
                if editor.cursor == 0 {
                    self.editor = Some(editor);
                    self.commit_editor();
                    self.move_current(-1, 0, true);
                } else {
                    editor.cursor -= 1;
                    self.editor = Some(editor);
                }
            }
            KeyCode::Right => {
                if editor.cursor >= editor.text.chars().count() {
                    self.editor = Some(editor);
                    self.commit_editor();
                    self.move_current(1, 0, true);
                } else {
                    editor.cursor += 1;
                    self.editor = Some(editor);
                }
            }
            KeyCode::Up => match editor.kind {
                EditorKind::SpinInt | EditorKind::SpinFloat => {
                    editor.step(1);
                    self.editor = Some(editor);
                }
                _ => {
                    self.editor = Some(editor);
                    self.commit_editor();
                    self.move_current(0, -1, true);
                }
            },
            KeyCode::Down => match editor.kind {
                EditorKind::SpinInt | EditorKind::SpinFloat => {
                    editor.step(-1);
                    self.editor = Some(editor);
                }
                _ => {
                    self.editor = Some(editor);
                    self.commit_editor();
                    self.move_current(0, 1, true);
                }
            },
            KeyCode::Backspace => {
                editor.backspace();
                self.editor = Some(editor);
            }
            KeyCode::Delete => {
                editor.delete();
                self.editor = Some(editor);
            }
            KeyCode::Text(s) => {
                if editor.accepts(s) {
                    editor.insert(s);
                }
                self.editor = Some(editor);
            }
            _ => {
                self.editor = Some(editor);
            }
        }
        true
    }

    fn handle_key(&mut self, ev: &KeyEvent, ctx: &mut EventCtx) -> bool {
        self.sync_with_model();
        if self.editor.is_some() {
            let consumed = self.editor_key(ev);
            if consumed {
                ctx.update();
            }
            return consumed;
        }
        let page = i32::from(self.last_displayed.height).max(1);
        match &ev.code {
            KeyCode::Up => self.move_current(0, -1, true),
            KeyCode::Down => self.move_current(0, 1, true),
            KeyCode::Left => self.move_current(-1, 0, true),
            KeyCode::Right => self.move_current(1, 0, true),
            KeyCode::Home => self.move_current(-(self.model.column_count() as i32), 0, true),
            KeyCode::End => self.move_current(self.model.column_count() as i32, 0, true),
            KeyCode::PageUp => self.move_current(0, -page, true),
            KeyCode::PageDown => self.move_current(0, page, true),
            KeyCode::Tab => self.move_current(1, 0, false),
            KeyCode::BackTab => self.move_current(-1, 0, false),
            KeyCode::Enter => {
                if let Some((row, col)) = self.selection.current() {
                    self.edit_cell(row, col, None);
                } else {
                    return false;
                }
            }
            KeyCode::Ctrl(b'c') => {
                self.copy(ctx);
            }
            KeyCode::Ctrl(b'x') => {
                self.cut(ctx);
            }
            KeyCode::Ctrl(b'v') => {
                self.paste(ctx);
            }
            KeyCode::Ctrl(b'z') => {
                self.undo();
            }
            KeyCode::Ctrl(b'y') => {
                self.redo();
            }
            KeyCode::Text(s) => {
                let Some((row, col)) = self.selection.current() else {
                    return false;
                };
                if !self.edit_cell(row, col, Some(s.as_str())) {
                    return false;
                }
            }
            _ => return false,
        }
        ctx.update();
        true
    }

    fn handle_mouse(&mut self, ev: &MouseEvent, offset: Point, ctx: &mut EventCtx) -> bool {
        self.sync_with_model();
        self.last_offset = offset;
        match ev.kind {
            MouseEventKind::Press if ev.button == MouseButton::Left => {
                if self.editor.is_some() {
                    self.commit_editor();
                }
                if let Some(col) = self.separator_at(ev.x, ev.y) {
                    self.sep_grab = Some(col);
                    ctx.update();
                    return true;
                }
                let Some((row, col)) = self.find_cell(ev.x, ev.y, true) else {
                    return false;
                };
                if ev.tap >= 2 && row >= 0 && col >= 0 {
                    self.set_current_cell(row as usize, col as usize);
                    self.edit_cell(row as usize, col as usize, None);
                    ctx.update();
                    return true;
                }
                match (row, col) {
                    (-1, -1) => self.select_all(),
                    (-1, c) => {
                        if self.sorting_enabled {
                            let order = if self.sort_col == c {
                                self.sort_order.toggled()
                            } else {
                                SortOrder::Ascending
                            };
                            self.sort_by_column(c, order);
                        }
                    }
                    (r, -1) => {
                        if !ev.modifiers.contains(Modifiers::CONTROL) {
                            self.selection.clear();
                        }
                        self.select_row(r as usize);
                        self.set_current_cell(r as usize, 0);
                    }
                    (r, c) => {
                        let (r, c) = (r as usize, c as usize);
                        if ev.modifiers.contains(Modifiers::CONTROL) {
                            let flag = if self.selection.is_selected(r, c) {
                                SelectionFlag::Deselect
                            } else {
                                SelectionFlag::Select
                            };
                            self.set_selection((r, c), (1, 1), flag);
                        } else if ev.modifiers.contains(Modifiers::SHIFT) {
                            let (ar, ac) = self.selection.current().unwrap_or((r, c));
                            let pos = (ar.min(r), ac.min(c));
                            let size = (ar.abs_diff(r) + 1, ac.abs_diff(c) + 1);
                            self.set_selection(pos, size, SelectionFlag::Clear);
                        } else {
                            self.set_selection((r, c), (1, 1), SelectionFlag::Clear);
                            self.drag_start = Some((r, c));
                        }
                        self.set_current_cell(r, c);
                    }
                }
                ctx.update();
                true
            }
            MouseEventKind::Drag => {
                if let Some(col) = self.sep_grab {
                    let (_, vhs) = self.header_sizes();
                    let content_x = ev.x + offset.x - vhs;
                    let min_edge = (col as i32 + 1) * MIN_COL_STRIDE;
                    let start = self.col_span(col).0;
                    let new_edge = content_x.max(min_edge).max(start + 1);
                    let delta = new_edge - self.col_edges[col];
                    if delta != 0 {
                        for edge in self.col_edges.iter_mut().skip(col) {
                            *edge += delta;
                        }
                        ctx.update();
                    }
                    return true;
                }
                if let Some((ar, ac)) = self.drag_start {
                    if let Some((r, c)) = self.find_cell(ev.x, ev.y, false) {
                        let (r, c) = (r.max(0) as usize, c.max(0) as usize);
                        let pos = (ar.min(r), ac.min(c));
                        let size = (ar.abs_diff(r) + 1, ac.abs_diff(c) + 1);
                        self.set_selection(pos, size, SelectionFlag::Clear);
                        self.set_current_cell(r, c);
                        ctx.update();
                    }
                    return true;
                }
                false
            }
            MouseEventKind::Release => {
                let had = self.sep_grab.take().is_some() || self.drag_start.take().is_some();
                had
            }
            MouseEventKind::Move => {
                let hover = self.find_cell(ev.x, ev.y, true);
                if hover != self.hover {
                    self.hover = hover;
                    ctx.update();
                }
                hover.is_some()
            }
            _ => false,
        }
    }

    // --- painting ---------------------------------------------------

    fn cell_color(&self, row: usize, col: usize, base: &Color) -> Color {
        let (r, c) = (row as i32, col as i32);
        if self.selection.current() == Some((row, col)) {
            self.style.current.clone()
        } else if matches!(self.hover, Some(h) if h == (r, c) || h == (-1, c) || h == (r, -1) || h == (-1, -1))
        {
            self.style.hover.clone()
        } else if self.selection.is_selected(row, col) {
            self.style.selected.clone()
        } else {
            base.mod_at(c, r)
        }
    }

    fn sel(&self, row: i32, col: i32) -> bool {
        row >= 0 && col >= 0 && self.selection.is_selected(row as usize, col as usize)
    }

    fn paint_table(&mut self, canvas: &mut Canvas, displayed: Size, offset: Point, core: &WidgetCore) {
        self.last_offset = offset;
        self.last_displayed = displayed;
        let (hhs, vhs) = self.header_sizes();
        let (ox, oy) = (offset.x, offset.y);
        let base = core.current_style().clone();
        let sel_edge = match self.style.selected.background() {
            Some(part) => Color::fg_part(part),
            None => self.style.line.clone(),
        };

        let rows = self.model.row_count();
        let cols = self.model.column_count();
        let w = i32::from(displayed.width);
        let h = i32::from(displayed.height);

        // Cells.
        for row in 0..rows {
            let (ya, yb) = self.row_span(row);
            let (sy0, sy1) = (ya + hhs - oy, yb + hhs - oy);
            if sy0 > h {
                break;
            }
            if sy1 < hhs {
                continue;
            }
            for col in 0..cols {
                let (xa, xb) = self.col_span(col);
                let (sx0, sx1) = (xa + vhs - ox, xb + vhs - ox);
                if sx0 > w {
                    break;
                }
                if sx1 < vhs {
                    continue;
                }
                let color = self.cell_color(row, col, &base);
                let width = (xb - xa) as usize;
                let rich = self.model.data(row, col).to_rich();
                let mut y = sy0;
                for line in rich.split('\n') {
                    if y >= sy1 {
                        break;
                    }
                    canvas.draw_rich_text(
                        Point::new(sx0, y),
                        &line,
                        Some(width),
                        Alignment::Left,
                        Some(color.clone()),
                    );
                    y += 1;
                }
                while y < sy1 {
                    canvas.draw_rich_text(
                        Point::new(sx0, y),
                        &RichText::new(),
                        Some(width),
                        Alignment::Left,
                        Some(color.clone()),
                    );
                    y += 1;
                }
            }
        }

        // Separators with merged selection edges.
        for row in 0..rows {
            let (_, yb) = self.row_span(row);
            let sy = yb + hhs - oy;
            if sy < hhs || sy > h {
                continue;
            }
            if row + 1 == rows && !self.show_h_separators {
                continue;
            }
            for col in 0..cols {
                let (xa, xb) = self.col_span(col);
                for x in xa..xb {
                    let sx = x + vhs - ox;
                    if sx < vhs || sx > w {
                        continue;
                    }
                    let above = self.sel(row as i32, col as i32);
                    let below = self.sel(row as i32 + 1, col as i32);
                    let (glyph, color) = match (above, below) {
                        (true, true) => ('█', sel_edge.clone()),
                        (true, false) => ('▀', sel_edge.clone()),
                        (false, true) => ('▄', sel_edge.clone()),
                        (false, false) => {
                            if self.show_h_separators {
                                ('─', self.style.line.clone())
                            } else {
                                continue;
                            }
                        }
                    };
                    canvas.draw_char(Point::new(sx, sy), glyph, color);
                }
            }
        }
        for col in 0..cols {
            let (_, xb) = self.col_span(col);
            let sx = xb + vhs - ox;
            if sx < vhs || sx > w {
                continue;
            }
            if col + 1 == cols && !self.show_v_separators {
                continue;
            }
            for row in 0..rows {
                let (ya, yb) = self.row_span(row);
                for y in ya..yb {
                    let sy = y + hhs - oy;
                    if sy < hhs || sy > h {
                        continue;
                    }
                    let left = self.sel(row as i32, col as i32);
                    let right = self.sel(row as i32, col as i32 + 1);
                    let (glyph, color) = match (left, right) {
                        (true, true) => ('█', sel_edge.clone()),
                        (true, false) => ('▌', sel_edge.clone()),
                        (false, true) => ('▐', sel_edge.clone()),
                        (false, false) => {
                            if self.show_v_separators {
                                ('│', self.style.line.clone())
                            } else {
                                continue;
                            }
                        }
                    };
                    canvas.draw_char(Point::new(sx, sy), glyph, color);
                }
            }
            // Crossings: quadrant glyphs from the four neighbors.
            for row in 0..rows {
                let (_, yb) = self.row_span(row);
                let sy = yb + hhs - oy;
                if sy < hhs || sy > h {
                    continue;
                }
                let (r, c) = (row as i32, col as i32);
                let bits = usize::from(self.sel(r, c))
                    | usize::from(self.sel(r, c + 1)) << 1
                    | usize::from(self.sel(r + 1, c)) << 2
                    | usize::from(self.sel(r + 1, c + 1)) << 3;
                let (glyph, color) = if bits != 0 {
                    (QUADRANTS[bits], sel_edge.clone())
                } else if self.show_h_separators && self.show_v_separators {
                    ('┼', self.style.line.clone())
                } else {
                    continue;
                };
                canvas.draw_char(Point::new(sx, sy), glyph, color);
            }
        }

        // The open editor paints over its cell.
        if let Some(editor) = &self.editor {
            let (xa, xb) = self.col_span(editor.col);
            let (ya, yb) = self.row_span(editor.row);
            let (sx0, sy0) = (xa + vhs - ox, ya + hhs - oy);
            let width = (xb - xa) as usize;
            let edit_color = base.clone().invert_fg_bg() + Color::attrs(
                weft_style::ColorAttrs::REVERSE,
            );
            let mut y = sy0;
            for (i, line) in editor.text.split('\n').enumerate() {
                if y >= yb + hhs - oy {
                    break;
                }
                let mut rich = RichText::styled(line, edit_color.clone());
                // Cursor block on the active line.
                if i == editor.text.split('\n').count() - 1 {
                    rich = rich + RichText::styled(" ", edit_color.clone());
                }
                canvas.draw_rich_text(
                    Point::new(sx0, y),
                    &rich,
                    Some(width),
                    Alignment::Left,
                    Some(edit_color.clone()),
                );
                y += 1;
            }
        }

        // Hover and current-cell inverted borders, after selection.
        for target in [self.hover.map(|(r, c)| (r, c, true)), self
            .selection
            .current()
            .map(|(r, c)| (r as i32, c as i32, false))]
        .into_iter()
        .flatten()
        {
            let (r, c, is_hover) = target;
            if r < 0 || c < 0 {
                continue;
            }
            let style = if is_hover {
                &self.style.hover
            } else {
                &self.style.current
            };
            let border = match style.background() {
                Some(part) => Color::fg_part(part),
                None => self.style.line.clone(),
            };
            let (xa, xb) = self.col_span(c as usize);
            let (ya, yb) = self.row_span(r as usize);
            let (sx0, sx1) = (xa + vhs - ox, xb + vhs - ox);
            let (sy0, sy1) = (ya + hhs - oy, yb + hhs - oy);
            for x in sx0..sx1 {
                canvas.draw_char(Point::new(x, sy0 - 1), '▄', border.clone());
                canvas.draw_char(Point::new(x, sy1), '▀', border.clone());
            }
            for y in sy0..sy1 {
                canvas.draw_char(Point::new(sx0 - 1, y), '▐', border.clone());
                canvas.draw_char(Point::new(sx1, y), '▌', border.clone());
            }
        }

        // Headers paint last, over scrolled content.
        if self.show_h_header {
            canvas.draw_rich_text(
                Point::new(0, 0),
                &RichText::new(),
                Some(displayed.width as usize),
                Alignment::Left,
                Some(self.style.header.clone()),
            );
            for col in 0..cols {
                let (xa, xb) = self.col_span(col);
                let (sx0, sx1) = (xa + vhs - ox, xb + vhs - ox);
                if sx0 > w {
                    break;
                }
                if sx1 < vhs {
                    continue;
                }
                let width = (xb - xa) as usize;
                let mut label = self
                    .model
                    .header_data(col, HeaderOrientation::Horizontal)
                    .align_ellipsis(width, Alignment::Left);
                if self.sort_col == col as i32 {
                    let glyph = match self.sort_order {
                        SortOrder::Ascending => "▲",
                        SortOrder::Descending => "▼",
                    };
                    label = label.slice(0, width.saturating_sub(1))
                        + RichText::raw(glyph);
                }
                canvas.draw_rich_text(
                    Point::new(sx0, 0),
                    &label,
                    Some(width),
                    Alignment::Left,
                    Some(self.style.header.clone()),
                );
                canvas.draw_char(Point::new(sx1, 0), '│', self.style.header.clone());
            }
        }
        if self.show_v_header {
            for row in 0..rows {
                let (ya, yb) = self.row_span(row);
                let (sy0, sy1) = (ya + hhs - oy, yb + hhs - oy);
                if sy0 > h {
                    break;
                }
                if sy1 < hhs {
                    continue;
                }
                let selected_row = self.is_row_selected(row);
                let color = if selected_row {
                    self.style.header.clone().invert_fg_bg()
                } else {
                    self.style.header.clone()
                };
                let label = self
                    .model
                    .header_data(row, HeaderOrientation::Vertical)
                    .align((vhs - 1) as usize, Alignment::Right);
                canvas.draw_rich_text(
                    Point::new(0, sy0),
                    &label,
                    Some((vhs - 1) as usize),
                    Alignment::Right,
                    Some(color.clone()),
                );
                canvas.draw_char(Point::new(vhs - 1, sy0), '▐', color.clone());
                for y in (sy0 + 1)..sy1.min(h) {
                    canvas.draw_rich_text(
                        Point::new(0, y),
                        &RichText::new(),
                        Some(vhs as usize),
                        Alignment::Left,
                        Some(color.clone()),
                    );
                }
            }
            if self.show_h_header {
                canvas.draw_rich_text(
                    Point::new(0, 0),
                    &RichText::new(),
                    Some(vhs as usize),
                    Alignment::Left,
                    Some(self.style.header.clone()),
                );
            }
        }
    }
}

impl Viewport for TableView {
    fn full_area_size(&self) -> Size {
        let (hhs, vhs) = self.header_sizes();
        let width = vhs + self.col_edges.last().copied().unwrap_or(0) + 1;
        let height = hhs + self.row_edges.last().copied().unwrap_or(0) + 1;
        Size::new(
            width.clamp(0, i32::from(u16::MAX)) as u16,
            height.clamp(0, i32::from(u16::MAX)) as u16,
        )
    }

    fn paint(&mut self, canvas: &mut Canvas, displayed: Size, offset: Point, core: &WidgetCore) {
        self.sync_with_model();
        self.paint_table(canvas, displayed, offset, core);
    }

    fn mouse(&mut self, ev: &MouseEvent, offset: Point, ctx: &mut EventCtx) -> bool {
        self.handle_mouse(ev, offset, ctx)
    }

    fn key(&mut self, ev: &KeyEvent, ctx: &mut EventCtx) -> bool {
        self.handle_key(ev, ctx)
    }

    fn paste(&mut self, text: &str, ctx: &mut EventCtx) -> bool {
        let (row, col) = match self.selection.current() {
            Some(cell) => cell,
            None => (0, 0),
        };
        self.apply_edit(vec![(row, col, CellValue::Text(text.to_string()))]);
        ctx.update();
        true
    }

    fn desired_offset(&self, current: Point, displayed: Size) -> Option<Point> {
        let (row, col) = self.selection.current()?;
        if row >= self.row_edges.len() || col >= self.col_edges.len() {
            return None;
        }
        let (hhs, vhs) = self.header_sizes();
        let (cxa, cxb) = self.col_span(col);
        let (cya, cyb) = self.row_span(row);
        let mut ox = current.x;
        let mut oy = current.y;
        let w = i32::from(displayed.width);
        let h = i32::from(displayed.height);
        if w + ox - vhs < cxb + 1 {
            ox = cxb + 1 + vhs - w;
        }
        if ox > cxa {
            ox = cxa;
        }
        if h + oy - hhs < cyb + 1 {
            oy = cyb + 1 + hhs - h;
        }
        if oy > cya {
            oy = cya;
        }
        let target = Point::new(ox.max(0), oy.max(0));
        (target != current).then_some(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::model::TableList;
    use crate::widget::{Clipboard, WidgetId};

    fn zeros(rows: usize, cols: usize) -> TableView {
        let data = vec![vec![CellValue::Int(0); cols]; rows];
        TableView::new(Box::new(TableList::new(data)))
    }

    fn with_ctx<R>(view: &mut TableView, f: impl FnOnce(&mut TableView, &mut EventCtx) -> R) -> R {
        let mut core = WidgetCore::new();
        core.set_geometry_raw(Rect::new(0, 0, 60, 20));
        let mut clipboard = Clipboard::default();
        let mut queue = Vec::new();
        let mut ctx = EventCtx {
            id: WidgetId::default(),
            core: &mut core,
            clipboard: &mut clipboard,
            queue: &mut queue,
        };
        f(view, &mut ctx)
    }

    use weft_core::geometry::Rect;

    #[test]
    fn geometry_edges_are_monotonic() {
        let view = zeros(3, 4);
        let mut prev = -1;
        for &e in &view.col_edges {
            assert!(e > prev);
            prev = e;
        }
        assert_eq!(view.row_edges, vec![1, 3, 5]);
    }

    #[test]
    fn find_cell_headers_and_cells() {
        let mut view = zeros(3, 3);
        view.last_offset = Point::new(0, 0);
        let (hhs, vhs) = view.header_sizes();
        assert_eq!(hhs, 1);
        // Corner.
        assert_eq!(view.find_cell(0, 0, true), Some((-1, -1)));
        // Header row above a cell column.
        assert_eq!(view.find_cell(vhs + 1, 0, true), Some((-1, 0)));
        // Row header.
        assert_eq!(view.find_cell(0, hhs, true), Some((0, -1)));
        // First cell.
        assert_eq!(view.find_cell(vhs, hhs, true), Some((0, 0)));
        // Second column starts after the first edge.
        let x = vhs + view.col_edges[0] + 1;
        assert_eq!(view.find_cell(x, hhs, true), Some((0, 1)));
        // Past the last column: miss.
        let x = vhs + view.col_edges[2] + 5;
        assert_eq!(view.find_cell(x, hhs, true), None);
    }

    #[test]
    fn set_column_width_shifts_later_edges() {
        let mut view = zeros(2, 3);
        let before = view.col_edges.clone();
        view.set_column_width(0, 15);
        assert_eq!(view.column_width(0), 15);
        let delta = view.col_edges[0] - before[0];
        assert_eq!(view.col_edges[2] - before[2], delta);
    }

    #[test]
    fn resize_to_contents_measures_longest_line() {
        let mut view = TableView::new(Box::new(TableList::from_rows(vec![
            vec!["short"],
            vec!["a much longer cell value"],
        ])));
        view.resize_column_to_contents(0, SizeMode::Exact);
        assert_eq!(
            view.column_width(0),
            "a much longer cell value".len() as i32 + RESIZE_PADDING
        );
    }

    #[test]
    fn current_cell_navigation_clamps_and_wraps() {
        let mut view = zeros(3, 3);
        view.set_current_cell(0, 0);
        view.move_current(-1, 0, true);
        assert_eq!(view.current_cell(), Some((0, 0)), "border stop clamps");
        // Tab wraps across the row boundary.
        view.set_current_cell(0, 2);
        view.move_current(1, 0, false);
        assert_eq!(view.current_cell(), Some((1, 0)));
        // Shift-Tab wraps back.
        view.move_current(-1, 0, false);
        assert_eq!(view.current_cell(), Some((0, 2)));
    }

    #[test]
    fn desired_offset_tracks_current_cell() {
        let mut view = zeros(50, 10);
        view.set_current_cell(30, 0);
        let off = view
            .desired_offset(Point::new(0, 0), Size::new(40, 10))
            .expect("needs scrolling");
        assert!(off.y > 0);
        // Already visible afterwards: no further motion.
        assert_eq!(view.desired_offset(off, Size::new(40, 10)), None);
    }

    #[test]
    fn edit_commit_records_undo() {
        let mut view = zeros(2, 2);
        view.set_current_cell(0, 0);
        assert!(view.edit_cell(0, 0, Some("7")));
        view.commit_editor();
        assert_eq!(view.model().data(0, 0), CellValue::Int(7));
        assert!(view.is_undo_available());
        view.undo();
        assert_eq!(view.model().data(0, 0), CellValue::Int(0));
        view.redo();
        assert_eq!(view.model().data(0, 0), CellValue::Int(7));
    }

    #[test]
    fn editor_kind_follows_value_type() {
        let view = TableView::new(Box::new(TableList::new(vec![vec![
            CellValue::Int(1),
            CellValue::Float(1.5),
            CellValue::Text("x".into()),
            CellValue::Rich(RichText::raw("r")),
        ]])));
        assert_eq!(view.editor_kind_for(0, 0), EditorKind::SpinInt);
        assert_eq!(view.editor_kind_for(0, 1), EditorKind::SpinFloat);
        assert_eq!(view.editor_kind_for(0, 2), EditorKind::Line);
        assert_eq!(view.editor_kind_for(0, 3), EditorKind::Multi);
    }

    #[test]
    fn spin_editor_rejects_letters() {
        let mut view = zeros(1, 1);
        view.edit_cell(0, 0, None);
        let ed = view.editor.as_mut().unwrap();
        assert!(!ed.accepts("x"));
        assert!(ed.accepts("5"));
    }

    #[test]
    fn table_paste_rectangle_scenario() {
        // 4x4 zeros; copy a 2x2 block ((1,2),(3,4)); paste at (2,2).
        let mut view = zeros(4, 4);
        view.apply_edit(vec![
            (0, 0, CellValue::Int(1)),
            (0, 1, CellValue::Int(2)),
            (1, 0, CellValue::Int(3)),
            (1, 1, CellValue::Int(4)),
        ]);
        view.set_selection((0, 0), (2, 2), SelectionFlag::Clear);

        with_ctx(&mut view, |view, ctx| {
            view.copy(ctx);
            view.set_current_cell(2, 2);
            view.paste(ctx);
        });

        let grid: Vec<Vec<i64>> = (0..4)
            .map(|r| {
                (0..4)
                    .map(|c| match view.model().data(r, c) {
                        CellValue::Int(v) => v,
                        _ => -99,
                    })
                    .collect()
            })
            .collect();
        assert_eq!(grid[2][2], 1);
        assert_eq!(grid[2][3], 2);
        assert_eq!(grid[3][2], 3);
        assert_eq!(grid[3][3], 4);
        assert_eq!(grid[0][2], 0, "other cells unchanged");

        // Undo restores the pre-paste state.
        view.undo();
        for r in 2..4 {
            for c in 2..4 {
                assert_eq!(view.model().data(r, c), CellValue::Int(0));
            }
        }
        // Redo brings the block back.
        view.redo();
        assert_eq!(view.model().data(2, 2), CellValue::Int(1));
        assert_eq!(view.model().data(3, 3), CellValue::Int(4));
    }

    #[test]
    fn paste_is_one_undo_step() {
        let mut view = zeros(4, 4);
        view.apply_edit(vec![(0, 0, CellValue::Int(9))]);
        view.set_selection((0, 0), (1, 1), SelectionFlag::Clear);
        with_ctx(&mut view, |view, ctx| {
            view.copy(ctx);
            view.set_current_cell(2, 2);
            view.paste(ctx);
        });
        let id = view.undo.snapshot_id();
        view.undo();
        assert_eq!(view.undo.snapshot_id(), id - 1, "one step per paste");
    }

    #[test]
    fn cut_clears_and_copies() {
        let mut view = zeros(2, 2);
        view.apply_edit(vec![(0, 0, CellValue::Int(5))]);
        view.set_selection((0, 0), (1, 1), SelectionFlag::Clear);
        with_ctx(&mut view, |view, ctx| {
            view.cut(ctx);
            assert!(matches!(
                ctx.clipboard.get(),
                Some(ClipboardData::Cells { .. })
            ));
        });
        assert_eq!(view.model().data(0, 0), CellValue::None);
        view.undo();
        assert_eq!(view.model().data(0, 0), CellValue::Int(5));
    }

    #[test]
    fn clipboard_text_is_tab_newline_grid() {
        let mut view = TableView::new(Box::new(TableList::from_rows(vec![
            vec!["a", "b"],
            vec!["c", "d"],
        ])));
        view.set_selection((0, 0), (2, 2), SelectionFlag::Clear);
        with_ctx(&mut view, |view, ctx| {
            view.copy(ctx);
            assert_eq!(ctx.clipboard.get().unwrap().as_text(), "a\tb\nc\td");
        });
    }

    #[test]
    fn header_click_toggles_sort() {
        let mut view = TableView::new(Box::new(TableList::from_rows(vec![
            vec!["b"],
            vec!["a"],
        ])));
        let (_, vhs) = view.header_sizes();
        let press = |view: &mut TableView, x: i32, y: i32| {
            with_ctx(view, |view, ctx| {
                let ev = MouseEvent::new(x, y, MouseButton::Left, MouseEventKind::Press);
                view.handle_mouse(&ev, Point::new(0, 0), ctx)
            })
        };
        assert!(press(&mut view, vhs + 1, 0));
        assert_eq!(view.sort_state(), (0, SortOrder::Ascending));
        assert_eq!(view.model().data(0, 0).to_plain(), "a");
        assert!(press(&mut view, vhs + 1, 0));
        assert_eq!(view.sort_state(), (0, SortOrder::Descending));
        assert_eq!(view.model().data(0, 0).to_plain(), "b");
    }

    #[test]
    fn separator_drag_respects_minimum_stride() {
        let mut view = zeros(2, 3);
        with_ctx(&mut view, |view, ctx| {
            let (_, vhs) = view.header_sizes();
            let sep_x = vhs + view.col_edges[0];
            let press = MouseEvent::new(sep_x, 0, MouseButton::Left, MouseEventKind::Press);
            assert!(view.handle_mouse(&press, Point::new(0, 0), ctx));
            // Drag far left: the edge clamps at MIN_COL_STRIDE.
            let drag = MouseEvent::new(vhs - 20, 0, MouseButton::Left, MouseEventKind::Drag);
            view.handle_mouse(&drag, Point::new(0, 0), ctx);
        });
        assert_eq!(view.col_edges[0], MIN_COL_STRIDE);
    }

    #[test]
    fn drag_selection_paints_rectangle() {
        let mut view = zeros(4, 4);
        with_ctx(&mut view, |view, ctx| {
            let (hhs, vhs) = view.header_sizes();
            let press = MouseEvent::new(vhs, hhs, MouseButton::Left, MouseEventKind::Press);
            view.handle_mouse(&press, Point::new(0, 0), ctx);
            // Drag to cell (1, 1).
            let x = vhs + view.col_edges[0] + 1;
            let y = hhs + view.row_edges[0] + 1;
            let drag = MouseEvent::new(x, y, MouseButton::Left, MouseEventKind::Drag);
            view.handle_mouse(&drag, Point::new(0, 0), ctx);
        });
        for r in 0..2 {
            for c in 0..2 {
                assert!(view.selection().is_selected(r, c));
            }
        }
        assert!(!view.selection().is_selected(2, 2));
    }

    #[test]
    fn non_editable_cells_reject_edits() {
        struct Frozen(TableList);
        impl TableModel for Frozen {
            fn row_count(&self) -> usize {
                self.0.row_count()
            }
            fn column_count(&self) -> usize {
                self.0.column_count()
            }
            fn data(&self, r: usize, c: usize) -> CellValue {
                self.0.data(r, c)
            }
            fn set_data(&mut self, r: usize, c: usize, v: CellValue) -> bool {
                self.0.set_data(r, c, v)
            }
            fn flags(&self, _r: usize, _c: usize) -> ItemFlags {
                ItemFlags::ENABLED | ItemFlags::SELECTABLE
            }
            fn signals(&self) -> &super::super::model::TableModelSignals {
                self.0.signals()
            }
        }
        let mut view = TableView::new(Box::new(Frozen(TableList::from_rows(vec![vec![0i64]]))));
        assert!(!view.edit_cell(0, 0, Some("5")));
        view.apply_edit(vec![(0, 0, CellValue::Int(5))]);
        assert_eq!(view.model().data(0, 0), CellValue::Int(0), "no-op");
        assert!(!view.is_undo_available(), "no snapshot for a no-op");
    }

    #[test]
    fn quadrant_table_matches_bits() {
        assert_eq!(QUADRANTS[0b0001], '▘');
        assert_eq!(QUADRANTS[0b0010], '▝');
        assert_eq!(QUADRANTS[0b0011], '▀');
        assert_eq!(QUADRANTS[0b0101], '▌');
        assert_eq!(QUADRANTS[0b1010], '▐');
        assert_eq!(QUADRANTS[0b1100], '▄');
        assert_eq!(QUADRANTS[0b1111], '█');
    }

    #[test]
    fn paint_smoke_renders_headers_and_cells() {
        let mut view = TableView::new(Box::new(TableList::from_rows(vec![
            vec!["aa", "bb"],
            vec!["cc", "dd"],
        ])));
        let mut core = WidgetCore::new();
        core.set_geometry_raw(Rect::new(0, 0, 40, 10));
        let mut canvas = Canvas::new(40, 10);
        view.paint(&mut canvas, Size::new(40, 10), Point::new(0, 0), &core);
        let rows = canvas.to_plain_rows();
        assert!(rows[1].contains("aa"));
        assert!(rows[1].contains("bb"));
        assert!(rows[3].contains("cc"));
        assert!(rows[0].contains('1'), "header shows column label");
    }
}
