#![forbid(unsafe_code)]

//! The cell canvas and its drawing primitives.
//!
//! A [`Canvas`] is a rectangular buffer of (cluster, color) cells. All
//! drawing primitives take `i32` positions and clip to the canvas
//! bounds, so scrolled content can be drawn at negative origins without
//! caller-side clamping.
//!
//! Wide clusters occupy a head cell plus a continuation cell. Writes
//! that cut a wide cluster in half repair the orphaned side with the
//! overflow placeholder, so the grid never contains a dangling head or
//! continuation.

use smallvec::SmallVec;

use weft_core::geometry::{Point, Rect, Size};
use weft_style::Color;
use weft_text::{Alignment, RichText, OVERFLOW_LEFT, OVERFLOW_RIGHT};

/// One canvas cell: a cluster and its color.
///
/// A continuation cell (the second half of a wide cluster) has empty
/// text and width 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    text: SmallVec<[u8; 7]>,
    width: u8,
    color: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self::blank()
    }
}

impl Cell {
    /// A blank cell: a space with the reset color.
    #[must_use]
    pub fn blank() -> Self {
        Self {
            text: SmallVec::from_slice(b" "),
            width: 1,
            color: Color::RESET,
        }
    }

    /// The continuation marker behind a wide cluster head.
    #[must_use]
    pub fn continuation(color: Color) -> Self {
        Self {
            text: SmallVec::new(),
            width: 0,
            color,
        }
    }

    /// Create a cell from a cluster and color.
    #[must_use]
    pub fn new(cluster: &str, width: u8, color: Color) -> Self {
        Self {
            text: SmallVec::from_slice(cluster.as_bytes()),
            width,
            color,
        }
    }

    /// The cluster text (empty for continuation cells).
    #[must_use]
    pub fn text(&self) -> &str {
        std::str::from_utf8(&self.text).unwrap_or("\u{fffd}")
    }

    /// Display width: 1 or 2, 0 for continuations.
    #[must_use]
    pub const fn width(&self) -> u8 {
        self.width
    }

    /// The cell color.
    #[must_use]
    pub const fn color(&self) -> &Color {
        &self.color
    }

    /// Check for a continuation cell.
    #[must_use]
    pub fn is_continuation(&self) -> bool {
        self.width == 0 && self.text.is_empty()
    }

    /// Check for a space glyph.
    #[must_use]
    pub fn is_space(&self) -> bool {
        self.text.as_slice() == b" "
    }
}

/// Line styles for [`Canvas::draw_box`] and [`Canvas::draw_grid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoxStyle {
    /// Single light lines.
    #[default]
    Single,
    /// Double lines.
    Double,
}

impl BoxStyle {
    /// Glyph set: `[h, v, tl, tr, bl, br, t_down, t_up, t_right, t_left, cross]`
    const fn glyphs(self) -> [char; 11] {
        match self {
            Self::Single => ['─', '│', '┌', '┐', '└', '┘', '┬', '┴', '├', '┤', '┼'],
            Self::Double => ['═', '║', '╔', '╗', '╚', '╝', '╦', '╩', '╠', '╣', '╬'],
        }
    }
}

/// A 2-D grid of (cluster, color) cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl Canvas {
    /// Create a canvas filled with blank cells.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::blank(); width as usize * height as usize],
        }
    }

    /// Canvas width in cells.
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Canvas height in cells.
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Canvas size.
    #[must_use]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Resize and clear.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.cells.clear();
        self.cells
            .resize(width as usize * height as usize, Cell::blank());
    }

    /// Reset every cell to blank.
    pub fn clean(&mut self) {
        self.cells.fill(Cell::blank());
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= i32::from(self.width) || y >= i32::from(self.height) {
            None
        } else {
            Some(y as usize * self.width as usize + x as usize)
        }
    }

    /// The cell at `(x, y)`, if inside the canvas.
    #[must_use]
    pub fn cell(&self, x: i32, y: i32) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    /// Raw cell storage, row-major.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Repair wide-cluster halves orphaned by a write at `(x, y)`.
    fn repair_before_write(&mut self, x: i32, y: i32) {
        let Some(i) = self.index(x, y) else { return };
        if self.cells[i].is_continuation() {
            // The head sits to the left; degrade it to a placeholder.
            if let Some(left) = self.index(x - 1, y) {
                if self.cells[left].width() == 2 {
                    let color = self.cells[left].color().clone();
                    self.cells[left] = Cell::new(&OVERFLOW_RIGHT.to_string(), 1, color);
                }
            }
        } else if self.cells[i].width() == 2 {
            // The continuation sits to the right; degrade it.
            if let Some(right) = self.index(x + 1, y) {
                if self.cells[right].is_continuation() {
                    let color = self.cells[right].color().clone();
                    self.cells[right] = Cell::new(&OVERFLOW_LEFT.to_string(), 1, color);
                }
            }
        }
    }

    /// Write a cluster at `(x, y)`, clipping and repairing as needed.
    pub fn set_cluster(&mut self, x: i32, y: i32, cluster: &str, width: u8, color: Color) {
        if width == 2 {
            // A wide head whose continuation falls outside the clip
            // degrades to the overflow placeholder.
            if self.index(x + 1, y).is_none() {
                if self.index(x, y).is_some() {
                    self.set_cluster(x, y, &OVERFLOW_RIGHT.to_string(), 1, color);
                }
                return;
            }
            if self.index(x, y).is_none() {
                if self.index(x + 1, y).is_some() {
                    self.set_cluster(x + 1, y, &OVERFLOW_LEFT.to_string(), 1, color);
                }
                return;
            }
            self.repair_before_write(x, y);
            self.repair_before_write(x + 1, y);
            let head = self.index(x, y).expect("checked above");
            self.cells[head] = Cell::new(cluster, 2, color.clone());
            let cont = self.index(x + 1, y).expect("checked above");
            self.cells[cont] = Cell::continuation(color);
        } else if let Some(i) = self.index(x, y) {
            self.repair_before_write(x, y);
            self.cells[i] = Cell::new(cluster, 1, color);
        }
    }

    /// Draw a single character.
    pub fn draw_char(&mut self, pos: Point, c: char, color: Color) {
        let mut buf = [0u8; 4];
        let s = c.encode_utf8(&mut buf);
        let width = unicode_char_width(c);
        self.set_cluster(pos.x, pos.y, s, width, color);
    }

    /// Draw plain text at a position.
    pub fn draw_text(&mut self, pos: Point, text: &str, color: Color) {
        self.draw_rich_text(pos, &RichText::styled(text, color), None, Alignment::Left, None);
    }

    /// Draw a rich string.
    ///
    /// With `width` set, the string is aligned/truncated to that many
    /// cells first. A `base_color` completes unstyled positions.
    pub fn draw_rich_text(
        &mut self,
        pos: Point,
        text: &RichText,
        width: Option<usize>,
        alignment: Alignment,
        base_color: Option<Color>,
    ) {
        let aligned;
        let text = match width {
            Some(w) => {
                aligned = text.align(w, alignment);
                &aligned
            }
            None => text,
        };
        // Complete after aligning so padding cells take the base color.
        let completed;
        let text = match base_color {
            Some(base) => {
                completed = text.complete_color(&base);
                &completed
            }
            None => text,
        };
        let mut x = pos.x;
        for (cluster, width, color) in text.cells() {
            self.set_cluster(x, pos.y, cluster, width, color.mod_at(x, pos.y));
            x += i32::from(width);
        }
    }

    /// Fill a rectangle with a character.
    pub fn fill(&mut self, rect: Rect, c: char, color: Color) {
        let Some(clipped) = rect.intersection_opt(&Rect::from_size(self.size())) else {
            return;
        };
        for y in clipped.y..clipped.bottom() {
            for x in clipped.x..clipped.right() {
                self.draw_char(Point::new(x, y), c, color.mod_at(x, y));
            }
        }
    }

    /// Draw a vertical line.
    pub fn draw_vline(&mut self, pos: Point, len: u16, color: Color) {
        for dy in 0..i32::from(len) {
            self.draw_char(Point::new(pos.x, pos.y + dy), '│', color.clone());
        }
    }

    /// Draw a horizontal line.
    pub fn draw_hline(&mut self, pos: Point, len: u16, color: Color) {
        for dx in 0..i32::from(len) {
            self.draw_char(Point::new(pos.x + dx, pos.y), '─', color.clone());
        }
    }

    /// Draw a box outline with Unicode line-draw characters.
    pub fn draw_box(&mut self, rect: Rect, color: Color, style: BoxStyle) {
        if rect.width < 2 || rect.height < 2 {
            return;
        }
        let [h, v, tl, tr, bl, br, ..] = style.glyphs();
        let right = rect.right() - 1;
        let bottom = rect.bottom() - 1;
        for x in (rect.x + 1)..right {
            self.draw_char(Point::new(x, rect.y), h, color.clone());
            self.draw_char(Point::new(x, bottom), h, color.clone());
        }
        for y in (rect.y + 1)..bottom {
            self.draw_char(Point::new(rect.x, y), v, color.clone());
            self.draw_char(Point::new(right, y), v, color.clone());
        }
        self.draw_char(Point::new(rect.x, rect.y), tl, color.clone());
        self.draw_char(Point::new(right, rect.y), tr, color.clone());
        self.draw_char(Point::new(rect.x, bottom), bl, color.clone());
        self.draw_char(Point::new(right, bottom), br, color);
    }

    /// Draw a box with internal separators.
    ///
    /// `hlines`/`vlines` are row/column offsets (relative to the box
    /// interior) where separator lines cross, joined with tee and cross
    /// glyphs.
    pub fn draw_grid(
        &mut self,
        rect: Rect,
        hlines: &[u16],
        vlines: &[u16],
        color: Color,
        style: BoxStyle,
    ) {
        if rect.width < 2 || rect.height < 2 {
            return;
        }
        let [h, v, _, _, _, _, t_down, t_up, t_right, t_left, cross] = style.glyphs();
        self.draw_box(rect, color.clone(), style);
        let right = rect.right() - 1;
        let bottom = rect.bottom() - 1;

        for &row in hlines {
            let y = rect.y + 1 + i32::from(row);
            if y <= rect.y || y >= bottom {
                continue;
            }
            for x in (rect.x + 1)..right {
                self.draw_char(Point::new(x, y), h, color.clone());
            }
            self.draw_char(Point::new(rect.x, y), t_right, color.clone());
            self.draw_char(Point::new(right, y), t_left, color.clone());
        }
        for &col in vlines {
            let x = rect.x + 1 + i32::from(col);
            if x <= rect.x || x >= right {
                continue;
            }
            for y in (rect.y + 1)..bottom {
                self.draw_char(Point::new(x, y), v, color.clone());
            }
            self.draw_char(Point::new(x, rect.y), t_down, color.clone());
            self.draw_char(Point::new(x, bottom), t_up, color.clone());
        }
        for &row in hlines {
            let y = rect.y + 1 + i32::from(row);
            if y <= rect.y || y >= bottom {
                continue;
            }
            for &col in vlines {
                let x = rect.x + 1 + i32::from(col);
                if x <= rect.x || x >= right {
                    continue;
                }
                self.draw_char(Point::new(x, y), cross, color.clone());
            }
        }
    }

    /// Blit a rectangle of `src` onto this canvas at `dst_pos`.
    ///
    /// Transparency rule: a source cell that is a space with no
    /// background is skipped; a source cell with no background keeps
    /// the destination cell's background.
    pub fn paint_canvas(&mut self, src: &Canvas, src_rect: Rect, dst_pos: Point) {
        let Some(src_rect) = src_rect.intersection_opt(&Rect::from_size(src.size())) else {
            return;
        };
        for sy in src_rect.y..src_rect.bottom() {
            let dy = dst_pos.y + (sy - src_rect.y);
            if dy < 0 || dy >= i32::from(self.height) {
                continue;
            }
            for sx in src_rect.x..src_rect.right() {
                let dx = dst_pos.x + (sx - src_rect.x);
                let Some(cell) = src.cell(sx, sy) else { continue };
                if cell.is_continuation() {
                    // Continuations are written by their head.
                    continue;
                }
                let transparent_bg = !cell.color().has_background();
                if cell.is_space() && transparent_bg {
                    continue;
                }
                let color = if transparent_bg {
                    match self.cell(dx, dy).and_then(|d| d.color().background()) {
                        Some(bg) => Color::bg_part(bg) + cell.color().clone(),
                        None => cell.color().clone(),
                    }
                } else {
                    cell.color().clone()
                };
                self.set_cluster(dx, dy, cell.text(), cell.width(), color);
            }
        }
    }

    /// Render each row to a plain string (wide heads once, no colors).
    ///
    /// Test helper for golden comparisons.
    #[must_use]
    pub fn to_plain_rows(&self) -> Vec<String> {
        (0..i32::from(self.height))
            .map(|y| {
                (0..i32::from(self.width))
                    .filter_map(|x| self.cell(x, y))
                    .filter(|c| !c.is_continuation())
                    .map(Cell::text)
                    .collect()
            })
            .collect()
    }
}

/// Display width of a single char, clamped to the 1..=2 cell range.
fn unicode_char_width(c: char) -> u8 {
    use unicode_width::UnicodeWidthChar;
    c.width().unwrap_or(1).clamp(1, 2) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_canvas_is_blank() {
        let c = Canvas::new(4, 2);
        assert_eq!(c.to_plain_rows(), vec!["    ", "    "]);
    }

    #[test]
    fn draw_text_clips_out_of_bounds() {
        let mut c = Canvas::new(5, 1);
        c.draw_text(Point::new(3, 0), "abcdef", Color::RESET);
        assert_eq!(c.to_plain_rows(), vec!["   ab"]);
        // Negative origin clips on the left.
        let mut c = Canvas::new(5, 1);
        c.draw_text(Point::new(-2, 0), "abcdef", Color::RESET);
        assert_eq!(c.to_plain_rows(), vec!["cdef "]);
    }

    #[test]
    fn wide_cluster_writes_continuation() {
        let mut c = Canvas::new(4, 1);
        c.draw_text(Point::new(0, 0), "漢a", Color::RESET);
        assert!(c.cell(1, 0).unwrap().is_continuation());
        assert_eq!(c.cell(0, 0).unwrap().text(), "漢");
        assert_eq!(c.cell(2, 0).unwrap().text(), "a");
    }

    #[test]
    fn wide_cluster_at_clip_degrades_to_placeholder() {
        let mut c = Canvas::new(3, 1);
        c.draw_text(Point::new(2, 0), "漢", Color::RESET);
        assert_eq!(c.cell(2, 0).unwrap().text(), OVERFLOW_RIGHT.to_string());
    }

    #[test]
    fn overwriting_wide_half_repairs_other_half() {
        let mut c = Canvas::new(4, 1);
        c.draw_text(Point::new(0, 0), "漢", Color::RESET);
        // Overwrite the continuation cell.
        c.draw_char(Point::new(1, 0), 'x', Color::RESET);
        assert_eq!(c.cell(0, 0).unwrap().text(), OVERFLOW_RIGHT.to_string());
        assert_eq!(c.cell(1, 0).unwrap().text(), "x");
    }

    #[test]
    fn fill_respects_clipping() {
        let mut c = Canvas::new(4, 3);
        c.fill(Rect::new(2, 1, 10, 10), '#', Color::RESET);
        assert_eq!(c.to_plain_rows(), vec!["    ", "  ##", "  ##"]);
    }

    #[test]
    fn draw_box_corners() {
        let mut c = Canvas::new(4, 3);
        c.draw_box(Rect::new(0, 0, 4, 3), Color::RESET, BoxStyle::Single);
        assert_eq!(c.to_plain_rows(), vec!["┌──┐", "│  │", "└──┘"]);
    }

    #[test]
    fn draw_grid_junctions() {
        let mut c = Canvas::new(5, 5);
        c.draw_grid(
            Rect::new(0, 0, 5, 5),
            &[1],
            &[1],
            Color::RESET,
            BoxStyle::Single,
        );
        let rows = c.to_plain_rows();
        assert_eq!(rows[0], "┌─┬─┐");
        assert_eq!(rows[2], "├─┼─┤");
        assert_eq!(rows[4], "└─┴─┘");
    }

    #[test]
    fn blit_skips_transparent_space() {
        let mut dst = Canvas::new(3, 1);
        dst.draw_text(Point::new(0, 0), "xyz", Color::RESET);
        let mut src = Canvas::new(3, 1);
        src.draw_char(Point::new(1, 0), 'B', Color::RESET);
        dst.paint_canvas(&src, Rect::new(0, 0, 3, 1), Point::new(0, 0));
        // Spaces with no background skipped; only 'B' lands.
        assert_eq!(dst.to_plain_rows(), vec!["xBz"]);
    }

    #[test]
    fn blit_space_with_background_overwrites() {
        let mut dst = Canvas::new(1, 1);
        dst.draw_char(Point::new(0, 0), 'x', Color::RESET);
        let mut src = Canvas::new(1, 1);
        src.draw_char(Point::new(0, 0), ' ', Color::bg("#ff0000"));
        dst.paint_canvas(&src, Rect::new(0, 0, 1, 1), Point::new(0, 0));
        assert_eq!(dst.cell(0, 0).unwrap().text(), " ");
        assert!(dst.cell(0, 0).unwrap().color().has_background());
    }

    #[test]
    fn blit_preserves_destination_background() {
        let mut dst = Canvas::new(1, 1);
        dst.draw_char(Point::new(0, 0), ' ', Color::bg("#0000ff"));
        let mut src = Canvas::new(1, 1);
        src.draw_char(Point::new(0, 0), 'A', Color::fg("#ffffff"));
        dst.paint_canvas(&src, Rect::new(0, 0, 1, 1), Point::new(0, 0));
        let cell = dst.cell(0, 0).unwrap();
        assert_eq!(cell.text(), "A");
        assert!(cell.color().has_background(), "dst background preserved");
    }

    #[test]
    fn blit_clips_at_destination_edges() {
        let mut dst = Canvas::new(3, 1);
        let mut src = Canvas::new(3, 1);
        src.draw_text(Point::new(0, 0), "ABC", Color::RESET);
        dst.paint_canvas(&src, Rect::new(0, 0, 3, 1), Point::new(2, 0));
        assert_eq!(dst.to_plain_rows(), vec!["  A"]);
    }

    #[test]
    fn rich_text_width_alignment() {
        let mut c = Canvas::new(8, 1);
        c.draw_rich_text(
            Point::new(0, 0),
            &RichText::raw("ab"),
            Some(8),
            Alignment::Right,
            None,
        );
        assert_eq!(c.to_plain_rows(), vec!["      ab"]);
    }
}
