#![forbid(unsafe_code)]

//! Damage computation between two frames.
//!
//! The diff is a row-major scan comparing cells; consecutive changed
//! cells on a row coalesce into a [`DiffRun`]. The presenter turns each
//! run into one cursor move plus one write.
//!
//! Property: applying a diff to the old canvas reproduces the new one;
//! identical canvases diff to nothing.

use crate::canvas::{Canvas, Cell};

/// A contiguous run of changed cells on a single row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffRun {
    /// Row index.
    pub y: u16,
    /// Start column (inclusive).
    pub x0: u16,
    /// The new cell contents, in column order.
    pub cells: Vec<Cell>,
}

impl DiffRun {
    /// End column (inclusive).
    #[must_use]
    pub fn x1(&self) -> u16 {
        self.x0 + self.cells.len() as u16 - 1
    }

    /// Number of cells in the run.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check for an empty run (never produced by `compute`).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// The difference between two equally sized canvases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanvasDiff {
    runs: Vec<DiffRun>,
}

impl CanvasDiff {
    /// Compute the diff between two canvases of identical size.
    ///
    /// # Panics
    ///
    /// Debug-asserts that both canvases have the same dimensions.
    #[must_use]
    pub fn compute(old: &Canvas, new: &Canvas) -> Self {
        debug_assert_eq!(old.width(), new.width(), "canvas widths must match");
        debug_assert_eq!(old.height(), new.height(), "canvas heights must match");

        let width = i32::from(new.width());
        let height = i32::from(new.height());
        let mut runs = Vec::new();

        for y in 0..height {
            let mut run: Option<DiffRun> = None;
            for x in 0..width {
                let changed = old.cell(x, y) != new.cell(x, y);
                if changed {
                    let cell = new.cell(x, y).cloned().unwrap_or_default();
                    match &mut run {
                        Some(r) => r.cells.push(cell),
                        None => {
                            run = Some(DiffRun {
                                y: y as u16,
                                x0: x as u16,
                                cells: vec![cell],
                            });
                        }
                    }
                } else if let Some(r) = run.take() {
                    runs.push(r);
                }
            }
            if let Some(r) = run.take() {
                runs.push(r);
            }
        }
        Self { runs }
    }

    /// The coalesced change runs, in row-major order.
    #[must_use]
    pub fn runs(&self) -> &[DiffRun] {
        &self.runs
    }

    /// Total changed cell count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.iter().map(DiffRun::len).sum()
    }

    /// Check whether nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Apply this diff to a canvas, cell by cell.
    pub fn apply(&self, target: &mut Canvas) {
        for run in &self.runs {
            for (i, cell) in run.cells.iter().enumerate() {
                let x = i32::from(run.x0) + i as i32;
                let y = i32::from(run.y);
                if cell.is_continuation() {
                    // Continuations land when their head is written.
                    continue;
                }
                target.set_cluster(x, y, cell.text(), cell.width(), cell.color().clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use weft_core::geometry::Point;
    use weft_style::Color;

    #[test]
    fn identical_canvases_diff_empty() {
        let a = Canvas::new(10, 4);
        let b = Canvas::new(10, 4);
        let d = CanvasDiff::compute(&a, &b);
        assert!(d.is_empty());
        assert_eq!(d.len(), 0);
    }

    #[test]
    fn adjacent_changes_coalesce() {
        let a = Canvas::new(10, 2);
        let mut b = Canvas::new(10, 2);
        b.draw_text(Point::new(3, 1), "xyz", Color::RESET);
        let d = CanvasDiff::compute(&a, &b);
        assert_eq!(d.runs().len(), 1);
        let run = &d.runs()[0];
        assert_eq!((run.y, run.x0, run.x1()), (1, 3, 5));
    }

    #[test]
    fn gap_splits_runs() {
        let a = Canvas::new(10, 1);
        let mut b = Canvas::new(10, 1);
        b.draw_char(Point::new(0, 0), 'a', Color::RESET);
        b.draw_char(Point::new(5, 0), 'b', Color::RESET);
        let d = CanvasDiff::compute(&a, &b);
        assert_eq!(d.runs().len(), 2);
    }

    #[test]
    fn color_only_change_detected() {
        let a = Canvas::new(3, 1);
        let mut b = Canvas::new(3, 1);
        b.draw_char(Point::new(1, 0), ' ', Color::bg("#ff0000"));
        let d = CanvasDiff::compute(&a, &b);
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn apply_reproduces_target() {
        let mut a = Canvas::new(12, 3);
        a.draw_text(Point::new(0, 0), "before state", Color::RESET);
        let mut b = Canvas::new(12, 3);
        b.draw_text(Point::new(2, 1), "after 漢字", Color::fg("#00ff00"));

        let d = CanvasDiff::compute(&a, &b);
        d.apply(&mut a);
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn apply_diff_roundtrip(
            old_texts in proptest::collection::vec("[a-z 漢]{0,8}", 3),
            new_texts in proptest::collection::vec("[a-z 漢]{0,8}", 3),
        ) {
            let mut old = Canvas::new(10, 3);
            let mut new = Canvas::new(10, 3);
            for (y, t) in old_texts.iter().enumerate() {
                old.draw_text(Point::new(0, y as i32), t, Color::RESET);
            }
            for (y, t) in new_texts.iter().enumerate() {
                new.draw_text(Point::new(0, y as i32), t, Color::RESET);
            }
            let d = CanvasDiff::compute(&old, &new);
            d.apply(&mut old);
            prop_assert_eq!(old, new);
        }
    }
}
