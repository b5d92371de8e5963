#![forbid(unsafe_code)]

//! Layout geometry solvers.
//!
//! The solvers here are pure: they take an area and a set of size
//! hints, and return rectangles. The widget crate owns the mapping
//! from solved rectangles back to widgets.
//!
//! # Algorithm
//!
//! Each grid row/column starts at the maximum of its items' minimum
//! hints and may grow up to the maximum hints. Remaining space is
//! distributed proportionally to `(max - min)` slack, remainder cells
//! going to the lowest indices first. A layout never shrinks an item
//! below its minimum; when the area is oversubscribed, items keep
//! their minimums and clip in index order at the area boundary.

use weft_core::geometry::{Rect, Size};

/// Orientation for linear layouts and splitters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    /// Children stack left to right.
    #[default]
    Horizontal,
    /// Children stack top to bottom.
    Vertical,
}

/// Minimum and maximum size hints for a layout item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeHint {
    /// Smallest acceptable size.
    pub min: Size,
    /// Largest useful size.
    pub max: Size,
}

impl Default for SizeHint {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

impl SizeHint {
    /// No minimum, unlimited maximum.
    pub const UNBOUNDED: Self = Self {
        min: Size::ZERO,
        max: Size::new(u16::MAX, u16::MAX),
    };

    /// Exact size: min = max.
    #[must_use]
    pub const fn exact(size: Size) -> Self {
        Self {
            min: size,
            max: size,
        }
    }

    /// A minimum with unlimited maximum.
    #[must_use]
    pub const fn at_least(min: Size) -> Self {
        Self {
            min,
            max: Size::new(u16::MAX, u16::MAX),
        }
    }

    /// Per-axis projection: `(min, max)` along the given orientation.
    #[must_use]
    pub const fn axis(&self, orientation: Orientation) -> (u16, u16) {
        match orientation {
            Orientation::Horizontal => (self.min.width, self.max.width),
            Orientation::Vertical => (self.min.height, self.max.height),
        }
    }
}

/// Grid placement of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Grid row.
    pub row: u16,
    /// Grid column.
    pub col: u16,
    /// Rows spanned (≥ 1).
    pub row_span: u16,
    /// Columns spanned (≥ 1).
    pub col_span: u16,
    /// The item's size hints.
    pub hint: SizeHint,
}

impl Placement {
    /// Place an item in a single grid cell.
    #[must_use]
    pub const fn cell(row: u16, col: u16, hint: SizeHint) -> Self {
        Self {
            row,
            col,
            row_span: 1,
            col_span: 1,
            hint,
        }
    }
}

/// Distribute `total` cells over items with `(min, max)` bounds.
///
/// Every item receives at least `min`. Leftover space is split
/// proportionally to each item's `(max - min)` slack; remainder cells
/// go to the lowest indices still below their maximum.
#[must_use]
pub fn solve_axis(total: u16, bounds: &[(u16, u16)]) -> Vec<u16> {
    let mut sizes: Vec<u16> = bounds.iter().map(|&(min, _)| min).collect();
    let used: u64 = sizes.iter().map(|&s| u64::from(s)).sum();
    let total = u64::from(total);
    if used >= total {
        // Oversubscribed: keep minimums; callers clip in index order.
        return sizes;
    }
    let mut leftover = total - used;
    let slack: Vec<u64> = bounds
        .iter()
        .map(|&(min, max)| u64::from(max.max(min)) - u64::from(min))
        .collect();
    let total_slack: u64 = slack.iter().sum();
    if total_slack == 0 {
        return sizes;
    }

    // Proportional share, floor division.
    let mut grown = 0u64;
    for (i, size) in sizes.iter_mut().enumerate() {
        let share = leftover * slack[i] / total_slack;
        let share = share.min(slack[i]);
        *size = (u64::from(*size) + share).min(u64::from(u16::MAX)) as u16;
        grown += share;
    }
    leftover -= grown;

    // Remainder cells one by one, ties broken by index order.
    while leftover > 0 {
        let mut advanced = false;
        for (i, size) in sizes.iter_mut().enumerate() {
            if leftover == 0 {
                break;
            }
            let (min, max) = bounds[i];
            let max = max.max(min);
            if *size < max {
                *size += 1;
                leftover -= 1;
                advanced = true;
            }
        }
        if !advanced {
            break;
        }
    }
    sizes
}

/// Solve a grid layout: returns one rectangle per placement, in input
/// order, positioned inside `area`.
///
/// Rectangles are clipped to `area` in index order; an item that falls
/// completely outside gets an empty rectangle.
#[must_use]
pub fn solve_grid(area: Rect, placements: &[Placement]) -> Vec<Rect> {
    if placements.is_empty() {
        return Vec::new();
    }
    let cols = placements
        .iter()
        .map(|p| p.col + p.col_span.max(1))
        .max()
        .unwrap_or(1) as usize;
    let rows = placements
        .iter()
        .map(|p| p.row + p.row_span.max(1))
        .max()
        .unwrap_or(1) as usize;

    // Column bounds: spanning items spread their hints evenly.
    let mut col_bounds = vec![(0u16, 0u16); cols];
    let mut row_bounds = vec![(0u16, 0u16); rows];
    for p in placements {
        let (min_w, max_w) = (p.hint.min.width, p.hint.max.width);
        let span = p.col_span.max(1);
        let per_min = min_w.div_ceil(span);
        let per_max = if max_w == u16::MAX {
            u16::MAX
        } else {
            max_w.div_ceil(span)
        };
        for c in p.col..p.col + span {
            let b = &mut col_bounds[c as usize];
            b.0 = b.0.max(per_min);
            b.1 = b.1.max(per_max);
        }
        let (min_h, max_h) = (p.hint.min.height, p.hint.max.height);
        let span = p.row_span.max(1);
        let per_min = min_h.div_ceil(span);
        let per_max = if max_h == u16::MAX {
            u16::MAX
        } else {
            max_h.div_ceil(span)
        };
        for r in p.row..p.row + span {
            let b = &mut row_bounds[r as usize];
            b.0 = b.0.max(per_min);
            b.1 = b.1.max(per_max);
        }
    }
    // Rows/columns nobody constrains are free to absorb leftover space.
    for b in col_bounds.iter_mut().chain(row_bounds.iter_mut()) {
        if b.1 < b.0 {
            b.1 = b.0;
        }
        if *b == (0, 0) {
            b.1 = u16::MAX;
        }
    }

    let col_sizes = solve_axis(area.width, &col_bounds);
    let row_sizes = solve_axis(area.height, &row_bounds);

    // Prefix offsets.
    let mut col_offsets = Vec::with_capacity(cols + 1);
    let mut acc = 0i32;
    for &w in std::iter::once(&0u16).chain(col_sizes.iter()) {
        acc += i32::from(w);
        col_offsets.push(acc);
    }
    let mut row_offsets = Vec::with_capacity(rows + 1);
    let mut acc = 0i32;
    for &h in std::iter::once(&0u16).chain(row_sizes.iter()) {
        acc += i32::from(h);
        row_offsets.push(acc);
    }

    placements
        .iter()
        .map(|p| {
            let col_span = p.col_span.max(1) as usize;
            let row_span = p.row_span.max(1) as usize;
            let x = area.x + col_offsets[p.col as usize];
            let y = area.y + row_offsets[p.row as usize];
            let w = (col_offsets[p.col as usize + col_span] - col_offsets[p.col as usize]) as u16;
            let h = (row_offsets[p.row as usize + row_span] - row_offsets[p.row as usize]) as u16;
            // Clip in index order against the layout area.
            Rect::new(x, y, w, h).intersection(&area)
        })
        .collect()
}

/// Solve a one-dimensional box layout along `orientation`.
///
/// The cross axis is filled. Returns one rectangle per hint, in order.
#[must_use]
pub fn solve_box(area: Rect, orientation: Orientation, hints: &[SizeHint]) -> Vec<Rect> {
    let placements: Vec<Placement> = hints
        .iter()
        .enumerate()
        .map(|(i, &hint)| match orientation {
            Orientation::Horizontal => Placement::cell(0, i as u16, hint),
            Orientation::Vertical => Placement::cell(i as u16, 0, hint),
        })
        .collect();
    solve_grid(area, &placements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hint(min_w: u16, max_w: u16) -> SizeHint {
        SizeHint {
            min: Size::new(min_w, 0),
            max: Size::new(max_w, u16::MAX),
        }
    }

    #[test]
    fn axis_respects_minimums() {
        let sizes = solve_axis(10, &[(4, 4), (4, 4)]);
        assert_eq!(sizes, vec![4, 4]);
    }

    #[test]
    fn axis_distributes_proportionally_to_slack() {
        // Slack 10 vs 30 over 20 leftover cells: 5 and 15.
        let sizes = solve_axis(20, &[(0, 10), (0, 30)]);
        assert_eq!(sizes, vec![5, 15]);
    }

    #[test]
    fn axis_remainder_goes_to_lowest_index() {
        // 7 cells over two equal unbounded items: 4 and 3.
        let sizes = solve_axis(7, &[(0, u16::MAX), (0, u16::MAX)]);
        assert_eq!(sizes[0] + sizes[1], 7);
        assert!(sizes[0] >= sizes[1]);
    }

    #[test]
    fn axis_oversubscribed_keeps_minimums() {
        let sizes = solve_axis(5, &[(4, 8), (4, 8)]);
        assert_eq!(sizes, vec![4, 4]);
    }

    #[test]
    fn axis_growth_capped_at_max() {
        let sizes = solve_axis(100, &[(2, 5), (2, 7)]);
        assert_eq!(sizes, vec![5, 7]);
    }

    #[test]
    fn hbox_fills_cross_axis() {
        let area = Rect::new(0, 0, 10, 4);
        let rects = solve_box(area, Orientation::Horizontal, &[hint(3, 3), hint(0, u16::MAX)]);
        assert_eq!(rects[0], Rect::new(0, 0, 3, 4));
        assert_eq!(rects[1], Rect::new(3, 0, 7, 4));
    }

    #[test]
    fn vbox_stacks_vertically() {
        let area = Rect::new(0, 0, 8, 6);
        let rects = solve_box(
            area,
            Orientation::Vertical,
            &[SizeHint::exact(Size::new(8, 2)), SizeHint::UNBOUNDED],
        );
        assert_eq!(rects[0], Rect::new(0, 0, 8, 2));
        assert_eq!(rects[1], Rect::new(0, 2, 8, 4));
    }

    #[test]
    fn grid_spanning_item_covers_columns() {
        let area = Rect::new(0, 0, 10, 4);
        let placements = [
            Placement::cell(0, 0, SizeHint::UNBOUNDED),
            Placement::cell(0, 1, SizeHint::UNBOUNDED),
            Placement {
                row: 1,
                col: 0,
                row_span: 1,
                col_span: 2,
                hint: SizeHint::UNBOUNDED,
            },
        ];
        let rects = solve_grid(area, &placements);
        assert_eq!(rects[2].width, 10);
        assert_eq!(rects[2].x, 0);
        assert_eq!(rects[0].width + rects[1].width, 10);
    }

    #[test]
    fn grid_clips_oversubscribed_in_index_order() {
        let area = Rect::new(0, 0, 6, 2);
        let placements = [
            Placement::cell(0, 0, hint(4, 4)),
            Placement::cell(0, 1, hint(4, 4)),
        ];
        let rects = solve_grid(area, &placements);
        assert_eq!(rects[0].width, 4);
        // Second item starts at 4, clipped at the area edge.
        assert_eq!(rects[1].x, 4);
        assert_eq!(rects[1].width, 2);
    }

    #[test]
    fn empty_layout_is_empty() {
        assert!(solve_grid(Rect::new(0, 0, 5, 5), &[]).is_empty());
    }

    proptest! {
        #[test]
        fn axis_total_never_exceeds_budget_when_feasible(
            total in 0u16..200,
            mins in proptest::collection::vec(0u16..20, 1..6),
        ) {
            let bounds: Vec<(u16, u16)> = mins.iter().map(|&m| (m, m + 10)).collect();
            let sizes = solve_axis(total, &bounds);
            let min_sum: u64 = mins.iter().map(|&m| u64::from(m)).sum();
            let size_sum: u64 = sizes.iter().map(|&s| u64::from(s)).sum();
            if min_sum <= u64::from(total) {
                prop_assert!(size_sum <= u64::from(total).max(min_sum));
            } else {
                prop_assert_eq!(size_sum, min_sum);
            }
            for (i, &s) in sizes.iter().enumerate() {
                prop_assert!(s >= bounds[i].0);
                prop_assert!(s <= bounds[i].1.max(bounds[i].0));
            }
        }
    }
}
