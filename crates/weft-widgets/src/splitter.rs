#![forbid(unsafe_code)]

//! Interactive splitter: panes separated by draggable single-cell
//! handle bars.
//!
//! The splitter owns its arena children's geometry through
//! `layout_children`. Dragging a handle resizes only the two adjacent
//! panes, snapping to each side's min/max hints.

use std::any::Any;

use weft_canvas::Canvas;
use weft_core::event::{MouseButton, MouseEvent};
use weft_core::geometry::{Rect, Size};
use weft_layout::{solve_axis, Orientation, SizeHint};
use weft_style::Color;

use crate::widget::{EventCtx, Widget, WidgetCore};

/// A splitter container widget.
pub struct Splitter {
    orientation: Orientation,
    /// Desired pane sizes along the axis; resynced on layout.
    sizes: Vec<i32>,
    /// Last-seen per-pane `(min, max)` bounds along the axis.
    bounds: Vec<(u16, u16)>,
    /// Handle boundary positions along the axis (cached by layout).
    handles: Vec<i32>,
    dragging: Option<usize>,
}

impl Splitter {
    /// Create a splitter along an orientation.
    #[must_use]
    pub fn new(orientation: Orientation) -> Self {
        Self {
            orientation,
            sizes: Vec::new(),
            bounds: Vec::new(),
            handles: Vec::new(),
            dragging: None,
        }
    }

    /// The splitter orientation.
    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Explicitly set pane sizes (clamped on next layout).
    pub fn set_sizes(&mut self, sizes: Vec<i32>) {
        self.sizes = sizes;
    }

    /// Current pane sizes.
    #[must_use]
    pub fn sizes(&self) -> &[i32] {
        &self.sizes
    }

    fn axis_len(&self, size: Size) -> i32 {
        match self.orientation {
            Orientation::Horizontal => i32::from(size.width),
            Orientation::Vertical => i32::from(size.height),
        }
    }

    fn axis_pos(&self, ev: &MouseEvent) -> i32 {
        match self.orientation {
            Orientation::Horizontal => ev.x,
            Orientation::Vertical => ev.y,
        }
    }

    /// The handle index at an axis position, if any.
    fn handle_at(&self, pos: i32) -> Option<usize> {
        self.handles.iter().position(|&h| h == pos)
    }

    /// Drag handle `idx` to axis position `pos`: only the two adjacent
    /// panes change, snapping to their min/max.
    fn move_handle(&mut self, idx: usize, pos: i32) -> bool {
        if idx + 1 >= self.sizes.len() || idx >= self.handles.len() {
            return false;
        }
        let current = self.handles[idx];
        let delta = pos - current;
        if delta == 0 {
            return false;
        }
        let left = self.sizes[idx];
        let right = self.sizes[idx + 1];
        let (lmin, lmax) = self.bounds.get(idx).copied().unwrap_or((0, u16::MAX));
        let (rmin, rmax) = self.bounds.get(idx + 1).copied().unwrap_or((0, u16::MAX));

        let new_left = (left + delta)
            .clamp(i32::from(lmin), i32::from(lmax))
            .min(left + right - i32::from(rmin))
            .max(left + right - i32::from(rmax));
        let applied = new_left - left;
        if applied == 0 {
            return false;
        }
        self.sizes[idx] = left + applied;
        self.sizes[idx + 1] = right - applied;
        true
    }
}

impl Widget for Splitter {
    fn paint(&mut self, canvas: &mut Canvas, core: &WidgetCore) {
        let size = core.size();
        let style = core.current_style().clone();
        let bar_style = style + Color::fg("bright black");
        for &h in &self.handles {
            match self.orientation {
                Orientation::Horizontal => {
                    canvas.draw_vline(
                        weft_core::geometry::Point::new(h, 0),
                        size.height,
                        bar_style.clone(),
                    );
                }
                Orientation::Vertical => {
                    canvas.draw_hline(
                        weft_core::geometry::Point::new(0, h),
                        size.width,
                        bar_style.clone(),
                    );
                }
            }
        }
    }

    fn layout_children(&mut self, size: Size, hints: &[SizeHint]) -> Option<Vec<Rect>> {
        let n = hints.len();
        if n == 0 {
            self.sizes.clear();
            self.handles.clear();
            return Some(Vec::new());
        }
        self.bounds = hints.iter().map(|h| h.axis(self.orientation)).collect();
        let handle_cells = (n - 1) as i32;
        let available = (self.axis_len(size) - handle_cells).max(0) as u16;

        if self.sizes.len() != n {
            // Fresh distribution from hints.
            self.sizes = solve_axis(available, &self.bounds)
                .into_iter()
                .map(i32::from)
                .collect();
        } else {
            // Keep proportions, fix rounding into the last pane.
            let current: i32 = self.sizes.iter().sum();
            let target = i32::from(available);
            if current != target && current > 0 {
                let mut acc = 0;
                for s in self.sizes.iter_mut().take(n - 1) {
                    *s = (*s * target) / current;
                    acc += *s;
                }
                self.sizes[n - 1] = (target - acc).max(0);
            } else if current <= 0 {
                self.sizes = solve_axis(available, &self.bounds)
                    .into_iter()
                    .map(i32::from)
                    .collect();
            }
        }

        // Build rects and cache handle positions.
        self.handles.clear();
        let mut rects = Vec::with_capacity(n);
        let mut pos = 0i32;
        for (i, &pane) in self.sizes.iter().enumerate() {
            let pane = pane.max(0) as u16;
            let rect = match self.orientation {
                Orientation::Horizontal => Rect::new(pos, 0, pane, size.height),
                Orientation::Vertical => Rect::new(0, pos, size.width, pane),
            };
            rects.push(rect);
            pos += i32::from(pane);
            if i + 1 < n {
                self.handles.push(pos);
                pos += 1;
            }
        }
        Some(rects)
    }

    fn mouse_press(&mut self, ev: &MouseEvent, _ctx: &mut EventCtx) -> bool {
        if ev.button != MouseButton::Left {
            return false;
        }
        match self.handle_at(self.axis_pos(ev)) {
            Some(idx) => {
                self.dragging = Some(idx);
                true
            }
            None => false,
        }
    }

    fn mouse_drag(&mut self, ev: &MouseEvent, ctx: &mut EventCtx) -> bool {
        let Some(idx) = self.dragging else {
            return false;
        };
        if self.move_handle(idx, self.axis_pos(ev)) {
            ctx.relayout();
            ctx.update();
        }
        true
    }

    fn mouse_release(&mut self, _ev: &MouseEvent, _ctx: &mut EventCtx) -> bool {
        self.dragging.take().is_some()
    }

    fn as_any(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints(n: usize) -> Vec<SizeHint> {
        vec![SizeHint::UNBOUNDED; n]
    }

    #[test]
    fn layout_reserves_handle_cells() {
        let mut s = Splitter::new(Orientation::Horizontal);
        let rects = s
            .layout_children(Size::new(21, 5), &hints(2))
            .unwrap();
        assert_eq!(rects.len(), 2);
        let total: u16 = rects.iter().map(|r| r.width).sum();
        assert_eq!(total, 20, "one cell goes to the handle");
        assert_eq!(s.handles.len(), 1);
        assert_eq!(rects[1].x, rects[0].width as i32 + 1);
    }

    #[test]
    fn drag_moves_only_adjacent_panes() {
        let mut s = Splitter::new(Orientation::Horizontal);
        s.layout_children(Size::new(32, 5), &hints(3));
        let before = s.sizes().to_vec();
        let handle = s.handles[0];
        assert!(s.move_handle(0, handle + 3));
        assert_eq!(s.sizes()[0], before[0] + 3);
        assert_eq!(s.sizes()[1], before[1] - 3);
        assert_eq!(s.sizes()[2], before[2], "third pane untouched");
    }

    #[test]
    fn drag_snaps_to_min() {
        let mut s = Splitter::new(Orientation::Horizontal);
        let hint_list = vec![
            SizeHint::at_least(Size::new(4, 0)),
            SizeHint::at_least(Size::new(4, 0)),
        ];
        s.layout_children(Size::new(21, 5), &hint_list);
        let handle = s.handles[0];
        // Try to collapse the left pane entirely.
        s.move_handle(0, handle - 100);
        assert_eq!(s.sizes()[0], 4, "snapped to the left pane's minimum");
    }

    #[test]
    fn resize_keeps_proportions() {
        let mut s = Splitter::new(Orientation::Horizontal);
        s.layout_children(Size::new(21, 5), &hints(2));
        s.move_handle(0, 15);
        let before = s.sizes().to_vec();
        s.layout_children(Size::new(41, 5), &hints(2));
        let after = s.sizes();
        assert!(after[0] > before[0]);
        assert_eq!(after.iter().sum::<i32>(), 40);
    }
}
