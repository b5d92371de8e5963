#![forbid(unsafe_code)]

//! Scroll bars and the scroll area composite.
//!
//! A [`ScrollContainer`] owns a [`Viewport`] plus two [`ScrollBar`]s.
//! Every paint it reads the viewport's full-area size, configures each
//! bar's page-step, range, and value, and applies the visibility
//! policies. The horizontal bar reserves the bottom row; the vertical
//! bar overlays the right column, so the displayed width stays the full
//! widget width.
//!
//! Wheel and page-navigation events reach the viewport through normal
//! dispatch first; only when the viewport declines them does the
//! container move its offsets.

use std::any::Any;

use weft_canvas::Canvas;
use weft_core::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use weft_core::geometry::{Point, Rect, Size};
use weft_layout::Orientation;
use weft_style::Color;

use crate::widget::{EventCtx, Widget, WidgetCore};

/// Scroll bar visibility policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollBarPolicy {
    /// Visible only when the content overflows.
    #[default]
    AsNeeded,
    /// Always visible.
    AlwaysOn,
    /// Never visible.
    AlwaysOff,
}

/// One scroll bar: arrows at the ends, a proportional thumb between.
#[derive(Debug, Clone)]
pub struct ScrollBar {
    orientation: Orientation,
    value: i32,
    range: i32,
    page_step: i32,
    visible: bool,
    drag_anchor: Option<i32>,
}

impl ScrollBar {
    /// Create a bar along an orientation.
    #[must_use]
    pub fn new(orientation: Orientation) -> Self {
        Self {
            orientation,
            value: 0,
            range: 0,
            page_step: 1,
            visible: false,
            drag_anchor: None,
        }
    }

    /// Current value (top/left content offset).
    #[must_use]
    pub const fn value(&self) -> i32 {
        self.value
    }

    /// Maximum value.
    #[must_use]
    pub const fn range(&self) -> i32 {
        self.range
    }

    /// Page step (one viewport worth of content).
    #[must_use]
    pub const fn page_step(&self) -> i32 {
        self.page_step
    }

    /// Whether the bar currently draws.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Set the value, clamped into `0..=range`.
    pub fn set_value(&mut self, value: i32) {
        self.value = value.clamp(0, self.range);
    }

    /// Set the maximum value.
    pub fn set_range(&mut self, range: i32) {
        self.range = range.max(0);
        self.value = self.value.clamp(0, self.range);
    }

    /// Set the page step.
    pub fn set_page_step(&mut self, page: i32) {
        self.page_step = page.max(1);
    }

    /// Show or hide the bar.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn track_len(&self, len: u16) -> i32 {
        i32::from(len.saturating_sub(2))
    }

    fn thumb_metrics(&self, len: u16) -> (i32, i32) {
        let track = self.track_len(len);
        if track <= 0 {
            return (0, 0);
        }
        let total = self.range + self.page_step;
        let size = ((track * self.page_step) / total.max(1)).clamp(1, track);
        let span = track - size;
        let pos = if self.range > 0 {
            (self.value * span) / self.range
        } else {
            0
        };
        (pos, size)
    }

    /// Draw the bar into `rect` on `canvas`.
    pub fn draw(&self, canvas: &mut Canvas, rect: Rect, color: Color) {
        if !self.visible || rect.is_empty() {
            return;
        }
        match self.orientation {
            Orientation::Vertical => {
                let len = rect.height;
                canvas.draw_char(Point::new(rect.x, rect.y), '▲', color.clone());
                canvas.draw_char(Point::new(rect.x, rect.bottom() - 1), '▼', color.clone());
                let (pos, size) = self.thumb_metrics(len);
                for i in 0..self.track_len(len) {
                    let c = if i >= pos && i < pos + size { '█' } else { '▓' };
                    canvas.draw_char(Point::new(rect.x, rect.y + 1 + i), c, color.clone());
                }
            }
            Orientation::Horizontal => {
                let len = rect.width;
                canvas.draw_char(Point::new(rect.x, rect.y), '◀', color.clone());
                canvas.draw_char(Point::new(rect.right() - 1, rect.y), '▶', color.clone());
                let (pos, size) = self.thumb_metrics(len);
                for i in 0..self.track_len(len) {
                    let c = if i >= pos && i < pos + size { '█' } else { '▓' };
                    canvas.draw_char(Point::new(rect.x + 1 + i, rect.y), c, color.clone());
                }
            }
        }
    }

    /// Handle a press at offset `at` along the bar of length `len`.
    ///
    /// Returns the new value when the interaction moved it.
    pub fn press(&mut self, at: i32, len: u16) -> Option<i32> {
        if !self.visible {
            return None;
        }
        let track = self.track_len(len);
        if at == 0 {
            self.set_value(self.value - 1);
            return Some(self.value);
        }
        if at == i32::from(len) - 1 {
            self.set_value(self.value + 1);
            return Some(self.value);
        }
        let (pos, size) = self.thumb_metrics(len);
        let track_at = at - 1;
        if track_at < pos {
            self.set_value(self.value - self.page_step);
        } else if track_at >= pos + size {
            self.set_value(self.value + self.page_step);
        } else {
            self.drag_anchor = Some(track_at - pos);
            return Some(self.value);
        }
        let _ = track;
        Some(self.value)
    }

    /// Handle a drag to offset `at` along the bar.
    pub fn drag(&mut self, at: i32, len: u16) -> Option<i32> {
        let anchor = self.drag_anchor?;
        let track = self.track_len(len);
        let (_, size) = self.thumb_metrics(len);
        let span = track - size;
        if span <= 0 {
            return Some(self.value);
        }
        let pos = (at - 1 - anchor).clamp(0, span);
        self.set_value((pos * self.range) / span.max(1));
        Some(self.value)
    }

    /// End a thumb drag.
    pub fn release(&mut self) {
        self.drag_anchor = None;
    }
}

/// Scrollable content hosted by a [`ScrollContainer`].
///
/// Mouse events arrive in widget-local coordinates together with the
/// current scroll offset, so viewports with sticky regions (table
/// headers) can translate selectively.
#[allow(unused_variables)]
pub trait Viewport: 'static {
    /// Total content size.
    fn full_area_size(&self) -> Size;

    /// Paint content into the canvas.
    ///
    /// `offset` is the scroll position; content at `(x, y)` lands at
    /// `(x - offset.x, y - offset.y)` on the canvas.
    fn paint(&mut self, canvas: &mut Canvas, displayed: Size, offset: Point, core: &WidgetCore);

    /// Mouse event in widget-local coordinates. Return `true` to
    /// consume.
    fn mouse(&mut self, ev: &MouseEvent, offset: Point, ctx: &mut EventCtx) -> bool {
        false
    }

    /// Key event. Return `true` to consume.
    fn key(&mut self, ev: &KeyEvent, ctx: &mut EventCtx) -> bool {
        false
    }

    /// Paste text. Return `true` to consume.
    fn paste(&mut self, text: &str, ctx: &mut EventCtx) -> bool {
        false
    }

    /// Offset the container should scroll to after a consumed event
    /// (e.g. to keep a table's current cell visible).
    fn desired_offset(&self, current: Point, displayed: Size) -> Option<Point> {
        None
    }
}

/// Wheel scroll amount in rows/columns.
const WHEEL_STEP: i32 = 3;

/// The scroll area composite widget.
pub struct ScrollContainer<V: Viewport> {
    viewport: V,
    offset: Point,
    vbar: ScrollBar,
    hbar: ScrollBar,
    vpolicy: ScrollBarPolicy,
    hpolicy: ScrollBarPolicy,
}

impl<V: Viewport> ScrollContainer<V> {
    /// Wrap a viewport.
    #[must_use]
    pub fn new(viewport: V) -> Self {
        Self {
            viewport,
            offset: Point::new(0, 0),
            vbar: ScrollBar::new(Orientation::Vertical),
            hbar: ScrollBar::new(Orientation::Horizontal),
            vpolicy: ScrollBarPolicy::AsNeeded,
            hpolicy: ScrollBarPolicy::AsNeeded,
        }
    }

    /// The wrapped viewport.
    #[must_use]
    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    /// Mutable access to the wrapped viewport.
    pub fn viewport_mut(&mut self) -> &mut V {
        &mut self.viewport
    }

    /// Set both scroll bar policies.
    pub fn set_policies(&mut self, vertical: ScrollBarPolicy, horizontal: ScrollBarPolicy) {
        self.vpolicy = vertical;
        self.hpolicy = horizontal;
    }

    /// Current scroll offset.
    #[must_use]
    pub const fn offset(&self) -> Point {
        self.offset
    }

    /// The vertical scroll bar.
    #[must_use]
    pub fn vertical_bar(&self) -> &ScrollBar {
        &self.vbar
    }

    /// The horizontal scroll bar.
    #[must_use]
    pub fn horizontal_bar(&self) -> &ScrollBar {
        &self.hbar
    }

    /// Displayed content size for a given widget size.
    ///
    /// The horizontal bar consumes the bottom row when visible; the
    /// vertical bar overlays the right column and costs no width.
    #[must_use]
    pub fn displayed_size(&self, widget: Size) -> Size {
        let full = self.viewport.full_area_size();
        let hbar = match self.hpolicy {
            ScrollBarPolicy::AlwaysOn => true,
            ScrollBarPolicy::AlwaysOff => false,
            ScrollBarPolicy::AsNeeded => i32::from(full.width) > i32::from(widget.width),
        };
        Size::new(
            widget.width,
            widget.height.saturating_sub(u16::from(hbar)),
        )
    }

    /// Scroll so the given content rectangle is visible.
    pub fn scroll_into_view(&mut self, target: Rect, widget: Size) {
        let displayed = self.displayed_size(widget);
        let dw = i32::from(displayed.width);
        let dh = i32::from(displayed.height);
        if target.x < self.offset.x {
            self.offset.x = target.x;
        } else if target.right() > self.offset.x + dw {
            self.offset.x = target.right() - dw;
        }
        if target.y < self.offset.y {
            self.offset.y = target.y;
        } else if target.bottom() > self.offset.y + dh {
            self.offset.y = target.bottom() - dh;
        }
        self.clamp_offset(widget);
    }

    /// Move the scroll offset, clamping to the content bounds.
    pub fn set_offset(&mut self, offset: Point, widget: Size) {
        self.offset = offset;
        self.clamp_offset(widget);
    }

    fn clamp_offset(&mut self, widget: Size) {
        let full = self.viewport.full_area_size();
        let displayed = self.displayed_size(widget);
        let max_x = (i32::from(full.width) - i32::from(displayed.width)).max(0);
        let max_y = (i32::from(full.height) - i32::from(displayed.height)).max(0);
        self.offset.x = self.offset.x.clamp(0, max_x);
        self.offset.y = self.offset.y.clamp(0, max_y);
    }

    fn configure_bars(&mut self, widget: Size) {
        let full = self.viewport.full_area_size();
        let displayed = self.displayed_size(widget);
        let hrange = (i32::from(full.width) - i32::from(displayed.width)).max(0);
        let vrange = (i32::from(full.height) - i32::from(displayed.height)).max(0);

        self.hbar.set_page_step(i32::from(displayed.width).max(1));
        self.hbar.set_range(hrange);
        self.hbar.set_value(self.offset.x);
        self.vbar.set_page_step(i32::from(displayed.height).max(1));
        self.vbar.set_range(vrange);
        self.vbar.set_value(self.offset.y);

        self.hbar.set_visible(match self.hpolicy {
            ScrollBarPolicy::AlwaysOn => true,
            ScrollBarPolicy::AlwaysOff => false,
            ScrollBarPolicy::AsNeeded => hrange > 0,
        });
        self.vbar.set_visible(match self.vpolicy {
            ScrollBarPolicy::AlwaysOn => true,
            ScrollBarPolicy::AlwaysOff => false,
            ScrollBarPolicy::AsNeeded => vrange > 0,
        });
    }

    fn vbar_rect(&self, widget: Size) -> Rect {
        let h = widget.height.saturating_sub(u16::from(self.hbar.is_visible()));
        Rect::new(i32::from(widget.width) - 1, 0, 1, h)
    }

    fn hbar_rect(&self, widget: Size) -> Rect {
        Rect::new(0, i32::from(widget.height) - 1, widget.width, 1)
    }

    fn apply_desired_offset(&mut self, ctx: &mut EventCtx) {
        let widget = ctx.core.size();
        let displayed = self.displayed_size(widget);
        if let Some(target) = self.viewport.desired_offset(self.offset, displayed) {
            if target != self.offset {
                self.offset = target;
                self.clamp_offset(widget);
                ctx.update();
            }
        }
    }

    fn scroll_by(&mut self, dx: i32, dy: i32, widget: Size, ctx: &mut EventCtx) {
        self.offset.x += dx;
        self.offset.y += dy;
        self.clamp_offset(widget);
        ctx.update();
    }
}

impl<V: Viewport> Widget for ScrollContainer<V> {
    fn paint(&mut self, canvas: &mut Canvas, core: &WidgetCore) {
        let widget = core.size();
        if widget.is_empty() {
            return;
        }
        self.clamp_offset(widget);
        self.configure_bars(widget);
        let displayed = self.displayed_size(widget);
        self.viewport.paint(canvas, displayed, self.offset, core);

        let style = core.current_style().clone();
        if self.vbar.is_visible() {
            self.vbar.draw(canvas, self.vbar_rect(widget), style.clone());
        }
        if self.hbar.is_visible() {
            self.hbar.draw(canvas, self.hbar_rect(widget), style);
        }
    }

    fn mouse_press(&mut self, ev: &MouseEvent, ctx: &mut EventCtx) -> bool {
        let widget = ctx.core.size();
        self.configure_bars(widget);
        if self.vbar.is_visible() {
            let rect = self.vbar_rect(widget);
            if rect.contains(ev.x, ev.y) {
                if let Some(value) = self.vbar.press(ev.y - rect.y, rect.height) {
                    self.offset.y = value;
                    ctx.update();
                }
                return true;
            }
        }
        if self.hbar.is_visible() {
            let rect = self.hbar_rect(widget);
            if rect.contains(ev.x, ev.y) {
                if let Some(value) = self.hbar.press(ev.x - rect.x, rect.width) {
                    self.offset.x = value;
                    ctx.update();
                }
                return true;
            }
        }
        if self.viewport.mouse(ev, self.offset, ctx) {
            self.apply_desired_offset(ctx);
            return true;
        }
        if ev.button == MouseButton::Left {
            // Claim the press so drags keep flowing here.
            return true;
        }
        false
    }

    fn mouse_drag(&mut self, ev: &MouseEvent, ctx: &mut EventCtx) -> bool {
        let widget = ctx.core.size();
        if self.vbar.is_visible() {
            let rect = self.vbar_rect(widget);
            if let Some(value) = self.vbar.drag(ev.y - rect.y, rect.height) {
                if self.offset.y != value {
                    self.offset.y = value;
                    ctx.update();
                }
                return true;
            }
        }
        if self.hbar.is_visible() {
            let rect = self.hbar_rect(widget);
            if let Some(value) = self.hbar.drag(ev.x - rect.x, rect.width) {
                if self.offset.x != value {
                    self.offset.x = value;
                    ctx.update();
                }
                return true;
            }
        }
        if self.viewport.mouse(ev, self.offset, ctx) {
            self.apply_desired_offset(ctx);
            return true;
        }
        false
    }

    fn mouse_release(&mut self, ev: &MouseEvent, ctx: &mut EventCtx) -> bool {
        self.vbar.release();
        self.hbar.release();
        self.viewport.mouse(ev, self.offset, ctx);
        true
    }

    fn mouse_double_click(&mut self, ev: &MouseEvent, ctx: &mut EventCtx) -> bool {
        if self.viewport.mouse(ev, self.offset, ctx) {
            self.apply_desired_offset(ctx);
            return true;
        }
        false
    }

    fn wheel(&mut self, ev: &MouseEvent, ctx: &mut EventCtx) -> bool {
        if self.viewport.mouse(ev, self.offset, ctx) {
            return true;
        }
        // The viewport declined: the scroll area interprets the wheel.
        let widget = ctx.core.size();
        match ev.kind {
            MouseEventKind::WheelUp => self.scroll_by(0, -WHEEL_STEP, widget, ctx),
            MouseEventKind::WheelDown => self.scroll_by(0, WHEEL_STEP, widget, ctx),
            MouseEventKind::WheelLeft => self.scroll_by(-WHEEL_STEP, 0, widget, ctx),
            MouseEventKind::WheelRight => self.scroll_by(WHEEL_STEP, 0, widget, ctx),
            _ => return false,
        }
        true
    }

    fn key_event(&mut self, ev: &KeyEvent, ctx: &mut EventCtx) -> bool {
        if self.viewport.key(ev, ctx) {
            self.apply_desired_offset(ctx);
            ctx.update();
            return true;
        }
        // Page navigation falls back to the scroll area.
        let widget = ctx.core.size();
        let page = i32::from(self.displayed_size(widget).height).max(1);
        match ev.code {
            KeyCode::PageUp => self.scroll_by(0, -page, widget, ctx),
            KeyCode::PageDown => self.scroll_by(0, page, widget, ctx),
            KeyCode::Home => {
                self.offset = Point::new(0, 0);
                ctx.update();
            }
            KeyCode::End => {
                self.offset.y = i32::MAX;
                self.clamp_offset(widget);
                ctx.update();
            }
            _ => return false,
        }
        true
    }

    fn paste_event(&mut self, text: &str, ctx: &mut EventCtx) -> bool {
        self.viewport.paste(text, ctx)
    }

    fn resize_event(&mut self, width: u16, height: u16) {
        let widget = Size::new(width, height);
        self.clamp_offset(widget);
    }

    fn as_any(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fixed-size content for scroll math tests.
    struct GridContent {
        size: Size,
    }

    impl Viewport for GridContent {
        fn full_area_size(&self) -> Size {
            self.size
        }

        fn paint(
            &mut self,
            _canvas: &mut Canvas,
            _displayed: Size,
            _offset: Point,
            _core: &WidgetCore,
        ) {
        }
    }

    #[test]
    fn scroll_and_resize_scenario() {
        // A scroll area over a 200x50 grid, resized to 20x10.
        let mut area = ScrollContainer::new(GridContent {
            size: Size::new(200, 50),
        });
        let widget = Size::new(20, 10);
        area.configure_bars(widget);

        assert_eq!(area.viewport().full_area_size(), Size::new(200, 50));
        assert_eq!(area.displayed_size(widget), Size::new(20, 9));
        assert_eq!(area.vertical_bar().range(), 41);
        assert_eq!(area.horizontal_bar().range(), 180);
        assert!(area.vertical_bar().is_visible());
        assert!(area.horizontal_bar().is_visible());
    }

    #[test]
    fn bars_hide_when_content_fits() {
        let mut area = ScrollContainer::new(GridContent {
            size: Size::new(10, 5),
        });
        let widget = Size::new(20, 10);
        area.configure_bars(widget);
        assert!(!area.vertical_bar().is_visible());
        assert!(!area.horizontal_bar().is_visible());
        assert_eq!(area.displayed_size(widget), Size::new(20, 10));
    }

    #[test]
    fn always_on_policy_forces_bars() {
        let mut area = ScrollContainer::new(GridContent {
            size: Size::new(10, 5),
        });
        area.set_policies(ScrollBarPolicy::AlwaysOn, ScrollBarPolicy::AlwaysOn);
        let widget = Size::new(20, 10);
        area.configure_bars(widget);
        assert!(area.vertical_bar().is_visible());
        assert!(area.horizontal_bar().is_visible());
    }

    #[test]
    fn offset_clamps_to_content() {
        let mut area = ScrollContainer::new(GridContent {
            size: Size::new(100, 100),
        });
        let widget = Size::new(20, 10);
        area.set_offset(Point::new(500, -3), widget);
        let off = area.offset();
        assert_eq!(off.x, 80);
        assert_eq!(off.y, 0);
    }

    #[test]
    fn scroll_into_view_moves_minimally() {
        let mut area = ScrollContainer::new(GridContent {
            size: Size::new(100, 100),
        });
        let widget = Size::new(20, 10);
        // Below the fold: scroll down just enough.
        area.scroll_into_view(Rect::new(0, 30, 1, 1), widget);
        assert_eq!(area.offset().y, 31 - area.displayed_size(widget).height as i32);
        // Already visible: no movement.
        let before = area.offset();
        area.scroll_into_view(Rect::new(0, before.y, 1, 1), widget);
        assert_eq!(area.offset(), before);
    }

    #[test]
    fn scrollbar_thumb_stays_in_track() {
        let mut bar = ScrollBar::new(Orientation::Vertical);
        bar.set_range(41);
        bar.set_page_step(9);
        bar.set_visible(true);
        for v in [0, 20, 41] {
            bar.set_value(v);
            let (pos, size) = bar.thumb_metrics(10);
            assert!(size >= 1);
            assert!(pos >= 0);
            assert!(pos + size <= 8, "thumb inside 8-cell track");
        }
    }

    #[test]
    fn scrollbar_arrow_press_steps_value() {
        let mut bar = ScrollBar::new(Orientation::Vertical);
        bar.set_range(10);
        bar.set_visible(true);
        bar.set_value(5);
        assert_eq!(bar.press(0, 10), Some(4));
        assert_eq!(bar.press(9, 10), Some(5));
    }
}
