#![forbid(unsafe_code)]

//! The widget behavior trait and per-node state.
//!
//! A widget in the tree splits into two halves:
//!
//! - [`WidgetCore`] - geometry, size hints, visibility/enabled flags,
//!   focus policy, the private canvas, and the child-layout spec. Owned
//!   by the arena node.
//! - the behavior, a `Box<dyn Widget>` - paint and event hooks plus
//!   widget-specific state (a table's model, a button's label).
//!
//! Event hooks receive an [`EventCtx`] that exposes the widget's own
//! core plus a command queue; commands are applied by the dispatcher
//! after the handler returns, so handlers never borrow the rest of the
//! tree.

use std::any::Any;

use bitflags::bitflags;
use slotmap::new_key_type;

use weft_canvas::Canvas;
use weft_core::event::{KeyEvent, MouseEvent};
use weft_core::geometry::{Rect, Size};
use weft_layout::{Orientation, Placement, SizeHint};
use weft_style::Color;

new_key_type! {
    /// Arena key of a widget node.
    pub struct WidgetId;
}

bitflags! {
    /// Which interactions may give a widget focus.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FocusPolicy: u8 {
        /// Focus on mouse click.
        const CLICK = 0b01;
        /// Focus via Tab traversal.
        const TAB   = 0b10;
    }
}

/// Modal overlay behavior for clicks outside the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayMode {
    /// Outside clicks are swallowed.
    Modal,
    /// Outside clicks close the overlay.
    Popup,
}

/// Per-state style colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSet {
    /// Base style.
    pub normal: Color,
    /// Style while the widget holds focus.
    pub focus: Color,
    /// Style while the widget is disabled.
    pub disabled: Color,
}

impl Default for StyleSet {
    fn default() -> Self {
        Self {
            normal: Color::RESET,
            focus: Color::RESET,
            disabled: Color::fg("bright black"),
        }
    }
}

impl StyleSet {
    /// The style matching the widget's current state.
    #[must_use]
    pub fn current(&self, enabled: bool, focused: bool) -> &Color {
        if !enabled {
            &self.disabled
        } else if focused {
            &self.focus
        } else {
            &self.normal
        }
    }
}

/// How a container resolves its children's geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutSpec {
    /// Children keep the geometry explicitly set by the caller.
    #[default]
    Absolute,
    /// Children stack left to right.
    HBox,
    /// Children stack top to bottom.
    VBox,
    /// Children stack along a named orientation.
    Linear(Orientation),
    /// Children are placed by their grid position and spans.
    Grid,
}

/// The node-owned half of a widget.
#[derive(Debug)]
pub struct WidgetCore {
    name: String,
    geometry: Rect,
    min_size: Size,
    max_size: Size,
    visible: bool,
    enabled: bool,
    focused: bool,
    focus_policy: FocusPolicy,
    mouse_tracking: bool,
    style: StyleSet,
    layout: LayoutSpec,
    /// Grid placement when the parent layout is [`LayoutSpec::Grid`].
    grid_pos: (u16, u16, u16, u16),
    canvas: Canvas,
}

impl Default for WidgetCore {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetCore {
    /// Create a detached core with empty geometry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: String::new(),
            geometry: Rect::default(),
            min_size: Size::ZERO,
            max_size: Size::new(u16::MAX, u16::MAX),
            visible: true,
            enabled: true,
            focused: false,
            focus_policy: FocusPolicy::empty(),
            mouse_tracking: false,
            style: StyleSet::default(),
            layout: LayoutSpec::Absolute,
            grid_pos: (0, 0, 1, 1),
            canvas: Canvas::new(0, 0),
        }
    }

    /// Widget name (for tracing and lookup).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the widget name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Geometry in parent coordinates.
    #[must_use]
    pub const fn geometry(&self) -> Rect {
        self.geometry
    }

    /// Widget size.
    #[must_use]
    pub const fn size(&self) -> Size {
        self.geometry.size()
    }

    pub(crate) fn set_geometry_raw(&mut self, rect: Rect) -> bool {
        let resized = rect.size() != self.geometry.size();
        self.geometry = rect;
        if resized {
            self.canvas.resize(rect.width, rect.height);
        }
        resized
    }

    /// Minimum size hint.
    #[must_use]
    pub const fn min_size(&self) -> Size {
        self.min_size
    }

    /// Maximum size hint.
    #[must_use]
    pub const fn max_size(&self) -> Size {
        self.max_size
    }

    /// Set the minimum size hint.
    pub fn set_min_size(&mut self, size: Size) {
        self.min_size = size;
    }

    /// Set the maximum size hint.
    pub fn set_max_size(&mut self, size: Size) {
        self.max_size = size;
    }

    /// Combined hints: the core bounds narrowed by a behavior hint.
    #[must_use]
    pub fn effective_hint(&self, behavior_hint: SizeHint) -> SizeHint {
        SizeHint {
            min: self.min_size.max(behavior_hint.min),
            max: self.max_size.min(behavior_hint.max),
        }
    }

    /// Visibility flag.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Show or hide the widget.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Enabled flag. Disabled widgets intercept all input and paint
    /// with the disabled style.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable the widget.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether this widget currently holds focus.
    #[must_use]
    pub const fn has_focus(&self) -> bool {
        self.focused
    }

    pub(crate) fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    /// The focus policy.
    #[must_use]
    pub const fn focus_policy(&self) -> FocusPolicy {
        self.focus_policy
    }

    /// Set the focus policy.
    pub fn set_focus_policy(&mut self, policy: FocusPolicy) {
        self.focus_policy = policy;
    }

    /// Whether motion events with no button held are delivered.
    #[must_use]
    pub const fn mouse_tracking(&self) -> bool {
        self.mouse_tracking
    }

    /// Enable or disable plain-motion delivery.
    pub fn set_mouse_tracking(&mut self, tracking: bool) {
        self.mouse_tracking = tracking;
    }

    /// Per-state styles.
    #[must_use]
    pub const fn style(&self) -> &StyleSet {
        &self.style
    }

    /// Set per-state styles.
    pub fn set_style(&mut self, style: StyleSet) {
        self.style = style;
    }

    /// The style for the current enabled/focused state.
    #[must_use]
    pub fn current_style(&self) -> &Color {
        self.style.current(self.enabled, self.focused)
    }

    /// Layout spec applied to this widget's children.
    #[must_use]
    pub const fn layout(&self) -> LayoutSpec {
        self.layout
    }

    /// Set the child layout spec.
    pub fn set_layout(&mut self, layout: LayoutSpec) {
        self.layout = layout;
    }

    /// Grid placement `(row, col, row_span, col_span)` under a grid
    /// parent.
    #[must_use]
    pub const fn grid_pos(&self) -> (u16, u16, u16, u16) {
        self.grid_pos
    }

    /// Set the grid placement.
    pub fn set_grid_pos(&mut self, row: u16, col: u16, row_span: u16, col_span: u16) {
        self.grid_pos = (row, col, row_span.max(1), col_span.max(1));
    }

    pub(crate) fn placement(&self, hint: SizeHint) -> Placement {
        let (row, col, row_span, col_span) = self.grid_pos;
        Placement {
            row,
            col,
            row_span,
            col_span,
            hint,
        }
    }

    /// The widget's private canvas.
    #[must_use]
    pub const fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub(crate) fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    pub(crate) fn take_canvas(&mut self) -> Canvas {
        std::mem::replace(&mut self.canvas, Canvas::new(0, 0))
    }

    pub(crate) fn put_canvas(&mut self, canvas: Canvas) {
        self.canvas = canvas;
    }
}

/// Data placed on the process-wide clipboard.
#[derive(Debug, Clone, PartialEq)]
pub enum ClipboardData {
    /// Plain text.
    Text(String),
    /// A rectangular table-cell payload with its text rendering.
    Cells {
        /// Tab/newline-formatted text fallback.
        text: String,
        /// The structured cell rectangle.
        cells: Vec<Vec<crate::table::CellValue>>,
    },
}

impl ClipboardData {
    /// The text rendering of the payload.
    #[must_use]
    pub fn as_text(&self) -> &str {
        match self {
            Self::Text(t) => t,
            Self::Cells { text, .. } => text,
        }
    }
}

/// The UI-task-only, single-slot clipboard buffer.
#[derive(Debug, Default)]
pub struct Clipboard {
    data: Option<ClipboardData>,
}

impl Clipboard {
    /// Replace the clipboard content.
    pub fn set(&mut self, data: ClipboardData) {
        self.data = Some(data);
    }

    /// The current content, if any.
    #[must_use]
    pub fn get(&self) -> Option<&ClipboardData> {
        self.data.as_ref()
    }

    /// Clear the clipboard.
    pub fn clear(&mut self) {
        self.data = None;
    }
}

/// Deferred mutations queued by event handlers.
#[derive(Debug)]
pub enum UiCommand {
    /// Mark a widget dirty for repaint.
    Update(WidgetId),
    /// Re-run the widget's child layout.
    Relayout(WidgetId),
    /// Move focus.
    SetFocus(Option<WidgetId>),
    /// Route subsequent drag/release directly to this widget.
    GrabMouse(WidgetId),
    /// Drop the mouse grab.
    ReleaseMouse,
    /// Push a modal overlay.
    OpenOverlay(WidgetId, OverlayMode),
    /// Pop the top overlay.
    CloseOverlay,
    /// Ask the event loop to exit.
    Quit,
}

/// Handler-side view of a widget during event delivery.
pub struct EventCtx<'a> {
    /// The widget receiving the event.
    pub id: WidgetId,
    /// The widget's own core state.
    pub core: &'a mut WidgetCore,
    /// The process clipboard.
    pub clipboard: &'a mut Clipboard,
    pub(crate) queue: &'a mut Vec<UiCommand>,
}

impl EventCtx<'_> {
    /// Request a repaint of this widget.
    pub fn update(&mut self) {
        self.queue.push(UiCommand::Update(self.id));
    }

    /// Request a child relayout of this widget.
    pub fn relayout(&mut self) {
        self.queue.push(UiCommand::Relayout(self.id));
    }

    /// Request focus for this widget.
    pub fn set_focus(&mut self) {
        self.queue.push(UiCommand::SetFocus(Some(self.id)));
    }

    /// Clear the focus entirely.
    pub fn clear_focus(&mut self) {
        self.queue.push(UiCommand::SetFocus(None));
    }

    /// Grab the mouse for the rest of the gesture.
    pub fn grab_mouse(&mut self) {
        self.queue.push(UiCommand::GrabMouse(self.id));
    }

    /// Release an explicit mouse grab.
    pub fn release_mouse(&mut self) {
        self.queue.push(UiCommand::ReleaseMouse);
    }

    /// Push a widget as a modal overlay.
    pub fn open_overlay(&mut self, id: WidgetId, mode: OverlayMode) {
        self.queue.push(UiCommand::OpenOverlay(id, mode));
    }

    /// Pop the top overlay.
    pub fn close_overlay(&mut self) {
        self.queue.push(UiCommand::CloseOverlay);
    }

    /// Ask the event loop to exit.
    pub fn quit(&mut self) {
        self.queue.push(UiCommand::Quit);
    }
}

/// Widget behavior: the hooks a custom widget overrides.
///
/// Every handler returns `true` when the event is consumed; unconsumed
/// events bubble to the parent chain.
#[allow(unused_variables)]
pub trait Widget: Any {
    /// Draw into the widget's canvas. The canvas is cleared to blank
    /// before this is called.
    fn paint(&mut self, canvas: &mut Canvas, core: &WidgetCore);

    /// Size hints merged with the core's explicit min/max.
    fn size_hint(&self) -> SizeHint {
        SizeHint::UNBOUNDED
    }

    /// Mouse button pressed (local coordinates).
    fn mouse_press(&mut self, ev: &MouseEvent, ctx: &mut EventCtx) -> bool {
        false
    }

    /// Mouse button released.
    fn mouse_release(&mut self, ev: &MouseEvent, ctx: &mut EventCtx) -> bool {
        false
    }

    /// Motion with a button held.
    fn mouse_drag(&mut self, ev: &MouseEvent, ctx: &mut EventCtx) -> bool {
        false
    }

    /// Motion with no button held (requires mouse tracking).
    fn mouse_move(&mut self, ev: &MouseEvent, ctx: &mut EventCtx) -> bool {
        false
    }

    /// Second (or later) press inside the double-click window.
    fn mouse_double_click(&mut self, ev: &MouseEvent, ctx: &mut EventCtx) -> bool {
        false
    }

    /// Wheel scrolled.
    fn wheel(&mut self, ev: &MouseEvent, ctx: &mut EventCtx) -> bool {
        false
    }

    /// Key event delivered to the focused widget.
    fn key_event(&mut self, ev: &KeyEvent, ctx: &mut EventCtx) -> bool {
        false
    }

    /// Bracketed-paste text delivered to the focused widget.
    fn paste_event(&mut self, text: &str, ctx: &mut EventCtx) -> bool {
        false
    }

    /// Focus gained.
    fn focus_in(&mut self) {}

    /// Focus lost.
    fn focus_out(&mut self) {}

    /// Geometry changed; the arena re-runs child layout afterwards.
    fn resize_event(&mut self, width: u16, height: u16) {}

    /// Custom child geometry, overriding the node's [`LayoutSpec`].
    ///
    /// Return one rectangle per child (in child order) to take over
    /// layout; `None` uses the layout spec.
    fn layout_children(&mut self, size: Size, hints: &[SizeHint]) -> Option<Vec<Rect>> {
        None
    }

    /// Downcast access for typed widget lookups.
    fn as_any(&mut self) -> &mut dyn Any;
}
