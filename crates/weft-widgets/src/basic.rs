#![forbid(unsafe_code)]

//! Basic widgets: container, spacer, label, button.

use std::any::Any;

use weft_canvas::Canvas;
use weft_core::event::{KeyCode, KeyEvent, MouseButton, MouseEvent};
use weft_core::geometry::{Point, Rect, Size};
use weft_layout::SizeHint;
use weft_signal::Signal;
use weft_style::Color;
use weft_text::{Alignment, RichText};

use crate::widget::{EventCtx, Widget, WidgetCore};

/// A plain container: paints its style background and hosts children
/// through its layout spec.
#[derive(Default)]
pub struct Container {
    _private: (),
}

impl Container {
    /// Create a container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Widget for Container {
    fn paint(&mut self, canvas: &mut Canvas, core: &WidgetCore) {
        let style = core.current_style();
        if style.has_background() {
            canvas.fill(Rect::from_size(core.size()), ' ', style.clone());
        }
    }

    fn as_any(&mut self) -> &mut dyn Any {
        self
    }
}

/// An empty stretchable item used to eat layout space.
#[derive(Default)]
pub struct Spacer {
    _private: (),
}

impl Spacer {
    /// Create a spacer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Widget for Spacer {
    fn paint(&mut self, _canvas: &mut Canvas, _core: &WidgetCore) {}

    fn as_any(&mut self) -> &mut dyn Any {
        self
    }
}

/// A single line of rich text.
pub struct Label {
    text: RichText,
    alignment: Alignment,
}

impl Label {
    /// Create a label from plain text.
    #[must_use]
    pub fn new(text: impl Into<RichText>) -> Self {
        Self {
            text: text.into(),
            alignment: Alignment::Left,
        }
    }

    /// Create a label with a uniform color.
    #[must_use]
    pub fn styled(text: &str, color: Color) -> Self {
        Self::new(RichText::styled(text, color))
    }

    /// Set the alignment within the label's width.
    #[must_use]
    pub fn alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Current text.
    #[must_use]
    pub fn text(&self) -> &RichText {
        &self.text
    }

    /// Replace the text (caller requests the repaint).
    pub fn set_text(&mut self, text: impl Into<RichText>) {
        self.text = text.into();
    }
}

impl Widget for Label {
    fn paint(&mut self, canvas: &mut Canvas, core: &WidgetCore) {
        let width = core.size().width as usize;
        canvas.draw_rich_text(
            Point::new(0, 0),
            &self.text,
            Some(width),
            self.alignment,
            Some(core.current_style().clone()),
        );
    }

    fn size_hint(&self) -> SizeHint {
        let w = self.text.term_width().min(u16::MAX as usize) as u16;
        SizeHint {
            min: Size::new(w.min(1), 1),
            max: Size::new(u16::MAX, 1),
        }
    }

    fn as_any(&mut self) -> &mut dyn Any {
        self
    }
}

/// A clickable button with a `clicked` signal.
pub struct Button {
    text: RichText,
    pressed: bool,
    /// Emitted on click (mouse release inside, or Enter/Space).
    pub clicked: Signal<()>,
}

impl Button {
    /// Create a button. Give the widget a CLICK|TAB focus policy when
    /// attaching it to make it reachable.
    #[must_use]
    pub fn new(text: impl Into<RichText>) -> Self {
        Self {
            text: text.into(),
            pressed: false,
            clicked: Signal::new(),
        }
    }

    /// Current label.
    #[must_use]
    pub fn text(&self) -> &RichText {
        &self.text
    }
}

impl Widget for Button {
    fn paint(&mut self, canvas: &mut Canvas, core: &WidgetCore) {
        let style = if self.pressed {
            core.current_style().invert_fg_bg()
        } else {
            core.current_style().clone()
        };
        let width = core.size().width as usize;
        let label = RichText::raw("[ ") + self.text.clone() + RichText::raw(" ]");
        canvas.draw_rich_text(
            Point::new(0, 0),
            &label,
            Some(width),
            Alignment::Center,
            Some(style),
        );
    }

    fn size_hint(&self) -> SizeHint {
        let w = (self.text.term_width() + 4).min(u16::MAX as usize) as u16;
        SizeHint {
            min: Size::new(w, 1),
            max: Size::new(u16::MAX, 1),
        }
    }

    fn mouse_press(&mut self, ev: &MouseEvent, ctx: &mut EventCtx) -> bool {
        if ev.button != MouseButton::Left {
            return false;
        }
        self.pressed = true;
        ctx.update();
        true
    }

    fn mouse_release(&mut self, ev: &MouseEvent, ctx: &mut EventCtx) -> bool {
        if !self.pressed {
            return false;
        }
        self.pressed = false;
        ctx.update();
        let inside = ev.x >= 0
            && ev.y >= 0
            && ev.x < i32::from(ctx.core.size().width)
            && ev.y < i32::from(ctx.core.size().height);
        if inside {
            self.clicked.emit_unit();
        }
        true
    }

    fn key_event(&mut self, ev: &KeyEvent, ctx: &mut EventCtx) -> bool {
        let activate = matches!(ev.code, KeyCode::Enter) || ev.is_char(' ');
        if activate {
            ctx.update();
            self.clicked.emit_unit();
        }
        activate
    }

    fn as_any(&mut self) -> &mut dyn Any {
        self
    }
}
