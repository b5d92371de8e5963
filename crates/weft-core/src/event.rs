#![forbid(unsafe_code)]

//! Canonical input event types.
//!
//! All events derive `Clone` and `PartialEq` for use in tests and
//! pattern matching. Mouse coordinates are 0-indexed (the terminal
//! reports them 1-indexed; the decoder normalizes).

use bitflags::bitflags;

/// Canonical input event produced by the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A keyboard event.
    Key(KeyEvent),

    /// A mouse event.
    Mouse(MouseEvent),

    /// Paste event (from bracketed paste mode).
    Paste(PasteEvent),

    /// Terminal was resized; carries the new `(cols, rows)`.
    Resize {
        /// New terminal width in columns.
        cols: u16,
        /// New terminal height in rows.
        rows: u16,
    },

    /// An unrecognized escape sequence, preserved verbatim for tracing.
    ///
    /// Raw events are never routed to widgets; the decoder emits them so
    /// no byte is dropped silently.
    Raw(Vec<u8>),
}

bitflags! {
    /// Modifier keys accompanying a key or mouse event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE    = 0b0000_0000;
        /// Shift key.
        const SHIFT   = 0b0000_0001;
        /// Control key.
        const CONTROL = 0b0000_0010;
        /// Alt/Option key.
        const ALT     = 0b0000_0100;
        /// Meta/Super/Command key.
        const META    = 0b0000_1000;
        /// Key originated from the keypad.
        const KEYPAD  = 0b0001_0000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

/// A keyboard event.
///
/// Two kinds exist: printable-text events carrying one or more clusters,
/// and special-key events carrying a named [`KeyCode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// The decoded key.
    pub code: KeyCode,
    /// Modifier keys held during the event.
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// Create a key event with no modifiers.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
        }
    }

    /// Create a key event with modifiers.
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Convenience constructor for a printable character.
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self::new(KeyCode::Text(s.into()))
    }

    /// Check whether this is a printable-text event.
    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self.code, KeyCode::Text(_))
    }

    /// Check whether this event carries the given single character.
    #[must_use]
    pub fn is_char(&self, c: char) -> bool {
        match &self.code {
            KeyCode::Text(s) => {
                let mut chars = s.chars();
                chars.next() == Some(c) && chars.next().is_none()
            }
            _ => false,
        }
    }

    /// Check if Ctrl is held.
    #[must_use]
    pub const fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CONTROL)
    }

    /// Check if Shift is held.
    #[must_use]
    pub const fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    /// Check if Alt is held.
    #[must_use]
    pub const fn alt(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }
}

/// Key codes for keyboard events.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// Printable text: one or more clusters typed or composed at once.
    Text(String),

    /// Enter/Return key.
    Enter,
    /// Escape key.
    Escape,
    /// Backspace key.
    Backspace,
    /// Tab key.
    Tab,
    /// Shift+Tab (back-tab).
    BackTab,
    /// Delete key.
    Delete,
    /// Insert key.
    Insert,
    /// Home key.
    Home,
    /// End key.
    End,
    /// Page Up key.
    PageUp,
    /// Page Down key.
    PageDown,
    /// Up arrow key.
    Up,
    /// Down arrow key.
    Down,
    /// Left arrow key.
    Left,
    /// Right arrow key.
    Right,
    /// Function key (F1-F24).
    F(u8),
    /// A control-letter combination (`Ctrl(b'a')` for Ctrl+A).
    Ctrl(u8),
}

/// Mouse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MouseButton {
    /// No button (plain motion).
    #[default]
    None,
    /// Left button.
    Left,
    /// Middle button.
    Middle,
    /// Right button.
    Right,
    /// Scroll wheel.
    Wheel,
}

/// Kinds of mouse events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEventKind {
    /// Button pressed.
    Press,
    /// Button released.
    Release,
    /// Motion while a button is held.
    Drag,
    /// Motion with no button held (requires direct-motion reporting).
    Move,
    /// Wheel scrolled up.
    WheelUp,
    /// Wheel scrolled down.
    WheelDown,
    /// Wheel scrolled left.
    WheelLeft,
    /// Wheel scrolled right.
    WheelRight,
}

/// A mouse event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MouseEvent {
    /// Column (0-indexed).
    pub x: i32,
    /// Row (0-indexed).
    pub y: i32,
    /// The button involved, if any.
    pub button: MouseButton,
    /// What happened.
    pub kind: MouseEventKind,
    /// Modifier keys held during the event.
    pub modifiers: Modifiers,
    /// Consecutive-press count within the double-click window:
    /// 1 = single, 2 = double, 3 = triple click.
    pub tap: u8,
    /// The raw escape sequence, kept for tracing.
    pub raw: Vec<u8>,
}

impl MouseEvent {
    /// Create a mouse event with empty raw bytes and tap count 0.
    #[must_use]
    pub fn new(x: i32, y: i32, button: MouseButton, kind: MouseEventKind) -> Self {
        Self {
            x,
            y,
            button,
            kind,
            modifiers: Modifiers::NONE,
            tap: 0,
            raw: Vec::new(),
        }
    }

    /// Return a copy translated into another coordinate space.
    #[must_use]
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        let mut ev = self.clone();
        ev.x += dx;
        ev.y += dy;
        ev
    }

    /// Check whether this is any wheel event.
    #[must_use]
    pub const fn is_wheel(&self) -> bool {
        matches!(
            self.kind,
            MouseEventKind::WheelUp
                | MouseEventKind::WheelDown
                | MouseEventKind::WheelLeft
                | MouseEventKind::WheelRight
        )
    }
}

/// A paste event from bracketed paste mode.
///
/// All bytes between the start and end markers accumulate into one
/// event; control sequences inside are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteEvent {
    /// The pasted text.
    pub text: String,
}

impl PasteEvent {
    /// Create a paste event.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}
