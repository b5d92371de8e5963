#![forbid(unsafe_code)]

//! Weft public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users.
//! It re-exports common types from the internal crates and offers a
//! lightweight prelude for day-to-day usage.

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use weft_core::decoder::{Decoder, DecoderConfig};
pub use weft_core::event::{
    Event, KeyCode, KeyEvent, Modifiers, MouseButton, MouseEvent, MouseEventKind, PasteEvent,
};
pub use weft_core::geometry::{Point, Rect, Size};
#[cfg(not(target_arch = "wasm32"))]
pub use weft_core::terminal::{SessionOptions, TerminalSession};

// --- Display pipeline re-exports -------------------------------------------

pub use weft_canvas::{BoxStyle, Canvas, CanvasDiff, Cell, DiffRun, Presenter};
pub use weft_style::{Color, ColorAttrs, ColorInterner, ColorModifier, ColorPart, Gradient};
pub use weft_text::{Alignment, RichText};

// --- Signal/slot re-exports ------------------------------------------------

pub use weft_signal::{ConnectionId, Signal};

// --- Layout re-exports -----------------------------------------------------

pub use weft_layout::{Orientation, Placement, SizeHint};

// --- Widget re-exports -----------------------------------------------------

pub use weft_widgets::{
    dispatch_event, table, tree, Button, CellValue, Clipboard, ClipboardData, Container, Context,
    DndMode, DropPosition, EventCtx, FocusPolicy, HeaderOrientation, ItemFlags, Label, LayoutSpec,
    OverlayMode, ScrollBar, ScrollBarPolicy, ScrollContainer, SelectionFlag, SortOrder, Spacer,
    Splitter, StyleSet, Table, TableList, TableModel, TableView, Tree, TreeItem, TreeItemId,
    TreeWidget, Viewport, Widget, WidgetArena, WidgetCore, WidgetId,
};

// --- Runtime re-exports ----------------------------------------------------

pub use weft_runtime::{App, Poster, RunConfig, Timers};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for Weft apps.
#[derive(Debug)]
pub enum Error {
    /// I/O failure during terminal operations.
    Io(std::io::Error),
    /// Terminal or runtime error with message.
    Terminal(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Terminal(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// Standard result type for Weft APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    //! Common imports for Weft applications.
    pub use crate::{
        App, Button, Canvas, Color, Container, Context, Error, Event, EventCtx, FocusPolicy,
        KeyCode, KeyEvent, Label, LayoutSpec, MouseEvent, Point, Rect, Result, RichText,
        RunConfig, Signal, Size, Widget, WidgetArena, WidgetId,
    };
}
