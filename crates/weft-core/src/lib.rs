#![forbid(unsafe_code)]

//! Core types for the Weft terminal UI framework.
//!
//! This crate holds the pieces every other Weft crate builds on:
//!
//! - [`geometry`] - points, sizes, and rectangles in terminal cells
//! - [`event`] - canonical key/mouse/paste/resize events
//! - [`decoder`] - the byte-stream input decoder state machine
//! - [`terminal`] - terminal lifecycle (raw mode, alternate screen,
//!   mouse reporting) with guaranteed restore on exit

pub mod decoder;
pub mod event;
pub mod geometry;
#[cfg(not(target_arch = "wasm32"))]
pub mod terminal;

pub use decoder::{Decoder, DecoderConfig};
pub use event::{
    Event, KeyCode, KeyEvent, Modifiers, MouseButton, MouseEvent, MouseEventKind, PasteEvent,
};
pub use geometry::{Point, Rect, Size};
