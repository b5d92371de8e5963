#![forbid(unsafe_code)]

//! Rich strings for the Weft terminal UI framework.
//!
//! A [`RichText`] is an ordered sequence of (cluster, color) cells with
//! terminal-width semantics: every cluster occupies one or two cells
//! (wide East Asian characters and emoji are two), and combining marks
//! fold into the preceding cluster.
//!
//! # Example
//! ```
//! use weft_text::{Alignment, RichText};
//! use weft_style::Color;
//!
//! let s = RichText::styled("error", Color::fg("#ff0000"));
//! assert_eq!(s.term_width(), 5);
//! let padded = s.align(10, Alignment::Center);
//! assert_eq!(padded.term_width(), 10);
//! ```

pub mod rich;

pub use rich::{Alignment, RichText, RichTextSplit, OVERFLOW_LEFT, OVERFLOW_RIGHT};
