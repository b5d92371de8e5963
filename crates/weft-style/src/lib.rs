#![forbid(unsafe_code)]

//! Color model for the Weft terminal UI framework.
//!
//! A [`Color`] bundles an optional foreground part, an optional
//! background part, and an attribute bitset. Colors are value objects:
//! two colors with the same content compare equal, and the canonical
//! empty value is [`Color::RESET`], whose SGR serialization is
//! `ESC [ 0 m`.
//!
//! Colors may carry a *modifier*: a per-cell function `(col, row) ->
//! Color` used for zebra striping and gradients; see [`ColorModifier`]
//! and the stock [`Gradient`].

pub mod color;
pub mod gradient;

pub use color::{Color, ColorAttrs, ColorInterner, ColorModifier, ColorPart};
pub use gradient::{Gradient, Orientation};
