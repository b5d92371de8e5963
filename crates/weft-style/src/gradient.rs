#![forbid(unsafe_code)]

//! Stock color modifier: linear gradient.

use crate::color::{Color, ColorModifier, ColorPart};

/// Axis a [`Gradient`] varies along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// Color varies with the row.
    #[default]
    Vertical,
    /// Color varies with the column.
    Horizontal,
}

/// A per-cell brightness gradient.
///
/// Each cell's color is the base color with every RGB channel shifted
/// by `increment * |val + v| / step`, where `v` is the row or column
/// depending on [`Orientation`]. Palette-indexed parts are resolved to
/// RGB before shifting.
#[derive(Debug, Clone)]
pub struct Gradient {
    /// Channel shift applied to the foreground per step.
    pub fg_increment: i32,
    /// Channel shift applied to the background per step.
    pub bg_increment: i32,
    /// Gradient axis.
    pub orientation: Orientation,
    /// Base offset added to the varying coordinate.
    pub val: i32,
    /// Divisor stretching the gradient over more cells.
    pub step: i32,
}

impl Gradient {
    /// Create a gradient shifting both parts by `increment` per cell.
    #[must_use]
    pub fn new(increment: i32) -> Self {
        Self {
            fg_increment: increment,
            bg_increment: increment,
            orientation: Orientation::Vertical,
            val: 0,
            step: 1,
        }
    }

    /// Set the orientation.
    #[must_use]
    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Set the base offset.
    #[must_use]
    pub fn val(mut self, val: i32) -> Self {
        self.val = val;
        self
    }

    /// Set the step divisor (values < 1 clamp to 1).
    #[must_use]
    pub fn step(mut self, step: i32) -> Self {
        self.step = step.max(1);
        self
    }

    fn shift(part: Option<ColorPart>, increment: i32, multiplier: i32, step: i32) -> Option<ColorPart> {
        let part = part?;
        let (r, g, b) = part.to_rgb();
        let delta = increment * multiplier / step;
        let apply = |c: u8| (i32::from(c) + delta).clamp(0, 255) as u8;
        Some(ColorPart::Rgb(apply(r), apply(g), apply(b)))
    }
}

impl ColorModifier for Gradient {
    fn apply(&self, col: i32, row: i32, base: &Color) -> Color {
        let v = match self.orientation {
            Orientation::Horizontal => col,
            Orientation::Vertical => row,
        };
        let multiplier = (self.val + v).abs();
        let step = self.step.max(1);

        let mut out = Color::RESET;
        if let Some(fg) = Self::shift(base.foreground(), self.fg_increment, multiplier, step) {
            out = out
                + match fg {
                    ColorPart::Rgb(r, g, b) => Color::fg_rgb(r, g, b),
                    ColorPart::Indexed(_) => unreachable!("shift always yields rgb"),
                };
        }
        if let Some(bg) = Self::shift(base.background(), self.bg_increment, multiplier, step) {
            out = out
                + match bg {
                    ColorPart::Rgb(r, g, b) => Color::bg_rgb(r, g, b),
                    ColorPart::Indexed(_) => unreachable!("shift always yields rgb"),
                };
        }
        out + Color::attrs(base.attributes())
    }
}
