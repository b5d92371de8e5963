#![forbid(unsafe_code)]

//! Color value objects and SGR serialization.

use std::fmt;
use std::ops::Add;
use std::sync::Arc;

use bitflags::bitflags;
use rustc_hash::FxHashMap;
use tracing::warn;

bitflags! {
    /// Text attributes carried alongside a color.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ColorAttrs: u8 {
        /// Bold text.
        const BOLD      = 0b0000_0001;
        /// Italic text.
        const ITALIC    = 0b0000_0010;
        /// Underlined text.
        const UNDERLINE = 0b0000_0100;
        /// Blinking text.
        const BLINK     = 0b0000_1000;
        /// Strikethrough text.
        const STRIKE    = 0b0001_0000;
        /// Reverse video.
        const REVERSE   = 0b0010_0000;
    }
}

/// One half of a color: a 24-bit RGB value or a 256-palette index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorPart {
    /// True-color RGB.
    Rgb(u8, u8, u8),
    /// 256-color palette index.
    Indexed(u8),
}

impl ColorPart {
    /// Resolve to an RGB triplet (palette indices use the xterm table).
    #[must_use]
    pub fn to_rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Rgb(r, g, b) => (r, g, b),
            Self::Indexed(idx) => ansi256_to_rgb(idx),
        }
    }
}

/// Per-cell color function attached to a [`Color`].
///
/// Implementations compute the effective color for a cell at
/// `(col, row)`; used for zebra striping and gradients.
pub trait ColorModifier: fmt::Debug {
    /// Compute the effective color for the cell at `(col, row)`.
    fn apply(&self, col: i32, row: i32, base: &Color) -> Color;
}

/// An immutable foreground/background/attribute bundle.
///
/// `Color` is cheap to clone; an attached modifier is shared through an
/// [`Arc`]. Equality is by content for the color parts and attributes,
/// and by identity for the modifier (two modifiers are the same only if
/// they are the same object).
#[derive(Debug, Clone, Default)]
pub struct Color {
    fg: Option<ColorPart>,
    bg: Option<ColorPart>,
    attrs: ColorAttrs,
    modifier: Option<Arc<dyn ColorModifier + Send + Sync>>,
}

impl PartialEq for Color {
    fn eq(&self, other: &Self) -> bool {
        self.fg == other.fg
            && self.bg == other.bg
            && self.attrs == other.attrs
            && match (&self.modifier, &other.modifier) {
                (None, None) => true,
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                _ => false,
            }
    }
}

impl Eq for Color {}

impl std::hash::Hash for Color {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.fg.hash(state);
        self.bg.hash(state);
        self.attrs.hash(state);
        if let Some(m) = &self.modifier {
            (Arc::as_ptr(m) as *const () as usize).hash(state);
        }
    }
}

impl Color {
    /// The canonical empty color; serializes to `ESC [ 0 m`.
    pub const RESET: Self = Self {
        fg: None,
        bg: None,
        attrs: ColorAttrs::empty(),
        modifier: None,
    };

    /// Create a foreground color from a spec string.
    ///
    /// Accepted specs: `"#RRGGBB"`, a palette index `"0"`..`"255"`, or
    /// an ANSI color name (`"red"`, `"bright blue"`, ...). Unknown
    /// specs yield [`Color::RESET`] and log a warning; this never
    /// panics.
    #[must_use]
    pub fn fg(spec: &str) -> Self {
        match parse_spec(spec) {
            Some(part) => Self {
                fg: Some(part),
                ..Self::RESET
            },
            None => {
                warn!(spec, "unknown foreground color spec");
                Self::RESET
            }
        }
    }

    /// Create a background color from a spec string (same specs as
    /// [`Color::fg`]).
    #[must_use]
    pub fn bg(spec: &str) -> Self {
        match parse_spec(spec) {
            Some(part) => Self {
                bg: Some(part),
                ..Self::RESET
            },
            None => {
                warn!(spec, "unknown background color spec");
                Self::RESET
            }
        }
    }

    /// Create a color with both foreground and background specs.
    #[must_use]
    pub fn fgbg(fg: &str, bg: &str) -> Self {
        Self::fg(fg) + Self::bg(bg)
    }

    /// Create a true-color foreground.
    #[must_use]
    pub const fn fg_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            fg: Some(ColorPart::Rgb(r, g, b)),
            bg: None,
            attrs: ColorAttrs::empty(),
            modifier: None,
        }
    }

    /// Create a true-color background.
    #[must_use]
    pub const fn bg_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            fg: None,
            bg: Some(ColorPart::Rgb(r, g, b)),
            attrs: ColorAttrs::empty(),
            modifier: None,
        }
    }

    /// Create a foreground color from an existing part.
    #[must_use]
    pub const fn fg_part(part: ColorPart) -> Self {
        Self {
            fg: Some(part),
            bg: None,
            attrs: ColorAttrs::empty(),
            modifier: None,
        }
    }

    /// Create a background color from an existing part.
    #[must_use]
    pub const fn bg_part(part: ColorPart) -> Self {
        Self {
            fg: None,
            bg: Some(part),
            attrs: ColorAttrs::empty(),
            modifier: None,
        }
    }

    /// Create a color with only attributes set.
    #[must_use]
    pub const fn attrs(attrs: ColorAttrs) -> Self {
        Self {
            fg: None,
            bg: None,
            attrs,
            modifier: None,
        }
    }

    /// Bold variant of this color.
    #[must_use]
    pub fn bold(mut self) -> Self {
        self.attrs |= ColorAttrs::BOLD;
        self
    }

    /// Italic variant of this color.
    #[must_use]
    pub fn italic(mut self) -> Self {
        self.attrs |= ColorAttrs::ITALIC;
        self
    }

    /// Underlined variant of this color.
    #[must_use]
    pub fn underline(mut self) -> Self {
        self.attrs |= ColorAttrs::UNDERLINE;
        self
    }

    /// The foreground part, if set.
    #[must_use]
    pub const fn foreground(&self) -> Option<ColorPart> {
        self.fg
    }

    /// The background part, if set.
    #[must_use]
    pub const fn background(&self) -> Option<ColorPart> {
        self.bg
    }

    /// The attribute bitset.
    #[must_use]
    pub const fn attributes(&self) -> ColorAttrs {
        self.attrs
    }

    /// Check whether this is the empty color (no parts, no attributes).
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.fg.is_none() && self.bg.is_none() && self.attrs.is_empty() && self.modifier.is_none()
    }

    /// Check whether a background part is set.
    #[must_use]
    pub const fn has_background(&self) -> bool {
        self.bg.is_some()
    }

    /// Attach a per-cell modifier.
    #[must_use]
    pub fn with_modifier(mut self, modifier: Arc<dyn ColorModifier + Send + Sync>) -> Self {
        self.modifier = Some(modifier);
        self
    }

    /// The attached modifier, if any.
    #[must_use]
    pub fn modifier(&self) -> Option<&Arc<dyn ColorModifier + Send + Sync>> {
        self.modifier.as_ref()
    }

    /// Swap the foreground and background parts.
    #[must_use]
    pub fn invert_fg_bg(&self) -> Self {
        Self {
            fg: self.bg,
            bg: self.fg,
            attrs: self.attrs,
            modifier: self.modifier.clone(),
        }
    }

    /// Effective color for the cell at `(col, row)`.
    ///
    /// Evaluates the attached modifier when present, otherwise returns
    /// a clone of `self`.
    #[must_use]
    pub fn mod_at(&self, col: i32, row: i32) -> Self {
        match &self.modifier {
            Some(m) => m.apply(col, row, self),
            None => self.clone(),
        }
    }

    /// Minimal SGR sequence selecting this color.
    ///
    /// The empty color serializes to the reset sequence `ESC [ 0 m`.
    #[must_use]
    pub fn ansi_sgr(&self) -> String {
        if self.fg.is_none() && self.bg.is_none() && self.attrs.is_empty() {
            return "\x1b[0m".to_string();
        }
        let mut out = String::from("\x1b[0");
        for (flag, code) in [
            (ColorAttrs::BOLD, 1),
            (ColorAttrs::ITALIC, 3),
            (ColorAttrs::UNDERLINE, 4),
            (ColorAttrs::BLINK, 5),
            (ColorAttrs::REVERSE, 7),
            (ColorAttrs::STRIKE, 9),
        ] {
            if self.attrs.contains(flag) {
                out.push_str(&format!(";{code}"));
            }
        }
        match self.fg {
            Some(ColorPart::Rgb(r, g, b)) => out.push_str(&format!(";38;2;{r};{g};{b}")),
            Some(ColorPart::Indexed(i)) => out.push_str(&format!(";38;5;{i}")),
            None => {}
        }
        match self.bg {
            Some(ColorPart::Rgb(r, g, b)) => out.push_str(&format!(";48;2;{r};{g};{b}")),
            Some(ColorPart::Indexed(i)) => out.push_str(&format!(";48;5;{i}")),
            None => {}
        }
        out.push('m');
        out
    }
}

impl Add for Color {
    type Output = Color;

    /// Override-combine: non-empty parts of `rhs` replace `self`'s,
    /// attribute flags OR, and `rhs`'s modifier wins when present.
    fn add(self, rhs: Color) -> Color {
        Color {
            fg: rhs.fg.or(self.fg),
            bg: rhs.bg.or(self.bg),
            attrs: self.attrs | rhs.attrs,
            modifier: rhs.modifier.or(self.modifier),
        }
    }
}

impl Add<&Color> for &Color {
    type Output = Color;

    fn add(self, rhs: &Color) -> Color {
        self.clone() + rhs.clone()
    }
}

/// Content-keyed intern table for modifier-free colors.
///
/// Repeated lookups of the same content return clones of one cached
/// value, keeping hot paint paths allocation-free.
#[derive(Debug, Default)]
pub struct ColorInterner {
    table: FxHashMap<(Option<ColorPart>, Option<ColorPart>, u8), Color>,
}

impl ColorInterner {
    /// Create an empty interner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a color by content. Colors carrying modifiers are passed
    /// through untouched (modifier identity cannot be content-keyed).
    pub fn intern(&mut self, color: Color) -> Color {
        if color.modifier.is_some() {
            return color;
        }
        let key = (color.fg, color.bg, color.attrs.bits());
        self.table.entry(key).or_insert(color).clone()
    }

    /// Number of distinct interned colors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Check whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Parse a color spec: `#RRGGBB`, decimal palette index, or ANSI name.
fn parse_spec(spec: &str) -> Option<ColorPart> {
    let spec = spec.trim();
    if let Some(hex) = spec.strip_prefix('#') {
        if hex.len() == 6 {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            return Some(ColorPart::Rgb(r, g, b));
        }
        return None;
    }
    if spec.chars().all(|c| c.is_ascii_digit()) && !spec.is_empty() {
        return spec.parse::<u8>().ok().map(ColorPart::Indexed);
    }
    named_color(spec)
}

/// The ANSI-16 name table.
fn named_color(name: &str) -> Option<ColorPart> {
    let normalized = name.to_ascii_lowercase().replace([' ', '-', '_'], "");
    let idx = match normalized.as_str() {
        "black" => 0,
        "red" => 1,
        "green" => 2,
        "yellow" => 3,
        "blue" => 4,
        "magenta" => 5,
        "cyan" => 6,
        "white" => 7,
        "brightblack" | "gray" | "grey" => 8,
        "brightred" => 9,
        "brightgreen" => 10,
        "brightyellow" => 11,
        "brightblue" => 12,
        "brightmagenta" => 13,
        "brightcyan" => 14,
        "brightwhite" => 15,
        _ => return None,
    };
    Some(ColorPart::Indexed(idx))
}

/// Convert a 256-palette index to RGB using the xterm tables.
#[must_use]
pub fn ansi256_to_rgb(idx: u8) -> (u8, u8, u8) {
    const BASE16: [(u8, u8, u8); 16] = [
        (0, 0, 0),
        (205, 0, 0),
        (0, 205, 0),
        (205, 205, 0),
        (0, 0, 238),
        (205, 0, 205),
        (0, 205, 205),
        (229, 229, 229),
        (127, 127, 127),
        (255, 0, 0),
        (0, 255, 0),
        (255, 255, 0),
        (92, 92, 255),
        (255, 0, 255),
        (0, 255, 255),
        (255, 255, 255),
    ];
    match idx {
        0..=15 => BASE16[idx as usize],
        16..=231 => {
            let idx = idx - 16;
            let r = idx / 36;
            let g = (idx % 36) / 6;
            let b = idx % 6;
            let level = |v: u8| if v == 0 { 0 } else { 55 + v * 40 };
            (level(r), level(g), level(b))
        }
        232..=255 => {
            let gray = 8 + (idx - 232) * 10;
            (gray, gray, gray)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_sgr_is_plain_reset() {
        assert_eq!(Color::RESET.ansi_sgr(), "\x1b[0m");
    }

    #[test]
    fn hex_spec_parses() {
        let c = Color::fg("#ff8000");
        assert_eq!(c.foreground(), Some(ColorPart::Rgb(255, 128, 0)));
        assert_eq!(c.background(), None);
    }

    #[test]
    fn index_spec_parses() {
        let c = Color::bg("124");
        assert_eq!(c.background(), Some(ColorPart::Indexed(124)));
    }

    #[test]
    fn named_spec_parses() {
        assert_eq!(
            Color::fg("bright blue").foreground(),
            Some(ColorPart::Indexed(12))
        );
        assert_eq!(Color::fg("red").foreground(), Some(ColorPart::Indexed(1)));
    }

    #[test]
    fn unknown_spec_is_reset_not_panic() {
        assert_eq!(Color::fg("#zzz"), Color::RESET);
        assert_eq!(Color::fg("no-such-color"), Color::RESET);
    }

    #[test]
    fn add_overrides_non_empty_parts() {
        let a = Color::fgbg("#ff0000", "#000080");
        let b = Color::fg("#00ff00");
        let c = a.clone() + b;
        assert_eq!(c.foreground(), Some(ColorPart::Rgb(0, 255, 0)));
        // Background untouched: b had none.
        assert_eq!(c.background(), Some(ColorPart::Rgb(0, 0, 128)));
    }

    #[test]
    fn add_ors_attributes() {
        let a = Color::attrs(ColorAttrs::BOLD);
        let b = Color::attrs(ColorAttrs::UNDERLINE);
        assert_eq!(
            (a + b).attributes(),
            ColorAttrs::BOLD | ColorAttrs::UNDERLINE
        );
    }

    #[test]
    fn invert_swaps_parts() {
        let c = Color::fgbg("#112233", "#445566").invert_fg_bg();
        assert_eq!(c.foreground(), Some(ColorPart::Rgb(0x44, 0x55, 0x66)));
        assert_eq!(c.background(), Some(ColorPart::Rgb(0x11, 0x22, 0x33)));
    }

    #[test]
    fn sgr_contains_attrs_and_parts() {
        let c = Color::fg("#010203").bold();
        let sgr = c.ansi_sgr();
        assert!(sgr.contains(";1;"));
        assert!(sgr.contains("38;2;1;2;3"));
        assert!(sgr.starts_with("\x1b[0"));
        assert!(sgr.ends_with('m'));
    }

    #[test]
    fn indexed_sgr_uses_palette_form() {
        let c = Color::bg("42");
        assert!(c.ansi_sgr().contains("48;5;42"));
    }

    #[test]
    fn mod_at_without_modifier_is_identity() {
        let c = Color::fg("#abcdef");
        assert_eq!(c.mod_at(3, 9), c);
    }

    #[test]
    fn interner_dedups_by_content() {
        let mut interner = ColorInterner::new();
        let a = interner.intern(Color::fg("#123456"));
        let b = interner.intern(Color::fg("#123456"));
        assert_eq!(a, b);
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn cube_palette_resolution() {
        assert_eq!(ansi256_to_rgb(16), (0, 0, 0));
        assert_eq!(ansi256_to_rgb(231), (255, 255, 255));
        assert_eq!(ansi256_to_rgb(244), (128, 128, 128));
    }
}
