#![forbid(unsafe_code)]

//! The [`RichText`] type and its operations.

use std::fmt;
use std::ops::Add;

use smallvec::SmallVec;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use weft_style::Color;

/// Placeholder drawn where a wide cluster is cut at its left side.
pub const OVERFLOW_LEFT: char = '╾';

/// Placeholder drawn where a wide cluster is cut at its right side.
pub const OVERFLOW_RIGHT: char = '╼';

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    /// No padding shuffling; text stays at the left.
    #[default]
    Left,
    /// Pad on the left.
    Right,
    /// Pad on both sides.
    Center,
    /// Distribute padding between words.
    Justify,
}

/// One user-perceived character and its display width.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Cluster {
    /// The cluster's codepoints (combining marks included).
    text: SmallVec<[u8; 7]>,
    /// Display width in cells: 1 or 2.
    width: u8,
}

impl Cluster {
    fn new(text: &str, width: u8) -> Self {
        Self {
            text: SmallVec::from_slice(text.as_bytes()),
            width,
        }
    }

    fn as_str(&self) -> &str {
        // Clusters are built from &str slices, so this cannot fail.
        std::str::from_utf8(&self.text).unwrap_or("\u{fffd}")
    }

    fn push_str(&mut self, text: &str) {
        self.text.extend_from_slice(text.as_bytes());
    }
}

/// An ordered sequence of (cluster, color) cells.
///
/// Invariant: no zero-width cluster exists on its own; combining marks
/// are attached to the preceding cluster at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RichText {
    clusters: Vec<Cluster>,
    colors: Vec<Color>,
}

impl RichText {
    /// The empty rich string.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from UTF-8 text with the default (reset) color.
    #[must_use]
    pub fn raw(text: &str) -> Self {
        Self::styled(text, Color::RESET)
    }

    /// Build from UTF-8 text with a uniform color.
    #[must_use]
    pub fn styled(text: &str, color: Color) -> Self {
        let mut out = Self::new();
        for grapheme in text.graphemes(true) {
            out.push_cluster(grapheme, color.clone());
        }
        out
    }

    /// Build from per-cluster colors.
    ///
    /// Colors beyond the cluster count are ignored; missing colors fill
    /// with the last provided color (or reset).
    #[must_use]
    pub fn with_colors(text: &str, colors: &[Color]) -> Self {
        let mut out = Self::new();
        let mut last = Color::RESET;
        for (i, grapheme) in text.graphemes(true).enumerate() {
            let color = colors.get(i).cloned().unwrap_or_else(|| last.clone());
            last = color.clone();
            out.push_cluster(grapheme, color);
        }
        out
    }

    fn push_cluster(&mut self, grapheme: &str, color: Color) {
        let width = grapheme.width();
        if width == 0 {
            // Combining mark (or control): attach to the previous cluster
            // when one exists, otherwise promote to a width-1 cluster.
            if let Some(prev) = self.clusters.last_mut() {
                prev.push_str(grapheme);
                return;
            }
            self.clusters.push(Cluster::new(grapheme, 1));
        } else {
            self.clusters.push(Cluster::new(grapheme, width.min(2) as u8));
        }
        self.colors.push(color);
    }

    /// Number of clusters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Check for the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Displayed cell count: the sum of 1 or 2 per cluster.
    #[must_use]
    pub fn term_width(&self) -> usize {
        self.clusters.iter().map(|c| c.width as usize).sum()
    }

    /// Plain text with all color information stripped.
    #[must_use]
    pub fn to_plain(&self) -> String {
        self.clusters.iter().map(Cluster::as_str).collect()
    }

    /// The rendering pair: cluster texts and their colors.
    #[must_use]
    pub fn get_data(&self) -> (Vec<&str>, &[Color]) {
        (
            self.clusters.iter().map(Cluster::as_str).collect(),
            &self.colors,
        )
    }

    /// Iterate `(cluster_text, width, color)` triples.
    pub fn cells(&self) -> impl Iterator<Item = (&str, u8, &Color)> + '_ {
        self.clusters
            .iter()
            .zip(&self.colors)
            .map(|(c, col)| (c.as_str(), c.width, col))
    }

    /// Sub-string by cell range.
    ///
    /// The result's width is exactly `cell_end - cell_start` (clamped to
    /// this string's width). Splitting a wide cluster leaves the
    /// overflow placeholder on the cut side.
    #[must_use]
    pub fn slice(&self, cell_start: usize, cell_end: usize) -> Self {
        let mut out = Self::new();
        if cell_end <= cell_start {
            return out;
        }
        let mut pos = 0usize;
        for (cluster, color) in self.clusters.iter().zip(&self.colors) {
            let w = cluster.width as usize;
            let next = pos + w;
            if next <= cell_start {
                pos = next;
                continue;
            }
            if pos >= cell_end {
                break;
            }
            if pos < cell_start {
                // Wide cluster straddles the left cut: keep its right half.
                out.clusters
                    .push(Cluster::new(&OVERFLOW_LEFT.to_string(), 1));
                out.colors.push(color.clone());
            } else if next > cell_end {
                // Wide cluster straddles the right cut: keep its left half.
                out.clusters
                    .push(Cluster::new(&OVERFLOW_RIGHT.to_string(), 1));
                out.colors.push(color.clone());
            } else {
                out.clusters.push(cluster.clone());
                out.colors.push(color.clone());
            }
            pos = next;
        }
        out
    }

    /// Pad or truncate to exactly `width` cells.
    ///
    /// Padding cells carry the reset color; truncation cuts at the cell
    /// boundary, degrading a straddled wide cluster to the overflow
    /// placeholder. For every `width`, the result's `term_width()` is
    /// `width`.
    #[must_use]
    pub fn align(&self, width: usize, alignment: Alignment) -> Self {
        self.align_with(width, alignment, Color::RESET)
    }

    /// [`RichText::align`] with an explicit padding color.
    #[must_use]
    pub fn align_with(&self, width: usize, alignment: Alignment, pad_color: Color) -> Self {
        let current = self.term_width();
        if current == width {
            return self.clone();
        }
        if current > width {
            return self.slice(0, width);
        }
        let pad = width - current;
        let padding = |n: usize| {
            let mut s = Self::new();
            for _ in 0..n {
                s.push_cluster(" ", pad_color.clone());
            }
            s
        };
        match alignment {
            Alignment::Left => self.clone() + padding(pad),
            Alignment::Right => padding(pad) + self.clone(),
            Alignment::Center => {
                let left = pad / 2;
                padding(left) + self.clone() + padding(pad - left)
            }
            Alignment::Justify => self.justify(width, pad_color.clone()),
        }
    }

    /// Distribute padding between space-separated words.
    fn justify(&self, width: usize, pad_color: Color) -> Self {
        let gaps: Vec<usize> = self
            .clusters
            .iter()
            .enumerate()
            .filter(|(_, c)| c.as_str() == " ")
            .map(|(i, _)| i)
            .collect();
        if gaps.is_empty() {
            return self.align_with(width, Alignment::Left, pad_color);
        }
        let missing = width - self.term_width();
        let per_gap = missing / gaps.len();
        let mut extra = missing % gaps.len();

        let mut out = Self::new();
        for (i, (cluster, color)) in self.clusters.iter().zip(&self.colors).enumerate() {
            out.clusters.push(cluster.clone());
            out.colors.push(color.clone());
            if gaps.contains(&i) {
                let mut n = per_gap;
                if extra > 0 {
                    n += 1;
                    extra -= 1;
                }
                for _ in 0..n {
                    out.push_cluster(" ", pad_color.clone());
                }
            }
        }
        out
    }

    /// Truncate to `width` cells with a trailing ellipsis when cut.
    #[must_use]
    pub fn align_ellipsis(&self, width: usize, alignment: Alignment) -> Self {
        if self.term_width() <= width {
            return self.align(width, alignment);
        }
        if width == 0 {
            return Self::new();
        }
        let cut = self.slice(0, width - 1);
        let color = self.colors.last().cloned().unwrap_or(Color::RESET);
        let mut out = cut;
        out.push_cluster("…", color);
        out
    }

    /// Split on a delimiter cluster, lazily.
    ///
    /// The returned iterator is finite and consumed once; an empty
    /// source yields a single empty piece, matching plain-text `split`.
    #[must_use]
    pub fn split(&self, delim: char) -> RichTextSplit<'_> {
        RichTextSplit {
            source: self,
            delim: delim.to_string(),
            next_cluster: 0,
            done: false,
        }
    }

    /// Fill "empty" color positions with `color`.
    ///
    /// Positions whose color is the default are overwritten; styled runs
    /// stay untouched.
    #[must_use]
    pub fn complete_color(&self, color: &Color) -> Self {
        let mut out = self.clone();
        for c in &mut out.colors {
            if c.is_default() {
                *c = color.clone();
            }
        }
        out
    }

    /// Overwrite every cluster's color.
    #[must_use]
    pub fn set_color(&self, color: &Color) -> Self {
        let mut out = self.clone();
        for c in &mut out.colors {
            *c = color.clone();
        }
        out
    }

    /// Overwrite colors over a cell range `[cell_from, cell_to)`.
    #[must_use]
    pub fn set_color_range(&self, color: &Color, cell_from: usize, cell_to: usize) -> Self {
        let mut out = self.clone();
        let mut pos = 0usize;
        for (cluster, c) in out.clusters.iter().zip(out.colors.iter_mut()) {
            let next = pos + cluster.width as usize;
            if pos >= cell_to {
                break;
            }
            if next > cell_from {
                *c = color.clone();
            }
            pos = next;
        }
        out
    }

    /// First cluster index at which `needle` starts in the plain text.
    #[must_use]
    pub fn find(&self, needle: &str) -> Option<usize> {
        if needle.is_empty() {
            return Some(0);
        }
        let n: Vec<&str> = needle.graphemes(true).collect();
        let texts: Vec<&str> = self.clusters.iter().map(Cluster::as_str).collect();
        texts
            .windows(n.len())
            .position(|window| window == n.as_slice())
    }

    /// Replace every occurrence of `needle` with `replacement`.
    ///
    /// Replacement clusters take the color of the first replaced
    /// cluster.
    #[must_use]
    pub fn replace(&self, needle: &str, replacement: &str) -> Self {
        if needle.is_empty() {
            return self.clone();
        }
        let n: Vec<&str> = needle.graphemes(true).collect();
        let mut out = Self::new();
        let mut i = 0usize;
        while i < self.clusters.len() {
            let matches = i + n.len() <= self.clusters.len()
                && (0..n.len()).all(|k| self.clusters[i + k].as_str() == n[k]);
            if matches {
                let color = self.colors[i].clone();
                for grapheme in replacement.graphemes(true) {
                    out.push_cluster(grapheme, color.clone());
                }
                i += n.len();
            } else {
                out.clusters.push(self.clusters[i].clone());
                out.colors.push(self.colors[i].clone());
                i += 1;
            }
        }
        out
    }

    /// Expand tabs to the next `tab_size` boundary.
    #[must_use]
    pub fn tab_to_spaces(&self, tab_size: usize) -> Self {
        let tab_size = tab_size.max(1);
        let mut out = Self::new();
        let mut pos = 0usize;
        for (cluster, color) in self.clusters.iter().zip(&self.colors) {
            if cluster.as_str() == "\t" {
                let spaces = tab_size - (pos % tab_size);
                for _ in 0..spaces {
                    out.push_cluster(" ", color.clone());
                }
                pos += spaces;
            } else {
                out.clusters.push(cluster.clone());
                out.colors.push(color.clone());
                pos += cluster.width as usize;
            }
        }
        out
    }

    /// Serialize to ANSI: minimal SGR changes, reset at the end.
    #[must_use]
    pub fn ansi(&self) -> String {
        let mut out = String::new();
        let mut current: Option<&Color> = None;
        for (cluster, color) in self.clusters.iter().zip(&self.colors) {
            if current != Some(color) {
                out.push_str(&color.ansi_sgr());
                current = Some(color);
            }
            out.push_str(cluster.as_str());
        }
        if current.is_some_and(|c| !c.is_default()) {
            out.push_str("\x1b[0m");
        }
        out
    }
}

impl fmt::Display for RichText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_plain())
    }
}

impl From<&str> for RichText {
    fn from(s: &str) -> Self {
        Self::raw(s)
    }
}

impl From<String> for RichText {
    fn from(s: String) -> Self {
        Self::raw(&s)
    }
}

impl Add for RichText {
    type Output = RichText;

    fn add(mut self, rhs: RichText) -> RichText {
        self.clusters.extend(rhs.clusters);
        self.colors.extend(rhs.colors);
        self
    }
}

impl PartialOrd for RichText {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RichText {
    /// Rich strings order by their plain text, colors ignored.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.to_plain().cmp(&other.to_plain())
    }
}

/// Lazy, finite split iterator over a [`RichText`].
#[derive(Debug)]
pub struct RichTextSplit<'a> {
    source: &'a RichText,
    delim: String,
    next_cluster: usize,
    done: bool,
}

impl Iterator for RichTextSplit<'_> {
    type Item = RichText;

    fn next(&mut self) -> Option<RichText> {
        if self.done {
            return None;
        }
        let mut piece = RichText::new();
        let clusters = &self.source.clusters;
        while self.next_cluster < clusters.len() {
            let i = self.next_cluster;
            self.next_cluster += 1;
            if clusters[i].as_str() == self.delim {
                return Some(piece);
            }
            piece.clusters.push(clusters[i].clone());
            piece.colors.push(self.source.colors[i].clone());
        }
        self.done = true;
        Some(piece)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn width_counts_wide_clusters() {
        assert_eq!(RichText::raw("abc").term_width(), 3);
        assert_eq!(RichText::raw("漢字").term_width(), 4);
        assert_eq!(RichText::raw("a漢b").term_width(), 4);
    }

    #[test]
    fn combining_marks_attach_to_previous_cluster() {
        // e + combining acute accent
        let s = RichText::raw("e\u{0301}x");
        assert_eq!(s.len(), 2);
        assert_eq!(s.term_width(), 2);
        assert_eq!(s.to_plain(), "e\u{0301}x");
    }

    #[test]
    fn slice_is_exact_width() {
        let s = RichText::raw("hello world");
        let part = s.slice(2, 7);
        assert_eq!(part.to_plain(), "llo w");
        assert_eq!(part.term_width(), 5);
    }

    #[test]
    fn slice_splits_wide_cluster_with_placeholders() {
        let s = RichText::raw("a漢b");
        // Cut through the middle of 漢 on the right side.
        let left = s.slice(0, 2);
        assert_eq!(left.term_width(), 2);
        assert_eq!(left.to_plain(), format!("a{OVERFLOW_RIGHT}"));
        // Cut through the middle of 漢 on the left side.
        let right = s.slice(2, 4);
        assert_eq!(right.term_width(), 2);
        assert_eq!(right.to_plain(), format!("{OVERFLOW_LEFT}b"));
    }

    #[test]
    fn align_pads_left_right_center() {
        let s = RichText::raw("ab");
        assert_eq!(s.align(5, Alignment::Left).to_plain(), "ab   ");
        assert_eq!(s.align(5, Alignment::Right).to_plain(), "   ab");
        assert_eq!(s.align(6, Alignment::Center).to_plain(), "  ab  ");
    }

    #[test]
    fn align_truncates() {
        let s = RichText::raw("abcdef");
        assert_eq!(s.align(3, Alignment::Left).to_plain(), "abc");
    }

    #[test]
    fn align_justify_distributes_gaps() {
        let s = RichText::raw("a b c");
        let j = s.align(9, Alignment::Justify);
        assert_eq!(j.term_width(), 9);
        assert_eq!(j.to_plain(), "a   b   c");
    }

    #[test]
    fn align_ellipsis_marks_cut() {
        let s = RichText::raw("abcdef");
        let t = s.align_ellipsis(4, Alignment::Left);
        assert_eq!(t.to_plain(), "abc…");
        assert_eq!(t.term_width(), 4);
    }

    #[test]
    fn split_yields_pieces() {
        let s = RichText::raw("a,b,,c");
        let parts: Vec<String> = s.split(',').map(|p| p.to_plain()).collect();
        assert_eq!(parts, vec!["a", "b", "", "c"]);
    }

    #[test]
    fn split_handles_trailing_delimiter() {
        let s = RichText::raw("x,");
        let parts: Vec<String> = s.split(',').map(|p| p.to_plain()).collect();
        assert_eq!(parts, vec!["x", ""]);
    }

    #[test]
    fn complete_color_fills_only_unset() {
        let styled = Color::fg("#ff0000");
        let filler = Color::fg("#00ff00");
        let s = RichText::raw("a") + RichText::styled("b", styled.clone());
        let completed = s.complete_color(&filler);
        let (_, colors) = completed.get_data();
        assert_eq!(colors[0], filler);
        assert_eq!(colors[1], styled);
    }

    #[test]
    fn set_color_range_uses_cell_positions() {
        let s = RichText::raw("a漢b");
        let red = Color::fg("#ff0000");
        let colored = s.set_color_range(&red, 1, 3);
        let (_, colors) = colored.get_data();
        assert_eq!(colors[0], Color::RESET);
        assert_eq!(colors[1], red); // 漢 spans cells 1-2
        assert_eq!(colors[2], Color::RESET);
    }

    #[test]
    fn concat_preserves_colors() {
        let red = Color::fg("#ff0000");
        let s = RichText::styled("ab", red.clone()) + RichText::raw("cd");
        assert_eq!(s.term_width(), 4);
        let (_, colors) = s.get_data();
        assert_eq!(colors[0], red);
        assert_eq!(colors[3], Color::RESET);
    }

    #[test]
    fn tab_expansion_aligns_to_stops() {
        let s = RichText::raw("ab\tc");
        assert_eq!(s.tab_to_spaces(4).to_plain(), "ab  c");
        let s = RichText::raw("\tx");
        assert_eq!(s.tab_to_spaces(4).to_plain(), "    x");
    }

    #[test]
    fn find_and_replace() {
        let s = RichText::raw("one two one");
        assert_eq!(s.find("two"), Some(4));
        assert_eq!(s.find("missing"), None);
        assert_eq!(s.replace("one", "1").to_plain(), "1 two 1");
    }

    #[test]
    fn ansi_serialization_minimal_sgr() {
        let red = Color::fg("#ff0000");
        let s = RichText::styled("ab", red) + RichText::raw("c");
        let ansi = s.ansi();
        // One SGR for the styled run, one change back, one final state.
        assert!(ansi.contains("38;2;255;0;0"));
        assert!(ansi.ends_with('c') || ansi.ends_with("\x1b[0m"));
    }

    #[test]
    fn ordering_is_by_plain_text() {
        let a = RichText::styled("alice", Color::fg("#ff0000"));
        let b = RichText::raw("bob");
        assert!(a < b);
    }

    proptest! {
        #[test]
        fn align_width_is_exact(s in "\\PC{0,20}", w in 0usize..40) {
            let text = RichText::raw(&s);
            for alignment in [Alignment::Left, Alignment::Right, Alignment::Center, Alignment::Justify] {
                prop_assert_eq!(text.align(w, alignment).term_width(), w);
            }
        }

        #[test]
        fn slice_width_is_exact(s in "\\PC{0,20}", a in 0usize..30, len in 0usize..30) {
            let text = RichText::raw(&s);
            let b = a + len;
            let expected = text.term_width().clamp(0, b).saturating_sub(a.min(text.term_width()));
            prop_assert_eq!(text.slice(a, b).term_width(), expected.min(len));
        }
    }
}
