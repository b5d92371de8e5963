#![forbid(unsafe_code)]

//! State-tracked ANSI emission.
//!
//! The presenter turns [`CanvasDiff`] runs into minimal terminal
//! output: one cursor move per run, one SGR per color change, a single
//! buffered flush per frame.

use std::io::{self, BufWriter, Write};

use crate::canvas::Canvas;
use crate::diff::CanvasDiff;
use weft_style::Color;

/// Size of the internal write buffer.
const BUFFER_CAPACITY: usize = 64 * 1024;

/// State-tracked ANSI presenter.
pub struct Presenter<W: Write> {
    writer: BufWriter<W>,
    /// Last emitted color (`None` = unknown/reset).
    current: Option<Color>,
}

impl<W: Write> Presenter<W> {
    /// Create a presenter over a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(BUFFER_CAPACITY, writer),
            current: None,
        }
    }

    /// Emit the diff runs and flush.
    ///
    /// Each run becomes `move-cursor(row, col); write-run(cells)`.
    pub fn present(&mut self, diff: &CanvasDiff) -> io::Result<()> {
        if diff.is_empty() {
            return Ok(());
        }
        for run in diff.runs() {
            // CUP is 1-indexed.
            write!(self.writer, "\x1b[{};{}H", run.y + 1, run.x0 + 1)?;
            for cell in &run.cells {
                if cell.is_continuation() {
                    continue;
                }
                if self.current.as_ref() != Some(cell.color()) {
                    self.writer.write_all(cell.color().ansi_sgr().as_bytes())?;
                    self.current = Some(cell.color().clone());
                }
                self.writer.write_all(cell.text().as_bytes())?;
            }
        }
        self.reset_style()?;
        self.writer.flush()
    }

    /// Clear the screen and redraw the whole canvas.
    pub fn present_full(&mut self, canvas: &Canvas) -> io::Result<()> {
        self.writer.write_all(b"\x1b[2J")?;
        self.current = None;
        let cleared = Canvas::new(canvas.width(), canvas.height());
        let diff = CanvasDiff::compute(&cleared, canvas);
        self.present(&diff)
    }

    /// Emit a style reset when the tracked state is not already reset.
    fn reset_style(&mut self) -> io::Result<()> {
        if self.current.as_ref().is_some_and(|c| !c.is_default()) {
            self.writer.write_all(b"\x1b[0m")?;
        }
        self.current = Some(Color::RESET);
        Ok(())
    }

    /// Consume the presenter, returning the inner writer.
    pub fn into_inner(self) -> io::Result<W> {
        self.writer.into_inner().map_err(|e| e.into_error())
    }
}
