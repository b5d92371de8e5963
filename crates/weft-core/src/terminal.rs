#![forbid(unsafe_code)]

//! Terminal session lifecycle guard.
//!
//! RAII-based terminal lifecycle management: raw-mode entry/exit, the
//! alternate screen, mouse reporting, bracketed paste, cursor visibility
//! and window title are all tracked, and every enabled mode is disabled
//! in reverse order when the [`TerminalSession`] is dropped. Cleanup runs
//! during panic unwinding as well, so no exit path leaks terminal state.
//!
//! # Escape Sequences
//!
//! | Feature | Enable | Disable |
//! |---------|--------|---------|
//! | Alternate screen | `CSI ? 1049 h` | `CSI ? 1049 l` |
//! | Mouse (SGR) | `CSI ? 1000;1006 h` | `CSI ? 1000;1006 l` |
//! | Mouse direct motion | `CSI ? 1003 h` | `CSI ? 1003 l` |
//! | Bracketed paste | `CSI ? 2004 h` | `CSI ? 2004 l` |
//! | Show cursor | `CSI ? 25 h` | `CSI ? 25 l` |
//! | Window title | `OSC 0 ; title BEL` | cleared on exit |

use std::env;
use std::io::{self, Read, Write};
use std::sync::mpsc::Sender;
use std::thread::JoinHandle;

use crossterm::terminal;
use tracing::{debug, error};

use crate::event::Event;

/// Environment variable holding the window-title prefix.
pub const TITLE_ENV: &str = "TERMINAL_TITLE";

/// Cursor shapes selectable through `CSI Ps SP q`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorShape {
    /// Blinking block (terminal default).
    #[default]
    BlinkingBlock,
    /// Steady block.
    SteadyBlock,
    /// Blinking underline.
    BlinkingUnderline,
    /// Steady underline.
    SteadyUnderline,
    /// Blinking bar.
    BlinkingBar,
    /// Steady bar.
    SteadyBar,
}

impl CursorShape {
    const fn param(self) -> u8 {
        match self {
            Self::BlinkingBlock => 1,
            Self::SteadyBlock => 2,
            Self::BlinkingUnderline => 3,
            Self::SteadyUnderline => 4,
            Self::BlinkingBar => 5,
            Self::SteadyBar => 6,
        }
    }
}

/// Options controlling which terminal modes a session enables.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Enter the alternate screen.
    pub alternate_screen: bool,
    /// Enable SGR mouse reporting (press/release/drag/wheel).
    pub mouse: bool,
    /// Also report motion with no button held.
    pub mouse_motion: bool,
    /// Enable bracketed paste.
    pub bracketed_paste: bool,
    /// Hide the cursor while the session is active.
    pub hide_cursor: bool,
    /// Window title; prefixed by `TERMINAL_TITLE` when set.
    pub title: Option<String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            alternate_screen: true,
            mouse: true,
            mouse_motion: false,
            bracketed_paste: true,
            hide_cursor: true,
            title: None,
        }
    }
}

/// RAII terminal session.
///
/// Owns the terminal file descriptor configuration for its lifetime.
/// Attributes are saved on creation and restored on [`Drop`] in reverse
/// order of enabling.
#[derive(Debug)]
pub struct TerminalSession {
    options: SessionOptions,
    raw_mode: bool,
    titled: bool,
}

impl TerminalSession {
    /// Enter a terminal session with the given options.
    pub fn new(options: SessionOptions) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut session = Self {
            options,
            raw_mode: true,
            titled: false,
        };

        let mut out = io::stdout();
        if session.options.alternate_screen {
            out.write_all(b"\x1b[?1049h")?;
        }
        if session.options.hide_cursor {
            out.write_all(b"\x1b[?25l")?;
        }
        if session.options.mouse {
            out.write_all(b"\x1b[?1000;1006h")?;
            if session.options.mouse_motion {
                out.write_all(b"\x1b[?1003h")?;
            }
        }
        if session.options.bracketed_paste {
            out.write_all(b"\x1b[?2004h")?;
        }
        if let Some(title) = session.options.title.clone() {
            session.set_title(&title)?;
        }
        out.flush()?;
        debug!("terminal session started");
        Ok(session)
    }

    /// Current terminal size as `(cols, rows)`.
    pub fn size(&self) -> io::Result<(u16, u16)> {
        terminal::size()
    }

    /// Set the window title, honoring the `TERMINAL_TITLE` prefix.
    pub fn set_title(&mut self, title: &str) -> io::Result<()> {
        let full = match env::var(TITLE_ENV) {
            Ok(prefix) if !prefix.is_empty() => format!("{prefix} - {title}"),
            _ => title.to_string(),
        };
        let mut out = io::stdout();
        write!(out, "\x1b]0;{full}\x07")?;
        out.flush()?;
        self.titled = true;
        Ok(())
    }

    /// Select the cursor shape.
    pub fn set_cursor_shape(&self, shape: CursorShape) -> io::Result<()> {
        let mut out = io::stdout();
        write!(out, "\x1b[{} q", shape.param())?;
        out.flush()
    }

    /// Show the cursor.
    pub fn show_cursor(&self) -> io::Result<()> {
        io::stdout().write_all(b"\x1b[?25h")
    }

    /// Hide the cursor.
    pub fn hide_cursor(&self) -> io::Result<()> {
        io::stdout().write_all(b"\x1b[?25l")
    }

    /// The options this session was created with.
    #[must_use]
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    fn restore(&mut self) {
        let mut out = io::stdout();
        // Reverse order of enabling; best-effort on the exit path.
        if self.options.bracketed_paste {
            let _ = out.write_all(b"\x1b[?2004l");
        }
        if self.options.mouse {
            if self.options.mouse_motion {
                let _ = out.write_all(b"\x1b[?1003l");
            }
            let _ = out.write_all(b"\x1b[?1000;1006l");
        }
        let _ = out.write_all(b"\x1b[0m");
        let _ = out.write_all(b"\x1b[?25h");
        if self.titled {
            let _ = out.write_all(b"\x1b]0;\x07");
        }
        if self.options.alternate_screen {
            let _ = out.write_all(b"\x1b[?1049l");
        }
        let _ = out.flush();
        if self.raw_mode {
            if let Err(err) = terminal::disable_raw_mode() {
                error!(?err, "failed to disable raw mode");
            }
            self.raw_mode = false;
        }
        debug!("terminal session restored");
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        self.restore();
    }
}

/// Raw bytes or out-of-band notifications flowing into the UI loop.
#[derive(Debug)]
pub enum InputChunk {
    /// A burst of bytes read from stdin.
    Bytes(Vec<u8>),
    /// The terminal reported a new size (SIGWINCH).
    Resize(u16, u16),
    /// Stdin reached EOF or failed; the loop should exit.
    Closed,
}

/// Spawn the blocking stdin reader thread.
///
/// Reads stdin in bursts and forwards them over `tx`. The thread exits
/// when the receiving side hangs up or stdin closes.
pub fn spawn_stdin_reader(tx: Sender<InputChunk>) -> JoinHandle<()> {
    std::thread::Builder::new()
        .name("weft-stdin".into())
        .spawn(move || {
            let mut stdin = io::stdin();
            let mut buf = [0u8; 4096];
            loop {
                match stdin.read(&mut buf) {
                    Ok(0) => {
                        let _ = tx.send(InputChunk::Closed);
                        break;
                    }
                    Ok(n) => {
                        if tx.send(InputChunk::Bytes(buf[..n].to_vec())).is_err() {
                            break;
                        }
                    }
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                    Err(err) => {
                        error!(?err, "stdin read failed");
                        let _ = tx.send(InputChunk::Closed);
                        break;
                    }
                }
            }
        })
        .expect("failed to spawn stdin reader")
}

/// Spawn the SIGWINCH listener thread (unix only).
///
/// Posts a [`InputChunk::Resize`] with the fresh terminal size whenever
/// the window changes.
#[cfg(unix)]
pub fn spawn_resize_listener(tx: Sender<InputChunk>) -> io::Result<JoinHandle<()>> {
    use signal_hook::consts::signal::SIGWINCH;
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGWINCH])?;
    let handle = std::thread::Builder::new()
        .name("weft-winch".into())
        .spawn(move || {
            for _ in signals.forever() {
                match terminal::size() {
                    Ok((cols, rows)) => {
                        if tx.send(InputChunk::Resize(cols, rows)).is_err() {
                            break;
                        }
                    }
                    Err(err) => error!(?err, "terminal size query failed"),
                }
            }
        })
        .expect("failed to spawn resize listener");
    Ok(handle)
}

/// Decode a chunk into zero or more events using the given decoder.
pub fn decode_chunk(decoder: &mut crate::decoder::Decoder, chunk: &InputChunk) -> Vec<Event> {
    match chunk {
        InputChunk::Bytes(bytes) => decoder.feed(bytes),
        InputChunk::Resize(cols, rows) => vec![Event::Resize {
            cols: *cols,
            rows: *rows,
        }],
        InputChunk::Closed => Vec::new(),
    }
}
