#![forbid(unsafe_code)]

//! Terminal input decoder state machine.
//!
//! Decodes raw terminal bytes into [`Event`] values:
//!
//! - ASCII characters and control codes
//! - UTF-8 multi-byte sequences
//! - CSI (`ESC [ ... final`) sequences, including xterm modifier params
//! - SS3 (`ESC O letter`) sequences
//! - OSC (`ESC ] ... BEL/ST`) sequences
//! - SGR mouse reports (`ESC [ < b ; x ; y M/m`) and classic X10 reports
//! - Bracketed paste (`ESC [ 200 ~ ... ESC [ 201 ~`)
//!
//! # Invariants
//!
//! - Partial escape sequences at a read boundary are buffered until the
//!   next feed or a bounded timeout resolves them as a lone Esc
//!   ([`Decoder::poll_timeout`]).
//! - No byte is dropped silently: unknown or oversized sequences are
//!   logged at WARN and surfaced as [`Event::Raw`].
//!
//! # Sequence length limits
//!
//! - CSI sequences: 256 bytes max
//! - OSC sequences: 4 KB max
//! - Paste content: 1 MB max

use std::time::{Duration, Instant};

use tracing::warn;

use crate::event::{
    Event, KeyCode, KeyEvent, Modifiers, MouseButton, MouseEvent, MouseEventKind, PasteEvent,
};

/// Maximum CSI sequence length.
const MAX_CSI_LEN: usize = 256;

/// Maximum OSC sequence length.
const MAX_OSC_LEN: usize = 4096;

/// Maximum paste content length.
const MAX_PASTE_LEN: usize = 1024 * 1024;

/// Tunable decoder parameters.
#[derive(Debug, Clone, Copy)]
pub struct DecoderConfig {
    /// How long a partial escape sequence may sit unfinished before it
    /// resolves as a lone Esc. Platform defaults fall in 25-100 ms.
    pub esc_timeout: Duration,
    /// Inter-press window for double/triple click detection.
    pub tap_window: Duration,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            esc_timeout: Duration::from_millis(50),
            tap_window: Duration::from_millis(300),
        }
    }
}

/// Decoder state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    /// Normal character input.
    #[default]
    Ground,
    /// After ESC.
    Escape,
    /// Collecting CSI parameter bytes.
    Csi,
    /// After `ESC [ M`: collecting the three X10 payload bytes.
    X10 {
        /// Payload bytes received so far (0..3).
        got: u8,
    },
    /// After `ESC O`.
    Ss3,
    /// Collecting OSC content.
    Osc,
    /// After ESC inside OSC (possible `ESC \` terminator).
    OscEscape,
    /// Collecting a UTF-8 multi-byte sequence.
    Utf8 {
        /// Bytes collected so far.
        collected: u8,
        /// Total bytes expected.
        expected: u8,
    },
}

/// Per-button tap bookkeeping.
#[derive(Debug, Clone, Copy)]
struct TapState {
    last_press: Option<Instant>,
    tap: u8,
}

impl TapState {
    const fn new() -> Self {
        Self {
            last_press: None,
            tap: 0,
        }
    }

    /// Register a press at `now`, returning the updated tap count.
    fn press(&mut self, now: Instant, window: Duration) -> u8 {
        self.tap = match self.last_press {
            Some(prev) if now.duration_since(prev) < window => self.tap.saturating_add(1),
            _ => 1,
        };
        self.last_press = Some(now);
        self.tap
    }
}

/// Terminal input decoder.
///
/// Feed raw bytes with [`Decoder::feed`]; call [`Decoder::poll_timeout`]
/// from the event loop when no input arrives so pending escapes resolve.
///
/// ```
/// use weft_core::decoder::Decoder;
/// use weft_core::event::{Event, KeyCode};
///
/// let mut dec = Decoder::new();
/// let events = dec.feed(b"\x1b[A");
/// assert_eq!(events.len(), 1);
/// assert!(matches!(&events[0], Event::Key(k) if k.code == KeyCode::Up));
/// ```
#[derive(Debug)]
pub struct Decoder {
    config: DecoderConfig,
    state: State,
    /// Bytes of the sequence currently being collected (without ESC).
    buffer: Vec<u8>,
    /// UTF-8 bytes collected so far.
    utf8: [u8; 4],
    /// Accumulated paste content while in bracketed paste mode.
    paste: Vec<u8>,
    in_paste: bool,
    /// When the current partial sequence started waiting.
    pending_since: Option<Instant>,
    left: TapState,
    middle: TapState,
    right: TapState,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    /// Create a decoder with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    /// Create a decoder with explicit configuration.
    #[must_use]
    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            config,
            state: State::Ground,
            buffer: Vec::with_capacity(64),
            utf8: [0; 4],
            paste: Vec::new(),
            in_paste: false,
            pending_since: None,
            left: TapState::new(),
            middle: TapState::new(),
            right: TapState::new(),
        }
    }

    /// Decode a burst of input bytes into events.
    pub fn feed(&mut self, input: &[u8]) -> Vec<Event> {
        self.feed_at(input, Instant::now())
    }

    /// Decode a burst with an explicit timestamp (tap-count clock).
    pub fn feed_at(&mut self, input: &[u8], now: Instant) -> Vec<Event> {
        let mut events = Vec::new();
        for &byte in input {
            self.process_byte(byte, now, &mut events);
        }
        self.pending_since = if self.state == State::Ground {
            None
        } else {
            Some(self.pending_since.unwrap_or(now))
        };
        events
    }

    /// Resolve a stale partial escape sequence as a lone Esc.
    ///
    /// Returns events when the pending sequence timed out; the buffered
    /// non-ESC bytes are re-decoded as ordinary input.
    pub fn poll_timeout(&mut self, now: Instant) -> Vec<Event> {
        let Some(since) = self.pending_since else {
            return Vec::new();
        };
        if now.duration_since(since) < self.config.esc_timeout {
            return Vec::new();
        }

        let state = std::mem::take(&mut self.state);
        let buffered = std::mem::take(&mut self.buffer);
        self.pending_since = None;

        let mut events = Vec::new();
        match state {
            State::Ground => {}
            State::Utf8 { collected, .. } => {
                // Incomplete UTF-8: surface the bytes instead of dropping them.
                warn!(bytes = collected, "incomplete utf-8 sequence timed out");
                events.push(Event::Raw(self.utf8[..collected as usize].to_vec()));
            }
            State::Escape => events.push(Event::Key(KeyEvent::new(KeyCode::Escape))),
            _ => {
                events.push(Event::Key(KeyEvent::new(KeyCode::Escape)));
                // Replay whatever followed the ESC as ordinary input.
                let mut replayed = Vec::new();
                for &b in &buffered {
                    self.process_ground(b, &mut replayed);
                }
                events.extend(replayed);
            }
        }
        events
    }

    /// Earliest deadline at which [`Decoder::poll_timeout`] will act.
    #[must_use]
    pub fn pending_deadline(&self) -> Option<Instant> {
        self.pending_since.map(|t| t + self.config.esc_timeout)
    }

    fn process_byte(&mut self, byte: u8, now: Instant, out: &mut Vec<Event>) {
        if self.in_paste {
            self.process_paste_byte(byte, out);
            return;
        }
        match self.state {
            State::Ground => self.process_ground(byte, out),
            State::Escape => self.process_escape(byte, out),
            State::Csi => self.process_csi(byte, now, out),
            State::X10 { got } => self.process_x10(byte, got, now, out),
            State::Ss3 => self.process_ss3(byte, out),
            State::Osc => self.process_osc(byte, out),
            State::OscEscape => self.process_osc_escape(byte, out),
            State::Utf8 {
                collected,
                expected,
            } => self.process_utf8(byte, collected, expected, out),
        }
    }

    fn process_ground(&mut self, byte: u8, out: &mut Vec<Event>) {
        match byte {
            0x1b => self.state = State::Escape,
            b'\r' | b'\n' => out.push(Event::Key(KeyEvent::new(KeyCode::Enter))),
            b'\t' => out.push(Event::Key(KeyEvent::new(KeyCode::Tab))),
            0x7f | 0x08 => out.push(Event::Key(KeyEvent::new(KeyCode::Backspace))),
            0x01..=0x1a => {
                // Ctrl+A..Ctrl+Z (minus the codes claimed above).
                let letter = byte - 0x01 + b'a';
                out.push(Event::Key(
                    KeyEvent::new(KeyCode::Ctrl(letter)).with_modifiers(Modifiers::CONTROL),
                ));
            }
            0x00 | 0x1c..=0x1f => out.push(Event::Raw(vec![byte])),
            0x20..=0x7e => out.push(Event::Key(KeyEvent::text(
                char::from(byte).to_string(),
            ))),
            _ => {
                // UTF-8 lead byte.
                let expected = match byte {
                    0xc0..=0xdf => 2,
                    0xe0..=0xef => 3,
                    0xf0..=0xf7 => 4,
                    _ => {
                        warn!(byte, "invalid utf-8 lead byte");
                        out.push(Event::Raw(vec![byte]));
                        return;
                    }
                };
                self.utf8[0] = byte;
                self.state = State::Utf8 {
                    collected: 1,
                    expected,
                };
            }
        }
    }

    fn process_escape(&mut self, byte: u8, out: &mut Vec<Event>) {
        match byte {
            b'[' => {
                self.buffer.clear();
                self.buffer.push(b'[');
                self.state = State::Csi;
            }
            b'O' => {
                self.buffer.clear();
                self.buffer.push(b'O');
                self.state = State::Ss3;
            }
            b']' => {
                self.buffer.clear();
                self.buffer.push(b']');
                self.state = State::Osc;
            }
            0x1b => {
                // ESC ESC: the first one was a lone Escape.
                out.push(Event::Key(KeyEvent::new(KeyCode::Escape)));
            }
            0x20..=0x7e => {
                // Alt+key.
                self.state = State::Ground;
                out.push(Event::Key(
                    KeyEvent::text(char::from(byte).to_string()).with_modifiers(Modifiers::ALT),
                ));
            }
            _ => {
                self.state = State::Ground;
                out.push(Event::Raw(vec![0x1b, byte]));
            }
        }
    }

    fn process_csi(&mut self, byte: u8, now: Instant, out: &mut Vec<Event>) {
        if self.buffer.len() > MAX_CSI_LEN {
            warn!(len = self.buffer.len(), "oversized CSI sequence discarded");
            let mut raw = vec![0x1b];
            raw.extend_from_slice(&self.buffer);
            raw.push(byte);
            out.push(Event::Raw(raw));
            self.reset();
            return;
        }
        match byte {
            // Parameter and intermediate bytes.
            0x20..=0x3f => self.buffer.push(byte),
            b'M' if self.buffer.len() == 1 => {
                // Classic X10 report: three payload bytes follow.
                self.buffer.push(byte);
                self.state = State::X10 { got: 0 };
            }
            0x40..=0x7e => {
                self.buffer.push(byte);
                self.finish_csi(now, out);
            }
            _ => {
                warn!(byte, "unexpected byte in CSI sequence");
                let mut raw = vec![0x1b];
                raw.extend_from_slice(&self.buffer);
                raw.push(byte);
                out.push(Event::Raw(raw));
                self.reset();
            }
        }
    }

    fn finish_csi(&mut self, now: Instant, out: &mut Vec<Event>) {
        let seq = std::mem::take(&mut self.buffer);
        self.state = State::Ground;
        // seq = "[" params final
        let final_byte = *seq.last().unwrap_or(&0);
        let params = &seq[1..seq.len() - 1];

        if params.first() == Some(&b'<') {
            self.decode_sgr_mouse(&seq, &params[1..], final_byte, now, out);
            return;
        }

        let event = match final_byte {
            b'A' => Some(self.key_with_modifiers(KeyCode::Up, params)),
            b'B' => Some(self.key_with_modifiers(KeyCode::Down, params)),
            b'C' => Some(self.key_with_modifiers(KeyCode::Right, params)),
            b'D' => Some(self.key_with_modifiers(KeyCode::Left, params)),
            b'H' => Some(self.key_with_modifiers(KeyCode::Home, params)),
            b'F' => Some(self.key_with_modifiers(KeyCode::End, params)),
            b'Z' => Some(KeyEvent::new(KeyCode::BackTab).with_modifiers(Modifiers::SHIFT)),
            b'~' => self.decode_csi_tilde(params, out),
            _ => None,
        };

        match event {
            Some(ev) => out.push(Event::Key(ev)),
            None => {
                if final_byte != b'~' {
                    let mut raw = vec![0x1b];
                    raw.extend_from_slice(&seq);
                    out.push(Event::Raw(raw));
                }
            }
        }
    }

    /// Decode `ESC [ n ~` style keys. Paste markers flip paste mode and
    /// produce no key event.
    fn decode_csi_tilde(&mut self, params: &[u8], out: &mut Vec<Event>) -> Option<KeyEvent> {
        let first = first_param(params)?;
        let code = match first {
            1 | 7 => KeyCode::Home,
            2 => KeyCode::Insert,
            3 => KeyCode::Delete,
            4 | 8 => KeyCode::End,
            5 => KeyCode::PageUp,
            6 => KeyCode::PageDown,
            11..=15 => KeyCode::F((first - 10) as u8),
            17..=21 => KeyCode::F((first - 11) as u8),
            23 | 24 => KeyCode::F((first - 12) as u8),
            200 => {
                self.in_paste = true;
                self.paste.clear();
                return None;
            }
            201 => {
                // Stray paste end without a start; ignore.
                return None;
            }
            _ => {
                let mut raw = b"\x1b[".to_vec();
                raw.extend_from_slice(params);
                raw.push(b'~');
                out.push(Event::Raw(raw));
                return None;
            }
        };
        Some(self.key_with_modifiers(code, params))
    }

    fn key_with_modifiers(&self, code: KeyCode, params: &[u8]) -> KeyEvent {
        KeyEvent::new(code).with_modifiers(xterm_modifiers(params))
    }

    fn decode_sgr_mouse(
        &mut self,
        seq: &[u8],
        params: &[u8],
        final_byte: u8,
        now: Instant,
        out: &mut Vec<Event>,
    ) {
        let mut parts = params.split(|&b| b == b';');
        let (Some(code), Some(x), Some(y)) = (
            parts.next().and_then(parse_u32),
            parts.next().and_then(parse_u32),
            parts.next().and_then(parse_u32),
        ) else {
            warn!("malformed SGR mouse report");
            let mut raw = vec![0x1b];
            raw.extend_from_slice(seq);
            out.push(Event::Raw(raw));
            return;
        };

        let press = final_byte == b'M';
        let mut modifiers = Modifiers::NONE;
        if code & 0x04 != 0 {
            modifiers |= Modifiers::SHIFT;
        }
        if code & 0x08 != 0 {
            modifiers |= Modifiers::ALT;
        }
        if code & 0x10 != 0 {
            modifiers |= Modifiers::CONTROL;
        }
        let base = code & !0x1c;

        let (button, kind, tap) = match base {
            0..=2 => {
                let button = match base {
                    0 => MouseButton::Left,
                    1 => MouseButton::Middle,
                    _ => MouseButton::Right,
                };
                let tap = if press {
                    let state = match button {
                        MouseButton::Left => &mut self.left,
                        MouseButton::Middle => &mut self.middle,
                        _ => &mut self.right,
                    };
                    state.press(now, self.config.tap_window)
                } else {
                    match button {
                        MouseButton::Left => self.left.tap,
                        MouseButton::Middle => self.middle.tap,
                        _ => self.right.tap,
                    }
                };
                let kind = if press {
                    MouseEventKind::Press
                } else {
                    MouseEventKind::Release
                };
                (button, kind, tap)
            }
            0x20..=0x22 => {
                let button = match base {
                    0x20 => MouseButton::Left,
                    0x21 => MouseButton::Middle,
                    _ => MouseButton::Right,
                };
                (button, MouseEventKind::Drag, 0)
            }
            0x23 => (MouseButton::None, MouseEventKind::Move, 0),
            0x40 => (MouseButton::Wheel, MouseEventKind::WheelUp, 0),
            0x41 => (MouseButton::Wheel, MouseEventKind::WheelDown, 0),
            0x42 => (MouseButton::Wheel, MouseEventKind::WheelLeft, 0),
            0x43 => (MouseButton::Wheel, MouseEventKind::WheelRight, 0),
            _ => {
                warn!(code, "unhandled SGR mouse code");
                let mut raw = vec![0x1b];
                raw.extend_from_slice(seq);
                out.push(Event::Raw(raw));
                return;
            }
        };

        let mut raw = vec![0x1b];
        raw.extend_from_slice(seq);
        out.push(Event::Mouse(MouseEvent {
            x: x as i32 - 1,
            y: y as i32 - 1,
            button,
            kind,
            modifiers,
            tap,
            raw,
        }));
    }

    fn process_x10(&mut self, byte: u8, got: u8, now: Instant, out: &mut Vec<Event>) {
        self.buffer.push(byte);
        if got + 1 < 3 {
            self.state = State::X10 { got: got + 1 };
            return;
        }
        let seq = std::mem::take(&mut self.buffer);
        self.state = State::Ground;
        // seq = "[M" cb cx cy, each payload byte offset by 32.
        let cb = seq[2].wrapping_sub(32);
        let x = i32::from(seq[3].wrapping_sub(32)) - 1;
        let y = i32::from(seq[4].wrapping_sub(32)) - 1;

        let mut modifiers = Modifiers::NONE;
        if cb & 0x04 != 0 {
            modifiers |= Modifiers::SHIFT;
        }
        if cb & 0x08 != 0 {
            modifiers |= Modifiers::ALT;
        }
        if cb & 0x10 != 0 {
            modifiers |= Modifiers::CONTROL;
        }

        let motion = cb & 0x20 != 0;
        let low = cb & 0x03;
        let (button, kind, tap) = if cb & 0x40 != 0 {
            let kind = if low & 1 == 0 {
                MouseEventKind::WheelUp
            } else {
                MouseEventKind::WheelDown
            };
            (MouseButton::Wheel, kind, 0)
        } else if motion {
            let button = match low {
                0 => MouseButton::Left,
                1 => MouseButton::Middle,
                2 => MouseButton::Right,
                _ => MouseButton::None,
            };
            let kind = if button == MouseButton::None {
                MouseEventKind::Move
            } else {
                MouseEventKind::Drag
            };
            (button, kind, 0)
        } else if low == 3 {
            // X10 reports release as button 3; the button is unknown.
            (MouseButton::None, MouseEventKind::Release, 0)
        } else {
            let button = match low {
                0 => MouseButton::Left,
                1 => MouseButton::Middle,
                _ => MouseButton::Right,
            };
            let state = match button {
                MouseButton::Left => &mut self.left,
                MouseButton::Middle => &mut self.middle,
                _ => &mut self.right,
            };
            let tap = state.press(now, self.config.tap_window);
            (button, MouseEventKind::Press, tap)
        };

        let mut raw = vec![0x1b];
        raw.extend_from_slice(&seq);
        out.push(Event::Mouse(MouseEvent {
            x,
            y,
            button,
            kind,
            modifiers,
            tap,
            raw,
        }));
    }

    fn process_ss3(&mut self, byte: u8, out: &mut Vec<Event>) {
        self.state = State::Ground;
        self.buffer.clear();
        let code = match byte {
            b'A' => Some(KeyCode::Up),
            b'B' => Some(KeyCode::Down),
            b'C' => Some(KeyCode::Right),
            b'D' => Some(KeyCode::Left),
            b'H' => Some(KeyCode::Home),
            b'F' => Some(KeyCode::End),
            b'P' => Some(KeyCode::F(1)),
            b'Q' => Some(KeyCode::F(2)),
            b'R' => Some(KeyCode::F(3)),
            b'S' => Some(KeyCode::F(4)),
            _ => None,
        };
        match code {
            Some(code) => out.push(Event::Key(KeyEvent::new(code))),
            None => out.push(Event::Raw(vec![0x1b, b'O', byte])),
        }
    }

    fn process_osc(&mut self, byte: u8, out: &mut Vec<Event>) {
        if self.buffer.len() > MAX_OSC_LEN {
            warn!(len = self.buffer.len(), "oversized OSC sequence discarded");
            let mut raw = vec![0x1b];
            raw.append(&mut self.buffer);
            out.push(Event::Raw(raw));
            self.reset();
            return;
        }
        match byte {
            0x07 => self.finish_osc(out),
            0x1b => self.state = State::OscEscape,
            _ => self.buffer.push(byte),
        }
    }

    fn process_osc_escape(&mut self, byte: u8, out: &mut Vec<Event>) {
        if byte == b'\\' {
            self.finish_osc(out);
        } else {
            // Not a terminator; keep collecting.
            self.buffer.push(0x1b);
            self.buffer.push(byte);
            self.state = State::Osc;
        }
    }

    fn finish_osc(&mut self, out: &mut Vec<Event>) {
        // OSC responses are surfaced for tracing only.
        let mut raw = vec![0x1b];
        raw.append(&mut self.buffer);
        out.push(Event::Raw(raw));
        self.state = State::Ground;
    }

    fn process_utf8(&mut self, byte: u8, collected: u8, expected: u8, out: &mut Vec<Event>) {
        if byte & 0xc0 != 0x80 {
            warn!(byte, "invalid utf-8 continuation byte");
            let mut raw = self.utf8[..collected as usize].to_vec();
            raw.push(byte);
            out.push(Event::Raw(raw));
            self.state = State::Ground;
            return;
        }
        self.utf8[collected as usize] = byte;
        let collected = collected + 1;
        if collected < expected {
            self.state = State::Utf8 {
                collected,
                expected,
            };
            return;
        }
        self.state = State::Ground;
        match std::str::from_utf8(&self.utf8[..collected as usize]) {
            Ok(s) => out.push(Event::Key(KeyEvent::text(s))),
            Err(_) => {
                warn!("invalid utf-8 sequence");
                out.push(Event::Raw(self.utf8[..collected as usize].to_vec()));
            }
        }
    }

    fn process_paste_byte(&mut self, byte: u8, out: &mut Vec<Event>) {
        self.paste.push(byte);
        if self.paste.len() > MAX_PASTE_LEN {
            warn!(len = self.paste.len(), "oversized paste discarded");
            self.paste.clear();
            self.in_paste = false;
            return;
        }
        const END: &[u8] = b"\x1b[201~";
        if self.paste.ends_with(END) {
            self.paste.truncate(self.paste.len() - END.len());
            self.in_paste = false;
            let content = std::mem::take(&mut self.paste);
            // Terminals in CRNL mode substitute \n with \r inside pastes.
            let text = String::from_utf8_lossy(&content).replace('\r', "\n");
            out.push(Event::Paste(PasteEvent::new(text)));
        }
    }

    fn reset(&mut self) {
        self.state = State::Ground;
        self.buffer.clear();
    }
}

/// Parse the first decimal parameter of a CSI sequence.
fn first_param(params: &[u8]) -> Option<u32> {
    parse_u32(params.split(|&b| b == b';').next()?)
}

/// Decode xterm `1;N` modifier parameters (N-1 is the bitset).
fn xterm_modifiers(params: &[u8]) -> Modifiers {
    let Some(part) = params.split(|&b| b == b';').nth(1) else {
        return Modifiers::NONE;
    };
    let Some(value) = parse_u32(part) else {
        return Modifiers::NONE;
    };
    let bits = value.saturating_sub(1);
    let mut modifiers = Modifiers::NONE;
    if bits & 1 != 0 {
        modifiers |= Modifiers::SHIFT;
    }
    if bits & 2 != 0 {
        modifiers |= Modifiers::ALT;
    }
    if bits & 4 != 0 {
        modifiers |= Modifiers::CONTROL;
    }
    if bits & 8 != 0 {
        modifiers |= Modifiers::META;
    }
    modifiers
}

fn parse_u32(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() {
        return None;
    }
    let mut value: u32 = 0;
    for &b in bytes {
        if !b.is_ascii_digit() {
            return None;
        }
        value = value.checked_mul(10)?.checked_add(u32::from(b - b'0'))?;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(events: &[Event]) -> Vec<KeyCode> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::Key(k) => Some(k.code.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn ascii_characters_decoded() {
        let mut dec = Decoder::new();
        let events = dec.feed(b"ab");
        assert_eq!(
            keys(&events),
            vec![
                KeyCode::Text("a".into()),
                KeyCode::Text("b".into()),
            ]
        );
    }

    #[test]
    fn control_characters() {
        let mut dec = Decoder::new();
        let events = dec.feed(b"\x01\x03");
        assert_eq!(keys(&events), vec![KeyCode::Ctrl(b'a'), KeyCode::Ctrl(b'c')]);
        for ev in &events {
            if let Event::Key(k) = ev {
                assert!(k.ctrl());
            }
        }
    }

    #[test]
    fn arrow_keys_csi() {
        let mut dec = Decoder::new();
        let events = dec.feed(b"\x1b[A\x1b[B\x1b[C\x1b[D");
        assert_eq!(
            keys(&events),
            vec![KeyCode::Up, KeyCode::Down, KeyCode::Right, KeyCode::Left]
        );
    }

    #[test]
    fn arrow_keys_ss3() {
        let mut dec = Decoder::new();
        let events = dec.feed(b"\x1bOA\x1bOD");
        assert_eq!(keys(&events), vec![KeyCode::Up, KeyCode::Left]);
    }

    #[test]
    fn modifiers_in_csi() {
        let mut dec = Decoder::new();
        let events = dec.feed(b"\x1b[1;5A");
        assert_eq!(events.len(), 1);
        let Event::Key(k) = &events[0] else {
            panic!("expected key");
        };
        assert_eq!(k.code, KeyCode::Up);
        assert!(k.ctrl());
        assert!(!k.shift());
    }

    #[test]
    fn tilde_keys() {
        let mut dec = Decoder::new();
        let events = dec.feed(b"\x1b[3~\x1b[5~\x1b[6~\x1b[15~");
        assert_eq!(
            keys(&events),
            vec![
                KeyCode::Delete,
                KeyCode::PageUp,
                KeyCode::PageDown,
                KeyCode::F(5)
            ]
        );
    }

    #[test]
    fn back_tab_carries_shift() {
        let mut dec = Decoder::new();
        let events = dec.feed(b"\x1b[Z");
        let Event::Key(k) = &events[0] else {
            panic!("expected key");
        };
        assert_eq!(k.code, KeyCode::BackTab);
        assert!(k.shift());
    }

    #[test]
    fn alt_key_escape_prefix() {
        let mut dec = Decoder::new();
        let events = dec.feed(b"\x1bx");
        let Event::Key(k) = &events[0] else {
            panic!("expected key");
        };
        assert_eq!(k.code, KeyCode::Text("x".into()));
        assert!(k.alt());
    }

    #[test]
    fn utf8_multibyte_text() {
        let mut dec = Decoder::new();
        let events = dec.feed("é漢".as_bytes());
        assert_eq!(
            keys(&events),
            vec![KeyCode::Text("é".into()), KeyCode::Text("漢".into())]
        );
    }

    #[test]
    fn utf8_split_across_feeds() {
        let mut dec = Decoder::new();
        let bytes = "漢".as_bytes();
        assert!(dec.feed(&bytes[..1]).is_empty());
        let events = dec.feed(&bytes[1..]);
        assert_eq!(keys(&events), vec![KeyCode::Text("漢".into())]);
    }

    #[test]
    fn bracketed_paste_accumulates() {
        let mut dec = Decoder::new();
        let events = dec.feed(b"\x1b[200~hello\rworld\x1b[201~");
        assert_eq!(events.len(), 1);
        let Event::Paste(p) = &events[0] else {
            panic!("expected paste");
        };
        assert_eq!(p.text, "hello\nworld");
    }

    #[test]
    fn paste_split_across_feeds() {
        let mut dec = Decoder::new();
        assert!(dec.feed(b"\x1b[200~par").is_empty());
        assert!(dec.feed(b"tial").is_empty());
        let events = dec.feed(b"\x1b[201~");
        let Event::Paste(p) = &events[0] else {
            panic!("expected paste");
        };
        assert_eq!(p.text, "partial");
    }

    #[test]
    fn sgr_mouse_press_release() {
        let mut dec = Decoder::new();
        let events = dec.feed(b"\x1b[<0;5;7M\x1b[<0;5;7m");
        assert_eq!(events.len(), 2);
        let Event::Mouse(press) = &events[0] else {
            panic!("expected mouse");
        };
        assert_eq!((press.x, press.y), (4, 6));
        assert_eq!(press.button, MouseButton::Left);
        assert_eq!(press.kind, MouseEventKind::Press);
        assert_eq!(press.tap, 1);
        let Event::Mouse(release) = &events[1] else {
            panic!("expected mouse");
        };
        assert_eq!(release.kind, MouseEventKind::Release);
        assert_eq!(release.tap, 1);
    }

    #[test]
    fn sgr_mouse_wheel_and_drag() {
        let mut dec = Decoder::new();
        let events = dec.feed(b"\x1b[<64;1;1M\x1b[<65;1;1M\x1b[<32;2;2M\x1b[<35;3;3M");
        let kinds: Vec<_> = events
            .iter()
            .map(|e| match e {
                Event::Mouse(m) => m.kind,
                _ => panic!("expected mouse"),
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                MouseEventKind::WheelUp,
                MouseEventKind::WheelDown,
                MouseEventKind::Drag,
                MouseEventKind::Move,
            ]
        );
    }

    #[test]
    fn sgr_mouse_modifiers() {
        let mut dec = Decoder::new();
        let events = dec.feed(b"\x1b[<16;1;1M");
        let Event::Mouse(m) = &events[0] else {
            panic!("expected mouse");
        };
        assert!(m.modifiers.contains(Modifiers::CONTROL));
        assert_eq!(m.button, MouseButton::Left);
    }

    #[test]
    fn tap_counts_within_window() {
        let mut dec = Decoder::new();
        let t0 = Instant::now();
        let press = b"\x1b[<0;1;1M";
        let release = b"\x1b[<0;1;1m";

        let taps = |events: &[Event]| -> Vec<u8> {
            events
                .iter()
                .map(|e| match e {
                    Event::Mouse(m) => m.tap,
                    _ => panic!("expected mouse"),
                })
                .collect()
        };

        let mut all = Vec::new();
        for i in 0..3u64 {
            let t = t0 + Duration::from_millis(i * 100);
            all.extend(dec.feed_at(press, t));
            all.extend(dec.feed_at(release, t));
        }
        // Release after first press carries tap=1, second tap=2, third tap=3.
        assert_eq!(taps(&all), vec![1, 1, 2, 2, 3, 3]);

        // A fourth press past the window resets to tap=1.
        let late = t0 + Duration::from_millis(1000);
        let events = dec.feed_at(press, late);
        assert_eq!(taps(&events), vec![1]);
    }

    #[test]
    fn x10_mouse_press() {
        let mut dec = Decoder::new();
        // ESC [ M, cb=32 (press left), x=33 (col 1), y=34 (row 2)
        let events = dec.feed(b"\x1b[M !\"");
        let Event::Mouse(m) = &events[0] else {
            panic!("expected mouse");
        };
        assert_eq!(m.button, MouseButton::Left);
        assert_eq!(m.kind, MouseEventKind::Press);
        assert_eq!((m.x, m.y), (0, 1));
    }

    #[test]
    fn lone_escape_resolves_on_timeout() {
        let mut dec = Decoder::with_config(DecoderConfig {
            esc_timeout: Duration::from_millis(50),
            ..DecoderConfig::default()
        });
        let t0 = Instant::now();
        assert!(dec.feed_at(b"\x1b", t0).is_empty());
        // Not yet expired.
        assert!(dec.poll_timeout(t0 + Duration::from_millis(10)).is_empty());
        let events = dec.poll_timeout(t0 + Duration::from_millis(60));
        assert_eq!(keys(&events), vec![KeyCode::Escape]);
        // Decoder is usable afterwards.
        let events = dec.feed_at(b"q", t0 + Duration::from_millis(70));
        assert_eq!(keys(&events), vec![KeyCode::Text("q".into())]);
    }

    #[test]
    fn partial_csi_completes_across_feeds() {
        let mut dec = Decoder::new();
        assert!(dec.feed(b"\x1b[1;5").is_empty());
        let events = dec.feed(b"C");
        let Event::Key(k) = &events[0] else {
            panic!("expected key");
        };
        assert_eq!(k.code, KeyCode::Right);
        assert!(k.ctrl());
    }

    #[test]
    fn unknown_csi_becomes_raw() {
        let mut dec = Decoder::new();
        let events = dec.feed(b"\x1b[999q");
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::Raw(_)));
    }

    #[test]
    fn osc_surfaced_as_raw() {
        let mut dec = Decoder::new();
        let events = dec.feed(b"\x1b]0;title\x07");
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::Raw(_)));
    }

    #[test]
    fn osc_st_terminator() {
        let mut dec = Decoder::new();
        let events = dec.feed(b"\x1b]52;c;Zm9v\x1b\\");
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::Raw(_)));
    }

    #[test]
    fn no_bytes_dropped_on_invalid_utf8() {
        let mut dec = Decoder::new();
        let events = dec.feed(&[0xc3, 0x28]);
        // Lead byte + invalid continuation surface as raw.
        assert!(matches!(&events[0], Event::Raw(bytes) if bytes == &vec![0xc3, 0x28]));
    }
}
