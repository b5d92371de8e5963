#![forbid(unsafe_code)]

//! The application driver.
//!
//! [`App`] owns the widget arena, the coordinator context, the timer
//! registry, and the terminal. [`App::run`] enters the cooperative
//! loop; everything else (tests included) can drive the same paths
//! through [`App::process_event`] and [`App::repaint`].

use std::io::{self, Stdout};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use tracing::{debug, error};

use weft_canvas::{Canvas, CanvasDiff, Presenter};
use weft_core::decoder::{Decoder, DecoderConfig};
use weft_core::event::Event;
use weft_core::geometry::{Rect, Size};
#[cfg(not(target_arch = "wasm32"))]
use weft_core::terminal::{self, InputChunk, SessionOptions, TerminalSession};
use weft_widgets::{dispatch_event, Container, Context, Widget, WidgetArena};

use crate::timer::Timers;

/// Target repaint cadence: at most one pass per tick.
const FRAME_TICK: Duration = Duration::from_micros(1_000_000 / 65);

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Window title (prefixed by `TERMINAL_TITLE` when set).
    pub title: Option<String>,
    /// Report plain mouse motion (hover tracking).
    pub mouse_motion: bool,
    /// Lone-escape resolution timeout.
    pub esc_timeout: Duration,
    /// Double/triple click detection window.
    pub tap_window: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        let decoder = DecoderConfig::default();
        Self {
            title: None,
            mouse_motion: false,
            esc_timeout: decoder.esc_timeout,
            tap_window: decoder.tap_window,
        }
    }
}

/// A closure executed on the UI task.
type Deferred = Box<dyn FnOnce(&mut WidgetArena, &mut Context) + Send>;

/// Cross-thread handle for posting work back to the UI task.
///
/// Auxiliary threads wrap their results in a closure; the closure runs
/// during step 4 of the next loop iteration, so slot invocations stay
/// on the UI task.
#[derive(Clone)]
pub struct Poster {
    tx: Sender<Deferred>,
}

impl Poster {
    /// Post a closure to the UI task.
    ///
    /// Returns `false` when the loop has already exited.
    pub fn post(&self, f: impl FnOnce(&mut WidgetArena, &mut Context) + Send + 'static) -> bool {
        self.tx.send(Box::new(f)).is_ok()
    }
}

/// The application: widget tree, context, timers, and the loop.
pub struct App {
    arena: WidgetArena,
    context: Context,
    timers: Timers,
    config: RunConfig,
    decoder: Decoder,
    screen: Canvas,
    previous: Canvas,
    deferred_tx: Sender<Deferred>,
    deferred_rx: Receiver<Deferred>,
    last_frame: Instant,
}

impl App {
    /// Create an app with a [`Container`] root at the given size.
    #[must_use]
    pub fn new(size: Size, config: RunConfig) -> Self {
        Self::with_root(Box::new(Container::new()), size, config)
    }

    /// Create an app with an explicit root behavior.
    #[must_use]
    pub fn with_root(root: Box<dyn Widget>, size: Size, config: RunConfig) -> Self {
        let decoder = Decoder::with_config(DecoderConfig {
            esc_timeout: config.esc_timeout,
            tap_window: config.tap_window,
        });
        let (deferred_tx, deferred_rx) = mpsc::channel();
        Self {
            arena: WidgetArena::new(root, size),
            context: Context::new(),
            timers: Timers::new(),
            config,
            decoder,
            screen: Canvas::new(size.width, size.height),
            previous: Canvas::new(size.width, size.height),
            deferred_tx,
            deferred_rx,
            last_frame: Instant::now() - FRAME_TICK,
        }
    }

    /// The widget arena.
    pub fn arena_mut(&mut self) -> &mut WidgetArena {
        &mut self.arena
    }

    /// The coordinator context.
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    /// The timer registry.
    pub fn timers_mut(&mut self) -> &mut Timers {
        &mut self.timers
    }

    /// A handle for auxiliary threads to post work back.
    #[must_use]
    pub fn poster(&self) -> Poster {
        Poster {
            tx: self.deferred_tx.clone(),
        }
    }

    /// Deliver one event through the dispatcher.
    ///
    /// Resize events reshape the root and screen canvases; raw events
    /// are traced and dropped from routing.
    pub fn process_event(&mut self, event: &Event) {
        match event {
            Event::Resize { cols, rows } => {
                self.resize(Size::new(*cols, *rows));
            }
            Event::Raw(bytes) => {
                debug!(len = bytes.len(), "raw event dropped from routing");
            }
            _ => {
                dispatch_event(&mut self.arena, &mut self.context, event);
            }
        }
    }

    fn resize(&mut self, size: Size) {
        self.arena
            .set_geometry(self.arena.root(), Rect::from_size(size));
        self.arena.relayout(self.arena.root());
        self.screen.resize(size.width, size.height);
        self.previous.resize(size.width, size.height);
        // Everything repaints after a resize.
        let mut ids = Vec::new();
        self.arena.walk_preorder(self.arena.root(), &mut |id| ids.push(id));
        for id in ids {
            self.context.mark_dirty(id);
        }
    }

    /// Run one repaint pass: paint dirty widgets bottom-up, composite,
    /// diff against the previous frame, and hand the runs to `emit`.
    pub fn repaint(&mut self, emit: impl FnOnce(&CanvasDiff) -> io::Result<()>) -> io::Result<()> {
        self.context.prune(&self.arena);
        for id in self.context.take_dirty() {
            self.arena.paint_widget(id);
        }
        self.screen.clean();
        self.arena.compose(&mut self.screen);
        let diff = CanvasDiff::compute(&self.previous, &self.screen);
        if !diff.is_empty() {
            emit(&diff)?;
            std::mem::swap(&mut self.previous, &mut self.screen);
        }
        self.last_frame = Instant::now();
        Ok(())
    }

    /// Drain deferred closures posted from auxiliary threads.
    fn run_deferred(&mut self) -> usize {
        let mut count = 0;
        while let Ok(f) = self.deferred_rx.try_recv() {
            f(&mut self.arena, &mut self.context);
            count += 1;
        }
        count
    }

    /// Enter the terminal loop. Returns when a quit is requested or
    /// the terminal write path fails.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn run(mut self) -> io::Result<()> {
        let session = TerminalSession::new(SessionOptions {
            mouse_motion: self.config.mouse_motion,
            title: self.config.title.clone(),
            ..SessionOptions::default()
        })?;
        let (cols, rows) = session.size()?;
        self.resize(Size::new(cols, rows));

        let (input_tx, input_rx) = mpsc::channel();
        let _stdin_thread = terminal::spawn_stdin_reader(input_tx.clone());
        #[cfg(unix)]
        let _winch_thread = terminal::spawn_resize_listener(input_tx.clone())?;

        let mut presenter = Presenter::new(io::stdout());
        self.arena.paint_all();
        self.screen.clean();
        self.arena.compose(&mut self.screen);
        presenter.present_full(&self.screen)?;
        std::mem::swap(&mut self.previous, &mut self.screen);

        let result = self.event_loop(&input_rx, &mut presenter);
        // The session guard restores the terminal on every exit path.
        drop(session);
        result
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn event_loop(
        &mut self,
        input_rx: &Receiver<InputChunk>,
        presenter: &mut Presenter<Stdout>,
    ) -> io::Result<()> {
        loop {
            let now = Instant::now();
            let mut deadline = now + Duration::from_millis(250);
            if self.context.has_dirty() {
                deadline = deadline.min(self.last_frame + FRAME_TICK);
            }
            if let Some(t) = self.decoder.pending_deadline() {
                deadline = deadline.min(t);
            }
            if let Some(t) = self.timers.next_deadline() {
                deadline = deadline.min(t);
            }

            // (i) collect one burst of input.
            let timeout = deadline.saturating_duration_since(now);
            let mut events = Vec::new();
            match input_rx.recv_timeout(timeout) {
                Ok(chunk) => {
                    if matches!(chunk, InputChunk::Closed) {
                        debug!("input channel closed");
                        return Ok(());
                    }
                    events.extend(terminal::decode_chunk(&mut self.decoder, &chunk));
                    while let Ok(chunk) = input_rx.try_recv() {
                        if matches!(chunk, InputChunk::Closed) {
                            break;
                        }
                        events.extend(terminal::decode_chunk(&mut self.decoder, &chunk));
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Ok(()),
            }
            events.extend(self.decoder.poll_timeout(Instant::now()));

            // (ii) deliver in arrival order.
            for event in &events {
                self.process_event(event);
            }

            // (iii) expired timers.
            self.timers.run_expired(Instant::now());

            // (iv) deferred slot deliveries from auxiliary tasks.
            self.run_deferred();

            if self.context.quit_requested() {
                return Ok(());
            }

            // (v) repaint, at most once per frame tick.
            if self.context.has_dirty() && self.last_frame.elapsed() >= FRAME_TICK {
                if let Err(err) = self.repaint(|diff| presenter.present(diff)) {
                    error!(?err, "terminal write failed; shutting down");
                    return Err(err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::event::{KeyCode, KeyEvent};
    use weft_widgets::{FocusPolicy, Label};

    fn app() -> App {
        App::new(Size::new(20, 5), RunConfig::default())
    }

    #[test]
    fn resize_reshapes_root_and_screen() {
        let mut app = app();
        app.process_event(&Event::Resize { cols: 30, rows: 8 });
        let root = app.arena.root();
        assert_eq!(app.arena.core(root).unwrap().size(), Size::new(30, 8));
        assert!(app.context.has_dirty());
    }

    #[test]
    fn repaint_clears_dirty_and_diffs() {
        let mut app = app();
        let root = app.arena.root();
        let label = app.arena.insert_child(root, Box::new(Label::new("hi")));
        app.arena
            .set_geometry(label, Rect::new(0, 0, 2, 1));
        app.context.mark_dirty(label);

        let mut runs = 0;
        app.repaint(|diff| {
            runs = diff.runs().len();
            Ok(())
        })
        .unwrap();
        assert!(runs > 0);
        assert!(!app.context.has_dirty());

        // A second repaint with no changes emits nothing.
        let mut called = false;
        app.repaint(|_| {
            called = true;
            Ok(())
        })
        .unwrap();
        assert!(!called);
    }

    #[test]
    fn tab_event_moves_focus() {
        let mut app = app();
        let root = app.arena.root();
        let a = app.arena.insert_child(root, Box::new(Label::new("a")));
        app.arena
            .core_mut(a)
            .unwrap()
            .set_focus_policy(FocusPolicy::TAB);
        let b = app.arena.insert_child(root, Box::new(Label::new("b")));
        app.arena
            .core_mut(b)
            .unwrap()
            .set_focus_policy(FocusPolicy::TAB);

        app.process_event(&Event::Key(KeyEvent::new(KeyCode::Tab)));
        assert_eq!(app.context.focused(), Some(a));
        app.process_event(&Event::Key(KeyEvent::new(KeyCode::Tab)));
        assert_eq!(app.context.focused(), Some(b));
    }

    #[test]
    fn poster_runs_on_ui_step() {
        let mut app = app();
        let poster = app.poster();
        let handle = std::thread::spawn(move || {
            poster.post(|_arena, ctx| ctx.request_quit());
        });
        handle.join().unwrap();
        assert_eq!(app.run_deferred(), 1);
        assert!(app.context.quit_requested());
    }
}
