#![forbid(unsafe_code)]

//! The Weft driver loop.
//!
//! The UI runs on a single cooperative task. One loop iteration:
//!
//! 1. decode input bytes into a burst of events
//! 2. deliver the burst in arrival order
//! 3. run expired timers
//! 4. run deferred closures posted from auxiliary threads
//! 5. repaint if any widget is dirty, at most once per frame tick
//!
//! Auxiliary threads never touch widgets: they post closures through a
//! [`Poster`], and the closures run on the UI task in step 4.

pub mod app;
pub mod timer;

pub use app::{App, Poster, RunConfig};
pub use timer::Timers;
