#![forbid(unsafe_code)]

//! Named timers with single-shot and repeating modes.
//!
//! Timers are cancellable by name. Cancelling a timer after its slot
//! has started does not interrupt the slot: emission is synchronous
//! and completes before the cancel can run.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use weft_signal::Signal;

struct TimerEntry {
    deadline: Instant,
    interval: Option<Duration>,
    timeout: Signal<()>,
}

/// The timer registry, driven by the event loop.
#[derive(Default)]
pub struct Timers {
    entries: HashMap<String, TimerEntry>,
}

impl Timers {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) a single-shot timer.
    ///
    /// Returns the timer's timeout signal for slot connections.
    pub fn start(&mut self, name: impl Into<String>, delay: Duration) -> &Signal<()> {
        self.start_at(name, Instant::now() + delay, None)
    }

    /// Start (or restart) a repeating timer.
    pub fn start_repeating(&mut self, name: impl Into<String>, interval: Duration) -> &Signal<()> {
        self.start_at(name, Instant::now() + interval, Some(interval))
    }

    fn start_at(
        &mut self,
        name: impl Into<String>,
        deadline: Instant,
        interval: Option<Duration>,
    ) -> &Signal<()> {
        let name = name.into();
        let entry = self.entries.entry(name).or_insert_with(|| TimerEntry {
            deadline,
            interval,
            timeout: Signal::new(),
        });
        entry.deadline = deadline;
        entry.interval = interval;
        &entry.timeout
    }

    /// The timeout signal of a running timer.
    #[must_use]
    pub fn timeout(&self, name: &str) -> Option<&Signal<()>> {
        self.entries.get(name).map(|e| &e.timeout)
    }

    /// Cancel a timer by name. Returns `false` when not running.
    pub fn cancel(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.values().map(|e| e.deadline).min()
    }

    /// Fire every expired timer; repeating timers reschedule, single
    /// shots are removed after their emission.
    pub fn run_expired(&mut self, now: Instant) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, e)| e.deadline <= now)
            .map(|(name, _)| name.clone())
            .collect();
        for name in &expired {
            // Reschedule before emitting so a slot cancelling the
            // timer wins over the reschedule.
            let repeating = match self.entries.get_mut(name) {
                Some(entry) => match entry.interval {
                    Some(interval) => {
                        entry.deadline = now + interval;
                        true
                    }
                    None => false,
                },
                None => continue,
            };
            if repeating {
                if let Some(entry) = self.entries.get(name) {
                    entry.timeout.emit_unit();
                }
            } else if let Some(entry) = self.entries.remove(name) {
                entry.timeout.emit_unit();
            }
        }
        expired.len()
    }
}
