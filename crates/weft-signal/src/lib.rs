#![forbid(unsafe_code)]

//! Typed signal/slot runtime.
//!
//! A [`Signal<T>`] holds an ordered list of connected slots and invokes
//! them synchronously on [`Signal::emit`]. Slots run on the UI task;
//! none of these types are `Send`.
//!
//! # Contract
//!
//! - Slots run in registration order.
//! - Emission snapshots the slot list first, so connecting or
//!   disconnecting from inside a slot never affects the current
//!   emission.
//! - A panicking slot is caught, logged at ERROR, and does not stop the
//!   remaining slots.
//! - Connecting the same callable twice yields two invocations;
//!   [`Signal::disconnect`] removes exactly one registration.
//! - A slot may declare a narrower signature than the signal:
//!   [`Signal::connect_unit`] adapts a zero-argument callable by
//!   dropping the emitted arguments.
//!
//! # Example
//! ```
//! use weft_signal::Signal;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let clicked: Signal<i32> = Signal::new();
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = seen.clone();
//! clicked.connect(move |v| sink.borrow_mut().push(*v));
//! clicked.emit(&7);
//! assert_eq!(*seen.borrow(), vec![7]);
//! ```

use std::cell::RefCell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use tracing::error;

/// Identifies one slot registration on one signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

type Slot<T> = Rc<RefCell<dyn FnMut(&T)>>;

struct SlotEntry<T> {
    id: ConnectionId,
    slot: Slot<T>,
}

struct Inner<T> {
    slots: Vec<SlotEntry<T>>,
    next_id: u64,
}

impl<T> Default for Inner<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            next_id: 0,
        }
    }
}

/// A typed signal with multi-slot connect/disconnect and synchronous
/// emission.
pub struct Signal<T> {
    inner: RefCell<Inner<T>>,
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("slots", &self.connection_count())
            .finish()
    }
}

impl<T> Signal<T> {
    /// Create a signal with no connected slots.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RefCell::new(Inner::default()),
        }
    }

    /// Connect a slot; returns its connection id.
    pub fn connect(&self, slot: impl FnMut(&T) + 'static) -> ConnectionId {
        let mut inner = self.inner.borrow_mut();
        let id = ConnectionId(inner.next_id);
        inner.next_id += 1;
        inner.slots.push(SlotEntry {
            id,
            slot: Rc::new(RefCell::new(slot)),
        });
        id
    }

    /// Connect a zero-argument slot; emitted arguments are dropped.
    pub fn connect_unit(&self, mut slot: impl FnMut() + 'static) -> ConnectionId {
        self.connect(move |_| slot())
    }

    /// Remove exactly one registration. Returns `false` when the id is
    /// not connected.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        let mut inner = self.inner.borrow_mut();
        match inner.slots.iter().position(|e| e.id == id) {
            Some(pos) => {
                inner.slots.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Remove every registration.
    pub fn disconnect_all(&self) {
        self.inner.borrow_mut().slots.clear();
    }

    /// Number of connected slots.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.inner.borrow().slots.len()
    }

    /// Invoke each connected slot synchronously, in registration order.
    ///
    /// The slot list is snapshotted before the first invocation;
    /// panicking slots are isolated and logged.
    pub fn emit(&self, arg: &T) {
        let snapshot: Vec<Slot<T>> = self
            .inner
            .borrow()
            .slots
            .iter()
            .map(|e| e.slot.clone())
            .collect();
        for slot in snapshot {
            // A slot emitting this same signal recursively would hold the
            // RefCell borrow; surface that as a skipped slot, not a panic.
            let Ok(mut guard) = slot.try_borrow_mut() else {
                error!("slot skipped: already running (recursive emit)");
                continue;
            };
            let callable: &mut dyn FnMut(&T) = &mut *guard;
            let result = catch_unwind(AssertUnwindSafe(|| callable(arg)));
            if let Err(payload) = result {
                let msg = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_string());
                error!(panic = %msg, "slot panicked during emit");
            }
        }
    }
}

impl Signal<()> {
    /// Emit a unit signal.
    pub fn emit_unit(&self) {
        self.emit(&());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> (Rc<RefCell<Vec<i32>>>, Rc<RefCell<Vec<i32>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        (log.clone(), log)
    }

    #[test]
    fn slots_run_in_registration_order() {
        let sig: Signal<i32> = Signal::new();
        let (log, l1) = counter();
        let l2 = log.clone();
        sig.connect(move |v| l1.borrow_mut().push(*v * 10));
        sig.connect(move |v| l2.borrow_mut().push(*v * 100));
        sig.emit(&3);
        assert_eq!(*log.borrow(), vec![30, 300]);
    }

    #[test]
    fn same_slot_connected_twice_runs_twice() {
        let sig: Signal<()> = Signal::new();
        let (log, sink) = counter();
        let slot = move |_: &()| sink.borrow_mut().push(1);
        sig.connect(slot.clone());
        sig.connect(slot);
        sig.emit_unit();
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn disconnect_removes_exactly_one() {
        let sig: Signal<()> = Signal::new();
        let (log, s1) = counter();
        let s2 = log.clone();
        let id = sig.connect(move |_| s1.borrow_mut().push(1));
        sig.connect(move |_| s2.borrow_mut().push(2));
        assert!(sig.disconnect(id));
        assert!(!sig.disconnect(id));
        sig.emit_unit();
        assert_eq!(*log.borrow(), vec![2]);
    }

    #[test]
    fn disconnect_during_emit_is_safe() {
        let sig: Rc<Signal<()>> = Rc::new(Signal::new());
        let (log, s2_log) = counter();

        // First slot disconnects the second mid-emission; the snapshot
        // taken at emit start still runs it this time.
        let sig2 = sig.clone();
        let pending: Rc<RefCell<Option<ConnectionId>>> = Rc::new(RefCell::new(None));
        let pending2 = pending.clone();
        sig.connect(move |_| {
            if let Some(id) = pending2.borrow_mut().take() {
                sig2.disconnect(id);
            }
        });
        let id = sig.connect(move |_| s2_log.borrow_mut().push(2));
        *pending.borrow_mut() = Some(id);

        sig.emit_unit();
        assert_eq!(*log.borrow(), vec![2], "snapshot still ran this emission");
        sig.emit_unit();
        assert_eq!(log.borrow().len(), 1, "disconnected for later emissions");
    }

    #[test]
    fn panicking_slot_does_not_stop_others() {
        let sig: Signal<()> = Signal::new();
        let (log, sink) = counter();
        sig.connect(|_| panic!("boom"));
        sig.connect(move |_| sink.borrow_mut().push(1));
        sig.emit_unit();
        assert_eq!(*log.borrow(), vec![1]);
    }

    #[test]
    fn unit_adapter_drops_arguments() {
        let sig: Signal<(i32, i32)> = Signal::new();
        let (log, sink) = counter();
        sig.connect_unit(move || sink.borrow_mut().push(0));
        sig.emit(&(1, 2));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn connect_during_emit_runs_next_time() {
        let sig: Rc<Signal<()>> = Rc::new(Signal::new());
        let (log, sink) = counter();
        let sig2 = sig.clone();
        let added = Rc::new(RefCell::new(false));
        let added2 = added.clone();
        sig.connect(move |_| {
            if !*added2.borrow() {
                *added2.borrow_mut() = true;
                let sink = sink.clone();
                sig2.connect(move |_| sink.borrow_mut().push(9));
            }
        });
        sig.emit_unit();
        assert!(log.borrow().is_empty(), "new slot not in this snapshot");
        sig.emit_unit();
        assert_eq!(*log.borrow(), vec![9]);
    }
}
