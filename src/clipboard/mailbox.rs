//! Cross-Thread Mailbox
//!
//! Single-slot handoff between the event-loop thread (producer) and the
//! platform clipboard thread (consumer).
//!
//! ```text
//! Event loop                      Platform thread
//! ━━━━━━━━━━                      ━━━━━━━━━━━━━━━
//! on_guest_data_received()        render request
//!   └─> push(payload) ──────┐       └─> pop_timeout(10s)
//!                           └──────────> wakes, takes slot
//! ```
//!
//! A second push before a pop replaces the pending value (latest wins). The
//! slot is only ever touched under the mutex. [`Mailbox::close`] wakes every
//! waiter so session teardown does not have to wait out the deadline.

use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Default deadline for a blocked render
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
struct Slot<T> {
    value: Option<T>,
    closed: bool,
}

/// Single-slot, latest-wins, timed handoff
#[derive(Debug)]
pub struct Mailbox<T> {
    slot: Mutex<Slot<T>>,
    ready: Condvar,
}

impl<T> Mailbox<T> {
    /// Create an empty, open mailbox
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                value: None,
                closed: false,
            }),
            ready: Condvar::new(),
        }
    }

    /// Store `value`, replacing any pending one, and wake the waiter
    pub fn push(&self, value: T) {
        let mut slot = self.slot.lock();
        if slot.value.replace(value).is_some() {
            debug!("Mailbox: replacing unconsumed value");
        }
        self.ready.notify_one();
        trace!("Mailbox: value pushed");
    }

    /// Wait up to `timeout` for a value.
    ///
    /// Returns `None` on timeout or when the mailbox is closed. A timeout
    /// leaves the slot as it was. A timeout too large to represent as an
    /// `Instant` waits until a push or a close.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now().checked_add(timeout);
        let mut slot = self.slot.lock();
        loop {
            if let Some(value) = slot.value.take() {
                return Some(value);
            }
            if slot.closed {
                debug!("Mailbox: closed while waiting");
                return None;
            }
            let Some(deadline) = deadline else {
                self.ready.wait(&mut slot);
                continue;
            };
            if self.ready.wait_until(&mut slot, deadline).timed_out() {
                let value = slot.value.take();
                if value.is_none() {
                    debug!("Mailbox: timeout after {}ms", timeout.as_millis());
                }
                return value;
            }
        }
    }

    /// Take the pending value without blocking
    pub fn try_pop(&self) -> Option<T> {
        self.slot.lock().value.take()
    }

    /// Drop any pending value
    pub fn clear(&self) {
        if self.slot.lock().value.take().is_some() {
            debug!("Mailbox: discarded stale value");
        }
    }

    /// Whether a value is waiting
    pub fn has_pending(&self) -> bool {
        self.slot.lock().value.is_some()
    }

    /// Wake all waiters; until [`reopen`](Self::reopen), pops return at once
    pub fn close(&self) {
        let mut slot = self.slot.lock();
        slot.closed = true;
        self.ready.notify_all();
    }

    /// Re-arm a closed mailbox, dropping anything left in it
    pub fn reopen(&self) {
        let mut slot = self.slot.lock();
        slot.closed = false;
        slot.value = None;
    }

    /// Whether [`close`](Self::close) is in effect
    pub fn is_closed(&self) -> bool {
        self.slot.lock().closed
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}
