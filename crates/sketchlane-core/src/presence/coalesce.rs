//! Last-value-wins coalescing of outbound presence updates.

use std::cell::Cell;
use std::rc::Rc;

/// Asks the host for a callback on its next render or scheduling tick.
///
/// The host answers by calling `PresenceManager::flush`.
pub trait TickScheduler {
    fn request_tick(&self);
}

/// Scheduler that only records that a tick was requested.
///
/// Hosts without their own frame loop poll [`FlagScheduler::take`] and flush
/// when it returns `true`.
#[derive(Debug, Clone, Default)]
pub struct FlagScheduler {
    requested: Rc<Cell<bool>>,
    requests: Rc<Cell<usize>>,
}

impl FlagScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear and return the pending request.
    pub fn take(&self) -> bool {
        self.requested.replace(false)
    }

    pub fn is_requested(&self) -> bool {
        self.requested.get()
    }

    /// How many ticks have been requested in total.
    pub fn request_count(&self) -> usize {
        self.requests.get()
    }
}

impl TickScheduler for FlagScheduler {
    fn request_tick(&self) {
        self.requested.set(true);
        self.requests.set(self.requests.get() + 1);
    }
}

/// A pending outbound value. Newer values overwrite older ones until taken.
#[derive(Debug, Clone)]
pub struct Coalesced<T> {
    pending: Option<T>,
}

impl<T> Default for Coalesced<T> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<T> Coalesced<T> {
    /// Store `value`; returns `true` if nothing was pending before.
    pub fn set(&mut self, value: T) -> bool {
        self.pending.replace(value).is_none()
    }

    pub fn take(&mut self) -> Option<T> {
        self.pending.take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn peek(&self) -> Option<&T> {
        self.pending.as_ref()
    }
}
