//! Local presence policy on top of a [`PresenceTransport`].
//!
//! Outbound values are coalesced: each setter only records the latest value
//! and asks the scheduler for a tick, and [`PresenceManager::flush`] sends at
//! most one publish per channel. Inbound events are queued by the
//! subscription callback and folded into the peer registry by
//! [`PresenceManager::poll`].

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

use kurbo::{Point, Vec2};

use super::coalesce::{Coalesced, TickScheduler};
use super::peers::{PeerChange, PeerPresence, PeerRegistry};
use super::protocol::{PresenceEvent, UserInfo};
use super::transport::{OfflineTransport, PresenceTransport, Subscription};
use crate::elements::{Element, ElementId};
use crate::error::PresenceResult;

type Inbox = Rc<RefCell<VecDeque<PresenceEvent>>>;

pub struct PresenceManager {
    transport: Box<dyn PresenceTransport>,
    local_user: UserInfo,
    inbox: Inbox,
    subscription: Option<Subscription>,
    peers: PeerRegistry,
    cursor: Coalesced<Option<Point>>,
    selection: Coalesced<Vec<ElementId>>,
    draft: Coalesced<Option<Element>>,
    viewport: Coalesced<(Vec2, f64)>,
    scheduler: Option<Box<dyn TickScheduler>>,
    tick_requested: bool,
    failures: usize,
}

impl PresenceManager {
    /// Wrap a transport and subscribe to it.
    pub fn new(transport: Box<dyn PresenceTransport>) -> Self {
        let local_user = transport.local_user();
        let mut manager = Self {
            peers: PeerRegistry::new(local_user.id.clone()),
            transport,
            local_user,
            inbox: Rc::new(RefCell::new(VecDeque::new())),
            subscription: None,
            cursor: Coalesced::default(),
            selection: Coalesced::default(),
            draft: Coalesced::default(),
            viewport: Coalesced::default(),
            scheduler: None,
            tick_requested: false,
            failures: 0,
        };
        manager.resubscribe();
        manager
    }

    /// A manager with nobody on the other end.
    pub fn offline() -> Self {
        Self::new(Box::new(OfflineTransport::default()))
    }

    pub fn with_scheduler(mut self, scheduler: Box<dyn TickScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn set_scheduler(&mut self, scheduler: Box<dyn TickScheduler>) {
        self.scheduler = Some(scheduler);
    }

    pub fn local_user(&self) -> &UserInfo {
        &self.local_user
    }

    /// Drop the current subscription (if any) and subscribe again.
    pub fn resubscribe(&mut self) {
        self.subscription = None;
        let inbox = Rc::clone(&self.inbox);
        self.subscription = Some(
            self.transport
                .subscribe(Box::new(move |event| inbox.borrow_mut().push_back(event))),
        );
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn publish_cursor(&mut self, cursor: Option<Point>) {
        self.cursor.set(cursor);
        self.schedule();
    }

    pub fn publish_selection(&mut self, ids: &[ElementId]) {
        self.selection.set(ids.to_vec());
        self.schedule();
    }

    pub fn publish_draft(&mut self, element: Option<&Element>) {
        self.draft.set(element.cloned());
        self.schedule();
    }

    pub fn publish_viewport(&mut self, pan: Vec2, zoom: f64) {
        self.viewport.set((pan, zoom));
        self.schedule();
    }

    fn schedule(&mut self) {
        if self.tick_requested {
            return;
        }
        self.tick_requested = true;
        if let Some(scheduler) = &self.scheduler {
            scheduler.request_tick();
        }
    }

    pub fn has_pending(&self) -> bool {
        self.cursor.is_pending()
            || self.selection.is_pending()
            || self.draft.is_pending()
            || self.viewport.is_pending()
    }

    /// The draft element waiting to go out, if any.
    pub fn pending_draft(&self) -> Option<&Option<Element>> {
        self.draft.peek()
    }

    /// Send everything pending. Returns how many publishes succeeded.
    ///
    /// Failures are logged and dropped; the next value supersedes them.
    pub fn flush(&mut self) -> usize {
        self.tick_requested = false;
        let mut sent = 0;
        if let Some(cursor) = self.cursor.take() {
            let result = self.transport.publish_cursor(cursor);
            sent += self.record("cursor", result);
        }
        if let Some(ids) = self.selection.take() {
            let result = self.transport.publish_selection(&ids);
            sent += self.record("selection", result);
        }
        if let Some(draft) = self.draft.take() {
            let result = self.transport.publish_draft_element(draft.as_ref());
            sent += self.record("draft element", result);
        }
        if let Some((pan, zoom)) = self.viewport.take() {
            let result = self.transport.publish_viewport(pan, zoom);
            sent += self.record("viewport", result);
        }
        if sent > 0 {
            log::debug!("Flushed {sent} presence update(s)");
        }
        sent
    }

    fn record(&mut self, channel: &str, result: PresenceResult<()>) -> usize {
        match result {
            Ok(()) => 1,
            Err(err) => {
                self.failures += 1;
                log::warn!("Failed to publish {channel}: {err}");
                0
            }
        }
    }

    /// Publishes that failed since creation.
    pub fn failure_count(&self) -> usize {
        self.failures
    }

    /// Fold queued inbound events into the peer registry.
    pub fn poll(&mut self, now_ms: u64) -> Vec<PeerChange> {
        let events: Vec<PresenceEvent> = self.inbox.borrow_mut().drain(..).collect();
        let mut changes = Vec::new();
        for event in events {
            match event {
                PresenceEvent::State(state) => changes.extend(self.peers.apply(state, now_ms)),
                PresenceEvent::Left { peer_id } => changes.extend(self.peers.remove(&peer_id)),
                PresenceEvent::SubscriptionLost { reason } => {
                    log::error!("Presence subscription lost: {reason}");
                    self.subscription = None;
                    changes.extend(self.peers.clear());
                }
            }
        }
        changes
    }

    pub fn peers(&self) -> &PeerRegistry {
        &self.peers
    }

    pub fn peer(&self, peer_id: &str) -> Option<&PeerPresence> {
        self.peers.get(peer_id)
    }

    pub fn is_locked(&self, id: &str) -> bool {
        self.peers.is_locked(id)
    }

    pub fn locked_ids(&self) -> HashSet<ElementId> {
        self.peers.locked_ids()
    }
}

impl std::fmt::Debug for PresenceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceManager")
            .field("local_user", &self.local_user)
            .field("peers", &self.peers.len())
            .field("subscribed", &self.subscription.is_some())
            .field("tick_requested", &self.tick_requested)
            .finish()
    }
}
