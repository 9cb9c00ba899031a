//! Presence transports.
//!
//! The real transport (a relay room, a replication provider's awareness
//! channel) lives outside this crate and implements [`PresenceTransport`].
//! [`OfflineTransport`] is used when there is nobody to talk to, and
//! [`MemoryHub`] connects several editors inside one process.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use kurbo::{Point, Vec2};

use super::protocol::{
    self, PeerState, PresenceEvent, PresenceMessage, UserInfo, ViewportState,
};
use crate::elements::{Element, ElementId};
use crate::error::{PresenceError, PresenceResult};

/// Receives presence events.
pub type PresenceCallback = Box<dyn FnMut(PresenceEvent)>;

/// Handle returned by `subscribe`. Dropping it unsubscribes.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to cancel.
    pub fn detached() -> Self {
        Self { cancel: None }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// The presence collaborator.
pub trait PresenceTransport {
    fn local_user(&self) -> UserInfo;

    fn subscribe(&mut self, callback: PresenceCallback) -> Subscription;

    /// `None` hides the cursor (pointer left the canvas).
    fn publish_cursor(&mut self, cursor: Option<Point>) -> PresenceResult<()>;

    fn publish_selection(&mut self, ids: &[ElementId]) -> PresenceResult<()>;

    fn publish_draft_element(&mut self, element: Option<&Element>) -> PresenceResult<()>;

    fn publish_viewport(&mut self, pan: Vec2, zoom: f64) -> PresenceResult<()>;
}

/// Transport for a canvas with no collaborators.
#[derive(Debug, Clone)]
pub struct OfflineTransport {
    user: UserInfo,
}

impl OfflineTransport {
    pub fn new(user: UserInfo) -> Self {
        Self { user }
    }
}

impl Default for OfflineTransport {
    fn default() -> Self {
        Self::new(UserInfo::new(
            crate::elements::new_element_id(),
            "Me",
            "#1e88e5",
        ))
    }
}

impl PresenceTransport for OfflineTransport {
    fn local_user(&self) -> UserInfo {
        self.user.clone()
    }

    fn subscribe(&mut self, _callback: PresenceCallback) -> Subscription {
        Subscription::detached()
    }

    fn publish_cursor(&mut self, _cursor: Option<Point>) -> PresenceResult<()> {
        Ok(())
    }

    fn publish_selection(&mut self, _ids: &[ElementId]) -> PresenceResult<()> {
        Ok(())
    }

    fn publish_draft_element(&mut self, _element: Option<&Element>) -> PresenceResult<()> {
        Ok(())
    }

    fn publish_viewport(&mut self, _pan: Vec2, _zoom: f64) -> PresenceResult<()> {
        Ok(())
    }
}

struct Subscriber {
    id: u64,
    peer_id: String,
    callback: PresenceCallback,
}

#[derive(Default)]
struct HubInner {
    subscribers: Vec<Subscriber>,
    next_id: u64,
    failing: bool,
    sent: usize,
}

impl HubInner {
    /// Deliver an encoded message to everyone except `from`.
    fn broadcast(&mut self, from: &str, text: &str) {
        let message = match protocol::decode(text) {
            Ok(message) => message,
            Err(err) => {
                log::warn!("Dropping malformed presence message: {err}");
                return;
            }
        };
        self.sent += 1;
        for sub in self.subscribers.iter_mut().filter(|s| s.peer_id != from) {
            (sub.callback)(PresenceEvent::from(message.clone()));
        }
    }
}

/// In-process presence relay. Messages go through the JSON wire codec.
#[derive(Clone, Default)]
pub struct MemoryHub {
    inner: Rc<RefCell<HubInner>>,
}

impl MemoryHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the hub as `user`.
    pub fn connect(&self, user: UserInfo) -> MemoryTransport {
        MemoryTransport {
            hub: Rc::downgrade(&self.inner),
            state: PeerState::new(user),
        }
    }

    /// Drop a peer: its subscriptions are told they were lost and everyone
    /// else hears that it left.
    pub fn disconnect(&self, peer_id: &str) {
        let message = PresenceMessage::Left {
            peer_id: peer_id.to_string(),
        };
        let mut inner = self.inner.borrow_mut();
        let (mut dropped, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut inner.subscribers)
            .into_iter()
            .partition(|s| s.peer_id == peer_id);
        inner.subscribers = kept;
        for sub in &mut dropped {
            (sub.callback)(PresenceEvent::SubscriptionLost {
                reason: "disconnected from hub".to_string(),
            });
        }
        match protocol::encode(&message) {
            Ok(text) => inner.broadcast(peer_id, &text),
            Err(err) => log::warn!("Failed to encode leave message: {err}"),
        }
    }

    /// Make every publish fail, to exercise transport errors.
    pub fn set_failing(&self, failing: bool) {
        self.inner.borrow_mut().failing = failing;
    }

    /// Number of messages relayed so far.
    pub fn sent(&self) -> usize {
        self.inner.borrow().sent
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }
}

/// One peer's connection to a [`MemoryHub`].
pub struct MemoryTransport {
    hub: Weak<RefCell<HubInner>>,
    state: PeerState,
}

impl MemoryTransport {
    fn send(&mut self) -> PresenceResult<()> {
        let hub = self.hub.upgrade().ok_or(PresenceError::Closed)?;
        let mut inner = hub.borrow_mut();
        if inner.failing {
            return Err(PresenceError::Transport("hub unavailable".to_string()));
        }
        let text = protocol::encode(&PresenceMessage::State {
            state: self.state.clone(),
        })?;
        inner.broadcast(&self.state.user.id, &text);
        Ok(())
    }
}

impl PresenceTransport for MemoryTransport {
    fn local_user(&self) -> UserInfo {
        self.state.user.clone()
    }

    fn subscribe(&mut self, callback: PresenceCallback) -> Subscription {
        let Some(hub) = self.hub.upgrade() else {
            return Subscription::detached();
        };
        let id = {
            let mut inner = hub.borrow_mut();
            inner.next_id += 1;
            let id = inner.next_id;
            inner.subscribers.push(Subscriber {
                id,
                peer_id: self.state.user.id.clone(),
                callback,
            });
            id
        };
        let weak = Rc::downgrade(&hub);
        Subscription::new(move || {
            if let Some(hub) = weak.upgrade() {
                if let Ok(mut inner) = hub.try_borrow_mut() {
                    inner.subscribers.retain(|s| s.id != id);
                }
            }
        })
    }

    fn publish_cursor(&mut self, cursor: Option<Point>) -> PresenceResult<()> {
        self.state.cursor = cursor.map(Into::into);
        self.send()
    }

    fn publish_selection(&mut self, ids: &[ElementId]) -> PresenceResult<()> {
        self.state.selection = Some(ids.to_vec());
        self.send()
    }

    fn publish_draft_element(&mut self, element: Option<&Element>) -> PresenceResult<()> {
        self.state.draft_element = element.cloned();
        self.send()
    }

    fn publish_viewport(&mut self, pan: Vec2, zoom: f64) -> PresenceResult<()> {
        self.state.viewport = Some(ViewportState::new(pan, zoom));
        self.send()
    }
}
