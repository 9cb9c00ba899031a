//! Remote peers as seen by the local viewer.

use std::collections::{BTreeMap, HashSet};

use kurbo::{Point, Vec2};

use super::protocol::PeerState;
use crate::elements::{Element, ElementId, SerializableColor};

/// Cursor stays fully opaque for this long after it last moved.
pub const CURSOR_IDLE_MS: u64 = 3000;
/// Then fades over this long.
pub const CURSOR_FADE_MS: u64 = 2000;
/// Opacity an idle cursor settles at.
pub const CURSOR_IDLE_OPACITY: f64 = 0.2;

/// A remote collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerPresence {
    pub id: String,
    pub name: String,
    pub color: String,
    pub cursor: Option<Point>,
    pub selection: Vec<ElementId>,
    pub draft: Option<Element>,
    pub viewport: Option<(Vec2, f64)>,
    /// Last time the cursor moved.
    pub last_activity_ms: u64,
}

impl PeerPresence {
    fn from_state(state: PeerState, now_ms: u64) -> Self {
        let mut peer = Self {
            id: state.user.id.clone(),
            name: state.user.name.clone(),
            color: state.user.color.clone(),
            cursor: None,
            selection: Vec::new(),
            draft: None,
            viewport: None,
            last_activity_ms: now_ms,
        };
        peer.update(state, now_ms);
        peer
    }

    /// Merge a newer state. Activity only advances when the cursor moves.
    fn update(&mut self, state: PeerState, now_ms: u64) {
        self.name = state.user.name;
        self.color = state.user.color;
        let cursor = state.cursor.map(Point::from);
        if cursor.is_some() && cursor != self.cursor {
            self.last_activity_ms = now_ms;
        }
        self.cursor = cursor;
        self.selection = state.selection.unwrap_or_default();
        self.draft = state.draft_element;
        self.viewport = state.viewport.map(|v| (v.pan(), v.zoom));
    }

    /// Opacity for drawing this peer's cursor at `now_ms`.
    pub fn cursor_opacity(&self, now_ms: u64) -> f64 {
        let idle = now_ms.saturating_sub(self.last_activity_ms);
        if idle <= CURSOR_IDLE_MS {
            return 1.0;
        }
        let t = ((idle - CURSOR_IDLE_MS) as f64 / CURSOR_FADE_MS as f64).min(1.0);
        1.0 - t * (1.0 - CURSOR_IDLE_OPACITY)
    }

    pub fn color(&self) -> SerializableColor {
        SerializableColor::from_hex(&self.color).unwrap_or_else(SerializableColor::black)
    }
}

/// What happened to a peer when an event was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerChange {
    Joined(String),
    Updated(String),
    Left(String),
}

/// Known peers keyed by id.
#[derive(Debug, Clone)]
pub struct PeerRegistry {
    local_id: String,
    peers: BTreeMap<String, PeerPresence>,
}

impl PeerRegistry {
    pub fn new(local_id: impl Into<String>) -> Self {
        Self {
            local_id: local_id.into(),
            peers: BTreeMap::new(),
        }
    }

    /// Apply a peer's state. Echoes of our own state are ignored.
    pub fn apply(&mut self, state: PeerState, now_ms: u64) -> Option<PeerChange> {
        let id = state.user.id.clone();
        if id == self.local_id {
            return None;
        }
        match self.peers.get_mut(&id) {
            Some(peer) => {
                peer.update(state, now_ms);
                Some(PeerChange::Updated(id))
            }
            None => {
                log::info!("Peer joined: {} ({})", state.user.name, id);
                self.peers.insert(id.clone(), PeerPresence::from_state(state, now_ms));
                Some(PeerChange::Joined(id))
            }
        }
    }

    pub fn remove(&mut self, peer_id: &str) -> Option<PeerChange> {
        let peer = self.peers.remove(peer_id)?;
        log::info!("Peer left: {} ({})", peer.name, peer.id);
        Some(PeerChange::Left(peer.id))
    }

    pub fn clear(&mut self) -> Vec<PeerChange> {
        std::mem::take(&mut self.peers)
            .into_keys()
            .map(PeerChange::Left)
            .collect()
    }

    /// Every element id in some remote peer's selection.
    pub fn locked_ids(&self) -> HashSet<ElementId> {
        self.peers
            .values()
            .flat_map(|p| p.selection.iter().cloned())
            .collect()
    }

    pub fn is_locked(&self, id: &str) -> bool {
        self.peers.values().any(|p| p.selection.iter().any(|s| s == id))
    }

    /// The peer holding `id`, if any.
    pub fn locked_by(&self, id: &str) -> Option<&PeerPresence> {
        self.peers.values().find(|p| p.selection.iter().any(|s| s == id))
    }

    pub fn get(&self, peer_id: &str) -> Option<&PeerPresence> {
        self.peers.get(peer_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeerPresence> {
        self.peers.values()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Cursors worth drawing with their opacity.
    pub fn visible_cursors(&self, now_ms: u64) -> Vec<(&PeerPresence, Point, f64)> {
        self.peers
            .values()
            .filter_map(|p| p.cursor.map(|c| (p, c, p.cursor_opacity(now_ms))))
            .collect()
    }

    /// Draft elements peers are currently drawing.
    pub fn drafts(&self) -> impl Iterator<Item = (&PeerPresence, &Element)> {
        self.peers
            .values()
            .filter_map(|p| p.draft.as_ref().map(|d| (p, d)))
    }
}
