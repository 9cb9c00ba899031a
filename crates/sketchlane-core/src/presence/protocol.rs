//! Presence wire protocol.
//!
//! Messages are JSON with a `type` tag so transports that relay text (such as
//! a WebSocket room) can forward them unchanged.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

use crate::elements::{Element, ElementId};
use crate::error::{PresenceError, PresenceResult};

/// Identity of a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    pub color: String,
}

impl UserInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: color.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CursorPosition {
    pub x: f64,
    pub y: f64,
}

impl From<Point> for CursorPosition {
    fn from(p: Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<CursorPosition> for Point {
    fn from(c: CursorPosition) -> Self {
        Point::new(c.x, c.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    pub pan: CursorPosition,
    pub zoom: f64,
}

impl ViewportState {
    pub fn new(pan: Vec2, zoom: f64) -> Self {
        Self {
            pan: CursorPosition { x: pan.x, y: pan.y },
            zoom,
        }
    }

    pub fn pan(&self) -> Vec2 {
        Vec2::new(self.pan.x, self.pan.y)
    }
}

/// Everything one peer currently shares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerState {
    pub user: UserInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<CursorPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<Vec<ElementId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft_element: Option<Element>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<ViewportState>,
}

impl PeerState {
    pub fn new(user: UserInfo) -> Self {
        Self {
            user,
            cursor: None,
            selection: None,
            draft_element: None,
            viewport: None,
        }
    }
}

/// Messages relayed between peers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PresenceMessage {
    /// Latest state of one peer.
    State {
        #[serde(flatten)]
        state: PeerState,
    },
    /// A peer disconnected.
    Left { peer_id: String },
}

/// What a transport delivers to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum PresenceEvent {
    State(PeerState),
    Left { peer_id: String },
    /// The subscription is gone; no further events will arrive.
    SubscriptionLost { reason: String },
}

impl From<PresenceMessage> for PresenceEvent {
    fn from(msg: PresenceMessage) -> Self {
        match msg {
            PresenceMessage::State { state } => PresenceEvent::State(state),
            PresenceMessage::Left { peer_id } => PresenceEvent::Left { peer_id },
        }
    }
}

pub fn encode(message: &PresenceMessage) -> PresenceResult<String> {
    serde_json::to_string(message).map_err(|e| PresenceError::Encode(e.to_string()))
}

pub fn decode(text: &str) -> PresenceResult<PresenceMessage> {
    serde_json::from_str(text).map_err(|e| PresenceError::Decode(e.to_string()))
}
