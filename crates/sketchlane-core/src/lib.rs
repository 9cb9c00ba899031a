//! Sketchlane Core Library
//!
//! Platform-agnostic element model, interaction engine, connector routing and
//! live presence for the Sketchlane collaborative canvas.

pub mod connector;
pub mod elements;
pub mod error;
pub mod geometry;
pub mod host;
pub mod interaction;
pub mod options;
pub mod presence;
pub mod store;
pub mod viewport;

pub use elements::{
    ArrowHead, BoxProps, ConnectorProps, ConnectorStyle, ElbowRoute, Element, ElementId,
    ElementKind, ElementStyle, SerializableColor, TextProps,
};
pub use error::{CoreResult, OptionsError, PresenceError, PresenceResult};
pub use host::{SelectionListener, ViewportCommand, ViewportSetter};
pub use interaction::{Editor, InteractionState, Selection};
pub use interaction::input::{Key, Modifiers, MouseButton, WheelEvent};
pub use interaction::tools::Tool;
pub use options::CanvasOptions;
pub use presence::{
    MemoryHub, PeerPresence, PresenceManager, PresenceTransport, Subscription, UserInfo,
};
pub use store::{Document, ElementPatch, ElementSink, StoreOp};
pub use viewport::Viewport;

/// Current wall-clock time in milliseconds since the Unix epoch.
///
/// The engine itself only ever takes `now_ms` arguments; hosts use this to
/// feed them.
pub fn now_ms() -> u64 {
    #[cfg(target_arch = "wasm32")]
    use web_time::{SystemTime, UNIX_EPOCH};
    #[cfg(not(target_arch = "wasm32"))]
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
