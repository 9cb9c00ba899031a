//! Live presence: cursors, selections, drafts and viewports of other users.

pub mod coalesce;
pub mod manager;
pub mod peers;
pub mod protocol;
pub mod transport;

pub use coalesce::{Coalesced, FlagScheduler, TickScheduler};
pub use manager::PresenceManager;
pub use peers::{PeerChange, PeerPresence, PeerRegistry};
pub use protocol::{PeerState, PresenceEvent, PresenceMessage, UserInfo};
pub use transport::{
    MemoryHub, MemoryTransport, OfflineTransport, PresenceCallback, PresenceTransport,
    Subscription,
};
