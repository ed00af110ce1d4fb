//! Message handling and routing for client-server communication.
//!
//! This module provides the wire types, the outbound dispatch seam and the
//! hub that demultiplexes every inbound client package to the right place:
//! a running session for game actions, the matchmaking queue for menu
//! actions.

pub mod router;
pub mod sender;
pub mod types;

pub use router::MessageHub;
pub use sender::{DispatchError, MessageDispatcher, MessageSender};
pub use types::{
    Action, ClientPackage, Envelope, ErrorBody, InteractPayload, MovePayload, Player,
    ServerResponse,
};
