//! # Game Server - Real-Time Multiplayer Backend
//!
//! Authoritative backend for a session-based multiplayer game: players
//! connect over WebSockets, queue for matchmaking, get grouped into rooms
//! and play inside a simulated world advanced on a fixed tick.
//!
//! ## Architecture Overview
//!
//! ### Core Components
//!
//! * **ECS world** ([`ecs`]) - per-session entity store with typed
//!   component bags, safe under concurrent access from the tick loop and
//!   message handlers
//! * **Systems** ([`systems`]) - stateless per-tick transforms: movement
//!   integration, proximity interaction, combat/skill extension points
//! * **Session** ([`session`]) - one room's authoritative simulation: its
//!   own entity store, a tick loop and a message loop
//! * **Matchmaking** ([`matchmaking`]) - channel-driven FIFO queue that
//!   batches waiting players into fixed-size matches
//! * **Message hub** ([`messaging`]) - the single routing task
//!   demultiplexing every inbound client package to a session or to
//!   matchmaking
//! * **Connections** ([`connection`]) - connection/player bookkeeping and
//!   the bounded outbound channels all pushes flow through
//!
//! ### Message Flow
//!
//! 1. A connection's read pump decodes `{action, payload}` envelopes onto
//!    the hub's shared inbound channel
//! 2. The hub routes game actions to the session named in the payload and
//!    menu actions to the matchmaking queue
//! 3. Session handlers and systems mutate the ECS world
//! 4. Responses and state pushes travel back through the dispatcher seam
//!    to each connection's outbound channel and write pump
//!
//! ## Error Handling
//!
//! Client-visible failures are [`GameError`] values carrying stable wire
//! codes ([`ErrorCode`]); they are reported to the originating connection
//! and never take down a loop. Infrastructure failures are
//! [`ServerError`].
//!
//! ## Thread Safety
//!
//! Shared state is guarded by reader/writer locks scoped to the smallest
//! structure that needs them: the entity store's index, each entity's
//! component bag, the session's player map, the connection maps and the
//! session registry. There is no global lock; single-owner tasks
//! (matchmaking queue, hub) coordinate over channels instead.

// Re-export core types and functions for easy access
pub use config::{GameplayConfig, ServerConfig};
pub use error::{ErrorCode, GameError, ServerError};
pub use server::GameServer;

// Public module declarations
pub mod config;
pub mod connection;
pub mod ecs;
pub mod error;
pub mod matchmaking;
pub mod messaging;
pub mod serializer;
pub mod server;
pub mod session;
pub mod systems;

// Cross-module integration tests
#[cfg(test)]
mod tests;
