//! Wire message types for client-server communication.
//!
//! Every client message is a JSON envelope `{"action", "payload"}`; every
//! server message is a [`ServerResponse`] echoing an action tag, carrying
//! either a payload (`success: true`) or a coded error. Payload shapes for
//! the in-game actions are typed structs deserialized out of the envelope's
//! raw JSON value.

use crate::connection::ConnectionId;
use crate::error::{ErrorCode, GameError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A connected (or matchmaking) player's identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: Uuid,
    pub username: String,
}

/// Action tags recognized on the wire.
///
/// Menu actions are handled by the hub itself; game actions are routed into
/// a session by the `session_id` embedded in the payload. The remaining
/// variants are server-to-client pushes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    // menu actions
    FindGame,
    LeaveQueue,

    // active game actions
    Move,
    Interact,
    Attack,
    Pickup,
    UseItem,
    DropItem,
    Chat,

    // server pushes
    GameFound,
    QueueStatus,
    GameState,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::FindGame => "find_game",
            Action::LeaveQueue => "leave_queue",
            Action::Move => "move",
            Action::Interact => "interact",
            Action::Attack => "attack",
            Action::Pickup => "pickup",
            Action::UseItem => "use_item",
            Action::DropItem => "drop_item",
            Action::Chat => "chat",
            Action::GameFound => "game_found",
            Action::QueueStatus => "queue_status",
            Action::GameState => "game_state",
        }
    }

    /// Parses a client-supplied tag. Unknown tags yield `None` so the hub
    /// can answer with an `invalid_payload` error instead of choking on
    /// arbitrary input.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "find_game" => Some(Action::FindGame),
            "leave_queue" => Some(Action::LeaveQueue),
            "move" => Some(Action::Move),
            "interact" => Some(Action::Interact),
            "attack" => Some(Action::Attack),
            "pickup" => Some(Action::Pickup),
            "use_item" => Some(Action::UseItem),
            "drop_item" => Some(Action::DropItem),
            "chat" => Some(Action::Chat),
            "game_found" => Some(Action::GameFound),
            "queue_status" => Some(Action::QueueStatus),
            "game_state" => Some(Action::GameState),
            _ => None,
        }
    }

    /// True for actions that belong to a running game session and must be
    /// routed by the `session_id` in their payload.
    pub fn is_game_action(&self) -> bool {
        matches!(
            self,
            Action::Move
                | Action::Interact
                | Action::Attack
                | Action::Pickup
                | Action::UseItem
                | Action::DropItem
                | Action::Chat
        )
    }
}

/// The raw inbound message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub action: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Envelope {
    pub fn new(action: Action, payload: serde_json::Value) -> Self {
        Self {
            action: action.as_str().to_string(),
            payload,
        }
    }

    /// Extracts and validates the `session_id` field of the payload.
    pub fn session_id(&self) -> Result<Uuid, GameError> {
        let raw = self
            .payload
            .get("session_id")
            .and_then(|v| v.as_str())
            .ok_or(GameError::InvalidSessionId)?;
        Uuid::parse_str(raw).map_err(|_| GameError::InvalidSessionId)
    }

    /// Deserializes the payload into a typed structure.
    pub fn parse_payload<T: serde::de::DeserializeOwned>(&self) -> Result<T, GameError> {
        serde_json::from_value(self.payload.clone())
            .map_err(|e| GameError::InvalidPayload(e.to_string()))
    }
}

/// An inbound envelope paired with the connection it arrived on.
///
/// This is what travels on the hub's shared inbound channel and on each
/// session's message channel; the connection ID lets handlers address their
/// acknowledgement without knowing anything about sockets.
#[derive(Debug, Clone)]
pub struct ClientPackage {
    pub message: Envelope,
    pub connection_id: ConnectionId,
}

/// Payload of the `move` action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovePayload {
    pub session_id: Uuid,
    pub player_id: Uuid,
    pub vx: f64,
    pub vy: f64,
}

/// Payload of the `interact` action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractPayload {
    pub session_id: Uuid,
    pub player_id: Uuid,
    pub entity_id: Uuid,
}

/// Body of a failed [`ServerResponse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

/// A server-to-client message: push or acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerResponse {
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl ServerResponse {
    /// Builds a successful response or push for `action`.
    pub fn success(action: &str, payload: serde_json::Value) -> Self {
        Self {
            action: action.to_string(),
            payload: Some(payload),
            success: true,
            error: None,
        }
    }

    /// Builds an error response echoing the originating `action`.
    pub fn error(action: &str, error: &GameError) -> Self {
        Self {
            action: action.to_string(),
            payload: None,
            success: false,
            error: Some(ErrorBody {
                code: error.code(),
                message: error.to_string(),
            }),
        }
    }
}
