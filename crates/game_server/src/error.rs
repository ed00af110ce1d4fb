//! Error types and the stable wire error codes.
//!
//! [`GameError`] covers everything a client can cause or observe: malformed
//! payloads, lookup misses and domain-rule rejections. Each variant maps to
//! a stable [`ErrorCode`] string that is part of the wire contract.
//! [`ServerError`] covers infrastructure failures (socket binding,
//! handshake problems) that never reach clients as structured errors.

use crate::ecs::{ComponentKind, EntityId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable error code strings reported to clients.
///
/// These serialize to the exact snake_case strings clients match on; do not
/// rename variants without a protocol version bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    SessionNotFound,
    InvalidSessionId,
    PlayerNotFound,
    InvalidPayload,
    OutOfRange,
    RateLimited,
    InternalServerError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::SessionNotFound => "session_not_found",
            ErrorCode::InvalidSessionId => "invalid_session_id",
            ErrorCode::PlayerNotFound => "player_not_found",
            ErrorCode::InvalidPayload => "invalid_payload",
            ErrorCode::OutOfRange => "out_of_range",
            ErrorCode::RateLimited => "rate_limited",
            ErrorCode::InternalServerError => "internal_server_error",
        }
    }
}

/// Failures produced while handling a client request.
///
/// Handlers return these to the message loop, which reports them to the
/// originating connection and carries on; none of them is fatal to a
/// session or the hub.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("session {0} not found")]
    SessionNotFound(Uuid),

    #[error("payload carried no valid session id")]
    InvalidSessionId,

    #[error("player {0} is not part of this session")]
    PlayerNotFound(Uuid),

    #[error("no player identity for connection {0}")]
    UnknownConnection(usize),

    #[error("entity {0} not found")]
    EntityNotFound(EntityId),

    #[error("entity {0} is not an interactable target")]
    NotInteractable(EntityId),

    #[error("entity {0} is missing its {1:?} component")]
    MissingComponent(EntityId, ComponentKind),

    #[error("interaction target is out of range")]
    OutOfRange,

    #[error("interaction is rate limited")]
    RateLimited,

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl GameError {
    /// Maps the error onto its wire code.
    pub fn code(&self) -> ErrorCode {
        match self {
            GameError::SessionNotFound(_) => ErrorCode::SessionNotFound,
            GameError::InvalidSessionId => ErrorCode::InvalidSessionId,
            GameError::PlayerNotFound(_) | GameError::UnknownConnection(_) => {
                ErrorCode::PlayerNotFound
            }
            GameError::EntityNotFound(_)
            | GameError::NotInteractable(_)
            | GameError::InvalidPayload(_) => ErrorCode::InvalidPayload,
            GameError::OutOfRange => ErrorCode::OutOfRange,
            GameError::RateLimited => ErrorCode::RateLimited,
            GameError::MissingComponent(_, _) | GameError::Internal(_) => {
                ErrorCode::InternalServerError
            }
        }
    }
}

/// Infrastructure-level server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Network-related errors such as binding failures or handshake issues
    #[error("Network error: {0}")]
    Network(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_serialize_to_stable_strings() {
        for (code, expected) in [
            (ErrorCode::SessionNotFound, "\"session_not_found\""),
            (ErrorCode::InvalidSessionId, "\"invalid_session_id\""),
            (ErrorCode::PlayerNotFound, "\"player_not_found\""),
            (ErrorCode::InvalidPayload, "\"invalid_payload\""),
            (ErrorCode::OutOfRange, "\"out_of_range\""),
            (ErrorCode::RateLimited, "\"rate_limited\""),
            (ErrorCode::InternalServerError, "\"internal_server_error\""),
        ] {
            assert_eq!(serde_json::to_string(&code).unwrap(), expected);
            assert_eq!(format!("\"{}\"", code.as_str()), expected);
        }
    }

    #[test]
    fn domain_rejections_map_to_dedicated_codes() {
        assert_eq!(GameError::OutOfRange.code(), ErrorCode::OutOfRange);
        assert_eq!(GameError::RateLimited.code(), ErrorCode::RateLimited);
        assert_eq!(
            GameError::SessionNotFound(Uuid::new_v4()).code(),
            ErrorCode::SessionNotFound
        );
    }
}
