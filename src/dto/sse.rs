use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::{phase::VisiblePhase, round::UserPublic};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Identifier of the SSE stream.
    pub stream: String,
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Phase at the time of subscription.
    pub state: VisiblePhase,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast whenever the lifecycle phase changes.
pub struct PhaseChangedEvent {
    pub state: VisiblePhase,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the current round gained a submission, a vote or a comment.
pub struct RoundUpdatedEvent {
    pub round_id: u64,
    pub submission_count: usize,
    pub vote_count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a new player joined the game.
pub struct PlayerRegisteredEvent {
    pub player: UserPublic,
}
