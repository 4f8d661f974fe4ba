use serde::Serialize;
use tracing::warn;

use crate::{
    dao::models::{PlayerEntity, RoundAggregate},
    dto::{
        round::UserPublic,
        sse::{PhaseChangedEvent, PlayerRegisteredEvent, RoundUpdatedEvent, ServerEvent},
    },
    state::{SseHub, state_machine::RoundPhase},
};

const EVENT_PHASE_CHANGED: &str = "phase_changed";
const EVENT_ROUND_UPDATED: &str = "round.updated";
const EVENT_PLAYER_REGISTERED: &str = "player.registered";

/// Broadcast a lifecycle phase change notification.
pub fn broadcast_phase_changed(hub: &SseHub, phase: RoundPhase) {
    let payload = PhaseChangedEvent {
        state: phase.into(),
    };
    send_public_event(hub, EVENT_PHASE_CHANGED, &payload);
}

/// Broadcast the progress of the current round after a write.
pub fn broadcast_round_updated(hub: &SseHub, aggregate: &RoundAggregate) {
    let payload = RoundUpdatedEvent {
        round_id: aggregate.round.id,
        submission_count: aggregate.submissions.len(),
        vote_count: aggregate.votes.len(),
    };
    send_public_event(hub, EVENT_ROUND_UPDATED, &payload);
}

/// Broadcast that a player joined the game.
pub fn broadcast_player_registered(hub: &SseHub, player: &PlayerEntity) {
    let payload = PlayerRegisteredEvent {
        player: UserPublic::from(player),
    };
    send_public_event(hub, EVENT_PLAYER_REGISTERED, &payload);
}

fn send_public_event(hub: &SseHub, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => hub.broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn phase_change_is_named_and_serialized() {
        let hub = SseHub::new(4);
        let mut receiver = hub.subscribe();

        broadcast_phase_changed(&hub, RoundPhase::Voting);

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some(EVENT_PHASE_CHANGED));
        assert_eq!(event.data, r#"{"state":"VotingState"}"#);
    }

    #[tokio::test]
    async fn player_registration_carries_public_view() {
        let hub = SseHub::new(4);
        let mut receiver = hub.subscribe();

        broadcast_player_registered(
            &hub,
            &PlayerEntity {
                id: 3,
                name: "carol".into(),
            },
        );

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some(EVENT_PLAYER_REGISTERED));
        assert_eq!(event.data, r#"{"player":{"id":3,"name":"carol"}}"#);
    }
}
