use serde::Serialize;
use utoipa::ToSchema;

use crate::state::state_machine::RoundPhase;

/// Publicly visible lifecycle phase, named the way clients expect.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
pub enum VisiblePhase {
    /// Results of the last round are shown.
    #[serde(rename = "OverviewState")]
    Overview,
    /// Players nominate movies.
    #[serde(rename = "SubmissionState")]
    Submission,
    /// Players vote on the nominations.
    #[serde(rename = "VotingState")]
    Voting,
}

impl From<RoundPhase> for VisiblePhase {
    fn from(value: RoundPhase) -> Self {
        match value {
            RoundPhase::Overview => VisiblePhase::Overview,
            RoundPhase::Submission => VisiblePhase::Submission,
            RoundPhase::Voting => VisiblePhase::Voting,
        }
    }
}

/// Whether the current phase still expects input from a given player.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlayerState {
    /// The player has not acted yet in this phase.
    Open,
    /// The player already submitted or voted.
    Closed,
}

/// Lifecycle status as seen by one player.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
pub struct CurrentState {
    pub state: VisiblePhase,
    /// `null` during the overview phase.
    pub player_state: Option<PlayerState>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_client_names() {
        let payload = CurrentState {
            state: RoundPhase::Voting.into(),
            player_state: Some(PlayerState::Open),
        };
        assert_eq!(
            serde_json::to_value(payload).unwrap(),
            serde_json::json!({"state": "VotingState", "player_state": "open"})
        );

        let overview = CurrentState {
            state: RoundPhase::Overview.into(),
            player_state: None,
        };
        assert_eq!(
            serde_json::to_value(overview).unwrap(),
            serde_json::json!({"state": "OverviewState", "player_state": null})
        );
    }
}
