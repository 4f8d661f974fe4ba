//! Completion predicates of the round lifecycle and the startup phase recomputation.
//!
//! An empty player set never completes a phase, so a round nobody joined stays
//! open for submissions. Completion is decided once, before the completing
//! write, and the resulting stage is stored with that write; restarts read the
//! stage back instead of re-running the predicates against a player set that
//! may have grown since.

use tracing::info;

use crate::{
    dao::models::{PlayerEntity, PlayerId, RoundAggregate, RoundStage},
    dto::phase::PlayerState,
    error::ServiceError,
    state::{SharedState, state_machine::RoundPhase},
};

/// Every registered player has nominated a movie in `round` once `submitter` has.
pub fn all_players_submitted(
    players: &[PlayerEntity],
    round: &RoundAggregate,
    submitter: PlayerId,
) -> bool {
    !players.is_empty()
        && players
            .iter()
            .all(|player| player.id == submitter || round.has_submitted(player.id))
}

/// Every registered player has a vote in `round` once `voter` has.
pub fn all_players_voted(players: &[PlayerEntity], round: &RoundAggregate, voter: PlayerId) -> bool {
    !players.is_empty()
        && players
            .iter()
            .all(|player| player.id == voter || round.has_voted(player.id))
}

/// Whether the current phase still waits on `player_id`.
///
/// `None` in the overview phase and for callers that are not registered.
pub fn player_state(
    phase: RoundPhase,
    player_id: Option<PlayerId>,
    round: Option<&RoundAggregate>,
) -> Option<PlayerState> {
    let player_id = player_id?;
    let done = match phase {
        RoundPhase::Overview => return None,
        RoundPhase::Submission => round.is_some_and(|round| round.has_submitted(player_id)),
        RoundPhase::Voting => round.is_some_and(|round| round.has_voted(player_id)),
    };
    Some(if done {
        PlayerState::Closed
    } else {
        PlayerState::Open
    })
}

/// Phase implied by the stored stage of the current round.
pub fn derive_phase(round: Option<&RoundAggregate>) -> RoundPhase {
    match round.map(|round| round.round.stage) {
        None | Some(RoundStage::Closed) => RoundPhase::Overview,
        Some(RoundStage::Submission) => RoundPhase::Submission,
        Some(RoundStage::Voting) => RoundPhase::Voting,
    }
}

/// Recompute the phase from the store and position the state machine there.
pub async fn restore(state: &SharedState) -> Result<RoundPhase, ServiceError> {
    let store = state.store();
    let round = match store.latest_round().await? {
        Some(round) => store.load_round(round.id).await?,
        None => None,
    };

    let phase = derive_phase(round.as_ref());
    info!(
        ?phase,
        round_id = round.as_ref().map(|round| round.round.id),
        "recomputed phase from storage"
    );
    state.resume_at(phase).await;
    Ok(phase)
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use crate::dao::models::{RoundEntity, SubmissionEntity, VoteEntity};

    use super::*;

    fn players(n: u64) -> Vec<PlayerEntity> {
        (1..=n)
            .map(|id| PlayerEntity {
                id,
                name: format!("p{id}"),
            })
            .collect()
    }

    fn round(submitters: &[u64], voters: &[u64]) -> RoundAggregate {
        staged(submitters, voters, RoundStage::Submission)
    }

    fn staged(submitters: &[u64], voters: &[u64], stage: RoundStage) -> RoundAggregate {
        RoundAggregate {
            round: RoundEntity {
                id: 1,
                prompt: "p".into(),
                created_at: SystemTime::UNIX_EPOCH,
                stage,
            },
            submissions: submitters
                .iter()
                .map(|&player| SubmissionEntity {
                    id: player,
                    round_id: 1,
                    movie_id: player,
                    submitting_user_id: player,
                })
                .collect(),
            movies: Vec::new(),
            comments: Vec::new(),
            votes: voters
                .iter()
                .map(|&player| VoteEntity {
                    id: player,
                    round_id: 1,
                    voter_id: player,
                    submission_id: 1,
                })
                .collect(),
        }
    }

    #[test]
    fn submission_completes_only_when_everyone_submitted() {
        let players = players(3);
        assert!(!all_players_submitted(&players, &round(&[1], &[]), 2));
        assert!(all_players_submitted(&players, &round(&[1, 3], &[]), 2));
        assert!(!all_players_submitted(&[], &round(&[], &[]), 1));
    }

    #[test]
    fn voting_completes_only_when_everyone_voted() {
        let players = players(3);
        assert!(!all_players_voted(&players, &round(&[1, 2, 3], &[1]), 2));
        assert!(all_players_voted(&players, &round(&[1, 2, 3], &[1, 2]), 3));
        assert!(all_players_voted(&players, &round(&[1, 2, 3], &[1, 2, 3]), 3));
    }

    #[test]
    fn player_state_follows_phase() {
        let current = round(&[1], &[]);
        assert_eq!(
            player_state(RoundPhase::Submission, Some(1), Some(&current)),
            Some(PlayerState::Closed)
        );
        assert_eq!(
            player_state(RoundPhase::Submission, Some(2), Some(&current)),
            Some(PlayerState::Open)
        );
        assert_eq!(
            player_state(RoundPhase::Voting, Some(1), Some(&current)),
            Some(PlayerState::Open)
        );
        assert_eq!(player_state(RoundPhase::Overview, Some(1), Some(&current)), None);
        assert_eq!(player_state(RoundPhase::Voting, None, Some(&current)), None);
    }

    #[test]
    fn derived_phase_follows_stored_stage() {
        assert_eq!(derive_phase(None), RoundPhase::Overview);
        assert_eq!(
            derive_phase(Some(&staged(&[1], &[], RoundStage::Submission))),
            RoundPhase::Submission
        );
        assert_eq!(
            derive_phase(Some(&staged(&[1, 2], &[], RoundStage::Voting))),
            RoundPhase::Voting
        );
        assert_eq!(
            derive_phase(Some(&staged(&[1, 2], &[1, 2], RoundStage::Closed))),
            RoundPhase::Overview
        );
    }
}
