use indexmap::IndexMap;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::{
    dao::{
        metadata::MetadataError,
        models::{
            MovieRef, NewComment, NewSubmission, NewVote, PlayerEntity, RoundAggregate,
            SubmissionEntity, SubmissionId,
        },
    },
    dto::{
        phase::CurrentState,
        round::{CommentPublic, RoundPublic, SubmissionPublic},
    },
    error::ServiceError,
    services::{lifecycle, sse_events},
    state::{
        SharedState,
        state_machine::{RoundEvent, RoundPhase},
    },
};

/// Open a new round and force the lifecycle into the submission phase.
///
/// The returned status is the one `username` would get from [`get_status`].
pub async fn create_round(
    state: &SharedState,
    username: &str,
    prompt: String,
) -> Result<CurrentState, ServiceError> {
    let prompt = prompt.trim().to_owned();
    if prompt.is_empty() {
        return Err(ServiceError::InvalidInput(
            "round prompt must not be empty".into(),
        ));
    }

    let store = state.store();
    let (round, phase) = state
        .run_transition(RoundEvent::RoundCreated, || async move {
            store.insert_round(prompt).await.map_err(ServiceError::from)
        })
        .await?;

    info!(round_id = round.id, prompt = %round.prompt, "round created");

    // nobody has submitted to a fresh round yet
    let player = state.store().find_player_by_name(username.to_owned()).await?;
    Ok(CurrentState {
        state: phase.into(),
        player_state: lifecycle::player_state(phase, player.map(|player| player.id), None),
    })
}

/// Current round with every submission expanded.
pub async fn get_current_round(state: &SharedState) -> Result<RoundPublic, ServiceError> {
    let aggregate = load_current_round(state).await?;
    let players = state.store().list_players().await?;
    expand_round(&aggregate, &players)
}

/// Every round, most recent first.
pub async fn list_rounds(state: &SharedState) -> Result<Vec<RoundPublic>, ServiceError> {
    let store = state.store();
    let rounds = store.list_rounds().await?;
    let players = store.list_players().await?;

    rounds
        .iter()
        .rev()
        .map(|aggregate| expand_round(aggregate, &players))
        .collect()
}

/// Nominate `title` for the current round on behalf of `username`.
///
/// Unknown titles are resolved through the metadata provider before anything
/// is written; the submission, its new movie and its comment are stored in one
/// write. The lifecycle moves to voting once every player submitted.
pub async fn submit(
    state: &SharedState,
    username: &str,
    title: String,
    comment: Option<String>,
) -> Result<SubmissionPublic, ServiceError> {
    let title = title.trim().to_owned();
    if title.is_empty() {
        return Err(ServiceError::InvalidInput(
            "movie title must not be empty".into(),
        ));
    }
    let comment = comment.filter(|text| !text.trim().is_empty());

    state
        .run_exclusive(|| submit_locked(state, username, title, comment))
        .await
}

async fn submit_locked(
    state: &SharedState,
    username: &str,
    title: String,
    comment: Option<String>,
) -> Result<SubmissionPublic, ServiceError> {
    ensure_phase(state, RoundPhase::Submission).await?;

    let store = state.store();
    let round = load_current_round(state).await?;
    let player = require_player(state, username).await?;
    if round.has_submitted(player.id) {
        return Err(ServiceError::Conflict(format!(
            "`{}` already submitted a movie in round `{}`",
            player.name, round.round.id
        )));
    }

    let movie = resolve_movie(state, title).await?;
    let players = store.list_players().await?;
    let closes_submissions = lifecycle::all_players_submitted(&players, &round, player.id);
    let submission = store
        .insert_submission(NewSubmission {
            round_id: round.round.id,
            submitting_user_id: player.id,
            movie,
            comment,
            closes_submissions,
        })
        .await?;
    info!(
        submission_id = submission.id,
        round_id = submission.round_id,
        player = %player.name,
        "submission accepted"
    );

    if closes_submissions {
        state.advance(RoundEvent::AllSubmitted).await?;
    }
    let (round, players) = reload(state, submission.round_id).await?;
    sse_events::broadcast_round_updated(state.public_sse(), &round);

    expand_submission(&submission, &round, &players)
}

/// Record the vote of `username` for `submission_id` together with a batch of comments.
///
/// The lifecycle returns to the overview once every player voted.
pub async fn vote(
    state: &SharedState,
    username: &str,
    submission_id: SubmissionId,
    comments: IndexMap<SubmissionId, String>,
) -> Result<CurrentState, ServiceError> {
    state
        .run_exclusive(|| vote_locked(state, username, submission_id, comments))
        .await
}

async fn vote_locked(
    state: &SharedState,
    username: &str,
    submission_id: SubmissionId,
    comments: IndexMap<SubmissionId, String>,
) -> Result<CurrentState, ServiceError> {
    ensure_phase(state, RoundPhase::Voting).await?;

    let store = state.store();
    let player = require_player(state, username).await?;
    let round = load_current_round(state).await?;

    require_current_submission(state, &round, submission_id).await?;
    let mut batch = Vec::with_capacity(comments.len());
    for (target, text) in comments {
        if text.trim().is_empty() {
            continue;
        }
        require_current_submission(state, &round, target).await?;
        batch.push((target, text));
    }

    let players = store.list_players().await?;
    let closes_voting = lifecycle::all_players_voted(&players, &round, player.id);
    let vote = store
        .record_vote(NewVote {
            round_id: round.round.id,
            voter_id: player.id,
            submission_id,
            comments: batch,
            closes_voting,
        })
        .await?;
    info!(
        vote_id = vote.id,
        round_id = vote.round_id,
        submission_id = vote.submission_id,
        player = %player.name,
        "vote recorded"
    );

    let phase = if closes_voting {
        state.advance(RoundEvent::AllVoted).await?
    } else {
        state.phase().await
    };
    let (round, _) = reload(state, vote.round_id).await?;
    sse_events::broadcast_round_updated(state.public_sse(), &round);

    Ok(CurrentState {
        state: phase.into(),
        player_state: lifecycle::player_state(phase, Some(player.id), Some(&round)),
    })
}

/// Attach a comment by `username` to any submission, in any phase.
pub async fn add_comment(
    state: &SharedState,
    username: &str,
    submission_id: SubmissionId,
    text: String,
) -> Result<CommentPublic, ServiceError> {
    if text.trim().is_empty() {
        return Err(ServiceError::InvalidInput(
            "comment text must not be empty".into(),
        ));
    }

    state
        .run_exclusive(|| comment_locked(state, username, submission_id, text))
        .await
}

async fn comment_locked(
    state: &SharedState,
    username: &str,
    submission_id: SubmissionId,
    text: String,
) -> Result<CommentPublic, ServiceError> {
    let store = state.store();
    let player = require_player(state, username).await?;
    let submission = require_submission(state, submission_id).await?;

    let comment = store
        .insert_comment(NewComment {
            submission_id: submission.id,
            author_id: player.id,
            text,
        })
        .await?;
    debug!(comment_id = comment.id, submission_id, "comment added");

    if let Some(round) = store.load_round(submission.round_id).await? {
        sse_events::broadcast_round_updated(state.public_sse(), &round);
    }

    Ok(CommentPublic::new(&comment, &player))
}

/// Lifecycle status as seen by `username`.
pub async fn get_status(
    state: &SharedState,
    username: &str,
) -> Result<CurrentState, ServiceError> {
    let store = state.store();
    let phase = state.phase().await;
    let player = store.find_player_by_name(username.to_owned()).await?;
    let round = match store.latest_round().await? {
        Some(round) => store.load_round(round.id).await?,
        None => None,
    };

    Ok(CurrentState {
        state: phase.into(),
        player_state: lifecycle::player_state(
            phase,
            player.map(|player| player.id),
            round.as_ref(),
        ),
    })
}

async fn ensure_phase(state: &SharedState, expected: RoundPhase) -> Result<(), ServiceError> {
    let actual = state.phase().await;
    if actual != expected {
        return Err(ServiceError::PhaseMismatch { expected, actual });
    }
    Ok(())
}

async fn load_current_round(state: &SharedState) -> Result<RoundAggregate, ServiceError> {
    let store = state.store();
    let Some(round) = store.latest_round().await? else {
        return Err(ServiceError::NotFound("no round has been created yet".into()));
    };
    store
        .load_round(round.id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("round `{}` not found", round.id)))
}

async fn require_player(
    state: &SharedState,
    username: &str,
) -> Result<PlayerEntity, ServiceError> {
    state
        .store()
        .find_player_by_name(username.to_owned())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("player `{username}` is not registered")))
}

async fn require_submission(
    state: &SharedState,
    submission_id: SubmissionId,
) -> Result<SubmissionEntity, ServiceError> {
    state
        .store()
        .find_submission(submission_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("submission `{submission_id}` not found")))
}

async fn require_current_submission(
    state: &SharedState,
    round: &RoundAggregate,
    submission_id: SubmissionId,
) -> Result<(), ServiceError> {
    if round.contains_submission(submission_id) {
        return Ok(());
    }
    let submission = require_submission(state, submission_id).await?;
    if submission.round_id != round.round.id {
        return Err(ServiceError::InvalidInput(format!(
            "submission `{submission_id}` belongs to round `{}`, not the current round `{}`",
            submission.round_id, round.round.id
        )));
    }
    Ok(())
}

/// Reuse a stored movie with this exact name, or ask the metadata provider for a new one.
async fn resolve_movie(state: &SharedState, title: String) -> Result<MovieRef, ServiceError> {
    if let Some(movie) = state.store().find_movie_by_name(title.clone()).await? {
        debug!(movie_id = movie.id, %title, "reusing stored movie");
        return Ok(MovieRef::Existing(movie.id));
    }

    let lookup = state.metadata().resolve(title.clone());
    let metadata = match timeout(state.config().metadata_timeout(), lookup).await {
        Ok(result) => result?,
        Err(_) => return Err(MetadataError::Timeout { title }.into()),
    };
    debug!(requested = %title, resolved = %metadata.name, "movie metadata resolved");
    Ok(MovieRef::New(metadata.into_draft(title)))
}

async fn reload(
    state: &SharedState,
    round_id: u64,
) -> Result<(RoundAggregate, Vec<PlayerEntity>), ServiceError> {
    let store = state.store();
    let round = store
        .load_round(round_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("round `{round_id}` not found")))?;
    let players = store.list_players().await?;
    Ok((round, players))
}

fn expand_round(
    aggregate: &RoundAggregate,
    players: &[PlayerEntity],
) -> Result<RoundPublic, ServiceError> {
    RoundPublic::assemble(aggregate, players).ok_or_else(|| {
        ServiceError::InvalidState(format!(
            "round `{}` references rows that do not exist",
            aggregate.round.id
        ))
    })
}

fn expand_submission(
    submission: &SubmissionEntity,
    round: &RoundAggregate,
    players: &[PlayerEntity],
) -> Result<SubmissionPublic, ServiceError> {
    SubmissionPublic::assemble(submission, round, players).ok_or_else(|| {
        ServiceError::InvalidState(format!(
            "submission `{}` references rows that do not exist",
            submission.id
        ))
    })
}
