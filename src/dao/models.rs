use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Identifier of a persisted round.
pub type RoundId = u64;
/// Identifier of a registered player.
pub type PlayerId = u64;
/// Identifier of a cached movie.
pub type MovieId = u64;
/// Identifier of a submission.
pub type SubmissionId = u64;
/// Identifier of a vote record.
pub type VoteId = u64;
/// Identifier of a comment.
pub type CommentId = u64;

/// One game cycle sharing a prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundEntity {
    /// Primary key, also defines which round is current (highest wins).
    pub id: RoundId,
    /// Prompt players pick movies for.
    pub prompt: String,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Lifecycle stage committed together with the write that completed it.
    #[serde(default)]
    pub stage: RoundStage,
}

/// Persisted lifecycle stage of a round.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RoundStage {
    /// Still collecting submissions.
    #[default]
    Submission,
    /// Every player that was registered at the time submitted; votes are open.
    Voting,
    /// Every player that was registered at the time voted.
    Closed,
}

/// Registered player, shared by every round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Primary key.
    pub id: PlayerId,
    /// Unique display name, equal to the login identity.
    pub name: String,
}

/// Movie record enriched with external metadata and reused across rounds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MovieEntity {
    /// Primary key.
    pub id: MovieId,
    /// Canonical title returned by the metadata provider.
    pub name: String,
    /// Title as typed by the submitting player.
    pub requested_name: String,
    /// Poster image URL (may be empty).
    pub poster_url: String,
    /// Short plot description.
    pub description: String,
    /// Comma separated genres.
    pub genre: String,
    /// Release date as reported by the provider.
    pub release_date: String,
    /// Comma separated lead actors.
    pub actors: String,
    /// Comma separated directors.
    pub directors: String,
}

/// Movie fields captured before the row has an identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MovieDraft {
    pub name: String,
    pub requested_name: String,
    pub poster_url: String,
    pub description: String,
    pub genre: String,
    pub release_date: String,
    pub actors: String,
    pub directors: String,
}

impl MovieDraft {
    pub(crate) fn into_entity(self, id: MovieId) -> MovieEntity {
        MovieEntity {
            id,
            name: self.name,
            requested_name: self.requested_name,
            poster_url: self.poster_url,
            description: self.description,
            genre: self.genre,
            release_date: self.release_date,
            actors: self.actors,
            directors: self.directors,
        }
    }
}

/// Link between a round, a movie and the player who nominated it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmissionEntity {
    pub id: SubmissionId,
    pub round_id: RoundId,
    pub movie_id: MovieId,
    pub submitting_user_id: PlayerId,
}

/// A player's single vote within one round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteEntity {
    pub id: VoteId,
    pub round_id: RoundId,
    pub voter_id: PlayerId,
    pub submission_id: SubmissionId,
}

/// Free-form feedback attached to a submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommentEntity {
    pub id: CommentId,
    pub submission_id: SubmissionId,
    pub author_id: PlayerId,
    pub text: String,
}

/// How the movie of a new submission is obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovieRef {
    /// Reuse a movie row that already exists.
    Existing(MovieId),
    /// Insert a freshly resolved movie in the same write as the submission.
    New(MovieDraft),
}

/// Everything needed to insert a submission atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubmission {
    pub round_id: RoundId,
    pub submitting_user_id: PlayerId,
    pub movie: MovieRef,
    /// Optional comment authored by the submitter.
    pub comment: Option<String>,
    /// Move the round to [`RoundStage::Voting`] in the same write.
    pub closes_submissions: bool,
}

/// Everything needed to record a vote and its comment batch atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVote {
    pub round_id: RoundId,
    pub voter_id: PlayerId,
    pub submission_id: SubmissionId,
    /// Comments authored by the voter, kept in request order.
    pub comments: Vec<(SubmissionId, String)>,
    /// Move the round to [`RoundStage::Closed`] in the same write.
    pub closes_voting: bool,
}

/// Single comment insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub submission_id: SubmissionId,
    pub author_id: PlayerId,
    pub text: String,
}

/// A round joined with every row hanging off it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundAggregate {
    pub round: RoundEntity,
    /// Submissions of the round in insertion order.
    pub submissions: Vec<SubmissionEntity>,
    /// Movies referenced by the submissions.
    pub movies: Vec<MovieEntity>,
    /// Comments on the submissions, in insertion order.
    pub comments: Vec<CommentEntity>,
    /// Votes cast in this round.
    pub votes: Vec<VoteEntity>,
}

impl RoundAggregate {
    /// Whether `player_id` already nominated a movie in this round.
    pub fn has_submitted(&self, player_id: PlayerId) -> bool {
        self.submissions
            .iter()
            .any(|submission| submission.submitting_user_id == player_id)
    }

    /// Whether `player_id` already voted in this round.
    pub fn has_voted(&self, player_id: PlayerId) -> bool {
        self.votes.iter().any(|vote| vote.voter_id == player_id)
    }

    /// Whether `submission_id` belongs to this round.
    pub fn contains_submission(&self, submission_id: SubmissionId) -> bool {
        self.submissions
            .iter()
            .any(|submission| submission.id == submission_id)
    }
}
