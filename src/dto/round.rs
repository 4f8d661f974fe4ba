use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::{
        CommentEntity, MovieEntity, PlayerEntity, RoundAggregate, SubmissionEntity,
        SubmissionId,
    },
    dto::{
        format_system_time,
        validation::{check_not_blank, finish},
    },
};

/// Payload used to open a new round.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RoundCreate {
    /// Theme players pick a movie for.
    pub prompt: String,
}

impl Validate for RoundCreate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_not_blank(&mut errors, "prompt", &self.prompt);
        finish(errors)
    }
}

/// Payload used to nominate a movie for the current round.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmissionCreate {
    /// Movie title as typed by the player.
    pub name: String,
    /// Optional comment attached to the nomination.
    #[serde(default)]
    pub comment: Option<String>,
}

impl Validate for SubmissionCreate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_not_blank(&mut errors, "name", &self.name);
        finish(errors)
    }
}

/// Ballot for the current round.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct VoteCreate {
    /// Submission the player votes for.
    pub submission_id: SubmissionId,
    /// Comments keyed by submission id, stored in the order given.
    #[serde(default)]
    pub all_comments: IndexMap<SubmissionId, String>,
}

/// Payload attaching a comment to a submission.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CommentCreate {
    pub submission_id: SubmissionId,
    pub text: String,
}

impl Validate for CommentCreate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_not_blank(&mut errors, "text", &self.text);
        finish(errors)
    }
}

/// Public view of a registered player.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct UserPublic {
    pub id: u64,
    pub name: String,
}

impl From<&PlayerEntity> for UserPublic {
    fn from(player: &PlayerEntity) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
        }
    }
}

/// Public view of a cached movie.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct MoviePublic {
    pub id: u64,
    pub name: String,
    pub requested_name: String,
    pub poster_url: String,
    pub description: String,
    pub genre: String,
    pub release_date: String,
    pub actors: String,
    pub directors: String,
}

impl From<&MovieEntity> for MoviePublic {
    fn from(movie: &MovieEntity) -> Self {
        Self {
            id: movie.id,
            name: movie.name.clone(),
            requested_name: movie.requested_name.clone(),
            poster_url: movie.poster_url.clone(),
            description: movie.description.clone(),
            genre: movie.genre.clone(),
            release_date: movie.release_date.clone(),
            actors: movie.actors.clone(),
            directors: movie.directors.clone(),
        }
    }
}

/// Comment together with its author.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct CommentPublic {
    pub id: u64,
    pub submission_id: u64,
    pub author_id: u64,
    pub author: UserPublic,
    pub text: String,
}

impl CommentPublic {
    pub fn new(comment: &CommentEntity, author: &PlayerEntity) -> Self {
        Self {
            id: comment.id,
            submission_id: comment.submission_id,
            author_id: comment.author_id,
            author: author.into(),
            text: comment.text.clone(),
        }
    }
}

/// Submission joined with its movie, submitter, voters and comments.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct SubmissionPublic {
    pub id: u64,
    pub round_id: u64,
    pub movie_id: u64,
    pub submitting_user_id: u64,
    pub submitting_user: UserPublic,
    /// Players whose vote in this round targets the submission, by player id.
    pub voting_users: Vec<UserPublic>,
    pub movie: MoviePublic,
    /// Comments in insertion order.
    pub comments: Vec<CommentPublic>,
}

impl SubmissionPublic {
    /// Join `submission` with the rows of its round.
    ///
    /// Returns `None` when a referenced movie or player row is missing.
    pub fn assemble(
        submission: &SubmissionEntity,
        aggregate: &RoundAggregate,
        players: &[PlayerEntity],
    ) -> Option<Self> {
        let player = |id: u64| players.iter().find(|player| player.id == id);

        let movie = aggregate
            .movies
            .iter()
            .find(|movie| movie.id == submission.movie_id)?;
        let submitting_user = player(submission.submitting_user_id)?;

        let mut voters = aggregate
            .votes
            .iter()
            .filter(|vote| vote.submission_id == submission.id)
            .map(|vote| player(vote.voter_id))
            .collect::<Option<Vec<_>>>()?;
        voters.sort_by_key(|player| player.id);

        let comments = aggregate
            .comments
            .iter()
            .filter(|comment| comment.submission_id == submission.id)
            .map(|comment| {
                player(comment.author_id).map(|author| CommentPublic::new(comment, author))
            })
            .collect::<Option<Vec<_>>>()?;

        Some(Self {
            id: submission.id,
            round_id: submission.round_id,
            movie_id: submission.movie_id,
            submitting_user_id: submission.submitting_user_id,
            submitting_user: submitting_user.into(),
            voting_users: voters.into_iter().map(UserPublic::from).collect(),
            movie: movie.into(),
            comments,
        })
    }
}

/// Round with every submission expanded.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct RoundPublic {
    pub id: u64,
    pub prompt: String,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    pub submissions: Vec<SubmissionPublic>,
}

impl RoundPublic {
    /// Expand `aggregate`; `None` when its rows reference unknown players or movies.
    pub fn assemble(aggregate: &RoundAggregate, players: &[PlayerEntity]) -> Option<Self> {
        let submissions = aggregate
            .submissions
            .iter()
            .map(|submission| SubmissionPublic::assemble(submission, aggregate, players))
            .collect::<Option<Vec<_>>>()?;

        Some(Self {
            id: aggregate.round.id,
            prompt: aggregate.round.prompt.clone(),
            created_at: format_system_time(aggregate.round.created_at),
            submissions,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use crate::dao::models::{RoundEntity, RoundStage, VoteEntity};

    use super::*;

    fn player(id: u64, name: &str) -> PlayerEntity {
        PlayerEntity {
            id,
            name: name.into(),
        }
    }

    fn aggregate() -> RoundAggregate {
        RoundAggregate {
            round: RoundEntity {
                id: 1,
                prompt: "heist".into(),
                created_at: SystemTime::UNIX_EPOCH,
                stage: RoundStage::Voting,
            },
            submissions: vec![SubmissionEntity {
                id: 10,
                round_id: 1,
                movie_id: 5,
                submitting_user_id: 1,
            }],
            movies: vec![MovieEntity {
                id: 5,
                name: "Heat".into(),
                requested_name: "heat".into(),
                poster_url: String::new(),
                description: String::new(),
                genre: String::new(),
                release_date: String::new(),
                actors: String::new(),
                directors: String::new(),
            }],
            comments: vec![
                CommentEntity {
                    id: 1,
                    submission_id: 10,
                    author_id: 2,
                    text: "classic".into(),
                },
                CommentEntity {
                    id: 2,
                    submission_id: 10,
                    author_id: 1,
                    text: "agreed".into(),
                },
            ],
            votes: vec![
                VoteEntity {
                    id: 1,
                    round_id: 1,
                    voter_id: 2,
                    submission_id: 10,
                },
                VoteEntity {
                    id: 2,
                    round_id: 1,
                    voter_id: 1,
                    submission_id: 10,
                },
            ],
        }
    }

    #[test]
    fn round_expands_submissions_with_voters_and_comments() {
        let players = [player(1, "alice"), player(2, "bob")];
        let round = RoundPublic::assemble(&aggregate(), &players).unwrap();

        assert_eq!(round.created_at, "1970-01-01T00:00:00Z");
        let submission = &round.submissions[0];
        assert_eq!(submission.submitting_user.name, "alice");
        assert_eq!(submission.movie.name, "Heat");
        let voters: Vec<_> = submission.voting_users.iter().map(|u| u.id).collect();
        assert_eq!(voters, vec![1, 2]);
        let texts: Vec<_> = submission.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["classic", "agreed"]);
        assert_eq!(submission.comments[0].author.name, "bob");
    }

    #[test]
    fn dangling_rows_are_reported() {
        let players = [player(1, "alice")];
        assert!(RoundPublic::assemble(&aggregate(), &players).is_none());
    }

    #[test]
    fn vote_comments_keep_request_order() {
        let vote: VoteCreate = serde_json::from_str(
            r#"{"submission_id": 3, "all_comments": {"9": "last?", "2": "first?"}}"#,
        )
        .unwrap();
        let keys: Vec<_> = vote.all_comments.keys().copied().collect();
        assert_eq!(keys, vec![9, 2]);
    }

    #[test]
    fn blank_prompt_is_rejected() {
        let create = RoundCreate {
            prompt: "  ".into(),
        };
        assert!(create.validate().is_err());
    }
}
