//! Row storage shared by the in-memory and JSON file stores.
//!
//! Every mutating method validates all of its references before touching a
//! single vector, so an error always leaves the tables unchanged.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::dao::{
    models::{
        CommentEntity, MovieEntity, MovieRef, NewComment, NewSubmission, NewVote, PlayerEntity,
        RoundAggregate, RoundEntity, RoundId, RoundStage, SubmissionEntity, SubmissionId, VoteEntity,
    },
    storage::{StorageError, StorageResult},
};

/// Full snapshot of every persisted row. Vectors are kept in ascending id order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tables {
    #[serde(default)]
    players: Vec<PlayerEntity>,
    #[serde(default)]
    rounds: Vec<RoundEntity>,
    #[serde(default)]
    movies: Vec<MovieEntity>,
    #[serde(default)]
    submissions: Vec<SubmissionEntity>,
    #[serde(default)]
    votes: Vec<VoteEntity>,
    #[serde(default)]
    comments: Vec<CommentEntity>,
}

fn next_id<T>(rows: &[T], id: impl Fn(&T) -> u64) -> u64 {
    rows.last().map(id).unwrap_or(0) + 1
}

impl Tables {
    pub fn players(&self) -> Vec<PlayerEntity> {
        self.players.clone()
    }

    pub fn find_player_by_name(&self, name: &str) -> Option<PlayerEntity> {
        self.players.iter().find(|player| player.name == name).cloned()
    }

    pub fn insert_player(&mut self, name: String) -> StorageResult<PlayerEntity> {
        if self.players.iter().any(|player| player.name == name) {
            return Err(StorageError::Conflict(format!(
                "player `{name}` is already registered"
            )));
        }

        let player = PlayerEntity {
            id: next_id(&self.players, |p| p.id),
            name,
        };
        self.players.push(player.clone());
        Ok(player)
    }

    pub fn insert_round(&mut self, prompt: String, created_at: SystemTime) -> RoundEntity {
        let round = RoundEntity {
            id: next_id(&self.rounds, |r| r.id),
            prompt,
            created_at,
            stage: RoundStage::Submission,
        };
        self.rounds.push(round.clone());
        round
    }

    pub fn latest_round(&self) -> Option<RoundEntity> {
        self.rounds.last().cloned()
    }

    pub fn load_round(&self, id: RoundId) -> Option<RoundAggregate> {
        let round = self.rounds.iter().find(|round| round.id == id)?;
        Some(self.aggregate(round))
    }

    pub fn list_rounds(&self) -> Vec<RoundAggregate> {
        self.rounds.iter().map(|round| self.aggregate(round)).collect()
    }

    pub fn find_movie_by_name(&self, name: &str) -> Option<MovieEntity> {
        self.movies
            .iter()
            .find(|movie| movie.name == name || movie.requested_name == name)
            .cloned()
    }

    pub fn find_submission(&self, id: SubmissionId) -> Option<SubmissionEntity> {
        self.submissions.iter().find(|s| s.id == id).cloned()
    }

    pub fn insert_submission(
        &mut self,
        submission: NewSubmission,
    ) -> StorageResult<SubmissionEntity> {
        let NewSubmission {
            round_id,
            submitting_user_id,
            movie,
            comment,
            closes_submissions,
        } = submission;

        self.ensure_round(round_id)?;
        self.ensure_player(submitting_user_id)?;
        if self
            .submissions
            .iter()
            .any(|s| s.round_id == round_id && s.submitting_user_id == submitting_user_id)
        {
            return Err(StorageError::Conflict(format!(
                "player `{submitting_user_id}` already submitted in round `{round_id}`"
            )));
        }
        if let MovieRef::Existing(movie_id) = &movie {
            if !self.movies.iter().any(|m| m.id == *movie_id) {
                return Err(StorageError::missing("movie", *movie_id));
            }
        }

        let movie_id = match movie {
            MovieRef::Existing(id) => id,
            MovieRef::New(draft) => match self
                .find_movie_by_name(&draft.requested_name)
                .or_else(|| self.find_movie_by_name(&draft.name))
            {
                Some(existing) => existing.id,
                None => {
                    let entity = draft.into_entity(next_id(&self.movies, |m| m.id));
                    let id = entity.id;
                    self.movies.push(entity);
                    id
                }
            },
        };

        let entity = SubmissionEntity {
            id: next_id(&self.submissions, |s| s.id),
            round_id,
            movie_id,
            submitting_user_id,
        };
        self.submissions.push(entity.clone());

        if let Some(text) = comment {
            self.push_comment(entity.id, submitting_user_id, text);
        }
        if closes_submissions {
            self.set_stage(round_id, RoundStage::Voting);
        }

        Ok(entity)
    }

    pub fn record_vote(&mut self, vote: NewVote) -> StorageResult<VoteEntity> {
        let NewVote {
            round_id,
            voter_id,
            submission_id,
            comments,
            closes_voting,
        } = vote;

        self.ensure_round(round_id)?;
        self.ensure_player(voter_id)?;
        self.ensure_submission(submission_id)?;
        for (target, _) in &comments {
            self.ensure_submission(*target)?;
        }

        let entity = match self
            .votes
            .iter_mut()
            .find(|v| v.round_id == round_id && v.voter_id == voter_id)
        {
            Some(existing) => {
                existing.submission_id = submission_id;
                existing.clone()
            }
            None => {
                let entity = VoteEntity {
                    id: next_id(&self.votes, |v| v.id),
                    round_id,
                    voter_id,
                    submission_id,
                };
                self.votes.push(entity.clone());
                entity
            }
        };

        for (target, text) in comments {
            self.push_comment(target, voter_id, text);
        }
        if closes_voting {
            self.set_stage(round_id, RoundStage::Closed);
        }

        Ok(entity)
    }

    pub fn insert_comment(&mut self, comment: NewComment) -> StorageResult<CommentEntity> {
        self.ensure_player(comment.author_id)?;
        self.ensure_submission(comment.submission_id)?;
        Ok(self.push_comment(comment.submission_id, comment.author_id, comment.text))
    }

    fn push_comment(
        &mut self,
        submission_id: SubmissionId,
        author_id: u64,
        text: String,
    ) -> CommentEntity {
        let entity = CommentEntity {
            id: next_id(&self.comments, |c| c.id),
            submission_id,
            author_id,
            text,
        };
        self.comments.push(entity.clone());
        entity
    }

    fn set_stage(&mut self, id: RoundId, stage: RoundStage) {
        if let Some(round) = self.rounds.iter_mut().find(|r| r.id == id) {
            round.stage = stage;
        }
    }

    fn ensure_round(&self, id: RoundId) -> StorageResult<()> {
        if self.rounds.iter().any(|r| r.id == id) {
            Ok(())
        } else {
            Err(StorageError::missing("round", id))
        }
    }

    fn ensure_player(&self, id: u64) -> StorageResult<()> {
        if self.players.iter().any(|p| p.id == id) {
            Ok(())
        } else {
            Err(StorageError::missing("player", id))
        }
    }

    fn ensure_submission(&self, id: SubmissionId) -> StorageResult<()> {
        if self.submissions.iter().any(|s| s.id == id) {
            Ok(())
        } else {
            Err(StorageError::missing("submission", id))
        }
    }

    fn aggregate(&self, round: &RoundEntity) -> RoundAggregate {
        let submissions: Vec<SubmissionEntity> = self
            .submissions
            .iter()
            .filter(|s| s.round_id == round.id)
            .cloned()
            .collect();

        let movies = self
            .movies
            .iter()
            .filter(|movie| submissions.iter().any(|s| s.movie_id == movie.id))
            .cloned()
            .collect();

        let comments = self
            .comments
            .iter()
            .filter(|comment| submissions.iter().any(|s| s.id == comment.submission_id))
            .cloned()
            .collect();

        let votes = self
            .votes
            .iter()
            .filter(|vote| vote.round_id == round.id)
            .cloned()
            .collect();

        RoundAggregate {
            round: round.clone(),
            submissions,
            movies,
            comments,
            votes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::MovieDraft;

    fn draft(title: &str) -> MovieDraft {
        MovieDraft {
            name: title.into(),
            requested_name: title.into(),
            poster_url: String::new(),
            description: String::new(),
            genre: String::new(),
            release_date: String::new(),
            actors: String::new(),
            directors: String::new(),
        }
    }

    fn seeded() -> Tables {
        let mut tables = Tables::default();
        tables.insert_player("alice".into()).unwrap();
        tables.insert_player("bob".into()).unwrap();
        tables.insert_round("prompt".into(), SystemTime::UNIX_EPOCH);
        tables
    }

    fn submit(tables: &mut Tables, player: u64, title: &str) -> SubmissionEntity {
        tables
            .insert_submission(NewSubmission {
                round_id: 1,
                submitting_user_id: player,
                movie: MovieRef::New(draft(title)),
                comment: Some(format!("{title} comment")),
                closes_submissions: false,
            })
            .unwrap()
    }

    #[test]
    fn duplicate_player_names_conflict() {
        let mut tables = seeded();
        let err = tables.insert_player("alice".into()).unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));
        assert_eq!(tables.players().len(), 2);
    }

    #[test]
    fn submission_reuses_movie_with_same_name() {
        let mut tables = seeded();
        let first = submit(&mut tables, 1, "Alien");
        tables.insert_round("second".into(), SystemTime::UNIX_EPOCH);
        let second = tables
            .insert_submission(NewSubmission {
                round_id: 2,
                submitting_user_id: 2,
                movie: MovieRef::New(draft("Alien")),
                comment: None,
                closes_submissions: false,
            })
            .unwrap();

        assert_eq!(first.movie_id, second.movie_id);
        assert_eq!(tables.movies.len(), 1);
    }

    #[test]
    fn submission_reuses_movie_with_same_canonical_name() {
        let mut tables = seeded();
        let first = submit(&mut tables, 1, "Alien");

        let mut typed = draft("Alien");
        typed.requested_name = "alien".into();
        let second = tables
            .insert_submission(NewSubmission {
                round_id: 1,
                submitting_user_id: 2,
                movie: MovieRef::New(typed),
                comment: None,
                closes_submissions: false,
            })
            .unwrap();

        assert_eq!(first.movie_id, second.movie_id);
        assert_eq!(tables.movies.len(), 1);
        assert_eq!(tables.movies[0].requested_name, "Alien");
    }

    #[test]
    fn submission_to_unknown_round_writes_nothing() {
        let mut tables = seeded();
        let before = tables.clone();
        let err = tables
            .insert_submission(NewSubmission {
                round_id: 9,
                submitting_user_id: 1,
                movie: MovieRef::New(draft("Heat")),
                comment: Some("nope".into()),
                closes_submissions: true,
            })
            .unwrap_err();

        assert!(matches!(err, StorageError::Missing { entity: "round", id: 9 }));
        assert_eq!(tables, before);
    }

    #[test]
    fn vote_with_unknown_comment_target_writes_nothing() {
        let mut tables = seeded();
        submit(&mut tables, 1, "Alien");
        let before = tables.clone();

        let err = tables
            .record_vote(NewVote {
                round_id: 1,
                voter_id: 2,
                submission_id: 1,
                comments: vec![(1, "great".into()), (42, "missing".into())],
                closes_voting: false,
            })
            .unwrap_err();

        assert!(matches!(err, StorageError::Missing { entity: "submission", id: 42 }));
        assert_eq!(tables, before);
    }

    #[test]
    fn revote_overwrites_target_and_appends_comments() {
        let mut tables = seeded();
        submit(&mut tables, 1, "Alien");
        submit(&mut tables, 2, "Heat");

        let first = tables
            .record_vote(NewVote {
                round_id: 1,
                voter_id: 1,
                submission_id: 1,
                comments: vec![(1, "first".into())],
                closes_voting: false,
            })
            .unwrap();
        let second = tables
            .record_vote(NewVote {
                round_id: 1,
                voter_id: 1,
                submission_id: 2,
                comments: vec![(2, "second".into())],
                closes_voting: false,
            })
            .unwrap();

        assert_eq!(first.id, second.id);
        let round = tables.load_round(1).unwrap();
        assert_eq!(round.votes.len(), 1);
        assert_eq!(round.votes[0].submission_id, 2);
        let texts: Vec<_> = round.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["Alien comment", "Heat comment", "first", "second"]);
    }

    #[test]
    fn aggregate_is_scoped_to_round() {
        let mut tables = seeded();
        submit(&mut tables, 1, "Alien");
        tables
            .record_vote(NewVote {
                round_id: 1,
                voter_id: 1,
                submission_id: 1,
                comments: Vec::new(),
                closes_voting: false,
            })
            .unwrap();
        tables.insert_round("second".into(), SystemTime::UNIX_EPOCH);

        let second = tables.load_round(2).unwrap();
        assert!(second.submissions.is_empty());
        assert!(second.votes.is_empty());
        assert!(second.comments.is_empty());

        let first = tables.load_round(1).unwrap();
        assert_eq!(first.submissions.len(), 1);
        assert_eq!(first.votes.len(), 1);
        assert_eq!(tables.latest_round().unwrap().id, 2);
    }

    #[test]
    fn completing_writes_advance_the_round_stage() {
        let mut tables = seeded();
        submit(&mut tables, 1, "Alien");
        assert_eq!(tables.latest_round().unwrap().stage, RoundStage::Submission);

        tables
            .insert_submission(NewSubmission {
                round_id: 1,
                submitting_user_id: 2,
                movie: MovieRef::New(draft("Heat")),
                comment: None,
                closes_submissions: true,
            })
            .unwrap();
        assert_eq!(tables.latest_round().unwrap().stage, RoundStage::Voting);

        tables
            .record_vote(NewVote {
                round_id: 1,
                voter_id: 1,
                submission_id: 2,
                comments: Vec::new(),
                closes_voting: true,
            })
            .unwrap();
        assert_eq!(tables.latest_round().unwrap().stage, RoundStage::Closed);

        tables.insert_round("next".into(), SystemTime::UNIX_EPOCH);
        assert_eq!(tables.latest_round().unwrap().stage, RoundStage::Submission);
        assert_eq!(tables.load_round(1).unwrap().round.stage, RoundStage::Closed);
    }

    #[test]
    fn second_submission_in_round_conflicts() {
        let mut tables = seeded();
        submit(&mut tables, 1, "Alien");
        let before = tables.clone();

        let err = tables
            .insert_submission(NewSubmission {
                round_id: 1,
                submitting_user_id: 1,
                movie: MovieRef::New(draft("Heat")),
                comment: None,
                closes_submissions: false,
            })
            .unwrap_err();

        assert!(matches!(err, StorageError::Conflict(_)));
        assert_eq!(tables, before);
    }
}
