#[cfg(feature = "json-store")]
pub mod json_file;
pub mod memory;
mod tables;

use crate::dao::models::{
    CommentEntity, MovieEntity, NewComment, NewSubmission, NewVote, PlayerEntity, RoundAggregate,
    RoundEntity, RoundId, SubmissionEntity, SubmissionId, VoteEntity,
};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

pub use self::tables::Tables;

/// Abstraction over the persistence layer for players, rounds and their submissions.
///
/// Every mutating method is atomic: it either commits all of its rows or none of them.
pub trait GameStore: Send + Sync {
    /// Insert a player; fails with a conflict when the name is taken.
    fn insert_player(&self, name: String) -> BoxFuture<'static, StorageResult<PlayerEntity>>;
    /// Registered players in id order.
    fn list_players(&self) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>>;
    fn find_player_by_name(
        &self,
        name: String,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>>;
    fn insert_round(&self, prompt: String) -> BoxFuture<'static, StorageResult<RoundEntity>>;
    /// Round with the highest id, if any.
    fn latest_round(&self) -> BoxFuture<'static, StorageResult<Option<RoundEntity>>>;
    fn load_round(&self, id: RoundId)
    -> BoxFuture<'static, StorageResult<Option<RoundAggregate>>>;
    /// Every round joined with its rows, in ascending id order.
    fn list_rounds(&self) -> BoxFuture<'static, StorageResult<Vec<RoundAggregate>>>;
    /// Movie whose canonical or requested name equals `name` exactly.
    fn find_movie_by_name(
        &self,
        name: String,
    ) -> BoxFuture<'static, StorageResult<Option<MovieEntity>>>;
    fn find_submission(
        &self,
        id: SubmissionId,
    ) -> BoxFuture<'static, StorageResult<Option<SubmissionEntity>>>;
    /// Insert a submission, its movie (when new) and its comment in one write.
    fn insert_submission(
        &self,
        submission: NewSubmission,
    ) -> BoxFuture<'static, StorageResult<SubmissionEntity>>;
    /// Upsert the voter's vote for the round and append its comments in one write.
    fn record_vote(&self, vote: NewVote) -> BoxFuture<'static, StorageResult<VoteEntity>>;
    fn insert_comment(&self, comment: NewComment)
    -> BoxFuture<'static, StorageResult<CommentEntity>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
