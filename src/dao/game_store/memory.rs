use std::{sync::Arc, time::SystemTime};

use futures::future::BoxFuture;
use tokio::sync::RwLock;

use crate::dao::{
    game_store::{GameStore, Tables},
    models::{
        CommentEntity, MovieEntity, NewComment, NewSubmission, NewVote, PlayerEntity,
        RoundAggregate, RoundEntity, RoundId, SubmissionEntity, SubmissionId, VoteEntity,
    },
    storage::StorageResult,
};

/// Volatile store keeping every row in process memory.
#[derive(Clone, Default)]
pub struct MemoryGameStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T, F>(&self, f: F) -> BoxFuture<'static, StorageResult<T>>
    where
        T: Send + 'static,
        F: FnOnce(&Tables) -> T + Send + 'static,
    {
        let tables = self.tables.clone();
        Box::pin(async move {
            let guard = tables.read().await;
            Ok(f(&guard))
        })
    }

    fn write<T, F>(&self, f: F) -> BoxFuture<'static, StorageResult<T>>
    where
        T: Send + 'static,
        F: FnOnce(&mut Tables) -> StorageResult<T> + Send + 'static,
    {
        let tables = self.tables.clone();
        Box::pin(async move {
            let mut guard = tables.write().await;
            f(&mut guard)
        })
    }
}

impl GameStore for MemoryGameStore {
    fn insert_player(&self, name: String) -> BoxFuture<'static, StorageResult<PlayerEntity>> {
        self.write(move |tables| tables.insert_player(name))
    }

    fn list_players(&self) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        self.read(|tables| tables.players())
    }

    fn find_player_by_name(
        &self,
        name: String,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        self.read(move |tables| tables.find_player_by_name(&name))
    }

    fn insert_round(&self, prompt: String) -> BoxFuture<'static, StorageResult<RoundEntity>> {
        self.write(move |tables| Ok(tables.insert_round(prompt, SystemTime::now())))
    }

    fn latest_round(&self) -> BoxFuture<'static, StorageResult<Option<RoundEntity>>> {
        self.read(|tables| tables.latest_round())
    }

    fn load_round(
        &self,
        id: RoundId,
    ) -> BoxFuture<'static, StorageResult<Option<RoundAggregate>>> {
        self.read(move |tables| tables.load_round(id))
    }

    fn list_rounds(&self) -> BoxFuture<'static, StorageResult<Vec<RoundAggregate>>> {
        self.read(|tables| tables.list_rounds())
    }

    fn find_movie_by_name(
        &self,
        name: String,
    ) -> BoxFuture<'static, StorageResult<Option<MovieEntity>>> {
        self.read(move |tables| tables.find_movie_by_name(&name))
    }

    fn find_submission(
        &self,
        id: SubmissionId,
    ) -> BoxFuture<'static, StorageResult<Option<SubmissionEntity>>> {
        self.read(move |tables| tables.find_submission(id))
    }

    fn insert_submission(
        &self,
        submission: NewSubmission,
    ) -> BoxFuture<'static, StorageResult<SubmissionEntity>> {
        self.write(move |tables| tables.insert_submission(submission))
    }

    fn record_vote(&self, vote: NewVote) -> BoxFuture<'static, StorageResult<VoteEntity>> {
        self.write(move |tables| tables.record_vote(vote))
    }

    fn insert_comment(
        &self,
        comment: NewComment,
    ) -> BoxFuture<'static, StorageResult<CommentEntity>> {
        self.write(move |tables| tables.insert_comment(comment))
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
