//! File-backed store persisting a full JSON snapshot after every committed write.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};

use futures::future::BoxFuture;
use tokio::{fs, sync::RwLock};
use tracing::{debug, info};

use crate::dao::{
    game_store::{GameStore, Tables},
    models::{
        CommentEntity, MovieEntity, NewComment, NewSubmission, NewVote, PlayerEntity,
        RoundAggregate, RoundEntity, RoundId, SubmissionEntity, SubmissionId, VoteEntity,
    },
    storage::{StorageError, StorageResult},
};

/// Store keeping rows in memory and mirroring them to a JSON document on disk.
///
/// Mutations are applied to a copy of the tables, written to a temporary file,
/// renamed over the data file and only then swapped in, so a failed write
/// leaves both the file and the in-memory view untouched.
#[derive(Clone)]
pub struct JsonFileGameStore {
    tables: Arc<RwLock<Tables>>,
    path: Arc<PathBuf>,
}

impl JsonFileGameStore {
    /// Open the data file at `path`, starting empty when it does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let tables = match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<Tables>(&bytes).map_err(|source| {
                StorageError::unavailable(
                    format!("failed to parse data file `{}`", path.display()),
                    source,
                )
            })?,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "data file not found; starting with empty store");
                Tables::default()
            }
            Err(err) => {
                return Err(StorageError::unavailable(
                    format!("failed to read data file `{}`", path.display()),
                    err,
                ));
            }
        };

        Ok(Self {
            tables: Arc::new(RwLock::new(tables)),
            path: Arc::new(path),
        })
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
        let path = self.path.clone();
        Box::pin(async move {
            let mut guard = tables.write().await;
            let mut next = guard.clone();
            let value = f(&mut next)?;
            persist(&path, &next).await?;
            *guard = next;
            Ok(value)
        })
    }
}

async fn persist(path: &Path, tables: &Tables) -> StorageResult<()> {
    let bytes = serde_json::to_vec_pretty(tables).map_err(|source| {
        StorageError::unavailable("failed to serialize data snapshot".into(), source)
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(|source| {
            StorageError::unavailable(
                format!("failed to create data directory `{}`", parent.display()),
                source,
            )
        })?;
    }

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &bytes).await.map_err(|source| {
        StorageError::unavailable(format!("failed to write `{}`", tmp.display()), source)
    })?;
    fs::rename(&tmp, path).await.map_err(|source| {
        StorageError::unavailable(format!("failed to replace `{}`", path.display()), source)
    })?;

    debug!(path = %path.display(), size = bytes.len(), "data snapshot persisted");
    Ok(())
}

impl GameStore for JsonFileGameStore {
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
        let path = self.path.clone();
        Box::pin(async move {
            match fs::metadata(path.as_path()).await {
                Ok(_) => Ok(()),
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
                Err(err) => Err(StorageError::unavailable(
                    format!("cannot stat data file `{}`", path.display()),
                    err,
                )),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rows_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data.json");

        let store = JsonFileGameStore::open(&path).await.unwrap();
        store.insert_player("alice".into()).await.unwrap();
        store.insert_round("first prompt".into()).await.unwrap();

        let reopened = JsonFileGameStore::open(&path).await.unwrap();
        let players = reopened.list_players().await.unwrap();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].name, "alice");
        let round = reopened.latest_round().await.unwrap().unwrap();
        assert_eq!(round.prompt, "first prompt");
    }

    #[tokio::test]
    async fn rejected_write_does_not_touch_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");

        let store = JsonFileGameStore::open(&path).await.unwrap();
        store.insert_player("alice".into()).await.unwrap();
        let before = std::fs::read(&path).unwrap();

        let err = store.insert_player("alice".into()).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn corrupted_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, b"{not json").unwrap();

        let err = JsonFileGameStore::open(&path).await.err().unwrap();
        assert!(matches!(err, StorageError::Unavailable { .. }));
    }
}
