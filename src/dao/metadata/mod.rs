//! Movie metadata collaborators used when a submission names a movie for the first time.

mod fixed;
#[cfg(feature = "omdb-metadata")]
pub mod omdb;

use std::error::Error;

use futures::future::BoxFuture;
use thiserror::Error;

use crate::dao::models::MovieDraft;

pub use self::fixed::FixedMetadataProvider;

/// Result alias for metadata lookups.
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Enriched fields describing a movie.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MovieMetadata {
    pub name: String,
    pub poster_url: String,
    pub description: String,
    pub genre: String,
    pub release_date: String,
    pub actor_summary: String,
    pub director_summary: String,
}

impl MovieMetadata {
    /// Turn the lookup result into a movie row draft, remembering the title the player typed.
    pub fn into_draft(self, requested_name: String) -> MovieDraft {
        MovieDraft {
            name: self.name,
            requested_name,
            poster_url: self.poster_url,
            description: self.description,
            genre: self.genre,
            release_date: self.release_date,
            actors: self.actor_summary,
            directors: self.director_summary,
        }
    }
}

/// Failures reported by a metadata provider.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The provider has no movie with this title.
    #[error("no movie found for `{title}`")]
    NotFound { title: String },
    /// The provider could not be reached or answered garbage.
    #[error("metadata provider unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The lookup did not finish in time.
    #[error("metadata lookup for `{title}` timed out")]
    Timeout { title: String },
}

impl MetadataError {
    /// Construct an unavailable error from any transport failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        MetadataError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}

/// Capability resolving a free-form title into enriched movie fields.
pub trait MetadataProvider: Send + Sync {
    fn resolve(&self, title: String) -> BoxFuture<'static, MetadataResult<MovieMetadata>>;
}
