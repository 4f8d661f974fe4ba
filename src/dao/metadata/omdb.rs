//! OMDb (<https://www.omdbapi.com>) backed metadata provider.

use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::{MetadataError, MetadataProvider, MetadataResult, MovieMetadata};

/// Placeholder OMDb uses for missing fields.
const NOT_AVAILABLE: &str = "N/A";

/// Runtime configuration describing how to reach OMDb.
#[derive(Debug, Clone)]
pub struct OmdbConfig {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Error)]
#[error("unexpected OMDb response status {status}")]
struct StatusError {
    status: StatusCode,
}

#[derive(Clone)]
pub struct OmdbMetadataProvider {
    client: Client,
    base_url: Arc<str>,
    api_key: Arc<str>,
}

impl OmdbMetadataProvider {
    /// Build an HTTP client for the configured endpoint.
    pub fn new(config: OmdbConfig) -> MetadataResult<Self> {
        let client = Client::builder().build().map_err(|source| {
            MetadataError::unavailable("failed to build OMDb client".into(), source)
        })?;

        Ok(Self {
            client,
            base_url: Arc::from(config.base_url.trim_end_matches('/')),
            api_key: Arc::from(config.api_key),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OmdbResponse {
    response: String,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    released: Option<String>,
    #[serde(default)]
    genre: Option<String>,
    #[serde(default)]
    director: Option<String>,
    #[serde(default)]
    actors: Option<String>,
    #[serde(default)]
    plot: Option<String>,
    #[serde(default)]
    poster: Option<String>,
}

fn field(value: Option<String>) -> String {
    value.filter(|v| v != NOT_AVAILABLE).unwrap_or_default()
}

impl OmdbResponse {
    fn into_metadata(self, requested: String) -> MetadataResult<MovieMetadata> {
        if !self.response.eq_ignore_ascii_case("true") {
            debug!(title = %requested, error = ?self.error, "OMDb rejected lookup");
            return Err(MetadataError::NotFound { title: requested });
        }

        Ok(MovieMetadata {
            name: self.title.unwrap_or(requested),
            poster_url: field(self.poster),
            description: field(self.plot),
            genre: field(self.genre),
            release_date: field(self.released),
            actor_summary: field(self.actors),
            director_summary: field(self.director),
        })
    }
}

impl MetadataProvider for OmdbMetadataProvider {
    fn resolve(&self, title: String) -> BoxFuture<'static, MetadataResult<MovieMetadata>> {
        let request = self
            .client
            .get(format!("{}/", self.base_url))
            .query(&[("t", title.as_str()), ("apikey", &*self.api_key)]);

        Box::pin(async move {
            let response = request.send().await.map_err(|source| {
                MetadataError::unavailable(format!("failed to query OMDb for `{title}`"), source)
            })?;

            let status = response.status();
            if !status.is_success() {
                return Err(MetadataError::unavailable(
                    format!("OMDb lookup for `{title}` failed"),
                    StatusError { status },
                ));
            }

            let payload = response.json::<OmdbResponse>().await.map_err(|source| {
                MetadataError::unavailable(
                    format!("failed to decode OMDb response for `{title}`"),
                    source,
                )
            })?;

            payload.into_metadata(title)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_found_movie_and_drops_placeholders() {
        let payload: OmdbResponse = serde_json::from_str(
            r#"{
                "Title": "Alien",
                "Released": "22 Jun 1979",
                "Genre": "Horror, Sci-Fi",
                "Director": "Ridley Scott",
                "Actors": "Sigourney Weaver, Tom Skerritt",
                "Plot": "A crew meets a creature.",
                "Poster": "N/A",
                "Response": "True"
            }"#,
        )
        .unwrap();

        let metadata = payload.into_metadata("alien".into()).unwrap();
        assert_eq!(metadata.name, "Alien");
        assert_eq!(metadata.director_summary, "Ridley Scott");
        assert_eq!(metadata.poster_url, "");
    }

    #[test]
    fn negative_response_is_not_found() {
        let payload: OmdbResponse =
            serde_json::from_str(r#"{"Response": "False", "Error": "Movie not found!"}"#).unwrap();

        let err = payload.into_metadata("zzz".into()).unwrap_err();
        assert!(matches!(err, MetadataError::NotFound { title } if title == "zzz"));
    }
}
