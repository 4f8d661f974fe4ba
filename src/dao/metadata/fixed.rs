use std::{collections::HashSet, sync::Arc};

use futures::future::BoxFuture;

use super::{MetadataError, MetadataProvider, MetadataResult, MovieMetadata};

/// Deterministic provider echoing the requested title with empty enrichment.
///
/// Used for offline runs and as the test double; titles registered through
/// [`FixedMetadataProvider::failing_on`] resolve to [`MetadataError::NotFound`].
#[derive(Debug, Clone, Default)]
pub struct FixedMetadataProvider {
    unknown_titles: Arc<HashSet<String>>,
}

impl FixedMetadataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a provider that rejects every title in `titles`.
    pub fn failing_on<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            unknown_titles: Arc::new(titles.into_iter().map(Into::into).collect()),
        }
    }
}

impl MetadataProvider for FixedMetadataProvider {
    fn resolve(&self, title: String) -> BoxFuture<'static, MetadataResult<MovieMetadata>> {
        let unknown = self.unknown_titles.contains(&title);
        Box::pin(async move {
            if unknown {
                return Err(MetadataError::NotFound { title });
            }
            Ok(MovieMetadata {
                name: title,
                ..MovieMetadata::default()
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echoes_title_with_blank_fields() {
        let provider = FixedMetadataProvider::new();
        let metadata = provider.resolve("Alien".into()).await.unwrap();
        assert_eq!(metadata.name, "Alien");
        assert!(metadata.poster_url.is_empty());
        assert!(metadata.actor_summary.is_empty());
    }

    #[tokio::test]
    async fn configured_titles_are_not_found() {
        let provider = FixedMetadataProvider::failing_on(["Nope"]);
        let err = provider.resolve("Nope".into()).await.unwrap_err();
        assert!(matches!(err, MetadataError::NotFound { title } if title == "Nope"));
        assert!(provider.resolve("Heat".into()).await.is_ok());
    }
}
