use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the movie night backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::auth::login,
        crate::routes::players::register,
        crate::routes::round::get_state,
        crate::routes::round::create_round,
        crate::routes::round::get_round,
        crate::routes::round::list_rounds,
        crate::routes::round::submit,
        crate::routes::round::vote,
        crate::routes::round::add_comment,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::auth::LoginForm,
            crate::dto::auth::TokenResponse,
            crate::dto::auth::UserCreate,
            crate::dto::phase::CurrentState,
            crate::dto::phase::VisiblePhase,
            crate::dto::phase::PlayerState,
            crate::dto::round::RoundCreate,
            crate::dto::round::SubmissionCreate,
            crate::dto::round::VoteCreate,
            crate::dto::round::CommentCreate,
            crate::dto::round::UserPublic,
            crate::dto::round::MoviePublic,
            crate::dto::round::CommentPublic,
            crate::dto::round::SubmissionPublic,
            crate::dto::round::RoundPublic,
            crate::dto::sse::Handshake,
            crate::dto::sse::PhaseChangedEvent,
            crate::dto::sse::RoundUpdatedEvent,
            crate::dto::sse::PlayerRegisteredEvent,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "auth", description = "Login and session tokens"),
        (name = "players", description = "Player registration"),
        (name = "round", description = "Round lifecycle: submissions, votes and comments"),
    )
)]
pub struct ApiDoc;

/// Declares the `bearer` scheme referenced by the protected routes.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthcheck",
            "/sse/public",
            "/token",
            "/users",
            "/state",
            "/round",
            "/rounds",
            "/submissions",
            "/vote",
            "/comments",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let round = &doc.paths.paths["/round"];
        assert!(round.get.is_some() && round.post.is_some());
    }
}
