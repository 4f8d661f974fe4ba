use axum::{Extension, Json, Router, extract::State, routing::post};
use axum_valid::Valid;

use crate::{
    dto::{auth::UserCreate, round::UserPublic},
    error::AppError,
    routes::auth::AuthenticatedUser,
    services::player_service,
    state::SharedState,
};

/// Player registration routes; expects the session layer on top.
pub fn router() -> Router<SharedState> {
    Router::new().route("/users", post(register))
}

/// Register the authenticated user as a player.
#[utoipa::path(
    post,
    path = "/users",
    tag = "players",
    security(("bearer" = [])),
    request_body = UserCreate,
    responses(
        (status = 200, description = "Player registered (or already known)", body = UserPublic),
        (status = 400, description = "Name differs from the authenticated user")
    )
)]
pub async fn register(
    State(state): State<SharedState>,
    Extension(AuthenticatedUser(username)): Extension<AuthenticatedUser>,
    Valid(Json(payload)): Valid<Json<UserCreate>>,
) -> Result<Json<UserPublic>, AppError> {
    let player = player_service::register_as(&state, &username, payload.name).await?;
    Ok(Json(player))
}
