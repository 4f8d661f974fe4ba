use axum::{
    Extension, Json, Router,
    extract::State,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::{
        phase::CurrentState,
        round::{
            CommentCreate, CommentPublic, RoundCreate, RoundPublic, SubmissionCreate,
            SubmissionPublic, VoteCreate,
        },
    },
    error::AppError,
    routes::auth::AuthenticatedUser,
    services::round_service,
    state::SharedState,
};

/// Round lifecycle routes; expects the session layer on top.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/state", get(get_state))
        .route("/round", get(get_round).post(create_round))
        .route("/rounds", get(list_rounds))
        .route("/submissions", post(submit))
        .route("/vote", post(vote))
        .route("/comments", post(add_comment))
}

/// Lifecycle phase and whether it still waits on the caller.
#[utoipa::path(
    get,
    path = "/state",
    tag = "round",
    security(("bearer" = [])),
    responses((status = 200, description = "Current state", body = CurrentState))
)]
pub async fn get_state(
    State(state): State<SharedState>,
    Extension(AuthenticatedUser(username)): Extension<AuthenticatedUser>,
) -> Result<Json<CurrentState>, AppError> {
    Ok(Json(round_service::get_status(&state, &username).await?))
}

/// Open a new round, whatever the current phase.
#[utoipa::path(
    post,
    path = "/round",
    tag = "round",
    security(("bearer" = [])),
    request_body = RoundCreate,
    responses(
        (status = 200, description = "Round opened", body = CurrentState),
        (status = 400, description = "Blank prompt")
    )
)]
pub async fn create_round(
    State(state): State<SharedState>,
    Extension(AuthenticatedUser(username)): Extension<AuthenticatedUser>,
    Valid(Json(payload)): Valid<Json<RoundCreate>>,
) -> Result<Json<CurrentState>, AppError> {
    Ok(Json(
        round_service::create_round(&state, &username, payload.prompt).await?,
    ))
}

/// Current round with its submissions.
#[utoipa::path(
    get,
    path = "/round",
    tag = "round",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Current round", body = RoundPublic),
        (status = 404, description = "No round created yet")
    )
)]
pub async fn get_round(State(state): State<SharedState>) -> Result<Json<RoundPublic>, AppError> {
    Ok(Json(round_service::get_current_round(&state).await?))
}

/// Every round, most recent first.
#[utoipa::path(
    get,
    path = "/rounds",
    tag = "round",
    security(("bearer" = [])),
    responses((status = 200, description = "Round history", body = [RoundPublic]))
)]
pub async fn list_rounds(
    State(state): State<SharedState>,
) -> Result<Json<Vec<RoundPublic>>, AppError> {
    Ok(Json(round_service::list_rounds(&state).await?))
}

/// Nominate a movie for the current round.
#[utoipa::path(
    post,
    path = "/submissions",
    tag = "round",
    security(("bearer" = [])),
    request_body = SubmissionCreate,
    responses(
        (status = 200, description = "Submission accepted", body = SubmissionPublic),
        (status = 404, description = "No round, unknown player or unknown movie"),
        (status = 409, description = "Not in the submission phase, or already submitted"),
        (status = 502, description = "Movie lookup failed")
    )
)]
pub async fn submit(
    State(state): State<SharedState>,
    Extension(AuthenticatedUser(username)): Extension<AuthenticatedUser>,
    Valid(Json(payload)): Valid<Json<SubmissionCreate>>,
) -> Result<Json<SubmissionPublic>, AppError> {
    let submission =
        round_service::submit(&state, &username, payload.name, payload.comment).await?;
    Ok(Json(submission))
}

/// Vote for a submission of the current round.
#[utoipa::path(
    post,
    path = "/vote",
    tag = "round",
    security(("bearer" = [])),
    request_body = VoteCreate,
    responses(
        (status = 200, description = "Vote recorded", body = CurrentState),
        (status = 400, description = "Submission is not part of the current round"),
        (status = 404, description = "Unknown player or submission"),
        (status = 409, description = "Not in the voting phase")
    )
)]
pub async fn vote(
    State(state): State<SharedState>,
    Extension(AuthenticatedUser(username)): Extension<AuthenticatedUser>,
    Valid(Json(payload)): Valid<Json<VoteCreate>>,
) -> Result<Json<CurrentState>, AppError> {
    let status = round_service::vote(
        &state,
        &username,
        payload.submission_id,
        payload.all_comments,
    )
    .await?;
    Ok(Json(status))
}

/// Comment on any submission.
#[utoipa::path(
    post,
    path = "/comments",
    tag = "round",
    security(("bearer" = [])),
    request_body = CommentCreate,
    responses(
        (status = 200, description = "Comment stored", body = CommentPublic),
        (status = 404, description = "Unknown player or submission")
    )
)]
pub async fn add_comment(
    State(state): State<SharedState>,
    Extension(AuthenticatedUser(username)): Extension<AuthenticatedUser>,
    Valid(Json(payload)): Valid<Json<CommentCreate>>,
) -> Result<Json<CommentPublic>, AppError> {
    let comment =
        round_service::add_comment(&state, &username, payload.submission_id, payload.text)
            .await?;
    Ok(Json(comment))
}
