use axum::{
    Form, Json, Router,
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
    routing::post,
};
use axum_valid::Valid;

use crate::{
    dto::auth::{LoginForm, TokenResponse},
    error::AppError,
    services::auth_service,
    state::SharedState,
};

const BEARER_PREFIX: &str = "Bearer ";

/// Identity attached to requests that passed [`require_session`].
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub String);

/// Login route issuing bearer tokens.
pub fn router() -> Router<SharedState> {
    Router::new().route("/token", post(login))
}

/// Exchange a username and password for a bearer token.
#[utoipa::path(
    post,
    path = "/token",
    tag = "auth",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Incorrect username or password")
    )
)]
pub async fn login(
    State(state): State<SharedState>,
    Valid(Form(form)): Valid<Form<LoginForm>>,
) -> Result<Json<TokenResponse>, AppError> {
    let token = auth_service::login(&state, &form.username, &form.password)?;
    Ok(Json(TokenResponse::bearer(token)))
}

/// Reject requests without a live bearer token and expose the caller's identity.
pub async fn require_session(
    State(state): State<SharedState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".into()))?;

    let username = auth_service::resolve_token(&state, token)?;
    req.extensions_mut().insert(AuthenticatedUser(username));
    Ok(next.run(req).await)
}
