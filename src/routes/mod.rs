use axum::{Router, middleware};

use crate::state::SharedState;

pub mod auth;
pub mod docs;
pub mod health;
pub mod players;
pub mod round;
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let protected = players::router()
        .merge(round::router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    let api_router = health::router()
        .merge(sse::router())
        .merge(auth::router())
        .merge(protected);

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
