use std::time::Instant;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    error::ServiceError,
    state::{Session, SharedState},
};

/// Check `username`/`password` against the configured users and issue a bearer token.
pub fn login(
    state: &SharedState,
    username: &str,
    password: &str,
) -> Result<String, ServiceError> {
    let known = state
        .config()
        .users()
        .iter()
        .any(|user| user.username == username && user.password == password);
    if !known {
        warn!(username, "rejected login");
        return Err(ServiceError::Unauthorized(
            "incorrect username or password".into(),
        ));
    }

    purge_expired(state);
    let token = Uuid::new_v4().simple().to_string();
    state.sessions().insert(
        token.clone(),
        Session {
            username: username.to_owned(),
            expires_at: Instant::now() + state.config().token_ttl(),
        },
    );
    info!(username, "issued session token");
    Ok(token)
}

/// Username owning `token`, if the token is known and not expired.
pub fn resolve_token(state: &SharedState, token: &str) -> Result<String, ServiceError> {
    let invalid = || ServiceError::Unauthorized("could not validate credentials".into());

    let session = state
        .sessions()
        .get(token)
        .map(|entry| entry.value().clone())
        .ok_or_else(invalid)?;

    if session.expires_at <= Instant::now() {
        state.sessions().remove(token);
        debug!(username = %session.username, "session token expired");
        return Err(invalid());
    }
    Ok(session.username)
}

fn purge_expired(state: &SharedState) {
    let now = Instant::now();
    state.sessions().retain(|_, session| session.expires_at > now);
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use crate::{
        config::{AppConfig, StorageConfig, UserCredential},
        dao::{game_store::memory::MemoryGameStore, metadata::FixedMetadataProvider},
        state::AppState,
    };

    use super::*;

    fn state() -> SharedState {
        let config = AppConfig::default()
            .with_storage(StorageConfig::Memory)
            .with_users(vec![UserCredential {
                username: "alice".into(),
                password: "pw".into(),
            }]);
        AppState::new(
            config,
            Arc::new(MemoryGameStore::new()),
            Arc::new(FixedMetadataProvider::new()),
        )
    }

    #[test]
    fn issued_token_resolves_to_username() {
        let state = state();
        let token = login(&state, "alice", "pw").unwrap();
        assert_eq!(resolve_token(&state, &token).unwrap(), "alice");
    }

    #[test]
    fn wrong_password_and_unknown_token_are_unauthorized() {
        let state = state();
        assert!(matches!(
            login(&state, "alice", "nope"),
            Err(ServiceError::Unauthorized(_))
        ));
        assert!(matches!(
            resolve_token(&state, "missing"),
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[test]
    fn expired_tokens_are_dropped() {
        let state = state();
        state.sessions().insert(
            "stale".into(),
            Session {
                username: "alice".into(),
                expires_at: Instant::now() - Duration::from_secs(1),
            },
        );

        assert!(resolve_token(&state, "stale").is_err());
        assert!(!state.sessions().contains_key("stale"));
    }
}
