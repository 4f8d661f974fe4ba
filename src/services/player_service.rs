use tracing::info;

use crate::{
    dao::models::PlayerEntity, dto::round::UserPublic, error::ServiceError,
    services::sse_events, state::SharedState,
};

/// Register `name` as a player; an already registered name returns the existing player.
pub async fn register_player(
    state: &SharedState,
    name: String,
) -> Result<UserPublic, ServiceError> {
    let name = name.trim().to_owned();
    if name.is_empty() {
        return Err(ServiceError::InvalidInput(
            "player name must not be empty".into(),
        ));
    }

    let player = state.run_exclusive(|| register_locked(state, name)).await?;
    Ok(UserPublic::from(&player))
}

/// Register the authenticated caller, refusing to register anyone else.
pub async fn register_as(
    state: &SharedState,
    acting_user: &str,
    name: String,
) -> Result<UserPublic, ServiceError> {
    if name.trim() != acting_user {
        return Err(ServiceError::InvalidInput(format!(
            "`{acting_user}` cannot register player `{name}`"
        )));
    }
    register_player(state, name).await
}

async fn register_locked(
    state: &SharedState,
    name: String,
) -> Result<PlayerEntity, ServiceError> {
    let store = state.store();
    if let Some(existing) = store.find_player_by_name(name.clone()).await? {
        return Ok(existing);
    }

    let player = store.insert_player(name).await?;
    info!(player_id = player.id, name = %player.name, "player registered");
    sse_events::broadcast_player_registered(state.public_sse(), &player);
    Ok(player)
}
