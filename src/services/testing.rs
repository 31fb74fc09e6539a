//! Fixtures for service tests running against the in-memory store.

use std::sync::Arc;

use crate::{
    config::AppConfig,
    dao::memory::MemoryStore,
    dto::user::RegisterUserRequest,
    services::user_service::{self, ActingUser},
    state::{AppState, SharedState},
};

pub(crate) async fn memory_state() -> SharedState {
    AppState::with_store(AppConfig::default(), Arc::new(MemoryStore::new())).await
}

/// Register a player and resolve it as a caller.
pub(crate) async fn player(state: &SharedState, phone: &str, name: &str) -> ActingUser {
    let user = user_service::register(
        state,
        RegisterUserRequest {
            phone_number: phone.into(),
            name: name.into(),
            email: None,
        },
    )
    .await
    .unwrap();
    user_service::identify(state, user.id).await.unwrap()
}
