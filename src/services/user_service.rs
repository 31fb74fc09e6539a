//! Player registration, profiles and caller identification.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{Store, models::UserEntity},
    dto::{
        user::{RegisterUserRequest, UpdateProfileRequest, UserResponse},
        validation::normalize_phone,
    },
    error::ServiceError,
    state::SharedState,
};

/// Caller resolved from the `X-User-Id` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActingUser {
    pub id: Uuid,
    pub name: String,
}

impl From<&UserEntity> for ActingUser {
    fn from(user: &UserEntity) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
        }
    }
}

/// Resolve a caller id to a registered user.
pub async fn identify(state: &SharedState, user_id: Uuid) -> Result<ActingUser, ServiceError> {
    let store = state.store().await?;
    let user = store
        .find_user(user_id)
        .await?
        .ok_or_else(|| ServiceError::Unauthorized(format!("unknown user `{user_id}`")))?;
    Ok(ActingUser::from(&user))
}

pub async fn register(
    state: &SharedState,
    payload: RegisterUserRequest,
) -> Result<UserResponse, ServiceError> {
    let store = state.store().await?;
    let phone = normalize_phone(&payload.phone_number);
    let email = payload
        .email
        .map(|email| email.trim().to_lowercase())
        .filter(|email| !email.is_empty());

    let user = UserEntity::new(phone, payload.name.trim().to_owned(), email);
    store
        .insert_user(user.clone())
        .await
        .map_err(|err| match ServiceError::from(err) {
            ServiceError::InvalidState(_) => {
                ServiceError::InvalidState("phone number already registered".into())
            }
            other => other,
        })?;

    info!(user_id = %user.id, "user registered");
    Ok(user.into())
}

pub async fn get_profile(state: &SharedState, user_id: Uuid) -> Result<UserResponse, ServiceError> {
    let store = state.store().await?;
    Ok(load_user(&store, user_id).await?.into())
}

/// Apply the provided profile changes to the acting user.
pub async fn update_profile(
    state: &SharedState,
    actor: &ActingUser,
    payload: UpdateProfileRequest,
) -> Result<UserResponse, ServiceError> {
    let store = state.store().await?;
    state
        .serialized(actor.id, || async move {
            let mut user = load_user(&store, actor.id).await?;
            if let Some(name) = payload.name {
                user.name = name.trim().to_owned();
            }
            if let Some(bio) = payload.bio {
                user.bio = Some(bio);
            }
            if let Some(city) = payload.city {
                user.city = Some(city.trim().to_owned());
            }
            if let Some(positions) = payload.positions {
                user.positions = positions;
            }
            user.updated_at = OffsetDateTime::now_utc();
            store.save_user(user.clone()).await?;
            Ok(user.into())
        })
        .await
}

/// Load a user or fail with [`ServiceError::NotFound`].
pub(crate) async fn load_user(
    store: &Arc<dyn Store>,
    user_id: Uuid,
) -> Result<UserEntity, ServiceError> {
    store
        .find_user(user_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("user `{user_id}` not found")))
}
