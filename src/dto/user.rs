use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{PlayerStats, Position, UserEntity},
    dto::{
        format_timestamp,
        validation::{validate_person_name, validate_phone},
    },
};

/// Payload used to register a new player.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RegisterUserRequest {
    #[validate(custom(function = "validate_phone"))]
    #[schema(example = "+351 912 345 678")]
    pub phone_number: String,
    #[validate(custom(function = "validate_person_name"))]
    pub name: String,
    #[serde(default)]
    #[validate(email)]
    pub email: Option<String>,
}

/// Profile changes applied to the acting user. Omitted fields stay untouched.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_person_name"))]
    pub name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 200, message = "Bio must be at most 200 characters"))]
    pub bio: Option<String>,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[serde(default)]
    pub positions: Option<Vec<Position>>,
}

/// Public projection of a player profile.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub phone_number: String,
    pub name: String,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub city: Option<String>,
    pub positions: Vec<Position>,
    pub stats: PlayerStats,
    pub group_ids: Vec<Uuid>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<UserEntity> for UserResponse {
    fn from(user: UserEntity) -> Self {
        Self {
            id: user.id,
            phone_number: user.phone_number,
            name: user.name,
            email: user.email,
            avatar: user.avatar,
            bio: user.bio,
            city: user.city,
            positions: user.positions,
            stats: user.stats,
            group_ids: user.group_ids,
            is_active: user.is_active,
            created_at: format_timestamp(user.created_at),
            updated_at: format_timestamp(user.updated_at),
        }
    }
}
