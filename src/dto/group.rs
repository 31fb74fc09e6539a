use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{GroupEntity, GroupRole, MemberEntity},
    dto::{
        format_timestamp,
        validation::{validate_group_name, validate_phone},
    },
};

/// Payload used to create a group; the caller becomes its admin.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateGroupRequest {
    #[validate(custom(function = "validate_group_name"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
}

/// Add a registered player to a group by phone number.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AddMemberRequest {
    #[validate(custom(function = "validate_phone"))]
    pub phone_number: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeRoleRequest {
    pub role: GroupRole,
}

/// Join a group through its invite code.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinGroupRequest {
    #[validate(length(equal = 6, message = "Invite codes have 6 characters"))]
    pub code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MemberSummary {
    pub user_id: Uuid,
    pub role: GroupRole,
    pub joined_at: String,
    pub is_paying: bool,
}

impl From<MemberEntity> for MemberSummary {
    fn from(member: MemberEntity) -> Self {
        Self {
            user_id: member.user_id,
            role: member.role,
            joined_at: format_timestamp(member.joined_at),
            is_paying: member.is_paying,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GroupSettingsSummary {
    pub max_members: u8,
    pub is_private: bool,
    pub require_approval: bool,
    pub default_field_id: Option<Uuid>,
    pub default_game_duration: u16,
}

/// Group as returned to its members.
#[derive(Debug, Serialize, ToSchema)]
pub struct GroupResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub avatar: Option<String>,
    pub members: Vec<MemberSummary>,
    pub settings: GroupSettingsSummary,
    pub invite_code: Option<String>,
    pub created_by: Uuid,
    pub last_activity: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<GroupEntity> for GroupResponse {
    fn from(group: GroupEntity) -> Self {
        Self {
            id: group.id,
            name: group.name,
            description: group.description,
            avatar: group.avatar,
            members: group.members.into_iter().map(MemberSummary::from).collect(),
            settings: GroupSettingsSummary {
                max_members: group.settings.max_members,
                is_private: group.settings.is_private,
                require_approval: group.settings.require_approval,
                default_field_id: group.settings.default_field_id,
                default_game_duration: group.settings.default_game_duration,
            },
            invite_code: group.invite_code,
            created_by: group.created_by,
            last_activity: format_timestamp(group.last_activity),
            is_active: group.is_active,
            created_at: format_timestamp(group.created_at),
            updated_at: format_timestamp(group.updated_at),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InviteCodeResponse {
    pub invite_code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_group_names_are_rejected() {
        let request = CreateGroupRequest {
            name: "   ".into(),
            description: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn roles_parse_from_snake_case() {
        let request: ChangeRoleRequest = serde_json::from_str(r#"{"role":"moderator"}"#).unwrap();
        assert_eq!(request.role, GroupRole::Moderator);
    }
}
