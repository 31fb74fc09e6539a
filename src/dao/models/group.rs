use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, TimestampMilliSeconds, serde_as};
use thiserror::Error;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

const INVITE_CODE_LENGTH: usize = 6;
const INVITE_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Role of a member inside a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GroupRole {
    Admin,
    Moderator,
    Member,
}

/// Membership record.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberEntity {
    #[serde_as(as = "DisplayFromStr")]
    pub user_id: Uuid,
    pub role: GroupRole,
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub joined_at: OffsetDateTime,
    /// Whether the member shares the field costs.
    pub is_paying: bool,
}

/// Group-wide preferences.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSettings {
    pub max_members: u8,
    pub is_private: bool,
    pub require_approval: bool,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub default_field_id: Option<Uuid>,
    pub default_game_duration: u16,
}

impl Default for GroupSettings {
    fn default() -> Self {
        Self {
            max_members: 30,
            is_private: false,
            require_approval: true,
            default_field_id: None,
            default_game_duration: 90,
        }
    }
}

/// Reasons a membership change is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MembershipError {
    #[error("user is already a member of this group")]
    AlreadyMember,
    #[error("group is full ({max} members)")]
    GroupFull { max: u8 },
    #[error("user is not a member of this group")]
    NotMember,
    #[error("the group must keep at least one admin; promote another member first")]
    LastAdmin,
}

/// Friend group organizing games together.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupEntity {
    #[serde(rename = "_id")]
    #[serde_as(as = "DisplayFromStr")]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub avatar: Option<String>,
    pub members: Vec<MemberEntity>,
    pub settings: GroupSettings,
    /// Omitted when unset so the sparse unique index ignores it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invite_code: Option<String>,
    #[serde_as(as = "DisplayFromStr")]
    pub created_by: Uuid,
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub last_activity: OffsetDateTime,
    pub is_active: bool,
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub created_at: OffsetDateTime,
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub updated_at: OffsetDateTime,
}

impl GroupEntity {
    /// Create a group whose creator is its only admin.
    pub fn new(name: String, description: Option<String>, created_by: Uuid) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            name,
            description,
            avatar: None,
            members: vec![MemberEntity {
                user_id: created_by,
                role: GroupRole::Admin,
                joined_at: now,
                is_paying: true,
            }],
            settings: GroupSettings::default(),
            invite_code: None,
            created_by,
            last_activity: now,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn member(&self, user_id: Uuid) -> Option<&MemberEntity> {
        self.members.iter().find(|member| member.user_id == user_id)
    }

    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.member(user_id).is_some()
    }

    pub fn is_admin(&self, user_id: Uuid) -> bool {
        self.member(user_id)
            .is_some_and(|member| member.role == GroupRole::Admin)
    }

    fn admin_count(&self) -> usize {
        self.members
            .iter()
            .filter(|member| member.role == GroupRole::Admin)
            .count()
    }

    /// Every member except `user_id`.
    pub fn other_member_ids(&self, user_id: Uuid) -> Vec<Uuid> {
        self.members
            .iter()
            .map(|member| member.user_id)
            .filter(|id| *id != user_id)
            .collect()
    }

    /// Add `user_id` with the given role.
    pub fn add_member(&mut self, user_id: Uuid, role: GroupRole) -> Result<(), MembershipError> {
        if self.is_member(user_id) {
            return Err(MembershipError::AlreadyMember);
        }
        if self.members.len() >= usize::from(self.settings.max_members) {
            return Err(MembershipError::GroupFull {
                max: self.settings.max_members,
            });
        }
        self.members.push(MemberEntity {
            user_id,
            role,
            joined_at: OffsetDateTime::now_utc(),
            is_paying: true,
        });
        self.touch();
        Ok(())
    }

    /// Remove `user_id`, refusing to drop the last admin.
    pub fn remove_member(&mut self, user_id: Uuid) -> Result<(), MembershipError> {
        let member = self.member(user_id).ok_or(MembershipError::NotMember)?;
        if member.role == GroupRole::Admin && self.admin_count() == 1 {
            return Err(MembershipError::LastAdmin);
        }
        self.members.retain(|member| member.user_id != user_id);
        self.touch();
        Ok(())
    }

    /// Change the role of an existing member.
    pub fn set_role(&mut self, user_id: Uuid, role: GroupRole) -> Result<(), MembershipError> {
        let demotes_last_admin =
            self.is_admin(user_id) && role != GroupRole::Admin && self.admin_count() == 1;
        if demotes_last_admin {
            return Err(MembershipError::LastAdmin);
        }
        let member = self
            .members
            .iter_mut()
            .find(|member| member.user_id == user_id)
            .ok_or(MembershipError::NotMember)?;
        member.role = role;
        self.touch();
        Ok(())
    }

    /// Generate and store a fresh invite code.
    pub fn regenerate_invite_code(&mut self) -> String {
        let mut rng = rand::rng();
        let code: String = (0..INVITE_CODE_LENGTH)
            .map(|_| {
                let index = rng.random_range(0..INVITE_CODE_ALPHABET.len());
                char::from(INVITE_CODE_ALPHABET[index])
            })
            .collect();
        self.invite_code = Some(code.clone());
        self.touch();
        code
    }

    /// Refresh the activity timestamps.
    pub fn touch(&mut self) {
        let now = OffsetDateTime::now_utc();
        self.last_activity = now;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group_with_admin() -> (GroupEntity, Uuid) {
        let admin = Uuid::new_v4();
        (GroupEntity::new("Tuesday 5s".into(), None, admin), admin)
    }

    #[test]
    fn creator_is_the_only_admin() {
        let (group, admin) = group_with_admin();
        assert!(group.is_admin(admin));
        assert_eq!(group.members.len(), 1);
    }

    #[test]
    fn adding_twice_is_rejected() {
        let (mut group, _) = group_with_admin();
        let user = Uuid::new_v4();
        group.add_member(user, GroupRole::Member).unwrap();
        assert_eq!(
            group.add_member(user, GroupRole::Member),
            Err(MembershipError::AlreadyMember)
        );
    }

    #[test]
    fn full_group_rejects_new_members() {
        let (mut group, _) = group_with_admin();
        group.settings.max_members = 2;
        group.add_member(Uuid::new_v4(), GroupRole::Member).unwrap();
        assert_eq!(
            group.add_member(Uuid::new_v4(), GroupRole::Member),
            Err(MembershipError::GroupFull { max: 2 })
        );
    }

    #[test]
    fn sole_admin_cannot_leave_or_be_demoted() {
        let (mut group, admin) = group_with_admin();
        assert_eq!(group.remove_member(admin), Err(MembershipError::LastAdmin));
        assert_eq!(
            group.set_role(admin, GroupRole::Member),
            Err(MembershipError::LastAdmin)
        );

        let other = Uuid::new_v4();
        group.add_member(other, GroupRole::Member).unwrap();
        group.set_role(other, GroupRole::Admin).unwrap();
        group.remove_member(admin).unwrap();
        assert!(!group.is_member(admin));
    }

    #[test]
    fn invite_codes_are_six_uppercase_alphanumerics() {
        let (mut group, _) = group_with_admin();
        let code = group.regenerate_invite_code();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        assert_eq!(group.invite_code.as_deref(), Some(code.as_str()));
    }
}
