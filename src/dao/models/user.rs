use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, TimestampMilliSeconds, serde_as};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// Preferred playing position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Position {
    /// Goalkeeper.
    #[serde(rename = "GK")]
    Goalkeeper,
    /// Defender.
    #[serde(rename = "DEF")]
    Defender,
    /// Midfielder.
    #[serde(rename = "MID")]
    Midfielder,
    /// Forward.
    #[serde(rename = "FWD")]
    Forward,
}

/// Lifetime statistics of a player.
/// Career numbers shown on a profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PlayerStats {
    pub games_played: u32,
    pub goals: u32,
    pub assists: u32,
    pub yellow_cards: u32,
    pub red_cards: u32,
    pub win_rate: f32,
}

/// Registered player.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserEntity {
    /// Stable identifier.
    #[serde(rename = "_id")]
    #[serde_as(as = "DisplayFromStr")]
    pub id: Uuid,
    /// Normalized mobile number (whitespace stripped), unique across users.
    pub phone_number: String,
    /// Display name.
    pub name: String,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub city: Option<String>,
    pub positions: Vec<Position>,
    pub stats: PlayerStats,
    /// Groups the user belongs to, kept in sync with group membership.
    #[serde_as(as = "Vec<DisplayFromStr>")]
    pub group_ids: Vec<Uuid>,
    pub is_active: bool,
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub created_at: OffsetDateTime,
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub updated_at: OffsetDateTime,
}

impl UserEntity {
    /// Build a freshly registered user.
    pub fn new(phone_number: String, name: String, email: Option<String>) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            phone_number,
            name,
            email,
            avatar: None,
            bio: None,
            city: None,
            positions: Vec::new(),
            stats: PlayerStats::default(),
            group_ids: Vec::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record membership of `group_id` without duplicating it.
    pub fn join_group(&mut self, group_id: Uuid) {
        if !self.group_ids.contains(&group_id) {
            self.group_ids.push(group_id);
        }
        self.updated_at = OffsetDateTime::now_utc();
    }

    /// Forget membership of `group_id`.
    pub fn leave_group(&mut self, group_id: Uuid) {
        self.group_ids.retain(|id| *id != group_id);
        self.updated_at = OffsetDateTime::now_utc();
    }
}
