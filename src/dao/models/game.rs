use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, TimestampMilliSeconds, serde_as};
use time::{Duration, OffsetDateTime};
use utoipa::ToSchema;
use uuid::Uuid;

use super::FieldSize;

/// Lifecycle of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Draft,
    Scheduled,
    Confirmed,
    Playing,
    Completed,
    Cancelled,
}

impl GameStatus {
    /// Whether the game still occupies its field slot.
    pub fn is_booking(self) -> bool {
        matches!(self, Self::Scheduled | Self::Confirmed)
    }

    /// Wire name of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Scheduled => "scheduled",
            Self::Confirmed => "confirmed",
            Self::Playing => "playing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Side of a generated match-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum TeamSide {
    A,
    B,
}

/// Player holding a spot.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmedPlayer {
    #[serde_as(as = "DisplayFromStr")]
    pub user_id: Uuid,
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub confirmed_at: OffsetDateTime,
    pub team: Option<TeamSide>,
    pub is_paid: bool,
}

/// Player who withdrew with a reason.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclinedPlayer {
    #[serde_as(as = "DisplayFromStr")]
    pub user_id: Uuid,
    pub reason: Option<String>,
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub declined_at: OffsetDateTime,
}

/// Player queued for a spot.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    #[serde_as(as = "DisplayFromStr")]
    pub user_id: Uuid,
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub added_at: OffsetDateTime,
}

/// Attendance lists of a game. See `domain::attendance` for the transitions.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    pub min: u8,
    pub max: u8,
    pub confirmed: Vec<ConfirmedPlayer>,
    #[serde_as(as = "Vec<DisplayFromStr>")]
    pub pending: Vec<Uuid>,
    pub declined: Vec<DeclinedPlayer>,
    /// Arrival order; the head is promoted first.
    pub waitlist: Vec<WaitlistEntry>,
}

impl Roster {
    /// Empty roster with the given bounds.
    pub fn new(min: u8, max: u8) -> Self {
        Self {
            min,
            max,
            confirmed: Vec::new(),
            pending: Vec::new(),
            declined: Vec::new(),
            waitlist: Vec::new(),
        }
    }
}

/// Generated match-up.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Teams {
    #[serde_as(as = "Vec<DisplayFromStr>")]
    pub team_a: Vec<Uuid>,
    #[serde_as(as = "Vec<DisplayFromStr>")]
    pub team_b: Vec<Uuid>,
}

/// Extra expense split among the players.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AdditionalCost {
    pub description: String,
    pub amount: f64,
}

/// Money side of a game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cost {
    pub field_price: f64,
    pub per_player: f64,
    pub additional_costs: Vec<AdditionalCost>,
}

/// How often a recurring game repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Weekly,
    Biweekly,
    Monthly,
}

/// Series a recurring game belongs to.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recurrence {
    #[serde_as(as = "DisplayFromStr")]
    pub series_id: Uuid,
    pub frequency: Frequency,
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub until: OffsetDateTime,
}

/// Goal scored in a finished game.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    #[serde_as(as = "DisplayFromStr")]
    pub scorer: Uuid,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub assist: Option<Uuid>,
    pub minute: Option<u8>,
}

/// Final score of a finished game.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResults {
    pub team_a_score: u8,
    pub team_b_score: u8,
    pub goals: Vec<Goal>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub mvp: Option<Uuid>,
}

/// Who called a game off and why.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancellationInfo {
    #[serde_as(as = "DisplayFromStr")]
    pub cancelled_by: Uuid,
    pub reason: Option<String>,
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub cancelled_at: OffsetDateTime,
}

/// Scheduled match of a group on a field.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEntity {
    #[serde(rename = "_id")]
    #[serde_as(as = "DisplayFromStr")]
    pub id: Uuid,
    #[serde_as(as = "DisplayFromStr")]
    pub group_id: Uuid,
    #[serde_as(as = "DisplayFromStr")]
    pub field_id: Uuid,
    pub size: FieldSize,
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub date_time: OffsetDateTime,
    /// Minutes.
    pub duration: u16,
    pub status: GameStatus,
    pub roster: Roster,
    pub teams: Teams,
    pub cost: Cost,
    pub recurring: Option<Recurrence>,
    pub results: Option<GameResults>,
    pub cancellation: Option<CancellationInfo>,
    pub notes: Option<String>,
    #[serde_as(as = "DisplayFromStr")]
    pub created_by: Uuid,
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub created_at: OffsetDateTime,
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub updated_at: OffsetDateTime,
}

impl GameEntity {
    /// Kick-off plus duration.
    pub fn end(&self) -> OffsetDateTime {
        self.date_time + Duration::minutes(i64::from(self.duration))
    }

    /// Whether `[start, end)` intersects this game's slot.
    pub fn overlaps(&self, start: OffsetDateTime, end: OffsetDateTime) -> bool {
        self.date_time < end && start < self.end()
    }

    /// Move a past scheduled game to completed. Returns whether the status changed.
    pub fn refresh_status(&mut self, now: OffsetDateTime) -> bool {
        if self.status == GameStatus::Scheduled && self.date_time < now {
            self.status = GameStatus::Completed;
            return true;
        }
        false
    }

    /// Whether kick-off is still more than `cutoff` away at `now`.
    pub fn cancellable_at(&self, now: OffsetDateTime, cutoff: Duration) -> bool {
        self.date_time - now > cutoff
    }

    /// Whether `user_id` holds a spot or waits for one.
    pub fn is_attending(&self, user_id: Uuid) -> bool {
        self.roster.confirmed.iter().any(|p| p.user_id == user_id)
            || self.roster.waitlist.iter().any(|w| w.user_id == user_id)
    }

    pub fn confirmed_ids(&self) -> Vec<Uuid> {
        self.roster.confirmed.iter().map(|p| p.user_id).collect()
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn game_at(date_time: OffsetDateTime) -> GameEntity {
        GameEntity {
            id: Uuid::new_v4(),
            group_id: Uuid::new_v4(),
            field_id: Uuid::new_v4(),
            size: FieldSize::SevenASide,
            date_time,
            duration: 90,
            status: GameStatus::Scheduled,
            roster: Roster::new(10, 14),
            teams: Teams::default(),
            cost: Cost::default(),
            recurring: None,
            results: None,
            cancellation: None,
            notes: None,
            created_by: Uuid::new_v4(),
            created_at: date_time,
            updated_at: date_time,
        }
    }

    #[test]
    fn past_scheduled_games_complete() {
        let mut game = game_at(datetime!(2024-06-01 19:00 UTC));
        assert!(game.refresh_status(datetime!(2024-06-02 10:00 UTC)));
        assert_eq!(game.status, GameStatus::Completed);
        assert!(!game.refresh_status(datetime!(2024-06-03 10:00 UTC)));
    }

    #[test]
    fn future_and_cancelled_games_keep_their_status() {
        let mut game = game_at(datetime!(2024-06-05 19:00 UTC));
        assert!(!game.refresh_status(datetime!(2024-06-02 10:00 UTC)));
        game.status = GameStatus::Cancelled;
        assert!(!game.refresh_status(datetime!(2024-06-10 10:00 UTC)));
        assert_eq!(game.status, GameStatus::Cancelled);
    }

    #[test]
    fn overlap_is_half_open() {
        let game = game_at(datetime!(2024-06-05 19:00 UTC));
        assert!(game.overlaps(datetime!(2024-06-05 20:00 UTC), datetime!(2024-06-05 21:00 UTC)));
        assert!(!game.overlaps(datetime!(2024-06-05 20:30 UTC), datetime!(2024-06-05 22:00 UTC)));
        assert!(!game.overlaps(datetime!(2024-06-05 17:30 UTC), datetime!(2024-06-05 19:00 UTC)));
    }

    #[test]
    fn cancellation_needs_strictly_more_than_the_cutoff() {
        let game = game_at(datetime!(2024-06-05 19:00 UTC));
        let cutoff = Duration::hours(2);
        assert!(game.cancellable_at(datetime!(2024-06-05 16:59 UTC), cutoff));
        assert!(!game.cancellable_at(datetime!(2024-06-05 17:00 UTC), cutoff));
        assert!(!game.cancellable_at(datetime!(2024-06-05 18:00 UTC), cutoff));
    }

    #[test]
    fn status_names_match_the_wire_format() {
        for status in [
            GameStatus::Draft,
            GameStatus::Scheduled,
            GameStatus::Confirmed,
            GameStatus::Playing,
            GameStatus::Completed,
            GameStatus::Cancelled,
        ] {
            let wire = serde_json::to_value(status).unwrap();
            assert_eq!(wire, status.as_str());
        }
    }
}
