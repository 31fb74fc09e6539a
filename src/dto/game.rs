use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    dao::models::{
        AdditionalCost, CancellationInfo, ConfirmedPlayer, DeclinedPlayer, FieldSize, Frequency,
        GameEntity, GameStatus, Recurrence, TeamSide, WaitlistEntry,
    },
    dto::format_timestamp,
};

/// Payload used to schedule a game, optionally repeating until a given date.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[validate(schema(function = "validate_roster_bounds"))]
pub struct CreateGameRequest {
    pub group_id: Uuid,
    pub field_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub date_time: OffsetDateTime,
    /// Minutes; the configured default when omitted.
    #[serde(default)]
    #[validate(range(min = 30, max = 180))]
    pub duration: Option<u16>,
    #[serde(default)]
    pub size: Option<FieldSize>,
    #[serde(default)]
    #[validate(range(min = 4))]
    pub min_players: Option<u8>,
    #[serde(default)]
    #[validate(range(max = 30))]
    pub max_players: Option<u8>,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub notes: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub additional_costs: Vec<AdditionalCostInput>,
    #[serde(default)]
    pub recurrence: Option<RecurrenceInput>,
}

fn validate_roster_bounds(request: &CreateGameRequest) -> Result<(), ValidationError> {
    match (request.min_players, request.max_players) {
        (Some(min), Some(max)) if min > max => {
            let mut err = ValidationError::new("roster_bounds");
            err.message = Some(
                format!("min_players ({min}) cannot exceed max_players ({max})").into(),
            );
            Err(err)
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct AdditionalCostInput {
    #[validate(length(min = 1, max = 100))]
    pub description: String,
    #[validate(range(min = 0.0))]
    pub amount: f64,
}

impl From<AdditionalCostInput> for AdditionalCost {
    fn from(input: AdditionalCostInput) -> Self {
        Self {
            description: input.description,
            amount: input.amount,
        }
    }
}

/// Repeat the game until `until`, inclusive.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RecurrenceInput {
    pub frequency: Frequency,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub until: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct ListGamesQuery {
    pub group_id: Option<Uuid>,
    pub status: Option<GameStatus>,
    pub upcoming: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReasonQuery {
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConfirmedPlayerSummary {
    pub user_id: Uuid,
    pub confirmed_at: String,
    pub team: Option<TeamSide>,
    pub is_paid: bool,
}

impl From<ConfirmedPlayer> for ConfirmedPlayerSummary {
    fn from(player: ConfirmedPlayer) -> Self {
        Self {
            user_id: player.user_id,
            confirmed_at: format_timestamp(player.confirmed_at),
            team: player.team,
            is_paid: player.is_paid,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeclinedPlayerSummary {
    pub user_id: Uuid,
    pub reason: Option<String>,
    pub declined_at: String,
}

impl From<DeclinedPlayer> for DeclinedPlayerSummary {
    fn from(player: DeclinedPlayer) -> Self {
        Self {
            user_id: player.user_id,
            reason: player.reason,
            declined_at: format_timestamp(player.declined_at),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WaitlistSummary {
    pub user_id: Uuid,
    pub added_at: String,
}

impl From<WaitlistEntry> for WaitlistSummary {
    fn from(entry: WaitlistEntry) -> Self {
        Self {
            user_id: entry.user_id,
            added_at: format_timestamp(entry.added_at),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RosterSummary {
    pub min: u8,
    pub max: u8,
    pub confirmed: Vec<ConfirmedPlayerSummary>,
    pub pending: Vec<Uuid>,
    pub declined: Vec<DeclinedPlayerSummary>,
    pub waitlist: Vec<WaitlistSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TeamsSummary {
    pub team_a: Vec<Uuid>,
    pub team_b: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CostSummary {
    pub field_price: f64,
    pub per_player: f64,
    pub additional_costs: Vec<AdditionalCost>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecurrenceSummary {
    pub series_id: Uuid,
    pub frequency: Frequency,
    pub until: String,
}

impl From<Recurrence> for RecurrenceSummary {
    fn from(recurrence: Recurrence) -> Self {
        Self {
            series_id: recurrence.series_id,
            frequency: recurrence.frequency,
            until: format_timestamp(recurrence.until),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CancellationSummary {
    pub cancelled_by: Uuid,
    pub reason: Option<String>,
    pub cancelled_at: String,
}

impl From<CancellationInfo> for CancellationSummary {
    fn from(info: CancellationInfo) -> Self {
        Self {
            cancelled_by: info.cancelled_by,
            reason: info.reason,
            cancelled_at: format_timestamp(info.cancelled_at),
        }
    }
}

/// Game as exposed to REST and WebSocket clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameResponse {
    pub id: Uuid,
    pub group_id: Uuid,
    pub field_id: Uuid,
    pub size: FieldSize,
    pub date_time: String,
    pub duration: u16,
    pub status: GameStatus,
    pub roster: RosterSummary,
    pub teams: TeamsSummary,
    pub cost: CostSummary,
    pub recurring: Option<RecurrenceSummary>,
    pub cancellation: Option<CancellationSummary>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: String,
    pub updated_at: String,
}

impl From<GameEntity> for GameResponse {
    fn from(game: GameEntity) -> Self {
        let roster = game.roster;
        Self {
            id: game.id,
            group_id: game.group_id,
            field_id: game.field_id,
            size: game.size,
            date_time: format_timestamp(game.date_time),
            duration: game.duration,
            status: game.status,
            roster: RosterSummary {
                min: roster.min,
                max: roster.max,
                confirmed: roster
                    .confirmed
                    .into_iter()
                    .map(ConfirmedPlayerSummary::from)
                    .collect(),
                pending: roster.pending,
                declined: roster
                    .declined
                    .into_iter()
                    .map(DeclinedPlayerSummary::from)
                    .collect(),
                waitlist: roster
                    .waitlist
                    .into_iter()
                    .map(WaitlistSummary::from)
                    .collect(),
            },
            teams: TeamsSummary {
                team_a: game.teams.team_a,
                team_b: game.teams.team_b,
            },
            cost: CostSummary {
                field_price: game.cost.field_price,
                per_player: game.cost.per_player,
                additional_costs: game.cost.additional_costs,
            },
            recurring: game.recurring.map(RecurrenceSummary::from),
            cancellation: game.cancellation.map(CancellationSummary::from),
            notes: game.notes,
            created_by: game.created_by,
            created_at: format_timestamp(game.created_at),
            updated_at: format_timestamp(game.updated_at),
        }
    }
}

/// Occurrence of a recurring game that could not be booked.
#[derive(Debug, Serialize, ToSchema)]
pub struct SkippedOccurrence {
    pub date_time: String,
    pub reason: String,
}

/// Games created by one request, plus the occurrences that were skipped.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateGamesResponse {
    pub games: Vec<GameResponse>,
    pub skipped: Vec<SkippedOccurrence>,
}

/// Outcome of an attendance confirmation.
#[derive(Debug, Serialize, ToSchema)]
pub struct ConfirmAttendanceResponse {
    /// `confirmed` or `waitlisted`.
    pub status: String,
    /// 1-based waitlist position when waitlisted.
    pub waitlist_position: Option<usize>,
    pub game: GameResponse,
}

/// Outcome of an attendance cancellation.
#[derive(Debug, Serialize, ToSchema)]
pub struct CancelAttendanceResponse {
    /// Waitlisted player who took the freed spot.
    pub promoted: Option<Uuid>,
    pub game: GameResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> CreateGameRequest {
        serde_json::from_str(json).unwrap()
    }

    const BASE: &str = r#"{
        "group_id": "6a2f41a3-c54c-fce8-32d2-0324e1c32e22",
        "field_id": "0e1b8b7e-2f57-4c0f-9d7e-1f7a9f4f2b11",
        "date_time": "2024-06-12T19:00:00Z"
    "#;

    #[test]
    fn minimal_request_is_valid() {
        let game = request(&format!("{BASE}}}"));
        assert!(game.validate().is_ok());
        assert!(game.recurrence.is_none());
        assert_eq!(game.date_time.hour(), 19);
    }

    #[test]
    fn duration_and_roster_bounds_are_checked() {
        let game = request(&format!(r#"{BASE}, "duration": 20 }}"#));
        assert!(game.validate().is_err());

        let game = request(&format!(r#"{BASE}, "min_players": 12, "max_players": 10 }}"#));
        assert!(game.validate().is_err());

        let game = request(&format!(r#"{BASE}, "min_players": 3 }}"#));
        assert!(game.validate().is_err());
    }

    #[test]
    fn recurrence_is_parsed() {
        let game = request(&format!(
            r#"{BASE}, "recurrence": {{ "frequency": "biweekly", "until": "2024-08-01T00:00:00Z" }} }}"#
        ));
        let recurrence = game.recurrence.unwrap();
        assert_eq!(recurrence.frequency, Frequency::Biweekly);
    }
}
