//! Games: scheduling (single or recurring), attendance with waitlist, cancellation
//! and team generation. Every roster change runs under the game's aggregate gate.

use std::sync::Arc;

use time::{Duration, OffsetDateTime};
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{
        Store,
        models::{
            AdditionalCost, CancellationInfo, Cost, FieldEntity, FieldSize, GameEntity,
            GameStatus, NotificationData, NotificationKind, Recurrence, Roster, Teams,
        },
    },
    domain::{
        attendance::{Cancellation, Confirmation},
        availability, clock::booking_end, pricing, recurrence, teams,
    },
    dto::{
        format_timestamp,
        game::{
            CancelAttendanceResponse, ConfirmAttendanceResponse, CreateGameRequest,
            CreateGamesResponse, GameResponse, ListGamesQuery, SkippedOccurrence,
        },
    },
    error::ServiceError,
    services::{
        field_service::{games_overlapping, load_field},
        group_service::{self, load_group, require_admin, require_member},
        notification_service, room_events,
        user_service::ActingUser,
    },
    state::SharedState,
};

/// Schedule a game, or a whole series when a recurrence is given.
///
/// A single game on an unavailable slot is refused; unavailable occurrences of a series
/// are skipped and reported.
pub async fn create_game(
    state: &SharedState,
    actor: &ActingUser,
    payload: CreateGameRequest,
) -> Result<CreateGamesResponse, ServiceError> {
    let store = state.store().await?;
    let config = state.config();

    let group = load_group(&store, payload.group_id).await?;
    require_admin(&group, actor.id)?;
    let field = load_field(&store, payload.field_id).await?;

    let duration = payload
        .duration
        .unwrap_or(config.default_game_duration_minutes);
    let size = payload.size.unwrap_or(config.default_field_size);
    let min = payload.min_players.unwrap_or(config.default_min_players);
    let max = payload.max_players.unwrap_or(config.default_max_players);
    if min > max {
        return Err(ServiceError::InvalidInput(format!(
            "min players ({min}) cannot exceed max players ({max})"
        )));
    }

    booking_end(payload.date_time, duration)?;

    let (kick_offs, series) = match &payload.recurrence {
        Some(rule) => {
            let kick_offs = recurrence::occurrences(
                payload.date_time,
                field.offset(),
                rule.frequency,
                rule.until,
            );
            let series = Recurrence {
                series_id: Uuid::new_v4(),
                frequency: rule.frequency,
                until: rule.until,
            };
            (kick_offs, Some(series))
        }
        None => (vec![payload.date_time], None),
    };
    let (Some(first), Some(last)) = (kick_offs.first().copied(), kick_offs.last().copied()) else {
        return Err(ServiceError::InvalidInput(
            "recurrence ends before the first game".into(),
        ));
    };

    let template = GameTemplate {
        group_id: group.id,
        size,
        duration,
        min,
        max,
        additional_costs: payload
            .additional_costs
            .into_iter()
            .map(Into::into)
            .collect(),
        notes: payload.notes,
        recurring: series,
        created_by: actor.id,
    };
    let single = template.recurring.is_none();

    let (games, skipped) = state
        .serialized(field.id, || async {
            let end = booking_end(last, duration)?;
            let mut booked = games_overlapping(&store, field.id, first, end).await?;
            let mut venue = load_field(&store, field.id).await?;
            let mut promotions_used = false;
            let mut games = Vec::new();
            let mut skipped = Vec::new();

            for kick_off in kick_offs {
                let verdict = availability::check(&venue, kick_off, duration, size, &booked);
                if !verdict.available {
                    let reason = verdict
                        .reason
                        .unwrap_or_else(|| "slot unavailable".into());
                    if single {
                        return Err(ServiceError::InvalidState(reason));
                    }
                    skipped.push(SkippedOccurrence {
                        date_time: format_timestamp(kick_off),
                        reason,
                    });
                    continue;
                }
                let (game, promoted) = template.build(&mut venue, kick_off)?;
                promotions_used |= promoted;
                booked.push(game.clone());
                games.push(game);
            }

            if games.is_empty() {
                return Err(ServiceError::InvalidState(
                    "no occurrence of the series could be booked".into(),
                ));
            }
            store.save_games(games.clone()).await?;
            if promotions_used {
                venue.updated_at = OffsetDateTime::now_utc();
                store.save_field(venue).await?;
            }
            Ok((games, skipped))
        })
        .await?;

    group_service::touch_activity(state, &store, group.id).await;
    let invitees = group.other_member_ids(actor.id);
    for game in &games {
        notification_service::notify(
            &store,
            NotificationKind::GameInvitation,
            invitees.iter().copied(),
            game_data(game, Some(actor.id)),
        )
        .await;
        room_events::broadcast_game_created(state, game);
    }

    info!(
        group_id = %group.id,
        field_id = %field.id,
        created = games.len(),
        skipped = skipped.len(),
        "games scheduled"
    );
    Ok(CreateGamesResponse {
        games: games.into_iter().map(GameResponse::from).collect(),
        skipped,
    })
}

/// Settings shared by every game of one creation request.
struct GameTemplate {
    group_id: Uuid,
    size: FieldSize,
    duration: u16,
    min: u8,
    max: u8,
    additional_costs: Vec<AdditionalCost>,
    notes: Option<String>,
    recurring: Option<Recurrence>,
    created_by: Uuid,
}

impl GameTemplate {
    /// Price and build the game at `kick_off`. Returns whether a promotion of `field`
    /// was used, in which case its usage count has been bumped.
    fn build(
        &self,
        field: &mut FieldEntity,
        kick_off: OffsetDateTime,
    ) -> Result<(GameEntity, bool), ServiceError> {
        let quote = pricing::quote(field, self.size, kick_off, self.duration)?;
        let promotion = quote.promotion.as_ref().and_then(|title| {
            field
                .promotions
                .iter_mut()
                .find(|promotion| &promotion.title == title)
        });
        let promoted = promotion.is_some();
        if let Some(promotion) = promotion {
            promotion.usage_count += 1;
        }

        let now = OffsetDateTime::now_utc();
        let mut roster = Roster::new(self.min, self.max);
        roster.confirm(self.created_by, now)?;
        let mut cost = Cost {
            field_price: quote.final_price,
            per_player: 0.0,
            additional_costs: self.additional_costs.clone(),
        };
        cost.recompute(roster.confirmed.len());

        let game = GameEntity {
            id: Uuid::new_v4(),
            group_id: self.group_id,
            field_id: field.id,
            size: self.size,
            date_time: kick_off,
            duration: self.duration,
            status: GameStatus::Scheduled,
            roster,
            teams: Teams::default(),
            cost,
            recurring: self.recurring.clone(),
            results: None,
            cancellation: None,
            notes: self.notes.clone(),
            created_by: self.created_by,
            created_at: now,
            updated_at: now,
        };
        Ok((game, promoted))
    }
}

/// Games of one group (caller must be a member) or of every group of the caller,
/// earliest kick-off first.
pub async fn list_games(
    state: &SharedState,
    actor: &ActingUser,
    query: ListGamesQuery,
) -> Result<Vec<GameResponse>, ServiceError> {
    let store = state.store().await?;
    let group_ids = match query.group_id {
        Some(group_id) => {
            let group = load_group(&store, group_id).await?;
            require_member(&group, actor.id)?;
            vec![group_id]
        }
        None => store
            .list_member_groups(actor.id)
            .await?
            .into_iter()
            .map(|group| group.id)
            .collect(),
    };
    if group_ids.is_empty() {
        return Ok(Vec::new());
    }

    let now = OffsetDateTime::now_utc();
    let upcoming = query.upcoming.unwrap_or(false);
    let mut games = store.list_group_games(group_ids).await?;
    for game in &mut games {
        game.refresh_status(now);
    }
    games.retain(|game| {
        query.status.is_none_or(|status| game.status == status)
            && (!upcoming || game.date_time >= now)
    });
    games.sort_by_key(|game| game.date_time);
    Ok(games.into_iter().map(GameResponse::from).collect())
}

pub async fn get_game(
    state: &SharedState,
    actor: &ActingUser,
    game_id: Uuid,
) -> Result<GameResponse, ServiceError> {
    let store = state.store().await?;
    let mut game = load_game(&store, game_id).await?;
    let group = load_group(&store, game.group_id).await?;
    require_member(&group, actor.id)?;
    game.refresh_status(OffsetDateTime::now_utc());
    Ok(game.into())
}

/// Take a spot, or join the waitlist when the game is full.
pub async fn confirm_attendance(
    state: &SharedState,
    actor: &ActingUser,
    game_id: Uuid,
) -> Result<ConfirmAttendanceResponse, ServiceError> {
    let store = state.store().await?;
    let (game, outcome) = state
        .serialized(game_id, || async {
            let mut game = load_open_game(&store, actor, game_id).await?;
            let outcome = game.roster.confirm(actor.id, OffsetDateTime::now_utc())?;
            game.cost.recompute(game.roster.confirmed.len());
            persist(&store, &mut game).await?;
            Ok((game, outcome))
        })
        .await?;

    room_events::broadcast_confirmation(state, &game, actor.id, outcome);
    info!(%game_id, user_id = %actor.id, ?outcome, "attendance confirmed");

    let (status, waitlist_position) = match outcome {
        Confirmation::Confirmed => ("confirmed", None),
        Confirmation::Waitlisted { position } => ("waitlisted", Some(position)),
    };
    Ok(ConfirmAttendanceResponse {
        status: status.to_owned(),
        waitlist_position,
        game: game.into(),
    })
}

/// Give up a spot (promoting the head of the waitlist) or leave the waitlist.
pub async fn cancel_attendance(
    state: &SharedState,
    actor: &ActingUser,
    game_id: Uuid,
    reason: Option<String>,
) -> Result<CancelAttendanceResponse, ServiceError> {
    let store = state.store().await?;
    let (game, outcome) = state
        .serialized(game_id, || async {
            let mut game = load_open_game(&store, actor, game_id).await?;
            let outcome =
                game.roster
                    .cancel(actor.id, reason.clone(), OffsetDateTime::now_utc())?;
            game.cost.recompute(game.roster.confirmed.len());
            persist(&store, &mut game).await?;
            Ok((game, outcome))
        })
        .await?;

    room_events::broadcast_player_cancelled(state, &game, actor.id, reason);
    let promoted = match outcome {
        Cancellation::Withdrew { promoted } => promoted,
        Cancellation::LeftWaitlist => None,
    };
    if let Some(promoted) = promoted {
        notification_service::notify(
            &store,
            NotificationKind::WaitlistPromoted,
            [promoted],
            game_data(&game, None),
        )
        .await;
        room_events::broadcast_confirmation(state, &game, promoted, Confirmation::Confirmed);
        info!(%game_id, user_id = %promoted, "waitlisted player promoted");
    }

    info!(%game_id, user_id = %actor.id, "attendance cancelled");
    Ok(CancelAttendanceResponse {
        promoted,
        game: game.into(),
    })
}

/// Call off a game. Only group admins may, and not too close to kick-off.
pub async fn cancel_game(
    state: &SharedState,
    actor: &ActingUser,
    game_id: Uuid,
    reason: Option<String>,
) -> Result<GameResponse, ServiceError> {
    let store = state.store().await?;
    let cutoff_hours = state.config().cancellation_cutoff_hours;
    let game = state
        .serialized(game_id, || async {
            let mut game = load_game(&store, game_id).await?;
            let group = load_group(&store, game.group_id).await?;
            require_admin(&group, actor.id)?;

            let now = OffsetDateTime::now_utc();
            game.refresh_status(now);
            if matches!(game.status, GameStatus::Cancelled | GameStatus::Completed) {
                return Err(ServiceError::InvalidState(format!(
                    "game is already {}",
                    game.status.as_str()
                )));
            }
            if !game.cancellable_at(now, Duration::hours(i64::from(cutoff_hours))) {
                return Err(ServiceError::InvalidInput(format!(
                    "games can only be cancelled up to {cutoff_hours} hours before kick-off"
                )));
            }

            game.status = GameStatus::Cancelled;
            game.cancellation = Some(CancellationInfo {
                cancelled_by: actor.id,
                reason: reason.clone(),
                cancelled_at: now,
            });
            persist(&store, &mut game).await?;
            Ok(game)
        })
        .await?;

    notification_service::notify(
        &store,
        NotificationKind::GameCancelled,
        game.confirmed_ids().into_iter().filter(|id| *id != actor.id),
        game_data(&game, Some(actor.id)),
    )
    .await;
    room_events::broadcast_game_cancelled(state, &game, reason);
    info!(%game_id, by = %actor.id, "game cancelled");
    Ok(game.into())
}

/// Randomly split the confirmed players into two teams.
pub async fn generate_teams(
    state: &SharedState,
    actor: &ActingUser,
    game_id: Uuid,
) -> Result<GameResponse, ServiceError> {
    let store = state.store().await?;
    let game = state
        .serialized(game_id, || async {
            let mut game = load_game(&store, game_id).await?;
            let group = load_group(&store, game.group_id).await?;
            require_admin(&group, actor.id)?;
            if game.roster.confirmed.len() < 2 {
                return Err(ServiceError::InvalidState(
                    "at least 2 confirmed players are needed to make teams".into(),
                ));
            }

            let sides = teams::split(&game.confirmed_ids(), &mut rand::rng());
            teams::assign(&mut game.roster, &sides);
            game.teams = sides;
            persist(&store, &mut game).await?;
            Ok(game)
        })
        .await?;

    notification_service::notify(
        &store,
        NotificationKind::GameTeamsSet,
        game.confirmed_ids(),
        game_data(&game, Some(actor.id)),
    )
    .await;
    info!(%game_id, "teams generated");
    Ok(game.into())
}

/// Load a game or fail with [`ServiceError::NotFound`].
pub(crate) async fn load_game(
    store: &Arc<dyn Store>,
    game_id: Uuid,
) -> Result<GameEntity, ServiceError> {
    store
        .find_game(game_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("game `{game_id}` not found")))
}

/// Load a game whose roster the caller may change.
async fn load_open_game(
    store: &Arc<dyn Store>,
    actor: &ActingUser,
    game_id: Uuid,
) -> Result<GameEntity, ServiceError> {
    let mut game = load_game(store, game_id).await?;
    let group = load_group(store, game.group_id).await?;
    require_member(&group, actor.id)?;
    game.refresh_status(OffsetDateTime::now_utc());
    if !game.status.is_booking() {
        return Err(ServiceError::InvalidState(format!(
            "game is {}; attendance is closed",
            game.status.as_str()
        )));
    }
    Ok(game)
}

/// Save after moving a past scheduled game to completed.
async fn persist(store: &Arc<dyn Store>, game: &mut GameEntity) -> Result<(), ServiceError> {
    let now = OffsetDateTime::now_utc();
    game.refresh_status(now);
    game.updated_at = now;
    store.save_game(game.clone()).await?;
    Ok(())
}

fn game_data(game: &GameEntity, sender_id: Option<Uuid>) -> NotificationData {
    NotificationData {
        group_id: Some(game.group_id),
        game_id: Some(game.id),
        sender_id,
    }
}

#[cfg(test)]
mod tests {
    use time::macros::time;

    use super::*;
    use crate::{
        dao::models::{Discount, Frequency},
        domain::testing::{field_open_daily, game_fixture, promotion},
        dto::{
            game::RecurrenceInput,
            group::{AddMemberRequest, CreateGroupRequest},
        },
        services::testing::{memory_state, player},
    };

    struct Pitch {
        state: SharedState,
        store: Arc<dyn Store>,
        field: FieldEntity,
        group_id: Uuid,
        ana: ActingUser,
        rui: ActingUser,
    }

    /// Ana administers a group that Rui belongs to; one daily-open field is registered.
    async fn pitch() -> Pitch {
        let state = memory_state().await;
        let store = state.store().await.unwrap();
        let ana = player(&state, "912000001", "Ana").await;
        let rui = player(&state, "912000002", "Rui").await;
        let group = group_service::create_group(
            &state,
            &ana,
            CreateGroupRequest {
                name: "Quintas".into(),
                description: None,
            },
        )
        .await
        .unwrap();
        group_service::add_member(
            &state,
            &ana,
            group.id,
            AddMemberRequest {
                phone_number: "912000002".into(),
            },
        )
        .await
        .unwrap();
        let field = field_open_daily();
        store.save_field(field.clone()).await.unwrap();
        Pitch {
            state,
            store,
            field,
            group_id: group.id,
            ana,
            rui,
        }
    }

    fn next_week() -> OffsetDateTime {
        (OffsetDateTime::now_utc() + Duration::days(7)).replace_time(time!(12:00))
    }

    fn request(pitch: &Pitch, date_time: OffsetDateTime) -> CreateGameRequest {
        CreateGameRequest {
            group_id: pitch.group_id,
            field_id: pitch.field.id,
            date_time,
            duration: None,
            size: None,
            min_players: None,
            max_players: None,
            notes: None,
            additional_costs: Vec::new(),
            recurrence: None,
        }
    }

    async fn single_game(pitch: &Pitch, max_players: u8) -> GameResponse {
        let mut payload = request(pitch, next_week());
        payload.min_players = Some(1);
        payload.max_players = Some(max_players);
        let mut created = create_game(&pitch.state, &pitch.ana, payload).await.unwrap();
        created.games.remove(0)
    }

    #[tokio::test]
    async fn creator_is_confirmed_and_pays_the_whole_field() {
        let pitch = pitch().await;
        let game = single_game(&pitch, 14).await;

        assert_eq!(game.status, GameStatus::Scheduled);
        assert_eq!(game.roster.confirmed.len(), 1);
        assert_eq!(game.roster.confirmed[0].user_id, pitch.ana.id);
        // 90 minutes at the normal 60/h rate.
        assert_eq!(game.cost.field_price, 90.0);
        assert_eq!(game.cost.per_player, 90.0);

        let inbox = pitch
            .store
            .list_unread_notifications(pitch.rui.id)
            .await
            .unwrap();
        let invites: Vec<_> = inbox
            .iter()
            .filter(|n| n.kind == NotificationKind::GameInvitation)
            .collect();
        assert_eq!(invites.len(), 1);
        assert_eq!(invites[0].data.game_id, Some(game.id));
    }

    #[tokio::test]
    async fn only_admins_schedule_games() {
        let pitch = pitch().await;
        let err = create_game(&pitch.state, &pitch.rui, request(&pitch, next_week()))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn single_game_on_a_full_slot_is_refused() {
        let pitch = pitch().await;
        let kick_off = next_week();
        for _ in 0..2 {
            let taken = game_fixture(&pitch.field, kick_off, FieldSize::SevenASide);
            pitch.store.save_game(taken).await.unwrap();
        }
        let err = create_game(&pitch.state, &pitch.ana, request(&pitch, kick_off))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn recurring_series_skips_unavailable_weeks() {
        let pitch = pitch().await;
        let kick_off = next_week();
        for _ in 0..2 {
            let week_two = kick_off + Duration::days(7);
            let taken = game_fixture(&pitch.field, week_two, FieldSize::SevenASide);
            pitch.store.save_game(taken).await.unwrap();
        }

        let mut payload = request(&pitch, kick_off);
        payload.recurrence = Some(RecurrenceInput {
            frequency: Frequency::Weekly,
            until: kick_off + Duration::days(21),
        });
        let created = create_game(&pitch.state, &pitch.ana, payload).await.unwrap();

        assert_eq!(created.games.len(), 3);
        assert_eq!(created.skipped.len(), 1);
        let series: Vec<_> = created
            .games
            .iter()
            .map(|game| game.recurring.as_ref().unwrap().series_id)
            .collect();
        assert!(series.iter().all(|id| *id == series[0]));
    }

    #[tokio::test]
    async fn limited_promotion_is_spent_by_the_first_game_of_a_series() {
        let pitch = pitch().await;
        let kick_off = next_week();
        let mut field = pitch.field.clone();
        let mut opening = promotion("Abertura", Discount::Percentage(50.0));
        opening.valid_from = OffsetDateTime::now_utc() - Duration::days(1);
        opening.valid_until = kick_off + Duration::days(60);
        opening.conditions.max_uses = Some(1);
        field.promotions.push(opening);
        pitch.store.save_field(field).await.unwrap();

        let mut payload = request(&pitch, kick_off);
        payload.recurrence = Some(RecurrenceInput {
            frequency: Frequency::Weekly,
            until: kick_off + Duration::days(14),
        });
        let created = create_game(&pitch.state, &pitch.ana, payload).await.unwrap();

        let prices: Vec<_> = created.games.iter().map(|game| game.cost.field_price).collect();
        assert_eq!(prices, vec![45.0, 90.0, 90.0]);
        let stored = pitch.store.find_field(pitch.field.id).await.unwrap().unwrap();
        assert_eq!(stored.promotions[0].usage_count, 1);
    }

    #[tokio::test]
    async fn full_game_waitlists_and_promotes_on_cancel() {
        let pitch = pitch().await;
        let game = single_game(&pitch, 1).await;

        let outcome = confirm_attendance(&pitch.state, &pitch.rui, game.id).await.unwrap();
        assert_eq!(outcome.status, "waitlisted");
        assert_eq!(outcome.waitlist_position, Some(1));

        let err = confirm_attendance(&pitch.state, &pitch.rui, game.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let injured = Some("injured".into());
        let cancelled = cancel_attendance(&pitch.state, &pitch.ana, game.id, injured)
            .await
            .unwrap();
        assert_eq!(cancelled.promoted, Some(pitch.rui.id));
        assert_eq!(cancelled.game.roster.confirmed[0].user_id, pitch.rui.id);
        assert_eq!(cancelled.game.roster.declined[0].reason.as_deref(), Some("injured"));

        let inbox = pitch
            .store
            .list_unread_notifications(pitch.rui.id)
            .await
            .unwrap();
        assert!(inbox.iter().any(|n| n.kind == NotificationKind::WaitlistPromoted));
    }

    #[tokio::test]
    async fn confirmation_splits_the_cost() {
        let pitch = pitch().await;
        let game = single_game(&pitch, 14).await;
        let mut room = pitch.state.rooms().subscribe(pitch.group_id);

        let outcome = confirm_attendance(&pitch.state, &pitch.rui, game.id).await.unwrap();
        assert_eq!(outcome.status, "confirmed");
        assert_eq!(outcome.game.cost.per_player, 45.0);

        let event = room.try_recv().unwrap();
        assert!(event.payload.contains("player_confirmed"));
    }

    #[tokio::test]
    async fn outsiders_cannot_see_or_join_games() {
        let pitch = pitch().await;
        let game = single_game(&pitch, 14).await;
        let eva = player(&pitch.state, "912000003", "Eva").await;

        let err = get_game(&pitch.state, &eva, game.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        let err = confirm_attendance(&pitch.state, &eva, game.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        let query = ListGamesQuery {
            group_id: None,
            status: None,
            upcoming: None,
        };
        assert!(list_games(&pitch.state, &eva, query).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancelled_games_close_attendance() {
        let pitch = pitch().await;
        let game = single_game(&pitch, 14).await;

        let err = cancel_game(&pitch.state, &pitch.rui, game.id, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let cancelled = cancel_game(&pitch.state, &pitch.ana, game.id, Some("rain".into()))
            .await
            .unwrap();
        assert_eq!(cancelled.status, GameStatus::Cancelled);
        assert_eq!(cancelled.cancellation.unwrap().reason.as_deref(), Some("rain"));

        let err = confirm_attendance(&pitch.state, &pitch.rui, game.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        let err = cancel_game(&pitch.state, &pitch.ana, game.id, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn games_close_to_kick_off_cannot_be_cancelled() {
        let pitch = pitch().await;
        let mut soon = game_fixture(
            &pitch.field,
            OffsetDateTime::now_utc() + Duration::minutes(30),
            FieldSize::SevenASide,
        );
        soon.group_id = pitch.group_id;
        pitch.store.save_game(soon.clone()).await.unwrap();

        let err = cancel_game(&pitch.state, &pitch.ana, soon.id, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn past_games_list_as_completed() {
        let pitch = pitch().await;
        let mut past = game_fixture(
            &pitch.field,
            OffsetDateTime::now_utc() - Duration::days(2),
            FieldSize::SevenASide,
        );
        past.group_id = pitch.group_id;
        pitch.store.save_game(past).await.unwrap();
        single_game(&pitch, 14).await;

        let all = list_games(
            &pitch.state,
            &pitch.rui,
            ListGamesQuery {
                group_id: Some(pitch.group_id),
                status: None,
                upcoming: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].status, GameStatus::Completed);

        let upcoming = list_games(
            &pitch.state,
            &pitch.rui,
            ListGamesQuery {
                group_id: None,
                status: None,
                upcoming: Some(true),
            },
        )
        .await
        .unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].status, GameStatus::Scheduled);
    }

    #[tokio::test]
    async fn teams_need_two_players_and_cover_the_roster() {
        let pitch = pitch().await;
        let game = single_game(&pitch, 14).await;

        let err = generate_teams(&pitch.state, &pitch.ana, game.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        confirm_attendance(&pitch.state, &pitch.rui, game.id).await.unwrap();
        let game = generate_teams(&pitch.state, &pitch.ana, game.id).await.unwrap();
        assert_eq!(game.teams.team_a.len() + game.teams.team_b.len(), 2);
        assert!(game.roster.confirmed.iter().all(|player| player.team.is_some()));
    }
}
