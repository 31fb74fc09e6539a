//! Fan-out of chat room events. REST handlers and WebSocket sessions both publish through
//! these helpers so every subscriber of a group sees the same JSON frames.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    dao::models::{GameEntity, MessageEntity},
    domain::attendance::Confirmation,
    dto::{chat::ServerMessage, game::GameResponse},
    state::{ConnectionId, RoomEvent, SharedState},
};

/// Publish a newly scheduled game to its group.
pub fn broadcast_game_created(state: &SharedState, game: &GameEntity) {
    let payload = ServerMessage::GameCreated {
        game: GameResponse::from(game.clone()),
    };
    send_room_event(state, game.group_id, None, &payload);
}

/// Publish the outcome of an attendance confirmation.
pub fn broadcast_confirmation(
    state: &SharedState,
    game: &GameEntity,
    user_id: Uuid,
    outcome: Confirmation,
) {
    let payload = match outcome {
        Confirmation::Confirmed => ServerMessage::PlayerConfirmed {
            game_id: game.id,
            user_id,
        },
        Confirmation::Waitlisted { position } => ServerMessage::PlayerWaitlisted {
            game_id: game.id,
            user_id,
            position,
        },
    };
    send_room_event(state, game.group_id, None, &payload);
}

pub fn broadcast_player_cancelled(
    state: &SharedState,
    game: &GameEntity,
    user_id: Uuid,
    reason: Option<String>,
) {
    let payload = ServerMessage::PlayerCancelled {
        game_id: game.id,
        user_id,
        reason,
    };
    send_room_event(state, game.group_id, None, &payload);
}

pub fn broadcast_game_cancelled(state: &SharedState, game: &GameEntity, reason: Option<String>) {
    let payload = ServerMessage::GameCancelled {
        game_id: game.id,
        reason,
    };
    send_room_event(state, game.group_id, None, &payload);
}

pub fn broadcast_member_added(state: &SharedState, group_id: Uuid, user_id: Uuid, user_name: String) {
    let payload = ServerMessage::MemberAdded {
        group_id,
        user_id,
        user_name,
    };
    send_room_event(state, group_id, None, &payload);
}

/// Publish a freshly persisted chat message, sender included.
pub fn broadcast_new_message(state: &SharedState, message: &MessageEntity) {
    let payload = ServerMessage::NewMessage {
        message: message.clone().into(),
    };
    send_room_event(state, message.group_id, None, &payload);
}

/// Publish to every subscriber of `group_id` except the `origin` connection.
pub fn broadcast_from(
    state: &SharedState,
    group_id: Uuid,
    origin: ConnectionId,
    payload: &ServerMessage,
) {
    send_room_event(state, group_id, Some(origin), payload);
}

/// Publish to every subscriber of `group_id`.
pub fn broadcast_to_all(state: &SharedState, group_id: Uuid, payload: &ServerMessage) {
    send_room_event(state, group_id, None, payload);
}

fn send_room_event(
    state: &SharedState,
    group_id: Uuid,
    origin: Option<ConnectionId>,
    payload: &ServerMessage,
) {
    match serde_json::to_string(payload) {
        Ok(json) => {
            let receivers = state.rooms().broadcast(
                group_id,
                RoomEvent {
                    origin,
                    payload: Arc::from(json),
                },
            );
            debug!(%group_id, receivers, "room event published");
        }
        Err(err) => warn!(%group_id, error = %err, "failed to serialize room event"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, state::AppState};

    #[tokio::test]
    async fn member_added_reaches_room_subscribers() {
        let state = AppState::new(AppConfig::default());
        let group = Uuid::new_v4();
        let mut receiver = state.rooms().subscribe(group);

        broadcast_member_added(&state, group, Uuid::new_v4(), "Ana".into());

        let event = receiver.recv().await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&event.payload).unwrap();
        assert_eq!(json["type"], "member_added");
        assert_eq!(json["user_name"], "Ana");
        assert!(event.origin.is_none());
    }

    #[tokio::test]
    async fn presence_events_carry_their_origin() {
        let state = AppState::new(AppConfig::default());
        let group = Uuid::new_v4();
        let mut receiver = state.rooms().subscribe(group);
        let origin = state.rooms().next_connection_id();

        broadcast_from(
            &state,
            group,
            origin,
            &ServerMessage::UserStoppedTyping {
                group_id: group,
                user_id: Uuid::new_v4(),
            },
        );

        let event = receiver.recv().await.unwrap();
        assert!(!event.is_for(origin));
    }
}
