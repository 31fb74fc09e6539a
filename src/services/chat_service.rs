//! Group chat: REST history management plus the operations driven by WebSocket frames.

use std::sync::Arc;

use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::{
        MessagePage, Store,
        models::{MessageEntity, MessageKind},
    },
    dto::chat::{
        EditMessageRequest, ListMessagesQuery, MAX_MESSAGE_LENGTH, MessageResponse,
        ServerMessage,
    },
    error::ServiceError,
    services::{
        group_service::{self, load_group, require_member},
        room_events,
        user_service::ActingUser,
    },
    state::{ConnectionId, SharedState},
};

/// Largest page a client may ask for.
const MAX_PAGE_SIZE: u16 = 100;

/// Chat history of a group, newest first, skipping deleted messages.
pub async fn list_messages(
    state: &SharedState,
    actor: &ActingUser,
    group_id: Uuid,
    query: ListMessagesQuery,
) -> Result<Vec<MessageResponse>, ServiceError> {
    let store = state.store().await?;
    let group = load_group(&store, group_id).await?;
    require_member(&group, actor.id)?;

    let before = query
        .before
        .as_deref()
        .map(|raw| OffsetDateTime::parse(raw, &Rfc3339))
        .transpose()
        .map_err(|err| ServiceError::InvalidInput(format!("invalid `before` timestamp: {err}")))?;
    let limit = query
        .limit
        .unwrap_or(state.config().chat_page_size)
        .clamp(1, MAX_PAGE_SIZE);
    let page = query.page.unwrap_or(1).max(1);
    let skip = (page - 1)
        .checked_mul(u64::from(limit))
        .ok_or_else(|| ServiceError::InvalidInput(format!("page {page} is out of range")))?;

    let messages = store
        .list_messages(
            group_id,
            MessagePage {
                before,
                skip,
                limit: i64::from(limit),
            },
        )
        .await?;
    Ok(messages.into_iter().map(MessageResponse::from).collect())
}

/// Replace the text of one's own text message.
pub async fn edit_message(
    state: &SharedState,
    actor: &ActingUser,
    message_id: Uuid,
    payload: EditMessageRequest,
) -> Result<MessageResponse, ServiceError> {
    let store = state.store().await?;
    let message = state
        .serialized(message_id, || async {
            let mut message = load_message(&store, message_id).await?;
            if message.sender_id != actor.id {
                return Err(ServiceError::Forbidden(
                    "only the sender can edit a message".into(),
                ));
            }
            if message.kind != MessageKind::Text {
                return Err(ServiceError::InvalidInput(
                    "only text messages can be edited".into(),
                ));
            }
            message.edit(checked_text(&payload.text)?);
            store.save_message(message.clone()).await?;
            Ok(message)
        })
        .await?;

    debug!(%message_id, "message edited");
    Ok(message.into())
}

/// Delete a message as its sender or as a group admin.
///
/// Soft deletion hides the message from listings; `hard` also drops its content.
pub async fn delete_message(
    state: &SharedState,
    actor: &ActingUser,
    message_id: Uuid,
    hard: bool,
) -> Result<(), ServiceError> {
    let store = state.store().await?;
    state
        .serialized(message_id, || async {
            let mut message = load_message(&store, message_id).await?;
            if message.sender_id != actor.id {
                let group = load_group(&store, message.group_id).await?;
                if !group.is_admin(actor.id) {
                    return Err(ServiceError::Forbidden(
                        "only the sender or a group admin can delete a message".into(),
                    ));
                }
            }
            message.delete(actor.id, hard);
            store.save_message(message).await?;
            Ok(())
        })
        .await?;

    info!(%message_id, by = %actor.id, hard, "message deleted");
    Ok(())
}

/// Post a message to a group room and persist it.
pub async fn send_message(
    state: &SharedState,
    actor: &ActingUser,
    group_id: Uuid,
    text: &str,
    kind: MessageKind,
    reply_to: Option<Uuid>,
) -> Result<MessageEntity, ServiceError> {
    let store = state.store().await?;
    let group = load_group(&store, group_id).await?;
    require_member(&group, actor.id)?;

    let mut message = MessageEntity::new(group_id, actor.id, kind, Some(checked_text(text)?));
    message.reply_to = reply_to;
    store.save_message(message.clone()).await?;
    group_service::touch_activity(state, &store, group_id).await;

    room_events::broadcast_new_message(state, &message);
    debug!(%group_id, message_id = %message.id, "message sent");
    Ok(message)
}

/// Record that the caller read a message. Only the first read of each user is announced,
/// to every room subscriber but `origin`.
pub async fn mark_read(
    state: &SharedState,
    actor: &ActingUser,
    message_id: Uuid,
    origin: ConnectionId,
) -> Result<(), ServiceError> {
    let store = state.store().await?;
    let (group_id, fresh) = state
        .serialized(message_id, || async {
            let mut message = load_message(&store, message_id).await?;
            let group = load_group(&store, message.group_id).await?;
            require_member(&group, actor.id)?;
            let fresh = message.mark_read(actor.id);
            if fresh {
                store.save_message(message.clone()).await?;
            }
            Ok((message.group_id, fresh))
        })
        .await?;

    if fresh {
        let payload = ServerMessage::MessageRead {
            message_id,
            user_id: actor.id,
        };
        room_events::broadcast_from(state, group_id, origin, &payload);
    }
    Ok(())
}

/// Add the caller's reaction, or take it back when it is already there.
pub async fn toggle_reaction(
    state: &SharedState,
    actor: &ActingUser,
    message_id: Uuid,
    emoji: &str,
) -> Result<bool, ServiceError> {
    let emoji = emoji.trim();
    if emoji.is_empty() {
        return Err(ServiceError::InvalidInput("emoji is required".into()));
    }

    let store = state.store().await?;
    let (group_id, active) = state
        .serialized(message_id, || async {
            let mut message = load_message(&store, message_id).await?;
            let group = load_group(&store, message.group_id).await?;
            require_member(&group, actor.id)?;
            let active = message.toggle_reaction(actor.id, emoji);
            store.save_message(message.clone()).await?;
            Ok((message.group_id, active))
        })
        .await?;

    let payload = ServerMessage::ReactionAdded {
        message_id,
        user_id: actor.id,
        emoji: emoji.to_owned(),
        active,
    };
    room_events::broadcast_to_all(state, group_id, &payload);
    Ok(active)
}

/// Load a live message; deleted messages read as missing.
async fn load_message(
    store: &Arc<dyn Store>,
    message_id: Uuid,
) -> Result<MessageEntity, ServiceError> {
    store
        .find_message(message_id)
        .await?
        .filter(|message| !message.is_deleted())
        .ok_or_else(|| ServiceError::NotFound(format!("message `{message_id}` not found")))
}

fn checked_text(text: &str) -> Result<String, ServiceError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ServiceError::InvalidInput("message text is empty".into()));
    }
    if text.chars().count() as u64 > MAX_MESSAGE_LENGTH {
        return Err(ServiceError::InvalidInput(format!(
            "messages are limited to {MAX_MESSAGE_LENGTH} characters"
        )));
    }
    Ok(text.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dto::group::{AddMemberRequest, CreateGroupRequest},
        services::testing::{memory_state, player},
    };

    struct Chat {
        state: SharedState,
        group_id: Uuid,
        ana: ActingUser,
        rui: ActingUser,
    }

    /// Ana administers a group that Rui belongs to.
    async fn chat() -> Chat {
        let state = memory_state().await;
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
        Chat {
            state,
            group_id: group.id,
            ana,
            rui,
        }
    }

    async fn say(chat: &Chat, who: &ActingUser, text: &str) -> MessageEntity {
        send_message(&chat.state, who, chat.group_id, text, MessageKind::Text, None)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn history_is_newest_first_and_paged() {
        let chat = chat().await;
        for text in ["um", "dois", "tres"] {
            say(&chat, &chat.ana, text).await;
        }

        let page = ListMessagesQuery {
            page: Some(1),
            limit: Some(2),
            before: None,
        };
        let first = list_messages(&chat.state, &chat.rui, chat.group_id, page).await.unwrap();
        let texts: Vec<_> = first.iter().map(|m| m.text.clone().unwrap()).collect();
        assert_eq!(texts, vec!["tres", "dois"]);

        let page = ListMessagesQuery {
            page: Some(2),
            limit: Some(2),
            before: None,
        };
        let second = list_messages(&chat.state, &chat.rui, chat.group_id, page).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].text.as_deref(), Some("um"));
    }

    #[tokio::test]
    async fn huge_page_numbers_are_rejected() {
        let chat = chat().await;
        let page = ListMessagesQuery {
            page: Some(u64::MAX),
            limit: Some(2),
            before: None,
        };
        let err = list_messages(&chat.state, &chat.rui, chat.group_id, page)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn outsiders_cannot_post_or_read() {
        let chat = chat().await;
        let eva = player(&chat.state, "912000003", "Eva").await;

        let err = send_message(&chat.state, &eva, chat.group_id, "ola", MessageKind::Text, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        let err = list_messages(&chat.state, &eva, chat.group_id, ListMessagesQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn blank_and_oversized_texts_are_rejected() {
        let chat = chat().await;
        let long = "a".repeat(1001);
        for text in ["   ", long.as_str()] {
            let err = send_message(&chat.state, &chat.ana, chat.group_id, text, MessageKind::Text, None)
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::InvalidInput(_)));
        }
    }

    #[tokio::test]
    async fn only_the_sender_edits() {
        let chat = chat().await;
        let message = say(&chat, &chat.ana, "jogo as 8").await;

        let fix = |text: &str| EditMessageRequest { text: text.into() };
        let err = edit_message(&chat.state, &chat.rui, message.id, fix("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let edited = edit_message(&chat.state, &chat.ana, message.id, fix("jogo as 9"))
            .await
            .unwrap();
        assert_eq!(edited.text.as_deref(), Some("jogo as 9"));
        assert_eq!(edited.edit_history, vec!["jogo as 8".to_owned()]);
    }

    #[tokio::test]
    async fn admins_delete_other_messages_and_listings_hide_them() {
        let chat = chat().await;
        let message = say(&chat, &chat.rui, "spam").await;
        let own = say(&chat, &chat.ana, "hello").await;

        let err = delete_message(&chat.state, &chat.rui, own.id, false).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        delete_message(&chat.state, &chat.ana, message.id, true).await.unwrap();
        let listed = list_messages(&chat.state, &chat.rui, chat.group_id, ListMessagesQuery::default())
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, own.id);

        let err = delete_message(&chat.state, &chat.ana, message.id, false).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn reactions_toggle_and_reach_everyone() {
        let chat = chat().await;
        let message = say(&chat, &chat.ana, "golo!").await;
        let mut room = chat.state.rooms().subscribe(chat.group_id);

        assert!(toggle_reaction(&chat.state, &chat.rui, message.id, "⚽").await.unwrap());
        assert!(!toggle_reaction(&chat.state, &chat.rui, message.id, "⚽").await.unwrap());

        let event = room.try_recv().unwrap();
        assert!(event.origin.is_none());
        assert!(event.payload.contains("reaction_added"));
    }

    #[tokio::test]
    async fn read_receipts_are_announced_once() {
        let chat = chat().await;
        let message = say(&chat, &chat.ana, "ola").await;
        let mut room = chat.state.rooms().subscribe(chat.group_id);

        mark_read(&chat.state, &chat.rui, message.id, 7).await.unwrap();
        mark_read(&chat.state, &chat.rui, message.id, 7).await.unwrap();

        let event = room.try_recv().unwrap();
        assert!(!event.is_for(7));
        assert!(event.payload.contains("message_read"));
        assert!(room.try_recv().is_err());
    }
}
