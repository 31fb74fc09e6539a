//! Chat payloads: REST message views and the WebSocket protocol.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{MessageEntity, MessageKind, Reaction, ReadReceipt},
    dto::{format_optional, format_timestamp, game::GameResponse},
};

/// Longest text accepted in a chat message.
pub const MAX_MESSAGE_LENGTH: u64 = 1000;

#[derive(Debug, Serialize, ToSchema)]
pub struct ReactionSummary {
    pub user_id: Uuid,
    pub emoji: String,
    pub reacted_at: String,
}

impl From<Reaction> for ReactionSummary {
    fn from(reaction: Reaction) -> Self {
        Self {
            user_id: reaction.user_id,
            emoji: reaction.emoji,
            reacted_at: format_timestamp(reaction.reacted_at),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadReceiptSummary {
    pub user_id: Uuid,
    pub read_at: String,
}

impl From<ReadReceipt> for ReadReceiptSummary {
    fn from(receipt: ReadReceipt) -> Self {
        Self {
            user_id: receipt.user_id,
            read_at: format_timestamp(receipt.read_at),
        }
    }
}

/// Chat message as listed over REST and pushed over the socket.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub id: Uuid,
    pub group_id: Uuid,
    pub sender_id: Uuid,
    pub reply_to: Option<Uuid>,
    pub kind: MessageKind,
    pub text: Option<String>,
    pub reactions: Vec<ReactionSummary>,
    pub read_by: Vec<ReadReceiptSummary>,
    pub edited_at: Option<String>,
    /// Previous texts, oldest first.
    pub edit_history: Vec<String>,
    pub deleted: bool,
    pub created_at: String,
}

impl From<MessageEntity> for MessageResponse {
    fn from(message: MessageEntity) -> Self {
        let (edited_at, edit_history) = match message.edited {
            Some(edit) => (Some(edit.edited_at), edit.history),
            None => (None, Vec::new()),
        };
        Self {
            id: message.id,
            group_id: message.group_id,
            sender_id: message.sender_id,
            reply_to: message.reply_to,
            kind: message.kind,
            text: message.text,
            reactions: message
                .reactions
                .into_iter()
                .map(ReactionSummary::from)
                .collect(),
            read_by: message
                .read_by
                .into_iter()
                .map(ReadReceiptSummary::from)
                .collect(),
            edited_at: format_optional(edited_at),
            edit_history,
            deleted: message.deleted.is_some(),
            created_at: format_timestamp(message.created_at),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListMessagesQuery {
    /// 1-based page number.
    pub page: Option<u64>,
    pub limit: Option<u16>,
    /// Only messages older than this RFC 3339 instant.
    pub before: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct EditMessageRequest {
    #[validate(length(min = 1, max = 1000))]
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteMessageQuery {
    #[serde(default)]
    pub hard: bool,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
/// Frames accepted from chat WebSocket clients.
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Identify {
        user_id: Uuid,
    },
    JoinGroups,
    JoinGroup {
        group_id: Uuid,
    },
    LeaveGroup {
        group_id: Uuid,
    },
    SendMessage {
        group_id: Uuid,
        text: String,
        #[serde(default)]
        kind: MessageKind,
        #[serde(default)]
        reply_to: Option<Uuid>,
    },
    MarkRead {
        message_id: Uuid,
    },
    TypingStart {
        group_id: Uuid,
    },
    TypingStop {
        group_id: Uuid,
    },
    AddReaction {
        message_id: Uuid,
        emoji: String,
    },
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Frames pushed to chat WebSocket clients, either directly or through a group room.
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Identified {
        user_id: Uuid,
    },
    GroupsJoined {
        groups: Vec<Uuid>,
    },
    UserOnline {
        group_id: Uuid,
        user_id: Uuid,
        user_name: String,
    },
    UserOffline {
        group_id: Uuid,
        user_id: Uuid,
    },
    NewMessage {
        message: MessageResponse,
    },
    MessageRead {
        message_id: Uuid,
        user_id: Uuid,
    },
    UserTyping {
        group_id: Uuid,
        user_id: Uuid,
        user_name: String,
    },
    UserStoppedTyping {
        group_id: Uuid,
        user_id: Uuid,
    },
    ReactionAdded {
        message_id: Uuid,
        user_id: Uuid,
        emoji: String,
        /// Whether the toggle added (`true`) or removed the reaction.
        active: bool,
    },
    Error {
        message: String,
    },
    GameCreated {
        game: GameResponse,
    },
    PlayerConfirmed {
        game_id: Uuid,
        user_id: Uuid,
    },
    PlayerWaitlisted {
        game_id: Uuid,
        user_id: Uuid,
        position: usize,
    },
    PlayerCancelled {
        game_id: Uuid,
        user_id: Uuid,
        reason: Option<String>,
    },
    GameCancelled {
        game_id: Uuid,
        reason: Option<String>,
    },
    MemberAdded {
        group_id: Uuid,
        user_id: Uuid,
        user_name: String,
    },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}
