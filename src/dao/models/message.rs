use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, TimestampMilliSeconds, serde_as};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// Content type of a chat message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
    Video,
    Audio,
    File,
    GameInvite,
    Poll,
    Location,
    System,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    #[serde_as(as = "DisplayFromStr")]
    pub user_id: Uuid,
    pub emoji: String,
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub reacted_at: OffsetDateTime,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadReceipt {
    #[serde_as(as = "DisplayFromStr")]
    pub user_id: Uuid,
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub read_at: OffsetDateTime,
}

/// Edit trail; `history` holds previous texts, oldest first.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditInfo {
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub edited_at: OffsetDateTime,
    pub history: Vec<String>,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletionInfo {
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub deleted_at: OffsetDateTime,
    #[serde_as(as = "DisplayFromStr")]
    pub deleted_by: Uuid,
    pub hard: bool,
}

/// Chat message posted in a group.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEntity {
    #[serde(rename = "_id")]
    #[serde_as(as = "DisplayFromStr")]
    pub id: Uuid,
    #[serde_as(as = "DisplayFromStr")]
    pub group_id: Uuid,
    #[serde_as(as = "DisplayFromStr")]
    pub sender_id: Uuid,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub reply_to: Option<Uuid>,
    pub kind: MessageKind,
    pub text: Option<String>,
    pub reactions: Vec<Reaction>,
    pub read_by: Vec<ReadReceipt>,
    pub edited: Option<EditInfo>,
    pub deleted: Option<DeletionInfo>,
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub created_at: OffsetDateTime,
}

impl MessageEntity {
    pub fn new(group_id: Uuid, sender_id: Uuid, kind: MessageKind, text: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            group_id,
            sender_id,
            reply_to: None,
            kind,
            text,
            reactions: Vec::new(),
            read_by: Vec::new(),
            edited: None,
            deleted: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.is_some()
    }

    /// Add the reaction, or remove it when the same user already left that emoji.
    /// Returns `true` when the reaction is now present.
    pub fn toggle_reaction(&mut self, user_id: Uuid, emoji: &str) -> bool {
        let before = self.reactions.len();
        self.reactions
            .retain(|reaction| !(reaction.user_id == user_id && reaction.emoji == emoji));
        if self.reactions.len() != before {
            return false;
        }
        self.reactions.push(Reaction {
            user_id,
            emoji: emoji.to_owned(),
            reacted_at: OffsetDateTime::now_utc(),
        });
        true
    }

    /// Record a read receipt. Returns `false` if the user had already read it.
    pub fn mark_read(&mut self, user_id: Uuid) -> bool {
        if self.read_by.iter().any(|receipt| receipt.user_id == user_id) {
            return false;
        }
        self.read_by.push(ReadReceipt {
            user_id,
            read_at: OffsetDateTime::now_utc(),
        });
        true
    }

    /// Replace the text, keeping the previous one in the edit history.
    pub fn edit(&mut self, text: String) {
        let previous = self.text.replace(text);
        let edited = self.edited.get_or_insert_with(|| EditInfo {
            edited_at: OffsetDateTime::now_utc(),
            history: Vec::new(),
        });
        edited.edited_at = OffsetDateTime::now_utc();
        edited.history.extend(previous);
    }

    /// Soft delete; a hard delete also drops the content.
    pub fn delete(&mut self, deleted_by: Uuid, hard: bool) {
        if hard {
            self.text = None;
            self.reactions.clear();
            if let Some(edited) = self.edited.as_mut() {
                edited.history.clear();
            }
        }
        self.deleted = Some(DeletionInfo {
            deleted_at: OffsetDateTime::now_utc(),
            deleted_by,
            hard,
        });
    }
}
