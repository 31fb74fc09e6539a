use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, TimestampMilliSeconds, serde_as};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// Event a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    GameInvitation,
    GameReminder,
    GameCancelled,
    GameConfirmed,
    GameTeamsSet,
    GroupInvitation,
    GroupJoined,
    MessageMention,
    PaymentReminder,
    WaitlistPromoted,
}

impl NotificationKind {
    /// Fixed title shown to the recipient.
    pub fn title(self) -> &'static str {
        match self {
            Self::GameInvitation => "New game scheduled!",
            Self::GameReminder => "Game reminder",
            Self::GameCancelled => "Game cancelled",
            Self::GameConfirmed => "Game confirmed!",
            Self::GameTeamsSet => "Teams are set",
            Self::GroupInvitation => "Group invitation",
            Self::GroupJoined => "New group member",
            Self::MessageMention => "You were mentioned",
            Self::PaymentReminder => "Payment pending",
            Self::WaitlistPromoted => "You're in!",
        }
    }

    fn default_actions(self) -> Vec<NotificationAction> {
        use ActionKind::*;
        let actions: &[(ActionKind, &str)] = match self {
            Self::GameInvitation => &[(Confirm, "Confirm"), (Decline, "Can't make it"), (View, "View details")],
            Self::GameReminder => &[(View, "View game")],
            Self::GameTeamsSet => &[(View, "View teams")],
            Self::GroupInvitation => &[(Confirm, "Accept"), (Decline, "Decline")],
            _ => &[(View, "View")],
        };
        actions
            .iter()
            .map(|(kind, label)| NotificationAction {
                kind: *kind,
                label: (*label).to_owned(),
                taken: false,
            })
            .collect()
    }

    fn default_priority(self) -> Priority {
        match self {
            Self::GameCancelled => Priority::High,
            _ => Priority::Normal,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

/// Delivery state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    #[default]
    Pending,
    Sent,
    Delivered,
    Read,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Confirm,
    Decline,
    View,
}

/// Button offered with a notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NotificationAction {
    pub kind: ActionKind,
    pub label: String,
    pub taken: bool,
}

/// Entities a notification points at.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationData {
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub group_id: Option<Uuid>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub game_id: Option<Uuid>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub sender_id: Option<Uuid>,
}

/// Stored in-app notification.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEntity {
    #[serde(rename = "_id")]
    #[serde_as(as = "DisplayFromStr")]
    pub id: Uuid,
    #[serde_as(as = "DisplayFromStr")]
    pub recipient_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub data: NotificationData,
    pub priority: Priority,
    pub status: DeliveryStatus,
    #[serde_as(as = "Option<TimestampMilliSeconds<i64>>")]
    pub read_at: Option<OffsetDateTime>,
    pub actions: Vec<NotificationAction>,
    #[serde_as(as = "Option<TimestampMilliSeconds<i64>>")]
    pub expires_at: Option<OffsetDateTime>,
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub created_at: OffsetDateTime,
}

impl NotificationEntity {
    /// Build a notification with the kind's title, priority and actions.
    pub fn new_for(kind: NotificationKind, recipient_id: Uuid, data: NotificationData) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipient_id,
            kind,
            title: kind.title().to_owned(),
            data,
            priority: kind.default_priority(),
            status: DeliveryStatus::Pending,
            read_at: None,
            actions: kind.default_actions(),
            expires_at: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }

    /// Unread, not failed and not expired at `now`.
    pub fn is_unread_at(&self, now: OffsetDateTime) -> bool {
        !self.is_read()
            && self.status != DeliveryStatus::Failed
            && self.expires_at.is_none_or(|expires_at| expires_at > now)
    }

    pub fn mark_read(&mut self, now: OffsetDateTime) {
        if self.read_at.is_none() {
            self.read_at = Some(now);
        }
        self.status = DeliveryStatus::Read;
    }
}
