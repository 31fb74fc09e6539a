use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::{
        DeliveryStatus, NotificationAction, NotificationEntity, NotificationKind, Priority,
    },
    dto::{format_optional, format_timestamp},
};

#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationDataSummary {
    pub group_id: Option<Uuid>,
    pub game_id: Option<Uuid>,
    pub sender_id: Option<Uuid>,
}

/// In-app notification shown in the user's inbox.
#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationResponse {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub data: NotificationDataSummary,
    pub priority: Priority,
    pub status: DeliveryStatus,
    pub read_at: Option<String>,
    pub actions: Vec<NotificationAction>,
    pub expires_at: Option<String>,
    pub created_at: String,
}

impl From<NotificationEntity> for NotificationResponse {
    fn from(notification: NotificationEntity) -> Self {
        Self {
            id: notification.id,
            kind: notification.kind,
            title: notification.title,
            data: NotificationDataSummary {
                group_id: notification.data.group_id,
                game_id: notification.data.game_id,
                sender_id: notification.data.sender_id,
            },
            priority: notification.priority,
            status: notification.status,
            read_at: format_optional(notification.read_at),
            actions: notification.actions,
            expires_at: format_optional(notification.expires_at),
            created_at: format_timestamp(notification.created_at),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UnreadCountResponse {
    pub count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MarkAllReadResponse {
    /// Notifications flipped to read by this call.
    pub updated: u64,
}
