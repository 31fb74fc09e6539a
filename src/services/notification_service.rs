//! Stored in-app notifications: creation on domain events and the user's inbox.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    dao::{
        Store,
        models::{NotificationData, NotificationEntity, NotificationKind},
    },
    dto::notification::{MarkAllReadResponse, NotificationResponse, UnreadCountResponse},
    error::ServiceError,
    services::user_service::ActingUser,
    state::SharedState,
};

/// Store one notification of `kind` per recipient.
///
/// Notifications are a side effect of the operation that triggers them, so a storage
/// failure here is logged and swallowed.
pub(crate) async fn notify(
    store: &Arc<dyn Store>,
    kind: NotificationKind,
    recipients: impl IntoIterator<Item = Uuid>,
    data: NotificationData,
) {
    let notifications: Vec<_> = recipients
        .into_iter()
        .map(|recipient| NotificationEntity::new_for(kind, recipient, data.clone()))
        .collect();
    if notifications.is_empty() {
        return;
    }
    let count = notifications.len();
    match store.save_notifications(notifications).await {
        Ok(()) => debug!(?kind, count, "notifications stored"),
        Err(err) => warn!(?kind, error = %err, "failed to store notifications"),
    }
}

async fn unread(
    state: &SharedState,
    actor: &ActingUser,
) -> Result<Vec<NotificationEntity>, ServiceError> {
    let store = state.store().await?;
    let now = OffsetDateTime::now_utc();
    let mut notifications = store.list_unread_notifications(actor.id).await?;
    notifications.retain(|notification| notification.is_unread_at(now));
    Ok(notifications)
}

/// Unread, unexpired notifications of the caller, newest first.
pub async fn list_unread(
    state: &SharedState,
    actor: &ActingUser,
) -> Result<Vec<NotificationResponse>, ServiceError> {
    Ok(unread(state, actor)
        .await?
        .into_iter()
        .map(NotificationResponse::from)
        .collect())
}

pub async fn count_unread(
    state: &SharedState,
    actor: &ActingUser,
) -> Result<UnreadCountResponse, ServiceError> {
    Ok(UnreadCountResponse {
        count: unread(state, actor).await?.len(),
    })
}

pub async fn mark_read(
    state: &SharedState,
    actor: &ActingUser,
    notification_id: Uuid,
) -> Result<NotificationResponse, ServiceError> {
    let store = state.store().await?;
    let mut notification = store
        .find_notification(notification_id)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("notification `{notification_id}` not found"))
        })?;
    if notification.recipient_id != actor.id {
        return Err(ServiceError::Forbidden(
            "notification belongs to another user".into(),
        ));
    }
    notification.mark_read(OffsetDateTime::now_utc());
    store.save_notification(notification.clone()).await?;
    Ok(notification.into())
}

pub async fn mark_all_read(
    state: &SharedState,
    actor: &ActingUser,
) -> Result<MarkAllReadResponse, ServiceError> {
    let store = state.store().await?;
    let updated = store
        .mark_all_notifications_read(actor.id, OffsetDateTime::now_utc())
        .await?;
    Ok(MarkAllReadResponse { updated })
}
