use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::{self, BoxFuture};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::dao::{
    MessagePage, Store,
    models::{FieldEntity, GameEntity, GroupEntity, MessageEntity, NotificationEntity, UserEntity},
    storage::{StorageError, StorageResult},
};

/// Store keeping every aggregate in concurrent maps. Contents vanish with the process.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    users: DashMap<Uuid, UserEntity>,
    phones: DashMap<String, Uuid>,
    groups: DashMap<Uuid, GroupEntity>,
    fields: DashMap<Uuid, FieldEntity>,
    games: DashMap<Uuid, GameEntity>,
    messages: DashMap<Uuid, MessageEntity>,
    notifications: DashMap<Uuid, NotificationEntity>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn values<T: Clone>(map: &DashMap<Uuid, T>, keep: impl Fn(&T) -> bool) -> Vec<T> {
        map.iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect()
    }
}

fn ready<T: Send + 'static>(value: T) -> BoxFuture<'static, StorageResult<T>> {
    Box::pin(future::ready(Ok(value)))
}

impl Store for MemoryStore {
    fn insert_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>> {
        let result = match self.inner.phones.entry(user.phone_number.clone()) {
            Entry::Occupied(_) => Err(StorageError::Duplicate {
                entity: "phone number",
            }),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
                self.inner.users.insert(user.id, user);
                Ok(())
            }
        };
        Box::pin(future::ready(result))
    }

    fn save_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.phones.insert(user.phone_number.clone(), user.id);
        self.inner.users.insert(user.id, user);
        ready(())
    }

    fn find_user(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        ready(self.inner.users.get(&id).map(|user| user.clone()))
    }

    fn find_user_by_phone(&self, phone: String) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let user = self
            .inner
            .phones
            .get(&phone)
            .and_then(|id| self.inner.users.get(id.value()).map(|user| user.clone()));
        ready(user)
    }

    fn save_group(&self, group: GroupEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.groups.insert(group.id, group);
        ready(())
    }

    fn find_group(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GroupEntity>>> {
        ready(self.inner.groups.get(&id).map(|group| group.clone()))
    }

    fn find_group_by_invite(&self, code: String) -> BoxFuture<'static, StorageResult<Option<GroupEntity>>> {
        let group = self
            .inner
            .groups
            .iter()
            .find(|entry| entry.invite_code.as_deref() == Some(code.as_str()))
            .map(|entry| entry.value().clone());
        ready(group)
    }

    fn list_member_groups(&self, user_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<GroupEntity>>> {
        let mut groups = Self::values(&self.inner.groups, |group| group.is_member(user_id));
        groups.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        ready(groups)
    }

    fn save_field(&self, field: FieldEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.fields.insert(field.id, field);
        ready(())
    }

    fn find_field(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<FieldEntity>>> {
        ready(self.inner.fields.get(&id).map(|field| field.clone()))
    }

    fn list_fields(&self, city: Option<String>) -> BoxFuture<'static, StorageResult<Vec<FieldEntity>>> {
        let mut fields = Self::values(&self.inner.fields, |field| {
            field.is_active
                && city
                    .as_deref()
                    .is_none_or(|city| field.location.city == city)
        });
        fields.sort_by(|a, b| a.name.cmp(&b.name));
        ready(fields)
    }

    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.games.insert(game.id, game);
        ready(())
    }

    fn save_games(&self, games: Vec<GameEntity>) -> BoxFuture<'static, StorageResult<()>> {
        for game in games {
            self.inner.games.insert(game.id, game);
        }
        ready(())
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        ready(self.inner.games.get(&id).map(|game| game.clone()))
    }

    fn list_group_games(&self, group_ids: Vec<Uuid>) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let mut games = Self::values(&self.inner.games, |game| group_ids.contains(&game.group_id));
        games.sort_by_key(|game| game.date_time);
        ready(games)
    }

    fn list_field_games(
        &self,
        field_id: Uuid,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let mut games = Self::values(&self.inner.games, |game| {
            game.field_id == field_id && game.date_time >= from && game.date_time < to
        });
        games.sort_by_key(|game| game.date_time);
        ready(games)
    }

    fn save_message(&self, message: MessageEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.messages.insert(message.id, message);
        ready(())
    }

    fn find_message(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MessageEntity>>> {
        ready(self.inner.messages.get(&id).map(|message| message.clone()))
    }

    fn list_messages(
        &self,
        group_id: Uuid,
        page: MessagePage,
    ) -> BoxFuture<'static, StorageResult<Vec<MessageEntity>>> {
        let mut messages = Self::values(&self.inner.messages, |message| {
            message.group_id == group_id
                && !message.is_deleted()
                && page.before.is_none_or(|before| message.created_at < before)
        });
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let page = messages
            .into_iter()
            .skip(usize::try_from(page.skip).unwrap_or(usize::MAX))
            .take(usize::try_from(page.limit).unwrap_or(0))
            .collect();
        ready(page)
    }

    fn save_notifications(
        &self,
        notifications: Vec<NotificationEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        for notification in notifications {
            self.inner.notifications.insert(notification.id, notification);
        }
        ready(())
    }

    fn save_notification(&self, notification: NotificationEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.notifications.insert(notification.id, notification);
        ready(())
    }

    fn find_notification(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<NotificationEntity>>> {
        ready(self.inner.notifications.get(&id).map(|n| n.clone()))
    }

    fn list_unread_notifications(
        &self,
        recipient_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<NotificationEntity>>> {
        let mut notifications = Self::values(&self.inner.notifications, |notification| {
            notification.recipient_id == recipient_id && !notification.is_read()
        });
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        ready(notifications)
    }

    fn mark_all_notifications_read(
        &self,
        recipient_id: Uuid,
        now: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let mut changed = 0;
        for mut entry in self.inner.notifications.iter_mut() {
            if entry.recipient_id == recipient_id && !entry.is_read() {
                entry.mark_read(now);
                changed += 1;
            }
        }
        ready(changed)
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        ready(())
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        ready(())
    }
}
