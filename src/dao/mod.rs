/// In-process store used for tests and storage-less runs.
pub mod memory;
/// Database model definitions.
pub mod models;
#[cfg(feature = "mongo-store")]
pub mod mongodb;
/// Storage abstraction layer for database operations.
pub mod storage;

use futures::future::BoxFuture;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::dao::models::{
    FieldEntity, GameEntity, GroupEntity, MessageEntity, NotificationEntity, UserEntity,
};
use crate::dao::storage::StorageResult;

/// Page of a group's chat history, newest first.
#[derive(Debug, Clone, Copy)]
pub struct MessagePage {
    /// Only messages strictly older than this instant.
    pub before: Option<OffsetDateTime>,
    pub skip: u64,
    pub limit: i64,
}

/// Abstraction over the persistence layer for every aggregate of the app.
pub trait Store: Send + Sync {
    /// Insert a new user; fails with `Duplicate` when the phone number is taken.
    fn insert_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn save_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_user(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;
    fn find_user_by_phone(&self, phone: String) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;

    fn save_group(&self, group: GroupEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_group(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GroupEntity>>>;
    fn find_group_by_invite(&self, code: String) -> BoxFuture<'static, StorageResult<Option<GroupEntity>>>;
    /// Groups `user_id` belongs to, most recently active first.
    fn list_member_groups(&self, user_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<GroupEntity>>>;

    fn save_field(&self, field: FieldEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_field(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<FieldEntity>>>;
    /// Active fields, optionally restricted to a city, sorted by name.
    fn list_fields(&self, city: Option<String>) -> BoxFuture<'static, StorageResult<Vec<FieldEntity>>>;

    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn save_games(&self, games: Vec<GameEntity>) -> BoxFuture<'static, StorageResult<()>>;
    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// Games of the given groups, earliest kick-off first.
    fn list_group_games(&self, group_ids: Vec<Uuid>) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    /// Games on a field kicking off within `[from, to)`.
    fn list_field_games(
        &self,
        field_id: Uuid,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;

    fn save_message(&self, message: MessageEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_message(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MessageEntity>>>;
    /// Non-deleted messages of a group, newest first.
    fn list_messages(
        &self,
        group_id: Uuid,
        page: MessagePage,
    ) -> BoxFuture<'static, StorageResult<Vec<MessageEntity>>>;

    fn save_notifications(
        &self,
        notifications: Vec<NotificationEntity>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    fn save_notification(&self, notification: NotificationEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_notification(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<NotificationEntity>>>;
    /// Notifications of a recipient that were never read, newest first.
    fn list_unread_notifications(
        &self,
        recipient_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<NotificationEntity>>>;
    /// Mark every unread notification of a recipient as read, returning how many changed.
    fn mark_all_notifications_read(
        &self,
        recipient_id: Uuid,
        now: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<u64>>;

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
