use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{Document, doc},
    options::IndexOptions,
};
use serde::{Serialize, de::DeserializeOwned};
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult, is_duplicate_key},
};
use crate::dao::{
    MessagePage, Store,
    models::{
        FieldEntity, GameEntity, GroupEntity, MessageEntity, NotificationEntity, UserEntity,
    },
    storage::{StorageError, StorageResult},
};

const USERS: &str = "users";
const GROUPS: &str = "groups";
const FIELDS: &str = "fields";
const GAMES: &str = "games";
const MESSAGES: &str = "messages";
const NOTIFICATIONS: &str = "notifications";

/// Store persisting every aggregate as one document per entity.
#[derive(Clone)]
pub struct MongoStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

/// Timestamp as persisted by `TimestampMilliSeconds`, for range filters.
fn unix_millis(at: OffsetDateTime) -> i64 {
    at.unix_timestamp() * 1_000 + i64::from(at.millisecond())
}

struct IndexDefinition {
    collection: &'static str,
    name: &'static str,
    keys: Document,
    unique: bool,
    sparse: bool,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

fn by_id(id: Uuid) -> Document {
    doc! { "_id": id.to_string() }
}

impl MongoStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        info!("MongoDB indexes ensured");
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let definitions = [
            IndexDefinition {
                collection: USERS,
                name: "user_phone_idx",
                keys: doc! { "phone_number": 1 },
                unique: true,
                sparse: false,
            },
            IndexDefinition {
                collection: GROUPS,
                name: "group_invite_idx",
                keys: doc! { "invite_code": 1 },
                unique: true,
                sparse: true,
            },
            IndexDefinition {
                collection: GROUPS,
                name: "group_member_idx",
                keys: doc! { "members.user_id": 1 },
                unique: false,
                sparse: false,
            },
            IndexDefinition {
                collection: GAMES,
                name: "game_group_date_idx",
                keys: doc! { "group_id": 1, "date_time": 1 },
                unique: false,
                sparse: false,
            },
            IndexDefinition {
                collection: GAMES,
                name: "game_field_date_idx",
                keys: doc! { "field_id": 1, "date_time": 1 },
                unique: false,
                sparse: false,
            },
            IndexDefinition {
                collection: MESSAGES,
                name: "message_group_created_idx",
                keys: doc! { "group_id": 1, "created_at": -1 },
                unique: false,
                sparse: false,
            },
            IndexDefinition {
                collection: NOTIFICATIONS,
                name: "notification_recipient_created_idx",
                keys: doc! { "recipient_id": 1, "created_at": -1 },
                unique: false,
                sparse: false,
            },
        ];

        let database = self.database().await;
        for definition in definitions {
            let index = IndexModel::builder()
                .keys(definition.keys)
                .options(
                    IndexOptions::builder()
                        .name(Some(definition.name.to_owned()))
                        .unique(Some(definition.unique))
                        .sparse(Some(definition.sparse))
                        .build(),
                )
                .build();
            database
                .collection::<Document>(definition.collection)
                .create_index(index)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection: definition.collection,
                    index: definition.name,
                    source,
                })?;
        }
        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        let guard = self.inner.state.read().await;
        guard.database.collection::<T>(name)
    }

    async fn upsert<T>(&self, name: &'static str, id: Uuid, value: &T) -> MongoResult<()>
    where
        T: Serialize + Send + Sync,
    {
        self.collection::<T>(name)
            .await
            .replace_one(by_id(id), value)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::Save {
                collection: name,
                id,
                source,
            })?;
        Ok(())
    }

    async fn find_one<T>(&self, name: &'static str, filter: Document) -> MongoResult<Option<T>>
    where
        T: DeserializeOwned + Send + Sync,
    {
        self.collection::<T>(name)
            .await
            .find_one(filter)
            .await
            .map_err(|source| MongoDaoError::Load {
                collection: name,
                source,
            })
    }

    async fn find_many<T>(
        &self,
        name: &'static str,
        filter: Document,
        sort: Document,
        skip: Option<u64>,
        limit: Option<i64>,
    ) -> MongoResult<Vec<T>>
    where
        T: DeserializeOwned + Send + Sync + Unpin,
    {
        let load_error = |source| MongoDaoError::Load {
            collection: name,
            source,
        };
        let collection = self.collection::<T>(name).await;
        let mut query = collection.find(filter).sort(sort);
        if let Some(skip) = skip {
            query = query.skip(skip);
        }
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        query
            .await
            .map_err(load_error)?
            .try_collect()
            .await
            .map_err(load_error)
    }

    async fn insert_user(&self, user: UserEntity) -> StorageResult<()> {
        let id = user.id;
        match self.collection::<UserEntity>(USERS).await.insert_one(&user).await {
            Ok(_) => Ok(()),
            Err(source) if is_duplicate_key(&source) => Err(StorageError::Duplicate {
                entity: "phone number",
            }),
            Err(source) => Err(MongoDaoError::Save {
                collection: USERS,
                id,
                source,
            }
            .into()),
        }
    }

    async fn list_field_games(
        &self,
        field_id: Uuid,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> MongoResult<Vec<GameEntity>> {
        let filter = doc! {
            "field_id": field_id.to_string(),
            "date_time": { "$gte": unix_millis(from), "$lt": unix_millis(to) },
        };
        self.find_many(GAMES, filter, doc! { "date_time": 1 }, None, None)
            .await
    }

    async fn list_messages(&self, group_id: Uuid, page: MessagePage) -> MongoResult<Vec<MessageEntity>> {
        let mut filter = doc! { "group_id": group_id.to_string(), "deleted": null };
        if let Some(before) = page.before {
            filter.insert("created_at", doc! { "$lt": unix_millis(before) });
        }
        self.find_many(
            MESSAGES,
            filter,
            doc! { "created_at": -1 },
            Some(page.skip),
            Some(page.limit),
        )
        .await
    }

    async fn mark_all_read(&self, recipient_id: Uuid, now: OffsetDateTime) -> MongoResult<u64> {
        let result = self
            .collection::<Document>(NOTIFICATIONS)
            .await
            .update_many(
                doc! { "recipient_id": recipient_id.to_string(), "read_at": null },
                doc! { "$set": { "read_at": unix_millis(now), "status": "read" } },
            )
            .await
            .map_err(|source| MongoDaoError::Update {
                collection: NOTIFICATIONS,
                source,
            })?;
        Ok(result.modified_count)
    }
}

macro_rules! boxed {
    ($store:expr, |$s:ident| $body:expr) => {{
        let $s = $store.clone();
        Box::pin(async move { $body.await.map_err(Into::into) })
    }};
}

impl Store for MongoStore {
    fn insert_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_user(user).await })
    }

    fn save_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>> {
        boxed!(self, |store| store.upsert(USERS, user.id, &user))
    }

    fn find_user(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        boxed!(self, |store| store.find_one(USERS, by_id(id)))
    }

    fn find_user_by_phone(&self, phone: String) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        boxed!(self, |store| store.find_one(USERS, doc! { "phone_number": phone }))
    }

    fn save_group(&self, group: GroupEntity) -> BoxFuture<'static, StorageResult<()>> {
        boxed!(self, |store| store.upsert(GROUPS, group.id, &group))
    }

    fn find_group(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GroupEntity>>> {
        boxed!(self, |store| store.find_one(GROUPS, by_id(id)))
    }

    fn find_group_by_invite(&self, code: String) -> BoxFuture<'static, StorageResult<Option<GroupEntity>>> {
        boxed!(self, |store| store.find_one(GROUPS, doc! { "invite_code": code }))
    }

    fn list_member_groups(&self, user_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<GroupEntity>>> {
        boxed!(self, |store| store.find_many(
            GROUPS,
            doc! { "members.user_id": user_id.to_string() },
            doc! { "last_activity": -1 },
            None,
            None,
        ))
    }

    fn save_field(&self, field: FieldEntity) -> BoxFuture<'static, StorageResult<()>> {
        boxed!(self, |store| store.upsert(FIELDS, field.id, &field))
    }

    fn find_field(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<FieldEntity>>> {
        boxed!(self, |store| store.find_one(FIELDS, by_id(id)))
    }

    fn list_fields(&self, city: Option<String>) -> BoxFuture<'static, StorageResult<Vec<FieldEntity>>> {
        let mut filter = doc! { "is_active": true };
        if let Some(city) = city {
            filter.insert("location.city", city);
        }
        boxed!(self, |store| store.find_many(FIELDS, filter, doc! { "name": 1 }, None, None))
    }

    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        boxed!(self, |store| store.upsert(GAMES, game.id, &game))
    }

    fn save_games(&self, games: Vec<GameEntity>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            for game in &games {
                store.upsert(GAMES, game.id, game).await?;
            }
            Ok(())
        })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        boxed!(self, |store| store.find_one(GAMES, by_id(id)))
    }

    fn list_group_games(&self, group_ids: Vec<Uuid>) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let ids: Vec<String> = group_ids.iter().map(Uuid::to_string).collect();
        boxed!(self, |store| store.find_many(
            GAMES,
            doc! { "group_id": { "$in": ids } },
            doc! { "date_time": 1 },
            None,
            None,
        ))
    }

    fn list_field_games(
        &self,
        field_id: Uuid,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        boxed!(self, |store| store.list_field_games(field_id, from, to))
    }

    fn save_message(&self, message: MessageEntity) -> BoxFuture<'static, StorageResult<()>> {
        boxed!(self, |store| store.upsert(MESSAGES, message.id, &message))
    }

    fn find_message(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MessageEntity>>> {
        boxed!(self, |store| store.find_one(MESSAGES, by_id(id)))
    }

    fn list_messages(
        &self,
        group_id: Uuid,
        page: MessagePage,
    ) -> BoxFuture<'static, StorageResult<Vec<MessageEntity>>> {
        boxed!(self, |store| store.list_messages(group_id, page))
    }

    fn save_notifications(
        &self,
        notifications: Vec<NotificationEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            if notifications.is_empty() {
                return Ok(());
            }
            store
                .collection::<NotificationEntity>(NOTIFICATIONS)
                .await
                .insert_many(&notifications)
                .await
                .map_err(|source| MongoDaoError::Update {
                    collection: NOTIFICATIONS,
                    source,
                })?;
            Ok(())
        })
    }

    fn save_notification(&self, notification: NotificationEntity) -> BoxFuture<'static, StorageResult<()>> {
        boxed!(self, |store| store.upsert(NOTIFICATIONS, notification.id, &notification))
    }

    fn find_notification(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<NotificationEntity>>> {
        boxed!(self, |store| store.find_one(NOTIFICATIONS, by_id(id)))
    }

    fn list_unread_notifications(
        &self,
        recipient_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<NotificationEntity>>> {
        boxed!(self, |store| store.find_many(
            NOTIFICATIONS,
            doc! { "recipient_id": recipient_id.to_string(), "read_at": null },
            doc! { "created_at": -1 },
            None,
            None,
        ))
    }

    fn mark_all_notifications_read(
        &self,
        recipient_id: Uuid,
        now: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        boxed!(self, |store| store.mark_all_read(recipient_id, now))
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        boxed!(self, |store| store.inner.ping())
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        boxed!(self, |store| store.inner.reconnect())
    }
}
