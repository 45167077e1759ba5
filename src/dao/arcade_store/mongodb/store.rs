use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, ClientSession, Collection, Database, IndexModel,
    bson::{Document, doc},
    options::{IndexOptions, ReturnDocument},
};
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection,
    error::{MongoDaoError, MongoResult, duplicate_key_message},
    models::{
        ACCOUNT_COLLECTION, FRIENDSHIP_COLLECTION, MATCH_COLLECTION, MongoAccountDocument,
        MongoFriendshipDocument, MongoMatchDocument, MongoProfileDocument, PROFILE_COLLECTION,
        counters_increment, doc_id,
    },
};
use crate::dao::{
    arcade_store::ArcadeStore,
    models::{
        AccountEntity, FriendshipEntity, FriendshipStatus, GameKind, MatchEntity, MatchRecord,
        PlayerProfileEntity,
    },
    storage::StorageResult,
};

const ACCOUNT_EMAIL_INDEX: &str = "account_email_idx";
const ACCOUNT_HANDLE_INDEX: &str = "account_handle_idx";
const FRIENDSHIP_PAIR_INDEX: &str = "friendship_pair_idx";
const PROFILE_OWNER_INDEX: &str = "profile_owner_game_idx";
const MATCH_GAME_DATE_INDEX: &str = "match_game_date_idx";

const ACCOUNT_UNIQUE_FIELDS: &[(&str, &str)] = &[
    (ACCOUNT_EMAIL_INDEX, "email"),
    (ACCOUNT_HANDLE_INDEX, "handle"),
];
const FRIENDSHIP_UNIQUE_FIELDS: &[(&str, &str)] =
    &[(FRIENDSHIP_PAIR_INDEX, "sender_id,receiver_id")];

#[derive(Clone)]
pub struct MongoArcadeStore {
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

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        connection::ping(&database)
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) = connection::open(&self.config).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoArcadeStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) = connection::open(&config).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;
        let indexes: [(&'static str, &'static str, Document, bool); 5] = [
            (
                ACCOUNT_COLLECTION,
                ACCOUNT_EMAIL_INDEX,
                doc! {"email": 1},
                true,
            ),
            (
                ACCOUNT_COLLECTION,
                ACCOUNT_HANDLE_INDEX,
                doc! {"handle": 1},
                true,
            ),
            (
                FRIENDSHIP_COLLECTION,
                FRIENDSHIP_PAIR_INDEX,
                doc! {"sender_id": 1, "receiver_id": 1},
                true,
            ),
            (
                PROFILE_COLLECTION,
                PROFILE_OWNER_INDEX,
                doc! {"account_id": 1, "game": 1},
                true,
            ),
            (
                MATCH_COLLECTION,
                MATCH_GAME_DATE_INDEX,
                doc! {"game": 1, "date": -1},
                false,
            ),
        ];

        for (collection, name, keys, unique) in indexes {
            let model = IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .name(Some(name.to_owned()))
                        .unique(Some(unique))
                        .build(),
                )
                .build();

            database
                .collection::<Document>(collection)
                .create_index(model)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection,
                    index: name,
                    source,
                })?;
        }

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn client(&self) -> Client {
        let guard = self.inner.state.read().await;
        guard.client.clone()
    }

    async fn accounts(&self) -> Collection<MongoAccountDocument> {
        self.database().await.collection(ACCOUNT_COLLECTION)
    }

    async fn friendships(&self) -> Collection<MongoFriendshipDocument> {
        self.database().await.collection(FRIENDSHIP_COLLECTION)
    }

    async fn profiles(&self) -> Collection<MongoProfileDocument> {
        self.database().await.collection(PROFILE_COLLECTION)
    }

    async fn matches(&self) -> Collection<MongoMatchDocument> {
        self.database().await.collection(MATCH_COLLECTION)
    }

    async fn insert_account(&self, account: AccountEntity) -> MongoResult<()> {
        let document: MongoAccountDocument = account.into();
        self.accounts()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| {
                MongoDaoError::from_write(ACCOUNT_COLLECTION, ACCOUNT_UNIQUE_FIELDS, source)
            })?;
        Ok(())
    }

    async fn save_account(&self, account: AccountEntity) -> MongoResult<()> {
        let id = account.id;
        let document: MongoAccountDocument = account.into();
        let result = self
            .accounts()
            .await
            .replace_one(doc_id(id), &document)
            .await
            .map_err(|source| {
                MongoDaoError::from_write(ACCOUNT_COLLECTION, ACCOUNT_UNIQUE_FIELDS, source)
            })?;
        if result.matched_count == 0 {
            return Err(MongoDaoError::Missing {
                entity: "account",
                id,
            });
        }
        Ok(())
    }

    async fn find_account_where(&self, filter: Document) -> MongoResult<Option<AccountEntity>> {
        self.accounts()
            .await
            .find_one(filter)
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: ACCOUNT_COLLECTION,
                source,
            })?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn search_accounts(&self, fragment: String) -> MongoResult<Vec<AccountEntity>> {
        let filter = doc! {"username": {"$regex": escape_regex(&fragment), "$options": "i"}};
        let documents: Vec<MongoAccountDocument> = self
            .accounts()
            .await
            .find(filter)
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: ACCOUNT_COLLECTION,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: ACCOUNT_COLLECTION,
                source,
            })?;
        documents.into_iter().map(TryInto::try_into).collect()
    }

    async fn handle_suffix_taken(&self, suffix: String) -> MongoResult<bool> {
        let pattern = format!("#{}$", escape_regex(&suffix));
        let count = self
            .accounts()
            .await
            .count_documents(doc! {"handle": {"$regex": pattern}})
            .limit(1)
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: ACCOUNT_COLLECTION,
                source,
            })?;
        Ok(count > 0)
    }

    async fn insert_friendship(&self, friendship: FriendshipEntity) -> MongoResult<()> {
        let document: MongoFriendshipDocument = friendship.into();
        self.friendships()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| {
                MongoDaoError::from_write(FRIENDSHIP_COLLECTION, FRIENDSHIP_UNIQUE_FIELDS, source)
            })?;
        Ok(())
    }

    async fn save_friendship(&self, friendship: FriendshipEntity) -> MongoResult<()> {
        let id = friendship.id;
        let document: MongoFriendshipDocument = friendship.into();
        let result = self
            .friendships()
            .await
            .replace_one(doc_id(id), &document)
            .await
            .map_err(|source| {
                MongoDaoError::from_write(FRIENDSHIP_COLLECTION, FRIENDSHIP_UNIQUE_FIELDS, source)
            })?;
        if result.matched_count == 0 {
            return Err(MongoDaoError::Missing {
                entity: "friendship",
                id,
            });
        }
        Ok(())
    }

    async fn find_friendship_where(
        &self,
        filter: Document,
    ) -> MongoResult<Option<FriendshipEntity>> {
        self.friendships()
            .await
            .find_one(filter)
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: FRIENDSHIP_COLLECTION,
                source,
            })?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn list_friendships(
        &self,
        account_id: Uuid,
        status: FriendshipStatus,
    ) -> MongoResult<Vec<FriendshipEntity>> {
        let account_id = account_id.to_string();
        let filter = doc! {
            "status": status.to_string(),
            "$or": [{"sender_id": &account_id}, {"receiver_id": &account_id}],
        };
        let documents: Vec<MongoFriendshipDocument> = self
            .friendships()
            .await
            .find(filter)
            .sort(doc! {"created_at": 1})
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: FRIENDSHIP_COLLECTION,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: FRIENDSHIP_COLLECTION,
                source,
            })?;
        documents.into_iter().map(TryInto::try_into).collect()
    }

    async fn find_profile(
        &self,
        account_id: Uuid,
        game: GameKind,
    ) -> MongoResult<Option<PlayerProfileEntity>> {
        self.profiles()
            .await
            .find_one(doc! {"account_id": account_id.to_string(), "game": game.as_str()})
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: PROFILE_COLLECTION,
                source,
            })?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn find_or_create_profile(
        &self,
        account_id: Uuid,
        game: GameKind,
    ) -> MongoResult<(PlayerProfileEntity, bool)> {
        if let Some(existing) = self.find_profile(account_id, game).await? {
            return Ok((existing, false));
        }

        let profile = PlayerProfileEntity::new(account_id, game);
        let document: MongoProfileDocument = profile.clone().into();
        match self.profiles().await.insert_one(&document).await {
            Ok(_) => Ok((profile, true)),
            // A concurrent request created it first; the unique index guarantees one winner.
            Err(source) if duplicate_key_message(&source).is_some() => self
                .find_profile(account_id, game)
                .await?
                .map(|existing| (existing, false))
                .ok_or(MongoDaoError::Missing {
                    entity: "profile",
                    id: profile.id,
                }),
            Err(source) => Err(MongoDaoError::Write {
                collection: PROFILE_COLLECTION,
                source,
            }),
        }
    }

    async fn increment_tournament_wins(&self, profile_id: Uuid) -> MongoResult<PlayerProfileEntity> {
        self.profiles()
            .await
            .find_one_and_update(
                doc_id(profile_id),
                doc! {"$inc": {"counters.tournaments_won": 1_i64}},
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: PROFILE_COLLECTION,
                source,
            })?
            .ok_or(MongoDaoError::Missing {
                entity: "profile",
                id: profile_id,
            })?
            .try_into()
    }

    async fn record_match(&self, record: MatchRecord) -> MongoResult<MatchEntity> {
        let client = self.client().await;
        let mut session = client
            .start_session()
            .await
            .map_err(|source| MongoDaoError::Transaction { source })?;
        session
            .start_transaction()
            .await
            .map_err(|source| MongoDaoError::Transaction { source })?;

        match self.apply_match(&mut session, &record).await {
            Ok(()) => {
                session
                    .commit_transaction()
                    .await
                    .map_err(|source| MongoDaoError::Transaction { source })?;
                Ok(record.entity)
            }
            Err(err) => {
                if let Err(abort_err) = session.abort_transaction().await {
                    warn!(error = %abort_err, "failed to abort match transaction");
                }
                Err(err)
            }
        }
    }

    /// Transaction body of [`Self::record_match`]: both `$inc` updates, then the insert.
    async fn apply_match(
        &self,
        session: &mut ClientSession,
        record: &MatchRecord,
    ) -> MongoResult<()> {
        let profiles = self.profiles().await;
        let mut updates = vec![(record.entity.player1_profile_id, record.player1_delta)];
        if let (Some(player2), Some(delta)) =
            (record.entity.player2_profile_id, record.player2_delta)
        {
            updates.push((player2, delta));
        }

        for (profile_id, delta) in updates {
            let result = profiles
                .update_one(doc_id(profile_id), counters_increment(&delta))
                .session(&mut *session)
                .await
                .map_err(|source| MongoDaoError::Transaction { source })?;
            if result.matched_count == 0 {
                return Err(MongoDaoError::Missing {
                    entity: "profile",
                    id: profile_id,
                });
            }
        }

        let document: MongoMatchDocument = record.entity.clone().into();
        self.matches()
            .await
            .insert_one(&document)
            .session(&mut *session)
            .await
            .map_err(|source| MongoDaoError::Transaction { source })?;
        Ok(())
    }

    async fn list_matches(&self, game: GameKind, profile_id: Uuid) -> MongoResult<Vec<MatchEntity>> {
        let profile_id = profile_id.to_string();
        let filter = doc! {
            "game": game.as_str(),
            "$or": [{"player1_profile_id": &profile_id}, {"player2_profile_id": &profile_id}],
        };
        let documents: Vec<MongoMatchDocument> = self
            .matches()
            .await
            .find(filter)
            .sort(doc! {"date": -1})
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: MATCH_COLLECTION,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: MATCH_COLLECTION,
                source,
            })?;
        documents.into_iter().map(TryInto::try_into).collect()
    }

    async fn leaderboard(
        &self,
        game: GameKind,
        limit: usize,
    ) -> MongoResult<Vec<PlayerProfileEntity>> {
        let documents: Vec<MongoProfileDocument> = self
            .profiles()
            .await
            .find(doc! {"game": game.as_str(), "counters.total_played": {"$gt": 0_i64}})
            .sort(doc! {"counters.total_won": -1, "created_at": 1})
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: PROFILE_COLLECTION,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: PROFILE_COLLECTION,
                source,
            })?;
        documents.into_iter().map(TryInto::try_into).collect()
    }
}

impl ArcadeStore for MongoArcadeStore {
    fn insert_account(&self, account: AccountEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_account(account).await.map_err(Into::into) })
    }

    fn save_account(&self, account: AccountEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_account(account).await.map_err(Into::into) })
    }

    fn find_account(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<AccountEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_account_where(doc_id(id))
                .await
                .map_err(Into::into)
        })
    }

    fn find_account_by_email(
        &self,
        email: String,
    ) -> BoxFuture<'static, StorageResult<Option<AccountEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_account_where(doc! {"email": email})
                .await
                .map_err(Into::into)
        })
    }

    fn find_account_by_handle(
        &self,
        handle: String,
    ) -> BoxFuture<'static, StorageResult<Option<AccountEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_account_where(doc! {"handle": handle})
                .await
                .map_err(Into::into)
        })
    }

    fn search_accounts(
        &self,
        fragment: String,
    ) -> BoxFuture<'static, StorageResult<Vec<AccountEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.search_accounts(fragment).await.map_err(Into::into) })
    }

    fn handle_suffix_taken(&self, suffix: String) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.handle_suffix_taken(suffix).await.map_err(Into::into) })
    }

    fn insert_friendship(
        &self,
        friendship: FriendshipEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_friendship(friendship).await.map_err(Into::into) })
    }

    fn save_friendship(
        &self,
        friendship: FriendshipEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_friendship(friendship).await.map_err(Into::into) })
    }

    fn find_friendship_between(
        &self,
        first: Uuid,
        second: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<FriendshipEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let (first, second) = (first.to_string(), second.to_string());
            let filter = doc! {"$or": [
                {"sender_id": &first, "receiver_id": &second},
                {"sender_id": &second, "receiver_id": &first},
            ]};
            store.find_friendship_where(filter).await.map_err(Into::into)
        })
    }

    fn find_friendship(
        &self,
        sender: Uuid,
        receiver: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<FriendshipEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let filter = doc! {"sender_id": sender.to_string(), "receiver_id": receiver.to_string()};
            store.find_friendship_where(filter).await.map_err(Into::into)
        })
    }

    fn list_friendships(
        &self,
        account_id: Uuid,
        status: FriendshipStatus,
    ) -> BoxFuture<'static, StorageResult<Vec<FriendshipEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_friendships(account_id, status)
                .await
                .map_err(Into::into)
        })
    }

    fn find_or_create_profile(
        &self,
        account_id: Uuid,
        game: GameKind,
    ) -> BoxFuture<'static, StorageResult<(PlayerProfileEntity, bool)>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_or_create_profile(account_id, game)
                .await
                .map_err(Into::into)
        })
    }

    fn find_profile(
        &self,
        account_id: Uuid,
        game: GameKind,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerProfileEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_profile(account_id, game)
                .await
                .map_err(Into::into)
        })
    }

    fn increment_tournament_wins(
        &self,
        profile_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<PlayerProfileEntity>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .increment_tournament_wins(profile_id)
                .await
                .map_err(Into::into)
        })
    }

    fn record_match(&self, record: MatchRecord) -> BoxFuture<'static, StorageResult<MatchEntity>> {
        let store = self.clone();
        Box::pin(async move { store.record_match(record).await.map_err(Into::into) })
    }

    fn list_matches(
        &self,
        game: GameKind,
        profile_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_matches(game, profile_id)
                .await
                .map_err(Into::into)
        })
    }

    fn leaderboard(
        &self,
        game: GameKind,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayerProfileEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.leaderboard(game, limit).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}

/// Escape regex metacharacters so user input is matched literally.
fn escape_regex(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if "\\^$.|?*+()[]{}".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
