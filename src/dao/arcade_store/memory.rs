//! In-process storage backend, used for local runs and tests.
//!
//! Every write takes the single state lock, so concurrent read-modify-write cycles on the
//! same profile are serialized.

use std::sync::Arc;

use futures::future::BoxFuture;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dao::{
    arcade_store::ArcadeStore,
    models::{
        AccountEntity, FriendshipEntity, FriendshipStatus, GameKind, MatchEntity, MatchRecord,
        PlayerProfileEntity,
    },
    storage::{StorageError, StorageResult},
};

#[derive(Clone, Default)]
pub struct MemoryArcadeStore {
    inner: Arc<RwLock<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    accounts: IndexMap<Uuid, AccountEntity>,
    friendships: IndexMap<Uuid, FriendshipEntity>,
    profiles: IndexMap<Uuid, PlayerProfileEntity>,
    matches: Vec<MatchEntity>,
}

impl MemoryState {
    /// Reject an account whose email or handle belongs to another record.
    fn check_account_unique(&self, account: &AccountEntity) -> StorageResult<()> {
        for other in self.accounts.values().filter(|other| other.id != account.id) {
            if other.email == account.email {
                return Err(StorageError::Duplicate { field: "email" });
            }
            if other.handle == account.handle {
                return Err(StorageError::Duplicate { field: "handle" });
            }
        }
        Ok(())
    }

    fn profile_mut(&mut self, id: Uuid) -> StorageResult<&mut PlayerProfileEntity> {
        self.profiles.get_mut(&id).ok_or(StorageError::Missing {
            entity: "profile",
            id,
        })
    }
}

impl MemoryArcadeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArcadeStore for MemoryArcadeStore {
    fn insert_account(&self, account: AccountEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut state = inner.write().await;
            state.check_account_unique(&account)?;
            state.accounts.insert(account.id, account);
            Ok(())
        })
    }

    fn save_account(&self, account: AccountEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut state = inner.write().await;
            if !state.accounts.contains_key(&account.id) {
                return Err(StorageError::Missing {
                    entity: "account",
                    id: account.id,
                });
            }
            state.check_account_unique(&account)?;
            state.accounts.insert(account.id, account);
            Ok(())
        })
    }

    fn find_account(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<AccountEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.read().await.accounts.get(&id).cloned()) })
    }

    fn find_account_by_email(
        &self,
        email: String,
    ) -> BoxFuture<'static, StorageResult<Option<AccountEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let state = inner.read().await;
            Ok(state
                .accounts
                .values()
                .find(|account| account.email == email)
                .cloned())
        })
    }

    fn find_account_by_handle(
        &self,
        handle: String,
    ) -> BoxFuture<'static, StorageResult<Option<AccountEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let state = inner.read().await;
            Ok(state
                .accounts
                .values()
                .find(|account| account.handle == handle)
                .cloned())
        })
    }

    fn search_accounts(
        &self,
        fragment: String,
    ) -> BoxFuture<'static, StorageResult<Vec<AccountEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let needle = fragment.to_lowercase();
            let state = inner.read().await;
            Ok(state
                .accounts
                .values()
                .filter(|account| account.username.to_lowercase().contains(&needle))
                .cloned()
                .collect())
        })
    }

    fn handle_suffix_taken(&self, suffix: String) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let tail = format!("#{suffix}");
            let state = inner.read().await;
            Ok(state
                .accounts
                .values()
                .any(|account| account.handle.ends_with(&tail)))
        })
    }

    fn insert_friendship(
        &self,
        friendship: FriendshipEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut state = inner.write().await;
            let (sender, receiver) = (friendship.sender_id, friendship.receiver_id);
            let exists = state.friendships.values().any(|existing| {
                (existing.sender_id, existing.receiver_id) == (sender, receiver)
                    || (existing.sender_id, existing.receiver_id) == (receiver, sender)
            });
            if exists {
                return Err(StorageError::Duplicate {
                    field: "sender_id,receiver_id",
                });
            }
            state.friendships.insert(friendship.id, friendship);
            Ok(())
        })
    }

    fn save_friendship(
        &self,
        friendship: FriendshipEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut state = inner.write().await;
            match state.friendships.get_mut(&friendship.id) {
                Some(slot) => {
                    *slot = friendship;
                    Ok(())
                }
                None => Err(StorageError::Missing {
                    entity: "friendship",
                    id: friendship.id,
                }),
            }
        })
    }

    fn find_friendship_between(
        &self,
        first: Uuid,
        second: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<FriendshipEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let state = inner.read().await;
            Ok(state
                .friendships
                .values()
                .find(|friendship| {
                    (friendship.sender_id == first && friendship.receiver_id == second)
                        || (friendship.sender_id == second && friendship.receiver_id == first)
                })
                .cloned())
        })
    }

    fn find_friendship(
        &self,
        sender: Uuid,
        receiver: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<FriendshipEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let state = inner.read().await;
            Ok(state
                .friendships
                .values()
                .find(|friendship| {
                    friendship.sender_id == sender && friendship.receiver_id == receiver
                })
                .cloned())
        })
    }

    fn list_friendships(
        &self,
        account_id: Uuid,
        status: FriendshipStatus,
    ) -> BoxFuture<'static, StorageResult<Vec<FriendshipEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let state = inner.read().await;
            Ok(state
                .friendships
                .values()
                .filter(|friendship| friendship.status == status && friendship.involves(account_id))
                .cloned()
                .collect())
        })
    }

    fn find_or_create_profile(
        &self,
        account_id: Uuid,
        game: GameKind,
    ) -> BoxFuture<'static, StorageResult<(PlayerProfileEntity, bool)>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut state = inner.write().await;
            if let Some(existing) = state
                .profiles
                .values()
                .find(|profile| profile.account_id == account_id && profile.game == game)
            {
                return Ok((existing.clone(), false));
            }
            let profile = PlayerProfileEntity::new(account_id, game);
            state.profiles.insert(profile.id, profile.clone());
            Ok((profile, true))
        })
    }

    fn find_profile(
        &self,
        account_id: Uuid,
        game: GameKind,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerProfileEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let state = inner.read().await;
            Ok(state
                .profiles
                .values()
                .find(|profile| profile.account_id == account_id && profile.game == game)
                .cloned())
        })
    }

    fn increment_tournament_wins(
        &self,
        profile_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<PlayerProfileEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut state = inner.write().await;
            let profile = state.profile_mut(profile_id)?;
            profile.counters.tournaments_won += 1;
            Ok(profile.clone())
        })
    }

    fn record_match(&self, record: MatchRecord) -> BoxFuture<'static, StorageResult<MatchEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut state = inner.write().await;
            let MatchRecord {
                entity,
                player1_delta,
                player2_delta,
            } = record;

            // Validate both targets before touching anything so a failure leaves no trace.
            state.profile_mut(entity.player1_profile_id)?;
            if let Some(player2) = entity.player2_profile_id {
                state.profile_mut(player2)?;
            }

            state
                .profile_mut(entity.player1_profile_id)?
                .counters
                .apply(&player1_delta);
            if let (Some(player2), Some(delta)) = (entity.player2_profile_id, player2_delta) {
                state.profile_mut(player2)?.counters.apply(&delta);
            }
            state.matches.push(entity.clone());
            Ok(entity)
        })
    }

    fn list_matches(
        &self,
        game: GameKind,
        profile_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let state = inner.read().await;
            let mut matches: Vec<MatchEntity> = state
                .matches
                .iter()
                .filter(|entry| entry.game == game && entry.involves(profile_id))
                .cloned()
                .collect();
            // Insertion order breaks ties between identical timestamps.
            matches.reverse();
            matches.sort_by(|a, b| b.date.cmp(&a.date));
            Ok(matches)
        })
    }

    fn leaderboard(
        &self,
        game: GameKind,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayerProfileEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let state = inner.read().await;
            let mut ranked: Vec<PlayerProfileEntity> = state
                .profiles
                .values()
                .filter(|profile| profile.game == game && profile.counters.total_played > 0)
                .cloned()
                .collect();
            ranked.sort_by(|a, b| b.counters.total_won.cmp(&a.counters.total_won));
            ranked.truncate(limit);
            Ok(ranked)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::dao::models::{GameMode, Language, MatchWinner, Presence, ProfileCounters};

    fn account(handle: &str, email: &str) -> AccountEntity {
        let now = SystemTime::now();
        AccountEntity {
            id: Uuid::new_v4(),
            handle: handle.into(),
            email: email.into(),
            username: handle.split('#').next().unwrap_or_default().into(),
            password_hash: String::new(),
            description: String::new(),
            image: String::new(),
            language: Language::En,
            status: Presence::Offline,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn insert_account_rejects_duplicate_email_and_handle() {
        let store = MemoryArcadeStore::new();
        store
            .insert_account(account("ann#0042", "a@x.com"))
            .await
            .unwrap();

        let err = store
            .insert_account(account("bob#0043", "a@x.com"))
            .await
            .unwrap_err();
        assert_eq!(err.duplicate_field(), Some("email"));

        let err = store
            .insert_account(account("ann#0042", "b@x.com"))
            .await
            .unwrap_err();
        assert_eq!(err.duplicate_field(), Some("handle"));
    }

    fn friendship(sender_id: Uuid, receiver_id: Uuid) -> FriendshipEntity {
        let now = SystemTime::now();
        FriendshipEntity {
            id: Uuid::new_v4(),
            sender_id,
            receiver_id,
            status: FriendshipStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn insert_friendship_rejects_either_direction() {
        let store = MemoryArcadeStore::new();
        let (ann, bob) = (Uuid::new_v4(), Uuid::new_v4());
        store.insert_friendship(friendship(ann, bob)).await.unwrap();

        let same = store
            .insert_friendship(friendship(ann, bob))
            .await
            .unwrap_err();
        assert_eq!(same.duplicate_field(), Some("sender_id,receiver_id"));

        let reversed = store
            .insert_friendship(friendship(bob, ann))
            .await
            .unwrap_err();
        assert_eq!(reversed.duplicate_field(), Some("sender_id,receiver_id"));

        store
            .insert_friendship(friendship(ann, Uuid::new_v4()))
            .await
            .unwrap();
        let pending = store
            .list_friendships(ann, FriendshipStatus::Pending)
            .await
            .unwrap();
        assert_eq!(pending.len(), 2);
    }

    #[tokio::test]
    async fn handle_suffix_lookup_matches_tail_only() {
        let store = MemoryArcadeStore::new();
        store
            .insert_account(account("ann#1234", "a@x.com"))
            .await
            .unwrap();
        assert!(store.handle_suffix_taken("1234".into()).await.unwrap());
        assert!(!store.handle_suffix_taken("0123".into()).await.unwrap());
    }

    #[tokio::test]
    async fn record_match_is_all_or_nothing() {
        let store = MemoryArcadeStore::new();
        let owner = Uuid::new_v4();
        let (profile, created) = store
            .find_or_create_profile(owner, GameKind::Pong)
            .await
            .unwrap();
        assert!(created);

        let missing_profile = Uuid::new_v4();
        let record = MatchRecord {
            entity: MatchEntity {
                id: Uuid::new_v4(),
                game: GameKind::Pong,
                player1_profile_id: profile.id,
                player1_account_id: owner,
                player2_profile_id: Some(missing_profile),
                player2_account_id: Some(Uuid::new_v4()),
                bot_name: None,
                mode: GameMode::Local,
                player1_result: 3,
                player2_result: 1,
                winner: MatchWinner::Player1,
                date: SystemTime::now(),
            },
            player1_delta: ProfileCounters {
                total_played: 1,
                total_won: 1,
                ..Default::default()
            },
            player2_delta: Some(ProfileCounters {
                total_played: 1,
                ..Default::default()
            }),
        };

        assert!(store.record_match(record).await.is_err());
        let untouched = store
            .find_profile(owner, GameKind::Pong)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(untouched.counters, ProfileCounters::default());
        assert!(
            store
                .list_matches(GameKind::Pong, profile.id)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn find_or_create_profile_is_idempotent() {
        let store = MemoryArcadeStore::new();
        let owner = Uuid::new_v4();
        let (first, created) = store
            .find_or_create_profile(owner, GameKind::Tris)
            .await
            .unwrap();
        let (second, created_again) = store
            .find_or_create_profile(owner, GameKind::Tris)
            .await
            .unwrap();
        assert!(created);
        assert!(!created_again);
        assert_eq!(first.id, second.id);
    }
}
