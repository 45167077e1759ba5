pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{
    AccountEntity, FriendshipEntity, FriendshipStatus, GameKind, MatchEntity, MatchRecord,
    PlayerProfileEntity,
};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Abstraction over the persistence layer for accounts, friendships and game statistics.
pub trait ArcadeStore: Send + Sync {
    /// Insert a new account; fails with `Duplicate` on a taken email or handle.
    fn insert_account(&self, account: AccountEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Replace an existing account; fails with `Duplicate` on a taken email or handle.
    fn save_account(&self, account: AccountEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_account(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<AccountEntity>>>;
    fn find_account_by_email(
        &self,
        email: String,
    ) -> BoxFuture<'static, StorageResult<Option<AccountEntity>>>;
    fn find_account_by_handle(
        &self,
        handle: String,
    ) -> BoxFuture<'static, StorageResult<Option<AccountEntity>>>;
    /// Accounts whose username contains `fragment`, ignoring case.
    fn search_accounts(&self, fragment: String)
    -> BoxFuture<'static, StorageResult<Vec<AccountEntity>>>;
    /// Whether any handle already ends with `#suffix`.
    fn handle_suffix_taken(&self, suffix: String) -> BoxFuture<'static, StorageResult<bool>>;

    /// Insert a request; fails with `Duplicate` when the pair already exists.
    ///
    /// The memory backend checks both directions; MongoDB's unique index covers the ordered pair.
    fn insert_friendship(
        &self,
        friendship: FriendshipEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    fn save_friendship(&self, friendship: FriendshipEntity)
    -> BoxFuture<'static, StorageResult<()>>;
    /// Request between the two accounts in either direction.
    fn find_friendship_between(
        &self,
        first: Uuid,
        second: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<FriendshipEntity>>>;
    /// Request sent by `sender` to `receiver`.
    fn find_friendship(
        &self,
        sender: Uuid,
        receiver: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<FriendshipEntity>>>;
    /// Requests involving the account on either side with the given status.
    fn list_friendships(
        &self,
        account_id: Uuid,
        status: FriendshipStatus,
    ) -> BoxFuture<'static, StorageResult<Vec<FriendshipEntity>>>;

    /// Fetch the profile for (account, game), creating it when missing.
    ///
    /// The boolean is `true` when the profile was created by this call.
    fn find_or_create_profile(
        &self,
        account_id: Uuid,
        game: GameKind,
    ) -> BoxFuture<'static, StorageResult<(PlayerProfileEntity, bool)>>;
    fn find_profile(
        &self,
        account_id: Uuid,
        game: GameKind,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerProfileEntity>>>;
    /// Atomically bump the tournaments-won counter of a profile.
    fn increment_tournament_wins(
        &self,
        profile_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<PlayerProfileEntity>>;
    /// Apply both counter deltas and insert the match as a single unit.
    fn record_match(&self, record: MatchRecord) -> BoxFuture<'static, StorageResult<MatchEntity>>;
    /// Matches of a game involving the profile, newest first.
    fn list_matches(
        &self,
        game: GameKind,
        profile_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>>;
    /// Profiles with at least one match, by total wins descending, ties in insertion order.
    fn leaderboard(
        &self,
        game: GameKind,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayerProfileEntity>>>;

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
