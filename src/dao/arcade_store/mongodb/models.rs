use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{MongoDaoError, MongoResult};
use crate::dao::models::{
    AccountEntity, FriendshipEntity, FriendshipStatus, GameKind, GameMode, Language, MatchEntity,
    MatchWinner, PlayerProfileEntity, Presence, ProfileCounters,
};

pub const ACCOUNT_COLLECTION: &str = "accounts";
pub const FRIENDSHIP_COLLECTION: &str = "friendships";
pub const PROFILE_COLLECTION: &str = "profiles";
pub const MATCH_COLLECTION: &str = "matches";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoAccountDocument {
    #[serde(rename = "_id")]
    id: String,
    handle: String,
    email: String,
    username: String,
    password_hash: String,
    description: String,
    image: String,
    language: Language,
    status: Presence,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<AccountEntity> for MongoAccountDocument {
    fn from(value: AccountEntity) -> Self {
        Self {
            id: value.id.to_string(),
            handle: value.handle,
            email: value.email,
            username: value.username,
            password_hash: value.password_hash,
            description: value.description,
            image: value.image,
            language: value.language,
            status: value.status,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl TryFrom<MongoAccountDocument> for AccountEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoAccountDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_id(ACCOUNT_COLLECTION, &value.id)?,
            handle: value.handle,
            email: value.email,
            username: value.username,
            password_hash: value.password_hash,
            description: value.description,
            image: value.image,
            language: value.language,
            status: value.status,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoFriendshipDocument {
    #[serde(rename = "_id")]
    id: String,
    sender_id: String,
    receiver_id: String,
    status: FriendshipStatus,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<FriendshipEntity> for MongoFriendshipDocument {
    fn from(value: FriendshipEntity) -> Self {
        Self {
            id: value.id.to_string(),
            sender_id: value.sender_id.to_string(),
            receiver_id: value.receiver_id.to_string(),
            status: value.status,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl TryFrom<MongoFriendshipDocument> for FriendshipEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoFriendshipDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_id(FRIENDSHIP_COLLECTION, &value.id)?,
            sender_id: parse_id(FRIENDSHIP_COLLECTION, &value.sender_id)?,
            receiver_id: parse_id(FRIENDSHIP_COLLECTION, &value.receiver_id)?,
            status: value.status,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        })
    }
}

/// Counters are stored as 64-bit integers so `$inc` never changes their BSON type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MongoCounters {
    total_played: i64,
    total_won: i64,
    tournaments_won: i64,
    local_played: i64,
    local_won: i64,
    bot_played: i64,
    bot_won: i64,
    tournament_played: i64,
    tournament_won: i64,
}

impl From<ProfileCounters> for MongoCounters {
    fn from(value: ProfileCounters) -> Self {
        Self {
            total_played: value.total_played.into(),
            total_won: value.total_won.into(),
            tournaments_won: value.tournaments_won.into(),
            local_played: value.local_played.into(),
            local_won: value.local_won.into(),
            bot_played: value.bot_played.into(),
            bot_won: value.bot_won.into(),
            tournament_played: value.tournament_played.into(),
            tournament_won: value.tournament_won.into(),
        }
    }
}

impl From<MongoCounters> for ProfileCounters {
    fn from(value: MongoCounters) -> Self {
        Self {
            total_played: counter(value.total_played),
            total_won: counter(value.total_won),
            tournaments_won: counter(value.tournaments_won),
            local_played: counter(value.local_played),
            local_won: counter(value.local_won),
            bot_played: counter(value.bot_played),
            bot_won: counter(value.bot_won),
            tournament_played: counter(value.tournament_played),
            tournament_won: counter(value.tournament_won),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoProfileDocument {
    #[serde(rename = "_id")]
    id: String,
    account_id: String,
    game: GameKind,
    counters: MongoCounters,
    /// Creation time, used to keep leaderboard ties in insertion order.
    created_at: DateTime,
}

impl From<PlayerProfileEntity> for MongoProfileDocument {
    fn from(value: PlayerProfileEntity) -> Self {
        Self {
            id: value.id.to_string(),
            account_id: value.account_id.to_string(),
            game: value.game,
            counters: value.counters.into(),
            created_at: DateTime::now(),
        }
    }
}

impl TryFrom<MongoProfileDocument> for PlayerProfileEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoProfileDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_id(PROFILE_COLLECTION, &value.id)?,
            account_id: parse_id(PROFILE_COLLECTION, &value.account_id)?,
            game: value.game,
            counters: value.counters.into(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMatchDocument {
    #[serde(rename = "_id")]
    id: String,
    game: GameKind,
    player1_profile_id: String,
    player1_account_id: String,
    player2_profile_id: Option<String>,
    player2_account_id: Option<String>,
    bot_name: Option<String>,
    mode: GameMode,
    player1_result: i64,
    player2_result: i64,
    winner: MatchWinner,
    date: DateTime,
}

impl From<MatchEntity> for MongoMatchDocument {
    fn from(value: MatchEntity) -> Self {
        Self {
            id: value.id.to_string(),
            game: value.game,
            player1_profile_id: value.player1_profile_id.to_string(),
            player1_account_id: value.player1_account_id.to_string(),
            player2_profile_id: value.player2_profile_id.map(|id| id.to_string()),
            player2_account_id: value.player2_account_id.map(|id| id.to_string()),
            bot_name: value.bot_name,
            mode: value.mode,
            player1_result: value.player1_result.into(),
            player2_result: value.player2_result.into(),
            winner: value.winner,
            date: DateTime::from_system_time(value.date),
        }
    }
}

impl TryFrom<MongoMatchDocument> for MatchEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoMatchDocument) -> MongoResult<Self> {
        let optional_id = |raw: Option<String>| {
            raw.map(|raw| parse_id(MATCH_COLLECTION, &raw))
                .transpose()
        };
        Ok(Self {
            id: parse_id(MATCH_COLLECTION, &value.id)?,
            game: value.game,
            player1_profile_id: parse_id(MATCH_COLLECTION, &value.player1_profile_id)?,
            player1_account_id: parse_id(MATCH_COLLECTION, &value.player1_account_id)?,
            player2_profile_id: optional_id(value.player2_profile_id)?,
            player2_account_id: optional_id(value.player2_account_id)?,
            bot_name: value.bot_name,
            mode: value.mode,
            player1_result: counter(value.player1_result),
            player2_result: counter(value.player2_result),
            winner: value.winner,
            date: value.date.to_system_time(),
        })
    }
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": id.to_string()}
}

/// `$inc` document for the non-zero counters of `delta`.
pub fn counters_increment(delta: &ProfileCounters) -> Document {
    let mut increments = Document::new();
    for (name, value) in delta.fields() {
        if value > 0 {
            increments.insert(format!("counters.{name}"), i64::from(value));
        }
    }
    doc! {"$inc": increments}
}

fn parse_id(collection: &'static str, raw: &str) -> MongoResult<Uuid> {
    Uuid::parse_str(raw).map_err(|source| MongoDaoError::CorruptId {
        collection,
        value: raw.to_owned(),
        source,
    })
}

fn counter(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}
