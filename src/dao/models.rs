use std::{fmt, str::FromStr, time::SystemTime};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Online/offline flag stored on every account.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Online,
    #[default]
    Offline,
}

/// Interface languages an account can pick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    It,
    Es,
}

/// Registered user account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountEntity {
    /// Stable identifier, never exposed on the wire.
    pub id: Uuid,
    /// Public handle in the `name#NNNN` format.
    pub handle: String,
    /// Login email, normalized to lowercase.
    pub email: String,
    /// Display name (the part of the handle before `#`).
    pub username: String,
    /// Salted password digest.
    pub password_hash: String,
    pub description: String,
    /// Avatar reference (path or URL).
    pub image: String,
    pub language: Language,
    pub status: Presence,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl AccountEntity {
    /// Numeric suffix of the handle, without the `#` separator.
    pub fn handle_suffix(&self) -> &str {
        self.handle
            .rsplit_once('#')
            .map(|(_, suffix)| suffix)
            .unwrap_or_default()
    }
}

/// Lifecycle of a friendship request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FriendshipStatus {
    Pending,
    Accepted,
    Declined,
}

impl fmt::Display for FriendshipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FriendshipStatus::Pending => "pending",
            FriendshipStatus::Accepted => "accepted",
            FriendshipStatus::Declined => "declined",
        };
        f.write_str(label)
    }
}

/// Directed friendship request between two accounts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FriendshipEntity {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub status: FriendshipStatus,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl FriendshipEntity {
    /// Whether `account_id` is one of the two parties.
    pub fn involves(&self, account_id: Uuid) -> bool {
        self.sender_id == account_id || self.receiver_id == account_id
    }

    /// The party that is not `account_id`.
    pub fn counterpart(&self, account_id: Uuid) -> Uuid {
        if self.sender_id == account_id {
            self.receiver_id
        } else {
            self.sender_id
        }
    }
}

/// Games tracked by the platform.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    Pong,
    Tris,
}

impl GameKind {
    /// Lowercase identifier used in paths and persistence.
    pub fn as_str(&self) -> &'static str {
        match self {
            GameKind::Pong => "pong",
            GameKind::Tris => "tris",
        }
    }

    /// Capitalized name used in response messages.
    pub fn title(&self) -> &'static str {
        match self {
            GameKind::Pong => "Pong",
            GameKind::Tris => "Tris",
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a match was played.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Local,
    Bot,
    Tournament,
}

impl FromStr for GameMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        [GameMode::Local, GameMode::Bot, GameMode::Tournament]
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| format!("unknown game mode `{value}`"))
    }
}

impl GameMode {
    /// Lowercase identifier used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Local => "local",
            GameMode::Bot => "bot",
            GameMode::Tournament => "tournament",
        }
    }
}

/// Declared outcome of a match.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MatchWinner {
    Player1,
    Player2,
    Draw,
}

/// Aggregate counters kept per (account, game).
///
/// The same shape doubles as a delta when a match is recorded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ProfileCounters {
    pub total_played: u32,
    pub total_won: u32,
    pub tournaments_won: u32,
    pub local_played: u32,
    pub local_won: u32,
    pub bot_played: u32,
    pub bot_won: u32,
    pub tournament_played: u32,
    pub tournament_won: u32,
}

impl ProfileCounters {
    /// Add every counter of `delta` onto `self`.
    pub fn apply(&mut self, delta: &ProfileCounters) {
        self.total_played += delta.total_played;
        self.total_won += delta.total_won;
        self.tournaments_won += delta.tournaments_won;
        self.local_played += delta.local_played;
        self.local_won += delta.local_won;
        self.bot_played += delta.bot_played;
        self.bot_won += delta.bot_won;
        self.tournament_played += delta.tournament_played;
        self.tournament_won += delta.tournament_won;
    }

    /// Counter names paired with their values, in persistence field order.
    pub fn fields(&self) -> [(&'static str, u32); 9] {
        [
            ("total_played", self.total_played),
            ("total_won", self.total_won),
            ("tournaments_won", self.tournaments_won),
            ("local_played", self.local_played),
            ("local_won", self.local_won),
            ("bot_played", self.bot_played),
            ("bot_won", self.bot_won),
            ("tournament_played", self.tournament_played),
            ("tournament_won", self.tournament_won),
        ]
    }
}

/// Per-account, per-game statistics record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerProfileEntity {
    pub id: Uuid,
    pub account_id: Uuid,
    pub game: GameKind,
    pub counters: ProfileCounters,
}

impl PlayerProfileEntity {
    /// Fresh profile with every counter at zero.
    pub fn new(account_id: Uuid, game: GameKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            game,
            counters: ProfileCounters::default(),
        }
    }
}

/// Immutable record of a finished match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchEntity {
    pub id: Uuid,
    pub game: GameKind,
    pub player1_profile_id: Uuid,
    pub player1_account_id: Uuid,
    /// Absent when the opponent was a bot.
    pub player2_profile_id: Option<Uuid>,
    pub player2_account_id: Option<Uuid>,
    /// Set exactly when `player2_profile_id` is absent.
    pub bot_name: Option<String>,
    pub mode: GameMode,
    pub player1_result: u32,
    pub player2_result: u32,
    pub winner: MatchWinner,
    pub date: SystemTime,
}

impl MatchEntity {
    /// Whether the profile took part in the match on either side.
    pub fn involves(&self, profile_id: Uuid) -> bool {
        self.player1_profile_id == profile_id || self.player2_profile_id == Some(profile_id)
    }
}

/// A match together with the counter deltas that must be committed with it.
#[derive(Debug, Clone)]
pub struct MatchRecord {
    pub entity: MatchEntity,
    pub player1_delta: ProfileCounters,
    pub player2_delta: Option<ProfileCounters>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_mode_parses_case_insensitively() {
        assert_eq!("LOCAL".parse::<GameMode>(), Ok(GameMode::Local));
        assert_eq!(" Bot ".parse::<GameMode>(), Ok(GameMode::Bot));
        assert_eq!("tournament".parse::<GameMode>(), Ok(GameMode::Tournament));
        assert!("ranked".parse::<GameMode>().is_err());
    }

    #[test]
    fn counters_apply_adds_every_field() {
        let mut counters = ProfileCounters {
            total_played: 2,
            total_won: 1,
            ..Default::default()
        };
        counters.apply(&ProfileCounters {
            total_played: 1,
            bot_played: 1,
            bot_won: 1,
            ..Default::default()
        });
        assert_eq!(counters.total_played, 3);
        assert_eq!(counters.total_won, 1);
        assert_eq!(counters.bot_played, 1);
        assert_eq!(counters.bot_won, 1);
    }

    #[test]
    fn friendship_counterpart_returns_other_party() {
        let sender = Uuid::new_v4();
        let receiver = Uuid::new_v4();
        let friendship = FriendshipEntity {
            id: Uuid::new_v4(),
            sender_id: sender,
            receiver_id: receiver,
            status: FriendshipStatus::Accepted,
            created_at: SystemTime::now(),
            updated_at: SystemTime::now(),
        };
        assert_eq!(friendship.counterpart(sender), receiver);
        assert_eq!(friendship.counterpart(receiver), sender);
        assert!(!friendship.involves(Uuid::new_v4()));
    }
}
