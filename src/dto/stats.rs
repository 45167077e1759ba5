use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::{GameMode, MatchEntity, MatchWinner, ProfileCounters},
    dto::format_system_time,
};

/// Tournament win credited to `uid`.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct TournamentWinRequest {
    #[validate(length(min = 1, message = "UID is required"))]
    pub uid: String,
}

/// Result of a finished match.
///
/// `player2_uid` is either a registered handle or a configured bot name.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RecordMatchRequest {
    #[validate(length(min = 1, message = "Missing required fields"))]
    pub player1_uid: String,
    #[validate(length(min = 1, message = "Missing required fields"))]
    pub player2_uid: String,
    /// `local`, `bot` or `tournament`, case-insensitive.
    #[validate(length(min = 1, message = "Missing required fields"))]
    pub mode: String,
    pub p1_score: u32,
    pub p2_score: u32,
}

/// Full counter set of a player for one game.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerStats {
    pub player_uid: String,
    /// Total matches played.
    #[serde(rename = "TOTP")]
    pub total_played: u32,
    /// Total matches won.
    #[serde(rename = "TOTW")]
    pub total_won: u32,
    /// Tournaments won.
    #[serde(rename = "TW")]
    pub tournaments_won: u32,
    #[serde(rename = "PVPP")]
    pub local_played: u32,
    #[serde(rename = "PVPW")]
    pub local_won: u32,
    #[serde(rename = "PVEP")]
    pub bot_played: u32,
    #[serde(rename = "PVEW")]
    pub bot_won: u32,
    #[serde(rename = "TMAP")]
    pub tournament_played: u32,
    #[serde(rename = "TMAW")]
    pub tournament_won: u32,
}

impl PlayerStats {
    pub fn new(player_uid: String, counters: &ProfileCounters) -> Self {
        Self {
            player_uid,
            total_played: counters.total_played,
            total_won: counters.total_won,
            tournaments_won: counters.tournaments_won,
            local_played: counters.local_played,
            local_won: counters.local_won,
            bot_played: counters.bot_played,
            bot_won: counters.bot_won,
            tournament_played: counters.tournament_played,
            tournament_won: counters.tournament_won,
        }
    }
}

/// One leaderboard row.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardEntry {
    pub player_uid: String,
    #[serde(rename = "TOTP")]
    pub total_played: u32,
    #[serde(rename = "TOTW")]
    pub total_won: u32,
}

/// Match as listed in a player's history.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchSummary {
    pub player1_uid: String,
    /// `null` when the opponent was a bot.
    pub player2_uid: Option<String>,
    pub bot_name: Option<String>,
    pub player1_result: u32,
    pub player2_result: u32,
    pub mode: GameMode,
    pub winner: MatchWinner,
    /// RFC 3339 timestamp.
    pub date: String,
    /// Display name of a bot opponent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player2_name: Option<String>,
}

impl MatchSummary {
    /// Build the summary from a stored match and the handles of its human players.
    pub fn new(entity: MatchEntity, player1_uid: String, player2_uid: Option<String>) -> Self {
        Self {
            player1_uid,
            player2_uid,
            player2_name: entity.bot_name.clone(),
            bot_name: entity.bot_name,
            player1_result: entity.player1_result,
            player2_result: entity.player2_result,
            mode: entity.mode,
            winner: entity.winner,
            date: format_system_time(entity.date),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::dao::models::GameKind;

    #[test]
    fn player_stats_use_legacy_counter_names() {
        let counters = ProfileCounters {
            total_played: 3,
            total_won: 2,
            bot_played: 1,
            ..Default::default()
        };
        let value = serde_json::to_value(PlayerStats::new("ann#0042".into(), &counters)).unwrap();
        assert_eq!(value["player_uid"], "ann#0042");
        assert_eq!(value["TOTP"], 3);
        assert_eq!(value["TOTW"], 2);
        assert_eq!(value["PVEP"], 1);
        assert_eq!(value["TMAW"], 0);
    }

    #[test]
    fn bot_match_summary_carries_player2_name() {
        let entity = MatchEntity {
            id: Uuid::new_v4(),
            game: GameKind::Pong,
            player1_profile_id: Uuid::new_v4(),
            player1_account_id: Uuid::new_v4(),
            player2_profile_id: None,
            player2_account_id: None,
            bot_name: Some("AM".into()),
            mode: GameMode::Bot,
            player1_result: 5,
            player2_result: 3,
            winner: MatchWinner::Player1,
            date: SystemTime::UNIX_EPOCH,
        };
        let value = serde_json::to_value(MatchSummary::new(entity, "ann#0042".into(), None))
            .unwrap();
        assert_eq!(value["player2_uid"], json!(null));
        assert_eq!(value["bot_name"], "AM");
        assert_eq!(value["player2_name"], "AM");
        assert_eq!(value["winner"], "player1");
        assert_eq!(value["date"], "1970-01-01T00:00:00Z");
    }
}
