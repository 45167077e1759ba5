use std::collections::HashMap;

use tracing::{debug, warn};

use crate::{
    dao::models::GameKind,
    dto::stats::LeaderboardEntry,
    error::ServiceError,
    services::account_service::handle_of,
    state::SharedState,
};

/// Top players of `game` by total wins, limited to the configured size.
pub async fn leaderboard(
    state: &SharedState,
    game: GameKind,
) -> Result<Vec<LeaderboardEntry>, ServiceError> {
    let store = state.require_store().await?;
    let profiles = store
        .leaderboard(game, state.config().leaderboard_size)
        .await?;

    let mut handles = HashMap::new();
    let mut entries = Vec::with_capacity(profiles.len());
    for profile in profiles {
        let Some(player_uid) = handle_of(store.as_ref(), &mut handles, profile.account_id).await?
        else {
            warn!(profile = %profile.id, "leaderboard profile without account");
            continue;
        };
        entries.push(LeaderboardEntry {
            player_uid,
            total_played: profile.counters.total_played,
            total_won: profile.counters.total_won,
        });
    }

    debug!(%game, count = entries.len(), "leaderboard computed");
    Ok(entries)
}
