//! Player profiles and the match recorder.

use std::{collections::HashMap, time::SystemTime};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        arcade_store::ArcadeStore,
        models::{
            AccountEntity, GameKind, GameMode, MatchEntity, MatchRecord, PlayerProfileEntity,
        },
    },
    dto::stats::{MatchSummary, PlayerStats, RecordMatchRequest},
    error::ServiceError,
    services::{
        account_service::{self, handle_of},
        match_tally::tally,
    },
    state::{Session, SharedState},
};

/// Profile of (account, game), created on first access.
async fn profile_of(
    store: &dyn ArcadeStore,
    account: &AccountEntity,
    game: GameKind,
) -> Result<PlayerProfileEntity, ServiceError> {
    let (profile, created) = store.find_or_create_profile(account.id, game).await?;
    if created {
        info!(handle = %account.handle, %game, "player profile created");
    }
    Ok(profile)
}

/// Counters of the player owning `uid` for `game`.
pub async fn player_info(
    state: &SharedState,
    game: GameKind,
    uid: Option<String>,
) -> Result<PlayerStats, ServiceError> {
    let account = account_service::user_info(state, uid).await?;
    let store = state.require_store().await?;
    let profile = profile_of(store.as_ref(), &account, game).await?;
    Ok(PlayerStats::new(account.handle, &profile.counters))
}

/// Credit one tournament win to the existing profile of `uid`.
pub async fn record_tournament_win(
    state: &SharedState,
    game: GameKind,
    uid: &str,
) -> Result<PlayerStats, ServiceError> {
    let account = account_service::find_by_handle(state, uid).await?;
    let store = state.require_store().await?;
    let Some(profile) = store.find_profile(account.id, game).await? else {
        warn!(handle = %account.handle, %game, "tournament win for a player without profile");
        return Err(ServiceError::NotFound(format!(
            "{} player not found",
            game.title()
        )));
    };

    let profile = store.increment_tournament_wins(profile.id).await?;
    info!(
        handle = %account.handle,
        %game,
        tournaments_won = profile.counters.tournaments_won,
        "tournament win recorded"
    );
    Ok(PlayerStats::new(account.handle, &profile.counters))
}

/// Persist a finished match and credit its participants in one unit.
pub async fn record_match(
    state: &SharedState,
    game: GameKind,
    request: RecordMatchRequest,
) -> Result<MatchEntity, ServiceError> {
    let mode: GameMode = request.mode.parse().map_err(|err: String| {
        warn!(error = %err, "match rejected: unknown mode");
        ServiceError::InvalidInput("Invalid mode".into())
    })?;

    let store = state.require_store().await?;
    let player1 = find_player(store.as_ref(), &request.player1_uid).await?;
    let bot_name = state
        .config()
        .is_bot(&request.player2_uid)
        .then(|| request.player2_uid.clone());
    let player2 = match bot_name {
        Some(_) => None,
        None => Some(find_player(store.as_ref(), &request.player2_uid).await?),
    };
    if player2
        .as_ref()
        .is_some_and(|player2| player2.id == player1.id)
    {
        return Err(ServiceError::InvalidInput(
            "A player cannot play against themselves".into(),
        ));
    }

    let profile1 = profile_of(store.as_ref(), &player1, game).await?;
    let profile2 = match &player2 {
        Some(account) => Some(profile_of(store.as_ref(), account, game).await?),
        None => None,
    };

    let outcome = tally(mode, request.p1_score, request.p2_score, bot_name.is_some());
    debug!(
        %game,
        mode = mode.as_str(),
        winner = ?outcome.winner,
        "match tallied"
    );

    let record = MatchRecord {
        entity: MatchEntity {
            id: Uuid::new_v4(),
            game,
            player1_profile_id: profile1.id,
            player1_account_id: player1.id,
            player2_profile_id: profile2.as_ref().map(|profile| profile.id),
            player2_account_id: player2.as_ref().map(|account| account.id),
            bot_name,
            mode,
            player1_result: request.p1_score,
            player2_result: request.p2_score,
            winner: outcome.winner,
            date: SystemTime::now(),
        },
        player1_delta: outcome.player1,
        player2_delta: outcome.player2,
    };

    let entity = store.record_match(record).await?;
    let opponent = match (&player2, &entity.bot_name) {
        (Some(account), _) => account.handle.as_str(),
        (None, Some(bot)) => bot.as_str(),
        (None, None) => "",
    };
    info!(%game, player1 = %player1.handle, player2 = %opponent, "match saved");
    Ok(entity)
}

async fn find_player(store: &dyn ArcadeStore, uid: &str) -> Result<AccountEntity, ServiceError> {
    store
        .find_account_by_handle(uid.trim().to_owned())
        .await?
        .ok_or_else(|| {
            warn!(%uid, "match references an unknown user");
            ServiceError::NotFound(format!("User not found: {uid}"))
        })
}

/// Matches of `game` involving `uid` (the caller when absent), newest first.
pub async fn match_history(
    state: &SharedState,
    session: &Session,
    game: GameKind,
    uid: Option<String>,
) -> Result<Vec<MatchSummary>, ServiceError> {
    let target = match uid.filter(|uid| !uid.trim().is_empty()) {
        Some(uid) => account_service::find_by_handle(state, &uid).await?,
        None => session.account.clone(),
    };

    let store = state.require_store().await?;
    let profile = profile_of(store.as_ref(), &target, game).await?;
    let matches = store.list_matches(game, profile.id).await?;

    let mut handles = HashMap::from([(target.id, target.handle.clone())]);
    let mut summaries = Vec::with_capacity(matches.len());
    for entity in matches {
        let Some(player1_uid) =
            handle_of(store.as_ref(), &mut handles, entity.player1_account_id).await?
        else {
            warn!(id = %entity.id, "match references a missing account");
            continue;
        };
        let player2_uid = match entity.player2_account_id {
            Some(id) => handle_of(store.as_ref(), &mut handles, id).await?,
            None => None,
        };
        summaries.push(MatchSummary::new(entity, player1_uid, player2_uid));
    }

    debug!(handle = %target.handle, %game, count = summaries.len(), "match history");
    Ok(summaries)
}
