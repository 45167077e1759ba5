use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};

use crate::{
    dto::{
        ApiResponse, MessageResponse,
        stats::{LeaderboardEntry, MatchSummary, PlayerStats, RecordMatchRequest, TournamentWinRequest},
        user::UidQuery,
    },
    error::AppError,
    routes::extract::{ApiQuery, GamePath, ValidJson},
    services::{leaderboard_service, stats_service},
    state::{Session, SharedState},
};

/// Per-game statistics routes, mounted for every `{game}` (`pong`, `tris`).
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/{game}/info", get(player_info).post(tournament_win))
        .route("/{game}/games", get(match_history).post(record_match))
        .route("/{game}/leaderboard", get(leaderboard))
}

/// Counters of a player for one game; the profile is created on first access.
#[utoipa::path(
    get,
    path = "/{game}/info",
    tag = "games",
    params(
        ("game" = String, Path, description = "Game identifier: `pong` or `tris`"),
        ("X-Session-Token" = String, Header, description = "Session token issued by POST /login"),
        UidQuery
    ),
    responses(
        (status = 200, description = "Player counters", body = ApiResponse<PlayerStats>),
        (status = 400, description = "Missing uid", body = MessageResponse),
        (status = 404, description = "Unknown game or user", body = MessageResponse)
    )
)]
pub async fn player_info(
    State(state): State<SharedState>,
    GamePath(game): GamePath,
    _session: Session,
    ApiQuery(query): ApiQuery<UidQuery>,
) -> Result<Json<ApiResponse<PlayerStats>>, AppError> {
    let stats = stats_service::player_info(&state, game, query.uid).await?;
    Ok(Json(ApiResponse::with_data(
        format!("{} player info retrieved", game.title()),
        stats,
    )))
}

/// Credit one tournament win to a player.
#[utoipa::path(
    post,
    path = "/{game}/info",
    tag = "games",
    params(
        ("game" = String, Path, description = "Game identifier: `pong` or `tris`"),
        ("X-Session-Token" = String, Header, description = "Session token issued by POST /login")
    ),
    request_body = TournamentWinRequest,
    responses(
        (status = 200, description = "Tournament win recorded", body = ApiResponse<PlayerStats>),
        (status = 404, description = "Unknown user or no profile for this game", body = MessageResponse)
    )
)]
pub async fn tournament_win(
    State(state): State<SharedState>,
    GamePath(game): GamePath,
    _session: Session,
    ValidJson(payload): ValidJson<TournamentWinRequest>,
) -> Result<Json<ApiResponse<PlayerStats>>, AppError> {
    let stats = stats_service::record_tournament_win(&state, game, &payload.uid).await?;
    Ok(Json(ApiResponse::with_data(
        "Tournament win recorded successfully",
        stats,
    )))
}

/// Matches of a player, newest first; defaults to the caller.
#[utoipa::path(
    get,
    path = "/{game}/games",
    tag = "games",
    params(
        ("game" = String, Path, description = "Game identifier: `pong` or `tris`"),
        ("X-Session-Token" = String, Header, description = "Session token issued by POST /login"),
        UidQuery
    ),
    responses(
        (status = 200, description = "Match history", body = ApiResponse<Vec<MatchSummary>>),
        (status = 404, description = "Unknown game or user", body = MessageResponse)
    )
)]
pub async fn match_history(
    State(state): State<SharedState>,
    GamePath(game): GamePath,
    session: Session,
    ApiQuery(query): ApiQuery<UidQuery>,
) -> Result<Json<ApiResponse<Vec<MatchSummary>>>, AppError> {
    let matches = stats_service::match_history(&state, &session, game, query.uid).await?;
    let message = if matches.is_empty() {
        format!("No {} matches found", game.title())
    } else {
        format!("{} matches retrieved", game.title())
    };
    Ok(Json(ApiResponse::with_data(message, matches)))
}

/// Persist a finished match and update both players' counters.
#[utoipa::path(
    post,
    path = "/{game}/games",
    tag = "games",
    params(
        ("game" = String, Path, description = "Game identifier: `pong` or `tris`"),
        ("X-Session-Token" = String, Header, description = "Session token issued by POST /login")
    ),
    request_body = RecordMatchRequest,
    responses(
        (status = 201, description = "Match saved", body = ApiResponse<MatchSummary>),
        (status = 400, description = "Invalid mode or payload", body = MessageResponse),
        (status = 404, description = "Unknown game or user", body = MessageResponse)
    )
)]
pub async fn record_match(
    State(state): State<SharedState>,
    GamePath(game): GamePath,
    _session: Session,
    ValidJson(payload): ValidJson<RecordMatchRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MatchSummary>>), AppError> {
    let player1_uid = payload.player1_uid.clone();
    let player2_uid = payload.player2_uid.clone();
    let entity = stats_service::record_match(&state, game, payload).await?;
    let player2_uid = entity.bot_name.is_none().then_some(player2_uid);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_data(
            "Match saved successfully",
            MatchSummary::new(entity, player1_uid, player2_uid),
        )),
    ))
}

/// Best players of a game by total wins. No session required.
#[utoipa::path(
    get,
    path = "/{game}/leaderboard",
    tag = "games",
    params(("game" = String, Path, description = "Game identifier: `pong` or `tris`")),
    responses(
        (status = 200, description = "Leaderboard", body = ApiResponse<Vec<LeaderboardEntry>>),
        (status = 404, description = "Unknown game", body = MessageResponse)
    )
)]
pub async fn leaderboard(
    State(state): State<SharedState>,
    GamePath(game): GamePath,
) -> Result<Json<ApiResponse<Vec<LeaderboardEntry>>>, AppError> {
    let entries = leaderboard_service::leaderboard(&state, game).await?;
    let message = if entries.is_empty() {
        format!("No players found for {} leaderboard", game.title())
    } else {
        format!("{} leaderboard retrieved", game.title())
    };
    Ok(Json(ApiResponse::with_data(message, entries)))
}
