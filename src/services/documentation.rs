use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the arcade backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::auth::signup,
        crate::routes::auth::login_status,
        crate::routes::auth::login,
        crate::routes::auth::login_guest,
        crate::routes::auth::logout,
        crate::routes::auth::is_authenticated,
        crate::routes::user::user_info,
        crate::routes::user::update_user_info,
        crate::routes::user::search_player,
        crate::routes::social::list_friends,
        crate::routes::social::list_requests,
        crate::routes::social::send_request,
        crate::routes::social::respond_request,
        crate::routes::games::player_info,
        crate::routes::games::tournament_win,
        crate::routes::games::match_history,
        crate::routes::games::record_match,
        crate::routes::games::leaderboard,
    ),
    components(
        schemas(
            crate::dto::MessageResponse,
            crate::dto::health::HealthResponse,
            crate::dto::auth::SignupRequest,
            crate::dto::auth::CredentialsRequest,
            crate::dto::auth::SessionData,
            crate::dto::auth::GuestData,
            crate::dto::auth::UidData,
            crate::dto::user::UserInfo,
            crate::dto::user::UpdateUserRequest,
            crate::dto::user::ImageData,
            crate::dto::social::SendFriendRequest,
            crate::dto::social::RespondFriendRequest,
            crate::dto::social::FriendSummary,
            crate::dto::social::FriendRequestSummary,
            crate::dto::stats::TournamentWinRequest,
            crate::dto::stats::RecordMatchRequest,
            crate::dto::stats::PlayerStats,
            crate::dto::stats::LeaderboardEntry,
            crate::dto::stats::MatchSummary,
            crate::dao::models::GameKind,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Signup, login and sessions"),
        (name = "users", description = "Profiles and player search"),
        (name = "social", description = "Friends and friend requests"),
        (name = "games", description = "Pong and tris statistics, matches and leaderboards"),
    )
)]
pub struct ApiDoc;
