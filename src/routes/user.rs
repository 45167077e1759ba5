use axum::{
    Json, Router,
    extract::State,
    routing::get,
};

use crate::{
    dto::{
        ApiResponse, MessageResponse,
        auth::UidData,
        user::{ImageData, SearchQuery, UidQuery, UpdateUserRequest, UserInfo},
    },
    error::AppError,
    routes::extract::{ApiQuery, ValidJson},
    services::account_service,
    state::{Session, SharedState},
};

/// Profile lookup, profile edition and player search.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/user-info", get(user_info).put(update_user_info))
        .route("/search-player", get(search_player))
}

/// Public profile of the account owning `uid`.
#[utoipa::path(
    get,
    path = "/user-info",
    tag = "users",
    params(
        ("X-Session-Token" = String, Header, description = "Session token issued by POST /login"),
        UidQuery
    ),
    responses(
        (status = 200, description = "Profile found", body = ApiResponse<UserInfo>),
        (status = 400, description = "Missing uid", body = MessageResponse),
        (status = 401, description = "No valid session", body = MessageResponse),
        (status = 404, description = "Unknown uid", body = MessageResponse)
    )
)]
pub async fn user_info(
    State(state): State<SharedState>,
    _session: Session,
    ApiQuery(query): ApiQuery<UidQuery>,
) -> Result<Json<ApiResponse<UserInfo>>, AppError> {
    let account = account_service::user_info(&state, query.uid).await?;
    Ok(Json(ApiResponse::with_data(
        "User info retrieved",
        UserInfo::from(account),
    )))
}

/// Apply a partial update to the caller's profile.
///
/// An image change answers with the new `image_url`; any other change carries no data.
#[utoipa::path(
    put,
    path = "/user-info",
    tag = "users",
    params(("X-Session-Token" = String, Header, description = "Session token issued by POST /login")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<ImageData>),
        (status = 400, description = "Invalid or conflicting input", body = MessageResponse),
        (status = 401, description = "No session or wrong current password", body = MessageResponse)
    )
)]
pub async fn update_user_info(
    State(state): State<SharedState>,
    session: Session,
    ValidJson(payload): ValidJson<UpdateUserRequest>,
) -> Result<Json<ApiResponse<ImageData>>, AppError> {
    let outcome = account_service::update(&state, session.account, payload).await?;
    let response = if outcome.image_changed {
        ApiResponse::with_data(
            "User image updated successfully",
            ImageData {
                image_url: outcome.account.image,
            },
        )
    } else {
        ApiResponse {
            message: "User info updated successfully".into(),
            data: None,
        }
    };
    Ok(Json(response))
}

/// Accounts whose username contains the fragment, excluding the caller.
#[utoipa::path(
    get,
    path = "/search-player",
    tag = "users",
    params(
        ("X-Session-Token" = String, Header, description = "Session token issued by POST /login"),
        SearchQuery
    ),
    responses(
        (status = 200, description = "Matching players", body = ApiResponse<Vec<UidData>>),
        (status = 400, description = "Missing username", body = MessageResponse),
        (status = 401, description = "No valid session", body = MessageResponse)
    )
)]
pub async fn search_player(
    State(state): State<SharedState>,
    session: Session,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<UidData>>>, AppError> {
    let players = account_service::search(&state, &session.account, query.username).await?;
    let uids = players
        .into_iter()
        .map(|account| UidData { uid: account.handle })
        .collect();
    Ok(Json(ApiResponse::with_data("Players found", uids)))
}
