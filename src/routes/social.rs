use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};

use crate::{
    dto::{
        ApiResponse, MessageResponse,
        social::{FriendRequestSummary, FriendSummary, RespondFriendRequest, SendFriendRequest},
    },
    error::AppError,
    routes::extract::ValidJson,
    services::friendship_service,
    state::{Session, SharedState},
};

/// Friend lists and friend requests; every route needs a session.
pub fn router() -> Router<SharedState> {
    Router::new().route("/friend", get(list_friends)).route(
        "/friend/request",
        get(list_requests)
            .post(send_request)
            .put(respond_request),
    )
}

#[utoipa::path(
    get,
    path = "/friend",
    tag = "social",
    params(("X-Session-Token" = String, Header, description = "Session token issued by POST /login")),
    responses(
        (status = 200, description = "Accepted friends of the caller", body = ApiResponse<Vec<FriendSummary>>),
        (status = 401, description = "No valid session", body = MessageResponse)
    )
)]
pub async fn list_friends(
    State(state): State<SharedState>,
    session: Session,
) -> Result<Json<ApiResponse<Vec<FriendSummary>>>, AppError> {
    let friends = friendship_service::list_friends(&state, &session).await?;
    Ok(Json(ApiResponse::with_data(
        "Accepted friends retrieved",
        friends,
    )))
}

/// Pending requests sent or received by the caller.
#[utoipa::path(
    get,
    path = "/friend/request",
    tag = "social",
    params(("X-Session-Token" = String, Header, description = "Session token issued by POST /login")),
    responses(
        (status = 200, description = "Pending friend requests", body = ApiResponse<Vec<FriendRequestSummary>>),
        (status = 401, description = "No valid session", body = MessageResponse)
    )
)]
pub async fn list_requests(
    State(state): State<SharedState>,
    session: Session,
) -> Result<Json<ApiResponse<Vec<FriendRequestSummary>>>, AppError> {
    let requests = friendship_service::list_pending(&state, &session).await?;
    let message = if requests.is_empty() {
        "No friend requests found"
    } else {
        "Friend requests retrieved"
    };
    Ok(Json(ApiResponse::with_data(message, requests)))
}

#[utoipa::path(
    post,
    path = "/friend/request",
    tag = "social",
    params(("X-Session-Token" = String, Header, description = "Session token issued by POST /login")),
    request_body = SendFriendRequest,
    responses(
        (status = 201, description = "Request created", body = MessageResponse),
        (status = 400, description = "Self request or request already exists", body = MessageResponse),
        (status = 401, description = "Emitter is not the caller", body = MessageResponse),
        (status = 404, description = "Unknown user", body = MessageResponse)
    )
)]
pub async fn send_request(
    State(state): State<SharedState>,
    session: Session,
    ValidJson(payload): ValidJson<SendFriendRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    friendship_service::send_request(&state, &session, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Friend request sent")),
    ))
}

/// Accept or decline a request received by the caller.
#[utoipa::path(
    put,
    path = "/friend/request",
    tag = "social",
    params(("X-Session-Token" = String, Header, description = "Session token issued by POST /login")),
    request_body = RespondFriendRequest,
    responses(
        (status = 200, description = "Request answered", body = MessageResponse),
        (status = 400, description = "Invalid status or request already answered", body = MessageResponse),
        (status = 404, description = "No pending request from that user", body = MessageResponse)
    )
)]
pub async fn respond_request(
    State(state): State<SharedState>,
    session: Session,
    ValidJson(payload): ValidJson<RespondFriendRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let status = friendship_service::respond(&state, &session, payload).await?;
    Ok(Json(MessageResponse::new(format!(
        "Friend request updated to {status}"
    ))))
}
