use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use tracing::debug;

use crate::{
    dto::{
        ApiResponse, MessageResponse,
        auth::{CredentialsRequest, GuestData, SessionData, SignupRequest, UidData},
    },
    error::AppError,
    routes::extract::ValidJson,
    services::{account_service, session_service},
    state::{Session, SharedState},
};

/// Account creation and session endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", get(login_status).post(login))
        .route("/login-guest", post(login_guest))
        .route("/logout", post(logout))
        .route("/is-authenticated", get(is_authenticated))
}

/// Register a new account and allocate its `name#NNNN` handle.
#[utoipa::path(
    post,
    path = "/signup",
    tag = "auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = ApiResponse<UidData>),
        (status = 400, description = "Invalid or conflicting input", body = MessageResponse),
        (status = 500, description = "No handle suffix left", body = MessageResponse)
    )
)]
pub async fn signup(
    State(state): State<SharedState>,
    ValidJson(payload): ValidJson<SignupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UidData>>), AppError> {
    let account = account_service::signup(&state, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_data(
            "Signup successful",
            UidData { uid: account.handle },
        )),
    ))
}

/// Report the identity bound to the current session.
#[utoipa::path(
    get,
    path = "/login",
    tag = "auth",
    params(("X-Session-Token" = Option<String>, Header, description = "Session token issued by POST /login")),
    responses(
        (status = 200, description = "Session is valid", body = ApiResponse<SessionData>),
        (status = 401, description = "No valid session", body = MessageResponse)
    )
)]
pub async fn login_status(
    session: Option<Session>,
) -> Result<Json<ApiResponse<SessionData>>, AppError> {
    let session = session.ok_or_else(|| AppError::Unauthorized("Not logged in".into()))?;
    Ok(Json(ApiResponse::with_data(
        "Already logged in",
        SessionData::new(&session.account, None),
    )))
}

/// Log in with email and password; a request that already carries a session is a no-op
/// and its body is ignored.
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Session opened or already open", body = ApiResponse<SessionData>),
        (status = 400, description = "Missing fields", body = MessageResponse),
        (status = 401, description = "Invalid email or password", body = MessageResponse)
    )
)]
pub async fn login(
    State(state): State<SharedState>,
    session: Option<Session>,
    body: Result<ValidJson<CredentialsRequest>, AppError>,
) -> Result<Json<ApiResponse<SessionData>>, AppError> {
    let outcome = match session {
        Some(session) => session_service::resume(session),
        None => {
            let ValidJson(payload) = body?;
            session_service::login(&state, payload).await?
        }
    };
    let message = if outcome.already_logged_in {
        "Already logged in"
    } else {
        "Login successful"
    };
    Ok(Json(ApiResponse::with_data(
        message,
        SessionData::new(&outcome.account, Some(outcome.token)),
    )))
}

/// Check the credentials of a second local player without touching the caller's session.
#[utoipa::path(
    post,
    path = "/login-guest",
    tag = "auth",
    params(("X-Session-Token" = String, Header, description = "Session token issued by POST /login")),
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Guest credentials accepted", body = ApiResponse<GuestData>),
        (status = 400, description = "Guest is the caller", body = MessageResponse),
        (status = 401, description = "No session or wrong password", body = MessageResponse),
        (status = 404, description = "Unknown email", body = MessageResponse)
    )
)]
pub async fn login_guest(
    State(state): State<SharedState>,
    session: Session,
    ValidJson(payload): ValidJson<CredentialsRequest>,
) -> Result<Json<ApiResponse<GuestData>>, AppError> {
    let guest = session_service::guest_login(&state, &session, payload).await?;
    Ok(Json(ApiResponse::with_data(
        "Guest login successful",
        GuestData::from(guest),
    )))
}

/// Close the current session and mark the account offline.
#[utoipa::path(
    post,
    path = "/logout",
    tag = "auth",
    params(("X-Session-Token" = String, Header, description = "Session token issued by POST /login")),
    responses(
        (status = 200, description = "Session closed", body = MessageResponse),
        (status = 401, description = "No valid session", body = MessageResponse)
    )
)]
pub async fn logout(
    State(state): State<SharedState>,
    session: Option<Session>,
) -> Result<Json<MessageResponse>, AppError> {
    let session = session.ok_or_else(|| AppError::Unauthorized("Not logged in".into()))?;
    session_service::logout(&state, session).await?;
    Ok(Json(MessageResponse::new("Logout successful")))
}

#[utoipa::path(
    get,
    path = "/is-authenticated",
    tag = "auth",
    params(("X-Session-Token" = Option<String>, Header, description = "Session token issued by POST /login")),
    responses(
        (status = 200, description = "Session is valid", body = ApiResponse<UidData>),
        (status = 401, description = "No valid session", body = MessageResponse)
    )
)]
pub async fn is_authenticated(
    session: Option<Session>,
) -> Result<Json<ApiResponse<UidData>>, AppError> {
    let Some(session) = session else {
        debug!("authentication check without session");
        return Err(AppError::Unauthorized("Not authenticated".into()));
    };
    Ok(Json(ApiResponse::with_data(
        "Authenticated",
        UidData {
            uid: session.account.handle,
        },
    )))
}
