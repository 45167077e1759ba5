//! Request extractors that turn axum rejections into the `{message}` error envelope.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, OptionalFromRequestParts, Path, Query, Request},
    http::{header::AUTHORIZATION, request::Parts},
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::{
    dao::models::GameKind,
    error::AppError,
    services::session_service,
    state::{Session, SharedState},
};

/// Header carrying the session token returned by `POST /login`.
pub const SESSION_HEADER: &str = "x-session-token";

/// JSON body deserialized then checked with its `validator` rules.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Query string with rejections mapped to [`AppError`].
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) =
            <Query<T> as FromRequestParts<S>>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// `{game}` path segment; anything but a known game is a 404.
pub struct GamePath(pub GameKind);

impl<S> FromRequestParts<S> for GamePath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(game) =
            <Path<GameKind> as FromRequestParts<S>>::from_request_parts(parts, state).await?;
        Ok(Self(game))
    }
}

/// Token from `X-Session-Token`, or from `Authorization: Bearer`.
fn session_token(parts: &Parts) -> Option<String> {
    let headers = &parts.headers;
    if let Some(token) = headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
    {
        return Some(token.trim().to_owned()).filter(|token| !token.is_empty());
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_owned())
        .filter(|token| !token.is_empty())
}

impl OptionalFromRequestParts<SharedState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Option<Self>, Self::Rejection> {
        let Some(token) = session_token(parts) else {
            return Ok(None);
        };
        Ok(session_service::resolve(state, &token).await?)
    }
}

impl FromRequestParts<SharedState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        <Session as OptionalFromRequestParts<SharedState>>::from_request_parts(parts, state)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Not authenticated".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;

    fn parts(header: (&str, &str)) -> Parts {
        let (parts, ()) = HttpRequest::builder()
            .uri("/friend")
            .header(header.0, header.1)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn reads_token_from_either_header() {
        assert_eq!(
            session_token(&parts((SESSION_HEADER, "abc"))).as_deref(),
            Some("abc")
        );
        assert_eq!(
            session_token(&parts(("authorization", "Bearer xyz"))).as_deref(),
            Some("xyz")
        );
        assert_eq!(session_token(&parts(("authorization", "Basic xyz"))), None);
        assert_eq!(session_token(&parts((SESSION_HEADER, "  "))), None);
    }
}
