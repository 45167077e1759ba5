//! Session gate: credential checks, presence flips and session resolution.

use std::time::SystemTime;

use tracing::{debug, info, warn};

use crate::{
    dao::models::{AccountEntity, Presence},
    dto::auth::CredentialsRequest,
    error::ServiceError,
    services::{account_service::normalize_email, credentials::verify_password},
    state::{Session, SharedState},
};

/// Result of a login attempt that did not fail.
#[derive(Debug)]
pub struct LoginOutcome {
    pub account: AccountEntity,
    pub token: String,
    /// The request already carried a valid session; nothing was changed.
    pub already_logged_in: bool,
}

/// Resolve `token` to the caller it belongs to.
///
/// Unknown, expired and orphaned tokens yield `None`.
pub async fn resolve(state: &SharedState, token: &str) -> Result<Option<Session>, ServiceError> {
    let Some(account_id) = state.sessions().resolve(token) else {
        return Ok(None);
    };

    let store = state.require_store().await?;
    match store.find_account(account_id).await? {
        Some(account) => Ok(Some(Session {
            token: token.to_owned(),
            account,
        })),
        None => {
            warn!(%account_id, "session bound to a missing account; revoking");
            state.sessions().revoke(token);
            Ok(None)
        }
    }
}

/// Confirm a session the request already carries; nothing is changed.
pub fn resume(session: Session) -> LoginOutcome {
    debug!(handle = %session.account.handle, "login on an existing session");
    LoginOutcome {
        account: session.account,
        token: session.token,
        already_logged_in: true,
    }
}

/// Log in with email and password.
pub async fn login(
    state: &SharedState,
    request: CredentialsRequest,
) -> Result<LoginOutcome, ServiceError> {
    let store = state.require_store().await?;
    let email = normalize_email(&request.email);
    let Some(mut account) = store.find_account_by_email(email.clone()).await? else {
        warn!(%email, "login rejected: unknown email");
        return Err(ServiceError::Unauthorized("Invalid email".into()));
    };
    if !verify_password(&request.password, &account.password_hash) {
        warn!(%email, "login rejected: wrong password");
        return Err(ServiceError::Unauthorized("Invalid password".into()));
    }

    account.status = Presence::Online;
    account.updated_at = SystemTime::now();
    store.save_account(account.clone()).await?;

    let token = state.sessions().open(account.id);
    info!(handle = %account.handle, "login successful");
    Ok(LoginOutcome {
        account,
        token,
        already_logged_in: false,
    })
}

/// Flip the caller offline and revoke the session.
pub async fn logout(state: &SharedState, session: Session) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    let mut account = session.account;
    account.status = Presence::Offline;
    account.updated_at = SystemTime::now();
    store.save_account(account.clone()).await?;

    state.sessions().revoke(&session.token);
    info!(handle = %account.handle, "logout successful");
    Ok(())
}

/// Validate the credentials of a second account without touching the caller's session.
pub async fn guest_login(
    state: &SharedState,
    session: &Session,
    request: CredentialsRequest,
) -> Result<AccountEntity, ServiceError> {
    let email = normalize_email(&request.email);
    if email == session.account.email {
        warn!(handle = %session.account.handle, "guest login rejected: same account");
        return Err(ServiceError::InvalidInput("Cannot log in as yourself".into()));
    }

    let store = state.require_store().await?;
    let Some(guest) = store.find_account_by_email(email.clone()).await? else {
        warn!(%email, "guest login rejected: unknown email");
        return Err(ServiceError::NotFound("Invalid email".into()));
    };
    if !verify_password(&request.password, &guest.password_hash) {
        warn!(%email, "guest login rejected: wrong password");
        return Err(ServiceError::Unauthorized("Invalid password".into()));
    }

    info!(host = %session.account.handle, guest = %guest.handle, "guest login successful");
    Ok(guest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{credentials, memory_state, register};

    #[tokio::test]
    async fn login_flips_presence_and_opens_session() {
        let state = memory_state().await;
        register(&state, "ann", "a@x.com").await;

        let outcome = login(&state, credentials("a@x.com", "Str0ng!pw"))
            .await
            .unwrap();
        assert!(!outcome.already_logged_in);
        assert_eq!(outcome.account.status, Presence::Online);

        let session = resolve(&state, &outcome.token).await.unwrap().unwrap();
        assert_eq!(session.account.id, outcome.account.id);
        assert_eq!(session.account.status, Presence::Online);
    }

    #[tokio::test]
    async fn login_distinguishes_email_and_password_failures() {
        let state = memory_state().await;
        register(&state, "ann", "a@x.com").await;

        let unknown = login(&state, credentials("z@x.com", "Str0ng!pw"))
            .await
            .unwrap_err();
        assert!(matches!(unknown, ServiceError::Unauthorized(message) if message == "Invalid email"));

        let wrong = login(&state, credentials("a@x.com", "wrong-pass"))
            .await
            .unwrap_err();
        assert!(matches!(wrong, ServiceError::Unauthorized(message) if message == "Invalid password"));
    }

    #[tokio::test]
    async fn login_with_existing_session_is_idempotent() {
        let state = memory_state().await;
        register(&state, "ann", "a@x.com").await;
        let first = login(&state, credentials("a@x.com", "Str0ng!pw"))
            .await
            .unwrap();
        let session = resolve(&state, &first.token).await.unwrap().unwrap();

        let second = resume(session);
        assert!(second.already_logged_in);
        assert_eq!(second.token, first.token);
    }

    #[tokio::test]
    async fn logout_revokes_session_and_goes_offline() {
        let state = memory_state().await;
        let account = register(&state, "ann", "a@x.com").await;
        let outcome = login(&state, credentials("a@x.com", "Str0ng!pw"))
            .await
            .unwrap();
        let session = resolve(&state, &outcome.token).await.unwrap().unwrap();

        logout(&state, session).await.unwrap();
        assert!(resolve(&state, &outcome.token).await.unwrap().is_none());

        let store = state.require_store().await.unwrap();
        let stored = store.find_account(account.id).await.unwrap().unwrap();
        assert_eq!(stored.status, Presence::Offline);
    }

    #[tokio::test]
    async fn guest_login_checks_second_account() {
        let state = memory_state().await;
        register(&state, "ann", "a@x.com").await;
        let bob = register(&state, "bob", "b@x.com").await;
        let outcome = login(&state, credentials("a@x.com", "Str0ng!pw"))
            .await
            .unwrap();
        let session = resolve(&state, &outcome.token).await.unwrap().unwrap();

        let guest = guest_login(&state, &session, credentials("b@x.com", "Str0ng!pw"))
            .await
            .unwrap();
        assert_eq!(guest.handle, bob.handle);

        let myself = guest_login(&state, &session, credentials("A@x.com", "Str0ng!pw"))
            .await
            .unwrap_err();
        assert!(matches!(myself, ServiceError::InvalidInput(_)));

        let unknown = guest_login(&state, &session, credentials("z@x.com", "Str0ng!pw"))
            .await
            .unwrap_err();
        assert!(matches!(unknown, ServiceError::NotFound(_)));

        let wrong = guest_login(&state, &session, credentials("b@x.com", "nope"))
            .await
            .unwrap_err();
        assert!(matches!(wrong, ServiceError::Unauthorized(_)));

        // The caller's session is untouched.
        assert!(resolve(&state, &outcome.token).await.unwrap().is_some());
    }
}
