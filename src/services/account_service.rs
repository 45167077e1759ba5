//! Account directory: registration, profile lookups, partial updates and player search.

use std::{collections::HashMap, time::SystemTime};

use rand::Rng;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    config::HandleSuffixConfig,
    dao::{
        arcade_store::ArcadeStore,
        models::{AccountEntity, Presence},
        storage::StorageError,
    },
    dto::{auth::SignupRequest, user::UpdateUserRequest},
    error::ServiceError,
    services::credentials::{check_password_policy, hash_password, verify_password},
    state::SharedState,
};

/// What an update changed, so the caller can pick the right confirmation.
#[derive(Debug)]
pub struct UpdateOutcome {
    pub account: AccountEntity,
    pub image_changed: bool,
}

/// Trim and lowercase an email address.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Register a new account with a freshly allocated `name#NNNN` handle.
pub async fn signup(
    state: &SharedState,
    request: SignupRequest,
) -> Result<AccountEntity, ServiceError> {
    let store = state.require_store().await?;
    let config = state.config();
    let email = normalize_email(&request.email);
    let username = request.username.trim().to_owned();
    debug!(%email, %username, "signup requested");

    if store.find_account_by_email(email.clone()).await?.is_some() {
        warn!(%email, "signup rejected: email already registered");
        return Err(ServiceError::Conflict("Email already exists".into()));
    }

    check_password_policy(
        &config.password_policy,
        &request.password,
        &[("username", &username), ("email address", &email)],
    )
    .map_err(ServiceError::InvalidInput)?;

    let password_hash = hash_password(&request.password);
    let defaults = &config.account_defaults;

    for attempt in 1..=config.handle_suffix.max_attempts {
        let suffix = draw_suffix(&config.handle_suffix);
        if store.handle_suffix_taken(suffix.clone()).await? {
            debug!(attempt, %suffix, "handle suffix taken; drawing again");
            continue;
        }

        let now = SystemTime::now();
        let account = AccountEntity {
            id: Uuid::new_v4(),
            handle: format!("{username}#{suffix}"),
            email: email.clone(),
            username: username.clone(),
            password_hash: password_hash.clone(),
            description: defaults.description.clone(),
            image: defaults.image.clone(),
            language: defaults.language,
            status: Presence::Offline,
            created_at: now,
            updated_at: now,
        };

        match store.insert_account(account.clone()).await {
            Ok(()) => {
                info!(handle = %account.handle, "account created");
                return Ok(account);
            }
            Err(StorageError::Duplicate { field: "email" }) => {
                warn!(%email, "signup lost an email uniqueness race");
                return Err(ServiceError::Conflict("Email already exists".into()));
            }
            Err(StorageError::Duplicate { .. }) => {
                debug!(attempt, %suffix, "handle claimed concurrently; drawing again");
            }
            Err(err) => return Err(err.into()),
        }
    }

    warn!(
        attempts = config.handle_suffix.max_attempts,
        "no free handle suffix found"
    );
    Err(ServiceError::Exhausted(
        "Could not allocate a unique handle, try again later".into(),
    ))
}

/// Zero-padded numeric suffix drawn uniformly from the configured range.
fn draw_suffix(config: &HandleSuffixConfig) -> String {
    let value = rand::rng().random_range(config.min..=config.max);
    format!("{value:04}")
}

/// Account owning `handle`, or `NotFound("User not found")`.
pub async fn find_by_handle(
    state: &SharedState,
    handle: &str,
) -> Result<AccountEntity, ServiceError> {
    let store = state.require_store().await?;
    store
        .find_account_by_handle(handle.trim().to_owned())
        .await?
        .ok_or_else(|| ServiceError::NotFound("User not found".into()))
}

/// Public profile lookup by handle.
pub async fn user_info(state: &SharedState, uid: Option<String>) -> Result<AccountEntity, ServiceError> {
    let uid = uid
        .filter(|uid| !uid.trim().is_empty())
        .ok_or_else(|| ServiceError::InvalidInput("UID is required".into()))?;
    find_by_handle(state, &uid).await
}

/// Apply a partial update to the caller's account.
pub async fn update(
    state: &SharedState,
    mut account: AccountEntity,
    request: UpdateUserRequest,
) -> Result<UpdateOutcome, ServiceError> {
    if request.is_empty() {
        return Err(ServiceError::InvalidInput("No fields provided for update".into()));
    }

    let store = state.require_store().await?;
    let UpdateUserRequest {
        status,
        description,
        image,
        language,
        email,
        username,
        password,
        new_password,
    } = request;

    let credentials = match (email, username, password) {
        (None, None, None) => None,
        (Some(email), Some(username), Some(password)) => Some((email, username, password)),
        _ => {
            return Err(ServiceError::InvalidInput(
                "Email, username and password must be provided together".into(),
            ));
        }
    };
    if new_password.is_some() && credentials.is_none() {
        return Err(ServiceError::InvalidInput(
            "Email, username and password must be provided together".into(),
        ));
    }

    if let Some(status) = status {
        account.status = status;
    }
    if let Some(description) = description {
        account.description = description;
    }
    let image_changed = image.is_some();
    if let Some(image) = image {
        account.image = image;
    }
    if let Some(language) = language {
        account.language = language;
    }

    if let Some((email, username, password)) = credentials {
        if !verify_password(&password, &account.password_hash) {
            warn!(handle = %account.handle, "credential change rejected: wrong password");
            return Err(ServiceError::Unauthorized("Invalid current password".into()));
        }

        let email = normalize_email(&email);
        if let Some(owner) = store.find_account_by_email(email.clone()).await? {
            if owner.id != account.id {
                warn!(%email, "credential change rejected: email in use");
                return Err(ServiceError::Conflict("Email already exists".into()));
            }
        }

        let username = username.trim().to_owned();
        if let Some(new_password) = new_password {
            check_password_policy(
                &state.config().password_policy,
                &new_password,
                &[("username", &username), ("email address", &email)],
            )
            .map_err(ServiceError::InvalidInput)?;
            account.password_hash = hash_password(&new_password);
            debug!(handle = %account.handle, "password replaced");
        }

        account.handle = format!("{username}#{}", account.handle_suffix());
        account.email = email;
        account.username = username;
    }

    account.updated_at = SystemTime::now();
    match store.save_account(account.clone()).await {
        Ok(()) => {}
        Err(StorageError::Duplicate { field: "email" }) => {
            return Err(ServiceError::Conflict("Email already exists".into()));
        }
        Err(StorageError::Duplicate { .. }) => {
            return Err(ServiceError::Conflict("Username already taken".into()));
        }
        Err(err) => return Err(err.into()),
    }

    info!(handle = %account.handle, image_changed, "account updated");
    Ok(UpdateOutcome {
        account,
        image_changed,
    })
}

/// Accounts whose username contains `fragment`, ignoring case, minus the caller.
pub async fn search(
    state: &SharedState,
    caller: &AccountEntity,
    fragment: Option<String>,
) -> Result<Vec<AccountEntity>, ServiceError> {
    let fragment = fragment
        .map(|fragment| fragment.trim().to_owned())
        .filter(|fragment| !fragment.is_empty())
        .ok_or_else(|| ServiceError::InvalidInput("Username is required".into()))?;

    let store = state.require_store().await?;
    let players: Vec<AccountEntity> = store
        .search_accounts(fragment.clone())
        .await?
        .into_iter()
        .filter(|account| account.id != caller.id)
        .collect();
    debug!(%fragment, count = players.len(), "player search");
    Ok(players)
}

/// Handle of `id`, memoized in `cache`.
pub(crate) async fn handle_of(
    store: &dyn ArcadeStore,
    cache: &mut HashMap<Uuid, String>,
    id: Uuid,
) -> Result<Option<String>, ServiceError> {
    if let Some(handle) = cache.get(&id) {
        return Ok(Some(handle.clone()));
    }
    let handle = store.find_account(id).await?.map(|account| account.handle);
    if let Some(handle) = &handle {
        cache.insert(id, handle.clone());
    }
    Ok(handle)
}
