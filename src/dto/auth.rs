use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::{AccountEntity, Language},
    dto::validation::validate_username,
};

/// Payload used to register a new account.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SignupRequest {
    #[validate(
        length(min = 1, message = "Missing required fields"),
        custom(function = validate_username)
    )]
    pub username: String,
    #[validate(
        length(min = 1, message = "Missing required fields"),
        email(message = "Enter a valid email address.")
    )]
    pub email: String,
    #[validate(length(min = 1, message = "Missing required fields"))]
    pub password: String,
}

/// Email/password pair, used both for regular and guest logins.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CredentialsRequest {
    #[validate(length(min = 1, message = "Missing required fields"))]
    pub email: String,
    #[validate(length(min = 1, message = "Missing required fields"))]
    pub password: String,
}

/// Identity attached to a session.
///
/// `token` is present whenever the session token is known to the handler.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionData {
    pub uid: String,
    pub language: Language,
    pub token: Option<String>,
}

impl SessionData {
    pub fn new(account: &AccountEntity, token: Option<String>) -> Self {
        Self {
            uid: account.handle.clone(),
            language: account.language,
            token,
        }
    }
}

/// Account validated through a guest login.
#[derive(Debug, Serialize, ToSchema)]
pub struct GuestData {
    pub uid: String,
    pub username: String,
}

impl From<AccountEntity> for GuestData {
    fn from(account: AccountEntity) -> Self {
        Self {
            uid: account.handle,
            username: account.username,
        }
    }
}

/// Bare public identifier of an account.
#[derive(Debug, Serialize, ToSchema)]
pub struct UidData {
    pub uid: String,
}
