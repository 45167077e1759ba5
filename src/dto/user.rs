use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    dao::models::{AccountEntity, Language, Presence},
    dto::validation::validate_username,
};

/// Maximum length of a profile description, in characters.
pub const DESCRIPTION_MAX_CHARS: u64 = 500;

/// `?uid=` query used by lookups that target a specific account.
#[derive(Debug, Deserialize, IntoParams)]
pub struct UidQuery {
    /// Handle (`name#NNNN`) of the account.
    pub uid: Option<String>,
}

/// `?username=` query of the player search.
#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchQuery {
    /// Fragment matched case-insensitively against usernames.
    pub username: Option<String>,
}

/// Public profile of an account.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserInfo {
    pub uid: String,
    pub username: String,
    pub email: String,
    pub description: String,
    pub image: String,
    pub language: Language,
}

impl From<AccountEntity> for UserInfo {
    fn from(account: AccountEntity) -> Self {
        Self {
            uid: account.handle,
            username: account.username,
            email: account.email,
            description: account.description,
            image: account.image,
            language: account.language,
        }
    }
}

/// Partial account update. Every field is optional, but at least one must be present.
///
/// `email`, `username` and `password` form a credential block: they must be sent together,
/// `password` being the current one. `newPassword` optionally replaces it.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub status: Option<Presence>,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
    /// Avatar reference (path or URL).
    #[validate(length(min = 1, message = "Image reference cannot be empty"))]
    pub image: Option<String>,
    pub language: Option<Language>,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,
    #[validate(custom(function = validate_username))]
    pub username: Option<String>,
    pub password: Option<String>,
    pub new_password: Option<String>,
}

impl UpdateUserRequest {
    /// Whether the request carries no field at all.
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.description.is_none()
            && self.image.is_none()
            && self.language.is_none()
            && self.email.is_none()
            && self.username.is_none()
            && self.password.is_none()
            && self.new_password.is_none()
    }
}

/// Data returned after an avatar change.
#[derive(Debug, Serialize, ToSchema)]
pub struct ImageData {
    pub image_url: String,
}
