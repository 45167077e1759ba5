use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::dao::models::{FriendshipStatus, Presence};

/// Friend request sent from `emitter-uid` (the caller) to `receiver-uid`.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SendFriendRequest {
    #[serde(rename = "emitter-uid")]
    #[validate(length(min = 1, message = "Missing required fields"))]
    pub emitter_uid: String,
    #[serde(rename = "receiver-uid")]
    #[validate(length(min = 1, message = "Missing required fields"))]
    pub receiver_uid: String,
}

/// Answer of the caller to a request previously sent by `emitter-uid`.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RespondFriendRequest {
    #[serde(rename = "emitter-uid")]
    #[validate(length(min = 1, message = "Missing required fields"))]
    pub emitter_uid: String,
    /// `accepted`, `declined` or its alias `rejected`.
    #[validate(length(min = 1, message = "Missing required fields"))]
    pub status: String,
}

/// Accepted friend as seen by the caller.
#[derive(Debug, Serialize, ToSchema)]
pub struct FriendSummary {
    pub uid: String,
    pub username: String,
    /// Current presence of the friend.
    pub status: Presence,
}

/// Pending request involving the caller on either side.
#[derive(Debug, Serialize, ToSchema)]
pub struct FriendRequestSummary {
    pub sender_uid: String,
    pub receiver_uid: String,
    pub status: FriendshipStatus,
}
