//! Friendship ledger.
//!
//! A request is created `pending` by its sender and moved once, by its receiver, to `accepted`
//! or `declined`. At most one request exists per unordered pair of accounts.

use std::{collections::HashMap, time::SystemTime};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        models::{FriendshipEntity, FriendshipStatus},
        storage::StorageError,
    },
    dto::social::{FriendRequestSummary, FriendSummary, RespondFriendRequest, SendFriendRequest},
    error::ServiceError,
    services::account_service::{self, handle_of},
    state::{Session, SharedState},
};

/// Parse the answer of a receiver. `rejected` is accepted as an alias of `declined`.
pub fn parse_response(raw: &str) -> Result<FriendshipStatus, ServiceError> {
    match raw.trim().to_lowercase().as_str() {
        "accepted" => Ok(FriendshipStatus::Accepted),
        "declined" | "rejected" => Ok(FriendshipStatus::Declined),
        _ => Err(ServiceError::InvalidInput("Invalid status".into())),
    }
}

/// Send a friend request from the caller to `receiver-uid`.
pub async fn send_request(
    state: &SharedState,
    session: &Session,
    request: SendFriendRequest,
) -> Result<FriendshipEntity, ServiceError> {
    let emitter = account_service::find_by_handle(state, &request.emitter_uid).await?;
    let receiver = account_service::find_by_handle(state, &request.receiver_uid).await?;
    debug!(emitter = %emitter.handle, receiver = %receiver.handle, "friend request");

    if emitter.id != session.account.id {
        warn!(
            caller = %session.account.handle,
            emitter = %emitter.handle,
            "friend request rejected: emitter is not the caller"
        );
        return Err(ServiceError::Unauthorized(
            "Cannot send a friend request on behalf of another user".into(),
        ));
    }
    if emitter.id == receiver.id {
        return Err(ServiceError::InvalidInput(
            "Cannot send a friend request to yourself".into(),
        ));
    }

    let store = state.require_store().await?;
    if store
        .find_friendship_between(emitter.id, receiver.id)
        .await?
        .is_some()
    {
        warn!(emitter = %emitter.handle, receiver = %receiver.handle, "friend request already exists");
        return Err(ServiceError::Conflict("Friend request already exists".into()));
    }

    let now = SystemTime::now();
    let friendship = FriendshipEntity {
        id: Uuid::new_v4(),
        sender_id: emitter.id,
        receiver_id: receiver.id,
        status: FriendshipStatus::Pending,
        created_at: now,
        updated_at: now,
    };
    match store.insert_friendship(friendship.clone()).await {
        Ok(()) => {}
        Err(StorageError::Duplicate { .. }) => {
            return Err(ServiceError::Conflict("Friend request already exists".into()));
        }
        Err(err) => return Err(err.into()),
    }

    info!(emitter = %emitter.handle, receiver = %receiver.handle, "friend request sent");
    Ok(friendship)
}

/// Accept or decline the pending request sent by `emitter-uid` to the caller.
pub async fn respond(
    state: &SharedState,
    session: &Session,
    request: RespondFriendRequest,
) -> Result<FriendshipStatus, ServiceError> {
    let status = parse_response(&request.status)?;
    let sender = account_service::find_by_handle(state, &request.emitter_uid).await?;

    let store = state.require_store().await?;
    let Some(mut friendship) = store
        .find_friendship(sender.id, session.account.id)
        .await?
    else {
        return Err(ServiceError::NotFound("Friend request not found".into()));
    };

    if friendship.status != FriendshipStatus::Pending {
        warn!(
            sender = %sender.handle,
            receiver = %session.account.handle,
            status = %friendship.status,
            "friend request already answered"
        );
        return Err(ServiceError::Conflict(format!(
            "Friend request already {}",
            friendship.status
        )));
    }

    friendship.status = status;
    friendship.updated_at = SystemTime::now();
    store.save_friendship(friendship).await?;

    info!(sender = %sender.handle, receiver = %session.account.handle, %status, "friend request answered");
    Ok(status)
}

/// Accounts linked to the caller by an accepted request, in either direction.
pub async fn list_friends(
    state: &SharedState,
    session: &Session,
) -> Result<Vec<FriendSummary>, ServiceError> {
    let store = state.require_store().await?;
    let me = session.account.id;
    let accepted = store
        .list_friendships(me, FriendshipStatus::Accepted)
        .await?;

    let mut friends = Vec::with_capacity(accepted.len());
    for friendship in accepted {
        let friend_id = friendship.counterpart(me);
        let Some(friend) = store.find_account(friend_id).await? else {
            warn!(%friend_id, "friendship references a missing account");
            continue;
        };
        friends.push(FriendSummary {
            uid: friend.handle,
            username: friend.username,
            status: friend.status,
        });
    }
    Ok(friends)
}

/// Pending requests the caller sent or received.
pub async fn list_pending(
    state: &SharedState,
    session: &Session,
) -> Result<Vec<FriendRequestSummary>, ServiceError> {
    let store = state.require_store().await?;
    let me = &session.account;
    let pending = store
        .list_friendships(me.id, FriendshipStatus::Pending)
        .await?;

    let mut handles = HashMap::from([(me.id, me.handle.clone())]);
    let mut requests = Vec::with_capacity(pending.len());
    for friendship in pending {
        let sender_uid = handle_of(store.as_ref(), &mut handles, friendship.sender_id).await?;
        let receiver_uid = handle_of(store.as_ref(), &mut handles, friendship.receiver_id).await?;
        let (Some(sender_uid), Some(receiver_uid)) = (sender_uid, receiver_uid) else {
            warn!(id = %friendship.id, "friend request references a missing account");
            continue;
        };
        requests.push(FriendRequestSummary {
            sender_uid,
            receiver_uid,
            status: friendship.status,
        });
    }
    Ok(requests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{memory_state, register, session_for};

    fn send(emitter: &str, receiver: &str) -> SendFriendRequest {
        SendFriendRequest {
            emitter_uid: emitter.into(),
            receiver_uid: receiver.into(),
        }
    }

    fn answer(emitter: &str, status: &str) -> RespondFriendRequest {
        RespondFriendRequest {
            emitter_uid: emitter.into(),
            status: status.into(),
        }
    }

    #[test]
    fn rejected_is_an_alias_of_declined() {
        assert_eq!(parse_response("rejected").unwrap(), FriendshipStatus::Declined);
        assert_eq!(parse_response("Accepted").unwrap(), FriendshipStatus::Accepted);
        assert!(parse_response("pending").is_err());
    }

    #[tokio::test]
    async fn accepted_request_is_visible_from_both_sides() {
        let state = memory_state().await;
        let ann = register(&state, "ann", "a@x.com").await;
        let bob = register(&state, "bob", "b@x.com").await;
        let ann_session = session_for(&state, &ann);
        let bob_session = session_for(&state, &bob);

        send_request(&state, &ann_session, send(&ann.handle, &bob.handle))
            .await
            .unwrap();
        let pending = list_pending(&state, &bob_session).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].sender_uid, ann.handle);
        assert_eq!(list_pending(&state, &ann_session).await.unwrap().len(), 1);

        let status = respond(&state, &bob_session, answer(&ann.handle, "accepted"))
            .await
            .unwrap();
        assert_eq!(status, FriendshipStatus::Accepted);

        let ann_friends = list_friends(&state, &ann_session).await.unwrap();
        let bob_friends = list_friends(&state, &bob_session).await.unwrap();
        assert_eq!(ann_friends.len(), 1);
        assert_eq!(ann_friends[0].uid, bob.handle);
        assert_eq!(bob_friends.len(), 1);
        assert_eq!(bob_friends[0].uid, ann.handle);
        assert!(list_pending(&state, &ann_session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reverse_request_is_a_duplicate() {
        let state = memory_state().await;
        let ann = register(&state, "ann", "a@x.com").await;
        let bob = register(&state, "bob", "b@x.com").await;

        send_request(&state, &session_for(&state, &ann), send(&ann.handle, &bob.handle))
            .await
            .unwrap();
        let err = send_request(&state, &session_for(&state, &bob), send(&bob.handle, &ann.handle))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(message) if message == "Friend request already exists"));
    }

    #[tokio::test]
    async fn emitter_must_be_the_caller() {
        let state = memory_state().await;
        let ann = register(&state, "ann", "a@x.com").await;
        let bob = register(&state, "bob", "b@x.com").await;
        let err = send_request(&state, &session_for(&state, &bob), send(&ann.handle, &bob.handle))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn self_requests_and_unknown_users_are_rejected() {
        let state = memory_state().await;
        let ann = register(&state, "ann", "a@x.com").await;
        let session = session_for(&state, &ann);

        let own = send_request(&state, &session, send(&ann.handle, &ann.handle))
            .await
            .unwrap_err();
        assert!(matches!(own, ServiceError::InvalidInput(_)));

        let ghost = send_request(&state, &session, send(&ann.handle, "ghost#0001"))
            .await
            .unwrap_err();
        assert!(matches!(ghost, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn only_the_receiver_can_answer_and_only_once() {
        let state = memory_state().await;
        let ann = register(&state, "ann", "a@x.com").await;
        let bob = register(&state, "bob", "b@x.com").await;
        let ann_session = session_for(&state, &ann);
        let bob_session = session_for(&state, &bob);
        send_request(&state, &ann_session, send(&ann.handle, &bob.handle))
            .await
            .unwrap();

        // The sender looking for a request from the receiver finds nothing.
        let wrong_side = respond(&state, &ann_session, answer(&bob.handle, "accepted"))
            .await
            .unwrap_err();
        assert!(matches!(wrong_side, ServiceError::NotFound(_)));

        respond(&state, &bob_session, answer(&ann.handle, "rejected"))
            .await
            .unwrap();
        let again = respond(&state, &bob_session, answer(&ann.handle, "accepted"))
            .await
            .unwrap_err();
        assert!(matches!(again, ServiceError::Conflict(_)));
        assert!(list_friends(&state, &ann_session).await.unwrap().is_empty());
    }
}
