//! Relationship graph derived from the friend-request ledger.
//!
//! [`RelationshipGraph`] answers relationship queries and performs the
//! checked ledger transitions. It is the single source of truth for
//! friendship: there is no reciprocal membership list to keep in sync,
//! the class between two users is always derived from the ledger on
//! demand.
//!
//! Mutations here are check-then-act sequences and must run under the
//! per-pair lock held by [`FriendRequestService`]; calling them directly
//! from concurrent contexts can still not violate the one-active-record
//! invariant (the storage layer's unique index rejects the loser), but
//! the loser then surfaces a database error instead of the typed
//! conflict error.
//!
//! [`FriendRequestService`]: crate::relationship::FriendRequestService

use std::sync::Arc;

use super::error::{RelationshipError, Result};
use super::storage::LedgerStorage;
use super::types::{
    FriendRequestRecord, PairKey, RelationshipClass, RequestDecision, RequestId, RequestStatus,
    UserId,
};

/// Queries and checked transitions over the friend-request ledger.
pub struct RelationshipGraph {
    storage: Arc<LedgerStorage>,
}

impl RelationshipGraph {
    /// Creates a graph over the given ledger storage.
    #[must_use]
    pub const fn new(storage: Arc<LedgerStorage>) -> Self {
        Self { storage }
    }

    // ==================== Transitions ====================

    /// Creates a new pending request from `sender` to `receiver`.
    ///
    /// # Errors
    ///
    /// Returns [`RelationshipError::SelfReference`] if sender and
    /// receiver are the same user, [`RelationshipError::AlreadyFriends`]
    /// if an accepted record exists for the pair, and
    /// [`RelationshipError::DuplicateRequest`] if a pending record
    /// exists in either direction.
    pub fn send_request(&self, sender: &str, receiver: &str) -> Result<RequestId> {
        if sender == receiver {
            return Err(RelationshipError::SelfReference);
        }

        let pair = PairKey::new(sender, receiver);
        if let Some(existing) = self.storage.active_request_for_pair(&pair)? {
            return Err(match existing.status {
                RequestStatus::Accepted => RelationshipError::AlreadyFriends,
                _ => RelationshipError::DuplicateRequest,
            });
        }

        let now = chrono::Utc::now().timestamp();
        let record = self.storage.insert_request(sender, receiver, now)?;
        Ok(record.id)
    }

    /// Applies the receiver's decision to a pending request.
    ///
    /// # Errors
    ///
    /// Returns [`RelationshipError::NotFound`] if no such request
    /// exists, [`RelationshipError::NotAuthorized`] if `responder` is
    /// not the request's receiver, and
    /// [`RelationshipError::InvalidState`] if the request is not
    /// pending.
    pub fn respond(
        &self,
        request_id: RequestId,
        responder: &str,
        decision: RequestDecision,
    ) -> Result<()> {
        let record = self
            .storage
            .get_request(request_id)?
            .ok_or(RelationshipError::NotFound(request_id))?;

        if record.receiver != responder {
            return Err(RelationshipError::NotAuthorized(
                "only the receiver may respond to a friend request".to_string(),
            ));
        }
        if record.status != RequestStatus::Pending {
            return Err(RelationshipError::InvalidState(format!(
                "request is {}, expected pending",
                record.status.as_str()
            )));
        }

        let now = chrono::Utc::now().timestamp();
        self.storage
            .update_status(request_id, decision.resulting_status(), now)
    }

    /// Withdraws a pending request.
    ///
    /// # Errors
    ///
    /// Returns [`RelationshipError::NotFound`] if no such request
    /// exists, [`RelationshipError::NotAuthorized`] if `canceller` is
    /// not the request's sender, and
    /// [`RelationshipError::InvalidState`] if the request is not
    /// pending.
    pub fn cancel(&self, request_id: RequestId, canceller: &str) -> Result<()> {
        let record = self
            .storage
            .get_request(request_id)?
            .ok_or(RelationshipError::NotFound(request_id))?;

        if record.sender != canceller {
            return Err(RelationshipError::NotAuthorized(
                "only the sender may cancel a friend request".to_string(),
            ));
        }
        if record.status != RequestStatus::Pending {
            return Err(RelationshipError::InvalidState(format!(
                "request is {}, expected pending",
                record.status.as_str()
            )));
        }

        let now = chrono::Utc::now().timestamp();
        self.storage
            .update_status(request_id, RequestStatus::Cancelled, now)
    }

    /// Removes the accepted record linking two users.
    ///
    /// The record is deleted outright, so the pair returns to the
    /// unconnected state and a fresh request may later be sent.
    ///
    /// # Errors
    ///
    /// Returns [`RelationshipError::InvalidState`] if no accepted
    /// record exists for the pair.
    pub fn unfriend(&self, user_a: &str, user_b: &str) -> Result<()> {
        let pair = PairKey::new(user_a, user_b);
        let record = self
            .storage
            .accepted_request_for_pair(&pair)?
            .ok_or_else(|| {
                RelationshipError::InvalidState("users are not friends".to_string())
            })?;

        self.storage.delete_request(record.id)
    }

    // ==================== Queries ====================

    /// Derives the relationship class of `viewer` relative to `owner`.
    ///
    /// Pure query, never fails. An absent viewer is anonymous and maps
    /// to [`RelationshipClass::Public`]. A storage read failure also
    /// degrades to `Public`, the class granting the least access.
    #[must_use]
    pub fn relationship_class(&self, viewer: Option<&str>, owner: &str) -> RelationshipClass {
        let Some(viewer) = viewer else {
            return RelationshipClass::Public;
        };
        if viewer == owner {
            return RelationshipClass::SelfView;
        }

        let pair = PairKey::new(viewer, owner);
        match self.storage.accepted_request_for_pair(&pair) {
            Ok(Some(_)) => RelationshipClass::Friend,
            Ok(None) | Err(_) => RelationshipClass::Public,
        }
    }

    /// Retrieves a request record by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub fn get_request(&self, request_id: RequestId) -> Result<Option<FriendRequestRecord>> {
        self.storage.get_request(request_id)
    }

    /// Pending requests addressed to `user`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub fn incoming_requests(&self, user: &str) -> Result<Vec<FriendRequestRecord>> {
        self.storage.pending_requests_to(user)
    }

    /// Pending requests sent by `user`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub fn outgoing_requests(&self, user: &str) -> Result<Vec<FriendRequestRecord>> {
        self.storage.pending_requests_from(user)
    }

    /// Ids of all users linked to `user` by an accepted record.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub fn friends_of(&self, user: &str) -> Result<Vec<UserId>> {
        self.storage.accepted_partners_of(user)
    }
}
