//! Core types for the friend-request ledger.
//!
//! This module defines the data structures for friend requests, the
//! lifecycle status of a request, and the derived relationship class
//! used to gate profile visibility.
//!
//! # Privacy Model
//!
//! Veil derives the relationship between two users exclusively from the
//! request ledger. There is no second mutable friend list kept in sync
//! by hand; the ledger is the single source of truth, so relationship
//! class can never diverge from request history.

use serde::{Deserialize, Serialize};

/// Opaque unique key for a user.
///
/// Equality-comparable only; no other semantics are assumed. Typically a
/// hex pubkey or an account id supplied by the identity provider.
pub type UserId = String;

/// Identifier of a friend-request record (ledger rowid).
pub type RequestId = i64;

/// Lifecycle status of a friend request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Request sent, receiver has not yet responded.
    Pending,
    /// Receiver accepted; the pair are friends.
    Accepted,
    /// Receiver declined the request.
    Declined,
    /// Sender withdrew the request before a response.
    Cancelled,
}

impl RequestStatus {
    /// Converts to string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            "declined" => Some(Self::Declined),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns whether this status counts toward the one-record-per-pair
    /// invariant.
    ///
    /// Declined and cancelled records are terminal and free the pair for
    /// a fresh request.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Accepted)
    }
}

/// A receiver's response to a pending friend request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestDecision {
    /// Accept the request; the pair become friends.
    Accept,
    /// Decline the request.
    Decline,
}

impl RequestDecision {
    /// Parses from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "accept" => Some(Self::Accept),
            "decline" => Some(Self::Decline),
            _ => None,
        }
    }

    /// The status a pending request transitions to under this decision.
    #[must_use]
    pub const fn resulting_status(&self) -> RequestStatus {
        match self {
            Self::Accept => RequestStatus::Accepted,
            Self::Decline => RequestStatus::Declined,
        }
    }
}

/// A friend-request ledger record.
///
/// Created by [`sendRequest`](crate::relationship::RelationshipGraph::send_request)
/// and mutated only through the defined transitions. At most one record
/// with an active status exists per unordered user pair at any time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRequestRecord {
    /// Ledger rowid.
    pub id: RequestId,
    /// User who sent the request.
    pub sender: UserId,
    /// User the request was sent to.
    pub receiver: UserId,
    /// Current lifecycle status.
    pub status: RequestStatus,
    /// When the request was created (Unix timestamp).
    pub created_at: i64,
    /// When the request was last updated (Unix timestamp).
    pub updated_at: i64,
}

impl FriendRequestRecord {
    /// Canonical pair key for this record's sender/receiver pair.
    #[must_use]
    pub fn pair(&self) -> PairKey {
        PairKey::new(&self.sender, &self.receiver)
    }
}

/// Relationship class of a viewer relative to a profile owner.
///
/// Derived on demand from the ledger, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipClass {
    /// Viewer is the owner.
    SelfView,
    /// An accepted request links viewer and owner.
    Friend,
    /// Everyone else, including anonymous viewers.
    Public,
}

/// Canonical key for an unordered user pair.
///
/// The pair is stored sorted so `{A, B}` and `{B, A}` map to the same
/// key. All ledger mutations for a pair are serialized on this key, and
/// the at-most-one-active-record invariant is indexed by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairKey {
    low: UserId,
    high: UserId,
}

impl PairKey {
    /// Builds the canonical key for two user ids, in either order.
    #[must_use]
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self {
                low: a.to_string(),
                high: b.to_string(),
            }
        } else {
            Self {
                low: b.to_string(),
                high: a.to_string(),
            }
        }
    }

    /// The lexicographically smaller user id.
    #[must_use]
    pub fn low(&self) -> &str {
        &self.low
    }

    /// The lexicographically larger user id.
    #[must_use]
    pub fn high(&self) -> &str {
        &self.high
    }
}
