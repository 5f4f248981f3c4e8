//! Friend-request lifecycle and relationship derivation.
//!
//! This module owns the friend-request ledger and everything derived
//! from it. The ledger is the single source of truth for friendship:
//! the relationship class between two users is always computed from
//! request records on demand, never read from a second mutable list.
//!
//! # Architecture
//!
//! ```text
//! FriendRequestService (per-pair serialized mutations)
//!     └── RelationshipGraph (checked transitions + queries)
//!             └── LedgerStorage (SQLite for request records)
//! ```
//!
//! # State machine per unordered pair
//!
//! ```text
//! (none) → pending → { accepted, declined, cancelled }
//! accepted → (none)   via unfriend
//! ```
//!
//! Declined and cancelled records are terminal for that record, but the
//! pair returns to the unconnected state and a new request may be sent.
//! At most one pending/accepted record exists per pair at any time.
//!
//! # Types
//!
//! - [`FriendRequestRecord`]: one ledger entry
//! - [`RequestStatus`]: the lifecycle status of a record
//! - [`RelationshipClass`]: derived viewer/owner category
//! - [`PairKey`]: canonical sorted key for an unordered user pair

mod error;
mod graph;
mod service;
mod storage;
pub mod types;

pub use error::{RelationshipError, Result};
pub use graph::RelationshipGraph;
pub use service::FriendRequestService;
pub use storage::LedgerStorage;
pub use types::{
    FriendRequestRecord, PairKey, RelationshipClass, RequestDecision, RequestId, RequestStatus,
    UserId,
};
