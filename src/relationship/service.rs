//! Caller-facing entry point for friend-request mutations.
//!
//! [`FriendRequestService`] wraps [`RelationshipGraph`] transitions with
//! per-pair serialization: every mutation touching the pair `{A, B}`
//! runs under an exclusive lock keyed by the canonical [`PairKey`], so
//! the check-then-act sequences in the graph cannot interleave for the
//! same pair. Operations on disjoint pairs do not block one another.
//!
//! Read paths (`relationship_class`, profile resolution) never take a
//! pair lock; they may observe a slightly stale relationship under a
//! concurrent mutation but are always internally consistent.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::error::{RelationshipError, Result};
use super::graph::RelationshipGraph;
use super::types::{PairKey, RequestDecision, RequestId};

/// Serialized mutation surface over the friend-request ledger.
pub struct FriendRequestService {
    graph: Arc<RelationshipGraph>,
    // One lock per pair that has ever been mutated. Entries are retained
    // for the life of the service.
    pair_locks: Mutex<HashMap<PairKey, Arc<Mutex<()>>>>,
}

impl FriendRequestService {
    /// Creates a service over the given relationship graph.
    #[must_use]
    pub fn new(graph: Arc<RelationshipGraph>) -> Self {
        Self {
            graph,
            pair_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the lock guarding mutations for `pair`.
    fn pair_lock(&self, pair: PairKey) -> Result<Arc<Mutex<()>>> {
        let mut table = self.pair_locks.lock().map_err(|e| {
            RelationshipError::Storage(format!("Failed to acquire pair lock table: {e}"))
        })?;
        Ok(Arc::clone(table.entry(pair).or_default()))
    }

    /// Sends a friend request from `sender` to `receiver`.
    ///
    /// # Errors
    ///
    /// Returns the same errors as
    /// [`RelationshipGraph::send_request`].
    pub fn send_request(&self, sender: &str, receiver: &str) -> Result<RequestId> {
        if sender == receiver {
            return Err(RelationshipError::SelfReference);
        }

        let lock = self.pair_lock(PairKey::new(sender, receiver))?;
        let _guard = lock
            .lock()
            .map_err(|e| RelationshipError::Storage(format!("Pair lock poisoned: {e}")))?;

        self.graph.send_request(sender, receiver)
    }

    /// Applies `responder`'s decision to a pending request.
    ///
    /// The request's pair is resolved first, then the transition is
    /// re-checked and applied under that pair's lock.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`RelationshipGraph::respond`].
    pub fn respond(
        &self,
        request_id: RequestId,
        responder: &str,
        decision: RequestDecision,
    ) -> Result<()> {
        let pair = self.pair_of(request_id)?;
        let lock = self.pair_lock(pair)?;
        let _guard = lock
            .lock()
            .map_err(|e| RelationshipError::Storage(format!("Pair lock poisoned: {e}")))?;

        self.graph.respond(request_id, responder, decision)
    }

    /// Withdraws a pending request.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`RelationshipGraph::cancel`].
    pub fn cancel(&self, request_id: RequestId, canceller: &str) -> Result<()> {
        let pair = self.pair_of(request_id)?;
        let lock = self.pair_lock(pair)?;
        let _guard = lock
            .lock()
            .map_err(|e| RelationshipError::Storage(format!("Pair lock poisoned: {e}")))?;

        self.graph.cancel(request_id, canceller)
    }

    /// Dissolves the friendship between two users.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`RelationshipGraph::unfriend`].
    pub fn unfriend(&self, user_a: &str, user_b: &str) -> Result<()> {
        let lock = self.pair_lock(PairKey::new(user_a, user_b))?;
        let _guard = lock
            .lock()
            .map_err(|e| RelationshipError::Storage(format!("Pair lock poisoned: {e}")))?;

        self.graph.unfriend(user_a, user_b)
    }

    /// Resolves the pair a request id belongs to.
    fn pair_of(&self, request_id: RequestId) -> Result<PairKey> {
        let record = self
            .graph
            .get_request(request_id)?
            .ok_or(RelationshipError::NotFound(request_id))?;
        Ok(record.pair())
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::relationship::storage::LedgerStorage;

    fn service() -> FriendRequestService {
        let storage = Arc::new(LedgerStorage::in_memory().unwrap());
        FriendRequestService::new(Arc::new(RelationshipGraph::new(storage)))
    }

    #[test]
    fn send_respond_unfriend_lifecycle() {
        let service = service();

        let id = service.send_request("alice", "bob").unwrap();
        service.respond(id, "bob", RequestDecision::Accept).unwrap();
        service.unfriend("alice", "bob").unwrap();

        // Pair freed; a new request succeeds.
        service.send_request("bob", "alice").unwrap();
    }

    #[test]
    fn send_to_self_rejected_before_locking() {
        let service = service();
        assert!(matches!(
            service.send_request("alice", "alice"),
            Err(RelationshipError::SelfReference)
        ));
    }

    #[test]
    fn respond_unknown_request_fails() {
        let service = service();
        assert!(matches!(
            service.respond(7, "bob", RequestDecision::Accept),
            Err(RelationshipError::NotFound(7))
        ));
    }

    #[test]
    fn cancel_unknown_request_fails() {
        let service = service();
        assert!(matches!(
            service.cancel(7, "alice"),
            Err(RelationshipError::NotFound(7))
        ));
    }

    #[test]
    fn concurrent_sends_for_one_pair_yield_one_success() {
        let service = Arc::new(service());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let service = Arc::clone(&service);
                thread::spawn(move || {
                    if i % 2 == 0 {
                        service.send_request("alice", "bob")
                    } else {
                        service.send_request("bob", "alice")
                    }
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);

        // Every loser got the typed conflict error, not a database error.
        for result in results {
            if let Err(err) = result {
                assert!(matches!(err, RelationshipError::DuplicateRequest));
            }
        }
    }

    #[test]
    fn concurrent_accept_and_cancel_have_one_winner() {
        let service = Arc::new(service());
        let id = service.send_request("alice", "bob").unwrap();

        let accepter = {
            let service = Arc::clone(&service);
            thread::spawn(move || service.respond(id, "bob", RequestDecision::Accept))
        };
        let canceller = {
            let service = Arc::clone(&service);
            thread::spawn(move || service.cancel(id, "alice"))
        };

        let accept_result = accepter.join().unwrap();
        let cancel_result = canceller.join().unwrap();

        assert!(accept_result.is_ok() ^ cancel_result.is_ok());
    }

    #[test]
    fn disjoint_pairs_do_not_interfere() {
        let service = Arc::new(service());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let service = Arc::clone(&service);
                thread::spawn(move || {
                    let sender = format!("sender{i}");
                    let receiver = format!("receiver{i}");
                    service.send_request(&sender, &receiver)
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap().unwrap();
        }
    }
}
