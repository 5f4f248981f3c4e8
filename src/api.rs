//! High-level facade wiring the ledger, audience config, and resolver.
//!
//! [`VeilCore`] is the transport-agnostic operation surface a binding
//! (HTTP, RPC, FFI) maps onto. It performs the string-to-enum parsing
//! for field and level keys and exposes one uniform error type, so
//! upstream collaborators translate [`VeilError`] kinds to user-facing
//! responses (conflict, forbidden, not-found) without knowing module
//! internals.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::profile::{
    resolve_profile, AudienceConfig, AudienceError, AudienceLevel, AudienceStorage, ProfileField,
    RawProfile,
};
use crate::relationship::{
    FriendRequestRecord, FriendRequestService, LedgerStorage, RelationshipClass,
    RelationshipError, RelationshipGraph, RequestDecision, RequestId, UserId,
};

/// Uniform error surface of the facade.
#[derive(Error, Debug)]
pub enum VeilError {
    /// Friend-request ledger error.
    #[error(transparent)]
    Relationship(#[from] RelationshipError),

    /// Audience configuration error.
    #[error(transparent)]
    Audience(#[from] AudienceError),

    /// Storage initialization failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type alias for facade operations.
pub type Result<T> = std::result::Result<T, VeilError>;

/// Core interface for profile visibility.
///
/// Owns the friend-request service, the audience configuration, and the
/// read-only resolution path. All mutations go through here; reads are
/// snapshot reads that never take pair locks.
///
/// # Example
///
/// ```ignore
/// use std::path::Path;
/// use veil_core::VeilCore;
///
/// let core = VeilCore::open(Path::new("/data/veil"))?;
/// let id = core.send_friend_request("alice", "bob")?;
/// ```
pub struct VeilCore {
    graph: Arc<RelationshipGraph>,
    audience: AudienceConfig,
    service: FriendRequestService,
}

impl VeilCore {
    /// Opens (or creates) the core databases under `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if initialization fails.
    pub fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .map_err(|e| VeilError::Storage(format!("Failed to create data directory: {e}")))?;

        let ledger = Arc::new(LedgerStorage::new(&data_dir.join("ledger.db"))?);
        let settings = Arc::new(AudienceStorage::new(&data_dir.join("audience.db"))?);
        Ok(Self::from_storage(ledger, settings))
    }

    /// Creates a core backed by in-memory databases, for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if initialization fails.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn in_memory() -> Result<Self> {
        let ledger = Arc::new(LedgerStorage::in_memory()?);
        let settings = Arc::new(AudienceStorage::in_memory()?);
        Ok(Self::from_storage(ledger, settings))
    }

    fn from_storage(ledger: Arc<LedgerStorage>, settings: Arc<AudienceStorage>) -> Self {
        let graph = Arc::new(RelationshipGraph::new(ledger));
        let service = FriendRequestService::new(Arc::clone(&graph));
        let audience = AudienceConfig::new(settings);
        Self {
            graph,
            audience,
            service,
        }
    }

    // ==================== Friend Requests ====================

    /// Sends a friend request.
    ///
    /// # Errors
    ///
    /// Returns an error if the sender targets themselves, the pair is
    /// already linked by a pending or accepted request, or storage
    /// fails.
    pub fn send_friend_request(&self, sender: &str, receiver: &str) -> Result<RequestId> {
        Ok(self.service.send_request(sender, receiver)?)
    }

    /// Accepts or declines a pending request as its receiver.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is unknown, the responder is not
    /// its receiver, the request is not pending, or storage fails.
    pub fn respond_friend_request(
        &self,
        request_id: RequestId,
        responder: &str,
        decision: RequestDecision,
    ) -> Result<()> {
        Ok(self.service.respond(request_id, responder, decision)?)
    }

    /// Withdraws a pending request as its sender.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is unknown, the canceller is not
    /// its sender, the request is not pending, or storage fails.
    pub fn cancel_friend_request(&self, request_id: RequestId, canceller: &str) -> Result<()> {
        Ok(self.service.cancel(request_id, canceller)?)
    }

    /// Dissolves the friendship between two users.
    ///
    /// # Errors
    ///
    /// Returns an error if the users are not friends or storage fails.
    pub fn unfriend(&self, user_a: &str, user_b: &str) -> Result<()> {
        Ok(self.service.unfriend(user_a, user_b)?)
    }

    /// Retrieves a request record by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub fn get_request(&self, request_id: RequestId) -> Result<Option<FriendRequestRecord>> {
        Ok(self.graph.get_request(request_id)?)
    }

    /// Pending requests addressed to `user`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub fn incoming_requests(&self, user: &str) -> Result<Vec<FriendRequestRecord>> {
        Ok(self.graph.incoming_requests(user)?)
    }

    /// Pending requests sent by `user`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub fn outgoing_requests(&self, user: &str) -> Result<Vec<FriendRequestRecord>> {
        Ok(self.graph.outgoing_requests(user)?)
    }

    /// Ids of all accepted friends of `user`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub fn friends_of(&self, user: &str) -> Result<Vec<UserId>> {
        Ok(self.graph.friends_of(user)?)
    }

    /// Derives the relationship class of `viewer` relative to `owner`.
    #[must_use]
    pub fn relationship_class(&self, viewer: Option<&str>, owner: &str) -> RelationshipClass {
        self.graph.relationship_class(viewer, owner)
    }

    // ==================== Audience Configuration ====================

    /// The owner's full field-to-level mapping, defaults filled in.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub fn audience_config(&self, owner: &str) -> Result<BTreeMap<ProfileField, AudienceLevel>> {
        Ok(self.audience.get_all(owner)?)
    }

    /// Sets one field's audience level from string keys.
    ///
    /// # Errors
    ///
    /// Returns [`AudienceError::InvalidField`] or
    /// [`AudienceError::InvalidAudienceLevel`] for unrecognized keys,
    /// or an error if the storage write fails.
    pub fn set_audience(&self, owner: &str, field_key: &str, level_key: &str) -> Result<()> {
        let field = ProfileField::parse(field_key)
            .ok_or_else(|| AudienceError::InvalidField(field_key.to_string()))?;
        let level = AudienceLevel::parse(level_key)
            .ok_or_else(|| AudienceError::InvalidAudienceLevel(level_key.to_string()))?;
        Ok(self.audience.set(owner, field, level)?)
    }

    /// Atomically replaces several settings from string keys.
    ///
    /// All-or-nothing: every entry is validated before any is applied,
    /// and the write itself runs in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`AudienceError::InvalidField`] or
    /// [`AudienceError::InvalidAudienceLevel`] if any entry is
    /// unrecognized (none are applied), or an error if the storage
    /// write fails.
    pub fn bulk_set_audience(&self, owner: &str, mapping: &BTreeMap<String, String>) -> Result<()> {
        let mut parsed = BTreeMap::new();
        for (field_key, level_key) in mapping {
            let field = ProfileField::parse(field_key)
                .ok_or_else(|| AudienceError::InvalidField(field_key.clone()))?;
            let level = AudienceLevel::parse(level_key)
                .ok_or_else(|| AudienceError::InvalidAudienceLevel(level_key.clone()))?;
            parsed.insert(field, level);
        }
        Ok(self.audience.bulk_set(owner, &parsed)?)
    }

    // ==================== Resolution ====================

    /// Produces the redacted profile `viewer` is authorized to see.
    ///
    /// Total: never fails, for any viewer and any snapshot.
    #[must_use]
    pub fn resolve_profile(
        &self,
        viewer: Option<&str>,
        owner: &str,
        raw: &RawProfile,
    ) -> RawProfile {
        resolve_profile(&self.graph, &self.audience, viewer, owner, raw)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn core() -> VeilCore {
        VeilCore::in_memory().unwrap()
    }

    #[test]
    fn open_creates_databases() {
        let dir = std::env::temp_dir().join(format!("veil_api_open_{}", std::process::id()));
        let core = VeilCore::open(&dir).unwrap();
        assert!(core.incoming_requests("alice").unwrap().is_empty());
        drop(core);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn request_flow_through_facade() {
        let core = core();
        let id = core.send_friend_request("alice", "bob").unwrap();

        let record = core.get_request(id).unwrap().unwrap();
        assert_eq!(record.sender, "alice");

        core.respond_friend_request(id, "bob", RequestDecision::Accept)
            .unwrap();
        assert_eq!(
            core.relationship_class(Some("alice"), "bob"),
            RelationshipClass::Friend
        );
    }

    #[test]
    fn set_audience_rejects_unknown_field() {
        let core = core();
        let result = core.set_audience("alice", "shoe_size", "friends");
        assert!(matches!(
            result,
            Err(VeilError::Audience(AudienceError::InvalidField(_)))
        ));
    }

    #[test]
    fn set_audience_rejects_unknown_level() {
        let core = core();
        let result = core.set_audience("alice", "hometown", "everyone");
        assert!(matches!(
            result,
            Err(VeilError::Audience(AudienceError::InvalidAudienceLevel(_)))
        ));
    }

    #[test]
    fn bulk_set_is_all_or_nothing() {
        let core = core();
        let mapping: BTreeMap<String, String> = [
            ("hometown".to_string(), "only_me".to_string()),
            ("shoe_size".to_string(), "friends".to_string()),
        ]
        .into_iter()
        .collect();

        assert!(core.bulk_set_audience("alice", &mapping).is_err());

        // The valid entry was not applied.
        let config = core.audience_config("alice").unwrap();
        assert_eq!(config[&ProfileField::Hometown], AudienceLevel::Public);
    }

    #[test]
    fn bulk_set_applies_valid_mapping() {
        let core = core();
        let mapping: BTreeMap<String, String> = [
            ("hometown".to_string(), "only_me".to_string()),
            ("websites".to_string(), "friends".to_string()),
        ]
        .into_iter()
        .collect();

        core.bulk_set_audience("alice", &mapping).unwrap();

        let config = core.audience_config("alice").unwrap();
        assert_eq!(config[&ProfileField::Hometown], AudienceLevel::OnlyMe);
        assert_eq!(config[&ProfileField::Websites], AudienceLevel::Friends);
    }

    #[test]
    fn audience_config_defaults_to_public() {
        let core = core();
        let config = core.audience_config("alice").unwrap();
        assert_eq!(config.len(), ProfileField::ALL.len());
        assert!(config.values().all(|l| *l == AudienceLevel::Public));
    }

    #[test]
    fn resolve_profile_through_facade() {
        let core = core();
        core.set_audience("olivia", "relationship_status", "friends")
            .unwrap();

        let raw = RawProfile::new("Olivia".to_string())
            .with_field("relationship_status", json!("single"));

        let stranger_view = core.resolve_profile(Some("viktor"), "olivia", &raw);
        assert_eq!(stranger_view.field("relationship_status"), None);

        let id = core.send_friend_request("viktor", "olivia").unwrap();
        core.respond_friend_request(id, "olivia", RequestDecision::Accept)
            .unwrap();

        let friend_view = core.resolve_profile(Some("viktor"), "olivia", &raw);
        assert_eq!(
            friend_view.field("relationship_status"),
            Some(&json!("single"))
        );
    }
}
