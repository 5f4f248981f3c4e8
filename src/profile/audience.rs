//! Per-field audience configuration.
//!
//! [`AudienceConfig`] stores each owner's visibility preference per
//! configurable field. An unset field defaults to
//! [`AudienceLevel::Public`], so omission never silently
//! over-restricts. Fields and levels are typed enums here; string
//! validation happens once at the facade boundary.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::error::Result;
use super::fields::{AudienceLevel, ProfileField};
use super::storage::AudienceStorage;

/// Owner-scoped visibility preferences for configurable fields.
pub struct AudienceConfig {
    storage: Arc<AudienceStorage>,
}

impl AudienceConfig {
    /// Creates a config over the given settings storage.
    #[must_use]
    pub const fn new(storage: Arc<AudienceStorage>) -> Self {
        Self { storage }
    }

    /// The configured level for one field, or the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub fn get(&self, owner: &str, field: ProfileField) -> Result<AudienceLevel> {
        Ok(self.storage.get(owner, field)?.unwrap_or_default())
    }

    /// The full per-owner mapping, with defaults filled in for every
    /// configurable field.
    ///
    /// One snapshot read; the resolver uses this so a single resolution
    /// never mixes two different configurations.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub fn get_all(&self, owner: &str) -> Result<BTreeMap<ProfileField, AudienceLevel>> {
        let configured: BTreeMap<ProfileField, AudienceLevel> =
            self.storage.get_all(owner)?.into_iter().collect();

        Ok(ProfileField::ALL
            .into_iter()
            .map(|field| {
                let level = configured.get(&field).copied().unwrap_or_default();
                (field, level)
            })
            .collect())
    }

    /// Sets the level for one field, overwriting any prior value.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage write fails.
    pub fn set(&self, owner: &str, field: ProfileField, level: AudienceLevel) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        self.storage.set(owner, field, level, now)
    }

    /// Atomically replaces several settings for one owner.
    ///
    /// All-or-nothing: the write runs in a single transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage write fails.
    pub fn bulk_set(
        &self,
        owner: &str,
        mapping: &BTreeMap<ProfileField, AudienceLevel>,
    ) -> Result<()> {
        let settings: Vec<_> = mapping.iter().map(|(f, l)| (*f, *l)).collect();
        let now = chrono::Utc::now().timestamp();
        self.storage.set_many(owner, &settings, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AudienceConfig {
        AudienceConfig::new(Arc::new(AudienceStorage::in_memory().unwrap()))
    }

    #[test]
    fn unset_field_defaults_to_public() {
        let config = config();
        assert_eq!(
            config.get("alice", ProfileField::Hometown).unwrap(),
            AudienceLevel::Public
        );
    }

    #[test]
    fn set_then_get() {
        let config = config();
        config
            .set("alice", ProfileField::Hometown, AudienceLevel::OnlyMe)
            .unwrap();
        assert_eq!(
            config.get("alice", ProfileField::Hometown).unwrap(),
            AudienceLevel::OnlyMe
        );
    }

    #[test]
    fn get_all_covers_every_field() {
        let config = config();
        config
            .set("alice", ProfileField::Pronouns, AudienceLevel::Friends)
            .unwrap();

        let all = config.get_all("alice").unwrap();
        assert_eq!(all.len(), ProfileField::ALL.len());
        assert_eq!(all[&ProfileField::Pronouns], AudienceLevel::Friends);
        assert_eq!(all[&ProfileField::Hometown], AudienceLevel::Public);
    }

    #[test]
    fn bulk_set_applies_all_entries() {
        let config = config();
        let mapping: BTreeMap<_, _> = [
            (ProfileField::Websites, AudienceLevel::Friends),
            (ProfileField::JoinDate, AudienceLevel::OnlyMe),
        ]
        .into_iter()
        .collect();

        config.bulk_set("alice", &mapping).unwrap();

        assert_eq!(
            config.get("alice", ProfileField::Websites).unwrap(),
            AudienceLevel::Friends
        );
        assert_eq!(
            config.get("alice", ProfileField::JoinDate).unwrap(),
            AudienceLevel::OnlyMe
        );
    }

    #[test]
    fn settings_do_not_leak_across_owners() {
        let config = config();
        config
            .set("alice", ProfileField::Hometown, AudienceLevel::OnlyMe)
            .unwrap();

        assert_eq!(
            config.get("bob", ProfileField::Hometown).unwrap(),
            AudienceLevel::Public
        );
    }
}
