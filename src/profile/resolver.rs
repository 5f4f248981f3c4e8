//! Visibility resolution: projecting a profile for a viewer.
//!
//! [`resolve_profile`] merges the relationship ledger, the owner's
//! audience configuration, and a raw profile snapshot into the redacted
//! view a given viewer is authorized to see. It is a pure read path:
//! total, side-effect free, and deterministic for a fixed snapshot.
//!
//! # Snapshot consistency
//!
//! The relationship class and the audience mapping are each fetched
//! exactly once per call and held fixed for every field, so a single
//! resolution never mixes two relationship states or two
//! configurations across fields, even under concurrent mutation.
//!
//! # Redaction, not masking
//!
//! Fields that fail the audience check are omitted from the output
//! entirely, never replaced with null or a placeholder, so presence or
//! absence of a key does not leak whether privileged data exists beyond
//! what the audience level already discloses.

use super::audience::AudienceConfig;
use super::fields::{AudienceLevel, ProfileField};
use super::types::RawProfile;
use crate::relationship::{RelationshipClass, RelationshipGraph};

/// Produces the redacted profile `viewer` is authorized to see.
///
/// Never fails. The owner always sees the snapshot unchanged. Unknown
/// field keys in the snapshot default to the most permissive level
/// rather than erroring, so one malformed field cannot block a profile
/// view. If the audience configuration cannot be read the projection
/// fails closed to baseline fields only; defaulting to public on error
/// would leak.
#[must_use]
pub fn resolve_profile(
    graph: &RelationshipGraph,
    audience: &AudienceConfig,
    viewer: Option<&str>,
    owner: &str,
    raw: &RawProfile,
) -> RawProfile {
    if viewer == Some(owner) {
        return raw.clone();
    }

    // One class, one configuration, for every field in this call.
    let class = graph.relationship_class(viewer, owner);
    debug_assert_ne!(class, RelationshipClass::SelfView);

    let mut projection = RawProfile::new(raw.display_name.clone());
    projection.avatar_url = raw.avatar_url.clone();

    let Ok(settings) = audience.get_all(owner) else {
        return projection;
    };

    for (key, value) in raw.fields() {
        let level = ProfileField::parse(key)
            .and_then(|field| settings.get(&field).copied())
            .unwrap_or(AudienceLevel::Public);

        if level.allows(class) {
            projection.set_field(key.clone(), value.clone());
        }
    }

    projection
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::profile::storage::AudienceStorage;
    use crate::relationship::{LedgerStorage, RequestDecision};

    fn fixtures() -> (RelationshipGraph, AudienceConfig) {
        let graph = RelationshipGraph::new(Arc::new(LedgerStorage::in_memory().unwrap()));
        let audience = AudienceConfig::new(Arc::new(AudienceStorage::in_memory().unwrap()));
        (graph, audience)
    }

    fn befriend(graph: &RelationshipGraph, a: &str, b: &str) {
        let id = graph.send_request(a, b).unwrap();
        graph.respond(id, b, RequestDecision::Accept).unwrap();
    }

    fn sample_profile() -> RawProfile {
        RawProfile::new("Olivia".to_string())
            .with_avatar("https://veil.example/olivia.png")
            .with_field("pronouns", json!("she/her"))
            .with_field("relationship_status", json!("single"))
            .with_field("hometown", json!("Springfield"))
    }

    #[test]
    fn owner_sees_snapshot_unchanged() {
        let (graph, audience) = fixtures();
        audience
            .set("olivia", ProfileField::Hometown, AudienceLevel::OnlyMe)
            .unwrap();

        let raw = sample_profile();
        let view = resolve_profile(&graph, &audience, Some("olivia"), "olivia", &raw);
        assert_eq!(view, raw);
    }

    #[test]
    fn unconfigured_fields_visible_to_everyone() {
        let (graph, audience) = fixtures();
        let raw = sample_profile();

        let view = resolve_profile(&graph, &audience, Some("stranger"), "olivia", &raw);
        assert_eq!(view, raw);
    }

    #[test]
    fn friends_field_hidden_from_strangers_and_anonymous() {
        let (graph, audience) = fixtures();
        audience
            .set(
                "olivia",
                ProfileField::RelationshipStatus,
                AudienceLevel::Friends,
            )
            .unwrap();
        let raw = sample_profile();

        for viewer in [Some("stranger"), None] {
            let view = resolve_profile(&graph, &audience, viewer, "olivia", &raw);
            assert_eq!(view.field("relationship_status"), None);
            assert_eq!(view.field("pronouns"), Some(&json!("she/her")));
            assert_eq!(view.display_name, "Olivia");
        }
    }

    #[test]
    fn friends_field_visible_across_friendship_arc() {
        let (graph, audience) = fixtures();
        audience
            .set(
                "olivia",
                ProfileField::RelationshipStatus,
                AudienceLevel::Friends,
            )
            .unwrap();
        let raw = RawProfile::new("Olivia".to_string())
            .with_field("relationship_status", json!("single"));

        // Unrelated: omitted.
        let view = resolve_profile(&graph, &audience, Some("viktor"), "olivia", &raw);
        assert_eq!(view.field("relationship_status"), None);

        // Friends: included.
        befriend(&graph, "viktor", "olivia");
        let view = resolve_profile(&graph, &audience, Some("viktor"), "olivia", &raw);
        assert_eq!(view.field("relationship_status"), Some(&json!("single")));

        // Unfriended: omitted again.
        graph.unfriend("viktor", "olivia").unwrap();
        let view = resolve_profile(&graph, &audience, Some("viktor"), "olivia", &raw);
        assert_eq!(view.field("relationship_status"), None);
    }

    #[test]
    fn only_me_field_hidden_even_from_friends() {
        let (graph, audience) = fixtures();
        audience
            .set("olivia", ProfileField::Hometown, AudienceLevel::OnlyMe)
            .unwrap();
        befriend(&graph, "viktor", "olivia");
        let raw = sample_profile();

        let view = resolve_profile(&graph, &audience, Some("viktor"), "olivia", &raw);
        assert_eq!(view.field("hometown"), None);
    }

    #[test]
    fn denied_fields_are_absent_not_null() {
        let (graph, audience) = fixtures();
        audience
            .set("olivia", ProfileField::Hometown, AudienceLevel::OnlyMe)
            .unwrap();
        let raw = sample_profile();

        let view = resolve_profile(&graph, &audience, None, "olivia", &raw);
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("hometown").is_none());
    }

    #[test]
    fn baseline_fields_always_present() {
        let (graph, audience) = fixtures();
        for field in ProfileField::ALL {
            audience.set("olivia", field, AudienceLevel::OnlyMe).unwrap();
        }
        let raw = sample_profile();

        let view = resolve_profile(&graph, &audience, None, "olivia", &raw);
        assert_eq!(view.display_name, "Olivia");
        assert_eq!(
            view.avatar_url,
            Some("https://veil.example/olivia.png".to_string())
        );
        assert!(view.fields().is_empty());
    }

    #[test]
    fn unknown_fields_default_to_public() {
        let (graph, audience) = fixtures();
        let raw = RawProfile::new("Olivia".to_string())
            .with_field("favorite_color", json!("teal"))
            .with_field("", json!(null));

        let view = resolve_profile(&graph, &audience, Some("stranger"), "olivia", &raw);
        assert_eq!(view.field("favorite_color"), Some(&json!("teal")));
        assert_eq!(view.field(""), Some(&json!(null)));
    }

    #[test]
    fn pending_request_grants_no_access() {
        let (graph, audience) = fixtures();
        audience
            .set("olivia", ProfileField::Hometown, AudienceLevel::Friends)
            .unwrap();
        graph.send_request("viktor", "olivia").unwrap();
        let raw = sample_profile();

        let view = resolve_profile(&graph, &audience, Some("viktor"), "olivia", &raw);
        assert_eq!(view.field("hometown"), None);
    }

    #[test]
    fn config_is_per_owner_not_per_viewer() {
        let (graph, audience) = fixtures();
        // Viktor hides his own hometown; that must not affect what he
        // sees of Olivia's.
        audience
            .set("viktor", ProfileField::Hometown, AudienceLevel::OnlyMe)
            .unwrap();
        let raw = sample_profile();

        let view = resolve_profile(&graph, &audience, Some("viktor"), "olivia", &raw);
        assert_eq!(view.field("hometown"), Some(&json!("Springfield")));
    }
}
