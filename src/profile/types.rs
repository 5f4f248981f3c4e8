//! Raw profile snapshots and timeline-entry normalization.
//!
//! A [`RawProfile`] is an immutable snapshot of an owner's profile data
//! at resolution time: the always-public baseline fields plus a
//! string-keyed map of configurable field values. The map is
//! string-keyed (not enum-keyed) on purpose, so unknown fields supplied
//! by the profile store flow through resolution without erroring.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::fields::ProfileField;

/// Snapshot of an owner's profile data.
///
/// Construct with [`RawProfile::new`] and add field values with
/// [`RawProfile::with_field`] / [`RawProfile::set_field`] — the single
/// write path, where timeline normalization is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawProfile {
    /// Owner's display name (always public).
    pub display_name: String,
    /// Owner's avatar URL (always public).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Configurable field values, keyed by field key.
    #[serde(flatten)]
    fields: BTreeMap<String, Value>,
}

impl RawProfile {
    /// Creates a profile snapshot with only baseline data.
    #[must_use]
    pub const fn new(display_name: String) -> Self {
        Self {
            display_name,
            avatar_url: None,
            fields: BTreeMap::new(),
        }
    }

    /// Sets the avatar URL.
    #[must_use]
    pub fn with_avatar(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }

    /// Adds a field value, builder-style.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.set_field(key, value);
        self
    }

    /// Writes a field value.
    ///
    /// This is the single write path for configurable fields; timeline
    /// values (work history, education) are normalized here so the
    /// ongoing-entry invariant holds everywhere downstream.
    pub fn set_field(&mut self, key: impl Into<String>, mut value: Value) {
        let key = key.into();
        if ProfileField::parse(&key).is_some_and(|field| field.is_timeline()) {
            normalize_timeline_value(&mut value);
        }
        self.fields.insert(key, value);
    }

    /// Reads a field value by key.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// All configurable field values, keyed by field key.
    #[must_use]
    pub const fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }
}

/// Normalizes timeline entries so ongoing entries carry no end date.
///
/// Invariant: `is_ongoing` implies no end-date fields. Applied uniformly
/// at the single profile write path rather than ad hoc at call sites.
/// Accepts either a single entry object or an array of them; other
/// shapes pass through untouched.
pub fn normalize_timeline_value(value: &mut Value) {
    match value {
        Value::Array(entries) => {
            for entry in entries {
                normalize_timeline_value(entry);
            }
        }
        Value::Object(entry) => {
            if entry.get("is_ongoing").and_then(Value::as_bool) == Some(true) {
                entry.remove("end_date");
                entry.remove("end_month");
                entry.remove("end_year");
            }
        }
        _ => {}
    }
}
