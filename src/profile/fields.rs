//! Closed field set and audience levels for profile visibility.
//!
//! The configurable profile fields form a closed enumeration rather
//! than an open string-keyed set, so adding or removing a supported
//! field is a compile-time-checked change. String codecs exist only at
//! the storage and transport boundaries.

use serde::{Deserialize, Serialize};

use crate::relationship::RelationshipClass;

/// Baseline profile fields that are always public.
///
/// These are never subject to audience configuration and are included
/// in every projection regardless of relationship class.
pub const BASELINE_FIELDS: &[&str] = &["display_name", "avatar_url"];

/// Owner-chosen minimum relationship class required to view a field.
///
/// Totally ordered by permissiveness: `Public` ≥ `Friends` ≥ `OnlyMe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AudienceLevel {
    /// Visible to everyone, including anonymous viewers.
    ///
    /// The default, chosen so an omitted setting never silently
    /// over-restricts.
    #[default]
    Public,
    /// Visible to the owner and accepted friends.
    Friends,
    /// Visible to the owner only.
    OnlyMe,
}

impl AudienceLevel {
    /// Converts to string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Friends => "friends",
            Self::OnlyMe => "only_me",
        }
    }

    /// Parses from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "public" => Some(Self::Public),
            "friends" => Some(Self::Friends),
            "only_me" => Some(Self::OnlyMe),
            _ => None,
        }
    }

    /// Returns whether a viewer of the given relationship class may see
    /// a field configured at this level.
    #[must_use]
    pub const fn allows(&self, class: RelationshipClass) -> bool {
        match self {
            Self::Public => true,
            Self::Friends => matches!(
                class,
                RelationshipClass::SelfView | RelationshipClass::Friend
            ),
            Self::OnlyMe => matches!(class, RelationshipClass::SelfView),
        }
    }
}

/// A configurable profile field.
///
/// This is the closed set of fields an owner may restrict. Fields not
/// in this set (and not baseline) are unrecognized; the resolver treats
/// them as public rather than erroring, and configuration rejects them
/// with `InvalidField`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    /// Preferred pronouns.
    Pronouns,
    /// Employment history entries.
    WorkHistory,
    /// Education history entries.
    Education,
    /// City the owner currently lives in.
    CurrentCity,
    /// City the owner is from.
    Hometown,
    /// Relationship status (single, married, ...).
    RelationshipStatus,
    /// Phonetic guide for the owner's name.
    NamePronunciation,
    /// When the owner joined.
    JoinDate,
    /// Personal websites.
    Websites,
    /// Links to other social accounts.
    SocialLinks,
}

impl ProfileField {
    /// Every configurable field, for exhaustive iteration.
    pub const ALL: [Self; 10] = [
        Self::Pronouns,
        Self::WorkHistory,
        Self::Education,
        Self::CurrentCity,
        Self::Hometown,
        Self::RelationshipStatus,
        Self::NamePronunciation,
        Self::JoinDate,
        Self::Websites,
        Self::SocialLinks,
    ];

    /// The field's key in raw profiles and storage.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Pronouns => "pronouns",
            Self::WorkHistory => "work_history",
            Self::Education => "education",
            Self::CurrentCity => "current_city",
            Self::Hometown => "hometown",
            Self::RelationshipStatus => "relationship_status",
            Self::NamePronunciation => "name_pronunciation",
            Self::JoinDate => "join_date",
            Self::Websites => "websites",
            Self::SocialLinks => "social_links",
        }
    }

    /// Parses a field from its key.
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }

    /// Returns whether this field holds dated timeline entries subject
    /// to ongoing-entry normalization.
    #[must_use]
    pub const fn is_timeline(&self) -> bool {
        matches!(self, Self::WorkHistory | Self::Education)
    }
}
