//! Profile fields, audience configuration, and visibility resolution.
//!
//! This module owns what a profile contains and who may see which parts
//! of it. Each configurable field carries an owner-chosen
//! [`AudienceLevel`]; the resolver combines those levels with the
//! viewer's relationship class to produce a redacted projection.
//!
//! # Architecture
//!
//! ```text
//! resolve_profile (pure projection)
//!     ├── RelationshipGraph (relationship class, from crate::relationship)
//!     └── AudienceConfig (per-field levels)
//!             └── AudienceStorage (SQLite for settings)
//! ```
//!
//! # Privacy Model
//!
//! - Denied fields are omitted, never nulled, so key presence leaks
//!   nothing beyond the audience level itself.
//! - Unset fields default to public; unknown fields resolve as public
//!   rather than erroring.
//! - A configuration read failure fails closed to baseline fields only.
//!
//! # Types
//!
//! - [`ProfileField`]: the closed set of configurable fields
//! - [`AudienceLevel`]: public / friends / only-me
//! - [`RawProfile`]: immutable snapshot handed to the resolver

mod audience;
mod error;
pub mod fields;
mod resolver;
mod storage;
pub mod types;

pub use audience::AudienceConfig;
pub use error::{AudienceError, Result};
pub use fields::{AudienceLevel, ProfileField, BASELINE_FIELDS};
pub use resolver::resolve_profile;
pub use storage::AudienceStorage;
pub use types::{normalize_timeline_value, RawProfile};
