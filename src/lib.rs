//! Veil Core Library
//!
//! Core functionality for Veil - privacy-aware social profile
//! visibility. For any (viewer, owner) pair this crate computes the
//! redacted view of the owner's profile containing only the fields the
//! owner has authorized that viewer's relationship class to see.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![deny(unsafe_code)]

mod api;
pub mod profile;
pub mod relationship;

pub use api::{Result, VeilCore, VeilError};
