//! API-compatible types.
//!
//! The types in this module are serialised in an API-friendly way, e.g.:
//!
//! - IDs are serialised as hex strings.
//! - Datetimes are serialised as RFC 3339 strings.

pub mod admin;
pub mod analytics;
pub mod auth;
pub mod form;
pub mod pagination;
pub mod submission;
pub mod transfer;
