//! Data types used throughout the server.
//!
//! - [`api`] types are what the HTTP API sends and receives.
//! - [`db`] types are what gets stored in MongoDB.
//! - [`common`] types are shared by both.

pub mod api;
pub mod common;
pub mod db;
pub mod mongodb;
pub mod templates;
