//! Nimbus Core - Shared types library.
//!
//! This crate provides common types used across all Nimbus components:
//! - `server` - HTTP service backing the dashboard (port 3000)
//! - `client` - Headless dashboard client and favorites backends
//! - `cli` - Command-line tools for migrations and the terminal dashboard
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere, including by both ends of the REST surface.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, emails, usernames, coordinates, locations and
//!   weather records, plus the forecast aggregation rule
//! - [`api`] - Request and response bodies shared by the server and client

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod types;

pub use types::*;
