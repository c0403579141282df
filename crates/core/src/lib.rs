//! Sugarcane Core - Shared types library.
//!
//! This crate provides common types used across all Sugarcane services:
//! - `identity` - Account management and wallet operations
//! - `catalog` - Product inventory management
//! - `commerce` - Sales and purchase processing
//! - `engagement` - Product reviews
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, usernames, roles, and ratings

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
