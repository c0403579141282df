//! Core types for Sugarcane.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod rating;
pub mod role;
pub mod username;

pub use id::*;
pub use rating::{Rating, RatingError};
pub use role::Role;
pub use username::{Username, UsernameError};
