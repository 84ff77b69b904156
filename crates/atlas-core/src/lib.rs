//! # atlas-core
//!
//! Core types, traits, and utilities shared across the Atlas workspace:
//! - Primary key alias and caller identity
//! - Content kind enums
//! - Validation error collection
//! - Application configuration

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use error::*;
pub use traits::*;
pub use types::*;
