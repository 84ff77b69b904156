//! API request handlers

pub mod auth;
pub mod backgrounds;
pub mod billing;
pub mod contact;
pub mod content;
pub mod uploads;
