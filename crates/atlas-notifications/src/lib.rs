//! # atlas-notifications
//!
//! Transactional email: message model, the `Mailer` trait with a console
//! implementation for development, and the HTML templates for password
//! reset, signup confirmation and contact-form relay.
//!
//! Delivery failures are never fatal to the operation that triggered
//! them; callers log and continue.

pub mod email;
pub mod templates;

pub use email::{ConsoleMailer, EmailAddress, EmailError, EmailMessage, EmailResult, Mailer};
