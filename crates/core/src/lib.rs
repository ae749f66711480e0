//! `gatekeeper-core` — identifiers and the client-input error model shared by
//! every gatekeeper crate.
//!
//! This crate contains no IO and no transport concerns.

pub mod error;
pub mod id;

pub use error::{ValidationError, ValidationResult};
pub use id::{SessionId, UserId};
