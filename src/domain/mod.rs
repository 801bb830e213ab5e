//! Domain layer for the taskchat service
//!
//! This module contains core business types, errors and the ports that
//! adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
