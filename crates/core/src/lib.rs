//! Invevent Core - Domain logic and models
//!
//! This crate contains pure domain logic with no I/O operations.
//! Entity models, the event-creation wizard state machine, visibility rules
//! and deep-link encoding are defined here.

pub mod catalog;
pub mod config;
pub mod error;
pub mod geo;
pub mod links;
pub mod models;
pub mod reply;
pub mod timezone;
pub mod types;
pub mod visibility;
pub mod wizard;

pub use error::{ConfigError, InveventError, InveventResult};
pub use types::{EventId, TelegramId};
