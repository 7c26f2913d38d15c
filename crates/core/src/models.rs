//! Core domain models for Invevent
//!
//! These models represent the core business entities and map to database tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{InveventError, InveventResult};
use crate::geo::Coordinates;
use crate::types::{EventId, TelegramId};

pub const MAX_TITLE_LEN: usize = 80;
pub const MAX_DESCRIPTION_LEN: usize = 1000;
pub const MAX_ADDRESS_LEN: usize = 120;

/// User entity, created lazily from the Telegram profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[derive(sqlx::FromRow)]
pub struct User {
    pub id: TelegramId,
    pub first_name: String,
    pub username: Option<String>,
}

impl User {
    /// Name used in listings: `@handle` when known, first name otherwise
    pub fn display_name(&self) -> String {
        match &self.username {
            Some(handle) => format!("@{handle}"),
            None => self.first_name.clone(),
        }
    }
}

/// Who may discover an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(sqlx::Type)]
pub enum EventVisibility {
    /// Listed for everyone
    Public,
    /// Friends only: the owner and the owner's followers
    Private,
}

impl EventVisibility {
    pub fn label(self) -> &'static str {
        match self {
            EventVisibility::Public => "Public",
            EventVisibility::Private => "Friends only",
        }
    }
}

/// Event lifecycle state
///
/// Moves forward only: `Active -> Past` by time, `Active -> Deleted` by the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(sqlx::Type)]
pub enum EventState {
    Active,
    Past,
    Deleted,
}

impl EventState {
    pub fn can_transition_to(self, next: EventState) -> bool {
        matches!(
            (self, next),
            (EventState::Active, EventState::Past) | (EventState::Active, EventState::Deleted)
        )
    }
}

/// Event entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[derive(sqlx::FromRow)]
pub struct Event {
    pub id: EventId,
    pub owner_id: TelegramId,
    pub title: String,
    pub description: String,
    pub occurs_at: DateTime<Utc>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub visibility: EventVisibility,
    pub tags: String, // catalogue topic
    pub state: EventState,
    pub photo_file_id: Option<String>, // Telegram file id of the largest photo size
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates::new(latitude, longitude)),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == EventState::Active
    }
}

/// A user from the follow graph together with their upcoming event count
#[derive(Debug, Clone, Serialize, Deserialize)]
#[derive(sqlx::FromRow)]
pub struct Connection {
    pub id: TelegramId,
    pub first_name: String,
    pub username: Option<String>,
    pub active_events: i64,
}

impl Connection {
    pub fn user(&self) -> User {
        User {
            id: self.id,
            first_name: self.first_name.clone(),
            username: self.username.clone(),
        }
    }
}

/// Fields of an event that is about to be created
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub owner_id: TelegramId,
    pub title: String,
    pub description: String,
    pub occurs_at: DateTime<Utc>,
    pub coordinates: Option<Coordinates>,
    pub address: Option<String>,
    pub visibility: EventVisibility,
    pub tags: String,
    pub photo_file_id: Option<String>,
}

impl NewEvent {
    /// Check the invariants the events table enforces
    pub fn validate(&self) -> InveventResult<()> {
        let title_len = self.title.chars().count();
        if self.title.trim().is_empty() || title_len > MAX_TITLE_LEN {
            return Err(InveventError::InvalidEventData(format!(
                "title must be 1..={MAX_TITLE_LEN} characters"
            )));
        }
        if self.description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(InveventError::InvalidEventData(format!(
                "description exceeds {MAX_DESCRIPTION_LEN} characters"
            )));
        }
        if let Some(address) = &self.address
            && address.chars().count() > MAX_ADDRESS_LEN
        {
            return Err(InveventError::InvalidEventData(format!(
                "address exceeds {MAX_ADDRESS_LEN} characters"
            )));
        }
        if self.coordinates.is_none() && self.address.is_none() {
            return Err(InveventError::InvalidEventData(
                "either coordinates or an address is required".to_string(),
            ));
        }
        Ok(())
    }
}
