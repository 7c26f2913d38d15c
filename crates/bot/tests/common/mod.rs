#![allow(dead_code)]

use std::time::Duration;

use bot::AppState;
use bot::db::BotDb;
use bot::geocode::Geocoder;
use bot::session::WizardSessions;
use invevent_core::models::{Event, User};
use invevent_core::reply::{InlineButton, Keyboard, Reply};
use invevent_core::wizard::{Flow, Wizard};
use sqlx::SqlitePool;

pub fn state(pool: SqlitePool, flow: Flow) -> AppState {
    AppState {
        db: BotDb::new(pool),
        sessions: WizardSessions::new(Duration::from_secs(60)),
        wizard: Wizard::new(flow),
        geocoder: Geocoder::disabled().unwrap(),
        bot_username: "InvEventBot".to_string(),
        nearby_radius_km: 5.0,
    }
}

pub fn user(id: i64, name: &str) -> User {
    User {
        id,
        first_name: name.to_string(),
        username: None,
    }
}

pub async fn register(state: &AppState, users: &[&User]) {
    for u in users {
        state.db.upsert_user(u).await.unwrap();
    }
}

pub fn urls(reply: &Reply) -> Vec<String> {
    match &reply.keyboard {
        Keyboard::Inline(rows) => rows
            .iter()
            .flatten()
            .filter_map(|b| match b {
                InlineButton::Url { url, .. } => Some(url.clone()),
                InlineButton::Callback { .. } => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

pub fn callbacks(reply: &Reply) -> Vec<String> {
    match &reply.keyboard {
        Keyboard::Inline(rows) => rows
            .iter()
            .flatten()
            .filter_map(|b| match b {
                InlineButton::Callback { data, .. } => Some(data.clone()),
                InlineButton::Url { .. } => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

pub async fn single_event(state: &AppState, owner: &User) -> Event {
    let mut events = state.db.owned_events(owner.id).await.unwrap();
    assert_eq!(events.len(), 1, "expected exactly one event");
    events.remove(0)
}
