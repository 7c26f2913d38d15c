//! Visibility and discovery rules
//!
//! The follow graph is directed. A viewer may see a private event when the
//! viewer follows its owner (`follower = viewer`, `followee = owner`).

use std::collections::HashSet;

use crate::geo::Coordinates;
use crate::models::{Event, EventVisibility};
use crate::types::TelegramId;

/// Whether `viewer` may see `event`
///
/// `follows_owner` is the result of the viewer -> owner edge lookup.
pub fn can_view(event: &Event, viewer: TelegramId, follows_owner: bool) -> bool {
    if event.owner_id == viewer {
        return true;
    }
    match event.visibility {
        EventVisibility::Public => true,
        EventVisibility::Private => follows_owner,
    }
}

/// Union of owned and joined events, de-duplicated by id, soonest first
pub fn merge_my_events(owned: Vec<Event>, joined: Vec<Event>) -> Vec<Event> {
    let mut seen = HashSet::new();
    let mut events: Vec<Event> = owned
        .into_iter()
        .chain(joined)
        .filter(|e| seen.insert(e.id))
        .collect();
    sort_by_time(&mut events);
    events
}

pub fn sort_by_time(events: &mut [Event]) {
    events.sort_by_key(|e| e.occurs_at);
}

/// Events with coordinates within `radius_km` of `origin`, nearest first
pub fn nearby(events: Vec<Event>, origin: Coordinates, radius_km: f64) -> Vec<(Event, f64)> {
    let mut hits: Vec<(Event, f64)> = events
        .into_iter()
        .filter_map(|e| {
            let distance = e.coordinates()?.distance_km(&origin);
            (distance <= radius_km).then_some((e, distance))
        })
        .collect();
    hits.sort_by(|a, b| a.1.total_cmp(&b.1));
    hits
}
