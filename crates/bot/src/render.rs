//! Message texts and keyboards
//!
//! Everything here returns `Reply` values; nothing talks to Telegram.

use invevent_core::links::{CallbackData, DeepLink, EventAction, UserAction};
use invevent_core::models::{Connection, Event, User};
use invevent_core::reply::{Button, InlineButton, Keyboard, Reply};
use invevent_core::timezone::format_utc;
use invevent_core::TelegramId;
use teloxide::utils::html::escape;

pub const CREATE_EVENT: &str = "➕ Create event";
pub const MY_EVENTS: &str = "📅 My events";
pub const FRIENDS_EVENTS: &str = "👥 Friends' events";
pub const PUBLIC_EVENTS: &str = "🌍 Public events";
pub const NEARBY_EVENTS: &str = "📍 Events nearby";
pub const FRIENDS: &str = "🤝 Friends";
pub const FOLLOWERS: &str = "👣 Followers";
pub const FOLLOWING: &str = "➡️ Following";
pub const MENU_BACK: &str = "⬅️ Back";

/// Listings show at most this many events
const LIST_LIMIT: usize = 20;

pub fn main_menu_keyboard() -> Keyboard {
    Keyboard::Reply(vec![
        vec![Button::text(CREATE_EVENT)],
        vec![Button::text(MY_EVENTS), Button::text(FRIENDS_EVENTS)],
        vec![
            Button::text(PUBLIC_EVENTS),
            Button::RequestLocation(NEARBY_EVENTS.to_string()),
        ],
        vec![Button::text(FRIENDS)],
    ])
}

pub fn main_menu(text: impl Into<String>) -> Reply {
    Reply::text(text).with_keyboard(main_menu_keyboard())
}

pub fn friends_menu() -> Reply {
    Reply::text("Who do you want to see?").with_keyboard(Keyboard::Reply(vec![
        vec![Button::text(FOLLOWERS), Button::text(FOLLOWING)],
        vec![Button::text(MENU_BACK)],
    ]))
}

pub fn welcome(user: &User) -> Reply {
    main_menu(format!(
        "👋 Hi, {}! Create events, join your friends' plans and discover what's happening nearby.",
        user.first_name
    ))
}

pub fn help() -> Reply {
    main_menu(
        "Invevent commands:\n\
         /start - Show the main menu\n\
         /create - Create a new event\n\
         /cancel - Abort event creation\n\
         /help - Show this message\n\n\
         Share your location to find events nearby.",
    )
}

fn location_html(event: &Event) -> String {
    let link = event
        .coordinates()
        .map(|point| format!("<a href=\"{}\">Open map</a>", escape(&point.map_url())));
    match (&event.address, link) {
        (Some(address), Some(link)) => format!("{} ({link})", escape(address)),
        (Some(address), None) => escape(address),
        (None, Some(link)) => link,
        (None, None) => "not set".to_string(),
    }
}

/// Title, time, location and visibility
pub fn event_summary(event: &Event) -> String {
    format!(
        "<b>{}</b>\n🗓 {}\n📍 {}\n👁 {}",
        escape(&event.title),
        format_utc(&event.occurs_at),
        location_html(event),
        event.visibility.label(),
    )
}

pub fn event_details(event: &Event, owner: Option<&User>, participants: i64) -> String {
    let mut text = event_summary(event);
    if !event.tags.is_empty() {
        text.push_str(&format!("\n🏷 {}", escape(&event.tags)));
    }
    if let Some(owner) = owner {
        text.push_str(&format!("\n👤 {}", escape(&owner.display_name())));
    }
    text.push_str(&format!("\n🙋 Participants: {participants}"));
    if !event.description.is_empty() {
        text.push_str(&format!("\n\n{}", escape(&event.description)));
    }
    text
}

fn event_button(label: &str, event: &Event, action: EventAction) -> InlineButton {
    InlineButton::Callback {
        label: label.to_string(),
        data: CallbackData::Event(event.id, action).encode(),
    }
}

/// Join or unjoin, plus delete for the owner
pub fn event_actions(event: &Event, viewer: TelegramId, joined: bool) -> Keyboard {
    let mut row = vec![if joined {
        event_button("🚪 Unjoin", event, EventAction::Unjoin)
    } else {
        event_button("✅ Join", event, EventAction::Join)
    }];
    if event.owner_id == viewer {
        row.push(event_button("🗑 Delete", event, EventAction::Delete));
    }
    Keyboard::Inline(vec![row])
}

/// Confirmation after the wizard commits, with both deep links
pub fn creation_confirmation(event: &Event, bot_username: &str) -> Reply {
    let keyboard = Keyboard::Inline(vec![vec![
        InlineButton::Url {
            label: "ℹ️ Description".to_string(),
            url: DeepLink::Describe(event.id).url(bot_username),
        },
        InlineButton::Url {
            label: "✅ Join".to_string(),
            url: DeepLink::Join(event.id).url(bot_username),
        },
    ]]);
    Reply::html(format!("✅ Event created!\n\n{}", event_summary(event)))
        .with_photo(event.photo_file_id.clone())
        .with_keyboard(keyboard)
}

/// Event listing with one details button per event
pub fn event_list(title: &str, events: &[Event]) -> Reply {
    if events.is_empty() {
        return Reply::text(format!("{title}\n\nNo events yet."));
    }

    let mut text = format!("<b>{}</b>\n", escape(title));
    let mut rows = Vec::new();
    for (i, event) in events.iter().take(LIST_LIMIT).enumerate() {
        text.push_str(&format!(
            "\n{}. {} · {}",
            i + 1,
            escape(&event.title),
            format_utc(&event.occurs_at)
        ));
        rows.push(vec![event_button(
            &format!("{}. {}", i + 1, event.title),
            event,
            EventAction::Details,
        )]);
    }
    if events.len() > LIST_LIMIT {
        text.push_str(&format!("\n\n…and {} more", events.len() - LIST_LIMIT));
    }
    Reply::html(text).with_keyboard(Keyboard::Inline(rows))
}

/// Nearby listing with distances
pub fn nearby_list(hits: &[(Event, f64)], radius_km: f64) -> Reply {
    if hits.is_empty() {
        return main_menu(format!("No events within {radius_km} km."));
    }

    let mut text = format!("<b>Events within {radius_km} km</b>\n");
    let mut rows = Vec::new();
    for (i, (event, distance)) in hits.iter().take(LIST_LIMIT).enumerate() {
        text.push_str(&format!(
            "\n{}. {} · {} · {:.1} km",
            i + 1,
            escape(&event.title),
            format_utc(&event.occurs_at),
            distance
        ));
        rows.push(vec![event_button(
            &format!("{}. {}", i + 1, event.title),
            event,
            EventAction::Details,
        )]);
    }
    Reply::html(text).with_keyboard(Keyboard::Inline(rows))
}

/// Followers (`following == false`) or followed users with their actions
pub fn connection_list(title: &str, connections: &[Connection], following: bool) -> Reply {
    if connections.is_empty() {
        return Reply::text(format!("{title}\n\nNobody here yet. Join events to make friends!"));
    }

    let mut text = format!("<b>{}</b>\n", escape(title));
    let mut rows = Vec::new();
    for connection in connections.iter().take(LIST_LIMIT) {
        let name = connection.user().display_name();
        text.push_str(&format!(
            "\n• {} · {} active event(s)",
            escape(&name),
            connection.active_events
        ));
        let mut row = vec![InlineButton::Callback {
            label: format!("📅 {name}"),
            data: CallbackData::User(connection.id, UserAction::Events).encode(),
        }];
        if following {
            row.push(InlineButton::Callback {
                label: "🚫 Unfollow".to_string(),
                data: CallbackData::User(connection.id, UserAction::Unfollow).encode(),
            });
        }
        row.push(InlineButton::Callback {
            label: "❌ Unfriend".to_string(),
            data: CallbackData::User(connection.id, UserAction::Unfriend).encode(),
        });
        rows.push(row);
    }
    if connections.len() > LIST_LIMIT {
        text.push_str(&format!("\n\n…and {} more", connections.len() - LIST_LIMIT));
    }
    Reply::html(text).with_keyboard(Keyboard::Inline(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use invevent_core::models::{EventState, EventVisibility};
    use invevent_core::EventId;

    fn event() -> Event {
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 20, 0, 0).unwrap();
        Event {
            id: EventId::new(),
            owner_id: 1,
            title: "Rock & Roll".to_string(),
            description: String::new(),
            occurs_at: at,
            latitude: Some(55.75),
            longitude: Some(37.61),
            address: None,
            visibility: EventVisibility::Public,
            tags: "Concert".to_string(),
            state: EventState::Active,
            photo_file_id: None,
            created_at: at,
        }
    }

    #[test]
    fn test_summary_escapes_and_links_map() {
        let text = event_summary(&event());
        assert!(text.contains("<b>Rock &amp; Roll</b>"));
        assert!(text.contains("2025-06-01 20:00 UTC"));
        assert!(text.contains("google.com/maps"));
        assert!(text.contains("Public"));
    }

    #[test]
    fn test_confirmation_carries_both_deep_links() {
        let event = event();
        let reply = creation_confirmation(&event, "InvEventBot");
        let Keyboard::Inline(rows) = &reply.keyboard else {
            panic!("expected inline keyboard");
        };
        let urls: Vec<&str> = rows
            .iter()
            .flatten()
            .filter_map(|b| match b {
                InlineButton::Url { url, .. } => Some(url.as_str()),
                InlineButton::Callback { .. } => None,
            })
            .collect();
        assert_eq!(
            urls,
            vec![
                format!("https://t.me/InvEventBot?start=desc_{}", event.id),
                format!("https://t.me/InvEventBot?start=join_{}", event.id),
            ]
        );
        assert!(reply.photo.is_none());

        let mut with_photo = event;
        with_photo.photo_file_id = Some("file-1".to_string());
        assert_eq!(
            creation_confirmation(&with_photo, "InvEventBot").photo.as_deref(),
            Some("file-1")
        );
    }

    #[test]
    fn test_event_actions_for_owner_and_guest() {
        let event = event();
        assert_eq!(
            event_actions(&event, 1, false),
            Keyboard::Inline(vec![vec![
                event_button("✅ Join", &event, EventAction::Join),
                event_button("🗑 Delete", &event, EventAction::Delete),
            ]])
        );
        let guest = Reply::text("").with_keyboard(event_actions(&event, 2, true));
        assert_eq!(guest.button_labels(), vec!["🚪 Unjoin"]);
    }

    #[test]
    fn test_empty_lists() {
        assert!(event_list(MY_EVENTS, &[]).text.contains("No events yet."));
        assert!(connection_list(FOLLOWERS, &[], false).keyboard == Keyboard::None);
    }

    #[test]
    fn test_long_connection_list_is_capped() {
        let connections: Vec<Connection> = (1..=LIST_LIMIT as i64 + 5)
            .map(|id| Connection {
                id,
                first_name: format!("Friend {id}"),
                username: None,
                active_events: 0,
            })
            .collect();

        let reply = connection_list(FOLLOWING, &connections, true);
        let Keyboard::Inline(rows) = &reply.keyboard else {
            panic!("expected inline keyboard");
        };
        assert_eq!(rows.len(), LIST_LIMIT);
        assert!(reply.text.contains(&format!("Friend {LIST_LIMIT} ")));
        assert!(!reply.text.contains(&format!("Friend {} ", LIST_LIMIT + 1)));
        assert!(reply.text.ends_with("…and 5 more"));
    }
}
