//! One acceptor and one prompt per wizard step
//!
//! Acceptors are pure: they look at the draft and the inbound input and either
//! return the updated draft or explain why the input was not taken. Prompts
//! render from the draft alone, so the same function serves forward entry and
//! re-entry through "back".

use chrono::{DateTime, Utc};

use super::{Draft, Input, Step, token};
use crate::catalog::{self, OTHER_TOPIC};
use crate::models::{EventVisibility, MAX_ADDRESS_LEN, MAX_DESCRIPTION_LEN, MAX_TITLE_LEN};
use crate::reply::{Button, Keyboard, Reply, grid};
use crate::timezone::{self, format_utc};

pub const BACK: &str = "back";
pub const CANCEL: &str = "cancel";
pub const SKIP: &str = "skip";
pub const TODAY: &str = "today";
pub const TOMORROW: &str = "tomorrow";
pub const PUBLIC: &str = "Public";
pub const PRIVATE: &str = "Private";
pub const SEND_LOCATION: &str = "📍 Send my current location";
pub const PICK_ON_MAP: &str = "📌 Pick a location on map (use 📎 → Location)";

/// Result of feeding one input to a step
#[derive(Debug)]
pub(crate) enum Outcome {
    /// Input accepted, the draft carries the new value
    Accept(Draft),
    /// Input understood but nothing to store; show this instead of the prompt
    Hint(Reply),
    /// Input not valid for this step
    Reject(&'static str),
}

pub(crate) fn accept(step: Step, draft: &Draft, input: &Input, now: DateTime<Utc>) -> Outcome {
    match step {
        Step::Topic => accept_topic(draft, input),
        Step::EventType => accept_event_type(draft, input),
        Step::DateTime => accept_datetime(draft, input, now),
        Step::Location => accept_location(draft, input),
        Step::Visibility => accept_visibility(draft, input),
        Step::Picture => accept_picture(draft, input),
        Step::Description => accept_description(draft, input),
    }
}

fn accept_topic(draft: &Draft, input: &Input) -> Outcome {
    let Some(topic) = input.text().and_then(catalog::topic) else {
        return Outcome::Reject("Please choose one of the topics.");
    };
    let mut next = draft.clone();
    if next.topic.as_deref() != Some(topic.name) {
        // A title picked under another topic no longer applies
        next.title = None;
    }
    next.topic = Some(topic.name.to_string());
    Outcome::Accept(next)
}

fn accept_event_type(draft: &Draft, input: &Input) -> Outcome {
    let Some(text) = input.text() else {
        return Outcome::Reject("Please choose one of the options.");
    };
    let topic = draft.topic.as_deref().and_then(catalog::topic);
    let title = match topic {
        Some(t) if t.is_free_text() => {
            let title = text.trim();
            if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
                return Outcome::Reject("The title must be 1 to 80 characters long.");
            }
            title
        }
        Some(t) if t.offers(text) => text,
        _ => return Outcome::Reject("Please choose one of the options."),
    };
    let mut next = draft.clone();
    next.title = Some(title.to_string());
    Outcome::Accept(next)
}

fn accept_datetime(draft: &Draft, input: &Input, now: DateTime<Utc>) -> Outcome {
    let Some(text) = input.text() else {
        return Outcome::Reject("Please tap “today” or “tomorrow”, or type YYYY-MM-DD HH:MM.");
    };
    let occurs_at = match token(text).as_str() {
        TODAY => Some(now),
        TOMORROW => Some(timezone::next_midnight(now)),
        _ => timezone::parse_wizard_datetime(text),
    };
    match occurs_at {
        Some(at) => {
            let mut next = draft.clone();
            next.occurs_at = Some(at);
            Outcome::Accept(next)
        }
        None => Outcome::Reject("Please tap “today” or “tomorrow”, or type YYYY-MM-DD HH:MM."),
    }
}

fn accept_location(draft: &Draft, input: &Input) -> Outcome {
    match input {
        Input::Location(point) => {
            let mut next = draft.clone();
            next.coordinates = Some(*point);
            next.address = None;
            Outcome::Accept(next)
        }
        Input::Text(text) if text.trim() == PICK_ON_MAP => Outcome::Hint(
            Reply::text("Tap 📎 (paperclip) → Location and drop a pin anywhere on the map.")
                .with_keyboard(location_keyboard()),
        ),
        Input::Text(text) => {
            let address = text.trim();
            if address.is_empty() || address.chars().count() > MAX_ADDRESS_LEN {
                return Outcome::Reject("The address must be 1 to 120 characters long.");
            }
            let mut next = draft.clone();
            next.address = Some(address.to_string());
            next.coordinates = None;
            Outcome::Accept(next)
        }
        _ => Outcome::Reject("Please share a location or type an address."),
    }
}

fn accept_visibility(draft: &Draft, input: &Input) -> Outcome {
    let visibility = match input.text().map(token).as_deref() {
        Some("public") => EventVisibility::Public,
        Some("private") => EventVisibility::Private,
        _ => return Outcome::Reject("Please tap “Public” or “Private”."),
    };
    let mut next = draft.clone();
    next.visibility = Some(visibility);
    Outcome::Accept(next)
}

fn accept_picture(draft: &Draft, input: &Input) -> Outcome {
    let mut next = draft.clone();
    match input {
        Input::Photo { file_id } => next.photo_file_id = Some(file_id.clone()),
        Input::Text(text) if token(text) == SKIP => next.photo_file_id = None,
        _ => return Outcome::Reject("Please send a photo or tap “skip”."),
    }
    Outcome::Accept(next)
}

fn accept_description(draft: &Draft, input: &Input) -> Outcome {
    let Some(text) = input.text() else {
        return Outcome::Reject("Please type a description or tap “skip”.");
    };
    let description = if token(text) == SKIP { "" } else { text.trim() };
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Outcome::Reject("The description must be at most 1000 characters long.");
    }
    let mut next = draft.clone();
    next.description = Some(description.to_string());
    Outcome::Accept(next)
}

fn nav_row(first: bool) -> Vec<Button> {
    if first {
        vec![Button::text(CANCEL)]
    } else {
        vec![Button::text(BACK), Button::text(CANCEL)]
    }
}

fn location_keyboard() -> Keyboard {
    Keyboard::Reply(vec![
        vec![Button::RequestLocation(SEND_LOCATION.to_string())],
        vec![Button::text(PICK_ON_MAP)],
        nav_row(false),
    ])
}

/// Render the prompt of `step` for the current draft
pub fn prompt(step: Step, draft: &Draft, first: bool) -> Reply {
    let (text, keyboard) = match step {
        Step::Topic => {
            let mut rows = grid(catalog::topic_names(), 2);
            rows.push(nav_row(first));
            ("Select a topic:".to_string(), Keyboard::Reply(rows))
        }
        Step::EventType => {
            let topic = draft.topic.as_deref().unwrap_or(OTHER_TOPIC);
            match catalog::topic(topic).filter(|t| !t.is_free_text()) {
                Some(t) => {
                    let mut rows = grid(t.options.iter().copied(), 2);
                    rows.push(nav_row(first));
                    ("Select event type:".to_string(), Keyboard::Reply(rows))
                }
                None => (
                    "Type the event title (up to 80 characters):".to_string(),
                    Keyboard::Reply(vec![nav_row(first)]),
                ),
            }
        }
        Step::DateTime => (
            "Choose date & time: tap “today” or “tomorrow”, or type YYYY-MM-DD HH:MM (UTC)."
                .to_string(),
            Keyboard::Reply(vec![
                vec![Button::text(TODAY), Button::text(TOMORROW)],
                nav_row(first),
            ]),
        ),
        Step::Location => (
            "📍 Tap “Send my current location”, use 📎 → Location to pick any point on the map, \
             or type an address."
                .to_string(),
            location_keyboard(),
        ),
        Step::Visibility => (
            "Who can see this event?".to_string(),
            Keyboard::Reply(vec![
                vec![Button::text(PUBLIC), Button::text(PRIVATE)],
                nav_row(first),
            ]),
        ),
        Step::Picture => (
            "Send a picture for the event, or tap “skip”.".to_string(),
            Keyboard::Reply(vec![vec![Button::text(SKIP)], nav_row(first)]),
        ),
        Step::Description => (
            "Add a description (up to 1000 characters), or tap “skip”.".to_string(),
            Keyboard::Reply(vec![vec![Button::text(SKIP)], nav_row(first)]),
        ),
    };

    let text = match current_value(step, draft) {
        Some(current) => format!("{text}\nCurrent: {current}"),
        None => text,
    };
    Reply::text(text).with_keyboard(keyboard)
}

/// Value already stored for `step`, shown when the step is revisited
fn current_value(step: Step, draft: &Draft) -> Option<String> {
    match step {
        Step::Topic => draft.topic.clone(),
        Step::EventType => draft.title.clone(),
        Step::DateTime => draft.occurs_at.as_ref().map(format_utc),
        Step::Location => match (&draft.address, draft.coordinates) {
            (Some(address), _) => Some(address.clone()),
            (None, Some(point)) => Some(format!("{:.5}, {:.5}", point.latitude, point.longitude)),
            (None, None) => None,
        },
        Step::Visibility => draft.visibility.map(|v| v.label().to_string()),
        Step::Picture => draft.photo_file_id.as_ref().map(|_| "photo attached".to_string()),
        Step::Description => draft.description.clone().filter(|d| !d.is_empty()),
    }
}
