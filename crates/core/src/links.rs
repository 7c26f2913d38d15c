//! Deep links and inline callback payloads
//!
//! Deep links travel through `https://t.me/<bot>?start=<payload>` and come back
//! as the `/start` parameter. Callback data is attached to inline buttons and
//! is limited to 64 bytes by Telegram, which both encodings respect.

use std::fmt;
use std::str::FromStr;

use crate::types::{EventId, TelegramId};

/// `/start` payload carrying an event action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeepLink {
    /// `desc_<id>`: show details without joining
    Describe(EventId),
    /// `join_<id>`: join right away
    Join(EventId),
}

impl DeepLink {
    pub fn payload(&self) -> String {
        match self {
            DeepLink::Describe(id) => format!("desc_{id}"),
            DeepLink::Join(id) => format!("join_{id}"),
        }
    }

    pub fn url(&self, bot_username: &str) -> String {
        format!("https://t.me/{bot_username}?start={}", self.payload())
    }

    /// Parse a `/start` parameter. Unknown prefixes and bad ids yield `None`.
    pub fn parse(param: &str) -> Option<Self> {
        let param = param.trim();
        if let Some(id) = param.strip_prefix("join_") {
            return id.parse().ok().map(DeepLink::Join);
        }
        if let Some(id) = param.strip_prefix("desc_") {
            return id.parse().ok().map(DeepLink::Describe);
        }
        None
    }
}

/// Inline action on an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventAction {
    Details,
    Join,
    Unjoin,
    Delete,
}

impl EventAction {
    fn as_str(self) -> &'static str {
        match self {
            EventAction::Details => "details",
            EventAction::Join => "join",
            EventAction::Unjoin => "unjoin",
            EventAction::Delete => "delete",
        }
    }
}

impl FromStr for EventAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "details" => Ok(EventAction::Details),
            "join" => Ok(EventAction::Join),
            "unjoin" => Ok(EventAction::Unjoin),
            "delete" => Ok(EventAction::Delete),
            _ => Err(()),
        }
    }
}

/// Inline action on another user from the follow graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Events,
    Unfollow,
    Unfriend,
}

impl UserAction {
    fn as_str(self) -> &'static str {
        match self {
            UserAction::Events => "events",
            UserAction::Unfollow => "unfollow",
            UserAction::Unfriend => "unfriend",
        }
    }
}

impl FromStr for UserAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "events" => Ok(UserAction::Events),
            "unfollow" => Ok(UserAction::Unfollow),
            "unfriend" => Ok(UserAction::Unfriend),
            _ => Err(()),
        }
    }
}

/// Callback data: `evt:<id>:act:<verb>` or `user:<id>:act:<verb>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackData {
    Event(EventId, EventAction),
    User(TelegramId, UserAction),
}

impl CallbackData {
    pub fn encode(&self) -> String {
        self.to_string()
    }

    pub fn parse(data: &str) -> Option<Self> {
        let mut parts = data.split(':');
        let (kind, id, act, verb) = (parts.next()?, parts.next()?, parts.next()?, parts.next()?);
        if act != "act" || parts.next().is_some() {
            return None;
        }
        match kind {
            "evt" => Some(CallbackData::Event(id.parse().ok()?, verb.parse().ok()?)),
            "user" => Some(CallbackData::User(id.parse().ok()?, verb.parse().ok()?)),
            _ => None,
        }
    }
}

impl fmt::Display for CallbackData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackData::Event(id, action) => write!(f, "evt:{id}:act:{}", action.as_str()),
            CallbackData::User(id, action) => write!(f, "user:{id}:act:{}", action.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deep_link_payloads() {
        let id = EventId::new();
        assert_eq!(DeepLink::Join(id).payload(), format!("join_{id}"));
        assert_eq!(
            DeepLink::Describe(id).url("InvEventBot"),
            format!("https://t.me/InvEventBot?start=desc_{id}")
        );
        assert_eq!(DeepLink::parse(&format!("join_{id}")), Some(DeepLink::Join(id)));
        assert_eq!(
            DeepLink::parse(&format!("desc_{id}")),
            Some(DeepLink::Describe(id))
        );
    }

    #[test]
    fn test_deep_link_rejects_unknown_payloads() {
        assert_eq!(DeepLink::parse(""), None);
        assert_eq!(DeepLink::parse("join_"), None);
        assert_eq!(DeepLink::parse("join_42"), None);
        assert_eq!(DeepLink::parse("share_abc"), None);
    }

    #[test]
    fn test_callback_data_encoding() {
        let id = EventId::new();
        let data = CallbackData::Event(id, EventAction::Unjoin);
        assert_eq!(data.encode(), format!("evt:{id}:act:unjoin"));
        assert!(data.encode().len() <= 64);
        assert_eq!(CallbackData::parse(&data.encode()), Some(data));

        assert_eq!(
            CallbackData::parse("user:42:act:unfriend"),
            Some(CallbackData::User(42, UserAction::Unfriend))
        );
    }

    #[test]
    fn test_callback_data_rejects_malformed() {
        for data in [
            "",
            "evt",
            "evt:not-a-uuid:act:join",
            "user:42:act:dance",
            "user:42:do:events",
            "user:42:act:events:extra",
            "group:1:act:events",
        ] {
            assert_eq!(CallbackData::parse(data), None, "{data}");
        }
    }
}
