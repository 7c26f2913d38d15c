//! Main menu, listings, deep links and inline actions

use anyhow::Result;
use invevent_core::geo::Coordinates;
use invevent_core::links::{CallbackData, DeepLink, EventAction, UserAction};
use invevent_core::models::{Event, User};
use invevent_core::reply::Reply;
use invevent_core::visibility::{self, can_view};
use invevent_core::wizard::is_wizard_control;
use invevent_core::{EventId, TelegramId};

use crate::render::{self, FOLLOWERS, FOLLOWING};
use crate::{AppState, conversation};

/// Answer to an inline button press
#[derive(Debug)]
pub struct CallbackResponse {
    /// Short toast shown by the client
    pub ack: String,
    pub replies: Vec<Reply>,
}

impl CallbackResponse {
    fn ack(text: impl Into<String>) -> Self {
        Self {
            ack: text.into(),
            replies: Vec::new(),
        }
    }

    fn with_reply(mut self, reply: Reply) -> Self {
        self.replies.push(reply);
        self
    }
}

/// Text sent while no wizard is running
pub async fn handle_text(state: &AppState, user: &User, text: &str) -> Result<Vec<Reply>> {
    let reply = match text.trim() {
        render::CREATE_EVENT => conversation::start_wizard(state, user).await,
        render::MY_EVENTS => {
            let events = state.db.my_events(user.id).await?;
            render::event_list(render::MY_EVENTS, &events)
        }
        render::FRIENDS_EVENTS => {
            let events = state.db.friends_events(user.id).await?;
            render::event_list(render::FRIENDS_EVENTS, &events)
        }
        render::PUBLIC_EVENTS => {
            let events = state.db.public_events().await?;
            render::event_list(render::PUBLIC_EVENTS, &events)
        }
        render::FRIENDS => render::friends_menu(),
        FOLLOWERS => {
            let followers = state.db.followers(user.id).await?;
            render::connection_list(FOLLOWERS, &followers, false)
        }
        FOLLOWING => {
            let followed = state.db.followed(user.id).await?;
            render::connection_list(FOLLOWING, &followed, true)
        }
        render::MENU_BACK => render::main_menu("Main menu"),
        other if is_wizard_control(other) => conversation::session_expired(),
        _ => render::main_menu("Please use the menu below."),
    };
    Ok(vec![reply])
}

/// Location shared outside the wizard
pub async fn handle_nearby(state: &AppState, user: &User, origin: Coordinates) -> Result<Vec<Reply>> {
    let events = state.db.visible_events(user.id).await?;
    let hits = visibility::nearby(events, origin, state.nearby_radius_km);
    tracing::debug!("User {} found {} event(s) nearby", user.id, hits.len());
    Ok(vec![render::nearby_list(&hits, state.nearby_radius_km)])
}

/// `/start` with an optional deep-link parameter
pub async fn handle_start(state: &AppState, user: &User, param: &str) -> Result<Vec<Reply>> {
    if param.trim().is_empty() {
        return Ok(vec![render::welcome(user)]);
    }
    match DeepLink::parse(param) {
        Some(DeepLink::Join(id)) => join_link(state, user, id).await,
        Some(DeepLink::Describe(id)) => describe_link(state, user, id).await,
        None => {
            tracing::debug!("User {} opened unknown start payload {:?}", user.id, param);
            Ok(vec![render::welcome(user)])
        }
    }
}

async fn active_event(state: &AppState, id: EventId) -> Result<Option<Event>> {
    Ok(state.db.get_event(id).await?.filter(Event::is_active))
}

fn not_found() -> Reply {
    render::main_menu("❌ Event not found.")
}

async fn join_link(state: &AppState, user: &User, id: EventId) -> Result<Vec<Reply>> {
    let Some(event) = active_event(state, id).await? else {
        return Ok(vec![not_found()]);
    };
    if state.db.join_event(&event, user.id).await? {
        tracing::info!("User {} joined event {} via link", user.id, event.id);
    }
    Ok(vec![
        Reply::html(format!("🎉 You're in!\n\n{}", render::event_summary(&event)))
            .with_photo(event.photo_file_id.clone())
            .with_keyboard(render::event_actions(&event, user.id, true)),
    ])
}

async fn describe_link(state: &AppState, user: &User, id: EventId) -> Result<Vec<Reply>> {
    let Some(event) = active_event(state, id).await? else {
        return Ok(vec![not_found()]);
    };
    state.db.befriend(user.id, event.owner_id).await?;
    Ok(vec![details(state, user.id, &event).await?])
}

async fn details(state: &AppState, viewer: TelegramId, event: &Event) -> Result<Reply> {
    let joined = state.db.is_participant(event.id, viewer).await?;
    let owner = state.db.get_user(event.owner_id).await?;
    let participants = state.db.count_participants(event.id).await?;
    Ok(
        Reply::html(render::event_details(event, owner.as_ref(), participants))
            .with_photo(event.photo_file_id.clone())
            .with_keyboard(render::event_actions(event, viewer, joined)),
    )
}

/// Inline button press
pub async fn handle_callback(state: &AppState, user: &User, data: &str) -> Result<CallbackResponse> {
    match CallbackData::parse(data) {
        Some(CallbackData::Event(id, action)) => event_action(state, user, id, action).await,
        Some(CallbackData::User(id, action)) => user_action(state, user, id, action).await,
        None => {
            tracing::warn!("User {} sent unknown callback data {:?}", user.id, data);
            Ok(CallbackResponse::ack("Unknown action"))
        }
    }
}

async fn event_action(
    state: &AppState,
    user: &User,
    id: EventId,
    action: EventAction,
) -> Result<CallbackResponse> {
    let Some(event) = active_event(state, id).await? else {
        return Ok(CallbackResponse::ack("Event not found"));
    };
    let follows_owner = state.db.follows(user.id, event.owner_id).await?;
    if !can_view(&event, user.id, follows_owner) {
        return Ok(CallbackResponse::ack("Event not found"));
    }

    let response = match action {
        EventAction::Details => {
            CallbackResponse::ack("").with_reply(details(state, user.id, &event).await?)
        }
        EventAction::Join => {
            if state.db.join_event(&event, user.id).await? {
                tracing::info!("User {} joined event {}", user.id, event.id);
                CallbackResponse::ack("You joined the event")
            } else {
                CallbackResponse::ack("You already joined this event")
            }
        }
        EventAction::Unjoin => {
            if state.db.leave_event(event.id, user.id).await? {
                tracing::info!("User {} left event {}", user.id, event.id);
                CallbackResponse::ack("You left the event")
            } else {
                CallbackResponse::ack("You are not a participant")
            }
        }
        EventAction::Delete => {
            if event.owner_id != user.id {
                return Ok(CallbackResponse::ack("Only the owner can delete this event"));
            }
            if state.db.delete_event(event.id, user.id).await? {
                tracing::info!("User {} deleted event {}", user.id, event.id);
            }
            CallbackResponse::ack("Event deleted")
        }
    };
    Ok(response)
}

async fn user_action(
    state: &AppState,
    user: &User,
    other: TelegramId,
    action: UserAction,
) -> Result<CallbackResponse> {
    let response = match action {
        UserAction::Events => {
            let name = state
                .db
                .get_user(other)
                .await?
                .map_or_else(|| "this user".to_string(), |u| u.display_name());
            let events = state.db.events_of_owner(other, user.id).await?;
            CallbackResponse::ack("")
                .with_reply(render::event_list(&format!("Events of {name}"), &events))
        }
        UserAction::Unfollow => {
            if state.db.unfollow(user.id, other).await? {
                tracing::info!("User {} unfollowed {}", user.id, other);
                CallbackResponse::ack("Unfollowed")
            } else {
                CallbackResponse::ack("You are not following this user")
            }
        }
        UserAction::Unfriend => {
            let removed = state.db.unfriend(user.id, other).await?;
            tracing::info!("User {} unfriended {} ({} edge(s))", user.id, other, removed);
            CallbackResponse::ack("Removed from friends")
        }
    };
    Ok(response)
}
