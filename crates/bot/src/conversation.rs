//! Wizard dispatch and commit
//!
//! Runs the core state machine against the stored draft of one user while
//! holding that user's session lock, and persists the event when the last
//! step is answered.

use anyhow::Result;
use chrono::Utc;
use invevent_core::models::User;
use invevent_core::reply::Reply;
use invevent_core::wizard::{Draft, Input, Transition};

use crate::AppState;
use crate::render;

/// Start a fresh wizard, silently replacing any draft in progress
pub async fn start_wizard(state: &AppState, user: &User) -> Reply {
    let _guard = state.sessions.lock(user.id).await;
    let (draft, prompt) = state.wizard.start();
    state.sessions.start(user.id, draft).await;
    tracing::debug!("User {} started the event wizard", user.id);
    prompt
}

/// Feed an input to the user's wizard
///
/// Returns `None` when the user has no wizard in progress.
pub async fn handle_input(state: &AppState, user: &User, input: &Input) -> Result<Option<Vec<Reply>>> {
    let _guard = state.sessions.lock(user.id).await;
    let Some(draft) = state.sessions.get(user.id).await else {
        return Ok(None);
    };

    let replies = match state.wizard.handle(draft, input, Utc::now()) {
        Transition::Rejected { draft, reply } => {
            tracing::debug!("User {} input rejected at {:?}", user.id, draft.step);
            state.sessions.save(user.id, draft).await;
            vec![reply]
        }
        Transition::Continue { draft, reply } => {
            state.sessions.save(user.id, draft).await;
            vec![reply]
        }
        Transition::Cancelled => {
            state.sessions.reset(user.id).await;
            tracing::debug!("User {} cancelled the event wizard", user.id);
            vec![render::main_menu("❌ Event creation cancelled.")]
        }
        Transition::OutOfRange => {
            state.sessions.reset(user.id).await;
            tracing::warn!("User {} had a draft outside the wizard flow", user.id);
            vec![session_expired()]
        }
        Transition::Completed(draft) => commit(state, user, draft).await?,
    };
    Ok(Some(replies))
}

/// Abort the wizard if one is running
pub async fn cancel(state: &AppState, user: &User) -> Reply {
    let _guard = state.sessions.lock(user.id).await;
    if state.sessions.get(user.id).await.is_some() {
        state.sessions.reset(user.id).await;
        render::main_menu("❌ Event creation cancelled.")
    } else {
        render::main_menu("Nothing to cancel.")
    }
}

pub fn session_expired() -> Reply {
    render::main_menu("⌛ Session expired. Please start again.")
}

async fn commit(state: &AppState, user: &User, draft: Draft) -> Result<Vec<Reply>> {
    let mut new_event = match draft.clone().into_new_event(user.id) {
        Ok(event) => event,
        Err(e) => {
            state.sessions.reset(user.id).await;
            tracing::error!("User {} completed an invalid draft: {}", user.id, e);
            return Ok(vec![render::main_menu(
                "❌ Failed to save the event. Please start again.",
            )]);
        }
    };

    if new_event.coordinates.is_none()
        && let Some(address) = &new_event.address
    {
        new_event.coordinates = state.geocoder.geocode(address).await;
    }

    let event = match state.db.create_event(user, &new_event).await {
        Ok(event) => event,
        Err(e) => {
            // Keep the draft: answering the last step again retries the commit
            state.sessions.save(user.id, draft).await;
            tracing::error!("Failed to save event for user {}: {}", user.id, e);
            return Ok(vec![Reply::text(
                "❌ Failed to save the event. Please try again.",
            )]);
        }
    };

    state.sessions.reset(user.id).await;
    tracing::info!(
        "User {} created event {} ({:?})",
        user.id,
        event.id,
        event.visibility
    );

    Ok(vec![
        render::creation_confirmation(&event, &state.bot_username),
        render::main_menu("What's next?"),
    ])
}
