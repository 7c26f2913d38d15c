//! Telegram update handlers
//!
//! Converts teloxide updates into domain inputs, routes them to the wizard or
//! the menus, and sends the resulting replies.

use anyhow::Result;
use invevent_core::geo::Coordinates;
use invevent_core::models::User;
use invevent_core::reply::{Button, InlineButton, Keyboard, Reply};
use invevent_core::wizard::Input;
use teloxide::dispatching::{HandlerExt, UpdateFilterExt, UpdateHandler};
use teloxide::RequestError;
use teloxide::prelude::*;
use teloxide::types::{
    ButtonRequest, FileId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, KeyboardButton,
    KeyboardMarkup, KeyboardRemove, ParseMode, ReplyMarkup,
};

use crate::commands::Command;
use crate::{AppState, conversation, menus, render};

/// Dispatcher schema: commands, other messages, inline button presses
pub fn schema() -> UpdateHandler<RequestError> {
    let messages = Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(dptree::endpoint(handle_message));

    dptree::entry()
        .branch(messages)
        .branch(Update::filter_callback_query().endpoint(handle_callback_query))
}

pub fn domain_user(user: &teloxide::types::User) -> User {
    User {
        id: user.id.0 as i64,
        first_name: user.first_name.clone(),
        username: user.username.clone(),
    }
}

/// Strip a message down to what the wizard understands
pub fn message_input(msg: &Message) -> Input {
    if let Some(text) = msg.text() {
        return Input::Text(text.to_string());
    }
    if let Some(location) = msg.location() {
        return Input::Location(Coordinates::new(location.latitude, location.longitude));
    }
    if let Some(venue) = msg.venue() {
        return Input::Location(Coordinates::new(
            venue.location.latitude,
            venue.location.longitude,
        ));
    }
    if let Some(sizes) = msg.photo()
        && let Some(largest) = sizes
            .iter()
            .max_by_key(|p| u64::from(p.width) * u64::from(p.height))
    {
        return Input::Photo {
            file_id: largest.file.id.0.clone(),
        };
    }
    Input::Other
}

/// Route commands to their handlers
async fn handle_command(bot: Bot, msg: Message, cmd: Command, state: AppState) -> ResponseResult<()> {
    let Some(user) = msg.from.as_ref().map(domain_user) else {
        return Ok(());
    };
    tracing::info!("Handling command {:?} from {}", cmd, user.id);

    let result = route_command(&state, &user, cmd).await;
    respond(&bot, msg.chat.id, &user, result).await
}

async fn route_command(state: &AppState, user: &User, cmd: Command) -> Result<Vec<Reply>> {
    state.db.upsert_user(user).await?;
    let replies = match cmd {
        Command::Start(param) => menus::handle_start(state, user, &param).await?,
        Command::Create => vec![conversation::start_wizard(state, user).await],
        Command::Cancel => vec![conversation::cancel(state, user).await],
        Command::Help => vec![render::help()],
    };
    Ok(replies)
}

/// Wizard input, menu buttons and shared locations
async fn handle_message(bot: Bot, msg: Message, state: AppState) -> ResponseResult<()> {
    let Some(user) = msg.from.as_ref().map(domain_user) else {
        return Ok(());
    };
    let input = message_input(&msg);

    let result = route_message(&state, &user, &input).await;
    respond(&bot, msg.chat.id, &user, result).await
}

async fn route_message(state: &AppState, user: &User, input: &Input) -> Result<Vec<Reply>> {
    state.db.upsert_user(user).await?;
    if let Some(replies) = conversation::handle_input(state, user, input).await? {
        return Ok(replies);
    }
    match input {
        Input::Text(text) => menus::handle_text(state, user, text).await,
        Input::Location(point) => menus::handle_nearby(state, user, *point).await,
        Input::Photo { .. } | Input::Other => Ok(vec![render::main_menu("Please use the menu below.")]),
    }
}

async fn handle_callback_query(bot: Bot, q: CallbackQuery, state: AppState) -> ResponseResult<()> {
    let user = domain_user(&q.from);
    let data = q.data.clone().unwrap_or_default();

    let result = match state.db.upsert_user(&user).await {
        Ok(()) => menus::handle_callback(&state, &user, &data).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(response) => {
            let mut answer = bot.answer_callback_query(q.id.clone());
            if !response.ack.is_empty() {
                answer = answer.text(response.ack);
            }
            answer.await?;
            send_replies(&bot, ChatId::from(q.from.id), response.replies).await
        }
        Err(e) => {
            tracing::error!("Error handling callback {:?} from {}: {}", data, user.id, e);
            bot.answer_callback_query(q.id.clone())
                .text("⚠️ Something went wrong")
                .await?;
            Ok(())
        }
    }
}

async fn respond(bot: &Bot, chat_id: ChatId, user: &User, result: Result<Vec<Reply>>) -> ResponseResult<()> {
    match result {
        Ok(replies) => send_replies(bot, chat_id, replies).await,
        Err(e) => {
            tracing::error!("Error handling update from {}: {}", user.id, e);
            send_replies(
                bot,
                chat_id,
                vec![render::main_menu("⚠️ Something went wrong. Please try again.")],
            )
            .await
        }
    }
}

/// Telegram rejects longer photo captions
const MAX_CAPTION_LEN: usize = 1024;

/// Send replies in order
///
/// A photo whose caption would be too long goes out bare, followed by the text.
pub async fn send_replies(bot: &Bot, chat_id: ChatId, replies: Vec<Reply>) -> ResponseResult<()> {
    for reply in replies {
        let parse_mode = reply.html.then_some(ParseMode::Html);
        let markup = reply_markup(&reply.keyboard);

        if let Some(file_id) = &reply.photo
            && reply.text.chars().count() <= MAX_CAPTION_LEN
        {
            let mut request = bot
                .send_photo(chat_id, InputFile::file_id(FileId(file_id.clone())))
                .caption(reply.text);
            if let Some(mode) = parse_mode {
                request = request.parse_mode(mode);
            }
            if let Some(markup) = markup {
                request = request.reply_markup(markup);
            }
            request.await?;
        } else {
            if let Some(file_id) = &reply.photo {
                bot.send_photo(chat_id, InputFile::file_id(FileId(file_id.clone())))
                    .await?;
            }
            let mut request = bot.send_message(chat_id, reply.text);
            if let Some(mode) = parse_mode {
                request = request.parse_mode(mode);
            }
            if let Some(markup) = markup {
                request = request.reply_markup(markup);
            }
            request.await?;
        }
    }
    Ok(())
}

fn reply_markup(keyboard: &Keyboard) -> Option<ReplyMarkup> {
    match keyboard {
        Keyboard::None => None,
        Keyboard::Remove => Some(ReplyMarkup::KeyboardRemove(KeyboardRemove::new())),
        Keyboard::Reply(rows) => {
            let rows = rows.iter().map(|row| row.iter().map(keyboard_button).collect::<Vec<_>>());
            Some(ReplyMarkup::Keyboard(
                KeyboardMarkup::new(rows).resize_keyboard(),
            ))
        }
        Keyboard::Inline(rows) => {
            let rows = rows
                .iter()
                .map(|row| row.iter().filter_map(inline_button).collect::<Vec<_>>());
            Some(ReplyMarkup::InlineKeyboard(InlineKeyboardMarkup::new(rows)))
        }
    }
}

fn keyboard_button(button: &Button) -> KeyboardButton {
    match button {
        Button::Text(label) => KeyboardButton::new(label.clone()),
        Button::RequestLocation(label) => {
            KeyboardButton::new(label.clone()).request(ButtonRequest::Location)
        }
    }
}

fn inline_button(button: &InlineButton) -> Option<InlineKeyboardButton> {
    match button {
        InlineButton::Callback { label, data } => {
            Some(InlineKeyboardButton::callback(label.clone(), data.clone()))
        }
        InlineButton::Url { label, url } => match url::Url::parse(url) {
            Ok(url) => Some(InlineKeyboardButton::url(label.clone(), url)),
            Err(e) => {
                tracing::warn!("Dropping button {:?} with bad url {:?}: {}", label, url, e);
                None
            }
        },
    }
}
