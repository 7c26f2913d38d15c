//! Bot command definitions
//!
//! Defines all Telegram bot commands and their parsing logic

use teloxide::utils::command::BotCommands;

/// All bot commands
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Invevent commands:")]
pub enum Command {
    /// Carries the deep-link payload of `t.me/<bot>?start=<payload>`
    #[command(description = "Show the main menu")]
    Start(String),

    #[command(description = "Create a new event")]
    Create,

    #[command(description = "Abort event creation")]
    Cancel,

    #[command(description = "Show help message")]
    Help,
}
