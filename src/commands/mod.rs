//! Bot command parsing, dispatch and response formatting.
//!
//! # Overview
//!
//! Every Matrix text message goes through the same pipeline:
//!
//! ```text
//! Matrix Message
//!      │
//!      ▼
//! ┌────────────────┐
//! │ PrefixMatcher  │  ← default prefix, `@bot:server ` or `Name: `
//! └────────────────┘
//!      │ Invocation
//!      ▼
//! ┌────────────────┐
//! │   Commander    │  ← resolve in the registry, then
//! └────────────────┘    disabled → capability → cooldown checks
//!      │
//!      ▼
//! ┌────────────────────────┐
//! │ Action Handlers        │
//! │  - help (DM delivery)  │
//! │  - links, misc, stats  │
//! │  - templates           │
//! └────────────────────────┘
//!      │
//!      ▼
//!  CommandResult (Markdown reply for the room), or nothing
//! ```
//!
//! # Command Structure
//!
//! Commands follow the format `<prefix><command> [args...]`. Groups take their
//! subcommand as the next word, e.g. `!pb template add character`.
//!
//! Owners bypass the disabled and cooldown checks but never the capability
//! checks of a command.

mod actions;
mod builtins;
mod commander;
pub(crate) mod markdown_response;
mod parser;

pub use crate::commands::commander::Commander;
pub use crate::commands::parser::{Invocation, PrefixMatcher};

use crate::config::LinksConfig;

/// Facts about an incoming message the commander cannot find by itself.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Matrix user ID of the sender
    pub user_id: String,
    /// Room the message was sent in
    pub room_id: String,
    /// Whether that room is a direct chat with the bot
    pub is_direct: bool,
    /// Number of rooms the bot has joined, shown by `stats`
    pub room_count: usize,
}

/// Reply to send back to the room a command came from.
#[derive(Debug, PartialEq, Eq)]
pub struct CommandResult {
    /// Markdown-formatted response message
    pub response: String,
}

impl CommandResult {
    pub fn new(response: String) -> Self {
        CommandResult { response }
    }
}

/// Static settings the command handlers read.
#[derive(Debug, Clone, Default)]
pub struct CommandSettings {
    /// Matrix ID of the bot account
    pub bot_user_id: String,
    /// Display name of the bot, also used for the nickname mention
    pub bot_name: String,
    /// Credit line shown by `stats`
    pub creator: String,
    /// Prefix of every command besides mentions
    pub default_prefix: String,
    /// Users allowed to bypass disabled commands and cooldowns
    pub owners: Vec<String>,
    /// Optional links; a missing link turns its feature off
    pub links: LinksConfig,
}
