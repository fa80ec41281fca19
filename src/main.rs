//! ProfileBot - A Matrix bot managing profile templates.
//!
//! This is the main entry point of the bot. It reads the configuration, logs in
//! to Matrix and answers commands until the process is terminated.
//!
//! # Configuration
//!
//! See the [`config`] module for the YAML format. Any value can be overridden
//! with an environment variable prefixed with `PROFILEBOT_`:
//!
//! ```bash
//! export PROFILEBOT_MATRIX__USER_ID="@profilebot:matrix.org"
//! export PROFILEBOT_MATRIX__PASSWORD="your-password"
//! ```
//!
//! # Usage
//!
//! ```bash
//! profilebot --config config.yaml --data ./profilebot-data
//! ```
//!
//! # Bot Commands
//!
//! - `!pb help [command]` - Help, sent in a direct chat
//! - `!pb template add|remove|list` - Manage the templates of a room
//! - `!pb stats` - Process statistics
//! - `!pb clear` - Redacts the bot's recent messages in a room
//! - `!pb vote`, `github`, `donate`, `invite`, `server` - Links
//!
//! The bot also answers when mentioned, e.g. `ProfileBot: help`.
//!
//! # Architecture
//!
//! - [`bot`] - Wiring of the Matrix client and the commander
//! - [`commands`] - Prefix matching, checks and command handlers
//! - [`config`] - Configuration loading
//! - [`help`] - Help resolution, rendering and direct-message delivery
//! - [`matrix`] - Matrix login, sync and sending
//! - [`registry`] - Command tree and cooldowns
//! - [`templates`] - Per-room template catalog
//! - [`utils`] - Path helpers
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Controls logging level (default: `info`)

use clap::Parser;
use env_logger::Env;
use log::{error, info};

use crate::{bot::Bot, config::Config};

mod bot;
mod commands;
mod config;
mod help;
mod matrix;
mod registry;
mod templates;
mod utils;

/// Command-line arguments of the bot.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file.
    #[arg(short, long)]
    config: String,

    /// Path to the directory for storing persistent data.
    ///
    /// This directory will contain:
    /// - `session/` - Matrix session data (access token, sync token, state store)
    /// - `templates.json` - Templates registered in each room
    ///
    /// The access token allows impersonating the bot, keep this directory private.
    #[arg(short, long)]
    data: String,
}

#[tokio::main]
async fn main() {
    // Put logger at info level by default
    let env = Env::default().filter_or("RUST_LOG", "info");
    env_logger::init_from_env(env);

    info!("Starting profilebot {}...", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let config = match Config::load(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load config file: {:#}", e);
            return;
        }
    };

    let bot = match Bot::new(config, &args.data).await {
        Ok(b) => b,
        Err(e) => {
            error!("Failed to initialize bot: {:#}", e);
            return;
        }
    };

    if let Err(e) = bot.start().await {
        error!("Bot stopped: {:#}", e);
    }
}
