//! Matrix protocol integration for the bot.
//!
//! - **Login**: password login on first start, session restoration afterwards
//! - **Session**: persistence of the login and of the sync token
//! - **Sync**: auto-join on invite and dispatch of incoming text messages
//!
//! [`MatrixClient`] ties them together and implements the help transport.

mod client;
mod login;
mod session;
mod sync;

pub use crate::matrix::{client::MatrixClient, sync::IncomingMessage};

/// User credentials for a Matrix account
#[derive(Debug, Clone)]
pub struct UserCredentials {
    /// User ID of the matrix account
    pub user_id: String,
    /// Password of the matrix account
    pub password: String,
}
