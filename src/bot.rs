//! Bot module wiring the Matrix client to the command handlers.
//!
//! # Command Processing Flow
//!
//! ```text
//! Matrix Message → Match Prefix → Resolve Command → Check → Execute → Send Reply
//! ```
//!
//! The help command is the exception: its output goes to the direct chat of the
//! requester, the reply in the room being at most a short acknowledgement.

use std::sync::Arc;

use log::{debug, info};
use tokio::sync::Mutex;

use crate::{
    commands::{CommandContext, CommandSettings, Commander},
    config::Config,
    matrix::{IncomingMessage, MatrixClient, UserCredentials},
    templates::TemplateCatalog,
    utils::get_path,
};

/// Main bot structure.
///
/// Owns the Matrix client and the commander. Both are shared with the task
/// spawned for each incoming message.
pub struct Bot {
    matrix_client: Arc<MatrixClient>,
    commander: Arc<Commander<MatrixClient>>,
}

impl Bot {
    /// Logs in, loads the template catalog and builds the command table.
    ///
    /// # Arguments
    ///
    /// * `config` - Loaded configuration
    /// * `data_path` - Directory holding the Matrix session and `templates.json`
    ///
    /// # Errors
    ///
    /// Returns an error if the Matrix login fails or the command table is invalid.
    pub async fn new(config: Config, data_path: &str) -> anyhow::Result<Self> {
        let matrix_client = Arc::new(
            MatrixClient::new(
                &UserCredentials {
                    user_id: config.matrix.user_id.clone(),
                    password: config.matrix.password,
                },
                &get_path(data_path, "session"),
                &config.bot.name,
            )
            .await?,
        );

        let identity = matrix_client.identity(&config.bot.name).await?;
        debug!("running as {} ({})", identity.display_name, identity.user_id);

        let catalog = Arc::new(Mutex::new(
            TemplateCatalog::load(get_path(data_path, "templates.json")).await,
        ));

        let settings = CommandSettings {
            bot_user_id: identity.user_id.clone(),
            bot_name: identity.display_name.clone(),
            creator: config.bot.creator,
            default_prefix: config.bot.default_prefix,
            owners: config.bot.owners,
            links: config.links,
        };

        let commander = Arc::new(Commander::new(
            settings,
            identity,
            config.bot.help_order,
            catalog,
            Arc::clone(&matrix_client),
        )?);

        Ok(Bot {
            matrix_client,
            commander,
        })
    }

    /// Syncs with the homeserver and answers commands until the process ends.
    pub async fn start(self) -> anyhow::Result<()> {
        let matrix_client = Arc::clone(&self.matrix_client);
        let commander = Arc::clone(&self.commander);

        let on_message = move |message: IncomingMessage| {
            Self::handle_matrix_message(
                message,
                Arc::clone(&matrix_client),
                Arc::clone(&commander),
            )
        };

        info!("ready to answer commands");
        self.matrix_client.sync(on_message).await
    }

    fn handle_matrix_message(
        message: IncomingMessage,
        matrix_client: Arc<MatrixClient>,
        commander: Arc<Commander<MatrixClient>>,
    ) {
        // Return silently if the message is not for the bot
        let Some(invocation) = commander.parse(&message.body) else {
            return;
        };

        tokio::spawn(async move {
            let context = CommandContext {
                user_id: message.sender_id.clone(),
                room_id: message.room_id.clone(),
                is_direct: message.is_direct,
                room_count: matrix_client.joined_room_count(),
            };

            let Some(command_result) = commander.execute(invocation, &context).await else {
                return;
            };

            matrix_client
                .send_reply(
                    &message.room_id,
                    &message.sender_id,
                    &message.event_id,
                    &command_result.response,
                )
                .await;
        });
    }
}
