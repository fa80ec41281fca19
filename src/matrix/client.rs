//! Matrix client wrapper for bot messaging and synchronization.
//!
//! [`MatrixClient`] wraps the Matrix SDK client. It sends the replies of the
//! commands and implements the [`Transport`]: help goes through direct chats,
//! `clear` redacts the bot's recent messages.

use anyhow::Context;
use log::{debug, error, info, warn};
use matrix_sdk::{
    Client, Room,
    room::MessagesOptions,
    ruma::{
        EventId, OwnedUserId, RoomId, UInt, UserId,
        events::{
            AnySyncMessageLikeEvent, AnySyncTimelineEvent, SyncMessageLikeEvent,
            room::message::{AddMentions, ForwardThread, ReplyMetadata, RoomMessageEventContent},
        },
    },
};

use crate::{
    help::{BotIdentity, DeliveryError, RenderedMessage, Transport},
    matrix::{
        UserCredentials,
        login::setup_client,
        session::SessionStore,
        sync::{IncomingMessage, MatrixSync},
    },
};

/// High-level Matrix client of the bot.
pub struct MatrixClient {
    matrix_sync: MatrixSync,
    client: Client,
}

impl MatrixClient {
    /// Logs in (or restores the previous login) and sets the display name.
    ///
    /// # Arguments
    ///
    /// * `user_credentials` - Matrix ID and password of the bot account
    /// * `session_path` - Directory holding the session and the SQLite store
    /// * `display_name` - Display name to publish for the bot account
    ///
    /// # Errors
    ///
    /// Returns an error if the login fails or the display name cannot be set.
    pub async fn new(
        user_credentials: &UserCredentials,
        session_path: &str,
        display_name: &str,
    ) -> anyhow::Result<Self> {
        let store = SessionStore::open(session_path).await?;
        let client = setup_client(user_credentials, &store)
            .await
            .context("failed to setup matrix client")?;

        client
            .account()
            .set_display_name(Some(display_name))
            .await
            .context("failed to set the display name")?;

        let matrix_sync = MatrixSync::new(&client, &store);

        Ok(MatrixClient {
            matrix_sync,
            client,
        })
    }

    /// Reads the current identity of the bot account.
    ///
    /// Falls back to `fallback_name` when the server has no display name.
    pub async fn identity(&self, fallback_name: &str) -> anyhow::Result<BotIdentity> {
        let user_id = self
            .client
            .user_id()
            .context("the client is not logged in")?
            .to_string();

        let account = self.client.account();
        let display_name = account
            .get_display_name()
            .await?
            .unwrap_or_else(|| fallback_name.to_owned());
        let avatar_url = account.get_avatar_url().await?.map(|url| url.to_string());

        Ok(BotIdentity {
            user_id,
            display_name,
            avatar_url,
        })
    }

    /// Number of rooms the bot is in.
    pub fn joined_room_count(&self) -> usize {
        self.client.joined_rooms().len()
    }

    /// Starts the Matrix synchronization loop.
    ///
    /// `on_message` is called for each new text message. See [`MatrixSync::sync`].
    pub async fn sync<F>(&self, on_message: F) -> anyhow::Result<()>
    where
        F: Fn(IncomingMessage) + Send + Sync + 'static,
    {
        match self.matrix_sync.sync(on_message).await {
            Ok(_) => info!("matrix sync ended successfully"),
            Err(e) => error!("matrix sync ended with error: {:?}", e),
        }

        Ok(())
    }

    /// Sends `body` as a reply to the event `event_id` of `sender_id`.
    pub async fn send_reply(&self, room_id: &str, sender_id: &str, event_id: &str, body: &str) {
        let (Ok(sender), Ok(event)) = (UserId::parse(sender_id), EventId::parse(event_id)) else {
            warn!("cannot reply to {} in {}: invalid ids", event_id, room_id);
            return;
        };

        let content = RoomMessageEventContent::text_markdown(body).make_reply_to(
            ReplyMetadata::new(&event, &sender, None),
            ForwardThread::No,
            AddMentions::No,
        );

        let Some(room) = self.get_room(room_id) else {
            warn!("cannot reply in unknown room {}", room_id);
            return;
        };
        if let Err(e) = room.send(content).await {
            error!("failed to send message: {:?}", e);
        }
    }

    fn get_room(&self, room_id: &str) -> Option<Room> {
        let room_id = RoomId::parse(room_id).ok()?;
        self.client.get_room(&room_id)
    }

    /// Returns the direct chat with `user_id`, creating it on first use.
    async fn direct_room(&self, user_id: &str) -> Result<Room, DeliveryError> {
        let user_id: OwnedUserId = UserId::parse(user_id)
            .map_err(|e| DeliveryError::Fatal(format!("invalid user id {user_id}: {e}")))?;

        if let Some(room) = self.client.get_dm_room(&user_id) {
            return Ok(room);
        }

        debug!("creating a direct chat with {}", user_id);
        self.client.create_dm(&user_id).await.map_err(classify)
    }
}

/// Maps a Matrix error to a delivery error, a `403` meaning the user or the
/// room does not accept our messages.
fn classify(error: matrix_sdk::Error) -> DeliveryError {
    match error.as_client_api_error() {
        Some(api_error) if api_error.status_code.as_u16() == 403 => {
            DeliveryError::PermissionDenied
        }
        _ => DeliveryError::Fatal(error.to_string()),
    }
}

impl Transport for MatrixClient {
    async fn send_private(
        &self,
        user_id: &str,
        message: &RenderedMessage,
    ) -> Result<(), DeliveryError> {
        let room = self.direct_room(user_id).await?;
        let content = RoomMessageEventContent::text_markdown(message.to_markdown());

        room.send(content).await.map_err(classify)?;
        Ok(())
    }

    async fn send_origin(&self, room_id: &str, text: &str) -> Result<(), DeliveryError> {
        // We were never in that room or were kicked out of it
        let room = self
            .get_room(room_id)
            .ok_or(DeliveryError::PermissionDenied)?;

        room.send(RoomMessageEventContent::text_markdown(text))
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn clear_own_messages(&self, room_id: &str, limit: u32) -> Result<usize, DeliveryError> {
        let room = self
            .get_room(room_id)
            .ok_or(DeliveryError::PermissionDenied)?;
        let me = self
            .client
            .user_id()
            .ok_or_else(|| DeliveryError::Fatal("the client is not logged in".to_owned()))?
            .to_owned();

        let mut options = MessagesOptions::backward();
        options.limit = UInt::from(limit);
        let messages = room.messages(options).await.map_err(classify)?;

        let mut cleared = 0;
        for event in messages.chunk {
            // Already redacted messages are no longer `Original`
            let Ok(AnySyncTimelineEvent::MessageLike(AnySyncMessageLikeEvent::RoomMessage(
                SyncMessageLikeEvent::Original(message),
            ))) = event.raw().deserialize()
            else {
                continue;
            };
            if message.sender != me {
                continue;
            }

            room.redact(&message.event_id, None, None)
                .await
                .map_err(|e| classify(e.into()))?;
            cleared += 1;
        }

        debug!("redacted {} messages in {}", cleared, room_id);
        Ok(cleared)
    }
}
