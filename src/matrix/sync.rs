//! Matrix client synchronization and event handling.
//!
//! [`MatrixSync::sync`]:
//! 1. Performs an initial sync to catch up on invites received while offline
//! 2. Sets up event handlers for auto-joining rooms and message processing
//! 3. Enters a continuous sync loop with sync token persistence

use std::sync::Arc;

use anyhow::Result;
use log::{error, info, warn};
use matrix_sdk::{
    Client, LoopCtrl, Room, RoomState,
    config::SyncSettings,
    ruma::{
        api::client::filter::FilterDefinition,
        events::room::{
            member::StrippedRoomMemberEvent,
            message::{MessageType, OriginalSyncRoomMessageEvent},
        },
    },
};
use tokio::time::{Duration, sleep};

use crate::matrix::session::SessionStore;

/// A text message received in a joined room.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub body: String,
    pub room_id: String,
    pub sender_id: String,
    pub event_id: String,
    /// Whether the room is a direct chat with the sender
    pub is_direct: bool,
}

/// Runs the sync loop of the bot client.
pub struct MatrixSync {
    client: Client,
    store: SessionStore,
}

impl MatrixSync {
    pub fn new(client: &Client, store: &SessionStore) -> Self {
        MatrixSync {
            client: client.to_owned(),
            store: store.to_owned(),
        }
    }

    /// Syncs forever, calling `on_message` for every new text message.
    ///
    /// Messages sent before the bot started and messages of the bot itself
    /// are never passed to `on_message`.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync loop stops on a fatal error.
    pub async fn sync<F>(&self, on_message: F) -> Result<()>
    where
        F: Fn(IncomingMessage) + Send + Sync + 'static,
    {
        info!("start syncing");

        self.client.add_event_handler(auto_join_rooms);

        // See <https://spec.matrix.org/v1.6/client-server-api/#lazy-loading-room-members>.
        let filter = FilterDefinition::with_lazy_loading();
        let mut sync_settings = SyncSettings::default().filter(filter.into());

        if let Some(sync_token) = self.store.sync_token() {
            sync_settings = sync_settings.token(sync_token);
        }

        // First sync only catches up, messages received while offline are skipped
        loop {
            match self.client.sync_once(sync_settings.clone()).await {
                Ok(response) => {
                    sync_settings = sync_settings.token(response.next_batch.clone());
                    if let Err(err) = self.store.persist_sync_token(response.next_batch).await {
                        error!("failed to persist sync token: {:?}", err);
                    }
                    break;
                }
                Err(error) => {
                    error!("an error occurred during initial sync: {error}, trying again");
                    sleep(Duration::from_secs(2)).await;
                }
            }
        }

        let on_message = Arc::new(on_message);
        self.client.add_event_handler({
            let on_message = Arc::clone(&on_message);
            move |event: OriginalSyncRoomMessageEvent, room: Room, client: Client| {
                let on_message = Arc::clone(&on_message);
                async move { on_room_message(event, room, client, on_message.as_ref()).await }
            }
        });

        self.client
            .sync_with_result_callback(sync_settings, |sync_result| async move {
                let response = sync_result?;

                if let Err(err) = self.store.persist_sync_token(response.next_batch).await {
                    error!("failed to persist sync token: {:?}", err);
                }

                Ok(LoopCtrl::Continue)
            })
            .await?;

        Ok(())
    }
}

/// Joins every room the bot is invited to.
///
/// Joining is retried with a growing delay, see
/// <https://github.com/matrix-org/synapse/issues/4345>.
async fn auto_join_rooms(room_member: StrippedRoomMemberEvent, client: Client, room: Room) {
    let Some(user_id) = client.user_id() else {
        warn!("could not get user id from client");
        return;
    };

    if room_member.state_key != user_id {
        return;
    }

    tokio::spawn(async move {
        info!("auto joining room {}", room.room_id());
        let mut delay = 2;

        while let Err(err) = room.join().await {
            error!(
                "failed to join room {} ({err:?}), retrying in {delay}s",
                room.room_id()
            );

            sleep(Duration::from_secs(delay)).await;
            delay *= 2;

            if delay > 3600 {
                error!("can't join room {} ({err:?})", room.room_id());
                return;
            }
        }
        info!("successfully joined room {}", room.room_id());
    });
}

async fn on_room_message<F>(
    event: OriginalSyncRoomMessageEvent,
    room: Room,
    client: Client,
    on_message: &F,
) where
    F: Fn(IncomingMessage),
{
    if room.state() != RoomState::Joined {
        return;
    }

    // Never answer ourselves, `echo` would loop otherwise
    if client.user_id().is_some_and(|me| me == &*event.sender) {
        return;
    }

    let MessageType::Text(text_content) = event.content.msgtype else {
        return;
    };

    let is_direct = room.is_direct().await.unwrap_or_else(|e| {
        warn!("cannot tell if {} is direct: {:?}", room.room_id(), e);
        false
    });

    on_message(IncomingMessage {
        body: text_content.body,
        room_id: room.room_id().to_string(),
        sender_id: event.sender.to_string(),
        event_id: event.event_id.to_string(),
        is_direct,
    });
}
