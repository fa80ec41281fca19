//! Delivery of a rendered help message.
//!
//! Help always goes to the actor's direct chat. The originating room only ever
//! receives a short acknowledgement or a failure notice:
//!
//! ```text
//! ATTEMPT_PRIMARY ──ok, from room──────────▶ ACK_ORIGIN ──▶ DONE
//!        │        ──ok, from direct chat───▶ DONE
//!        └────────permission denied────────▶ NOTIFY_ORIGIN_FAILURE ──▶ DONE
//! ```
//!
//! Permission errors are absorbed at every step. Any other transport error is
//! returned to the caller and nothing is retried.

use std::sync::Arc;

use log::{debug, warn};
use mockall::automock;
use thiserror::Error;

use crate::{
    commands::markdown_response::{format_dm_failed, format_dm_sent},
    help::{ActorContext, Surface, render::RenderedMessage},
};

/// Errors reported by a [`Transport`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The platform refused the send (blocked DMs, no right to talk in the room, ...)
    #[error("permission denied")]
    PermissionDenied,
    /// Any other failure
    #[error("delivery failed: {0}")]
    Fatal(String),
}

/// How a help request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Sent privately, no acknowledgement needed or possible
    DeliveredPrimary,
    /// Sent privately and acknowledged in the originating room
    DeliveredPrimaryWithAck,
    /// Private send refused, the originating room was told
    DeliveredFallbackNone,
    /// Private send refused and nobody could be told
    FailedSilent,
}

/// Messaging primitives the bot needs from the chat platform.
///
/// The dispatcher only sends; `clear` also redacts. Tests drive every branch
/// of the state machine with mocks.
#[automock]
pub trait Transport {
    /// Sends the full help message to the direct chat of `user_id`.
    async fn send_private(
        &self,
        user_id: &str,
        message: &RenderedMessage,
    ) -> Result<(), DeliveryError>;
    /// Sends a short text to the room the request came from.
    async fn send_origin(&self, room_id: &str, text: &str) -> Result<(), DeliveryError>;
    /// Redacts the bot's own messages among the last `limit` events of
    /// `room_id` and returns how many were redacted.
    async fn clear_own_messages(&self, room_id: &str, limit: u32) -> Result<usize, DeliveryError>;
}

/// Runs the delivery state machine for one message.
pub struct Dispatcher<T: Transport> {
    transport: Arc<T>,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Dispatcher { transport }
    }

    /// Delivers `message` to `actor`.
    ///
    /// # Errors
    ///
    /// Returns the first non-permission [`DeliveryError`] raised by the transport.
    pub async fn deliver(
        &self,
        actor: &ActorContext,
        message: &RenderedMessage,
    ) -> Result<DeliveryOutcome, DeliveryError> {
        match self.transport.send_private(&actor.user_id, message).await {
            Ok(()) => self.acknowledge(actor).await,
            Err(DeliveryError::PermissionDenied) => self.notify_failure(actor).await,
            Err(error) => Err(error),
        }
    }

    async fn acknowledge(&self, actor: &ActorContext) -> Result<DeliveryOutcome, DeliveryError> {
        let Surface::Room { room_id } = &actor.surface else {
            return Ok(DeliveryOutcome::DeliveredPrimary);
        };

        match self.transport.send_origin(room_id, &format_dm_sent()).await {
            Ok(()) => Ok(DeliveryOutcome::DeliveredPrimaryWithAck),
            Err(DeliveryError::PermissionDenied) => {
                debug!("cannot acknowledge help in {}", room_id);
                Ok(DeliveryOutcome::DeliveredPrimary)
            }
            Err(error) => Err(error),
        }
    }

    async fn notify_failure(
        &self,
        actor: &ActorContext,
    ) -> Result<DeliveryOutcome, DeliveryError> {
        warn!("cannot send help to {} privately", actor.user_id);

        // The direct chat itself refused, there is nowhere else to report
        let Surface::Room { room_id } = &actor.surface else {
            return Ok(DeliveryOutcome::FailedSilent);
        };

        match self.transport.send_origin(room_id, &format_dm_failed()).await {
            Ok(()) => Ok(DeliveryOutcome::DeliveredFallbackNone),
            Err(DeliveryError::PermissionDenied) => {
                debug!("cannot report failed help delivery in {}", room_id);
                Ok(DeliveryOutcome::FailedSilent)
            }
            Err(error) => Err(error),
        }
    }
}
