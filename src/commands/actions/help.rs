//! Help command handler.
//!
//! The help subsystem delivers the message itself, privately. The only reply
//! left for the room is the not-found error of an unknown reference.

use log::{debug, error};

use crate::{
    commands::CommandResult,
    help::{ActorContext, HelpError, HelpService, Transport},
    registry::CommandRegistry,
};

/// Sends help for `reference` (every command when blank) to the actor.
pub async fn handle_help<R: CommandRegistry, T: Transport>(
    help_service: &HelpService<R, T>,
    actor: &ActorContext,
    reference: &str,
) -> Option<CommandResult> {
    debug!("handling help command for `{}`", reference);

    match help_service.render_help(actor, Some(reference)).await {
        Ok(_) => None,
        Err(e @ HelpError::CommandNotFound(_)) => Some(CommandResult::new(e.to_string())),
        Err(e @ HelpError::DeliveryFatal(_)) => {
            error!("help for {} failed: {}", actor.user_id, e);
            None
        }
    }
}
