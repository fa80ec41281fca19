use log::{error, info};

use crate::{
    commands::{
        CommandResult,
        markdown_response::{format_clear_refused, format_cleared, format_perks},
    },
    help::{DeliveryError, Transport},
};

/// How far back `clear` looks for messages of the bot.
const CLEAR_LIMIT: u32 = 100;

/// Repeats `args` back, or stays silent when there is nothing to repeat.
pub fn handle_echo(args: &[String]) -> Option<CommandResult> {
    match args.is_empty() {
        true => None,
        false => Some(CommandResult::new(args.join(" "))),
    }
}

pub fn handle_perks(prefix: &str) -> Option<CommandResult> {
    Some(CommandResult::new(format_perks(prefix)))
}

/// Redacts the recent messages of the bot in `room_id`.
pub async fn handle_clear<T: Transport>(transport: &T, room_id: &str) -> Option<CommandResult> {
    match transport.clear_own_messages(room_id, CLEAR_LIMIT).await {
        Ok(count) => {
            info!("cleared {} messages in {}", count, room_id);
            Some(CommandResult::new(format_cleared(count)))
        }
        Err(DeliveryError::PermissionDenied) => Some(CommandResult::new(format_clear_refused())),
        Err(e) => {
            error!("failed to clear messages in {}: {}", room_id, e);
            None
        }
    }
}
