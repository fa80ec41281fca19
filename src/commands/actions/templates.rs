//! Template management handlers.
//!
//! All three run in a room only; the commander has checked that before
//! calling them.

use log::debug;
use tokio::sync::Mutex;

use crate::{
    commands::{
        CommandResult,
        markdown_response::{
            format_invalid_template_name, format_missing_argument, format_template_added,
            format_template_exists, format_template_not_found, format_template_removed,
            format_templates,
        },
    },
    registry::CommandNode,
    templates::{TemplateCatalog, is_valid_template_name},
};

/// Extracts the single `<name>` argument, or the usage hint to reply with.
fn template_name<'a>(
    args: &'a [String],
    node: &CommandNode,
    prefix: &str,
) -> Result<&'a str, CommandResult> {
    let Some(name) = args.first() else {
        return Err(CommandResult::new(format_missing_argument(
            prefix,
            node.qualified_name(),
            node.signature().unwrap_or_default(),
        )));
    };

    if !is_valid_template_name(name) {
        return Err(CommandResult::new(format_invalid_template_name(name)));
    }
    Ok(name)
}

pub async fn handle_template_add(
    catalog: &Mutex<TemplateCatalog>,
    room_id: &str,
    args: &[String],
    node: &CommandNode,
    prefix: &str,
) -> Option<CommandResult> {
    let name = match template_name(args, node, prefix) {
        Ok(name) => name,
        Err(result) => return Some(result),
    };
    debug!("adding template {} to {}", name, room_id);

    let response = match catalog.lock().await.add(room_id, name).await {
        true => format_template_added(name, prefix),
        false => format_template_exists(name),
    };
    Some(CommandResult::new(response))
}

pub async fn handle_template_remove(
    catalog: &Mutex<TemplateCatalog>,
    room_id: &str,
    args: &[String],
    node: &CommandNode,
    prefix: &str,
) -> Option<CommandResult> {
    let name = match template_name(args, node, prefix) {
        Ok(name) => name,
        Err(result) => return Some(result),
    };
    debug!("removing template {} from {}", name, room_id);

    let response = match catalog.lock().await.remove(room_id, name).await {
        true => format_template_removed(name),
        false => format_template_not_found(name),
    };
    Some(CommandResult::new(response))
}

pub async fn handle_template_list(
    catalog: &Mutex<TemplateCatalog>,
    room_id: &str,
    prefix: &str,
) -> Option<CommandResult> {
    let names = catalog.lock().await.templates(room_id);
    Some(CommandResult::new(format_templates(&names, prefix)))
}
