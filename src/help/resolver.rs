//! Resolution of a free-text command reference against the registry.

use log::debug;

use crate::{
    help::HelpError,
    registry::{CommandId, CommandRegistry},
};

/// What a help reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    /// Empty reference: list every top-level command
    All,
    /// A group and, through it, its subcommands
    Group(CommandId),
    /// A single leaf command
    Command(CommandId),
}

/// Walks `reference` segment by segment from the registry root.
///
/// Segments are separated by any whitespace and matched against names and
/// aliases of the current node's children.
///
/// # Errors
///
/// Returns [`HelpError::CommandNotFound`] with the whole original reference
/// as soon as one segment does not resolve.
pub fn resolve<R: CommandRegistry + ?Sized>(
    registry: &R,
    reference: &str,
) -> Result<Resolved, HelpError> {
    let mut segments = reference.split_whitespace().peekable();
    if segments.peek().is_none() {
        return Ok(Resolved::All);
    }

    let mut current = registry.root();
    for segment in segments {
        current = registry
            .resolve_child(current, segment)
            .ok_or_else(|| HelpError::CommandNotFound(reference.to_owned()))?;
    }

    debug!("resolved `{}` to {:?}", reference, current);

    match registry.node(current) {
        Some(node) if node.is_group() => Ok(Resolved::Group(current)),
        Some(_) => Ok(Resolved::Command(current)),
        None => Err(HelpError::CommandNotFound(reference.to_owned())),
    }
}
