//! Command registry for the bot.
//!
//! Commands live in an arena of [`CommandNode`] records indexed by a stable
//! [`CommandId`]. Groups hold the ids of their children, so walking a qualified
//! name from the root never needs shared ownership between nodes.
//!
//! # Overview
//!
//! ```text
//! root (id 0, unnamed group)
//!  ├── help        [Help]
//!  ├── vote        [Misc]
//!  ├── ...
//!  └── template    [Templates] (group)
//!       ├── add
//!       ├── remove
//!       └── list
//! ```
//!
//! The help subsystem only reads from the registry through the
//! [`CommandRegistry`] trait. The `enabled` and `hidden` flags can still be
//! flipped at runtime (the `donate` command hides itself when no donation link
//! is configured), so they are stored as atomics.

mod arena;
mod cooldown;

use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use crate::help::{ActorContext, Surface};

pub use crate::registry::arena::{CommandSpec, Registry, RegistryError};
pub use crate::registry::cooldown::CooldownTracker;

/// Stable index of a node inside the [`Registry`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(pub(crate) usize);

/// Requirement an actor has to meet to run a command.
///
/// Evaluating a check never mutates anything, which lets the help system call
/// it for every listed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapabilityCheck {
    /// Anybody can run the command
    #[default]
    Everyone,
    /// Only from a shared room, never from a direct chat
    RoomOnly,
}

impl CapabilityCheck {
    /// Returns `true` if `actor` satisfies the requirement.
    pub fn allows(&self, actor: &ActorContext) -> bool {
        match self {
            CapabilityCheck::Everyone => true,
            CapabilityCheck::RoomOnly => matches!(actor.surface, Surface::Room { .. }),
        }
    }
}

/// Rate limit of a command: `rate` uses per `per` window, per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cooldown {
    pub rate: u32,
    pub per: Duration,
}

impl Cooldown {
    pub fn new(rate: u32, per: Duration) -> Self {
        Cooldown { rate, per }
    }
}

/// One registered command or group of commands.
#[derive(Debug)]
pub struct CommandNode {
    pub(crate) id: CommandId,
    pub(crate) qualified_name: String,
    pub(crate) short_doc: Option<String>,
    pub(crate) help: String,
    pub(crate) signature: Option<String>,
    pub(crate) category: Option<String>,
    pub(crate) capability: CapabilityCheck,
    pub(crate) cooldown: Option<Cooldown>,
    pub(crate) enabled: AtomicBool,
    pub(crate) hidden: AtomicBool,
    pub(crate) is_group: bool,
    pub(crate) children: Vec<CommandId>,
}

impl CommandNode {
    pub fn id(&self) -> CommandId {
        self.id
    }

    /// Space-separated path from the root, e.g. `template add`
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// First line of the help text, if any
    pub fn short_doc(&self) -> Option<&str> {
        self.short_doc.as_deref()
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    /// Argument signature, e.g. `<name>`
    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    /// Display category, `None` for ungrouped commands
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn capability(&self) -> CapabilityCheck {
        self.capability
    }

    pub fn cooldown(&self) -> Option<Cooldown> {
        self.cooldown
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn set_hidden(&self, hidden: bool) {
        self.hidden.store(hidden, Ordering::Relaxed);
    }

    pub fn is_group(&self) -> bool {
        self.is_group
    }

    pub fn children(&self) -> &[CommandId] {
        &self.children
    }
}

/// Read-only view of the command tree used by the help subsystem.
pub trait CommandRegistry {
    /// The unnamed root group
    fn root(&self) -> CommandId;
    /// Looks a node up by id
    fn node(&self, id: CommandId) -> Option<&CommandNode>;
    /// Resolves `name` (or one of its aliases) among the children of `parent`
    fn resolve_child(&self, parent: CommandId, name: &str) -> Option<CommandId>;
    /// Every descendant of `id`, depth-first, without `id` itself
    fn walk(&self, id: CommandId) -> Vec<CommandId>;
    /// Side-effect-free capability predicate
    fn can_invoke(&self, id: CommandId, actor: &ActorContext) -> bool;

    /// Direct children of `id`, in registration order
    fn children(&self, id: CommandId) -> Vec<CommandId> {
        self.node(id)
            .map(|node| node.children().to_vec())
            .unwrap_or_default()
    }

    /// Direct children of the root, i.e. every top-level command
    fn top_level(&self) -> Vec<CommandId> {
        self.children(self.root())
    }

    /// Distinct category names used anywhere in the tree, sorted
    fn categories(&self) -> Vec<String> {
        let mut categories = self
            .walk(self.root())
            .into_iter()
            .filter_map(|id| self.node(id)?.category().map(str::to_owned))
            .collect::<Vec<String>>();
        categories.sort();
        categories.dedup();
        categories
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(surface: Surface, is_owner: bool) -> ActorContext {
        ActorContext {
            user_id: "@alice:example.com".to_owned(),
            surface,
            prefix: "!pb ".to_owned(),
            is_owner,
        }
    }

    #[test]
    fn test_capability_everyone() {
        assert!(CapabilityCheck::Everyone.allows(&actor(Surface::Private, false)));
        assert!(CapabilityCheck::Everyone.allows(&actor(Surface::room("!r:example.com"), false)));
    }

    #[test]
    fn test_capability_surfaces() {
        let in_room = actor(Surface::room("!r:example.com"), false);
        let in_private = actor(Surface::Private, false);

        assert!(CapabilityCheck::RoomOnly.allows(&in_room));
        assert!(!CapabilityCheck::RoomOnly.allows(&in_private));
        // owners get no exception
        assert!(!CapabilityCheck::RoomOnly.allows(&actor(Surface::Private, true)));
    }
}
