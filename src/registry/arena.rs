//! Arena-backed implementation of [`CommandRegistry`].

use std::{collections::HashMap, sync::atomic::AtomicBool};

use log::debug;
use thiserror::Error;

use crate::{
    help::ActorContext,
    registry::{CapabilityCheck, CommandId, CommandNode, CommandRegistry, Cooldown},
};

/// Errors raised while building the command tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The parent id does not exist or is not a group
    #[error("parent {0:?} is not a registered group")]
    InvalidParent(CommandId),
    /// A sibling already answers to this name or alias
    #[error("`{0}` is already registered under this group")]
    Duplicate(String),
}

/// Declarative description of a command before registration.
///
/// # Examples
///
/// ```ignore
/// let spec = CommandSpec::new("vote")
///     .aliases(["upvote"])
///     .help("Gives you a link to upvote the bot")
///     .category("Misc");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommandSpec {
    name: String,
    aliases: Vec<String>,
    help: String,
    signature: Option<String>,
    category: Option<String>,
    capability: CapabilityCheck,
    cooldown: Option<Cooldown>,
    enabled: bool,
    hidden: bool,
    is_group: bool,
}

impl CommandSpec {
    pub fn new(name: &str) -> Self {
        CommandSpec {
            name: name.to_owned(),
            enabled: true,
            ..Default::default()
        }
    }

    /// Same as [`CommandSpec::new`] but the node can hold subcommands.
    pub fn group(name: &str) -> Self {
        CommandSpec {
            is_group: true,
            ..CommandSpec::new(name)
        }
    }

    pub fn aliases<'a>(mut self, aliases: impl IntoIterator<Item = &'a str>) -> Self {
        self.aliases = aliases.into_iter().map(str::to_owned).collect();
        self
    }

    pub fn help(mut self, help: &str) -> Self {
        self.help = help.to_owned();
        self
    }

    pub fn signature(mut self, signature: &str) -> Self {
        self.signature = Some(signature.to_owned());
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.category = Some(category.to_owned());
        self
    }

    pub fn capability(mut self, capability: CapabilityCheck) -> Self {
        self.capability = capability;
        self
    }

    pub fn cooldown(mut self, cooldown: Cooldown) -> Self {
        self.cooldown = Some(cooldown);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// The command tree.
///
/// Node `0` is the unnamed root group. Names and aliases are resolved per group
/// through a single lookup table keyed by `(parent, name)`.
#[derive(Debug)]
pub struct Registry {
    nodes: Vec<CommandNode>,
    lookup: HashMap<(CommandId, String), CommandId>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        let root = CommandNode {
            id: CommandId(0),
            qualified_name: String::new(),
            short_doc: None,
            help: String::new(),
            signature: None,
            category: None,
            capability: CapabilityCheck::Everyone,
            cooldown: None,
            enabled: AtomicBool::new(true),
            hidden: AtomicBool::new(true),
            is_group: true,
            children: Vec::new(),
        };

        Registry {
            nodes: vec![root],
            lookup: HashMap::new(),
        }
    }

    /// Registers `spec` under `parent` and returns the id of the new node.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::InvalidParent`] if `parent` is unknown or not a group
    /// - [`RegistryError::Duplicate`] if the name or an alias clashes with a sibling
    pub fn register(
        &mut self,
        parent: CommandId,
        spec: CommandSpec,
    ) -> Result<CommandId, RegistryError> {
        let parent_node = self
            .nodes
            .get(parent.0)
            .filter(|n| n.is_group)
            .ok_or(RegistryError::InvalidParent(parent))?;

        for key in std::iter::once(&spec.name).chain(spec.aliases.iter()) {
            if self.lookup.contains_key(&(parent, key.clone())) {
                return Err(RegistryError::Duplicate(key.clone()));
            }
        }

        let qualified_name = match parent_node.qualified_name.is_empty() {
            true => spec.name.clone(),
            false => format!("{} {}", parent_node.qualified_name, spec.name),
        };
        // Subcommands inherit the category of their group unless they set one
        let category = spec.category.or_else(|| parent_node.category.clone());

        let id = CommandId(self.nodes.len());
        let short_doc = spec
            .help
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_owned);

        debug!("register command `{}` as {:?}", qualified_name, id);

        for key in std::iter::once(&spec.name).chain(spec.aliases.iter()) {
            self.lookup.insert((parent, key.clone()), id);
        }
        self.nodes.push(CommandNode {
            id,
            qualified_name,
            short_doc,
            help: spec.help,
            signature: spec.signature,
            category,
            capability: spec.capability,
            cooldown: spec.cooldown,
            enabled: AtomicBool::new(spec.enabled),
            hidden: AtomicBool::new(spec.hidden),
            is_group: spec.is_group,
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);

        Ok(id)
    }

    /// Finds a node by its full qualified name, e.g. `template add`.
    #[cfg(test)]
    pub fn find(&self, qualified_name: &str) -> Option<&CommandNode> {
        let mut current = self.root();
        for segment in qualified_name.split_whitespace() {
            current = self.resolve_child(current, segment)?;
        }
        self.node(current).filter(|n| n.id != self.root())
    }
}

impl CommandRegistry for Registry {
    fn root(&self) -> CommandId {
        CommandId(0)
    }

    fn node(&self, id: CommandId) -> Option<&CommandNode> {
        self.nodes.get(id.0)
    }

    fn resolve_child(&self, parent: CommandId, name: &str) -> Option<CommandId> {
        self.lookup.get(&(parent, name.to_owned())).copied()
    }

    fn walk(&self, id: CommandId) -> Vec<CommandId> {
        let mut walked = Vec::new();
        let mut stack: Vec<CommandId> = match self.node(id) {
            Some(node) => node.children.iter().rev().copied().collect(),
            None => return walked,
        };

        while let Some(current) = stack.pop() {
            walked.push(current);
            if let Some(node) = self.node(current) {
                stack.extend(node.children.iter().rev().copied());
            }
        }

        walked
    }

    fn can_invoke(&self, id: CommandId, actor: &ActorContext) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        node.capability.allows(actor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::help::Surface;

    fn create_test_registry() -> Registry {
        let mut registry = Registry::new();
        let root = registry.root();
        registry
            .register(
                root,
                CommandSpec::new("vote")
                    .aliases(["upvote"])
                    .help("Gives you a link to upvote the bot\n\nLonger text.")
                    .category("Misc"),
            )
            .unwrap();
        let template = registry
            .register(root, CommandSpec::group("template").category("Profiles"))
            .unwrap();
        registry
            .register(template, CommandSpec::new("add").signature("<name>"))
            .unwrap();
        registry
            .register(template, CommandSpec::new("list"))
            .unwrap();
        registry
    }

    #[test]
    fn test_register_builds_qualified_names() {
        let registry = create_test_registry();

        let add = registry.find("template add").unwrap();
        assert_eq!(add.qualified_name(), "template add");
        assert_eq!(add.signature(), Some("<name>"));
        // inherited from the group
        assert_eq!(add.category(), Some("Profiles"));
    }

    #[test]
    fn test_register_extracts_short_doc() {
        let registry = create_test_registry();
        let vote = registry.find("vote").unwrap();

        assert_eq!(vote.short_doc(), Some("Gives you a link to upvote the bot"));
        assert!(vote.help().contains("Longer text."));
        assert!(registry.find("template list").unwrap().short_doc().is_none());
    }

    #[test]
    fn test_resolve_child_by_alias() {
        let registry = create_test_registry();
        let root = registry.root();

        let by_name = registry.resolve_child(root, "vote");
        let by_alias = registry.resolve_child(root, "upvote");
        assert!(by_name.is_some());
        assert_eq!(by_name, by_alias);
        assert!(registry.resolve_child(root, "add").is_none());
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = create_test_registry();
        let root = registry.root();

        assert_eq!(
            registry.register(root, CommandSpec::new("upvote")),
            Err(RegistryError::Duplicate("upvote".to_owned()))
        );
        assert_eq!(
            registry.register(root, CommandSpec::new("poll").aliases(["vote"])),
            Err(RegistryError::Duplicate("vote".to_owned()))
        );
    }

    #[test]
    fn test_register_rejects_leaf_parent() {
        let mut registry = create_test_registry();
        let vote = registry.find("vote").unwrap().id();

        assert_eq!(
            registry.register(vote, CommandSpec::new("again")),
            Err(RegistryError::InvalidParent(vote))
        );
    }

    #[test]
    fn test_walk_is_depth_first() {
        let registry = create_test_registry();

        let names: Vec<&str> = registry
            .walk(registry.root())
            .into_iter()
            .map(|id| registry.node(id).unwrap().qualified_name())
            .collect();
        assert_eq!(names, vec!["vote", "template", "template add", "template list"]);

        let template = registry.find("template").unwrap().id();
        assert_eq!(registry.walk(template).len(), 2);
    }

    #[test]
    fn test_children_and_categories() {
        let registry = create_test_registry();
        let template = registry.find("template").unwrap().id();

        assert_eq!(registry.top_level().len(), 2);
        assert_eq!(registry.children(template).len(), 2);
        assert_eq!(
            registry.categories(),
            vec!["Misc".to_owned(), "Profiles".to_owned()]
        );
    }

    #[test]
    fn test_can_invoke_uses_capability() {
        let mut registry = create_test_registry();
        let root = registry.root();
        let id = registry
            .register(
                root,
                CommandSpec::new("clear").capability(CapabilityCheck::RoomOnly),
            )
            .unwrap();
        let actor = ActorContext {
            user_id: "@alice:example.com".to_owned(),
            surface: Surface::Private,
            prefix: "!pb ".to_owned(),
            is_owner: false,
        };

        assert!(!registry.can_invoke(id, &actor));
        assert!(registry.can_invoke(registry.find("vote").unwrap().id(), &actor));
    }

    #[test]
    fn test_runtime_flags_toggle() {
        let registry = create_test_registry();
        let vote = registry.find("vote").unwrap();

        assert!(vote.is_enabled());
        assert!(!vote.is_hidden());
        vote.set_enabled(false);
        vote.set_hidden(true);
        assert!(!registry.find("vote").unwrap().is_enabled());
        assert!(registry.find("vote").unwrap().is_hidden());
    }
}
