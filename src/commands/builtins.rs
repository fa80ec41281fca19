//! The built-in command tree of the bot.

use std::{collections::HashMap, time::Duration};

use crate::registry::{
    CapabilityCheck, CommandId, CommandRegistry, CommandSpec, Cooldown, Registry, RegistryError,
};

/// Handler attached to a registered command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Help,
    Vote,
    Github,
    Donate,
    Invite,
    Server,
    Echo,
    Perks,
    Clear,
    Stats,
    TemplateAdd,
    TemplateRemove,
    TemplateList,
}

/// Registry of the bot plus the handler of every runnable command.
///
/// Groups have no handler; invoking one shows its help.
pub struct CommandTable {
    pub registry: Registry,
    pub handlers: HashMap<CommandId, Builtin>,
}

/// Registers every built-in command.
///
/// # Errors
///
/// Fails only if two built-ins clash, which is a programming error.
pub fn build_command_table() -> Result<CommandTable, RegistryError> {
    let mut registry = Registry::new();
    let mut handlers = HashMap::new();
    let root = registry.root();
    let misc_cooldown = Cooldown::new(1, Duration::from_secs(5));

    let help = registry.register(
        root,
        CommandSpec::new("help")
            .aliases(["commands"])
            .help("Gives you the help for the bot, or for one command")
            .signature("[command]")
            .category("Help")
            .hidden(),
    )?;
    handlers.insert(help, Builtin::Help);

    let misc: [(CommandSpec, Builtin); 9] = [
        (
            CommandSpec::new("vote")
                .aliases(["upvote"])
                .help("Gives you a link to upvote the bot"),
            Builtin::Vote,
        ),
        (
            CommandSpec::new("github")
                .aliases(["git", "code"])
                .help("Gives you a link to the bot's code repository"),
            Builtin::Github,
        ),
        (
            CommandSpec::new("donate")
                .aliases(["patreon", "paypal"])
                .help("Gives you the creator's donation links"),
            Builtin::Donate,
        ),
        (
            CommandSpec::new("invite").help("Gives you an invite link for the bot"),
            Builtin::Invite,
        ),
        (
            CommandSpec::new("server")
                .aliases(["guild", "support"])
                .help("Gives you a link to the support room"),
            Builtin::Server,
        ),
        (
            CommandSpec::new("echo")
                .help("Echos a saying")
                .signature("<content>")
                .hidden(),
            Builtin::Echo,
        ),
        (
            CommandSpec::new("perks")
                .help("Shows you the perks associated with different support tiers")
                .disabled(),
            Builtin::Perks,
        ),
        (
            CommandSpec::new("clear")
                .aliases(["clean"])
                .help("Clears the bot's messages from chat")
                .capability(CapabilityCheck::RoomOnly),
            Builtin::Clear,
        ),
        (
            CommandSpec::new("stats")
                .aliases(["status"])
                .help("Gives you the stats for the bot"),
            Builtin::Stats,
        ),
    ];
    for (spec, builtin) in misc {
        let id = registry.register(root, spec.category("Misc").cooldown(misc_cooldown))?;
        handlers.insert(id, builtin);
    }

    let template = registry.register(
        root,
        CommandSpec::group("template")
            .help("Manages the profile templates of this room")
            .category("Templates"),
    )?;
    let templates: [(CommandSpec, Builtin); 3] = [
        (
            CommandSpec::new("add")
                .help("Adds a profile template to this room\n\nThe template is then listed under Profiles in the help of the room.")
                .signature("<name>")
                .capability(CapabilityCheck::RoomOnly),
            Builtin::TemplateAdd,
        ),
        (
            CommandSpec::new("remove")
                .aliases(["delete"])
                .help("Removes a profile template from this room")
                .signature("<name>")
                .capability(CapabilityCheck::RoomOnly),
            Builtin::TemplateRemove,
        ),
        (
            CommandSpec::new("list")
                .help("Lists the profile templates of this room")
                .capability(CapabilityCheck::RoomOnly),
            Builtin::TemplateList,
        ),
    ];
    for (spec, builtin) in templates {
        let id = registry.register(template, spec)?;
        handlers.insert(id, builtin);
    }

    Ok(CommandTable { registry, handlers })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_command_table() {
        let table = build_command_table().unwrap();
        let registry = &table.registry;

        let help = registry.find("commands").unwrap();
        assert_eq!(help.qualified_name(), "help");
        assert!(help.is_hidden());
        assert_eq!(table.handlers.get(&help.id()), Some(&Builtin::Help));

        let perks = registry.find("perks").unwrap();
        assert!(!perks.is_enabled());
        assert!(perks.cooldown().is_some());

        let remove = registry.find("template delete").unwrap();
        assert_eq!(remove.qualified_name(), "template remove");
        assert_eq!(remove.category(), Some("Templates"));
        assert_eq!(remove.capability(), CapabilityCheck::RoomOnly);

        let clear = registry.find("clean").unwrap();
        assert_eq!(clear.qualified_name(), "clear");
        assert_eq!(clear.category(), Some("Misc"));
        assert_eq!(clear.capability(), CapabilityCheck::RoomOnly);
        assert_eq!(table.handlers.get(&clear.id()), Some(&Builtin::Clear));
    }

    #[test]
    fn test_every_leaf_has_a_handler() {
        let table = build_command_table().unwrap();
        let registry = &table.registry;

        for id in registry.walk(registry.root()) {
            let node = registry.node(id).unwrap();
            assert_eq!(
                table.handlers.contains_key(&id),
                !node.is_group(),
                "{}",
                node.qualified_name()
            );
        }
    }

    #[test]
    fn test_categories() {
        let table = build_command_table().unwrap();

        assert_eq!(
            table.registry.categories(),
            vec!["Help".to_owned(), "Misc".to_owned(), "Templates".to_owned()]
        );
    }
}
