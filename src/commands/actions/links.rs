//! Handlers answering with one of the configured links.

use log::{debug, warn};

use crate::{
    commands::{
        CommandResult, CommandSettings,
        markdown_response::{format_donate, format_github, format_invite, format_vote},
    },
    registry::CommandNode,
    utils::localpart,
};

pub fn handle_vote(settings: &CommandSettings, prefix: &str) -> Option<CommandResult> {
    debug!("handling vote command");

    let bot = settings
        .links
        .dbl_vanity
        .as_deref()
        .unwrap_or_else(|| localpart(&settings.bot_user_id));
    let vote_url = format!("https://top.gg/bot/{}/vote", bot);

    Some(CommandResult::new(format_vote(&vote_url, prefix)))
}

pub fn handle_github(settings: &CommandSettings) -> Option<CommandResult> {
    Some(CommandResult::new(format_github(
        settings.links.github.as_deref(),
    )))
}

/// Replies with the donation links.
///
/// With no link configured the command switches itself off: it is disabled
/// and hidden from the help output for the rest of the process lifetime.
pub fn handle_donate(
    settings: &CommandSettings,
    node: &CommandNode,
    prefix: &str,
) -> Option<CommandResult> {
    let links = format_donate(
        settings.links.patreon.as_deref(),
        settings.links.paypal.as_deref(),
        prefix,
    );

    if links.is_none() {
        warn!("no donation link configured, disabling `{}`", node.qualified_name());
        node.set_enabled(false);
        node.set_hidden(true);
    }

    links.map(CommandResult::new)
}

pub fn handle_invite(settings: &CommandSettings) -> Option<CommandResult> {
    Some(CommandResult::new(format_invite(&settings.bot_user_id)))
}

/// Replies with the support room link, or stays silent without one.
pub fn handle_server(settings: &CommandSettings) -> Option<CommandResult> {
    settings.links.guild_invite.clone().map(CommandResult::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::LinksConfig,
        registry::{CommandRegistry, CommandSpec, Registry},
    };

    fn create_test_settings(links: LinksConfig) -> CommandSettings {
        CommandSettings {
            bot_user_id: "@profilebot:example.com".to_owned(),
            bot_name: "ProfileBot".to_owned(),
            default_prefix: "!pb ".to_owned(),
            links,
            ..Default::default()
        }
    }

    #[test]
    fn test_handle_vote_prefers_vanity() {
        let settings = create_test_settings(LinksConfig {
            dbl_vanity: Some("profiles".to_owned()),
            ..Default::default()
        });

        let result = handle_vote(&settings, "!pb ").unwrap();
        assert!(result.response.starts_with("<https://top.gg/bot/profiles/vote>"));

        let result = handle_vote(&create_test_settings(LinksConfig::default()), "!pb ").unwrap();
        assert!(result.response.starts_with("<https://top.gg/bot/profilebot/vote>"));
    }

    #[test]
    fn test_handle_donate_without_links_disables_itself() {
        let mut registry = Registry::new();
        let root = registry.root();
        let id = registry
            .register(root, CommandSpec::new("donate").category("Misc"))
            .unwrap();
        let node = registry.node(id).unwrap();
        let settings = create_test_settings(LinksConfig::default());

        assert_eq!(handle_donate(&settings, node, "!pb "), None);
        assert!(!node.is_enabled());
        assert!(node.is_hidden());
    }

    #[test]
    fn test_handle_donate_with_links() {
        let mut registry = Registry::new();
        let root = registry.root();
        let id = registry.register(root, CommandSpec::new("donate")).unwrap();
        let node = registry.node(id).unwrap();
        let settings = create_test_settings(LinksConfig {
            patreon: Some("https://patreon.com/profilebot".to_owned()),
            ..Default::default()
        });

        let result = handle_donate(&settings, node, "!pb ").unwrap();
        assert!(result.response.contains("<https://patreon.com/profilebot>"));
        assert!(node.is_enabled());
    }

    #[test]
    fn test_handle_server() {
        assert_eq!(handle_server(&create_test_settings(LinksConfig::default())), None);

        let settings = create_test_settings(LinksConfig {
            guild_invite: Some("https://matrix.to/#/#profilebot:example.com".to_owned()),
            ..Default::default()
        });
        assert_eq!(
            handle_server(&settings),
            Some(CommandResult::new(
                "https://matrix.to/#/#profilebot:example.com".to_owned()
            ))
        );
    }

    #[test]
    fn test_handle_github_and_invite() {
        let settings = create_test_settings(LinksConfig {
            github: Some("https://github.com/example/profilebot".to_owned()),
            ..Default::default()
        });

        assert_eq!(
            handle_github(&settings).unwrap().response,
            "<https://github.com/example/profilebot>"
        );
        assert_eq!(
            handle_invite(&settings).unwrap().response,
            "Invite me to your room: <https://matrix.to/#/@profilebot:example.com>"
        );
    }
}
