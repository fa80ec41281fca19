//! Rendering of help output into a structured message.
//!
//! The [`RenderedMessage`] mirrors a rich "card": an author line, a colour,
//! titled fields and a footer. [`RenderedMessage::to_markdown`] flattens it
//! into the Markdown body sent over Matrix.

use log::debug;
use rand::{Rng, seq::SliceRandom};

use crate::{
    commands::markdown_response::{format_help_intro, format_no_help},
    help::{ActorContext, grouping::CategoryBlock},
    registry::CommandNode,
};

/// Heading of the field listing the room's profile templates.
pub const PROFILES_HEADING: &str = "Profiles";

/// Display identity of the bot, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    /// Matrix user ID, also the canonical mention of the bot
    pub user_id: String,
    /// Display name, also used in the nickname mention `Name: `
    pub display_name: String,
    /// `mxc://` URI of the avatar, if one is set
    pub avatar_url: Option<String>,
}

/// Configuration-driven inputs of the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSettings {
    /// Product name used in footers
    pub bot_name: String,
    /// Who gets the "made by" credit
    pub creator: String,
    /// Prefix that replaces self-mentions in footers
    pub default_prefix: String,
    /// Adds the vote footer
    pub vote_enabled: bool,
    /// Adds the donation footer
    pub donate_enabled: bool,
    /// Official room link, adds the community footer and prefixes single-command help
    pub guild_invite: Option<String>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            bot_name: "ProfileBot".to_owned(),
            creator: "the ProfileBot team".to_owned(),
            default_prefix: "!pb ".to_owned(),
            vote_enabled: false,
            donate_enabled: false,
            guild_invite: None,
        }
    }
}

/// A structured help message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub title: String,
    pub author: String,
    pub author_icon: Option<String>,
    /// RGB colour, never `0`
    pub color: u32,
    /// Ordered `(heading, body)` pairs
    pub fields: Vec<(String, String)>,
    pub footer: String,
    /// Free text sent before the card
    pub content: Option<String>,
}

impl RenderedMessage {
    /// Flattens the message into Matrix-flavoured Markdown.
    ///
    /// The colour is carried by a `<font>` tag around the author line, which
    /// Matrix clients render from the HTML body.
    pub fn to_markdown(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        if let Some(content) = &self.content {
            parts.push(content.clone());
        }
        parts.push(format!(
            "<font color=\"#{:06x}\">**{}**</font> · {}",
            self.color, self.author, self.title
        ));
        for (heading, body) in &self.fields {
            // hard line breaks so each command stays on its own line
            parts.push(format!("#### {}\n{}", heading, body.replace('\n', "  \n")));
        }
        parts.push(format!("---\n*{}*", self.footer));

        parts.join("\n\n")
    }
}

/// One help line: `prefix + qualified name - *short doc*`.
pub fn help_line(prefix: &str, node: &CommandNode) -> String {
    match node.short_doc() {
        Some(short_doc) => format!("{}{} - *{}*", prefix, node.qualified_name(), short_doc),
        None => format!("{}{}", prefix, node.qualified_name()),
    }
}

/// Builds [`RenderedMessage`]s for the help subsystem.
#[derive(Debug, Clone)]
pub struct Renderer {
    identity: BotIdentity,
    settings: RenderSettings,
}

impl Renderer {
    pub fn new(identity: BotIdentity, settings: RenderSettings) -> Self {
        Renderer { identity, settings }
    }

    /// Footer candidates for `prefix`, before any random choice.
    ///
    /// The credit and invite footers are always present, the others only when
    /// their configuration key is set.
    pub fn footer_candidates(&self, prefix: &str) -> Vec<String> {
        let name = &self.settings.bot_name;
        let mut candidates = vec![
            format!("{} - Made by {}", name, self.settings.creator),
            format!("{} - Add me to your own room! ({}invite)", name, prefix),
        ];

        if self.settings.vote_enabled {
            candidates.push(format!(
                "{} - Add a vote on the bot list! ({}vote)",
                name, prefix
            ));
        }
        if self.settings.donate_enabled {
            candidates.push(format!("{} - Support me on Patreon! ({}patreon)", name, prefix));
        }
        if self.settings.guild_invite.is_some() {
            candidates.push(format!(
                "{} - Join the official Matrix room! ({}server)",
                name, prefix
            ));
        }

        candidates
    }

    /// Picks a footer uniformly and normalizes self-mentions in it.
    pub fn choose_footer<G: Rng>(&self, prefix: &str, rng: &mut G) -> String {
        let candidates = self.footer_candidates(prefix);
        let footer = candidates
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| self.settings.bot_name.clone());

        self.normalize_mentions(&footer)
    }

    /// Replaces mentions of the bot with the default prefix.
    ///
    /// The nickname form `Name: ` is first rewritten to the canonical form
    /// `@bot:server `, which is then rewritten to the default prefix.
    pub fn normalize_mentions(&self, text: &str) -> String {
        let nickname = format!("{}: ", self.identity.display_name);
        let canonical = format!("{} ", self.identity.user_id);

        text.replace(&nickname, &canonical)
            .replace(&canonical, &self.settings.default_prefix)
    }

    /// Help for a single leaf command.
    pub fn render_command<G: Rng>(
        &self,
        actor: &ActorContext,
        node: &CommandNode,
        rng: &mut G,
    ) -> RenderedMessage {
        debug!("render help of `{}`", node.qualified_name());

        let mut message = self.base_message(actor, rng);
        message.fields.push(self.detail_field(actor, node));
        message.content = self.settings.guild_invite.clone();

        message
    }

    /// Help listing every category, optionally headed by a group's own help.
    ///
    /// # Arguments
    ///
    /// * `group` - The resolved group, `None` for the full listing
    /// * `blocks` - Visible commands, already grouped and ordered
    /// * `profiles` - Profile templates of the room the request came from
    pub fn render_listing<G: Rng>(
        &self,
        actor: &ActorContext,
        group: Option<&CommandNode>,
        blocks: &[CategoryBlock],
        profiles: &[String],
        rng: &mut G,
    ) -> RenderedMessage {
        debug!(
            "render help listing with {} categories for {}",
            blocks.len(),
            actor.user_id
        );

        let mut message = self.base_message(actor, rng);
        message.content = Some(format_help_intro());

        if let Some(group) = group {
            message.fields.push(self.detail_field(actor, group));
        }
        for block in blocks {
            message
                .fields
                .push((block.name.clone(), block.render(&actor.prefix)));
        }
        if let Some(field) = profiles_field(&actor.prefix, profiles) {
            message.fields.push(field);
        }

        message
    }

    fn base_message<G: Rng>(&self, actor: &ActorContext, rng: &mut G) -> RenderedMessage {
        RenderedMessage {
            title: "Help".to_owned(),
            author: self.identity.display_name.clone(),
            author_icon: self.identity.avatar_url.clone(),
            color: rng.gen_range(1..=0xFF_FF_FF),
            fields: Vec::new(),
            footer: self.choose_footer(&actor.prefix, rng),
            content: None,
        }
    }

    fn detail_field(&self, actor: &ActorContext, node: &CommandNode) -> (String, String) {
        let heading = match node.signature() {
            Some(signature) => format!("{}{} {}", actor.prefix, node.qualified_name(), signature),
            None => format!("{}{}", actor.prefix, node.qualified_name()),
        };
        let body = match node.help().trim() {
            "" => format_no_help(),
            help => help.to_owned(),
        };

        (heading, body)
    }
}

/// Lists the profile command names each template of a room stands for.
fn profiles_field(prefix: &str, profiles: &[String]) -> Option<(String, String)> {
    if profiles.is_empty() {
        return None;
    }

    let mut names: Vec<&String> = profiles.iter().collect();
    names.sort_by_cached_key(|name| (name.to_lowercase(), (*name).clone()));
    let body = names
        .iter()
        .map(|name| {
            format!(
                "{prefix}get{name}, {prefix}set{name}, {prefix}edit{name}",
                prefix = prefix,
                name = name
            )
        })
        .collect::<Vec<String>>()
        .join("\n");

    Some((PROFILES_HEADING.to_owned(), body))
}
