//! Command orchestration and execution.
//!
//! The [`Commander`] owns the command registry and everything the handlers
//! share. Processing an incoming message takes two phases:
//!
//! 1. **Parsing** - [`Commander::parse`] recognizes the prefix and splits words
//! 2. **Execution** - [`Commander::execute`] resolves the command, runs the
//!    dispatch checks and routes to the handler
//!
//! ```text
//! Matrix Message → parse() → Invocation → execute() → Option<CommandResult>
//! ```

use std::{collections::HashMap, sync::Arc, time::Instant};

use log::{debug, info};
use tokio::sync::Mutex;

use crate::{
    commands::{
        CommandContext, CommandResult, CommandSettings, Invocation, PrefixMatcher,
        actions::{
            ProcessStats, handle_clear, handle_donate, handle_echo, handle_github, handle_help,
            handle_invite, handle_perks, handle_server, handle_stats, handle_template_add,
            handle_template_list, handle_template_remove, handle_vote,
        },
        builtins::{Builtin, CommandTable, build_command_table},
        markdown_response::{
            format_capability_refused, format_cooldown, format_disabled, format_unknown_command,
        },
    },
    help::{
        ActorContext, BotIdentity, CategoryOrder, HelpService, RenderSettings, Renderer, Surface,
        Transport,
    },
    registry::{
        CommandId, CommandNode, CommandRegistry, CooldownTracker, Registry, RegistryError,
    },
    templates::TemplateCatalog,
};

/// Parses and executes bot commands.
///
/// Shared between message tasks behind an `Arc`; the cooldown tracker, the
/// template catalog and the process sampler are its only mutable state.
pub struct Commander<T: Transport> {
    registry: Arc<Registry>,
    handlers: HashMap<CommandId, Builtin>,
    help_service: HelpService<Registry, T>,
    transport: Arc<T>,
    prefix_matcher: PrefixMatcher,
    settings: CommandSettings,
    cooldowns: Mutex<CooldownTracker>,
    catalog: Arc<Mutex<TemplateCatalog>>,
    process_stats: Mutex<ProcessStats>,
}

impl<T: Transport> Commander<T> {
    /// Builds the command table and the help subsystem.
    ///
    /// # Arguments
    ///
    /// * `settings` - Bot identity, owners and links
    /// * `identity` - How the bot account appears on the homeserver
    /// * `help_order` - Category ordering of the help output
    /// * `catalog` - Profile templates, shared with the help subsystem
    /// * `transport` - Delivery primitive used for help messages
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError`] if two built-in commands clash.
    pub fn new(
        settings: CommandSettings,
        identity: BotIdentity,
        help_order: CategoryOrder,
        catalog: Arc<Mutex<TemplateCatalog>>,
        transport: Arc<T>,
    ) -> Result<Self, RegistryError> {
        let CommandTable { registry, handlers } = build_command_table()?;
        let registry = Arc::new(registry);

        let prefix_matcher = PrefixMatcher::new(
            &settings.default_prefix,
            &identity.user_id,
            &identity.display_name,
        );
        let render_settings = RenderSettings {
            bot_name: settings.bot_name.clone(),
            creator: settings.creator.clone(),
            default_prefix: settings.default_prefix.clone(),
            vote_enabled: settings.links.dbl_token.is_some(),
            donate_enabled: settings.links.patreon.is_some(),
            guild_invite: settings.links.guild_invite.clone(),
        };
        let help_service = HelpService::new(
            Arc::clone(&registry),
            Renderer::new(identity, render_settings),
            help_order,
            Arc::clone(&catalog),
            Arc::clone(&transport),
        );

        info!(
            "{} commands registered in categories {:?}",
            handlers.len(),
            registry.categories()
        );

        Ok(Commander {
            registry,
            handlers,
            help_service,
            transport,
            prefix_matcher,
            settings,
            cooldowns: Mutex::new(CooldownTracker::new()),
            catalog,
            process_stats: Mutex::new(ProcessStats::new()),
        })
    }

    /// Returns the invocation in `body`, or `None` if the message is not for the bot.
    pub fn parse(&self, body: &str) -> Option<Invocation> {
        self.prefix_matcher.parse(body)
    }

    /// Runs `invocation` and returns the reply for the originating room.
    ///
    /// # Returns
    ///
    /// * `Some(CommandResult)` - A reply to send to `context.room_id`
    /// * `None` - Nothing to send, e.g. help was delivered privately
    pub async fn execute(
        &self,
        invocation: Invocation,
        context: &CommandContext,
    ) -> Option<CommandResult> {
        let actor = ActorContext {
            user_id: context.user_id.clone(),
            surface: match context.is_direct {
                true => Surface::Private,
                false => Surface::room(&context.room_id),
            },
            prefix: invocation.prefix.clone(),
            is_owner: self.settings.owners.contains(&context.user_id),
        };

        // A bare prefix asks for help
        if invocation.words.is_empty() {
            return handle_help(&self.help_service, &actor, "").await;
        }

        let Some((id, consumed)) = self.resolve(&invocation.words) else {
            debug!("unknown command {:?}", invocation.words);
            return Some(CommandResult::new(format_unknown_command(&actor.prefix)));
        };
        let node = self.registry.node(id)?;
        let args = &invocation.words[consumed..];

        if let Some(refusal) = self.check(node, &actor).await {
            return Some(refusal);
        }

        let Some(builtin) = self.handlers.get(&id) else {
            // Groups only show their own help
            return handle_help(&self.help_service, &actor, node.qualified_name()).await;
        };

        debug!("{} runs `{}`", actor.user_id, node.qualified_name());
        let prefix = actor.prefix.as_str();
        let settings = &self.settings;
        match builtin {
            Builtin::Help => {
                handle_help(&self.help_service, &actor, invocation.text_after(consumed)).await
            }
            Builtin::Vote => handle_vote(settings, prefix),
            Builtin::Github => handle_github(settings),
            Builtin::Donate => handle_donate(settings, node, prefix),
            Builtin::Invite => handle_invite(settings),
            Builtin::Server => handle_server(settings),
            Builtin::Echo => handle_echo(args),
            Builtin::Perks => handle_perks(prefix),
            Builtin::Clear => handle_clear(self.transport.as_ref(), &context.room_id).await,
            Builtin::Stats => handle_stats(
                &mut *self.process_stats.lock().await,
                settings,
                context.room_count,
            ),
            Builtin::TemplateAdd => {
                handle_template_add(&self.catalog, &context.room_id, args, node, prefix).await
            }
            Builtin::TemplateRemove => {
                handle_template_remove(&self.catalog, &context.room_id, args, node, prefix).await
            }
            Builtin::TemplateList => {
                handle_template_list(&self.catalog, &context.room_id, prefix).await
            }
        }
    }

    /// Walks `words` down the command tree as far as they name subcommands.
    ///
    /// Returns the deepest command found and how many words it took.
    fn resolve(&self, words: &[String]) -> Option<(CommandId, usize)> {
        let mut current = self.registry.root();
        let mut consumed = 0;

        for word in words {
            let is_group = self
                .registry
                .node(current)
                .is_some_and(CommandNode::is_group);
            let Some(child) = is_group
                .then(|| self.registry.resolve_child(current, word))
                .flatten()
            else {
                break;
            };
            current = child;
            consumed += 1;
        }

        (consumed > 0).then_some((current, consumed))
    }

    /// Dispatch checks, in order: disabled, capability, cooldown.
    ///
    /// Returns the refusal to reply with, if any. Owners bypass the disabled
    /// and cooldown checks.
    async fn check(&self, node: &CommandNode, actor: &ActorContext) -> Option<CommandResult> {
        if !node.is_enabled() && !actor.is_owner {
            return Some(CommandResult::new(format_disabled()));
        }

        if !self.registry.can_invoke(node.id(), actor) {
            return Some(CommandResult::new(format_capability_refused(
                node.capability(),
            )));
        }

        let cooldown = node.cooldown()?;
        let mut cooldowns = self.cooldowns.lock().await;
        if actor.is_owner {
            cooldowns.reset(node.id(), &actor.user_id);
            return None;
        }
        match cooldowns.hit(node.id(), &actor.user_id, &cooldown, Instant::now()) {
            Ok(()) => None,
            Err(retry_after) => Some(CommandResult::new(format_cooldown(
                cooldown.per,
                retry_after,
            ))),
        }
    }
}
