//! Permission-aware help resolution and delivery.
//!
//! A help request flows through five stages:
//!
//! ```text
//! "template add"
//!      │
//!      ▼
//! ┌──────────────┐   ┌────────────┐   ┌──────────┐   ┌──────────┐   ┌────────────┐
//! │ resolver     │ → │ visibility │ → │ grouping │ → │ render   │ → │ delivery   │
//! │ (find node)  │   │ (filter)   │   │ (order)  │   │ (message)│   │ (DM first) │
//! └──────────────┘   └────────────┘   └──────────┘   └──────────┘   └────────────┘
//! ```
//!
//! Nothing is cached between requests: command flags and the profile templates
//! of a room can change at any time, so every request rebuilds its view of the
//! command tree.

mod delivery;
mod grouping;
mod render;
mod resolver;
mod visibility;

use std::sync::Arc;

use log::{debug, info};
use rand::Rng;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;

pub use crate::help::delivery::{DeliveryError, DeliveryOutcome, Dispatcher, Transport};
#[cfg(test)]
pub use crate::help::delivery::MockTransport;
pub use crate::help::render::{BotIdentity, RenderSettings, RenderedMessage, Renderer};

use crate::{
    help::{
        grouping::group_commands,
        resolver::{Resolved, resolve},
        visibility::filter_visible,
    },
    registry::CommandRegistry,
    templates::TemplateCatalog,
};

/// Where a message came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Surface {
    /// A direct chat between the actor and the bot
    Private,
    /// A shared room
    Room { room_id: String },
}

impl Surface {
    pub fn room(room_id: &str) -> Self {
        Surface::Room {
            room_id: room_id.to_owned(),
        }
    }
}

/// Identity and surface of whoever issued a command.
///
/// Built once per incoming message and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorContext {
    /// Matrix user ID of the actor
    pub user_id: String,
    /// Where the command was issued
    pub surface: Surface,
    /// Prefix the actor used, echoed back in help lines
    pub prefix: String,
    /// Whether the actor is one of the configured bot owners
    pub is_owner: bool,
}

/// How categories are ordered relative to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryOrder {
    /// Case-insensitive category name
    Alphabetical,
    /// Longest rendered block first, ties by category name
    #[default]
    Length,
}

/// Failures of a help request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HelpError {
    /// A named reference did not resolve; carries the reference verbatim
    #[error("The command `{0}` could not be found.")]
    CommandNotFound(String),
    /// The transport failed for a reason other than permissions
    #[error("failed to deliver help: {0}")]
    DeliveryFatal(String),
}

impl From<DeliveryError> for HelpError {
    fn from(error: DeliveryError) -> Self {
        HelpError::DeliveryFatal(error.to_string())
    }
}

/// Entry point of the help subsystem.
///
/// # Examples
///
/// ```ignore
/// let service = HelpService::new(registry, renderer, CategoryOrder::Length, catalog, transport);
/// let outcome = service.render_help(&actor, Some("template")).await?;
/// ```
pub struct HelpService<R: CommandRegistry, T: Transport> {
    registry: Arc<R>,
    renderer: Renderer,
    order: CategoryOrder,
    catalog: Arc<Mutex<TemplateCatalog>>,
    dispatcher: Dispatcher<T>,
}

impl<R: CommandRegistry, T: Transport> HelpService<R, T> {
    pub fn new(
        registry: Arc<R>,
        renderer: Renderer,
        order: CategoryOrder,
        catalog: Arc<Mutex<TemplateCatalog>>,
        transport: Arc<T>,
    ) -> Self {
        HelpService {
            registry,
            renderer,
            order,
            catalog,
            dispatcher: Dispatcher::new(transport),
        }
    }

    /// Resolves, renders and delivers help for one request.
    ///
    /// # Arguments
    ///
    /// * `actor` - Who asked and from where
    /// * `reference` - Optional command path; `None` or blank lists everything
    ///
    /// # Errors
    ///
    /// - [`HelpError::CommandNotFound`] if `reference` names no command. Nothing
    ///   has been sent; the caller reports the error text to the actor.
    /// - [`HelpError::DeliveryFatal`] if the transport failed for a reason
    ///   other than permissions.
    pub async fn render_help(
        &self,
        actor: &ActorContext,
        reference: Option<&str>,
    ) -> Result<DeliveryOutcome, HelpError> {
        debug!("help requested by {} for {:?}", actor.user_id, reference);

        let profiles = match &actor.surface {
            Surface::Room { room_id } => self.catalog.lock().await.templates(room_id),
            Surface::Private => Vec::new(),
        };

        let message = {
            let mut rng = rand::thread_rng();
            self.compose(actor, reference.unwrap_or_default(), &profiles, &mut rng)?
        };

        let outcome = self.dispatcher.deliver(actor, &message).await?;
        info!("help for {} delivered: {:?}", actor.user_id, outcome);

        Ok(outcome)
    }

    /// Builds the help message without sending it.
    pub fn compose<G: Rng>(
        &self,
        actor: &ActorContext,
        reference: &str,
        profiles: &[String],
        rng: &mut G,
    ) -> Result<RenderedMessage, HelpError> {
        let registry = self.registry.as_ref();

        let message = match resolve(registry, reference)? {
            Resolved::All => {
                let top_level = registry.top_level();
                let visible = filter_visible(registry, &top_level, actor);
                let blocks = group_commands(registry, &visible, &actor.prefix, self.order);
                self.renderer
                    .render_listing(actor, None, &blocks, profiles, rng)
            }
            Resolved::Group(id) => {
                let descendants = registry.walk(id);
                let visible = filter_visible(registry, &descendants, actor);
                let blocks = group_commands(registry, &visible, &actor.prefix, self.order);
                let group = registry.node(id);
                self.renderer
                    .render_listing(actor, group, &blocks, profiles, rng)
            }
            Resolved::Command(id) => match registry.node(id) {
                Some(node) => self.renderer.render_command(actor, node, rng),
                None => return Err(HelpError::CommandNotFound(reference.to_owned())),
            },
        };

        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::registry::{CapabilityCheck, CommandSpec, Registry};

    fn create_test_registry() -> Registry {
        let mut registry = Registry::new();
        let root = registry.root();
        registry
            .register(
                root,
                CommandSpec::new("help")
                    .aliases(["commands"])
                    .help("Shows this message")
                    .category("Help")
                    .hidden(),
            )
            .unwrap();
        registry
            .register(
                root,
                CommandSpec::new("vote")
                    .help("Gives you a link to upvote the bot")
                    .category("Misc"),
            )
            .unwrap();
        registry
            .register(
                root,
                CommandSpec::new("invite")
                    .help("Gives you an invite link for the bot")
                    .category("Misc"),
            )
            .unwrap();
        let profile = registry
            .register(
                root,
                CommandSpec::group("profile")
                    .help("Manage profiles")
                    .category("Profiles"),
            )
            .unwrap();
        registry
            .register(
                profile,
                CommandSpec::new("get")
                    .signature("<user>")
                    .help("Shows the profile of a user\n\nMention a user to see theirs."),
            )
            .unwrap();
        registry
            .register(
                profile,
                CommandSpec::new("wipe")
                    .help("Deletes every profile of the room")
                    .capability(CapabilityCheck::RoomOnly),
            )
            .unwrap();
        registry
    }

    fn create_test_service(transport: MockTransport) -> HelpService<Registry, MockTransport> {
        let identity = BotIdentity {
            user_id: "@profilebot:example.com".to_owned(),
            display_name: "ProfileBot".to_owned(),
            avatar_url: None,
        };
        HelpService::new(
            Arc::new(create_test_registry()),
            Renderer::new(identity, RenderSettings::default()),
            CategoryOrder::Alphabetical,
            Arc::new(Mutex::new(TemplateCatalog::in_memory())),
            Arc::new(transport),
        )
    }

    fn room_actor() -> ActorContext {
        ActorContext {
            user_id: "@alice:example.com".to_owned(),
            surface: Surface::room("!room:example.com"),
            prefix: "!pb ".to_owned(),
            is_owner: false,
        }
    }

    #[test]
    fn test_compose_full_listing() {
        let service = create_test_service(MockTransport::new());
        let mut rng = StdRng::seed_from_u64(7);

        let message = service
            .compose(&room_actor(), "", &[], &mut rng)
            .unwrap();

        let headings: Vec<&str> = message.fields.iter().map(|(h, _)| h.as_str()).collect();
        // help is hidden, Help category disappears
        assert_eq!(headings, vec!["Misc", "Profiles"]);
        assert_eq!(
            message.fields[0].1,
            "!pb invite - *Gives you an invite link for the bot*\n!pb vote - *Gives you a link to upvote the bot*"
        );
        assert_eq!(message.fields[1].1, "!pb profile - *Manage profiles*");
    }

    #[test]
    fn test_compose_single_command() {
        let service = create_test_service(MockTransport::new());
        let mut rng = StdRng::seed_from_u64(7);

        let message = service
            .compose(&room_actor(), "profile get", &[], &mut rng)
            .unwrap();

        assert_eq!(message.fields.len(), 1);
        assert_eq!(message.fields[0].0, "!pb profile get <user>");
        assert!(message.fields[0].1.contains("Mention a user"));
    }

    #[test]
    fn test_compose_group_hides_room_commands_in_private() {
        let service = create_test_service(MockTransport::new());
        let mut rng = StdRng::seed_from_u64(7);

        let mut private = room_actor();
        private.surface = Surface::Private;
        let message = service.compose(&private, "profile", &[], &mut rng).unwrap();

        assert_eq!(message.fields[0].0, "!pb profile");
        assert_eq!(message.fields[1].0, "Profiles");
        assert!(message.fields[1].1.contains("profile get"));
        assert!(!message.fields[1].1.contains("profile wipe"));

        let message = service
            .compose(&room_actor(), "profile", &[], &mut rng)
            .unwrap();
        assert!(message.fields[1].1.contains("profile wipe"));
    }

    #[test]
    fn test_compose_unknown_subcommand() {
        let service = create_test_service(MockTransport::new());
        let mut rng = StdRng::seed_from_u64(7);

        assert_eq!(
            service.compose(&room_actor(), "profile create", &[], &mut rng),
            Err(HelpError::CommandNotFound("profile create".to_owned()))
        );
    }

    #[tokio::test]
    async fn test_render_help_not_found_sends_nothing() {
        let mut transport = MockTransport::new();
        transport.expect_send_private().times(0);
        transport.expect_send_origin().times(0);
        let service = create_test_service(transport);

        let result = service.render_help(&room_actor(), Some("nope")).await;
        assert_eq!(result, Err(HelpError::CommandNotFound("nope".to_owned())));
    }

    #[tokio::test]
    async fn test_render_help_from_room_sends_dm_and_ack() {
        let mut transport = MockTransport::new();
        transport
            .expect_send_private()
            .withf(|user_id, message| {
                user_id == "@alice:example.com" && message.fields.len() == 2
            })
            .times(1)
            .returning(|_, _| Ok(()));
        transport
            .expect_send_origin()
            .withf(|room_id, text| room_id == "!room:example.com" && text == "Sent you a DM!")
            .times(1)
            .returning(|_, _| Ok(()));
        let service = create_test_service(transport);

        let outcome = service.render_help(&room_actor(), None).await.unwrap();
        assert_eq!(outcome, DeliveryOutcome::DeliveredPrimaryWithAck);
    }

    #[tokio::test]
    async fn test_render_help_fatal_transport_error() {
        let mut transport = MockTransport::new();
        transport
            .expect_send_private()
            .times(1)
            .returning(|_, _| Err(DeliveryError::Fatal("connection reset".to_owned())));
        transport.expect_send_origin().times(0);
        let service = create_test_service(transport);

        let result = service.render_help(&room_actor(), Some("vote")).await;
        assert_eq!(
            result,
            Err(HelpError::DeliveryFatal(
                "delivery failed: connection reset".to_owned()
            ))
        );
    }

    #[tokio::test]
    async fn test_render_help_includes_room_templates() {
        let mut transport = MockTransport::new();
        transport
            .expect_send_private()
            .withf(|_, message| {
                message
                    .fields
                    .iter()
                    .any(|(heading, body)| heading == "Profiles" && body.contains("!pb getcharacter"))
            })
            .times(1)
            .returning(|_, _| Ok(()));
        transport
            .expect_send_origin()
            .times(1)
            .returning(|_, _| Ok(()));
        let service = create_test_service(transport);
        service
            .catalog
            .lock()
            .await
            .add("!room:example.com", "character")
            .await;

        service.render_help(&room_actor(), None).await.unwrap();
    }
}
