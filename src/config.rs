//! Configuration of the bot.
//!
//! The configuration is read from a YAML file, then overridden by environment
//! variables prefixed with `PROFILEBOT_`. Nested keys are separated by a
//! double underscore, e.g. `PROFILEBOT_MATRIX__PASSWORD`.
//!
//! # Configuration File Format
//!
//! ```yaml
//! matrix:
//!   # Fully qualified Matrix user ID of the bot account
//!   user_id: "@profilebot:matrix.org"
//!   password: "secret-password"
//!
//! bot:
//!   name: "ProfileBot"
//!   default_prefix: "!pb "
//!   creator: "Caleb"
//!   owners:
//!     - "@caleb:matrix.org"
//!   # `length` (longest category first) or `alphabetical`
//!   help_order: length
//!
//! # Every link is optional, a missing or empty one switches its feature off
//! links:
//!   dbl_token: ""
//!   dbl_vanity: "profilebot"
//!   patreon: "https://patreon.com/profilebot"
//!   paypal: ""
//!   guild_invite: "https://matrix.to/#/#profilebot:matrix.org"
//!   github: "https://github.com/example/profilebot"
//! ```

use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Deserializer};

use crate::help::CategoryOrder;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Matrix account configuration
    pub matrix: Matrix,
    /// Bot behaviour
    #[serde(default)]
    pub bot: Bot,
    /// Optional links
    #[serde(default)]
    pub links: LinksConfig,
}

/// Matrix account configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Matrix {
    /// Fully qualified Matrix user ID.
    ///
    /// # Examples
    ///
    /// - `@profilebot:matrix.org`
    pub user_id: String,

    /// Matrix account password.
    ///
    /// Used for the first login only. Afterwards the session persisted in the
    /// data directory is restored.
    pub password: String,
}

/// Bot behaviour settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Bot {
    /// Display name of the bot account
    pub name: String,
    /// Prefix of every command, trailing space included
    pub default_prefix: String,
    /// Credit line shown in the help footer and by `stats`
    pub creator: String,
    /// Matrix IDs of the bot owners
    pub owners: Vec<String>,
    /// Ordering of the help categories
    pub help_order: CategoryOrder,
}

impl Default for Bot {
    fn default() -> Self {
        Bot {
            name: "ProfileBot".to_owned(),
            default_prefix: "!pb ".to_owned(),
            creator: "the ProfileBot team".to_owned(),
            owners: Vec::new(),
            help_order: CategoryOrder::default(),
        }
    }
}

/// Links toggling optional features. Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LinksConfig {
    /// Bot list token, enables the vote footer
    #[serde(deserialize_with = "empty_as_none")]
    pub dbl_token: Option<String>,
    /// Vanity name on the bot list, used in the vote link
    #[serde(deserialize_with = "empty_as_none")]
    pub dbl_vanity: Option<String>,
    /// Enables the donation footer and the `donate` command
    #[serde(deserialize_with = "empty_as_none")]
    pub patreon: Option<String>,
    #[serde(deserialize_with = "empty_as_none")]
    pub paypal: Option<String>,
    /// Link to the support room, enables the `server` command
    #[serde(deserialize_with = "empty_as_none")]
    pub guild_invite: Option<String>,
    #[serde(deserialize_with = "empty_as_none")]
    pub github: Option<String>,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.trim().is_empty()))
}

impl Config {
    /// Loads the configuration from the YAML file at `path`, merged with
    /// `PROFILEBOT_` environment variables.
    ///
    /// # Errors
    ///
    /// Fails if a required key is missing or a value has the wrong type.
    pub fn load(path: &str) -> anyhow::Result<Config> {
        Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("PROFILEBOT_").split("__"))
            .extract()
            .with_context(|| format!("invalid configuration in {}", path))
    }
}
