//! Markdown response formatters for bot commands.
//!
//! Every user-visible text the bot sends lives here so wording stays consistent
//! between the help output and the command replies.

use std::time::Duration;

use crate::{
    commands::actions::StatsReport, registry::CapabilityCheck, templates::MAX_TEMPLATE_NAME_LEN,
};

/// Introduction shown above the full command listing.
///
/// # Examples
///
/// ```ignore
/// let intro = format_help_intro();
/// assert!(intro.starts_with("ProfileBot"));
/// ```
pub(crate) fn format_help_intro() -> String {
    "ProfileBot is a bot which keeps track of the profile templates of your rooms. \
    These templates could be things like character sheets, game tags, etc.\n\n\
    Below you can see all of the commands I have available. To register a template in \
    your room, run `template add` with its name, e.g. `template add character`. \
    `template list` shows the templates of the room and `template remove` deletes one.\n\n\
    When you ask for help from a room with templates, they are listed under **Profiles** \
    with the names of the profile commands they are meant for. Filling in profiles is \
    not available in this version of the bot."
        .to_owned()
}

/// Body of a single command help when the command carries no help text.
pub(crate) fn format_no_help() -> String {
    "No help available.".to_owned()
}

/// Acknowledgement sent in the room once help reached the direct chat.
pub(crate) fn format_dm_sent() -> String {
    "Sent you a DM!".to_owned()
}

/// Notice sent in the room when the direct chat refused the help message.
pub(crate) fn format_dm_failed() -> String {
    "I couldn't send you a DM :c".to_owned()
}

/// Formats a response for an unknown command.
///
/// # Arguments
///
/// * `prefix` - The prefix the user typed, echoed back in the hint
pub(crate) fn format_unknown_command(prefix: &str) -> String {
    format!("Unknown command. Type `{}help` for more information.", prefix)
}

pub(crate) fn format_disabled() -> String {
    "This command has been disabled.".to_owned()
}

/// Formats the refusal sent while a command is on cooldown.
///
/// # Arguments
///
/// * `per` - Length of the cooldown window
/// * `retry_after` - Time left before the user can run the command again
pub(crate) fn format_cooldown(per: Duration, retry_after: Duration) -> String {
    format!(
        "You can only use this command once every `{:.0} seconds` per user. \
        You may use this again in `{:.2} seconds`.",
        per.as_secs_f64(),
        retry_after.as_secs_f64()
    )
}

/// Formats the refusal sent when the caller fails a command capability.
pub(crate) fn format_capability_refused(capability: CapabilityCheck) -> String {
    match capability {
        CapabilityCheck::RoomOnly => "This command can only be run in a room.".to_owned(),
        CapabilityCheck::Everyone => "You can't run this command.".to_owned(),
    }
}

/// Formats the usage hint sent when a required argument is missing.
pub(crate) fn format_missing_argument(prefix: &str, qualified_name: &str, signature: &str) -> String {
    format!(
        "Missing argument. Usage: `{}{} {}`",
        prefix, qualified_name, signature
    )
}

pub(crate) fn format_vote(vote_url: &str, prefix: &str) -> String {
    format!(
        "<{}>\nSee `{}perks` for more information.",
        vote_url, prefix
    )
}

pub(crate) fn format_github(github: Option<&str>) -> String {
    match github {
        Some(url) => format!("<{}>", url),
        None => "No code repository has been configured.".to_owned(),
    }
}

/// Formats the donation links, one per line.
///
/// Returns `None` when no donation link is configured.
pub(crate) fn format_donate(
    patreon: Option<&str>,
    paypal: Option<&str>,
    prefix: &str,
) -> Option<String> {
    let mut links = Vec::new();
    if let Some(patreon) = patreon {
        links.push(format!(
            "Patreon: <{}> (see `{}perks` to see what you get)",
            patreon, prefix
        ));
    }
    if let Some(paypal) = paypal {
        links.push(format!(
            "PayPal: <{}> (doesn't get you the perks, but is very appreciated)",
            paypal
        ));
    }

    match links.is_empty() {
        true => None,
        false => Some(links.join("\n")),
    }
}

/// Formats the invitation link of the bot account.
///
/// # Arguments
///
/// * `bot_user_id` - Matrix ID of the bot, e.g. `@profilebot:example.com`
pub(crate) fn format_invite(bot_user_id: &str) -> String {
    format!(
        "Invite me to your room: <https://matrix.to/#/{}>",
        bot_user_id
    )
}

/// Formats the perks granted by each support tier.
pub(crate) fn format_perks(prefix: &str) -> String {
    let tiers: [(String, &[&str]); 5] = [
        (
            "Normal Users".to_owned(),
            &["60s profile cooldown", "5 templates per room"],
        ),
        (format!("Voting ({}vote)", prefix), &["30s profile cooldown"]),
        (
            format!("T1 Patreon Donation ({}donate)", prefix),
            &["15s profile cooldown", "Up to 10 templates per room"],
        ),
        (
            format!("T2 Patreon Donation ({}donate)", prefix),
            &["Up to 15 templates per room"],
        ),
        (
            format!("T3 Patreon Donation ({}donate)", prefix),
            &["5s profile cooldown", "Up to 20 templates per room"],
        ),
    ];

    tiers
        .iter()
        .map(|(name, perks)| {
            format!(
                "#### {}\nGives you access to:\n* {}",
                name,
                perks.join("\n* ")
            )
        })
        .collect::<Vec<String>>()
        .join("\n\n")
}

/// Formats the process statistics.
pub(crate) fn format_cleared(count: usize) -> String {
    format!("Cleared `{count}` messages from chat.")
}

pub(crate) fn format_clear_refused() -> String {
    "I'm not allowed to delete messages in this room.".to_owned()
}

pub(crate) fn format_stats(report: &StatsReport) -> String {
    let uptime = report.uptime.as_secs();
    let fields = [
        (
            report.bot_name.clone(),
            "A bot to make the process of filling out forms fun.".to_owned(),
        ),
        ("Creator".to_owned(), report.creator.clone()),
        (
            "Library".to_owned(),
            format!("matrix-sdk, {} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        ),
        ("Room Count".to_owned(), report.room_count.to_string()),
        ("Process ID".to_owned(), report.pid.to_string()),
        ("CPU Usage".to_owned(), format!("{:.2}", report.cpu_usage)),
        (
            "Memory Usage".to_owned(),
            format!(
                "{:.2}MB/{:.2}MB",
                report.memory as f64 / 1_048_576.0,
                report.total_memory as f64 / 1_048_576.0
            ),
        ),
        (
            "Uptime".to_owned(),
            format!(
                "{} days, {} hours, {} minutes, and {} seconds.",
                uptime / 86_400,
                (uptime % 86_400) / 3_600,
                (uptime % 3_600) / 60,
                uptime % 60
            ),
        ),
    ];

    fields
        .iter()
        .map(|(name, value)| format!("**{}**: {}", name, value))
        .collect::<Vec<String>>()
        .join("  \n")
}

pub(crate) fn format_invalid_template_name(name: &str) -> String {
    format!(
        "`{}` is not a valid template name. Use up to {} letters, digits or underscores.",
        name, MAX_TEMPLATE_NAME_LEN
    )
}

/// Formats the confirmation of a new template, listing the derived commands.
pub(crate) fn format_template_added(name: &str, prefix: &str) -> String {
    format!(
        "Template `{name}` added. It is listed under **Profiles** in `{prefix}help`."
    )
}

pub(crate) fn format_template_exists(name: &str) -> String {
    format!("A template called `{}` already exists in this room.", name)
}

pub(crate) fn format_template_removed(name: &str) -> String {
    format!("Template `{}` removed.", name)
}

pub(crate) fn format_template_not_found(name: &str) -> String {
    format!("There is no template called `{}` in this room.", name)
}

/// Formats the templates of a room.
pub(crate) fn format_templates(names: &[String], prefix: &str) -> String {
    if names.is_empty() {
        return format!(
            "This room has no templates yet. Add one with `{}template add <name>`.",
            prefix
        );
    }

    let templates_md = names
        .iter()
        .map(|name| format!("- **{}**", name))
        .collect::<Vec<String>>()
        .join("\n");

    format!("Templates:\n\n{}", templates_md)
}
