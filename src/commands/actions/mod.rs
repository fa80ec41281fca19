//! Command action handlers.
//!
//! One handler per built-in command. A handler returns the reply for the room
//! the command came from, or `None` when there is nothing to say (help is
//! delivered by the help subsystem itself, a feature may be switched off).
//!
//! Handlers never run the dispatch checks; the
//! [`Commander`](crate::commands::Commander) has done so before calling them.

mod help;
mod links;
mod misc;
mod stats;
mod templates;

pub use crate::commands::actions::{
    help::handle_help,
    links::{handle_donate, handle_github, handle_invite, handle_server, handle_vote},
    misc::{handle_clear, handle_echo, handle_perks},
    stats::{ProcessStats, StatsReport, handle_stats},
    templates::{handle_template_add, handle_template_list, handle_template_remove},
};
