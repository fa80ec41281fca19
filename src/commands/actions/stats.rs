//! Stats command handler.

use std::time::{Duration, Instant};

use log::{debug, warn};
use sysinfo::{Pid, System};

use crate::commands::{CommandResult, CommandSettings, markdown_response::format_stats};

/// Snapshot of the process shown by the `stats` command.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsReport {
    pub bot_name: String,
    pub creator: String,
    pub room_count: usize,
    pub pid: u32,
    /// CPU usage of the process since the previous snapshot, in percent
    pub cpu_usage: f32,
    /// Resident memory of the process, in bytes
    pub memory: u64,
    /// Total memory of the host, in bytes
    pub total_memory: u64,
    pub uptime: Duration,
}

/// Samples the resource usage of the bot process.
pub struct ProcessStats {
    system: System,
    pid: Option<Pid>,
    started: Instant,
}

impl ProcessStats {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                warn!("cannot read the current pid, stats will be partial: {}", e);
                None
            }
        };

        let mut process_stats = ProcessStats {
            system: System::new(),
            pid,
            started: Instant::now(),
        };
        // CPU usage is computed between two refreshes, prime the first one
        process_stats.refresh();
        process_stats
    }

    fn refresh(&mut self) {
        self.system.refresh_memory();
        if let Some(pid) = self.pid {
            self.system.refresh_process(pid);
        }
    }

    pub fn report(&mut self, settings: &CommandSettings, room_count: usize) -> StatsReport {
        self.refresh();

        let process = self.pid.and_then(|pid| self.system.process(pid));
        StatsReport {
            bot_name: settings.bot_name.clone(),
            creator: settings.creator.clone(),
            room_count,
            pid: self.pid.map(|pid| pid.as_u32()).unwrap_or_default(),
            cpu_usage: process.map(|p| p.cpu_usage()).unwrap_or_default(),
            memory: process.map(|p| p.memory()).unwrap_or_default(),
            total_memory: self.system.total_memory(),
            uptime: self.started.elapsed(),
        }
    }
}

impl Default for ProcessStats {
    fn default() -> Self {
        Self::new()
    }
}

pub fn handle_stats(
    process_stats: &mut ProcessStats,
    settings: &CommandSettings,
    room_count: usize,
) -> Option<CommandResult> {
    debug!("handling stats command");

    let report = process_stats.report(settings, room_count);
    Some(CommandResult::new(format_stats(&report)))
}
