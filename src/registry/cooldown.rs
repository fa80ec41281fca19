//! Per-user command cooldowns.
//!
//! Only command dispatch touches this tracker. Listing commands in the help
//! output never consumes a use.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use log::trace;

use crate::registry::{CommandId, Cooldown};

/// Fixed window of uses for one `(command, user)` pair.
#[derive(Debug, Clone, Copy)]
struct Bucket {
    window_start: Instant,
    per: Duration,
    uses: u32,
}

impl Bucket {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.window_start) >= self.per
    }
}

/// Tracks cooldown buckets for every command and user.
#[derive(Debug, Default)]
pub struct CooldownTracker {
    buckets: HashMap<(CommandId, String), Bucket>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes one use of `command` for `user_id` at `now`.
    ///
    /// Buckets whose window is over are dropped on the way.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The use was granted
    /// * `Err(retry_after)` - The bucket is exhausted; the window reopens after `retry_after`
    pub fn hit(
        &mut self,
        command: CommandId,
        user_id: &str,
        cooldown: &Cooldown,
        now: Instant,
    ) -> Result<(), Duration> {
        self.buckets.retain(|_, bucket| !bucket.is_expired(now));

        let bucket = self
            .buckets
            .entry((command, user_id.to_owned()))
            .or_insert(Bucket {
                window_start: now,
                per: cooldown.per,
                uses: 0,
            });

        if bucket.uses >= cooldown.rate {
            let retry_after = cooldown.per - now.saturating_duration_since(bucket.window_start);
            trace!("{} on cooldown for {:?}, retry after {:?}", user_id, command, retry_after);
            return Err(retry_after);
        }

        bucket.uses += 1;
        Ok(())
    }

    /// Drops the bucket of `user_id` for `command`, used when an owner bypasses a cooldown.
    pub fn reset(&mut self, command: CommandId, user_id: &str) {
        self.buckets.remove(&(command, user_id.to_owned()));
    }
}
