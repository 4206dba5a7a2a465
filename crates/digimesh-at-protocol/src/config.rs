//! Session timing configuration.

use std::time::Duration;

/// Guard time assumed until the radio reports its own.
pub const DEFAULT_GUARD_TIME: Duration = Duration::from_millis(1000);

/// How long to wait for any single reply line.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// Timing for a [`crate::CommandModeSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Initial guard silence; replaced by the `GT` reply on initialisation.
    pub guard_time: Duration,
    pub reply_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            guard_time: DEFAULT_GUARD_TIME,
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
        }
    }
}

impl SessionConfig {
    pub fn with_guard_time(mut self, guard_time: Duration) -> Self {
        self.guard_time = guard_time;
        self
    }

    pub fn with_reply_timeout(mut self, reply_timeout: Duration) -> Self {
        self.reply_timeout = reply_timeout;
        self
    }
}
