//! Connection staleness tracking
//!
//! UDP is fire-and-forget, so "connected" only means we sent something
//! recently. The monitor flags the transition into and out of staleness.

use std::time::Duration;
use tracing::{info, warn};

/// Default window after which a quiet connection counts as stale
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Tracks whether the outgoing stream has gone quiet
#[derive(Debug)]
pub struct ConnectionMonitor {
    timeout: Duration,
    stale: bool,
}

impl ConnectionMonitor {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            stale: false,
        }
    }

    /// Re-evaluate staleness from the age of the last successful send.
    ///
    /// `None` means nothing has been sent yet, which is not stale - the
    /// stream simply has not started. Transitions are logged once.
    pub fn check(&mut self, last_send_age: Option<Duration>) -> bool {
        let now_stale = match last_send_age {
            Some(age) => age > self.timeout,
            None => false,
        };

        if now_stale && !self.stale {
            warn!(
                "connection stale - no OSC activity for more than {:.1}s",
                self.timeout.as_secs_f32()
            );
        } else if !now_stale && self.stale {
            info!("connection active again");
        }

        self.stale = now_stale;
        now_stale
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }
}

impl Default for ConnectionMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_sent_is_not_stale() {
        let mut monitor = ConnectionMonitor::default();
        assert!(!monitor.check(None));
        assert!(!monitor.is_stale());
    }

    #[test]
    fn test_stale_and_recovery() {
        let mut monitor = ConnectionMonitor::new(Duration::from_millis(100));

        assert!(!monitor.check(Some(Duration::from_millis(50))));
        assert!(monitor.check(Some(Duration::from_millis(200))));
        assert!(monitor.is_stale());

        // Fresh send clears the flag
        assert!(!monitor.check(Some(Duration::from_millis(10))));
        assert!(!monitor.is_stale());
    }
}
