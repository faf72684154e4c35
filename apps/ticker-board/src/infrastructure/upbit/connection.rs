//! Connection State Machine
//!
//! Pure lifecycle bookkeeping for the ticker stream, kept free of I/O so
//! every transition can be unit tested.
//!
//! # States
//!
//! ```text
//!                 connect()
//! Disconnected ──────────────▶ Connecting ──subscribe sent──▶ Subscribed
//!      ▲                          │  ▲                            │
//!      │ budget spent             │  │ delay elapsed              │
//!      │                 failure  ▼  │                   failure  │
//!      └──────────────────────── Failed ◀─────────────────────────┘
//! ```
//!
//! `disconnect()` moves any state to `Disconnected` and clears the retry
//! budget. Failures reported while `Failed` (a retry is already pending) or
//! `Disconnected` (explicitly stopped) are ignored.

use std::time::Duration;

use super::reconnect::{ReconnectConfig, ReconnectPolicy};

// =============================================================================
// Connection State
// =============================================================================

/// Lifecycle state of the stream connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// No session is open and none is scheduled.
    #[default]
    Disconnected,
    /// Socket is opening or waiting to send the subscribe request.
    Connecting,
    /// Subscribe request was sent; tickers are flowing.
    Subscribed,
    /// The last session failed; a retry may be pending.
    Failed,
}

impl ConnectionState {
    /// Whether the connection is delivering tickers.
    #[must_use]
    pub const fn is_subscribed(&self) -> bool {
        matches!(self, Self::Subscribed)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Subscribed => "subscribed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What the session driver should do after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAction {
    /// Wait `delay`, then connect again.
    Retry {
        /// Retry number within the current cycle (1-based).
        attempt: u32,
        /// Delay before connecting.
        delay: Duration,
    },
    /// Budget spent; the machine is `Disconnected`.
    GiveUp {
        /// Connection attempts made in the cycle.
        attempts: u32,
    },
    /// The failure arrived in a state that does not react to it.
    Ignore,
}

// =============================================================================
// Connection Machine
// =============================================================================

/// Stream lifecycle state plus the retry budget.
#[derive(Debug, Clone)]
pub struct ConnectionMachine {
    state: ConnectionState,
    policy: ReconnectPolicy,
    first_frame_seen: bool,
}

impl ConnectionMachine {
    /// Create a disconnected machine.
    #[must_use]
    pub const fn new(config: ReconnectConfig) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            policy: ReconnectPolicy::new(config),
            first_frame_seen: false,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Retries spent in the current failure cycle.
    #[must_use]
    pub const fn retry_count(&self) -> u32 {
        self.policy.retry_count()
    }

    /// Start (or restart) a connection attempt.
    pub const fn begin_connect(&mut self) {
        self.state = ConnectionState::Connecting;
    }

    /// The subscribe request went out. Returns `false` if the machine was
    /// not connecting (the session was torn down meanwhile).
    pub const fn on_subscribed(&mut self) -> bool {
        if !matches!(self.state, ConnectionState::Connecting) {
            return false;
        }
        self.state = ConnectionState::Subscribed;
        self.policy.reset();
        true
    }

    /// A connect, send or receive failed.
    pub const fn on_failure(&mut self) -> FailureAction {
        match self.state {
            ConnectionState::Failed | ConnectionState::Disconnected => FailureAction::Ignore,
            ConnectionState::Connecting | ConnectionState::Subscribed => {
                self.state = ConnectionState::Failed;
                let attempts = self.policy.max_attempts();
                match self.policy.next_delay() {
                    Some(delay) => FailureAction::Retry {
                        attempt: self.policy.retry_count(),
                        delay,
                    },
                    None => {
                        self.state = ConnectionState::Disconnected;
                        FailureAction::GiveUp { attempts }
                    }
                }
            }
        }
    }

    /// Record a decoded frame. Returns `true` for the first frame since the
    /// last reset.
    pub const fn on_frame(&mut self) -> bool {
        let first = !self.first_frame_seen;
        self.first_frame_seen = true;
        first
    }

    /// Explicit stop. Returns the state before the call.
    pub const fn disconnect(&mut self) -> ConnectionState {
        let previous = self.state;
        self.state = ConnectionState::Disconnected;
        self.policy.reset();
        self.first_frame_seen = false;
        previous
    }

    /// Manual override: clear the budget and connect again unconditionally.
    pub const fn reconnect(&mut self) {
        self.policy.reset();
        self.first_frame_seen = false;
        self.begin_connect();
    }
}

impl Default for ConnectionMachine {
    fn default() -> Self {
        Self::new(ReconnectConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> ConnectionMachine {
        ConnectionMachine::new(ReconnectConfig::new(Duration::from_secs(5), 3))
    }

    #[test]
    fn starts_disconnected() {
        let m = machine();
        assert_eq!(m.state(), ConnectionState::Disconnected);
        assert_eq!(m.retry_count(), 0);
    }

    #[test]
    fn subscribe_resets_retries() {
        let mut m = machine();
        m.begin_connect();
        assert!(matches!(m.on_failure(), FailureAction::Retry { attempt: 1, .. }));
        m.begin_connect();
        assert!(m.on_subscribed());
        assert_eq!(m.state(), ConnectionState::Subscribed);
        assert_eq!(m.retry_count(), 0);
    }

    #[test]
    fn subscribe_after_disconnect_is_rejected() {
        let mut m = machine();
        m.begin_connect();
        m.disconnect();
        assert!(!m.on_subscribed());
        assert_eq!(m.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn initial_attempt_plus_three_retries_then_give_up() {
        let mut m = machine();
        m.begin_connect();

        for attempt in 1..=3 {
            assert_eq!(
                m.on_failure(),
                FailureAction::Retry {
                    attempt,
                    delay: Duration::from_secs(5)
                }
            );
            assert_eq!(m.state(), ConnectionState::Failed);
            m.begin_connect();
        }

        assert_eq!(m.on_failure(), FailureAction::GiveUp { attempts: 4 });
        assert_eq!(m.state(), ConnectionState::Disconnected);
        assert_eq!(m.retry_count(), 0);
    }

    #[test]
    fn failure_while_failed_or_stopped_is_ignored() {
        let mut m = machine();
        assert_eq!(m.on_failure(), FailureAction::Ignore);

        m.begin_connect();
        assert!(matches!(m.on_failure(), FailureAction::Retry { .. }));
        assert_eq!(m.on_failure(), FailureAction::Ignore);
        assert_eq!(m.retry_count(), 1);
    }

    #[test]
    fn failure_after_subscribed_schedules_retry() {
        let mut m = machine();
        m.begin_connect();
        m.on_subscribed();
        assert!(matches!(m.on_failure(), FailureAction::Retry { attempt: 1, .. }));
    }

    #[test]
    fn disconnect_clears_counters() {
        let mut m = machine();
        m.begin_connect();
        let _ = m.on_failure();
        assert!(m.on_frame());
        assert!(!m.on_frame());

        assert_eq!(m.disconnect(), ConnectionState::Failed);
        assert_eq!(m.retry_count(), 0);
        assert!(m.on_frame());
    }

    #[test]
    fn reconnect_is_unconditional() {
        let mut m = machine();
        m.begin_connect();
        m.on_subscribed();
        m.reconnect();
        assert_eq!(m.state(), ConnectionState::Connecting);
        assert_eq!(m.retry_count(), 0);
    }
}
