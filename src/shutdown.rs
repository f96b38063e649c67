//! Cooperative shutdown signal for long-running loops.
//!
//! A [`Shutdown`] fires either when [`Shutdown::trigger`] is called or when
//! its optional deadline passes. Clones share the same signal.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a [`Shutdown`] fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// [`Shutdown::trigger`] was called.
    Requested,
    /// The deadline passed.
    DeadlineElapsed,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::Requested => f.write_str("shutdown requested"),
            ShutdownReason::DeadlineElapsed => f.write_str("shutdown deadline elapsed"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Shutdown {
    /// A signal that only fires when triggered.
    pub fn new() -> Self {
        Self::default()
    }

    /// A signal that also fires once `timeout` has elapsed from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    pub fn trigger(&self) {
        self.token.cancel();
    }

    /// The reason this signal has fired, or `None` if it has not.
    pub fn reason(&self) -> Option<ShutdownReason> {
        if self.token.is_cancelled() {
            return Some(ShutdownReason::Requested);
        }
        match self.deadline {
            Some(deadline) if deadline <= Instant::now() => Some(ShutdownReason::DeadlineElapsed),
            _ => None,
        }
    }

    /// Wait until the signal fires.
    pub async fn wait(&self) -> ShutdownReason {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.token.cancelled() => ShutdownReason::Requested,
                _ = tokio::time::sleep_until(deadline) => ShutdownReason::DeadlineElapsed,
            },
            None => {
                self.token.cancelled().await;
                ShutdownReason::Requested
            }
        }
    }
}
