//! Timing for handler invocations
//!
//! Each invocation gets an [`Invocation`]: its preemption token plus the
//! poll interval its loops sleep for. Loops ask it whether they were
//! preempted, measure ceilings with a [`Deadline`] and pace periodic
//! feedback with a [`Pulse`]. Sleeping wakes early on preemption, so the
//! poll interval only bounds how often the loop re-checks shared state.

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// How a bounded wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitEnd {
    Preempted,
    Expired,
}

/// Preemption and pacing for one handler invocation.
#[derive(Debug, Clone)]
pub struct Invocation {
    token: CancellationToken,
    poll: Duration,
}

impl Invocation {
    pub fn new(token: CancellationToken, poll: Duration) -> Self {
        Invocation { token, poll }
    }

    pub fn is_preempted(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Sleep one poll interval, or less if preempted meanwhile
    pub async fn pause(&self) {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => {}
            _ = tokio::time::sleep(self.poll) => {}
        }
    }

    /// Sleep for `duration` unless preempted first. Returns false on preemption.
    pub async fn settle(&self, duration: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }

    /// Idle until preempted or until `limit` has passed from now.
    pub async fn hold(&self, limit: Duration) -> WaitEnd {
        let deadline = Deadline::start(limit);
        loop {
            if self.is_preempted() {
                return WaitEnd::Preempted;
            }
            if deadline.expired() {
                return WaitEnd::Expired;
            }
            self.pause().await;
        }
    }

    /// Idle until preempted, without a ceiling
    pub async fn hold_until_preempted(&self) {
        self.token.cancelled().await;
    }
}

/// Wall-clock ceiling measured from when it was started.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    limit: Duration,
}

impl Deadline {
    pub fn start(limit: Duration) -> Self {
        Deadline {
            started: Instant::now(),
            limit,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn expired(&self) -> bool {
        self.elapsed() > self.limit
    }
}

/// Fires at most once per period.
#[derive(Debug)]
pub struct Pulse {
    last: Instant,
    period: Duration,
}

impl Pulse {
    pub fn start(period: Duration) -> Self {
        Pulse {
            last: Instant::now(),
            period,
        }
    }

    /// True if a full period has passed since the last firing; restarts the period when it fires.
    pub fn due(&mut self) -> bool {
        if self.last.elapsed() > self.period {
            self.last = Instant::now();
            true
        } else {
            false
        }
    }
}
