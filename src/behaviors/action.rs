//! Request/result/feedback surface of the behavior handlers
//!
//! Every handler sits behind an [`ActionServer`]. A server runs one request
//! at a time: a new request preempts the one in progress, and only starts
//! once the old one has finished its cleanup.

use super::wait::Invocation;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Terminal state of a handler invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Succeeded,
    Preempted,
    Aborted,
}

impl ActionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionOutcome::Succeeded => "succeeded",
            ActionOutcome::Preempted => "preempted",
            ActionOutcome::Aborted => "aborted",
        }
    }
}

impl fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a handler publishes its feedback
pub type FeedbackSender<F> = mpsc::UnboundedSender<F>;

/// Caller side of one request.
pub struct ActionHandle<F = ()> {
    action: &'static str,
    token: CancellationToken,
    task: JoinHandle<ActionOutcome>,
    feedback: mpsc::UnboundedReceiver<F>,
}

impl<F> ActionHandle<F> {
    /// Ask the handler to stop. It reports `Preempted` on its next check.
    pub fn preempt(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Next feedback message, or `None` once the handler is done
    pub async fn next_feedback(&mut self) -> Option<F> {
        self.feedback.recv().await
    }

    pub fn try_feedback(&mut self) -> Option<F> {
        self.feedback.try_recv().ok()
    }

    /// Wait for the handler's result
    pub async fn outcome(self) -> ActionOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(action = self.action, error = %e, "handler task failed");
                ActionOutcome::Aborted
            }
        }
    }
}

/// Serves one handler, one request at a time.
pub struct ActionServer {
    name: &'static str,
    poll: Duration,
    current: Mutex<Option<CancellationToken>>,
    running: Arc<tokio::sync::Mutex<()>>,
}

impl ActionServer {
    pub fn new(name: &'static str, poll: Duration) -> Self {
        ActionServer {
            name,
            poll,
            current: Mutex::new(None),
            running: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Accept a request, preempting the one in progress.
    ///
    /// `execute` builds the handler future from the invocation's timing
    /// and a feedback sender; it runs once the previous request is done.
    pub fn serve<F, Fut>(
        &self,
        execute: impl FnOnce(Invocation, FeedbackSender<F>) -> Fut,
    ) -> ActionHandle<F>
    where
        F: Send + 'static,
        Fut: Future<Output = ActionOutcome> + Send + 'static,
    {
        let token = CancellationToken::new();
        let previous = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(token.clone());
        if let Some(previous) = previous {
            previous.cancel();
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let handler = execute(Invocation::new(token.clone(), self.poll), tx);
        let running = Arc::clone(&self.running);
        let name = self.name;
        let started = token.clone();
        let task = tokio::spawn(async move {
            let _serving = running.lock_owned().await;
            let outcome = if started.is_cancelled() {
                ActionOutcome::Preempted
            } else {
                handler.await
            };
            info!(action = name, %outcome, "request finished");
            outcome
        });

        ActionHandle {
            action: name,
            token,
            task,
            feedback: rx,
        }
    }

    /// Preempt whatever request is in progress
    pub fn preempt_active(&self) {
        if let Some(token) = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
        {
            token.cancel();
        }
    }
}
