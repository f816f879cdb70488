//! Bounded yes/no dialogue
//!
//! A dialogue is opened right before the question is spoken and only sees
//! utterances heard after that. It ends on the first yes or no, on
//! preemption, or when its time runs out, whichever comes first.

use crate::behaviors::wait::Invocation;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::debug;

/// Answer to a yes/no question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
}

impl Answer {
    /// Classify an utterance; "yes" takes precedence if both words appear.
    pub fn classify(text: &str) -> Option<Answer> {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        if words.contains(&"yes") {
            Some(Answer::Yes)
        } else if words.contains(&"no") {
            Some(Answer::No)
        } else {
            None
        }
    }
}

/// How a dialogue ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueOutcome {
    Answered(Answer),
    Preempted,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Awaiting,
    Closed(DialogueOutcome),
}

/// A yes/no question waiting for its answer.
pub struct Dialogue {
    inbox: broadcast::Receiver<String>,
    state: State,
}

impl Dialogue {
    /// Open a dialogue listening on `inbox`
    pub fn open(inbox: broadcast::Receiver<String>) -> Self {
        Dialogue {
            inbox,
            state: State::Awaiting,
        }
    }

    pub fn outcome(&self) -> Option<DialogueOutcome> {
        match self.state {
            State::Awaiting => None,
            State::Closed(outcome) => Some(outcome),
        }
    }

    /// Wait up to `limit` for an answer. Preemption takes priority.
    pub async fn await_answer(&mut self, inv: &Invocation, limit: Duration) -> DialogueOutcome {
        if let State::Closed(outcome) = self.state {
            return outcome;
        }
        let expiry = tokio::time::sleep(limit);
        tokio::pin!(expiry);
        let mut listening = true;
        let outcome = loop {
            tokio::select! {
                biased;
                _ = inv.token().cancelled() => break DialogueOutcome::Preempted,
                _ = &mut expiry => break DialogueOutcome::Expired,
                heard = self.inbox.recv(), if listening => match heard {
                    Ok(text) => {
                        if let Some(answer) = Answer::classify(&text) {
                            break DialogueOutcome::Answered(answer);
                        }
                        debug!(text = %text, "utterance is not an answer");
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        debug!(missed, "dialogue missed utterances");
                    }
                    Err(broadcast::error::RecvError::Closed) => listening = false,
                },
            }
        };
        self.state = State::Closed(outcome);
        outcome
    }
}
