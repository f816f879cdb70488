//! Outbound channels: named events, emotion deltas and speech
//!
//! Named events are how the handlers signal the external state machine, and
//! through it each other.

use crate::common::PadDelta;
use std::fmt;
use tokio::sync::mpsc;
use tracing::debug;

/// Named events published on the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusEvent {
    /// An ongoing scheduled event is somewhere else
    Scheduler,
    Emotional,
    Command,
    StartMoving,
    StartWandering,
    WanderingCompleted,
    Feedback,
    FeedbackCompleted,
    Information,
}

impl BusEvent {
    /// Wire name of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            // Misspelling is part of the wire contract.
            BusEvent::Scheduler => "navigation_schedualer",
            BusEvent::Emotional => "navigation_emotional",
            BusEvent::Command => "navigation_command",
            BusEvent::StartMoving => "navigation_start_moving",
            BusEvent::StartWandering => "navigation_start_wandering",
            BusEvent::WanderingCompleted => "navigation_wandering_completed",
            BusEvent::Feedback => "navigation_feedback",
            BusEvent::FeedbackCompleted => "navigation_feedback_completed",
            BusEvent::Information => "navigation_information",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [
            BusEvent::Scheduler,
            BusEvent::Emotional,
            BusEvent::Command,
            BusEvent::StartMoving,
            BusEvent::StartWandering,
            BusEvent::WanderingCompleted,
            BusEvent::Feedback,
            BusEvent::FeedbackCompleted,
            BusEvent::Information,
        ]
        .into_iter()
        .find(|event| event.as_str() == name)
    }
}

impl fmt::Display for BusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything the behaviors send out.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Event(BusEvent),
    Emotion(PadDelta),
    Speech(String),
}

/// Publish side of the event, emotion and speech channels
pub trait FeedbackBus: Send + Sync {
    fn publish_event(&self, event: BusEvent);

    fn publish_emotion(&self, delta: PadDelta);

    fn say(&self, text: &str);
}

/// Feedback bus over an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelBus {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl ChannelBus {
    /// Create a bus and the receiver its messages arrive on
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelBus { tx }, rx)
    }

    fn send(&self, message: Outbound) {
        if self.tx.send(message).is_err() {
            debug!("feedback receiver dropped, message discarded");
        }
    }
}

impl FeedbackBus for ChannelBus {
    fn publish_event(&self, event: BusEvent) {
        debug!(%event, "publishing event");
        self.send(Outbound::Event(event));
    }

    fn publish_emotion(&self, delta: PadDelta) {
        debug!(?delta, "publishing emotion delta");
        self.send(Outbound::Emotion(delta));
    }

    fn say(&self, text: &str) {
        debug!(text, "speaking");
        self.send(Outbound::Speech(text.to_string()));
    }
}
