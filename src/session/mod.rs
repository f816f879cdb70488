//! Session state shared by the behavior handlers
//!
//! Every handler, the scheduler and the inbound subscriptions read and
//! write the same state. All access goes through [`Session`], which owns the
//! state behind a single lock so reads and writes are serialized and no
//! handler ever holds a reference into it across an await point.

use crate::common::types::Point2D;
use crate::common::{Emotion, Location};
use std::sync::{Arc, Mutex, MutexGuard};

/// Why the current move was started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveReason {
    #[default]
    Unspecified,
    /// A person asked to be shown the way.
    ShowTheWay,
}

/// What the planner picked for the next move.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Location(Location),
    Wandering,
}

impl Target {
    pub fn location(&self) -> Option<&Location> {
        match self {
            Target::Location(location) => Some(location),
            Target::Wandering => None,
        }
    }
}

/// The mutable state of one orchestrator instance.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub current_location: Option<Location>,
    pub next_location: Option<Target>,
    pub command_location: Option<Location>,
    pub current_pose: Point2D,
    pub current_emotion: Emotion,
    pub reason: MoveReason,
    pub last_utterance: String,
}

/// Owner handle of the session state. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct Session {
    state: Arc<Mutex<SessionState>>,
}

impl Session {
    pub fn new() -> Self {
        Session::default()
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // Writers never leave the state half-updated, so a poisoned lock is still usable.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Copy of the whole state
    pub fn snapshot(&self) -> SessionState {
        self.lock().clone()
    }

    /// Read or update several fields in one critical section.
    pub fn update<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn current_location(&self) -> Option<Location> {
        self.lock().current_location.clone()
    }

    pub fn next_location(&self) -> Option<Target> {
        self.lock().next_location.clone()
    }

    pub fn set_next_location(&self, target: Option<Target>) {
        self.lock().next_location = target;
    }

    pub fn command_location(&self) -> Option<Location> {
        self.lock().command_location.clone()
    }

    pub fn set_command_location(&self, location: Option<Location>) {
        self.lock().command_location = location;
    }

    pub fn current_pose(&self) -> Point2D {
        self.lock().current_pose
    }

    pub fn set_current_pose(&self, x: f64, y: f64) {
        self.lock().current_pose = (x, y);
    }

    pub fn current_emotion(&self) -> Emotion {
        self.lock().current_emotion.clone()
    }

    pub fn set_current_emotion(&self, emotion: Emotion) {
        self.lock().current_emotion = emotion;
    }

    pub fn reason(&self) -> MoveReason {
        self.lock().reason
    }

    pub fn set_reason(&self, reason: MoveReason) {
        self.lock().reason = reason;
    }

    pub fn last_utterance(&self) -> String {
        self.lock().last_utterance.clone()
    }

    pub fn set_last_utterance(&self, text: &str) {
        self.lock().last_utterance = text.to_string();
    }

    pub fn clear_last_utterance(&self) {
        self.lock().last_utterance.clear();
    }

    /// Record arrival at `location`. Only called on confirmed motion success.
    pub fn arrive_at(&self, location: Location) {
        self.lock().current_location = Some(location);
    }
}
