//! Event relay: a small state machine over the handlers
//!
//! Stands in for the external state machine when the handlers run on their
//! own. It listens to the outbound bus and decides which handler to request
//! next. Trigger events are ignored while a planning, moving or talking
//! request is in progress, and a spoken command is confirmed by talking
//! before it reaches planning.

use super::action::{ActionHandle, ActionOutcome};
use super::BehaviorManager;
use crate::bus::{BusEvent, Outbound};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

const REFRESH_PERIOD: Duration = Duration::from_secs(1);

enum Stage {
    Idle,
    Planning(ActionHandle),
    Moving(ActionHandle),
    Talking(ActionHandle),
}

impl Stage {
    fn name(&self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::Planning(_) => "planning",
            Stage::Moving(_) => "moving",
            Stage::Talking(_) => "talking",
        }
    }

    fn is_finished(&self) -> bool {
        match self {
            Stage::Idle => false,
            Stage::Planning(handle) | Stage::Moving(handle) | Stage::Talking(handle) => {
                handle.is_finished()
            }
        }
    }
}

/// Routes bus events to the handler requests they trigger.
pub struct EventRelay {
    stage: Stage,
}

impl Default for EventRelay {
    fn default() -> Self {
        Self::new()
    }
}

impl EventRelay {
    pub fn new() -> Self {
        EventRelay { stage: Stage::Idle }
    }

    /// Name of the request in progress, `"idle"` if there is none
    pub fn stage(&self) -> &'static str {
        self.stage.name()
    }

    /// Notice a request that has finished on its own.
    ///
    /// A finished move is reported by talking. The simulated base has no
    /// localization, so an arrival also moves the pose to the location.
    pub async fn refresh(&mut self, manager: &BehaviorManager) {
        if !self.stage.is_finished() {
            return;
        }
        match std::mem::replace(&mut self.stage, Stage::Idle) {
            Stage::Moving(handle) => {
                let outcome = handle.outcome().await;
                if outcome == ActionOutcome::Succeeded {
                    if let Some(here) = manager.session().current_location() {
                        manager.on_pose(here.x, here.y);
                    }
                }
                // Only the relay preempts a move, and it has moved on already.
                if outcome != ActionOutcome::Preempted {
                    info!(%outcome, "move finished");
                    self.stage = Stage::Talking(manager.talking(outcome.as_str()));
                }
            }
            finished => debug!(stage = finished.name(), "request finished"),
        }
    }

    /// React to one outbound message
    pub async fn handle(&mut self, manager: &BehaviorManager, message: Outbound) {
        self.refresh(manager).await;
        let event = match message {
            Outbound::Event(event) => event,
            Outbound::Emotion(delta) => {
                info!(
                    pleasure = delta.pleasure,
                    arousal = delta.arousal,
                    dominance = delta.dominance,
                    "emotion feedback"
                );
                return;
            }
            Outbound::Speech(text) => {
                info!(%text, "robot says");
                return;
            }
        };

        let next = match (&self.stage, event) {
            (Stage::Idle, BusEvent::Scheduler | BusEvent::Emotional) => {
                Stage::Planning(manager.planning(event.as_str()))
            }
            (Stage::Idle, BusEvent::Command | BusEvent::Information | BusEvent::Feedback) => {
                Stage::Talking(manager.talking(event.as_str()))
            }
            (Stage::Talking(talking), BusEvent::Command) => {
                talking.preempt();
                Stage::Planning(manager.planning(event.as_str()))
            }
            (Stage::Talking(talking), BusEvent::FeedbackCompleted) => {
                talking.preempt();
                Stage::Idle
            }
            (Stage::Planning(planning), BusEvent::StartMoving | BusEvent::StartWandering) => {
                planning.preempt();
                Stage::Moving(manager.moving(event.as_str()))
            }
            (Stage::Moving(moving), BusEvent::WanderingCompleted) => {
                moving.preempt();
                Stage::Planning(manager.planning(BusEvent::Emotional.as_str()))
            }
            (stage, event) => {
                debug!(%event, stage = stage.name(), "event ignored");
                return;
            }
        };
        info!(%event, from = self.stage.name(), to = next.name(), "relaying event");
        self.stage = next;
    }

    /// Relay until the bus closes
    pub async fn run(
        mut self,
        manager: &BehaviorManager,
        outbound: &mut UnboundedReceiver<Outbound>,
    ) {
        let mut refresh = tokio::time::interval(REFRESH_PERIOD);
        refresh.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                message = outbound.recv() => match message {
                    Some(message) => self.handle(manager, message).await,
                    None => break,
                },
                _ = refresh.tick() => self.refresh(manager).await,
            }
        }
        info!("bus closed, relay stopped");
    }
}
