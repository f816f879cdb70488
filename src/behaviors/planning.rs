//! Planning: pick where to go next
//!
//! Chooses a target from the triggering event and the current emotion,
//! nudges dominance, and raises the matching start event. Afterwards it
//! waits to be preempted by the state machine moving on, and gives up
//! after the planning ceiling if nothing happens.

use super::action::ActionOutcome;
use super::wait::{Invocation, WaitEnd};
use super::BehaviorContext;
use crate::bus::BusEvent;
use crate::common::{AffectClass, Emotion, Location, PadDelta};
use crate::session::Target;
use chrono::Local;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Events the planner reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanningEvent {
    Scheduler,
    Emotional,
    Command,
}

impl PlanningEvent {
    pub fn parse(tag: &str) -> Option<Self> {
        match BusEvent::from_name(tag)? {
            BusEvent::Scheduler => Some(PlanningEvent::Scheduler),
            BusEvent::Emotional => Some(PlanningEvent::Emotional),
            BusEvent::Command => Some(PlanningEvent::Command),
            _ => None,
        }
    }
}

/// A planning decision
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub target: Target,
    pub delta: PadDelta,
    pub start: BusEvent,
}

impl Plan {
    fn moving(target: Option<Location>, dominance: f64) -> Option<Plan> {
        target.map(|location| Plan {
            target: Target::Location(location),
            delta: PadDelta::dominance(dominance),
            start: BusEvent::StartMoving,
        })
    }
}

/// The planning handler
pub struct PlanningBehavior {
    ctx: Arc<BehaviorContext>,
}

impl PlanningBehavior {
    pub fn new(ctx: Arc<BehaviorContext>) -> Self {
        PlanningBehavior { ctx }
    }

    /// Decide what to do for `event` in `emotion`. `None` if there is nowhere to go.
    pub fn select(&self, event: PlanningEvent, emotion: &Emotion) -> Option<Plan> {
        let store = &self.ctx.store;
        let map = self.ctx.config.map_name.as_str();
        match event {
            PlanningEvent::Scheduler => {
                if *emotion == Emotion::Angry {
                    Plan::moving(store.location_by_crowding(map, false), 0.1)
                } else {
                    let event_location = store.ongoing_event(map, Local::now()).map(|e| e.location);
                    Plan::moving(event_location, -0.1)
                }
            }
            PlanningEvent::Emotional => match emotion.affect_class() {
                AffectClass::Negative => Plan::moving(store.location_by_crowding(map, false), 0.1),
                AffectClass::Positive => Plan::moving(store.location_by_crowding(map, true), 0.1),
                AffectClass::LowArousal => Some(Plan {
                    target: Target::Wandering,
                    delta: PadDelta::dominance(0.1),
                    start: BusEvent::StartWandering,
                }),
                AffectClass::Unclassified => None,
            },
            PlanningEvent::Command => Plan::moving(self.ctx.session.command_location(), -0.2),
        }
    }

    /// Serve one planning request
    pub async fn execute(&self, tag: &str, inv: Invocation) -> ActionOutcome {
        let Some(event) = PlanningEvent::parse(tag) else {
            warn!(event = tag, "planning received an event it cannot handle");
            return ActionOutcome::Aborted;
        };
        debug!(?event, "planning");
        if !inv.settle(self.ctx.config.planning_settle()).await {
            return ActionOutcome::Preempted;
        }

        self.ctx.session.set_next_location(None);
        let emotion = self.ctx.session.current_emotion();
        let Some(plan) = self.select(event, &emotion) else {
            info!(?event, %emotion, "no target to plan for");
            return ActionOutcome::Aborted;
        };

        if let Target::Location(location) = &plan.target {
            info!(?event, %emotion, target = %location.name, "planned move");
        } else {
            info!(?event, %emotion, "planned wandering");
        }
        self.ctx.session.set_next_location(Some(plan.target));
        self.ctx.bus.publish_emotion(plan.delta);
        self.ctx.bus.publish_event(plan.start);

        match inv.hold(self.ctx.config.planning_timeout()).await {
            WaitEnd::Preempted => ActionOutcome::Preempted,
            WaitEnd::Expired => {
                warn!("nobody picked up the plan, giving up");
                ActionOutcome::Aborted
            }
        }
    }
}
