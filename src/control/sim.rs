//! In-process stand-in for the robot base
//!
//! Drives goals on a timer instead of real hardware. Used by the simulation
//! binary and the tests, which can inspect every call it received.

use super::{GoalObserver, GoalOutcome, GoalStatus, MotionBase, MotionGoal};
use crate::error::{BehaviorError, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A call received by the simulated base.
#[derive(Debug, Clone, PartialEq)]
pub enum BaseCall {
    Goal {
        goal: MotionGoal,
        /// Outcome the tracker reported for this goal when it was handed over
        outcome_at_dispatch: GoalOutcome,
    },
    Cancel,
    Wander,
    Stop,
}

/// How the simulated base reacts to goals
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GoalBehavior {
    /// Arrive after the travel time
    Arrive,
    /// Report the goal aborted after the travel time
    Fail,
    /// Drive forever until cancelled
    Stall,
}

#[derive(Default)]
struct SimState {
    calls: Vec<BaseCall>,
    next_id: u64,
    active: Option<(u64, CancellationToken, GoalObserver)>,
}

/// Simulated robot base
pub struct SimulatedBase {
    travel_time: Duration,
    behavior: GoalBehavior,
    online: bool,
    services: bool,
    state: Arc<Mutex<SimState>>,
}

impl SimulatedBase {
    /// Create a base that reaches every goal after `travel_time`
    pub fn new(travel_time: Duration) -> Self {
        SimulatedBase {
            travel_time,
            behavior: GoalBehavior::Arrive,
            online: true,
            services: true,
            state: Arc::new(Mutex::new(SimState::default())),
        }
    }

    /// Never finish a goal on its own
    pub fn stalled(mut self) -> Self {
        self.behavior = GoalBehavior::Stall;
        self
    }

    /// Abort every goal after the travel time
    pub fn failing(mut self) -> Self {
        self.behavior = GoalBehavior::Fail;
        self
    }

    /// Never answer `wait_for_server`
    pub fn offline(mut self) -> Self {
        self.online = false;
        self
    }

    /// Fail the `wander` and `stop` services
    pub fn without_services(mut self) -> Self {
        self.services = false;
        self
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<BaseCall> {
        self.lock().calls.clone()
    }

    pub fn goals(&self) -> Vec<MotionGoal> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                BaseCall::Goal { goal, .. } => Some(goal.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn cancel_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| matches!(call, BaseCall::Cancel))
            .count()
    }

    fn service(&self, call: BaseCall, name: &str) -> Result<()> {
        self.lock().calls.push(call);
        if self.services {
            Ok(())
        } else {
            Err(BehaviorError::Service {
                service: name.to_string(),
                reason: "service not available".to_string(),
            })
        }
    }
}

#[async_trait]
impl MotionBase for SimulatedBase {
    async fn wait_for_server(&self, timeout: Duration) -> bool {
        if !self.online {
            tokio::time::sleep(timeout).await;
        }
        self.online
    }

    async fn send_goal(&self, goal: MotionGoal, observer: GoalObserver) -> Result<()> {
        let token = CancellationToken::new();
        let (id, previous) = {
            let mut state = self.lock();
            state.calls.push(BaseCall::Goal {
                goal: goal.clone(),
                outcome_at_dispatch: observer.outcome(),
            });
            state.next_id += 1;
            let id = state.next_id;
            (id, state.active.replace((id, token.clone(), observer.clone())))
        };
        if let Some((_, old_token, old_observer)) = previous {
            old_token.cancel();
            old_observer.on_done(GoalStatus::Preempted, "superseded");
        }

        let travel_time = self.travel_time;
        let behavior = self.behavior;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            observer.on_active();
            let step = Duration::from_secs(1);
            let mut travelled = Duration::ZERO;
            loop {
                if behavior != GoalBehavior::Stall && travelled >= travel_time {
                    break;
                }
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(step) => {}
                }
                travelled += step;
                observer.on_feedback(&format!("travelled {}s", travelled.as_secs()));
            }
            // Only finish if this goal is still the one being driven.
            let finished = {
                let mut state = state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                let current = matches!(&state.active, Some((active, _, _)) if *active == id);
                if current {
                    state.active = None;
                }
                current
            };
            if finished {
                match behavior {
                    GoalBehavior::Fail => observer.on_done(GoalStatus::Aborted, "blocked"),
                    _ => observer.on_done(GoalStatus::Succeeded, "arrived"),
                }
            }
        });
        debug!(location = %goal.location_name, "simulated base accepted goal");
        Ok(())
    }

    async fn cancel_all_goals(&self) {
        let active = {
            let mut state = self.lock();
            state.calls.push(BaseCall::Cancel);
            state.active.take()
        };
        if let Some((_, token, observer)) = active {
            token.cancel();
            observer.on_done(GoalStatus::Preempted, "canceled");
        }
    }

    async fn wander(&self) -> Result<()> {
        self.service(BaseCall::Wander, "wander")
    }

    async fn stop(&self) -> Result<()> {
        self.service(BaseCall::Stop, "stop")
    }
}
