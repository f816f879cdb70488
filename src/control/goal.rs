//! Motion goals and the goal outcome tracker
//!
//! The tracker owns the outcome of the single motion goal the base is
//! working on. Every motion session starts with [`GoalTracker::begin`], which
//! cancels whatever the base is still doing and resets the outcome to
//! pending before anything new is dispatched. Completions reported for an
//! older session are ignored.

use super::MotionBase;
use crate::common::Location;
use chrono::{DateTime, Utc};
use nalgebra::{Point3, UnitQuaternion};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, warn};

/// Pose goal for the motion base.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionGoal {
    /// Map frame the pose is expressed in
    pub frame_id: String,
    pub position: Point3<f64>,
    pub orientation: UnitQuaternion<f64>,
    pub stamp: DateTime<Utc>,
    /// Name of the location the goal was built from, for logging
    pub location_name: String,
}

impl MotionGoal {
    /// Build a goal at `location`, framed in the location's own map.
    pub fn for_location(location: &Location) -> Self {
        MotionGoal {
            frame_id: location.map_name.clone(),
            position: Point3::new(location.x, location.y, location.z),
            orientation: UnitQuaternion::from_euler_angles(
                location.roll,
                location.pitch,
                location.yaw,
            ),
            stamp: Utc::now(),
            location_name: location.name.clone(),
        }
    }
}

/// Status codes reported by the motion base, numbered like actionlib goal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalStatus {
    Pending = 0,
    Active = 1,
    Preempted = 2,
    Succeeded = 3,
    Aborted = 4,
    Rejected = 5,
    Preempting = 6,
    Recalling = 7,
    Recalled = 8,
    Lost = 9,
}

impl GoalStatus {
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => GoalStatus::Pending,
            1 => GoalStatus::Active,
            2 => GoalStatus::Preempted,
            3 => GoalStatus::Succeeded,
            4 => GoalStatus::Aborted,
            5 => GoalStatus::Rejected,
            6 => GoalStatus::Preempting,
            7 => GoalStatus::Recalling,
            8 => GoalStatus::Recalled,
            9 => GoalStatus::Lost,
            _ => return None,
        })
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Tri-state result of the goal in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalOutcome {
    Pending,
    Succeeded,
    Canceled,
}

#[derive(Debug)]
struct GoalState {
    generation: u64,
    outcome: GoalOutcome,
    /// The base has accepted the current goal and is driving toward it.
    engaged: bool,
    outstanding: bool,
    status: Option<GoalStatus>,
    result: Option<String>,
    feedback: Option<String>,
}

impl GoalState {
    fn new() -> Self {
        GoalState {
            generation: 0,
            outcome: GoalOutcome::Pending,
            engaged: false,
            outstanding: false,
            status: None,
            result: None,
            feedback: None,
        }
    }
}

fn lock(state: &Mutex<GoalState>) -> MutexGuard<'_, GoalState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Identifies one motion session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalTicket(u64);

/// Callback surface handed to the motion base with every goal.
#[derive(Debug, Clone)]
pub struct GoalObserver {
    state: Arc<Mutex<GoalState>>,
    generation: u64,
}

impl GoalObserver {
    /// The goal went active on the base
    pub fn on_active(&self) {
        let mut state = lock(&self.state);
        if state.generation == self.generation {
            state.engaged = true;
            state.status = Some(GoalStatus::Active);
            debug!(generation = self.generation, "base goal went active");
        }
    }

    /// Periodic progress from the base
    pub fn on_feedback(&self, feedback: &str) {
        let mut state = lock(&self.state);
        if state.generation == self.generation {
            state.feedback = Some(feedback.to_string());
        }
    }

    /// The goal finished with `status`
    pub fn on_done(&self, status: GoalStatus, result: &str) {
        let mut state = lock(&self.state);
        if state.generation != self.generation {
            debug!(
                generation = self.generation,
                current = state.generation,
                ?status,
                "ignoring completion of a superseded goal"
            );
            return;
        }
        state.outcome = if status == GoalStatus::Succeeded {
            GoalOutcome::Succeeded
        } else {
            GoalOutcome::Canceled
        };
        state.outstanding = false;
        state.status = Some(status);
        state.result = Some(result.to_string());
        debug!(generation = self.generation, ?status, result, "base goal completed");
    }

    /// Outcome of this observer's goal as currently known
    pub fn outcome(&self) -> GoalOutcome {
        let state = lock(&self.state);
        if state.generation == self.generation {
            state.outcome
        } else {
            GoalOutcome::Canceled
        }
    }
}

/// Owner of the goal outcome and the only path through which goals reach the base.
pub struct GoalTracker {
    base: Arc<dyn MotionBase>,
    state: Arc<Mutex<GoalState>>,
    // Serializes begin/dispatch/cancel so base calls from different handlers never interleave.
    dispatch: tokio::sync::Mutex<()>,
    connect_timeout: Duration,
}

impl GoalTracker {
    pub fn new(base: Arc<dyn MotionBase>, connect_timeout: Duration) -> Self {
        GoalTracker {
            base,
            state: Arc::new(Mutex::new(GoalState::new())),
            dispatch: tokio::sync::Mutex::new(()),
            connect_timeout,
        }
    }

    pub fn base(&self) -> &Arc<dyn MotionBase> {
        &self.base
    }

    /// Start a new motion session: cancel any goal still outstanding and reset the outcome.
    pub async fn begin(&self) -> GoalTicket {
        let _guard = self.dispatch.lock().await;
        let outstanding = lock(&self.state).outstanding;
        if outstanding {
            debug!("cancelling outstanding goal before a new session");
            self.base.cancel_all_goals().await;
        }
        let mut state = lock(&self.state);
        state.generation += 1;
        state.outcome = GoalOutcome::Pending;
        state.engaged = false;
        state.outstanding = false;
        state.status = None;
        state.result = None;
        state.feedback = None;
        GoalTicket(state.generation)
    }

    /// Send `goal` for the session identified by `ticket`.
    ///
    /// A base that does not come up within the connect timeout, or refuses
    /// the goal, ends the session as canceled.
    pub async fn dispatch(&self, ticket: GoalTicket, goal: MotionGoal) {
        let _guard = self.dispatch.lock().await;
        if !self.is_current(ticket) {
            debug!(location = %goal.location_name, "session superseded before dispatch");
            return;
        }
        if !self.base.wait_for_server(self.connect_timeout).await {
            warn!(
                timeout = ?self.connect_timeout,
                "unable to connect to the motion base, cancelling the session"
            );
            self.mark_canceled(ticket);
            return;
        }
        let observer = {
            let mut state = lock(&self.state);
            if state.generation != ticket.0 {
                return;
            }
            state.outstanding = true;
            GoalObserver {
                state: Arc::clone(&self.state),
                generation: ticket.0,
            }
        };
        debug!(location = %goal.location_name, frame = %goal.frame_id, "dispatching goal to base");
        if let Err(e) = self.base.send_goal(goal, observer).await {
            warn!(error = %e, "motion base refused the goal");
            self.mark_canceled(ticket);
        }
    }

    /// Ask the base to drop everything, if `ticket` still owns the base.
    pub async fn cancel(&self, ticket: GoalTicket) {
        let _guard = self.dispatch.lock().await;
        if self.is_current(ticket) {
            self.base.cancel_all_goals().await;
        } else {
            debug!("not cancelling, another session owns the base");
        }
    }

    /// Outcome of the session. A superseded session reads as canceled.
    pub fn outcome(&self, ticket: GoalTicket) -> GoalOutcome {
        let state = lock(&self.state);
        if state.generation == ticket.0 {
            state.outcome
        } else {
            GoalOutcome::Canceled
        }
    }

    pub fn is_current(&self, ticket: GoalTicket) -> bool {
        lock(&self.state).generation == ticket.0
    }

    pub fn is_engaged(&self) -> bool {
        lock(&self.state).engaged
    }

    pub fn last_status(&self) -> Option<GoalStatus> {
        lock(&self.state).status
    }

    pub fn last_result(&self) -> Option<String> {
        lock(&self.state).result.clone()
    }

    pub fn latest_feedback(&self) -> Option<String> {
        lock(&self.state).feedback.clone()
    }

    fn mark_canceled(&self, ticket: GoalTicket) {
        let mut state = lock(&self.state);
        if state.generation == ticket.0 {
            state.outcome = GoalOutcome::Canceled;
            state.outstanding = false;
        }
    }
}
