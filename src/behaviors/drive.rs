//! Goal execution shared by the moving and go-to handlers

use super::wait::{Deadline, Invocation};
use super::BehaviorContext;
use crate::common::Location;
use crate::control::{GoalOutcome, MotionGoal};
use std::time::Duration;
use tracing::{debug, info};

/// How a drive ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DriveEnd {
    Arrived,
    Preempted,
    /// The base gave up on the goal, or never took it
    Canceled,
    TimedOut,
}

/// Send the robot to `location` and follow the goal until it ends.
///
/// Checks preemption first on every tick, then the goal outcome, then the
/// optional ceiling; `on_tick` runs on ticks where nothing ended. A
/// preempted or timed-out drive cancels the goal before returning. Arrival
/// is recorded as the session's current location.
pub(crate) async fn drive_to(
    ctx: &BehaviorContext,
    location: &Location,
    inv: &Invocation,
    limit: Option<Duration>,
    mut on_tick: impl FnMut() + Send,
) -> DriveEnd {
    let ticket = ctx.goals.begin().await;
    ctx.goals
        .dispatch(ticket, MotionGoal::for_location(location))
        .await;
    let deadline = limit.map(Deadline::start);

    loop {
        if inv.is_preempted() {
            ctx.goals.cancel(ticket).await;
            return DriveEnd::Preempted;
        }
        match ctx.goals.outcome(ticket) {
            GoalOutcome::Succeeded => {
                info!(location = %location.name, "arrived");
                ctx.session.arrive_at(location.clone());
                return DriveEnd::Arrived;
            }
            GoalOutcome::Canceled => {
                debug!(
                    location = %location.name,
                    status = ?ctx.goals.last_status(),
                    result = ?ctx.goals.last_result(),
                    progress = ?ctx.goals.latest_feedback(),
                    "goal canceled by the base"
                );
                return DriveEnd::Canceled;
            }
            GoalOutcome::Pending => {}
        }
        if deadline.is_some_and(|d| d.expired()) {
            info!(
                location = %location.name,
                ?limit,
                progress = ?ctx.goals.latest_feedback(),
                "drive timed out"
            );
            ctx.goals.cancel(ticket).await;
            return DriveEnd::TimedOut;
        }
        on_tick();
        inv.pause().await;
    }
}
