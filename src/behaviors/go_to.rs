//! Go-to: drive straight to a named location
//!
//! Used by callers outside the planning cycle. There is no ceiling; the
//! caller stops a drive by preempting it.

use super::action::{ActionOutcome, FeedbackSender};
use super::drive::{drive_to, DriveEnd};
use super::wait::Invocation;
use super::BehaviorContext;
use std::sync::Arc;
use tracing::{info, warn};

/// Progress published while driving
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoToFeedback {
    Moving,
}

impl GoToFeedback {
    pub fn status(&self) -> &'static str {
        match self {
            GoToFeedback::Moving => "moving",
        }
    }
}

pub struct GoToBehavior {
    ctx: Arc<BehaviorContext>,
}

impl GoToBehavior {
    pub fn new(ctx: Arc<BehaviorContext>) -> Self {
        GoToBehavior { ctx }
    }

    /// Drive to the location called `name`.
    pub async fn execute(
        &self,
        name: &str,
        inv: Invocation,
        feedback: FeedbackSender<GoToFeedback>,
    ) -> ActionOutcome {
        let Some(location) = self.ctx.store.location_by_name(name) else {
            warn!(location = name, "no such location, not moving");
            return ActionOutcome::Aborted;
        };
        info!(location = %location.name, "going to");
        let end = drive_to(&self.ctx, &location, &inv, None, || {
            let _ = feedback.send(GoToFeedback::Moving);
        })
        .await;
        match end {
            DriveEnd::Arrived => ActionOutcome::Succeeded,
            DriveEnd::Preempted => ActionOutcome::Preempted,
            DriveEnd::Canceled | DriveEnd::TimedOut => ActionOutcome::Aborted,
        }
    }
}
