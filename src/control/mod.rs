//! Control module for Prometheus behaviors
//!
//! The physical motion planner and controller live outside this crate. This
//! module defines the contract the behaviors use to drive them and the
//! tracker that keeps at most one goal in flight.
pub mod goal;
pub mod sim;

pub use self::goal::{GoalObserver, GoalOutcome, GoalStatus, GoalTicket, GoalTracker, MotionGoal};
pub use self::sim::{BaseCall, SimulatedBase};

use crate::error::{BehaviorError, Result};
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use tracing::warn;

/// Client side of the robot base's motion interface.
///
/// Goals are asynchronous: `send_goal` returns once the goal is handed over
/// and the base reports progress through the [`GoalObserver`].
#[async_trait]
pub trait MotionBase: Send + Sync {
    /// Wait up to `timeout` for the goal server. Returns false if it never showed up.
    async fn wait_for_server(&self, timeout: Duration) -> bool;

    /// Hand a pose goal to the base
    async fn send_goal(&self, goal: MotionGoal, observer: GoalObserver) -> Result<()>;

    /// Cancel every goal the base is working on
    async fn cancel_all_goals(&self);

    /// Start the base's own wandering behavior
    async fn wander(&self) -> Result<()>;

    /// Stop the base
    async fn stop(&self) -> Result<()>;
}

/// Parameterless services offered by the base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseService {
    Wander,
    Stop,
}

impl fmt::Display for BaseService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseService::Wander => f.write_str("wander"),
            BaseService::Stop => f.write_str("stop"),
        }
    }
}

/// Call a base service, waiting at most `timeout`.
///
/// Failures are logged and swallowed so the caller's preemption and timeout
/// handling carries on. Returns whether the call went through.
pub async fn call_service(base: &dyn MotionBase, service: BaseService, timeout: Duration) -> bool {
    let call = async {
        match service {
            BaseService::Wander => base.wander().await,
            BaseService::Stop => base.stop().await,
        }
    };
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            warn!(%service, error = %e, "base service call failed");
            false
        }
        Err(_) => {
            let e = BehaviorError::BaseUnavailable(timeout);
            warn!(%service, error = %e, "base service did not answer");
            false
        }
    }
}
