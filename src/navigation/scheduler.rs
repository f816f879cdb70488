//! Calendar watcher
//!
//! Runs for the lifetime of the orchestrator at a fixed low rate. Each tick
//! resolves where the robot is from the latest pose and checks the calendar;
//! if an event is going on somewhere else, a re-planning event is raised.
//! The scheduler never touches `current_location`: only a confirmed arrival
//! does that.

use super::LocationStore;
use crate::bus::{BusEvent, FeedbackBus};
use crate::session::Session;
use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Background loop raising `navigation_schedualer` events
pub struct LocationScheduler {
    map_name: String,
    period: Duration,
    session: Session,
    store: Arc<dyn LocationStore>,
    bus: Arc<dyn FeedbackBus>,
}

impl LocationScheduler {
    pub fn new(
        map_name: &str,
        period: Duration,
        session: Session,
        store: Arc<dyn LocationStore>,
        bus: Arc<dyn FeedbackBus>,
    ) -> Self {
        LocationScheduler {
            map_name: map_name.to_string(),
            period,
            session,
            store,
            bus,
        }
    }

    /// Run one check at time `now`. Returns whether a re-planning event was raised.
    pub fn tick(&self, now: DateTime<Local>) -> bool {
        let (x, y) = self.session.current_pose();
        let here = self.store.find_location(&self.map_name, x, y);
        let here_name = here.as_ref().map(|l| l.name.as_str()).unwrap_or("");
        match self.store.ongoing_event(&self.map_name, now) {
            Some(event) if event.location.name != here_name => {
                debug!(
                    event = %event.name,
                    target = %event.location.name,
                    here = here_name,
                    "ongoing event elsewhere"
                );
                self.bus.publish_event(BusEvent::Scheduler);
                true
            }
            _ => false,
        }
    }

    /// Spawn the loop; it stops when `shutdown` is cancelled.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(period = ?self.period, map = %self.map_name, "location scheduler started");
            let mut interval = tokio::time::interval(self.period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = interval.tick() => {
                        self.tick(Local::now());
                    }
                }
            }
            info!("location scheduler stopped");
        })
    }
}
