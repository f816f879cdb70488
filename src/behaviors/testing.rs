//! Shared setup for the handler tests

use super::BehaviorContext;
use crate::bus::{ChannelBus, Outbound};
use crate::common::{Location, ScheduledEvent};
use crate::config::BehaviorConfig;
use crate::control::SimulatedBase;
use crate::navigation::{MemoryLocationStore, NAVIGATION_RESPONSE};
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

pub(crate) const MAP: &str = "ntnu2.map";

pub(crate) struct Fixture {
    pub ctx: Arc<BehaviorContext>,
    pub base: Arc<SimulatedBase>,
    pub outbound: UnboundedReceiver<Outbound>,
}

/// Office is quiet, cafeteria and auditorium are crowded, and a seminar is
/// on in the auditorium right now.
pub(crate) fn store() -> MemoryLocationStore {
    let now = Local::now();
    let auditorium = Location::new("auditorium", MAP, 20.0, 5.0)
        .with_environment(0.4)
        .with_crowded(true);
    MemoryLocationStore::new()
        .with_location(Location::new("office", MAP, 0.0, 0.0).with_environment(0.2))
        .with_location(
            Location::new("cafeteria", MAP, 10.0, 0.0)
                .with_environment(0.5)
                .with_crowded(true),
        )
        .with_location(auditorium.clone())
        .with_event(ScheduledEvent {
            name: "robotics seminar".to_string(),
            location: auditorium,
            start: now - chrono::Duration::hours(1),
            end: now + chrono::Duration::hours(1),
        })
        .with_response(NAVIGATION_RESPONSE, "happy", "I love being in the LOCATION")
        .with_response(NAVIGATION_RESPONSE, "neutral", "The LOCATION is all right")
}

pub(crate) fn fixture() -> Fixture {
    fixture_with_base(SimulatedBase::new(Duration::from_secs(5)))
}

pub(crate) fn fixture_with_base(base: SimulatedBase) -> Fixture {
    let base = Arc::new(base);
    let (bus, outbound) = ChannelBus::new();
    let ctx = BehaviorContext::new(
        BehaviorConfig::default(),
        base.clone(),
        Arc::new(store()),
        Arc::new(bus),
    );
    Fixture {
        ctx: Arc::new(ctx),
        base,
        outbound,
    }
}
