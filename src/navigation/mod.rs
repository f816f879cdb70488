//! Navigation module for Prometheus behaviors
//!
//! Where the robot is and where it could go. Locations, calendar events and
//! scripted lines come from a [`LocationStore`]; the [`LocationScheduler`]
//! watches the calendar and asks for re-planning when the robot is away
//! from an ongoing event.
pub mod scheduler;
pub mod store;

pub use self::scheduler::LocationScheduler;
pub use self::store::MemoryLocationStore;

use crate::common::{Emotion, Location, Response, ScheduledEvent};
use chrono::{DateTime, Local};

/// Response type of the lines spoken about locations.
pub const NAVIGATION_RESPONSE: &str = "navigation_response";

/// Query surface of the location and event database
pub trait LocationStore: Send + Sync {
    /// Location the point (x, y) on `map_name` falls in, if any
    fn find_location(&self, map_name: &str, x: f64, y: f64) -> Option<Location>;

    /// Event taking place on `map_name` at `at`, if any
    fn ongoing_event(&self, map_name: &str, at: DateTime<Local>) -> Option<ScheduledEvent>;

    /// Some location on `map_name` that is (or is not) crowded
    fn location_by_crowding(&self, map_name: &str, crowded: bool) -> Option<Location>;

    /// Location with the given name
    fn location_by_name(&self, name: &str) -> Option<Location>;

    /// Every known location
    fn all_locations(&self) -> Vec<Location>;

    /// A scripted line of `response_type` for `emotion`
    fn response_by(&self, response_type: &str, emotion: &Emotion) -> Option<Response>;
}
