//! In-memory location store
//!
//! Holds locations, events and responses loaded from a JSON document:
//!
//! ```json
//! { "locations": [...], "events": [...], "responses": [...] }
//! ```

use super::LocationStore;
use crate::common::{Emotion, Location, Response, ScheduledEvent};
use crate::error::Result;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_radius() -> f64 {
    1.5
}

/// Location store backed by plain vectors
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryLocationStore {
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub events: Vec<ScheduledEvent>,
    #[serde(default)]
    pub responses: Vec<Response>,
    /// A pose within this distance (m) of a location counts as being there
    #[serde(default = "default_radius")]
    pub radius: f64,
}

impl MemoryLocationStore {
    /// Create an empty store
    pub fn new() -> Self {
        MemoryLocationStore {
            radius: default_radius(),
            ..Default::default()
        }
    }

    /// Load a store from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.push(location);
        self
    }

    pub fn with_event(mut self, event: ScheduledEvent) -> Self {
        self.events.push(event);
        self
    }

    pub fn with_response(mut self, response_type: &str, emotion: &str, message: &str) -> Self {
        self.responses.push(Response {
            response_type: response_type.to_string(),
            emotion: emotion.to_string(),
            message: message.to_string(),
        });
        self
    }
}

impl LocationStore for MemoryLocationStore {
    fn find_location(&self, map_name: &str, x: f64, y: f64) -> Option<Location> {
        self.locations
            .iter()
            .filter(|l| l.map_name == map_name)
            .map(|l| (l, l.distance_to(x, y)))
            .filter(|(_, d)| *d <= self.radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(l, _)| l.clone())
    }

    fn ongoing_event(&self, map_name: &str, at: DateTime<Local>) -> Option<ScheduledEvent> {
        self.events
            .iter()
            .find(|e| e.location.map_name == map_name && e.is_ongoing(at))
            .cloned()
    }

    fn location_by_crowding(&self, map_name: &str, crowded: bool) -> Option<Location> {
        self.locations
            .iter()
            .find(|l| l.map_name == map_name && l.crowded == crowded)
            .cloned()
    }

    fn location_by_name(&self, name: &str) -> Option<Location> {
        self.locations
            .iter()
            .find(|l| l.name.eq_ignore_ascii_case(name.trim()))
            .cloned()
    }

    fn all_locations(&self) -> Vec<Location> {
        self.locations.clone()
    }

    fn response_by(&self, response_type: &str, emotion: &Emotion) -> Option<Response> {
        self.responses
            .iter()
            .find(|r| r.response_type == response_type && r.emotion == emotion.label())
            .cloned()
    }
}
