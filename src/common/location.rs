//! Locations, scheduled events and scripted responses supplied by the location store

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// A named place on a map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    /// Map the location belongs to; also the frame of any goal sent there.
    pub map_name: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default)]
    pub roll: f64,
    #[serde(default)]
    pub pitch: f64,
    #[serde(default)]
    pub yaw: f64,
    /// How pleasant the place is; becomes the pleasure delta on arrival.
    #[serde(default)]
    pub environment: f64,
    #[serde(default)]
    pub crowded: bool,
}

impl Location {
    /// Create an uncrowded, neutral location facing along the x axis
    pub fn new(name: &str, map_name: &str, x: f64, y: f64) -> Self {
        Location {
            name: name.to_string(),
            map_name: map_name.to_string(),
            x,
            y,
            z: 0.0,
            roll: 0.0,
            pitch: 0.0,
            yaw: 0.0,
            environment: 0.0,
            crowded: false,
        }
    }

    pub fn with_environment(mut self, environment: f64) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_crowded(mut self, crowded: bool) -> Self {
        self.crowded = crowded;
        self
    }

    pub fn with_yaw(mut self, yaw: f64) -> Self {
        self.yaw = yaw;
        self
    }

    /// Planar distance from a point
    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        let dx = self.x - x;
        let dy = self.y - y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// An event on the robot's calendar, tied to the location it takes place at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub name: String,
    pub location: Location,
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
}

impl ScheduledEvent {
    pub fn is_ongoing(&self, at: DateTime<Local>) -> bool {
        self.start <= at && at < self.end
    }
}

/// Placeholder replaced by a location name in scripted responses.
pub const LOCATION_PLACEHOLDER: &str = "LOCATION";

/// A scripted line the robot can speak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub response_type: String,
    pub emotion: String,
    pub message: String,
}

impl Response {
    /// Render the message for a location
    pub fn render(&self, location: &str) -> String {
        self.message.replace(LOCATION_PLACEHOLDER, location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn response_substitutes_location() {
        let response = Response {
            response_type: "navigation_response".to_string(),
            emotion: "happy".to_string(),
            message: "I love LOCATION!".to_string(),
        };
        assert_eq!(response.render("the cafeteria"), "I love the cafeteria!");
    }

    #[test]
    fn event_window_is_half_open() {
        let now = Local::now();
        let event = ScheduledEvent {
            name: "lecture".to_string(),
            location: Location::new("auditorium", "ntnu2.map", 4.0, 2.0),
            start: now - Duration::minutes(5),
            end: now + Duration::minutes(5),
        };
        assert!(event.is_ongoing(now));
        assert!(!event.is_ongoing(event.end));
        assert!(!event.is_ongoing(now - Duration::minutes(10)));
    }

    #[test]
    fn location_deserializes_with_defaults() {
        let location: Location = serde_json::from_str(
            r#"{ "name": "lab", "map_name": "ntnu2.map", "x": 1.0, "y": 2.0 }"#,
        )
        .unwrap();
        assert_eq!(location, Location::new("lab", "ntnu2.map", 1.0, 2.0));
        assert!((location.distance_to(4.0, 6.0) - 5.0).abs() < 1e-9);
    }
}
