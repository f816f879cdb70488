//! Speech input handling
//!
//! Transcribed utterances are scanned for navigation requests, and answers
//! to yes/no questions go to the [`Dialogue`] that asked them.
pub mod dialogue;

pub use self::dialogue::{Answer, Dialogue, DialogueOutcome};

use crate::bus::BusEvent;
use crate::common::Location;

/// A navigation request heard in an utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct SpokenRequest {
    /// Event to raise for the request
    pub event: BusEvent,
    pub location: Location,
}

const GO_KEYWORDS: [&str; 3] = ["go to ", "move to", "go "];
const WHERE_KEYWORDS: [&str; 1] = ["where is "];
const OPINION_KEYWORDS: [&str; 2] = ["think of ", "think about "];

/// Find a navigation request in `text` naming one of `locations`.
///
/// "go to"/"move to" asks the robot to go there, "where is" asks for
/// directions and "think of"/"think about" asks for an opinion. When several
/// locations are named, the last one in `locations` wins.
pub fn parse_request(text: &str, locations: &[Location]) -> Option<SpokenRequest> {
    let text = text.to_lowercase();
    let contains_any = |keywords: &[&str]| keywords.iter().any(|k| text.contains(k));
    let event = if contains_any(&GO_KEYWORDS) {
        BusEvent::Command
    } else if contains_any(&WHERE_KEYWORDS) {
        BusEvent::Information
    } else if contains_any(&OPINION_KEYWORDS) {
        BusEvent::Feedback
    } else {
        return None;
    };
    locations
        .iter()
        .rev()
        .find(|l| !l.name.is_empty() && text.contains(&l.name.to_lowercase()))
        .map(|location| SpokenRequest {
            event,
            location: location.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locations() -> Vec<Location> {
        vec![
            Location::new("cafeteria", "ntnu2.map", 10.0, 0.0),
            Location::new("Robotics Lab", "ntnu2.map", 0.0, 5.0),
        ]
    }

    #[test]
    fn recognizes_each_request_kind() {
        let locations = locations();
        let go = parse_request("Please go to the cafeteria", &locations).unwrap();
        assert_eq!(go.event, BusEvent::Command);
        assert_eq!(go.location.name, "cafeteria");

        let ask = parse_request("where is the robotics lab?", &locations).unwrap();
        assert_eq!(ask.event, BusEvent::Information);
        assert_eq!(ask.location.name, "Robotics Lab");

        let opinion = parse_request("what do you think about the cafeteria", &locations).unwrap();
        assert_eq!(opinion.event, BusEvent::Feedback);
    }

    #[test]
    fn ignores_unknown_places_and_chatter() {
        let locations = locations();
        assert!(parse_request("go to the moon", &locations).is_none());
        assert!(parse_request("the cafeteria is nice", &locations).is_none());
        assert!(parse_request("yes please", &locations).is_none());
    }
}
