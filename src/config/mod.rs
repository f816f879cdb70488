//! Configuration for the behavior layer
//!
//! Parameters can be loaded from a JSON file or tuned at runtime with a
//! `name -> value` parameter map, the same way the navigation components
//! take their parameters.

use crate::error::{BehaviorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Timeouts, rates and map settings shared by every handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Map the robot operates in; used as the motion goal frame and for store queries.
    pub map_name: String,
    pub scheduler_period_secs: f64,
    /// Interval between re-checks inside every wait loop.
    pub poll_interval_secs: f64,
    pub planning_timeout_secs: f64,
    pub moving_timeout_secs: f64,
    pub talking_timeout_secs: f64,
    /// Period of the emotion pulses sent while moving or wandering.
    pub feedback_period_secs: f64,
    /// Bound on waiting for the motion base before a goal is given up.
    pub connect_timeout_secs: f64,
    /// Bound on the `wander` and `stop` service calls.
    pub service_timeout_secs: f64,
    pub planning_settle_secs: f64,
    pub talking_settle_secs: f64,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        BehaviorConfig {
            map_name: "ntnu2.map".to_string(),
            scheduler_period_secs: 1.0,
            poll_interval_secs: 2.0,
            planning_timeout_secs: 60.0,
            moving_timeout_secs: 1000.0,
            talking_timeout_secs: 60.0,
            feedback_period_secs: 15.0,
            connect_timeout_secs: 5.0,
            service_timeout_secs: 5.0,
            planning_settle_secs: 2.0,
            talking_settle_secs: 4.0,
        }
    }
}

impl BehaviorConfig {
    /// Load a configuration from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: BehaviorConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Configure the behavior layer with parameters
    pub fn configure(&mut self, params: &HashMap<String, f64>) -> Result<()> {
        let mut updated = self.clone();
        for (name, &value) in params {
            let slot = match name.as_str() {
                "scheduler_period" => &mut updated.scheduler_period_secs,
                "poll_interval" => &mut updated.poll_interval_secs,
                "planning_timeout" => &mut updated.planning_timeout_secs,
                "moving_timeout" => &mut updated.moving_timeout_secs,
                "talking_timeout" => &mut updated.talking_timeout_secs,
                "feedback_period" => &mut updated.feedback_period_secs,
                "connect_timeout" => &mut updated.connect_timeout_secs,
                "service_timeout" => &mut updated.service_timeout_secs,
                "planning_settle" => &mut updated.planning_settle_secs,
                "talking_settle" => &mut updated.talking_settle_secs,
                _ => return Err(BehaviorError::UnknownParameter(name.clone())),
            };
            *slot = value;
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let positive = [
            ("scheduler_period", self.scheduler_period_secs),
            ("poll_interval", self.poll_interval_secs),
            ("planning_timeout", self.planning_timeout_secs),
            ("moving_timeout", self.moving_timeout_secs),
            ("talking_timeout", self.talking_timeout_secs),
            ("feedback_period", self.feedback_period_secs),
            ("connect_timeout", self.connect_timeout_secs),
            ("service_timeout", self.service_timeout_secs),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(BehaviorError::InvalidParameter {
                    name: name.to_string(),
                    reason: format!("must be positive, got {}", value),
                });
            }
            check_duration(name, value)?;
        }
        for (name, value) in [
            ("planning_settle", self.planning_settle_secs),
            ("talking_settle", self.talking_settle_secs),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(BehaviorError::InvalidParameter {
                    name: name.to_string(),
                    reason: format!("must be non-negative, got {}", value),
                });
            }
            check_duration(name, value)?;
        }
        if self.map_name.is_empty() {
            return Err(BehaviorError::InvalidParameter {
                name: "map_name".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn scheduler_period(&self) -> Duration {
        Duration::from_secs_f64(self.scheduler_period_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs_f64(self.poll_interval_secs)
    }

    pub fn planning_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.planning_timeout_secs)
    }

    pub fn moving_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.moving_timeout_secs)
    }

    pub fn talking_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.talking_timeout_secs)
    }

    pub fn feedback_period(&self) -> Duration {
        Duration::from_secs_f64(self.feedback_period_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.connect_timeout_secs)
    }

    pub fn service_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.service_timeout_secs)
    }

    pub fn planning_settle(&self) -> Duration {
        Duration::from_secs_f64(self.planning_settle_secs)
    }

    pub fn talking_settle(&self) -> Duration {
        Duration::from_secs_f64(self.talking_settle_secs)
    }
}

fn check_duration(name: &str, secs: f64) -> Result<()> {
    Duration::try_from_secs_f64(secs)
        .map(|_| ())
        .map_err(|e| BehaviorError::InvalidParameter {
            name: name.to_string(),
            reason: format!("{} is not a usable duration: {}", secs, e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_handler_ceilings() {
        let config = BehaviorConfig::default();
        assert_eq!(config.planning_timeout(), Duration::from_secs(60));
        assert_eq!(config.moving_timeout(), Duration::from_secs(1000));
        assert_eq!(config.talking_timeout(), Duration::from_secs(60));
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn configure_updates_known_parameters() {
        let mut config = BehaviorConfig::default();
        let mut params = HashMap::new();
        params.insert("moving_timeout".to_string(), 300.0);
        params.insert("poll_interval".to_string(), 0.5);
        config.configure(&params).unwrap();
        assert_eq!(config.moving_timeout(), Duration::from_secs(300));
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
    }

    #[test]
    fn configure_rejects_durations_too_long_to_represent() {
        let mut config = BehaviorConfig::default();
        let mut params = HashMap::new();
        params.insert("moving_timeout".to_string(), 1e20);
        assert!(matches!(
            config.configure(&params),
            Err(BehaviorError::InvalidParameter { ref name, .. }) if name == "moving_timeout"
        ));
        assert_eq!(config, BehaviorConfig::default());
        assert_eq!(config.moving_timeout(), Duration::from_secs(1000));

        let from_file: BehaviorConfig =
            serde_json::from_str(r#"{"talking_settle_secs": 1e20}"#).unwrap();
        assert!(from_file.validate().is_err());
    }

    #[test]
    fn configure_rejects_bad_values_without_partial_update() {
        let mut config = BehaviorConfig::default();
        let mut params = HashMap::new();
        params.insert("moving_timeout".to_string(), 300.0);
        params.insert("talking_timeout".to_string(), -1.0);
        assert!(matches!(
            config.configure(&params),
            Err(BehaviorError::InvalidParameter { .. })
        ));
        assert_eq!(config, BehaviorConfig::default());

        let mut params = HashMap::new();
        params.insert("warp_speed".to_string(), 9.0);
        assert!(matches!(
            config.configure(&params),
            Err(BehaviorError::UnknownParameter(_))
        ));
    }

    #[test]
    fn json_keeps_defaults_for_missing_fields() {
        let config: BehaviorConfig =
            serde_json::from_str(r#"{ "map_name": "lab.map", "talking_timeout_secs": 30 }"#)
                .unwrap();
        assert_eq!(config.map_name, "lab.map");
        assert_eq!(config.talking_timeout(), Duration::from_secs(30));
        assert_eq!(config.planning_timeout(), Duration::from_secs(60));
    }
}
