//! Common utilities and types for Prometheus behaviors
pub mod emotion;
pub mod location;

pub use self::emotion::{AffectClass, Emotion, PadDelta};
pub use self::location::{Location, Response, ScheduledEvent};

/// Common types and utilities used across the codebase
pub mod types {
    /// A 2D point (x, y), as reported by the localization pose stream
    pub type Point2D = (f64, f64);
}
