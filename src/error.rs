//! Error types for the behavior layer

use thiserror::Error;

/// Errors raised while configuring or wiring the behavior layer.
///
/// Handler invocations never surface these: they always end in an
/// [`ActionOutcome`](crate::behaviors::ActionOutcome).
#[derive(Debug, Error)]
pub enum BehaviorError {
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("unknown parameter {0}")]
    UnknownParameter(String),

    #[error("motion base not reachable within {0:?}")]
    BaseUnavailable(std::time::Duration),

    #[error("service {service} failed: {reason}")]
    Service { service: String, reason: String },

    #[error("lifecycle transition {transition} not allowed from {state:?}")]
    Lifecycle {
        transition: &'static str,
        state: crate::lifecycle::State,
    },

    #[error("no async runtime available to {0}")]
    NoRuntime(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, BehaviorError>;
