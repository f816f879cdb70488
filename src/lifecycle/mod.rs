//! Lifecycle management for Prometheus behavior components

use crate::error::{BehaviorError, Result};
use std::any::Any;

/// Trait for components that follow a lifecycle pattern
pub trait LifecycleNode: Send + Sync {
    /// Configure the node
    fn on_configure(&mut self) -> Result<()>;

    /// Activate the node
    fn on_activate(&mut self) -> Result<()>;

    /// Deactivate the node
    fn on_deactivate(&mut self) -> Result<()>;

    /// Clean up the node
    fn on_cleanup(&mut self) -> Result<()>;

    /// Convert to Any for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Base implementation for lifecycle nodes
#[derive(Debug)]
pub struct LifecycleNodeBase {
    pub name: String,
    state: State,
}

/// State of a lifecycle node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Unconfigured,
    Inactive,
    Active,
    Finalized,
}

impl LifecycleNodeBase {
    /// Create a new lifecycle node base
    pub fn new(name: &str) -> Self {
        LifecycleNodeBase {
            name: name.to_string(),
            state: State::Unconfigured,
        }
    }

    /// Get the current state
    pub fn get_state(&self) -> State {
        self.state
    }

    /// Move to `next` if the transition is legal from the current state.
    pub fn transition(&mut self, transition: &'static str, next: State) -> Result<()> {
        let allowed = matches!(
            (self.state, next),
            (State::Unconfigured, State::Inactive)
                | (State::Inactive, State::Active)
                | (State::Active, State::Inactive)
                | (State::Inactive, State::Unconfigured)
                | (State::Unconfigured, State::Finalized)
                | (State::Inactive, State::Finalized)
        );
        if !allowed {
            return Err(BehaviorError::Lifecycle {
                transition,
                state: self.state,
            });
        }
        tracing::debug!(node = %self.name, from = ?self.state, to = ?next, "lifecycle transition");
        self.state = next;
        Ok(())
    }
}
