pub mod behaviors;
pub mod bus;
pub mod common;
pub mod config;
pub mod control;
pub mod error;
pub mod lifecycle;
pub mod navigation;
pub mod session;
pub mod speech;

pub use crate::error::{BehaviorError, Result};

use crate::behaviors::BehaviorManager;
use crate::lifecycle::LifecycleNode;
use tracing::info;

/// Lifecycle owner for the behavior components
pub struct BehaviorCore {
    components: Vec<Box<dyn LifecycleNode>>,
}

impl Default for BehaviorCore {
    fn default() -> Self {
        Self::new()
    }
}

impl BehaviorCore {
    /// Create a new instance of BehaviorCore
    pub fn new() -> Self {
        BehaviorCore {
            components: Vec::new(),
        }
    }

    /// Register a component with the core
    pub fn register<T: LifecycleNode + 'static>(&mut self, component: T) {
        self.components.push(Box::new(component));
    }

    /// Configure and activate all registered components
    pub fn init(&mut self) -> Result<()> {
        for component in &mut self.components {
            component.on_configure()?;
            component.on_activate()?;
        }
        info!(components = self.components.len(), "behavior core initialized");
        Ok(())
    }

    /// Deactivate and clean up all registered components
    pub fn shutdown(&mut self) -> Result<()> {
        for component in &mut self.components {
            component.on_deactivate()?;
            component.on_cleanup()?;
        }
        info!("behavior core shut down");
        Ok(())
    }

    /// Get a reference to the behavior manager
    pub fn behavior_manager_mut(&mut self) -> Option<&mut BehaviorManager> {
        self.components
            .iter_mut()
            .find_map(|component| component.as_any_mut().downcast_mut::<BehaviorManager>())
    }
}
