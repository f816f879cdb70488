//! Behaviors module for Prometheus robot
//!
//! Four handlers share one session: planning picks a target, moving drives
//! there (or wanders), talking reports back and go-to is a direct path for
//! outside callers. Each handler sits behind its own [`ActionServer`]; the
//! [`BehaviorManager`] owns the servers, the shared context and the
//! location scheduler.
pub mod action;
mod drive;
pub mod go_to;
pub mod moving;
pub mod planning;
pub mod relay;
pub mod talking;
pub mod wait;

#[cfg(test)]
pub(crate) mod testing;

pub use self::action::{ActionHandle, ActionOutcome, ActionServer, FeedbackSender};
pub use self::go_to::{GoToBehavior, GoToFeedback};
pub use self::moving::{MovingBehavior, MovingEvent};
pub use self::planning::{Plan, PlanningBehavior, PlanningEvent};
pub use self::relay::EventRelay;
pub use self::talking::{TalkingBehavior, TalkingEvent};
pub use self::wait::{Deadline, Invocation, Pulse, WaitEnd};

use crate::bus::FeedbackBus;
use crate::common::Emotion;
use crate::config::BehaviorConfig;
use crate::control::{GoalTracker, MotionBase};
use crate::error::{BehaviorError, Result};
use crate::lifecycle::{LifecycleNode, LifecycleNodeBase, State};
use crate::navigation::{LocationScheduler, LocationStore};
use crate::session::Session;
use crate::speech::parse_request;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const UTTERANCE_BACKLOG: usize = 16;

/// Everything a handler invocation can reach.
pub struct BehaviorContext {
    pub config: BehaviorConfig,
    pub session: Session,
    pub goals: GoalTracker,
    pub store: Arc<dyn LocationStore>,
    pub bus: Arc<dyn FeedbackBus>,
    /// Every transcribed utterance, for dialogues waiting on an answer
    pub utterances: broadcast::Sender<String>,
}

impl BehaviorContext {
    pub fn new(
        config: BehaviorConfig,
        base: Arc<dyn MotionBase>,
        store: Arc<dyn LocationStore>,
        bus: Arc<dyn FeedbackBus>,
    ) -> Self {
        let (utterances, _) = broadcast::channel(UTTERANCE_BACKLOG);
        BehaviorContext {
            goals: GoalTracker::new(base, config.connect_timeout()),
            config,
            session: Session::new(),
            store,
            bus,
            utterances,
        }
    }
}

/// Owns the handlers and feeds them inbound updates.
pub struct BehaviorManager {
    base: LifecycleNodeBase,
    motion: Arc<dyn MotionBase>,
    ctx: Arc<BehaviorContext>,
    planning: ActionServer,
    moving: ActionServer,
    talking: ActionServer,
    go_to: ActionServer,
    shutdown: CancellationToken,
    scheduler: Option<JoinHandle<()>>,
}

impl BehaviorManager {
    /// Create a new behavior manager
    pub fn new(
        config: BehaviorConfig,
        motion: Arc<dyn MotionBase>,
        store: Arc<dyn LocationStore>,
        bus: Arc<dyn FeedbackBus>,
    ) -> Self {
        let poll = config.poll_interval();
        let ctx = BehaviorContext::new(config, Arc::clone(&motion), store, bus);
        BehaviorManager {
            base: LifecycleNodeBase::new("behavior_manager"),
            motion,
            ctx: Arc::new(ctx),
            planning: ActionServer::new("navigation_planning", poll),
            moving: ActionServer::new("navigation_moving", poll),
            talking: ActionServer::new("navigation_talking", poll),
            go_to: ActionServer::new("navigation_go_to", poll),
            shutdown: CancellationToken::new(),
            scheduler: None,
        }
    }

    /// Update parameters by name. Only allowed while unconfigured.
    ///
    /// Starts a fresh session with the new settings.
    pub fn configure(&mut self, params: &HashMap<String, f64>) -> Result<()> {
        if self.base.get_state() != State::Unconfigured {
            return Err(BehaviorError::Lifecycle {
                transition: "set parameters",
                state: self.base.get_state(),
            });
        }
        let mut config = self.ctx.config.clone();
        config.configure(params)?;
        let poll = config.poll_interval();
        self.ctx = Arc::new(BehaviorContext::new(
            config,
            Arc::clone(&self.motion),
            Arc::clone(&self.ctx.store),
            Arc::clone(&self.ctx.bus),
        ));
        self.planning = ActionServer::new("navigation_planning", poll);
        self.moving = ActionServer::new("navigation_moving", poll);
        self.talking = ActionServer::new("navigation_talking", poll);
        self.go_to = ActionServer::new("navigation_go_to", poll);
        Ok(())
    }

    pub fn state(&self) -> State {
        self.base.get_state()
    }

    pub fn context(&self) -> &Arc<BehaviorContext> {
        &self.ctx
    }

    pub fn session(&self) -> &Session {
        &self.ctx.session
    }

    /// Ask the planner to react to `event`
    pub fn planning(&self, event: &str) -> ActionHandle {
        let handler = PlanningBehavior::new(Arc::clone(&self.ctx));
        let event = event.to_string();
        self.planning
            .serve::<(), _>(move |inv, _| async move { handler.execute(&event, inv).await })
    }

    /// Start moving for `event`
    pub fn moving(&self, event: &str) -> ActionHandle {
        let handler = MovingBehavior::new(Arc::clone(&self.ctx));
        let event = event.to_string();
        self.moving
            .serve::<(), _>(move |inv, _| async move { handler.execute(&event, inv).await })
    }

    /// Talk about `event`
    pub fn talking(&self, event: &str) -> ActionHandle {
        let handler = TalkingBehavior::new(Arc::clone(&self.ctx));
        let event = event.to_string();
        self.talking
            .serve::<(), _>(move |inv, _| async move { handler.execute(&event, inv).await })
    }

    /// Drive straight to the location called `name`
    pub fn go_to(&self, name: &str) -> ActionHandle<GoToFeedback> {
        let handler = GoToBehavior::new(Arc::clone(&self.ctx));
        let name = name.to_string();
        self.go_to.serve(move |inv, feedback| async move {
            handler.execute(&name, inv, feedback).await
        })
    }

    /// Latest pose estimate
    pub fn on_pose(&self, x: f64, y: f64) {
        self.ctx.session.set_current_pose(x, y);
    }

    /// Latest emotional state label
    pub fn on_emotion(&self, label: &str) {
        let emotion = Emotion::from_label(label);
        debug!(%emotion, "emotion update");
        self.ctx.session.set_current_emotion(emotion);
    }

    /// A transcribed utterance.
    ///
    /// Open dialogues hear it, and a request naming a known location sets
    /// the command location and raises the matching event.
    pub fn on_speech(&self, text: &str) {
        self.ctx.session.set_last_utterance(text);
        // No open dialogue is the common case.
        let _ = self.ctx.utterances.send(text.to_string());
        if let Some(request) = parse_request(text, &self.ctx.store.all_locations()) {
            info!(event = %request.event, location = %request.location.name, "heard a request");
            self.ctx.session.set_command_location(Some(request.location));
            self.ctx.bus.publish_event(request.event);
        }
    }

    fn preempt_all(&self) {
        self.planning.preempt_active();
        self.moving.preempt_active();
        self.talking.preempt_active();
        self.go_to.preempt_active();
    }
}

impl LifecycleNode for BehaviorManager {
    fn on_configure(&mut self) -> Result<()> {
        info!(map = %self.ctx.config.map_name, "configuring behavior manager");
        self.base.transition("configure", State::Inactive)
    }

    fn on_activate(&mut self) -> Result<()> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(BehaviorError::NoRuntime("start the location scheduler"));
        }
        self.base.transition("activate", State::Active)?;
        info!("activating behavior manager");
        self.shutdown = CancellationToken::new();
        let scheduler = LocationScheduler::new(
            &self.ctx.config.map_name,
            self.ctx.config.scheduler_period(),
            self.ctx.session.clone(),
            Arc::clone(&self.ctx.store),
            Arc::clone(&self.ctx.bus),
        );
        self.scheduler = Some(scheduler.spawn(self.shutdown.clone()));
        Ok(())
    }

    fn on_deactivate(&mut self) -> Result<()> {
        self.base.transition("deactivate", State::Inactive)?;
        info!("deactivating behavior manager");
        self.shutdown.cancel();
        self.scheduler = None;
        self.preempt_all();
        Ok(())
    }

    fn on_cleanup(&mut self) -> Result<()> {
        info!("cleaning up behavior manager");
        self.base.transition("cleanup", State::Unconfigured)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
