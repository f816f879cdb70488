//! Moving: drive to the planned location, or wander
//!
//! A directed move follows a single goal until it succeeds, is canceled by
//! the base, is preempted or runs past the moving ceiling. Wandering lasts
//! while the emotion stays bored, curious or unconcerned.

use super::action::ActionOutcome;
use super::drive::{drive_to, DriveEnd};
use super::wait::{Deadline, Invocation, Pulse, WaitEnd};
use super::BehaviorContext;
use crate::bus::BusEvent;
use crate::common::{Location, PadDelta};
use crate::control::{call_service, BaseService, GoalTicket};
use crate::session::Target;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Emotion pulse while driving toward a target
pub const MOVING_PULSE: PadDelta = PadDelta::new(0.0, 0.03, 0.01);
/// Emotion pulse while wandering
pub const WANDERING_PULSE: PadDelta = PadDelta::new(0.02, 0.05, 0.02);

/// Events the moving handler reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovingEvent {
    StartMoving,
    StartWandering,
}

impl MovingEvent {
    pub fn parse(tag: &str) -> Option<Self> {
        match BusEvent::from_name(tag)? {
            BusEvent::StartMoving => Some(MovingEvent::StartMoving),
            BusEvent::StartWandering => Some(MovingEvent::StartWandering),
            _ => None,
        }
    }
}

/// The moving handler
pub struct MovingBehavior {
    ctx: Arc<BehaviorContext>,
}

impl MovingBehavior {
    pub fn new(ctx: Arc<BehaviorContext>) -> Self {
        MovingBehavior { ctx }
    }

    /// Serve one moving request
    pub async fn execute(&self, tag: &str, inv: Invocation) -> ActionOutcome {
        match MovingEvent::parse(tag) {
            Some(MovingEvent::StartWandering) => self.wander(&inv).await,
            Some(MovingEvent::StartMoving) => match self.ctx.session.next_location() {
                Some(Target::Location(location)) => self.move_to(&location, &inv).await,
                _ => {
                    warn!("asked to move without a target location");
                    ActionOutcome::Aborted
                }
            },
            None => {
                warn!(event = tag, "moving received an event it cannot handle");
                ActionOutcome::Aborted
            }
        }
    }

    async fn move_to(&self, location: &Location, inv: &Invocation) -> ActionOutcome {
        info!(location = %location.name, "moving");
        let bus = Arc::clone(&self.ctx.bus);
        let mut pulse = Pulse::start(self.ctx.config.feedback_period());
        let end = drive_to(
            &self.ctx,
            location,
            inv,
            Some(self.ctx.config.moving_timeout()),
            move || {
                if pulse.due() {
                    bus.publish_emotion(MOVING_PULSE);
                }
            },
        )
        .await;
        match end {
            DriveEnd::Arrived => {
                self.ctx
                    .bus
                    .publish_emotion(PadDelta::pleasure(location.environment));
                ActionOutcome::Succeeded
            }
            DriveEnd::Preempted => ActionOutcome::Preempted,
            DriveEnd::Canceled | DriveEnd::TimedOut => ActionOutcome::Aborted,
        }
    }

    async fn wander(&self, inv: &Invocation) -> ActionOutcome {
        let config = &self.ctx.config;
        let ticket = self.ctx.goals.begin().await;
        info!("wandering");
        call_service(
            self.ctx.goals.base().as_ref(),
            BaseService::Wander,
            config.service_timeout(),
        )
        .await;

        let deadline = Deadline::start(config.moving_timeout());
        let mut pulse = Pulse::start(config.feedback_period());
        loop {
            if inv.is_preempted() {
                self.halt(ticket).await;
                return ActionOutcome::Preempted;
            }
            let emotion = self.ctx.session.current_emotion();
            if !emotion.is_wandering_eligible() {
                info!(%emotion, "no longer in the mood to wander");
                self.halt(ticket).await;
                self.ctx.bus.publish_event(BusEvent::WanderingCompleted);
                return match inv.hold(config.planning_timeout()).await {
                    WaitEnd::Preempted => ActionOutcome::Preempted,
                    WaitEnd::Expired => ActionOutcome::Aborted,
                };
            }
            if deadline.expired() {
                warn!("wandered for too long, stopping");
                self.halt(ticket).await;
                return ActionOutcome::Aborted;
            }
            if pulse.due() {
                self.ctx.bus.publish_emotion(WANDERING_PULSE);
            }
            inv.pause().await;
        }
    }

    async fn halt(&self, ticket: GoalTicket) {
        debug!("stopping the base");
        self.ctx.goals.cancel(ticket).await;
        call_service(
            self.ctx.goals.base().as_ref(),
            BaseService::Stop,
            self.ctx.config.service_timeout(),
        )
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behaviors::testing::{fixture, fixture_with_base, Fixture, MAP};
    use crate::bus::Outbound;
    use crate::common::Emotion;
    use crate::control::{BaseCall, GoalOutcome, SimulatedBase};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn invocation() -> Invocation {
        Invocation::new(CancellationToken::new(), Duration::from_secs(2))
    }

    fn drain(outbound: &mut tokio::sync::mpsc::UnboundedReceiver<Outbound>) -> Vec<Outbound> {
        let mut messages = Vec::new();
        while let Ok(message) = outbound.try_recv() {
            messages.push(message);
        }
        messages
    }

    fn target(ctx: &BehaviorContext, environment: f64) -> Location {
        let location = Location::new("cafeteria", MAP, 10.0, 0.0).with_environment(environment);
        ctx.session
            .set_next_location(Some(Target::Location(location.clone())));
        location
    }

    #[tokio::test(start_paused = true)]
    async fn arrival_updates_current_location() {
        let Fixture { ctx, mut outbound, .. } = fixture();
        let cafeteria = target(&ctx, 0.3);
        let moving = MovingBehavior::new(ctx.clone());

        let outcome = moving.execute("navigation_start_moving", invocation()).await;
        assert_eq!(outcome, ActionOutcome::Succeeded);
        assert_eq!(ctx.session.current_location(), Some(cafeteria));
        let messages = drain(&mut outbound);
        assert_eq!(
            messages.last(),
            Some(&Outbound::Emotion(PadDelta::pleasure(0.3)))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_moves_reset_outcome_before_dispatch() {
        let Fixture { ctx, base, .. } = fixture();
        target(&ctx, 0.0);
        let moving = MovingBehavior::new(ctx.clone());
        for _ in 0..2 {
            let outcome = moving.execute("navigation_start_moving", invocation()).await;
            assert_eq!(outcome, ActionOutcome::Succeeded);
        }
        let dispatched: Vec<GoalOutcome> = base
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                BaseCall::Goal {
                    outcome_at_dispatch,
                    ..
                } => Some(outcome_at_dispatch),
                _ => None,
            })
            .collect();
        assert_eq!(dispatched, vec![GoalOutcome::Pending, GoalOutcome::Pending]);
    }

    #[tokio::test(start_paused = true)]
    async fn preemption_cancels_goal_first() {
        let Fixture { ctx, base, .. } =
            fixture_with_base(SimulatedBase::new(Duration::from_secs(1)).stalled());
        target(&ctx, 0.0);
        let moving = MovingBehavior::new(ctx.clone());
        let inv = invocation();
        let token = inv.token().clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(30)).await;
            token.cancel();
        });
        let outcome = moving.execute("navigation_start_moving", inv).await;
        assert_eq!(outcome, ActionOutcome::Preempted);
        assert!(matches!(base.calls().last(), Some(BaseCall::Cancel)));
        assert!(ctx.session.current_location().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_goal_times_out_and_pulses_progress() {
        let Fixture { ctx, base, mut outbound } =
            fixture_with_base(SimulatedBase::new(Duration::from_secs(1)).stalled());
        target(&ctx, 0.0);
        let moving = MovingBehavior::new(ctx.clone());
        let started = tokio::time::Instant::now();

        let outcome = moving.execute("navigation_start_moving", invocation()).await;
        assert_eq!(outcome, ActionOutcome::Aborted);
        assert!(started.elapsed() > Duration::from_secs(1000));
        assert!(started.elapsed() < Duration::from_secs(1010));
        assert_eq!(base.cancel_count(), 1);
        let pulses = drain(&mut outbound)
            .into_iter()
            .filter(|m| *m == Outbound::Emotion(MOVING_PULSE))
            .count();
        assert!(pulses >= 60, "{pulses} pulses");
    }

    #[tokio::test(start_paused = true)]
    async fn failing_or_offline_base_aborts() {
        let Fixture { ctx, .. } =
            fixture_with_base(SimulatedBase::new(Duration::from_secs(3)).failing());
        target(&ctx, 0.0);
        let moving = MovingBehavior::new(ctx.clone());
        assert_eq!(
            moving.execute("navigation_start_moving", invocation()).await,
            ActionOutcome::Aborted
        );

        let Fixture { ctx, base, .. } =
            fixture_with_base(SimulatedBase::new(Duration::from_secs(3)).offline());
        target(&ctx, 0.0);
        let moving = MovingBehavior::new(ctx.clone());
        assert_eq!(
            moving.execute("navigation_start_moving", invocation()).await,
            ActionOutcome::Aborted
        );
        assert!(base.goals().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn rejects_unknown_events_and_missing_targets() {
        let Fixture { ctx, base, .. } = fixture();
        let moving = MovingBehavior::new(ctx.clone());
        assert_eq!(
            moving.execute("navigation_start_moving", invocation()).await,
            ActionOutcome::Aborted
        );
        ctx.session.set_next_location(Some(Target::Wandering));
        assert_eq!(
            moving.execute("navigation_start_moving", invocation()).await,
            ActionOutcome::Aborted
        );
        assert_eq!(
            moving.execute("fly", invocation()).await,
            ActionOutcome::Aborted
        );
        assert!(base.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn wandering_ends_when_mood_changes() {
        let Fixture { ctx, base, mut outbound } = fixture();
        ctx.session.set_current_emotion(Emotion::Curious);
        let moving = MovingBehavior::new(ctx.clone());
        let session = ctx.session.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(40)).await;
            session.set_current_emotion(Emotion::Happy);
        });

        let outcome = moving.execute("navigation_start_wandering", invocation()).await;
        assert_eq!(outcome, ActionOutcome::Aborted);
        let calls = base.calls();
        assert_eq!(calls.first(), Some(&BaseCall::Wander));
        assert!(calls.ends_with(&[BaseCall::Cancel, BaseCall::Stop]));

        let messages = drain(&mut outbound);
        let pulses = messages
            .iter()
            .filter(|m| **m == Outbound::Emotion(WANDERING_PULSE))
            .count();
        assert_eq!(pulses, 2);
        assert_eq!(
            messages.last(),
            Some(&Outbound::Event(BusEvent::WanderingCompleted))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn ineligible_mood_stops_before_any_pulse() {
        let Fixture { ctx, mut outbound, .. } = fixture();
        ctx.session.set_current_emotion(Emotion::Angry);
        let moving = MovingBehavior::new(ctx.clone());
        let inv = invocation();
        let token = inv.token().clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            token.cancel();
        });
        let outcome = moving.execute("navigation_start_wandering", inv).await;
        assert_eq!(outcome, ActionOutcome::Preempted);
        assert_eq!(
            drain(&mut outbound),
            vec![Outbound::Event(BusEvent::WanderingCompleted)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn wandering_survives_missing_services() {
        let Fixture { ctx, base, .. } =
            fixture_with_base(SimulatedBase::new(Duration::from_secs(1)).without_services());
        ctx.session.set_current_emotion(Emotion::Bored);
        let moving = MovingBehavior::new(ctx.clone());
        let inv = invocation();
        let token = inv.token().clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(7)).await;
            token.cancel();
        });
        let outcome = moving.execute("navigation_start_wandering", inv).await;
        assert_eq!(outcome, ActionOutcome::Preempted);
        assert_eq!(
            base.calls(),
            vec![BaseCall::Wander, BaseCall::Cancel, BaseCall::Stop]
        );
    }
}
