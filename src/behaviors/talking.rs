//! Talking: say something about what just happened
//!
//! Reports arrivals and failures, gives opinions about places, and runs the
//! yes/no exchange that turns a question into a navigation command.

use super::action::ActionOutcome;
use super::wait::{Invocation, WaitEnd};
use super::BehaviorContext;
use crate::bus::BusEvent;
use crate::common::{Emotion, Location, PadDelta};
use crate::navigation::NAVIGATION_RESPONSE;
use crate::session::MoveReason;
use crate::speech::{Answer, Dialogue, DialogueOutcome};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Dominance boost when refusing an order
pub const REFUSAL_DELTA: PadDelta = PadDelta::dominance(0.2);

const STUCK: &str = "Oh lord, I am stuck";
const OFFER_DIRECTIONS: &str = "I think I know where that is. Would you like me to show you?";
const CONFIRM: &str = "At once!";
const DECLINE: &str = "I wont go then...";
const REFUSE: &str = "I dont want to go there! Stop telling me what to do human!";
const CONFUSED: &str = "I dont understand, what am I doing?";

/// Events the talking handler reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TalkingEvent {
    /// The last move arrived
    Succeeded,
    /// The last move failed
    Aborted,
    Feedback,
    Information,
    Command,
}

impl TalkingEvent {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            // Older state machines spell it "succeded".
            "succeeded" | "succeded" => return Some(TalkingEvent::Succeeded),
            "aborted" => return Some(TalkingEvent::Aborted),
            _ => {}
        }
        match BusEvent::from_name(tag)? {
            BusEvent::Feedback => Some(TalkingEvent::Feedback),
            BusEvent::Information => Some(TalkingEvent::Information),
            BusEvent::Command => Some(TalkingEvent::Command),
            _ => None,
        }
    }
}

/// The talking handler
pub struct TalkingBehavior {
    ctx: Arc<BehaviorContext>,
}

impl TalkingBehavior {
    pub fn new(ctx: Arc<BehaviorContext>) -> Self {
        TalkingBehavior { ctx }
    }

    /// Serve one talking request
    pub async fn execute(&self, tag: &str, inv: Invocation) -> ActionOutcome {
        if !inv.settle(self.ctx.config.talking_settle()).await {
            return ActionOutcome::Preempted;
        }
        let Some(event) = TalkingEvent::parse(tag) else {
            warn!(event = tag, "talking received an event it cannot handle");
            self.ctx.bus.say(CONFUSED);
            return ActionOutcome::Aborted;
        };
        debug!(?event, "talking");
        match event {
            TalkingEvent::Succeeded => self.arrived(),
            TalkingEvent::Aborted => self.failed(),
            TalkingEvent::Feedback => {
                if let Some(location) = self.ctx.session.command_location() {
                    self.respond_about(&location);
                }
                self.ctx.bus.publish_event(BusEvent::FeedbackCompleted);
                self.wait(&inv).await
            }
            TalkingEvent::Information => self.ask(OFFER_DIRECTIONS.to_string(), &inv).await,
            TalkingEvent::Command => {
                if self.ctx.session.current_emotion() == Emotion::Angry {
                    info!("refusing the command");
                    self.ctx.bus.publish_emotion(REFUSAL_DELTA);
                    self.ctx.session.set_command_location(None);
                    self.ctx.bus.say(REFUSE);
                    self.ctx.bus.publish_event(BusEvent::FeedbackCompleted);
                    return self.wait(&inv).await;
                }
                let Some(location) = self.ctx.session.command_location() else {
                    warn!("asked to confirm a command without a location");
                    self.ctx.bus.say(CONFUSED);
                    return ActionOutcome::Aborted;
                };
                let question = format!("You would like me to go to {}?", location.name);
                self.ask(question, &inv).await
            }
        }
    }

    fn arrived(&self) -> ActionOutcome {
        let session = &self.ctx.session;
        let current = session.current_location();
        if session.reason() == MoveReason::ShowTheWay {
            if let Some(location) = &current {
                self.ctx.bus.say(&format!("Human, this is {}", location.name));
            }
            session.set_reason(MoveReason::Unspecified);
        } else if let Some(location) = &current {
            self.respond_about(location);
        }
        ActionOutcome::Succeeded
    }

    fn failed(&self) -> ActionOutcome {
        let session = &self.ctx.session;
        let target = session.next_location().and_then(|t| t.location().cloned());
        match (session.reason(), target) {
            (MoveReason::ShowTheWay, Some(location)) => {
                self.ctx.bus.say(&format!(
                    "Human, I am sorry, but I am unable to reach {}",
                    location.name
                ));
            }
            _ => self.ctx.bus.say(STUCK),
        }
        session.set_reason(MoveReason::Unspecified);
        ActionOutcome::Aborted
    }

    /// Speak the scripted response for the current emotion, if there is one.
    fn respond_about(&self, location: &Location) {
        let emotion = self.ctx.session.current_emotion();
        match self.ctx.store.response_by(NAVIGATION_RESPONSE, &emotion) {
            Some(response) => self.ctx.bus.say(&response.render(&location.name)),
            None => debug!(%emotion, "no scripted response"),
        }
    }

    /// Ask a yes/no question and act on the answer.
    async fn ask(&self, question: String, inv: &Invocation) -> ActionOutcome {
        // Listen before speaking so a quick answer is not missed.
        let mut dialogue = Dialogue::open(self.ctx.utterances.subscribe());
        self.ctx.bus.say(&question);
        match dialogue
            .await_answer(inv, self.ctx.config.talking_timeout())
            .await
        {
            DialogueOutcome::Answered(Answer::Yes) => {
                info!("answer was yes");
                self.ctx.session.update(|state| {
                    state.last_utterance.clear();
                    state.reason = MoveReason::ShowTheWay;
                });
                self.ctx.bus.say(CONFIRM);
                self.ctx.bus.publish_event(BusEvent::Command);
                self.linger(inv).await
            }
            DialogueOutcome::Answered(Answer::No) => {
                info!("answer was no");
                self.ctx.session.clear_last_utterance();
                self.ctx.bus.say(DECLINE);
                self.ctx.bus.publish_event(BusEvent::FeedbackCompleted);
                self.linger(inv).await
            }
            DialogueOutcome::Preempted => ActionOutcome::Preempted,
            DialogueOutcome::Expired => {
                info!("nobody answered");
                ActionOutcome::Aborted
            }
        }
    }

    /// Wait after a completed exchange. Running out of time is not a failure here.
    async fn linger(&self, inv: &Invocation) -> ActionOutcome {
        match inv.hold(self.ctx.config.talking_timeout()).await {
            WaitEnd::Preempted => ActionOutcome::Preempted,
            WaitEnd::Expired => ActionOutcome::Succeeded,
        }
    }

    async fn wait(&self, inv: &Invocation) -> ActionOutcome {
        match inv.hold(self.ctx.config.talking_timeout()).await {
            WaitEnd::Preempted => ActionOutcome::Preempted,
            WaitEnd::Expired => ActionOutcome::Aborted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behaviors::testing::{fixture, Fixture, MAP};
    use crate::bus::Outbound;
    use crate::session::Target;
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio_util::sync::CancellationToken;

    fn invocation() -> Invocation {
        Invocation::new(CancellationToken::new(), Duration::from_secs(2))
    }

    fn drain(outbound: &mut UnboundedReceiver<Outbound>) -> Vec<Outbound> {
        let mut messages = Vec::new();
        while let Ok(message) = outbound.try_recv() {
            messages.push(message);
        }
        messages
    }

    fn said(text: &str) -> Outbound {
        Outbound::Speech(text.to_string())
    }

    fn reply_after(ctx: &BehaviorContext, after: Duration, text: &'static str) {
        let utterances = ctx.utterances.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = utterances.send(text.to_string());
        });
    }

    #[test]
    fn parses_both_spellings_of_success() {
        assert_eq!(TalkingEvent::parse("succeded"), Some(TalkingEvent::Succeeded));
        assert_eq!(TalkingEvent::parse("succeeded"), Some(TalkingEvent::Succeeded));
        assert_eq!(
            TalkingEvent::parse("navigation_information"),
            Some(TalkingEvent::Information)
        );
        assert_eq!(TalkingEvent::parse("navigation_start_moving"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn arrival_after_showing_the_way_names_the_place() {
        let Fixture { ctx, mut outbound, .. } = fixture();
        ctx.session.arrive_at(Location::new("auditorium", MAP, 20.0, 5.0));
        ctx.session.set_reason(MoveReason::ShowTheWay);
        let talking = TalkingBehavior::new(ctx.clone());

        let outcome = talking.execute("succeded", invocation()).await;
        assert_eq!(outcome, ActionOutcome::Succeeded);
        assert_eq!(drain(&mut outbound), vec![said("Human, this is auditorium")]);
        assert_eq!(ctx.session.reason(), MoveReason::Unspecified);
    }

    #[tokio::test(start_paused = true)]
    async fn arrival_otherwise_uses_scripted_response() {
        let Fixture { ctx, mut outbound, .. } = fixture();
        ctx.session.arrive_at(Location::new("cafeteria", MAP, 10.0, 0.0));
        ctx.session.set_current_emotion(Emotion::Happy);
        let talking = TalkingBehavior::new(ctx.clone());

        let outcome = talking.execute("succeeded", invocation()).await;
        assert_eq!(outcome, ActionOutcome::Succeeded);
        assert_eq!(
            drain(&mut outbound),
            vec![said("I love being in the cafeteria")]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failure_apologizes_or_complains() {
        let Fixture { ctx, mut outbound, .. } = fixture();
        let talking = TalkingBehavior::new(ctx.clone());
        assert_eq!(
            talking.execute("aborted", invocation()).await,
            ActionOutcome::Aborted
        );
        assert_eq!(drain(&mut outbound), vec![said(STUCK)]);

        ctx.session.set_reason(MoveReason::ShowTheWay);
        ctx.session.set_next_location(Some(Target::Location(Location::new(
            "auditorium",
            MAP,
            20.0,
            5.0,
        ))));
        assert_eq!(
            talking.execute("aborted", invocation()).await,
            ActionOutcome::Aborted
        );
        assert_eq!(
            drain(&mut outbound),
            vec![said("Human, I am sorry, but I am unable to reach auditorium")]
        );
        assert_eq!(ctx.session.reason(), MoveReason::Unspecified);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_event_confuses() {
        let Fixture { ctx, mut outbound, .. } = fixture();
        let talking = TalkingBehavior::new(ctx);
        assert_eq!(
            talking.execute("dance", invocation()).await,
            ActionOutcome::Aborted
        );
        assert_eq!(drain(&mut outbound), vec![said(CONFUSED)]);
    }

    #[tokio::test(start_paused = true)]
    async fn opinion_then_waits_out_the_ceiling() {
        let Fixture { ctx, mut outbound, .. } = fixture();
        ctx.session
            .set_command_location(Some(Location::new("cafeteria", MAP, 10.0, 0.0)));
        let talking = TalkingBehavior::new(ctx);
        let outcome = talking.execute("navigation_feedback", invocation()).await;
        assert_eq!(outcome, ActionOutcome::Aborted);
        assert_eq!(
            drain(&mut outbound),
            vec![
                said("The cafeteria is all right"),
                Outbound::Event(BusEvent::FeedbackCompleted)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn yes_turns_a_question_into_a_command() {
        let Fixture { ctx, mut outbound, .. } = fixture();
        ctx.session
            .set_command_location(Some(Location::new("auditorium", MAP, 20.0, 5.0)));
        ctx.session.set_last_utterance("where is the auditorium");
        reply_after(&ctx, Duration::from_secs(10), "yes please");
        let talking = TalkingBehavior::new(ctx.clone());

        let outcome = talking
            .execute("navigation_information", invocation())
            .await;
        assert_eq!(outcome, ActionOutcome::Succeeded);
        assert_eq!(ctx.session.reason(), MoveReason::ShowTheWay);
        assert!(ctx.session.last_utterance().is_empty());
        assert_eq!(
            drain(&mut outbound),
            vec![
                said(OFFER_DIRECTIONS),
                said(CONFIRM),
                Outbound::Event(BusEvent::Command)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn no_declines_the_command() {
        let Fixture { ctx, mut outbound, .. } = fixture();
        ctx.session
            .set_command_location(Some(Location::new("cafeteria", MAP, 10.0, 0.0)));
        reply_after(&ctx, Duration::from_secs(10), "no thanks");
        let talking = TalkingBehavior::new(ctx.clone());

        let outcome = talking.execute("navigation_command", invocation()).await;
        assert_eq!(outcome, ActionOutcome::Succeeded);
        assert_eq!(ctx.session.reason(), MoveReason::Unspecified);
        assert_eq!(
            drain(&mut outbound),
            vec![
                said("You would like me to go to cafeteria?"),
                said(DECLINE),
                Outbound::Event(BusEvent::FeedbackCompleted)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn silence_aborts_the_dialogue() {
        let Fixture { ctx, mut outbound, .. } = fixture();
        ctx.session
            .set_command_location(Some(Location::new("cafeteria", MAP, 10.0, 0.0)));
        reply_after(&ctx, Duration::from_secs(10), "hmm, let me think");
        let talking = TalkingBehavior::new(ctx.clone());
        let started = tokio::time::Instant::now();

        let outcome = talking.execute("navigation_command", invocation()).await;
        assert_eq!(outcome, ActionOutcome::Aborted);
        assert!(started.elapsed() >= Duration::from_secs(64));
        assert_eq!(
            drain(&mut outbound),
            vec![said("You would like me to go to cafeteria?")]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn angry_robot_refuses_orders() {
        let Fixture { ctx, mut outbound, .. } = fixture();
        ctx.session
            .set_command_location(Some(Location::new("cafeteria", MAP, 10.0, 0.0)));
        ctx.session.set_current_emotion(Emotion::Angry);
        let talking = TalkingBehavior::new(ctx.clone());
        let inv = invocation();
        let token = inv.token().clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(20)).await;
            token.cancel();
        });

        let outcome = talking.execute("navigation_command", inv).await;
        assert_eq!(outcome, ActionOutcome::Preempted);
        assert!(ctx.session.command_location().is_none());
        assert_eq!(
            drain(&mut outbound),
            vec![
                Outbound::Emotion(REFUSAL_DELTA),
                said(REFUSE),
                Outbound::Event(BusEvent::FeedbackCompleted)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn preempted_while_settling_says_nothing() {
        let Fixture { ctx, mut outbound, .. } = fixture();
        let talking = TalkingBehavior::new(ctx);
        let inv = invocation();
        inv.token().cancel();
        assert_eq!(
            talking.execute("aborted", inv).await,
            ActionOutcome::Preempted
        );
        assert!(drain(&mut outbound).is_empty());
    }
}
