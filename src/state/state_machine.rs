use std::time::Instant;

use thiserror::Error;
use uuid::Uuid;

/// Lifecycle phases of the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoundPhase {
    /// No round is collecting input; results of the last round are shown.
    Overview,
    /// Players nominate movies for the current prompt.
    Submission,
    /// Players vote on the nominated movies.
    Voting,
}

/// Events that can be applied to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundEvent {
    /// An operator opened a new round with a fresh prompt.
    RoundCreated,
    /// Every registered player submitted a movie for the current round.
    AllSubmitted,
    /// Every registered player voted in the current round.
    AllVoted,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: RoundPhase,
    /// The event that cannot be applied from this phase.
    pub event: RoundEvent,
}

/// Errors that can occur when planning a state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// A transition is already pending and must be applied or aborted.
    AlreadyPending,
    /// The requested transition is not valid from the current phase.
    InvalidTransition(InvalidTransition),
}

/// Errors that can occur when applying a planned state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Errors that can occur when aborting a planned state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Unique identifier for a planned state transition.
pub type PlanId = Uuid;

/// A planned state machine transition that has been validated but not yet applied.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: PlanId,
    /// Phase the state machine is currently in.
    pub from: RoundPhase,
    /// Phase the state machine will transition to.
    pub to: RoundPhase,
    /// Event that triggered this transition.
    pub event: RoundEvent,
    /// Version number after applying this transition.
    pub version_next: usize,
    /// Timestamp when this plan was created.
    pub pending_since: Instant,
}

/// Snapshot of the current state machine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase of the state machine.
    pub phase: RoundPhase,
    /// Version number of the state machine (increments on each transition).
    pub version: usize,
    /// Pending transition phase, if a transition is planned but not yet applied.
    pub pending: Option<RoundPhase>,
}

/// Side effects attached to phase boundaries.
///
/// For every applied transition `exit` runs once on the old phase, then
/// `enter` runs once on the new one.
pub trait PhaseHooks: Send + Sync {
    fn exit(&self, _phase: RoundPhase) {}
    fn enter(&self, _phase: RoundPhase) {}
}

/// Hooks that do nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl PhaseHooks for NoopHooks {}

/// Transition table of the round lifecycle.
///
/// Creating a round is accepted from every phase; completion events only
/// advance the phase they complete.
pub fn next_phase(from: RoundPhase, event: RoundEvent) -> Result<RoundPhase, InvalidTransition> {
    match (from, event) {
        (_, RoundEvent::RoundCreated) => Ok(RoundPhase::Submission),
        (RoundPhase::Submission, RoundEvent::AllSubmitted) => Ok(RoundPhase::Voting),
        (RoundPhase::Voting, RoundEvent::AllVoted) => Ok(RoundPhase::Overview),
        (from, event) => Err(InvalidTransition { from, event }),
    }
}

/// State machine driving the submission → voting → overview cycle.
#[derive(Debug, Clone)]
pub struct RoundStateMachine {
    phase: RoundPhase,
    version: usize,
    pending: Option<Plan>,
}

impl Default for RoundStateMachine {
    fn default() -> Self {
        Self::resume(RoundPhase::Overview)
    }
}

impl RoundStateMachine {
    /// Create a new state machine initialised in the overview state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a state machine positioned at a phase recomputed from storage.
    pub fn resume(phase: RoundPhase) -> Self {
        Self {
            phase,
            version: 0,
            pending: None,
        }
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Create a snapshot of the current state machine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            version: self.version,
            pending: self.pending.as_ref().map(|plan| plan.to),
        }
    }

    /// Plan a transition by validating that the event can be applied from the current phase.
    /// Returns a Plan that can later be applied or aborted.
    pub fn plan(&mut self, event: RoundEvent) -> Result<Plan, PlanError> {
        if self.pending.is_some() {
            return Err(PlanError::AlreadyPending);
        }

        let next = next_phase(self.phase, event).map_err(PlanError::InvalidTransition)?;

        let plan = Plan {
            id: Uuid::new_v4(),
            from: self.phase,
            to: next,
            event,
            version_next: self.version + 1,
            pending_since: Instant::now(),
        };

        self.pending = Some(plan.clone());

        Ok(plan)
    }

    /// Apply a planned transition, running `hooks` around the phase change.
    /// Returns the new phase after the transition.
    pub fn apply(
        &mut self,
        plan_id: PlanId,
        hooks: &dyn PhaseHooks,
    ) -> Result<RoundPhase, ApplyError> {
        let plan = self.pending.take().ok_or(ApplyError::NoPending)?;

        if plan.id != plan_id {
            let expected_plan_id = plan.id;
            self.pending = Some(plan);
            return Err(ApplyError::IdMismatch {
                expected: expected_plan_id,
                got: plan_id,
            });
        }

        hooks.exit(plan.from);
        self.phase = plan.to;
        self.version = plan.version_next;
        hooks.enter(plan.to);

        Ok(self.phase)
    }

    /// Abort a planned transition without applying it, returning the state machine to its previous state.
    pub fn abort(&mut self, plan_id: PlanId) -> Result<(), AbortError> {
        let plan = self.pending.as_ref().ok_or(AbortError::NoPending)?;

        if plan.id != plan_id {
            return Err(AbortError::IdMismatch {
                expected: plan.id,
                got: plan_id,
            });
        }

        self.pending = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingHooks {
        calls: Mutex<Vec<String>>,
    }

    impl PhaseHooks for RecordingHooks {
        fn exit(&self, phase: RoundPhase) {
            self.calls.lock().unwrap().push(format!("exit {phase:?}"));
        }

        fn enter(&self, phase: RoundPhase) {
            self.calls.lock().unwrap().push(format!("enter {phase:?}"));
        }
    }

    fn apply(sm: &mut RoundStateMachine, event: RoundEvent) -> RoundPhase {
        let plan = sm.plan(event).unwrap();
        sm.apply(plan.id, &NoopHooks).unwrap()
    }

    #[test]
    fn initial_state_is_overview() {
        let sm = RoundStateMachine::new();
        assert_eq!(sm.phase(), RoundPhase::Overview);
        assert_eq!(sm.snapshot().version, 0);
    }

    #[test]
    fn full_round_cycle() {
        let mut sm = RoundStateMachine::new();

        assert_eq!(apply(&mut sm, RoundEvent::RoundCreated), RoundPhase::Submission);
        assert_eq!(apply(&mut sm, RoundEvent::AllSubmitted), RoundPhase::Voting);
        assert_eq!(apply(&mut sm, RoundEvent::AllVoted), RoundPhase::Overview);
        assert_eq!(sm.snapshot().version, 3);
    }

    #[test]
    fn round_creation_is_accepted_from_every_phase() {
        for phase in [RoundPhase::Overview, RoundPhase::Submission, RoundPhase::Voting] {
            let mut sm = RoundStateMachine::resume(phase);
            assert_eq!(apply(&mut sm, RoundEvent::RoundCreated), RoundPhase::Submission);
        }
    }

    #[test]
    fn completion_events_only_advance_their_own_phase() {
        assert!(next_phase(RoundPhase::Overview, RoundEvent::AllSubmitted).is_err());
        assert!(next_phase(RoundPhase::Voting, RoundEvent::AllSubmitted).is_err());
        assert!(next_phase(RoundPhase::Overview, RoundEvent::AllVoted).is_err());
        assert!(next_phase(RoundPhase::Submission, RoundEvent::AllVoted).is_err());
    }

    #[test]
    fn hooks_run_exit_then_enter_once() {
        let hooks = RecordingHooks::default();
        let mut sm = RoundStateMachine::new();

        let plan = sm.plan(RoundEvent::RoundCreated).unwrap();
        sm.apply(plan.id, &hooks).unwrap();

        assert_eq!(
            *hooks.calls.lock().unwrap(),
            vec!["exit Overview".to_string(), "enter Submission".to_string()]
        );
    }

    #[test]
    fn aborted_plan_runs_no_hooks() {
        let hooks = RecordingHooks::default();
        let mut sm = RoundStateMachine::new();

        let plan = sm.plan(RoundEvent::RoundCreated).unwrap();
        sm.abort(plan.id).unwrap();

        assert!(sm.pending.is_none());
        assert_eq!(sm.phase(), RoundPhase::Overview);
        assert!(hooks.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn invalid_transition_returns_error() {
        let mut sm = RoundStateMachine::new();
        let err = sm.plan(RoundEvent::AllVoted).unwrap_err();
        match err {
            PlanError::InvalidTransition(invalid) => {
                assert_eq!(invalid.from, RoundPhase::Overview);
                assert_eq!(invalid.event, RoundEvent::AllVoted);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn second_plan_while_pending_is_rejected() {
        let mut sm = RoundStateMachine::new();
        let plan = sm.plan(RoundEvent::RoundCreated).unwrap();
        assert_eq!(
            sm.plan(RoundEvent::RoundCreated).unwrap_err(),
            PlanError::AlreadyPending
        );
        assert_eq!(sm.snapshot().pending, Some(RoundPhase::Submission));

        let err = sm.apply(Uuid::new_v4(), &NoopHooks).unwrap_err();
        assert!(matches!(err, ApplyError::IdMismatch { .. }));
        assert_eq!(sm.apply(plan.id, &NoopHooks).unwrap(), RoundPhase::Submission);
    }
}
