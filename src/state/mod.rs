mod sse;
pub mod state_machine;
pub mod transitions;

use std::{future::Future, sync::Arc, time::Instant};

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    dao::{game_store::GameStore, metadata::MetadataProvider},
    error::ServiceError,
};

pub use self::sse::SseHub;
pub use self::state_machine::{AbortError, ApplyError, Plan, PlanError, PlanId, Snapshot};
use self::{
    state_machine::{PhaseHooks, RoundEvent, RoundPhase, RoundStateMachine},
    transitions::BroadcastHooks,
};

pub type SharedState = Arc<AppState>;

const SSE_CAPACITY: usize = 16;

/// Authenticated login kept until it expires.
#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
    pub expires_at: Instant,
}

/// Central application state: the round lifecycle manager and its collaborators.
pub struct AppState {
    config: AppConfig,
    store: Arc<dyn GameStore>,
    metadata: Arc<dyn MetadataProvider>,
    sse: SseHub,
    sessions: DashMap<String, Session>,
    machine: RwLock<RoundStateMachine>,
    hooks: Arc<dyn PhaseHooks>,
    transition_gate: Mutex<()>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// Phase changes are announced on the public SSE stream.
    pub fn new(
        config: AppConfig,
        store: Arc<dyn GameStore>,
        metadata: Arc<dyn MetadataProvider>,
    ) -> SharedState {
        let sse = SseHub::new(SSE_CAPACITY);
        let hooks = Arc::new(BroadcastHooks::new(sse.clone()));
        Arc::new(Self {
            config,
            store,
            metadata,
            sse,
            sessions: DashMap::new(),
            machine: RwLock::new(RoundStateMachine::new()),
            hooks,
            transition_gate: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Handle to the durable store.
    pub fn store(&self) -> Arc<dyn GameStore> {
        self.store.clone()
    }

    /// Handle to the movie metadata collaborator.
    pub fn metadata(&self) -> Arc<dyn MetadataProvider> {
        self.metadata.clone()
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        &self.sse
    }

    /// Bearer tokens issued by the login route.
    pub fn sessions(&self) -> &DashMap<String, Session> {
        &self.sessions
    }

    /// Current lifecycle phase.
    pub async fn phase(&self) -> RoundPhase {
        self.machine.read().await.phase()
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.machine.read().await.snapshot()
    }

    /// Replace the state machine with one positioned at `phase`, without running hooks.
    pub async fn resume_at(&self, phase: RoundPhase) {
        let _gate = self.transition_gate.lock().await;
        *self.machine.write().await = RoundStateMachine::resume(phase);
        info!(?phase, "round lifecycle resumed");
    }

    /// Run `work` while holding the transition gate, so no other mutation or
    /// transition interleaves with it.
    pub async fn run_exclusive<F, Fut, T>(&self, work: F) -> Result<T, ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let _gate = self.transition_gate.lock().await;
        work().await
    }

    /// Plan `event`, run `work`, then apply the plan on success or abort it on failure.
    pub async fn run_transition<F, Fut, T>(
        &self,
        event: RoundEvent,
        work: F,
    ) -> Result<(T, RoundPhase), ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let gate = self.transition_gate.lock().await;
        let Plan { id: plan_id, .. } = self.plan_transition(event).await?;

        match work().await {
            Ok(value) => {
                let next = self.apply_planned_transition(plan_id).await?;
                drop(gate);
                Ok((value, next))
            }
            Err(err) => {
                if let Err(abort_err) = self.abort_transition(plan_id).await {
                    warn!(
                        event = ?event,
                        plan_id = %plan_id,
                        error = ?abort_err,
                        "failed to abort transition after work error"
                    );
                }
                drop(gate);
                Err(err)
            }
        }
    }

    /// Fire a completion transition immediately.
    ///
    /// Callers must already hold the gate through [`AppState::run_exclusive`].
    pub(crate) async fn advance(&self, event: RoundEvent) -> Result<RoundPhase, ServiceError> {
        let mut sm = self.machine.write().await;
        let plan = sm.plan(event)?;
        Ok(sm.apply(plan.id, self.hooks.as_ref())?)
    }

    /// Plan a transition to the shared state machine, returning the plan.
    async fn plan_transition(&self, event: RoundEvent) -> Result<Plan, PlanError> {
        let mut sm = self.machine.write().await;
        sm.plan(event)
    }

    /// Apply the planned transition to the shared state machine, returning the next phase.
    async fn apply_planned_transition(&self, plan_id: PlanId) -> Result<RoundPhase, ApplyError> {
        let mut sm = self.machine.write().await;
        sm.apply(plan_id, self.hooks.as_ref())
    }

    /// Abort a planned transition of the shared state machine
    async fn abort_transition(&self, plan_id: PlanId) -> Result<(), AbortError> {
        let mut sm = self.machine.write().await;
        sm.abort(plan_id)
    }
}
