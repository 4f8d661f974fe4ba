use tracing::{debug, info};

use crate::{
    services::sse_events::broadcast_phase_changed,
    state::{
        SseHub,
        state_machine::{PhaseHooks, RoundPhase},
    },
};

/// Production hooks: log every boundary and announce the entered phase on the public stream.
pub struct BroadcastHooks {
    hub: SseHub,
}

impl BroadcastHooks {
    pub fn new(hub: SseHub) -> Self {
        Self { hub }
    }
}

impl PhaseHooks for BroadcastHooks {
    fn exit(&self, phase: RoundPhase) {
        debug!(?phase, "leaving phase");
    }

    fn enter(&self, phase: RoundPhase) {
        info!(?phase, "entered phase");
        broadcast_phase_changed(&self.hub, phase);
    }
}
