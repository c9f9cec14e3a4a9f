use crate::models::state::SessionState;

/// Observer for session state transitions.
///
/// Called on the dispatcher context after each transition, in order.
pub trait SessionObserver: Send + Sync {
    fn on_state_changed(&self, from: SessionState, to: SessionState);
}
