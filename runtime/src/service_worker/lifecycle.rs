//! Service Worker Lifecycle Management
//!
//! Explicit state machine for the worker: `Parsed → Installing → Installed →
//! Activating → Serving`, with `Redundant` as the terminal state of failed
//! or replaced workers.

use alloc::boxed::Box;
use alloc::vec::Vec;

use super::{ServiceWorkerError, ServiceWorkerId, ServiceWorkerState};

/// Lifecycle event types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Install event
    Install(ServiceWorkerId),
    /// Activate event
    Activate(ServiceWorkerId),
    /// State change
    StateChange(StateChangeEvent),
    /// Worker took control of open clients
    ControllerChange {
        /// The new controller
        worker_id: ServiceWorkerId,
        /// Number of clients whose controller changed
        claimed: usize,
    },
}

/// State change event data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChangeEvent {
    /// Worker ID
    pub worker_id: ServiceWorkerId,
    /// Old state
    pub old_state: ServiceWorkerState,
    /// New state
    pub new_state: ServiceWorkerState,
}

/// Lifecycle listener
pub type LifecycleListener = Box<dyn Fn(&LifecycleEvent) + Send + Sync>;

/// Lifecycle manager
pub struct LifecycleManager {
    /// Dispatched events, oldest first
    pending_events: Vec<LifecycleEvent>,
    /// Event listeners
    listeners: Vec<LifecycleListener>,
}

impl LifecycleManager {
    /// Create new lifecycle manager
    pub fn new() -> Self {
        Self {
            pending_events: Vec::new(),
            listeners: Vec::new(),
        }
    }

    /// Add event listener
    pub fn add_listener(&mut self, listener: LifecycleListener) {
        self.listeners.push(listener);
    }

    /// Dispatch an event
    pub fn dispatch(&mut self, event: LifecycleEvent) {
        for listener in &self.listeners {
            listener(&event);
        }
        self.pending_events.push(event);
    }

    /// Get pending events
    pub fn pending_events(&self) -> &[LifecycleEvent] {
        &self.pending_events
    }

    /// Clear pending events
    pub fn clear_pending(&mut self) {
        self.pending_events.clear();
    }

    /// Transition worker state
    pub fn transition_state(
        &mut self,
        worker_id: ServiceWorkerId,
        state: &mut ServiceWorkerState,
        new_state: ServiceWorkerState,
    ) -> Result<(), ServiceWorkerError> {
        let old_state = *state;

        if !is_valid_transition(old_state, new_state) {
            return Err(ServiceWorkerError::InvalidStateTransition {
                from: old_state,
                to: new_state,
            });
        }

        *state = new_state;
        log::debug!("[SW] worker {} {:?} -> {:?}", worker_id.raw(), old_state, new_state);

        self.dispatch(LifecycleEvent::StateChange(StateChangeEvent {
            worker_id,
            old_state,
            new_state,
        }));

        match new_state {
            ServiceWorkerState::Installing => {
                self.dispatch(LifecycleEvent::Install(worker_id));
            }
            ServiceWorkerState::Activating => {
                self.dispatch(LifecycleEvent::Activate(worker_id));
            }
            _ => {}
        }

        Ok(())
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for LifecycleManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LifecycleManager")
            .field("pending_events", &self.pending_events)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Check if a state transition is valid
pub fn is_valid_transition(from: ServiceWorkerState, to: ServiceWorkerState) -> bool {
    use ServiceWorkerState::*;

    matches!(
        (from, to),
        (Parsed, Installing)
            | (Installing, Installed)
            | (Installing, Redundant)
            | (Installed, Activating)
            | (Installed, Redundant)
            | (Activating, Serving)
            | (Activating, Redundant)
            | (Serving, Redundant)
    )
}
