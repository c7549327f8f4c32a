//! Service Worker Events
//!
//! Extendable-event plumbing shared by install, activate and fetch events.

use alloc::boxed::Box;
use alloc::vec::Vec;

/// Event type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    /// Install event
    Install,
    /// Activate event
    Activate,
    /// Fetch event
    Fetch,
}

/// Work that keeps an event alive after the handler returns.
pub type LifetimeTask = Box<dyn FnOnce() + Send>;

/// Lifetime extensions registered through `wait_until`.
#[derive(Default)]
pub struct LifetimeExtensions {
    tasks: Vec<LifetimeTask>,
}

impl LifetimeExtensions {
    /// Create an empty set
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Queue a task
    pub fn push(&mut self, task: LifetimeTask) {
        self.tasks.push(task);
    }

    /// Number of queued tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run every queued task in registration order.
    pub fn run_all(&mut self) -> usize {
        let tasks = core::mem::take(&mut self.tasks);
        let count = tasks.len();
        for task in tasks {
            task();
        }
        count
    }
}

impl core::fmt::Debug for LifetimeExtensions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LifetimeExtensions")
            .field("pending", &self.tasks.len())
            .finish()
    }
}

/// Extendable event trait
pub trait ExtendableEvent {
    /// Get event type
    fn event_type(&self) -> EventType;

    /// Keep the event alive until `task` has run
    fn wait_until(&mut self, task: LifetimeTask);

    /// Number of tasks still pending
    fn pending(&self) -> usize;

    /// Run all pending tasks
    fn settle(&mut self) -> usize;
}
