//! Observer registry for manager events.

use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::types::{ServerEntry, ServerMap};

/// Event names a listener can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Initialized,
    ServersLoaded,
    ServersAdded,
    ServerUpdated,
    ServerRemoved,
    ServerToggled,
    Error,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Initialized => "initialized",
            EventKind::ServersLoaded => "servers-loaded",
            EventKind::ServersAdded => "servers-added",
            EventKind::ServerUpdated => "server-updated",
            EventKind::ServerRemoved => "server-removed",
            EventKind::ServerToggled => "server-toggled",
            EventKind::Error => "error",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload delivered to listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum ManagerEvent {
    Initialized,
    ServersLoaded(ServerMap),
    /// Only the servers added by this operation
    ServersAdded(ServerMap),
    ServerUpdated { name: String, entry: ServerEntry },
    ServerRemoved { name: String },
    ServerToggled { name: String, enabled: bool },
    Error { message: String },
}

impl ManagerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ManagerEvent::Initialized => EventKind::Initialized,
            ManagerEvent::ServersLoaded(_) => EventKind::ServersLoaded,
            ManagerEvent::ServersAdded(_) => EventKind::ServersAdded,
            ManagerEvent::ServerUpdated { .. } => EventKind::ServerUpdated,
            ManagerEvent::ServerRemoved { .. } => EventKind::ServerRemoved,
            ManagerEvent::ServerToggled { .. } => EventKind::ServerToggled,
            ManagerEvent::Error { .. } => EventKind::Error,
        }
    }
}

/// Handle returned by [`EventBus::on`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type Listener = Box<dyn Fn(&ManagerEvent) -> anyhow::Result<()> + Send + Sync>;

/// Listeners keyed by event kind, called in subscription order.
#[derive(Default)]
pub struct EventBus {
    listeners: HashMap<EventKind, Vec<(ListenerId, Listener)>>,
    next_id: u64,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<_, _> = self
            .listeners
            .iter()
            .map(|(kind, list)| (kind.as_str(), list.len()))
            .collect();
        f.debug_struct("EventBus")
            .field("listeners", &counts)
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&ManagerEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners
            .entry(kind)
            .or_default()
            .push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was not registered for `kind`.
    pub fn off(&mut self, kind: EventKind, id: ListenerId) -> bool {
        let Some(list) = self.listeners.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|(existing, _)| *existing != id);
        before != list.len()
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.get(&kind).map_or(0, Vec::len)
    }

    /// Deliver `event` to every listener of its kind.
    ///
    /// A listener that fails or panics is logged and skipped; the rest still
    /// run. Returns the number of listeners that failed.
    pub fn emit(&self, event: &ManagerEvent) -> usize {
        let kind = event.kind();
        let Some(list) = self.listeners.get(&kind) else {
            return 0;
        };

        let mut failed = 0;
        for (id, listener) in list {
            match catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    failed += 1;
                    tracing::error!(
                        event = %kind,
                        listener = id.0,
                        error = %e,
                        "Event listener failed"
                    );
                }
                Err(panic) => {
                    failed += 1;
                    let message = panic
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    tracing::error!(
                        event = %kind,
                        listener = id.0,
                        panic = %message,
                        "Event listener panicked"
                    );
                }
            }
        }
        failed
    }
}
