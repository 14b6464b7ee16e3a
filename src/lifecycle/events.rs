//! Lifecycle events and the dispatchers that receive them.
//!
//! Dispatch is best-effort: [`dispatch`] logs a failed delivery and returns.
//! Nothing in the lifecycle waits on or reacts to a dispatcher.

use crate::error::{Result, SprintError};
use serde::Serialize;
use std::sync::Mutex;
use std::sync::mpsc::Sender;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SprintEvent {
    SprintCreated {
        sprint_id: String,
        project: String,
        name: String,
    },
    SprintStarted {
        sprint_id: String,
        project: String,
        task_count: usize,
    },
    SprintCompleted {
        sprint_id: String,
        project: String,
        tasks_completed: usize,
        total_tasks: usize,
        moved_to_backlog: usize,
        moved_to_sprint: usize,
        target_sprint_id: Option<String>,
        failed: Vec<String>,
    },
    SprintCancelled {
        sprint_id: String,
        project: String,
    },
}

impl SprintEvent {
    pub fn sprint_id(&self) -> &str {
        match self {
            SprintEvent::SprintCreated { sprint_id, .. }
            | SprintEvent::SprintStarted { sprint_id, .. }
            | SprintEvent::SprintCompleted { sprint_id, .. }
            | SprintEvent::SprintCancelled { sprint_id, .. } => sprint_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SprintEvent::SprintCreated { .. } => "sprint_created",
            SprintEvent::SprintStarted { .. } => "sprint_started",
            SprintEvent::SprintCompleted { .. } => "sprint_completed",
            SprintEvent::SprintCancelled { .. } => "sprint_cancelled",
        }
    }
}

pub trait NotificationDispatcher: Send + Sync {
    fn notify(&self, event: &SprintEvent) -> Result<()>;
}

/// Hands `event` to `dispatcher`; a delivery failure is logged and dropped.
pub fn dispatch(dispatcher: &dyn NotificationDispatcher, event: SprintEvent) {
    if let Err(e) = dispatcher.notify(&event) {
        tracing::warn!(
            event = event.name(),
            sprint = %event.sprint_id(),
            error = %e,
            "Notification dispatch failed"
        );
    }
}

/// Default dispatcher: records each event as a structured log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDispatcher;

impl NotificationDispatcher for TracingDispatcher {
    fn notify(&self, event: &SprintEvent) -> Result<()> {
        let payload = serde_json::to_string(event)?;
        tracing::info!(event = event.name(), sprint = %event.sprint_id(), %payload, "Sprint event");
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDispatcher;

impl NotificationDispatcher for NoopDispatcher {
    fn notify(&self, _event: &SprintEvent) -> Result<()> {
        Ok(())
    }
}

/// Forwards events into an mpsc channel. Sending never blocks.
pub struct ChannelDispatcher {
    sender: Mutex<Sender<SprintEvent>>,
}

impl ChannelDispatcher {
    pub fn new(sender: Sender<SprintEvent>) -> Self {
        Self {
            sender: Mutex::new(sender),
        }
    }
}

impl NotificationDispatcher for ChannelDispatcher {
    fn notify(&self, event: &SprintEvent) -> Result<()> {
        let sender = self
            .sender
            .lock()
            .map_err(|_| SprintError::Storage("Dispatcher lock poisoned".to_string()))?;
        sender
            .send(event.clone())
            .map_err(|_| SprintError::Storage("Event receiver has gone away".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn cancelled() -> SprintEvent {
        SprintEvent::SprintCancelled {
            sprint_id: "sp-1".into(),
            project: "web".into(),
        }
    }

    #[test]
    fn test_channel_dispatcher_delivers() {
        let (tx, rx) = mpsc::channel();
        let dispatcher = ChannelDispatcher::new(tx);
        dispatch(&dispatcher, cancelled());
        assert_eq!(rx.try_recv().unwrap(), cancelled());
    }

    #[test]
    fn test_dispatch_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let dispatcher = ChannelDispatcher::new(tx);
        assert!(dispatcher.notify(&cancelled()).is_err());
        dispatch(&dispatcher, cancelled());
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let json = serde_json::to_value(cancelled()).unwrap();
        assert_eq!(json["event"], "sprint_cancelled");
        assert_eq!(json["sprint_id"], "sp-1");
    }
}
