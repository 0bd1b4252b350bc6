//! Notification collaborator: who gets told what after a relationship change.

use crate::document::ResourceIdentifier;
use crate::error::NotifyError;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Mutex;

/// Pre-authenticated acting identity. Opaque to the engine; only forwarded to the notifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub id: String,
}

impl Actor {
    pub fn new(id: impl Into<String>) -> Self {
        Actor { id: id.into() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Assigned,
    Unassigned,
    Promoted,
    Demoted,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::Assigned => "assigned",
            EventKind::Unassigned => "unassigned",
            EventKind::Promoted => "promoted",
            EventKind::Demoted => "demoted",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NotificationContext {
    pub actor: Option<Actor>,
    /// The relationship owner, e.g. the task users were assigned to.
    pub subject: ResourceIdentifier,
    pub relationship: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(
        &self,
        recipients: &[ResourceIdentifier],
        kind: EventKind,
        context: &NotificationContext,
    ) -> Result<(), NotifyError>;
}

/// Writes each event to the tracing pipeline. Default when no delivery transport is wired.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn send(
        &self,
        recipients: &[ResourceIdentifier],
        kind: EventKind,
        context: &NotificationContext,
    ) -> Result<(), NotifyError> {
        tracing::info!(
            %kind,
            subject = %context.subject,
            relationship = %context.relationship,
            actor = context.actor.as_ref().map(|a| a.id.as_str()).unwrap_or("-"),
            recipients = recipients.len(),
            "notification"
        );
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Delivery {
    pub recipients: Vec<ResourceIdentifier>,
    pub kind: EventKind,
    pub context: NotificationContext,
}

/// Keeps every delivery in memory so callers can assert on what was sent.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    deliveries: Mutex<Vec<Delivery>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        RecordingNotifier::default()
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().map(|d| d.clone()).unwrap_or_default()
    }

    /// Recipients of every delivery of `kind`, in send order.
    pub fn recipients_of(&self, kind: EventKind) -> Vec<ResourceIdentifier> {
        self.deliveries()
            .into_iter()
            .filter(|d| d.kind == kind)
            .flat_map(|d| d.recipients)
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut d) = self.deliveries.lock() {
            d.clear();
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(
        &self,
        recipients: &[ResourceIdentifier],
        kind: EventKind,
        context: &NotificationContext,
    ) -> Result<(), NotifyError> {
        let mut deliveries = self
            .deliveries
            .lock()
            .map_err(|_| NotifyError::Delivery("recorder lock poisoned".into()))?;
        deliveries.push(Delivery {
            recipients: recipients.to_vec(),
            kind,
            context: context.clone(),
        });
        Ok(())
    }
}
