//! Membership synchronisation for join-entity relationships.
//!
//! The engine computes what changes (diff, new membership set, events); the caller applies it
//! through a [`Store`] and hands the events to a [`Notifier`] afterwards.

use crate::config::RelationshipDescriptor;
use crate::document::ResourceIdentifier;
use crate::error::StoreError;
use crate::notify::{EventKind, NotificationContext, Notifier};
use crate::store::{Membership, Store};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Pairwise-disjoint split of old and new membership.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MembershipDiff {
    pub added: BTreeSet<ResourceIdentifier>,
    pub removed: BTreeSet<ResourceIdentifier>,
    pub unchanged: BTreeSet<ResourceIdentifier>,
}

impl MembershipDiff {
    /// True when nothing joins or leaves.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SyncEvent {
    pub kind: EventKind,
    pub recipients: Vec<ResourceIdentifier>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SyncPlan {
    pub diff: MembershipDiff,
    /// Final membership set in requested order. Existing members keep their flags and pivot data.
    pub memberships: Vec<Membership>,
    pub events: Vec<SyncEvent>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RoleChange {
    /// Named identifiers that are current members; only these get the flag.
    pub members: Vec<ResourceIdentifier>,
    pub event: SyncEvent,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FailedDelivery {
    pub kind: EventKind,
    pub recipients: Vec<ResourceIdentifier>,
    pub reason: String,
}

/// Result of a replace: what changed, what was announced, and which announcements failed.
#[derive(Clone, Debug, PartialEq)]
pub struct SyncOutcome {
    pub diff: MembershipDiff,
    pub events: Vec<SyncEvent>,
    pub failed: Vec<FailedDelivery>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RoleOutcome {
    pub changed: u64,
    pub event: SyncEvent,
    pub failed: Vec<FailedDelivery>,
}

pub struct RelationshipSyncEngine;

impl RelationshipSyncEngine {
    pub fn diff(current: &[ResourceIdentifier], requested: &[ResourceIdentifier]) -> MembershipDiff {
        let current: BTreeSet<_> = current.iter().cloned().collect();
        let requested: BTreeSet<_> = requested.iter().cloned().collect();
        MembershipDiff {
            added: requested.difference(&current).cloned().collect(),
            removed: current.difference(&requested).cloned().collect(),
            unchanged: current.intersection(&requested).cloned().collect(),
        }
    }

    /// Replace-set plan: the owner ends up with exactly `requested`. `pivot` is attached to new members only.
    pub fn plan(
        owner: &ResourceIdentifier,
        current: &[Membership],
        requested: &[ResourceIdentifier],
        pivot: &Map<String, Value>,
    ) -> SyncPlan {
        let current_ids: Vec<ResourceIdentifier> = current.iter().map(|m| m.target.clone()).collect();
        let diff = Self::diff(&current_ids, requested);

        let mut memberships: Vec<Membership> = Vec::with_capacity(requested.len());
        for target in requested {
            if memberships.iter().any(|m| &m.target == target) {
                continue;
            }
            let membership = match current.iter().find(|m| &m.target == target) {
                Some(existing) => existing.clone(),
                None => Membership {
                    pivot: pivot.clone(),
                    ..Membership::new(owner.clone(), target.clone())
                },
            };
            memberships.push(membership);
        }

        let events = Self::events(&diff);
        SyncPlan {
            diff,
            memberships,
            events,
        }
    }

    /// "assigned" to every added member, then "unassigned" to every removed one. Empty groups emit nothing.
    pub fn events(diff: &MembershipDiff) -> Vec<SyncEvent> {
        [(EventKind::Assigned, &diff.added), (EventKind::Unassigned, &diff.removed)]
            .into_iter()
            .filter(|(_, ids)| !ids.is_empty())
            .map(|(kind, ids)| SyncEvent {
                kind,
                recipients: ids.iter().cloned().collect(),
            })
            .collect()
    }

    /// Promote (`supervisor = true`) or demote. Membership is untouched; the event names every target.
    pub fn change_role(current: &[Membership], targets: &[ResourceIdentifier], supervisor: bool) -> RoleChange {
        let members = targets
            .iter()
            .filter(|t| current.iter().any(|m| &m.target == *t))
            .cloned()
            .collect();
        let kind = if supervisor {
            EventKind::Promoted
        } else {
            EventKind::Demoted
        };
        RoleChange {
            members,
            event: SyncEvent {
                kind,
                recipients: targets.to_vec(),
            },
        }
    }

    /// Persist the plan. An empty diff writes nothing.
    pub async fn apply(
        store: &dyn Store,
        owner: &ResourceIdentifier,
        relationship: &RelationshipDescriptor,
        plan: &SyncPlan,
    ) -> Result<(), StoreError> {
        if plan.diff.is_empty() {
            tracing::debug!(owner = %owner, relationship = %relationship.name, "membership unchanged");
            return Ok(());
        }
        store.replace_memberships(owner, relationship, &plan.memberships).await?;
        tracing::info!(
            owner = %owner,
            relationship = %relationship.name,
            added = plan.diff.added.len(),
            removed = plan.diff.removed.len(),
            "membership replaced"
        );
        Ok(())
    }

    /// Send every event. Failures are logged and returned; nothing already persisted is undone.
    pub async fn dispatch(
        notifier: &dyn Notifier,
        events: &[SyncEvent],
        context: &NotificationContext,
    ) -> Vec<FailedDelivery> {
        let mut failed = Vec::new();
        for event in events {
            if let Err(e) = notifier.send(&event.recipients, event.kind, context).await {
                tracing::warn!(kind = %event.kind, subject = %context.subject, error = %e, "notification failed");
                failed.push(FailedDelivery {
                    kind: event.kind,
                    recipients: event.recipients.clone(),
                    reason: e.to_string(),
                });
            }
        }
        failed
    }
}
