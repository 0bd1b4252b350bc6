//! Persistence collaborator contract and an in-memory implementation.
//! The engine never decides how records are fetched; it drives a [`Store`].

use crate::config::{RelationshipAccessor, RelationshipDescriptor};
use crate::document::ResourceIdentifier;
use crate::error::StoreError;
use crate::service::{PageSpec, SortField, Sortable, Sorter};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A stored resource: identity plus raw attributes (hidden ones included).
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub type_name: String,
    pub id: String,
    pub attributes: Map<String, Value>,
}

impl Record {
    pub fn identifier(&self) -> ResourceIdentifier {
        ResourceIdentifier::new(self.type_name.clone(), self.id.clone())
    }

    pub fn attribute(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field)
    }
}

impl Sortable for Record {
    fn sort_id(&self) -> &str {
        &self.id
    }

    fn sort_attribute(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field)
    }
}

/// Exact-match filters, ordering and an optional page window.
#[derive(Clone, Debug, Default)]
pub struct Criteria {
    pub filters: Vec<(String, Value)>,
    pub sort: Vec<SortField>,
    pub page: Option<PageSpec>,
}

impl Criteria {
    pub fn filter(field: impl Into<String>, value: Value) -> Self {
        Criteria {
            filters: vec![(field.into(), value)],
            ..Criteria::default()
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MembershipFlags {
    pub supervisor: bool,
}

/// Join entity of a many-to-many relationship, seen from `owner`.
#[derive(Clone, Debug, PartialEq)]
pub struct Membership {
    pub owner: ResourceIdentifier,
    pub target: ResourceIdentifier,
    pub flags: MembershipFlags,
    /// Extra pivot columns recorded when the membership was created.
    pub pivot: Map<String, Value>,
}

impl Membership {
    pub fn new(owner: ResourceIdentifier, target: ResourceIdentifier) -> Self {
        Membership {
            owner,
            target,
            flags: MembershipFlags::default(),
            pivot: Map::new(),
        }
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn find(&self, type_name: &str, id: &str) -> Result<Option<Record>, StoreError>;

    /// Records for every identifier that exists; missing ones are simply absent.
    async fn find_many(&self, ids: &[ResourceIdentifier]) -> Result<Vec<Record>, StoreError>;

    async fn query(&self, type_name: &str, criteria: &Criteria) -> Result<Vec<Record>, StoreError>;

    async fn count(&self, type_name: &str, filters: &[(String, Value)]) -> Result<u64, StoreError>;

    async fn create(&self, type_name: &str, attributes: Map<String, Value>) -> Result<Record, StoreError>;

    /// Merges `attributes` into the record. `None` when it does not exist.
    async fn update(&self, type_name: &str, id: &str, attributes: Map<String, Value>) -> Result<Option<Record>, StoreError>;

    async fn delete(&self, type_name: &str, id: &str) -> Result<bool, StoreError>;

    /// True when no record of `type_name` other than `ignore_id` holds `value` in `field`.
    async fn is_unique(&self, type_name: &str, field: &str, value: &Value, ignore_id: Option<&str>) -> Result<bool, StoreError>;

    async fn memberships(&self, owner: &ResourceIdentifier, relationship: &RelationshipDescriptor) -> Result<Vec<Membership>, StoreError>;

    /// Replace the owner's whole membership set with `memberships`, in order.
    async fn replace_memberships(
        &self,
        owner: &ResourceIdentifier,
        relationship: &RelationshipDescriptor,
        memberships: &[Membership],
    ) -> Result<(), StoreError>;

    /// Set the supervisor flag on existing memberships only. Returns how many rows changed.
    async fn set_pivot_flag(
        &self,
        owner: &ResourceIdentifier,
        relationship: &RelationshipDescriptor,
        targets: &[ResourceIdentifier],
        supervisor: bool,
    ) -> Result<u64, StoreError>;
}

/// Ids compare across JSON kinds: a foreign key stored as `3` matches id `"3"`.
pub fn matches_id(value: &Value, id: &str) -> bool {
    match value {
        Value::String(s) => s == id,
        Value::Number(n) => n.to_string() == id,
        _ => false,
    }
}

fn values_match(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(s), other) | (other, Value::String(s)) => matches_id(other, s) || a == b,
        _ => a == b,
    }
}

struct PivotRow {
    pivot: String,
    left: ResourceIdentifier,
    right: ResourceIdentifier,
    flags: MembershipFlags,
    attributes: Map<String, Value>,
}

impl PivotRow {
    /// (owner side, target side) for a relationship declared on either end of the pivot.
    fn sides(&self, inverse: bool) -> (&ResourceIdentifier, &ResourceIdentifier) {
        if inverse {
            (&self.right, &self.left)
        } else {
            (&self.left, &self.right)
        }
    }
}

#[derive(Default)]
struct MemoryInner {
    tables: HashMap<String, Vec<Record>>,
    sequences: HashMap<String, u64>,
    pivots: Vec<PivotRow>,
}

/// Thread-safe in-memory store. Ids are per-type sequences ("1", "2", ...); rows keep insertion order.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

fn pivot_of(relationship: &RelationshipDescriptor) -> Result<(&str, bool), StoreError> {
    match &relationship.accessor {
        RelationshipAccessor::BelongsToMany { pivot, inverse } => Ok((pivot.as_str(), *inverse)),
        _ => Err(StoreError::Backend(format!(
            "relationship '{}' has no join entity",
            relationship.name
        ))),
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryInner>, StoreError> {
        self.inner.read().map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryInner>, StoreError> {
        self.inner.write().map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }

    fn matching<'a>(inner: &'a MemoryInner, type_name: &str, filters: &'a [(String, Value)]) -> impl Iterator<Item = &'a Record> + 'a {
        inner
            .tables
            .get(type_name)
            .into_iter()
            .flatten()
            .filter(move |r| filters.iter().all(|(field, value)| r.attribute(field).map(|v| values_match(v, value)).unwrap_or(false)))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find(&self, type_name: &str, id: &str) -> Result<Option<Record>, StoreError> {
        let inner = self.read()?;
        Ok(inner
            .tables
            .get(type_name)
            .and_then(|rows| rows.iter().find(|r| r.id == id))
            .cloned())
    }

    async fn find_many(&self, ids: &[ResourceIdentifier]) -> Result<Vec<Record>, StoreError> {
        let inner = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|rid| {
                inner
                    .tables
                    .get(&rid.type_name)
                    .and_then(|rows| rows.iter().find(|r| r.id == rid.id))
                    .cloned()
            })
            .collect())
    }

    async fn query(&self, type_name: &str, criteria: &Criteria) -> Result<Vec<Record>, StoreError> {
        let mut rows: Vec<Record> = {
            let inner = self.read()?;
            Self::matching(&inner, type_name, &criteria.filters).cloned().collect()
        };
        Sorter::apply(&mut rows, &criteria.sort);
        if let Some(page) = &criteria.page {
            rows = crate::service::Paginator::slice(rows, page);
        }
        tracing::debug!(type_name, rows = rows.len(), "memory query");
        Ok(rows)
    }

    async fn count(&self, type_name: &str, filters: &[(String, Value)]) -> Result<u64, StoreError> {
        let inner = self.read()?;
        Ok(Self::matching(&inner, type_name, filters).count() as u64)
    }

    async fn create(&self, type_name: &str, mut attributes: Map<String, Value>) -> Result<Record, StoreError> {
        let mut inner = self.write()?;
        let seq = inner.sequences.entry(type_name.to_string()).or_insert(0);
        *seq += 1;
        let id = seq.to_string();
        let now = Value::String(chrono::Utc::now().to_rfc3339());
        attributes.remove("id");
        attributes.entry("created_at").or_insert_with(|| now.clone());
        attributes.entry("updated_at").or_insert(now);
        let record = Record {
            type_name: type_name.to_string(),
            id,
            attributes,
        };
        inner
            .tables
            .entry(type_name.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn update(&self, type_name: &str, id: &str, attributes: Map<String, Value>) -> Result<Option<Record>, StoreError> {
        let mut inner = self.write()?;
        let Some(record) = inner
            .tables
            .get_mut(type_name)
            .and_then(|rows| rows.iter_mut().find(|r| r.id == id))
        else {
            return Ok(None);
        };
        for (k, v) in attributes {
            if k != "id" {
                record.attributes.insert(k, v);
            }
        }
        record
            .attributes
            .insert("updated_at".into(), Value::String(chrono::Utc::now().to_rfc3339()));
        Ok(Some(record.clone()))
    }

    async fn delete(&self, type_name: &str, id: &str) -> Result<bool, StoreError> {
        let mut inner = self.write()?;
        let Some(rows) = inner.tables.get_mut(type_name) else {
            return Ok(false);
        };
        let before = rows.len();
        rows.retain(|r| r.id != id);
        let deleted = rows.len() != before;
        if deleted {
            let gone = ResourceIdentifier::new(type_name, id);
            inner.pivots.retain(|p| p.left != gone && p.right != gone);
        }
        Ok(deleted)
    }

    async fn is_unique(&self, type_name: &str, field: &str, value: &Value, ignore_id: Option<&str>) -> Result<bool, StoreError> {
        let inner = self.read()?;
        let taken = inner
            .tables
            .get(type_name)
            .into_iter()
            .flatten()
            .filter(|r| Some(r.id.as_str()) != ignore_id)
            .any(|r| r.attribute(field).map(|v| values_match(v, value)).unwrap_or(false));
        Ok(!taken)
    }

    async fn memberships(&self, owner: &ResourceIdentifier, relationship: &RelationshipDescriptor) -> Result<Vec<Membership>, StoreError> {
        let (pivot, inverse) = pivot_of(relationship)?;
        let inner = self.read()?;
        Ok(inner
            .pivots
            .iter()
            .filter(|row| row.pivot == pivot && row.sides(inverse).0 == owner)
            .map(|row| Membership {
                owner: owner.clone(),
                target: row.sides(inverse).1.clone(),
                flags: row.flags,
                pivot: row.attributes.clone(),
            })
            .collect())
    }

    async fn replace_memberships(
        &self,
        owner: &ResourceIdentifier,
        relationship: &RelationshipDescriptor,
        memberships: &[Membership],
    ) -> Result<(), StoreError> {
        let (pivot, inverse) = pivot_of(relationship)?;
        let mut inner = self.write()?;
        inner
            .pivots
            .retain(|row| !(row.pivot == pivot && row.sides(inverse).0 == owner));
        for m in memberships {
            let (left, right) = if inverse {
                (m.target.clone(), m.owner.clone())
            } else {
                (m.owner.clone(), m.target.clone())
            };
            inner.pivots.push(PivotRow {
                pivot: pivot.to_string(),
                left,
                right,
                flags: m.flags,
                attributes: m.pivot.clone(),
            });
        }
        Ok(())
    }

    async fn set_pivot_flag(
        &self,
        owner: &ResourceIdentifier,
        relationship: &RelationshipDescriptor,
        targets: &[ResourceIdentifier],
        supervisor: bool,
    ) -> Result<u64, StoreError> {
        let (pivot, inverse) = pivot_of(relationship)?;
        let mut inner = self.write()?;
        let mut changed = 0;
        for row in inner.pivots.iter_mut() {
            let (o, t) = row.sides(inverse);
            if row.pivot == pivot && o == owner && targets.contains(t) {
                row.flags.supervisor = supervisor;
                changed += 1;
            }
        }
        Ok(changed)
    }
}
