//! Generic resource and relationship operations over any registered type.

use crate::config::{Operation, RelationshipAccessor, RelationshipDescriptor, ResourceTypeDescriptor};
use crate::document::{Document, LinkageData, Links, PrimaryData, RelationshipLinkage, ResourceIdentifier, ResourceObject};
use crate::error::{AppError, ValidationError};
use crate::notify::{Actor, NotificationContext};
use crate::service::{
    IncludeResolver, ListParams, Paginator, RelationshipData, RelationshipSyncEngine, RequestValidator, RoleOutcome,
    Sorter, SyncOutcome,
};
use crate::state::AppState;
use crate::store::{Criteria, Record};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashSet};

pub struct JsonApiService;

impl JsonApiService {
    /// List a collection. Sort and include are checked against the whitelists before anything is read.
    pub async fn list(state: &AppState, type_name: &str, params: &ListParams) -> Result<Document, AppError> {
        let descriptor = state.registry.describe(type_name)?;
        let sort = params.sort_fields();
        Sorter::validate(&sort, descriptor)?;
        let include = params.include_names();
        if let Some(names) = &include {
            IncludeResolver::validate(names, descriptor)?;
        }
        let page = params.page_spec(&state.settings)?;

        let total = state.store.count(type_name, &[]).await?;
        let criteria = Criteria {
            filters: Vec::new(),
            sort,
            page,
        };
        let records = state.store.query(type_name, &criteria).await?;
        tracing::debug!(type_name, total, returned = records.len(), "list");

        let mut objects = Vec::with_capacity(records.len());
        for record in &records {
            objects.push(Self::build_object(state, descriptor, record).await?);
        }
        let included = Self::fetch_included(state, &objects, include.as_deref(), descriptor).await?;

        let extra = params.link_query();
        let links = match &page {
            Some(current) => {
                let page_links = Paginator::paginate(total, current);
                state.links().list_links(type_name, Some((current, &page_links)), &extra)
            }
            None => state.links().list_links(type_name, None, &extra),
        };

        Ok(Document::with_data(PrimaryData::Resources(objects))
            .included(included)
            .links(links)
            .meta(json!({ "total": total })))
    }

    pub async fn show(state: &AppState, type_name: &str, id: &str, include: Option<&str>) -> Result<Document, AppError> {
        let descriptor = state.registry.describe(type_name)?;
        let names = IncludeResolver::parse(include);
        if let Some(names) = &names {
            IncludeResolver::validate(names, descriptor)?;
        }
        let record = Self::require_record(state, type_name, id).await?;
        let object = Self::build_object(state, descriptor, &record).await?;
        let primary = vec![object];
        let included = Self::fetch_included(state, &primary, names.as_deref(), descriptor).await?;
        let data = primary
            .into_iter()
            .next()
            .map(|o| PrimaryData::Resource(Box::new(o)))
            .unwrap_or(PrimaryData::Null);
        Ok(Document::with_data(data)
            .included(included)
            .links(Links::self_only(state.links().resource(type_name, id))))
    }

    /// Full resource objects behind a relationship (`/{type}/{id}/{relationship}`).
    pub async fn show_related(state: &AppState, type_name: &str, id: &str, relationship: &str) -> Result<Document, AppError> {
        let descriptor = state.registry.describe(type_name)?;
        let rel = Self::relationship(descriptor, relationship)?;
        let record = Self::require_record(state, type_name, id).await?;
        let target = state.registry.describe(&rel.target_type)?;
        let linkage = Self::linkage_data(state, &record, rel).await?;

        let data = match linkage {
            LinkageData::One(None) => PrimaryData::Null,
            LinkageData::One(Some(rid)) => match state.store.find(&rid.type_name, &rid.id).await? {
                Some(related) => PrimaryData::Resource(Box::new(Self::build_object(state, target, &related).await?)),
                None => PrimaryData::Null,
            },
            LinkageData::Many(ids) => {
                let mut objects = Vec::with_capacity(ids.len());
                for related in state.store.find_many(&ids).await? {
                    objects.push(Self::build_object(state, target, &related).await?);
                }
                PrimaryData::Resources(objects)
            }
        };
        Ok(Document::with_data(data).links(Links::self_only(state.links().related(type_name, id, &rel.name))))
    }

    pub async fn create(state: &AppState, type_name: &str, payload: &Value) -> Result<Document, AppError> {
        let descriptor = state.registry.describe(type_name)?;
        let attributes =
            RequestValidator::validate_document(payload, descriptor, Operation::Create, None, state.store.as_ref()).await?;
        let record = state.store.create(type_name, attributes).await?;
        tracing::info!(type_name, id = %record.id, "resource created");
        let object = Self::build_object(state, descriptor, &record).await?;
        Ok(Document::with_data(PrimaryData::Resource(Box::new(object)))
            .links(Links::self_only(state.links().resource(type_name, &record.id))))
    }

    pub async fn update(state: &AppState, type_name: &str, id: &str, payload: &Value) -> Result<Document, AppError> {
        let descriptor = state.registry.describe(type_name)?;
        Self::require_record(state, type_name, id).await?;
        let attributes =
            RequestValidator::validate_document(payload, descriptor, Operation::Update, Some(id), state.store.as_ref())
                .await?;
        let record = state
            .store
            .update(type_name, id, attributes)
            .await?
            .ok_or_else(|| AppError::NotFound {
                type_name: type_name.to_string(),
                id: id.to_string(),
            })?;
        tracing::info!(type_name, id, "resource updated");
        let object = Self::build_object(state, descriptor, &record).await?;
        Ok(Document::with_data(PrimaryData::Resource(Box::new(object)))
            .links(Links::self_only(state.links().resource(type_name, id))))
    }

    pub async fn delete(state: &AppState, type_name: &str, id: &str) -> Result<(), AppError> {
        state.registry.describe(type_name)?;
        if !state.store.delete(type_name, id).await? {
            return Err(AppError::NotFound {
                type_name: type_name.to_string(),
                id: id.to_string(),
            });
        }
        tracing::info!(type_name, id, "resource deleted");
        Ok(())
    }

    /// Linkage only: identifiers plus the relationship's own links.
    pub async fn show_relationship(
        state: &AppState,
        type_name: &str,
        id: &str,
        relationship: &str,
    ) -> Result<Document, AppError> {
        let descriptor = state.registry.describe(type_name)?;
        let rel = Self::relationship(descriptor, relationship)?;
        let record = Self::require_record(state, type_name, id).await?;
        let linkage = Self::linkage_data(state, &record, rel).await?;
        Ok(Document::with_data(PrimaryData::from(linkage)).links(state.links().relationship_links(type_name, id, &rel.name)))
    }

    pub async fn replace_relationship(
        state: &AppState,
        type_name: &str,
        id: &str,
        relationship: &str,
        payload: &Value,
        actor: Option<&Actor>,
    ) -> Result<SyncOutcome, AppError> {
        Self::replace_relationship_with_pivot(state, type_name, id, relationship, payload, &Map::new(), actor).await
    }

    /// Replace the membership set; `pivot` is stored on memberships created by this call.
    /// Order: target existence, diff, persist, notify. Notification failures are reported in the outcome.
    pub async fn replace_relationship_with_pivot(
        state: &AppState,
        type_name: &str,
        id: &str,
        relationship: &str,
        payload: &Value,
        pivot: &Map<String, Value>,
        actor: Option<&Actor>,
    ) -> Result<SyncOutcome, AppError> {
        let (owner, rel, targets) = Self::prepare_mutation(state, type_name, id, relationship, payload).await?;

        let current = state.store.memberships(&owner, rel).await?;
        let plan = RelationshipSyncEngine::plan(&owner, &current, &targets, pivot);
        RelationshipSyncEngine::apply(state.store.as_ref(), &owner, rel, &plan).await?;

        let context = NotificationContext {
            actor: actor.cloned(),
            subject: owner,
            relationship: rel.name.clone(),
        };
        let failed = RelationshipSyncEngine::dispatch(state.notifier.as_ref(), &plan.events, &context).await;
        Ok(SyncOutcome {
            diff: plan.diff,
            events: plan.events,
            failed,
        })
    }

    pub async fn promote_relationship(
        state: &AppState,
        type_name: &str,
        id: &str,
        relationship: &str,
        payload: &Value,
        actor: Option<&Actor>,
    ) -> Result<RoleOutcome, AppError> {
        Self::change_role(state, type_name, id, relationship, payload, actor, true).await
    }

    pub async fn demote_relationship(
        state: &AppState,
        type_name: &str,
        id: &str,
        relationship: &str,
        payload: &Value,
        actor: Option<&Actor>,
    ) -> Result<RoleOutcome, AppError> {
        Self::change_role(state, type_name, id, relationship, payload, actor, false).await
    }

    async fn change_role(
        state: &AppState,
        type_name: &str,
        id: &str,
        relationship: &str,
        payload: &Value,
        actor: Option<&Actor>,
        supervisor: bool,
    ) -> Result<RoleOutcome, AppError> {
        let (owner, rel, targets) = Self::prepare_mutation(state, type_name, id, relationship, payload).await?;

        let current = state.store.memberships(&owner, rel).await?;
        let change = RelationshipSyncEngine::change_role(&current, &targets, supervisor);
        let changed = if change.members.is_empty() {
            0
        } else {
            state.store.set_pivot_flag(&owner, rel, &change.members, supervisor).await?
        };
        tracing::info!(owner = %owner, relationship = %rel.name, supervisor, changed, "membership role changed");

        let failed = if change.event.recipients.is_empty() {
            Vec::new()
        } else {
            let context = NotificationContext {
                actor: actor.cloned(),
                subject: owner,
                relationship: rel.name.clone(),
            };
            RelationshipSyncEngine::dispatch(state.notifier.as_ref(), std::slice::from_ref(&change.event), &context).await
        };
        Ok(RoleOutcome {
            changed,
            event: change.event,
            failed,
        })
    }

    /// Everything a relationship mutation checks before touching the store.
    async fn prepare_mutation<'s>(
        state: &'s AppState,
        type_name: &str,
        id: &str,
        relationship: &str,
        payload: &Value,
    ) -> Result<(ResourceIdentifier, &'s RelationshipDescriptor, Vec<ResourceIdentifier>), AppError> {
        let descriptor = state.registry.describe(type_name)?;
        let rel = Self::relationship(descriptor, relationship)?;
        if !rel.is_mutable() {
            return Err(AppError::RelationshipNotMutable {
                type_name: type_name.to_string(),
                relationship: rel.name.clone(),
            });
        }
        let owner = Self::require_record(state, type_name, id).await?.identifier();

        let data = RequestValidator::validate_relationship(payload, &state.registry)?;
        if matches!(data, RelationshipData::One(Some(_))) && rel.is_to_many() {
            return Err(AppError::Validation(vec![ValidationError::new(
                "/data",
                "The data must be an array.",
            )]));
        }
        let targets = data.into_targets();
        if let Some(wrong) = targets.iter().find(|t| t.type_name != rel.target_type) {
            return Err(AppError::Conflict(format!(
                "relationship '{}' holds '{}' resources, got '{}'",
                rel.name, rel.target_type, wrong.type_name
            )));
        }
        Self::ensure_targets_exist(state, &targets).await?;
        Ok((owner, rel, targets))
    }

    fn relationship<'d>(descriptor: &'d ResourceTypeDescriptor, name: &str) -> Result<&'d RelationshipDescriptor, AppError> {
        descriptor.relationship(name).ok_or_else(|| AppError::UnknownRelationship {
            type_name: descriptor.type_name.clone(),
            relationship: name.to_string(),
        })
    }

    async fn require_record(state: &AppState, type_name: &str, id: &str) -> Result<Record, AppError> {
        state.store.find(type_name, id).await?.ok_or_else(|| AppError::NotFound {
            type_name: type_name.to_string(),
            id: id.to_string(),
        })
    }

    /// All-or-nothing: every missing identifier is reported and nothing is written.
    async fn ensure_targets_exist(state: &AppState, targets: &[ResourceIdentifier]) -> Result<(), AppError> {
        if targets.is_empty() {
            return Ok(());
        }
        let found: HashSet<ResourceIdentifier> = state
            .store
            .find_many(targets)
            .await?
            .iter()
            .map(Record::identifier)
            .collect();
        let missing: Vec<ResourceIdentifier> = targets.iter().filter(|t| !found.contains(*t)).cloned().collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::RelationshipTargetNotFound(missing))
        }
    }

    async fn fetch_included(
        state: &AppState,
        primary: &[ResourceObject],
        names: Option<&[String]>,
        descriptor: &ResourceTypeDescriptor,
    ) -> Result<Option<Vec<ResourceObject>>, AppError> {
        IncludeResolver::resolve(primary, names, descriptor, |ids| async move {
            let mut objects = Vec::with_capacity(ids.len());
            for record in state.store.find_many(&ids).await? {
                let related = state.registry.describe(&record.type_name)?;
                objects.push(Self::build_object(state, related, &record).await?);
            }
            Ok::<_, AppError>(objects)
        })
        .await
    }

    /// Render a record: visible attributes, linkage for every declared relationship, self link.
    async fn build_object(
        state: &AppState,
        descriptor: &ResourceTypeDescriptor,
        record: &Record,
    ) -> Result<ResourceObject, AppError> {
        let attributes: Map<String, Value> = record
            .attributes
            .iter()
            .filter(|(k, _)| !descriptor.hidden_attributes.contains(*k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let links = state.links();
        let mut relationships = BTreeMap::new();
        for rel in &descriptor.relationships {
            let data = Self::linkage_data(state, record, rel).await?;
            relationships.insert(
                rel.name.clone(),
                RelationshipLinkage {
                    links: links.relationship_links(&record.type_name, &record.id, &rel.name),
                    data,
                },
            );
        }

        Ok(ResourceObject {
            type_name: record.type_name.clone(),
            id: record.id.clone(),
            attributes,
            relationships,
            links: Some(Links::self_only(links.resource(&record.type_name, &record.id))),
        })
    }

    async fn linkage_data(state: &AppState, record: &Record, rel: &RelationshipDescriptor) -> Result<LinkageData, AppError> {
        let data = match &rel.accessor {
            RelationshipAccessor::BelongsTo { foreign_key } => LinkageData::One(
                record
                    .attribute(foreign_key)
                    .and_then(id_string)
                    .map(|id| ResourceIdentifier::new(rel.target_type.clone(), id)),
            ),
            RelationshipAccessor::HasMany { foreign_key } => {
                let criteria = Criteria::filter(foreign_key.clone(), Value::String(record.id.clone()));
                let related = state.store.query(&rel.target_type, &criteria).await?;
                LinkageData::Many(related.iter().map(Record::identifier).collect())
            }
            RelationshipAccessor::BelongsToMany { .. } => {
                let memberships = state.store.memberships(&record.identifier(), rel).await?;
                LinkageData::Many(memberships.into_iter().map(|m| m.target).collect())
            }
        };
        Ok(data)
    }
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
