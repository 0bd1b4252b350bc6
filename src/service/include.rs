//! Sideloading: which related resources go into `included`, in what order, each exactly once.

use crate::config::ResourceTypeDescriptor;
use crate::document::{ResourceIdentifier, ResourceObject};
use crate::error::AppError;
use std::collections::{HashMap, HashSet};
use std::future::Future;

pub struct IncludeResolver;

impl IncludeResolver {
    /// `None` when no include was requested; an empty parameter counts as none. Duplicates collapse.
    pub fn parse(raw: Option<&str>) -> Option<Vec<String>> {
        let mut names: Vec<String> = Vec::new();
        for name in raw?.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        (!names.is_empty()).then_some(names)
    }

    /// Every name must be whitelisted for the type. Fails on the first one that is not.
    pub fn validate(names: &[String], descriptor: &ResourceTypeDescriptor) -> Result<(), AppError> {
        match names.iter().find(|n| !descriptor.is_include_allowed(n)) {
            Some(name) => Err(AppError::IncludeNotAllowed {
                type_name: descriptor.type_name.clone(),
                include: name.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Identifiers to sideload: first-seen across primaries, then relationships in declaration order.
    /// Primary resources themselves are never repeated.
    pub fn collect(
        primary: &[ResourceObject],
        names: &[String],
        descriptor: &ResourceTypeDescriptor,
    ) -> Vec<ResourceIdentifier> {
        let mut seen: HashSet<ResourceIdentifier> = primary.iter().map(ResourceObject::identifier).collect();
        let mut out = Vec::new();
        for object in primary {
            for relationship in descriptor.relationships.iter().filter(|r| names.contains(&r.name)) {
                let Some(linkage) = object.relationship(&relationship.name) else {
                    continue;
                };
                for id in linkage.data.identifiers() {
                    if seen.insert(id.clone()) {
                        out.push(id.clone());
                    }
                }
            }
        }
        out
    }

    /// Validate, collect and fetch. `fetch` receives the deduplicated identifiers; whatever it returns
    /// is put back in collection order. Nothing is fetched when validation fails.
    pub async fn resolve<F, Fut>(
        primary: &[ResourceObject],
        names: Option<&[String]>,
        descriptor: &ResourceTypeDescriptor,
        fetch: F,
    ) -> Result<Option<Vec<ResourceObject>>, AppError>
    where
        F: FnOnce(Vec<ResourceIdentifier>) -> Fut,
        Fut: Future<Output = Result<Vec<ResourceObject>, AppError>>,
    {
        let Some(names) = names else {
            return Ok(None);
        };
        Self::validate(names, descriptor)?;
        let wanted = Self::collect(primary, names, descriptor);
        if wanted.is_empty() {
            return Ok(Some(Vec::new()));
        }
        let mut fetched: HashMap<ResourceIdentifier, ResourceObject> =
            fetch(wanted.clone()).await?.into_iter().map(|o| (o.identifier(), o)).collect();
        Ok(Some(wanted.iter().filter_map(|id| fetched.remove(id)).collect()))
    }
}
