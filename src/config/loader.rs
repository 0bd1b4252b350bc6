//! Load the resource catalogue from JSON and resolve it into the runtime registry.

use crate::config::resolved::{RelationshipDescriptor, ResourceRegistry, ResourceTypeDescriptor};
use crate::config::types::*;
use crate::config::{parse_field_rules, validate, FieldRules, Settings};
use crate::error::ConfigError;
use std::collections::BTreeMap;
use std::path::Path;

const DEFAULT_CATALOGUE: &str = include_str!("../../config/resources.json");

/// Build the registry from a catalogue (validates first).
pub fn resolve(config: &FullConfig) -> Result<ResourceRegistry, ConfigError> {
    validate(config)?;

    let mut types = Vec::with_capacity(config.resources.len());
    for resource in &config.resources {
        let relationships = resource
            .relationships
            .iter()
            .map(|r| RelationshipDescriptor {
                name: r.name.clone(),
                target_type: r.target_type.clone(),
                accessor: r.accessor.clone(),
            })
            .collect();
        types.push(ResourceTypeDescriptor {
            type_name: resource.type_name.clone(),
            allowed_sorts: resource.allowed_sorts.clone(),
            allowed_includes: resource.allowed_includes.iter().cloned().collect(),
            relationships,
            hidden_attributes: resource.hidden_attributes.iter().cloned().collect(),
            create_rules: parse_rules(&resource.type_name, &resource.validation_rules.create)?,
            update_rules: parse_rules(&resource.type_name, &resource.validation_rules.update)?,
        });
    }
    tracing::info!(types = types.len(), "resource registry resolved");
    Ok(ResourceRegistry::new(types))
}

fn parse_rules(type_name: &str, rules: &BTreeMap<String, String>) -> Result<Vec<FieldRules>, ConfigError> {
    rules
        .iter()
        .map(|(path, expression)| {
            parse_field_rules(path, expression).map_err(|(rule, reason)| ConfigError::InvalidRule {
                type_name: type_name.to_string(),
                field: path.clone(),
                rule,
                reason,
            })
        })
        .collect()
}

pub fn parse_catalogue(json: &str) -> Result<FullConfig, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::Load(format!("invalid catalogue: {}", e)))
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<FullConfig, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    parse_catalogue(&raw)
}

/// Registry for the built-in users/projects/tasks/categories/groups catalogue.
pub fn default_catalogue() -> Result<ResourceRegistry, ConfigError> {
    resolve(&parse_catalogue(DEFAULT_CATALOGUE)?)
}

/// Registry from `settings.catalogue_path` when set, otherwise the built-in catalogue.
pub fn load_registry(settings: &Settings) -> Result<ResourceRegistry, ConfigError> {
    match &settings.catalogue_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading resource catalogue");
            resolve(&load_from_path(path)?)
        }
        None => default_catalogue(),
    }
}
