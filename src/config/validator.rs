//! Catalogue validation: referential integrity between types, relationships, includes and pivots.

use crate::config::{FullConfig, RelationshipAccessor};
use crate::error::ConfigError;
use std::collections::{HashMap, HashSet};

pub fn validate(config: &FullConfig) -> Result<(), ConfigError> {
    let mut type_names = HashSet::new();
    for resource in &config.resources {
        if resource.type_name.trim().is_empty() {
            return Err(ConfigError::Validation("resource type name must not be empty".into()));
        }
        if !type_names.insert(resource.type_name.as_str()) {
            return Err(ConfigError::DuplicateType(resource.type_name.clone()));
        }
    }

    // pivot -> (owner-column type, target-column type)
    let mut pivots: HashMap<&str, (&str, &str)> = HashMap::new();

    for resource in &config.resources {
        let mut relationship_names = HashSet::new();
        for rel in &resource.relationships {
            if !relationship_names.insert(rel.name.as_str()) {
                return Err(ConfigError::DuplicateRelationship {
                    type_name: resource.type_name.clone(),
                    relationship: rel.name.clone(),
                });
            }
            if !type_names.contains(rel.target_type.as_str()) {
                return Err(ConfigError::UnknownTarget {
                    type_name: resource.type_name.clone(),
                    relationship: rel.name.clone(),
                    target: rel.target_type.clone(),
                });
            }
            if let RelationshipAccessor::BelongsToMany { pivot, inverse } = &rel.accessor {
                let sides = if *inverse {
                    (rel.target_type.as_str(), resource.type_name.as_str())
                } else {
                    (resource.type_name.as_str(), rel.target_type.as_str())
                };
                match pivots.get(pivot.as_str()) {
                    Some((left, right)) if (*left, *right) != sides => {
                        return Err(ConfigError::PivotMismatch {
                            pivot: pivot.clone(),
                            type_name: resource.type_name.clone(),
                            relationship: rel.name.clone(),
                            expected: format!("{} -> {}", left, right),
                            found: format!("{} -> {}", sides.0, sides.1),
                        });
                    }
                    Some(_) => {}
                    None => {
                        pivots.insert(pivot.as_str(), sides);
                    }
                }
            }
        }

        for include in &resource.allowed_includes {
            if !relationship_names.contains(include.as_str()) {
                return Err(ConfigError::UndeclaredInclude {
                    type_name: resource.type_name.clone(),
                    include: include.clone(),
                });
            }
        }

        if resource.allowed_sorts.iter().any(|s| s.trim().is_empty() || s.starts_with('-')) {
            return Err(ConfigError::Validation(format!(
                "{}: sort fields must be non-empty names without a direction prefix",
                resource.type_name
            )));
        }
    }

    tracing::debug!(types = type_names.len(), pivots = pivots.len(), "catalogue validated");
    Ok(())
}
