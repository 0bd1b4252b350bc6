//! Resolved registry: catalogue validated and flattened for runtime use. Immutable once built.

use crate::case::to_camel_case;
use crate::config::{FieldRules, RelationshipAccessor};
use crate::error::AppError;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Payload-validating operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Update,
}

#[derive(Clone, Debug)]
pub struct RelationshipDescriptor {
    pub name: String,
    pub target_type: String,
    pub accessor: RelationshipAccessor,
}

impl RelationshipDescriptor {
    pub fn is_to_many(&self) -> bool {
        !matches!(self.accessor, RelationshipAccessor::BelongsTo { .. })
    }

    /// Only join-entity relationships accept replace/promote/demote.
    pub fn is_mutable(&self) -> bool {
        matches!(self.accessor, RelationshipAccessor::BelongsToMany { .. })
    }
}

#[derive(Clone, Debug)]
pub struct ResourceTypeDescriptor {
    pub type_name: String,
    pub allowed_sorts: Vec<String>,
    pub allowed_includes: BTreeSet<String>,
    /// Declaration order is the order relationships are rendered and sideloaded in.
    pub relationships: Vec<RelationshipDescriptor>,
    pub hidden_attributes: HashSet<String>,
    pub(crate) create_rules: Vec<FieldRules>,
    pub(crate) update_rules: Vec<FieldRules>,
}

impl ResourceTypeDescriptor {
    pub fn rules(&self, operation: Operation) -> &[FieldRules] {
        match operation {
            Operation::Create => &self.create_rules,
            Operation::Update => &self.update_rules,
        }
    }

    pub fn is_sort_allowed(&self, field: &str) -> bool {
        self.allowed_sorts.iter().any(|s| s == field)
    }

    pub fn is_include_allowed(&self, relationship: &str) -> bool {
        self.allowed_includes.contains(relationship)
    }

    /// Look up by catalogue name or by its kebab-case URL segment.
    pub fn relationship(&self, name: &str) -> Option<&RelationshipDescriptor> {
        self.relationships
            .iter()
            .find(|r| r.name == name)
            .or_else(|| {
                let camel = to_camel_case(name);
                self.relationships.iter().find(|r| r.name == camel)
            })
    }
}

#[derive(Clone, Debug)]
pub struct ResourceRegistry {
    types: Vec<ResourceTypeDescriptor>,
    by_name: HashMap<String, usize>,
}

impl ResourceRegistry {
    pub(crate) fn new(types: Vec<ResourceTypeDescriptor>) -> Self {
        let by_name = types
            .iter()
            .enumerate()
            .map(|(i, t)| (t.type_name.clone(), i))
            .collect();
        ResourceRegistry { types, by_name }
    }

    pub fn describe(&self, type_name: &str) -> Result<&ResourceTypeDescriptor, AppError> {
        self.by_name
            .get(type_name)
            .map(|&i| &self.types[i])
            .ok_or_else(|| AppError::UnknownResourceType(type_name.to_string()))
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.by_name.contains_key(type_name)
    }

    pub fn is_sort_allowed(&self, type_name: &str, field: &str) -> bool {
        self.describe(type_name).map(|d| d.is_sort_allowed(field)).unwrap_or(false)
    }

    pub fn is_include_allowed(&self, type_name: &str, relationship: &str) -> bool {
        self.describe(type_name)
            .map(|d| d.is_include_allowed(relationship))
            .unwrap_or(false)
    }

    pub fn rules_for(&self, type_name: &str, operation: Operation) -> Result<&[FieldRules], AppError> {
        Ok(self.describe(type_name)?.rules(operation))
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|t| t.type_name.as_str())
    }
}
