//! Raw catalogue types matching the resource catalogue JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a relationship's linkage is derived from stored records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RelationshipAccessor {
    /// To-one: the owner holds the target id in `foreign_key`.
    BelongsTo { foreign_key: String },
    /// To-many: each target holds the owner id in `foreign_key`.
    HasMany { foreign_key: String },
    /// To-many through join entities keyed by `pivot`. `inverse` marks the side that
    /// sits in the pivot's target column.
    BelongsToMany {
        pivot: String,
        #[serde(default)]
        inverse: bool,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelationshipConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub target_type: String,
    pub accessor: RelationshipAccessor,
}

/// Field path (e.g. `data.attributes.title`) to pipe-delimited rule expression, per operation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ValidationRulesConfig {
    #[serde(default)]
    pub create: BTreeMap<String, String>,
    #[serde(default)]
    pub update: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResourceConfig {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub allowed_sorts: Vec<String>,
    #[serde(default)]
    pub allowed_includes: Vec<String>,
    #[serde(default)]
    pub validation_rules: ValidationRulesConfig,
    #[serde(default)]
    pub relationships: Vec<RelationshipConfig>,
    /// Attribute names that must never be exposed in documents (e.g. password hashes).
    #[serde(default)]
    pub hidden_attributes: Vec<String>,
}

/// Whole catalogue as loaded from JSON.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FullConfig {
    pub resources: Vec<ResourceConfig>,
}
