//! JSON:API document model: resource identifiers, resource objects, linkage and the top-level envelope.

use crate::error::ErrorObject;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// `{type, id}` pair. Equality over both members; used as the dedup key for sideloading.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    #[serde(rename = "type")]
    pub type_name: String,
    pub id: String,
}

impl ResourceIdentifier {
    pub fn new(type_name: impl Into<String>, id: impl Into<String>) -> Self {
        ResourceIdentifier {
            type_name: type_name.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for ResourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.type_name, self.id)
    }
}

/// Link set. The same shape serves resource, relationship and top-level links; unset members are omitted.
/// `prev`/`next` are doubly optional so a paginated document can carry an explicit `null`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Links {
    #[serde(rename = "self", skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<Option<String>>,
}

impl Links {
    pub fn self_only(url: String) -> Self {
        Links {
            self_link: Some(url),
            ..Links::default()
        }
    }
}

/// Linkage `data`: a single (nullable) identifier for to-one, an ordered list for to-many.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LinkageData {
    Many(Vec<ResourceIdentifier>),
    One(Option<ResourceIdentifier>),
}

impl LinkageData {
    pub fn identifiers(&self) -> Vec<&ResourceIdentifier> {
        match self {
            LinkageData::Many(ids) => ids.iter().collect(),
            LinkageData::One(id) => id.iter().collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RelationshipLinkage {
    pub links: Links,
    pub data: LinkageData,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResourceObject {
    #[serde(rename = "type")]
    pub type_name: String,
    pub id: String,
    pub attributes: Map<String, Value>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub relationships: BTreeMap<String, RelationshipLinkage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
}

impl ResourceObject {
    pub fn identifier(&self) -> ResourceIdentifier {
        ResourceIdentifier::new(self.type_name.clone(), self.id.clone())
    }

    pub fn relationship(&self, name: &str) -> Option<&RelationshipLinkage> {
        self.relationships.get(name)
    }
}

/// Primary `data` member. `Null` serializes as an explicit JSON null.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PrimaryData {
    Null,
    Resource(Box<ResourceObject>),
    Resources(Vec<ResourceObject>),
    Identifier(ResourceIdentifier),
    Identifiers(Vec<ResourceIdentifier>),
}

impl From<LinkageData> for PrimaryData {
    fn from(data: LinkageData) -> Self {
        match data {
            LinkageData::Many(ids) => PrimaryData::Identifiers(ids),
            LinkageData::One(Some(id)) => PrimaryData::Identifier(id),
            LinkageData::One(None) => PrimaryData::Null,
        }
    }
}

/// Top-level document. A document carries either `data` or `errors`, never both.
/// `included` is only present when includes were requested.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Document {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<PrimaryData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub included: Option<Vec<ResourceObject>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ErrorObject>>,
}

impl Document {
    pub fn with_data(data: PrimaryData) -> Self {
        Document {
            data: Some(data),
            ..Document::default()
        }
    }

    pub fn with_errors(errors: Vec<ErrorObject>) -> Self {
        Document {
            errors: Some(errors),
            ..Document::default()
        }
    }

    pub fn links(mut self, links: Links) -> Self {
        self.links = Some(links);
        self
    }

    pub fn included(mut self, included: Option<Vec<ResourceObject>>) -> Self {
        self.included = included;
        self
    }

    pub fn meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }
}
