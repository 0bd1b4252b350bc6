//! Request validation from catalogue rules, plus the relationship-document schema.

use crate::config::{FieldRules, Operation, ResourceRegistry, ResourceTypeDescriptor, Rule};
use crate::document::ResourceIdentifier;
use crate::error::{AppError, StoreError, ValidationError};
use crate::store::Store;
use async_trait::async_trait;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Uniqueness predicate delegated to persistence.
#[async_trait]
pub trait UniquenessProbe: Send + Sync {
    async fn is_available(&self, type_name: &str, field: &str, value: &Value, ignore_id: Option<&str>) -> Result<bool, StoreError>;
}

#[async_trait]
impl<S: Store + ?Sized> UniquenessProbe for S {
    async fn is_available(&self, type_name: &str, field: &str, value: &Value, ignore_id: Option<&str>) -> Result<bool, StoreError> {
        self.is_unique(type_name, field, value, ignore_id).await
    }
}

/// Parsed relationship-update payload.
#[derive(Clone, Debug, PartialEq)]
pub enum RelationshipData {
    One(Option<ResourceIdentifier>),
    Many(Vec<ResourceIdentifier>),
}

impl RelationshipData {
    /// Requested members with duplicates removed, first occurrence wins.
    pub fn into_targets(self) -> Vec<ResourceIdentifier> {
        let ids = match self {
            RelationshipData::One(id) => id.into_iter().collect(),
            RelationshipData::Many(ids) => ids,
        };
        let mut out: Vec<ResourceIdentifier> = Vec::with_capacity(ids.len());
        for id in ids {
            if !out.contains(&id) {
                out.push(id);
            }
        }
        out
    }
}

pub struct RequestValidator;

impl RequestValidator {
    /// Validate a create/update document and return the attributes to persist.
    /// `target_id` is the addressed resource for updates. Every violation is reported, one per field.
    pub async fn validate_document<P: UniquenessProbe + ?Sized>(
        payload: &Value,
        descriptor: &ResourceTypeDescriptor,
        operation: Operation,
        target_id: Option<&str>,
        probe: &P,
    ) -> Result<Map<String, Value>, AppError> {
        let mut errors = Vec::new();

        let data = match payload.get("data") {
            Some(Value::Object(data)) => data,
            Some(Value::Null) | None => {
                return Err(AppError::Validation(vec![ValidationError::new("/data", "The data field is required.")]));
            }
            Some(_) => {
                return Err(AppError::Validation(vec![ValidationError::new("/data", "The data must be an object.")]));
            }
        };

        match data.get("type") {
            None | Some(Value::Null) => errors.push(ValidationError::new("/data/type", "The data.type field is required.")),
            Some(Value::String(t)) if *t == descriptor.type_name => {}
            Some(Value::String(_)) => errors.push(ValidationError::new("/data/type", "The selected data.type is invalid.")),
            Some(_) => errors.push(ValidationError::new("/data/type", "The data.type must be a string.")),
        }

        match (operation, data.get("id")) {
            (Operation::Update, None | Some(Value::Null)) => {
                errors.push(ValidationError::new("/data/id", "The data.id field is required."))
            }
            (Operation::Update, Some(Value::String(id))) if Some(id.as_str()) != target_id => errors.push(
                ValidationError::new("/data/id", "The data.id does not match the addressed resource."),
            ),
            (_, Some(Value::String(_))) | (Operation::Create, None | Some(Value::Null)) => {}
            (_, Some(_)) => errors.push(ValidationError::new("/data/id", "The data.id must be a string.")),
        }

        let attributes = match data.get("attributes") {
            Some(Value::Object(attributes)) => Some(attributes),
            None | Some(Value::Null) => {
                errors.push(ValidationError::new("/data/attributes", "The data.attributes field is required."));
                None
            }
            Some(_) => {
                errors.push(ValidationError::new("/data/attributes", "The data.attributes must be an array."));
                None
            }
        };

        let rules = descriptor.rules(operation);
        let ignore_id = match operation {
            Operation::Update => target_id,
            Operation::Create => None,
        };
        for field in rules {
            for (segments, value) in expand(payload, &field.segments) {
                if let Some(message) = check_field(payload, field, &segments, value, ignore_id, probe).await? {
                    errors.push(ValidationError::new(pointer(&segments), message));
                }
            }
        }

        if !errors.is_empty() {
            tracing::debug!(type_name = %descriptor.type_name, errors = errors.len(), "document rejected");
            return Err(AppError::Validation(errors));
        }

        let mut out = attributes.cloned().unwrap_or_default();
        for field in rules.iter().filter(|f| f.is_confirmed()) {
            if let Some(name) = field.segments.last() {
                out.remove(&format!("{}_confirmation", name));
            }
        }
        Ok(out)
    }

    /// Validate `{"data": null | identifier | [identifier]}`. A missing `data` member is an error;
    /// `null`, `[]` and `{}` all mean "clear".
    pub fn validate_relationship(payload: &Value, registry: &ResourceRegistry) -> Result<RelationshipData, AppError> {
        let data = match payload.as_object().and_then(|p| p.get("data")) {
            Some(data) => data,
            None => {
                return Err(AppError::Validation(vec![ValidationError::new("/data", "The data field must be present.")]));
            }
        };

        let mut errors = Vec::new();
        let result = match data {
            Value::Null => RelationshipData::One(None),
            Value::Array(items) => {
                let mut ids = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let prefix = vec!["data".to_string(), i.to_string()];
                    let id = check_identifier_member(item.get("id"), &prefix, "id", true, registry, &mut errors);
                    let type_name = check_identifier_member(item.get("type"), &prefix, "type", true, registry, &mut errors);
                    if let (Some(id), Some(type_name)) = (id, type_name) {
                        ids.push(ResourceIdentifier::new(type_name, id));
                    }
                }
                RelationshipData::Many(ids)
            }
            // `{}` clears, anything else without identifier members is rejected
            Value::Object(item) if !item.is_empty() && !item.contains_key("id") && !item.contains_key("type") => {
                errors.push(ValidationError::new("/data", "The data must be a resource identifier."));
                RelationshipData::One(None)
            }
            Value::Object(item) => {
                let prefix = vec!["data".to_string()];
                let has_id = item.contains_key("id");
                let has_type = item.contains_key("type");
                // each member is required only when its companion is present
                let id = check_identifier_member(item.get("id"), &prefix, "id", has_type, registry, &mut errors);
                let type_name = check_identifier_member(item.get("type"), &prefix, "type", has_id, registry, &mut errors);
                match (id, type_name) {
                    (Some(id), Some(type_name)) => RelationshipData::One(Some(ResourceIdentifier::new(type_name, id))),
                    _ => RelationshipData::One(None),
                }
            }
            _ => {
                errors.push(ValidationError::new("/data", "The data must be an array, an object or null."));
                RelationshipData::One(None)
            }
        };

        if errors.is_empty() {
            Ok(result)
        } else {
            Err(AppError::Validation(errors))
        }
    }
}

/// Checks one `id`/`type` member of a resource identifier. Returns the value when valid.
fn check_identifier_member(
    value: Option<&Value>,
    prefix: &[String],
    member: &str,
    required: bool,
    registry: &ResourceRegistry,
    errors: &mut Vec<ValidationError>,
) -> Option<String> {
    let mut segments = prefix.to_vec();
    segments.push(member.to_string());
    let dotted = segments.join(".");
    match value {
        None | Some(Value::Null) => {
            if required {
                errors.push(ValidationError::new(pointer(&segments), format!("The {} field is required.", dotted)));
            }
            None
        }
        Some(Value::String(s)) if member == "type" && !registry.contains(s) => {
            errors.push(ValidationError::new(pointer(&segments), format!("The selected {} is invalid.", dotted)));
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            let detail = if member == "id" {
                format!("The {} must be a string.", dotted)
            } else {
                format!("The selected {} is invalid.", dotted)
            };
            errors.push(ValidationError::new(pointer(&segments), detail));
            None
        }
    }
}

fn pointer(segments: &[String]) -> String {
    format!("/{}", segments.join("/"))
}

/// Resolve a dotted path against the payload; `*` fans out over array elements.
fn expand<'a>(root: &'a Value, segments: &[String]) -> Vec<(Vec<String>, Option<&'a Value>)> {
    fn walk<'a>(
        current: Option<&'a Value>,
        rest: &[String],
        prefix: Vec<String>,
        out: &mut Vec<(Vec<String>, Option<&'a Value>)>,
    ) {
        let Some((segment, rest)) = rest.split_first() else {
            out.push((prefix, current));
            return;
        };
        if segment == "*" {
            if let Some(Value::Array(items)) = current {
                for (i, item) in items.iter().enumerate() {
                    let mut next = prefix.clone();
                    next.push(i.to_string());
                    walk(Some(item), rest, next, out);
                }
            }
            return;
        }
        let next_value = match current {
            Some(Value::Object(map)) => map.get(segment),
            Some(Value::Array(items)) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        let mut next = prefix;
        next.push(segment.clone());
        walk(next_value, rest, next, out);
    }

    let mut out = Vec::new();
    walk(Some(root), segments, Vec::new(), &mut out);
    out
}

fn lookup<'a>(root: &'a Value, segments: &[String]) -> Option<&'a Value> {
    segments.iter().try_fold(root, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// First violated rule for one concrete field, as a message.
async fn check_field<P: UniquenessProbe + ?Sized>(
    root: &Value,
    field: &FieldRules,
    segments: &[String],
    value: Option<&Value>,
    ignore_id: Option<&str>,
    probe: &P,
) -> Result<Option<String>, AppError> {
    let name = segments.join(".");

    if value.is_none() && field.is_sometimes() {
        return Ok(None);
    }
    for rule in field.rules.iter().filter(|r| r.is_implicit()) {
        match rule {
            Rule::Present if value.is_none() => return Ok(Some(format!("The {} field must be present.", name))),
            Rule::Required if is_blank(value) => return Ok(Some(format!("The {} field is required.", name))),
            _ => {}
        }
    }
    let Some(value) = value else {
        return Ok(None);
    };
    if value.is_null() && field.is_nullable() {
        return Ok(None);
    }

    for rule in &field.rules {
        let failed = match rule {
            Rule::Required | Rule::Present | Rule::Sometimes | Rule::Nullable => None,
            Rule::String => (!value.is_string()).then(|| format!("The {} must be a string.", name)),
            Rule::Integer => (!is_integer(value)).then(|| format!("The {} must be an integer.", name)),
            Rule::Boolean => (!is_boolean(value)).then(|| format!("The {} field must be true or false.", name)),
            Rule::Array => (!(value.is_array() || value.is_object())).then(|| format!("The {} must be an array.", name)),
            Rule::Email => (!value.as_str().map(is_email).unwrap_or(false))
                .then(|| format!("The {} must be a valid email address.", name)),
            Rule::Uuid => (!value.as_str().map(|s| uuid::Uuid::parse_str(s).is_ok()).unwrap_or(false))
                .then(|| format!("The {} must be a valid UUID.", name)),
            Rule::Date => (!value.as_str().map(is_date).unwrap_or(false)).then(|| format!("The {} is not a valid date.", name)),
            Rule::DateFormat { display, pattern } => (!value
                .as_str()
                .map(|s| matches_date_format(s, pattern))
                .unwrap_or(false))
            .then(|| format!("The {} does not match the format {}.", name, display)),
            Rule::Max(max) => size_of(value)
                .filter(|(size, _)| *size > *max as f64)
                .map(|(_, unit)| format!("The {} may not be greater than {}{}.", name, max, unit)),
            Rule::Min(min) => size_of(value)
                .filter(|(size, _)| *size < *min as f64)
                .map(|(_, unit)| format!("The {} must be at least {}{}.", name, min, unit)),
            Rule::In(allowed) => (!allowed.iter().any(|a| scalar_eq(value, a))).then(|| format!("The selected {} is invalid.", name)),
            Rule::Regex(re) => (!value.as_str().map(|s| re.is_match(s)).unwrap_or(false))
                .then(|| format!("The {} format is invalid.", name)),
            Rule::Confirmed => {
                let mut companion = segments.to_vec();
                if let Some(last) = companion.last_mut() {
                    last.push_str("_confirmation");
                }
                (lookup(root, &companion) != Some(value)).then(|| format!("The {} confirmation does not match.", name))
            }
            Rule::Unique { type_name, field } => {
                let available = probe.is_available(type_name, field, value, ignore_id).await?;
                (!available).then(|| format!("The {} has already been taken.", name))
            }
        };
        if failed.is_some() {
            return Ok(failed);
        }
    }
    Ok(None)
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        _ => false,
    }
}

fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_i64() || n.is_u64(),
        Value::String(s) => s.trim().parse::<i64>().is_ok(),
        _ => false,
    }
}

fn is_boolean(value: &Value) -> bool {
    match value {
        Value::Bool(_) => true,
        Value::Number(n) => n.as_i64().map(|i| i == 0 || i == 1).unwrap_or(false),
        Value::String(s) => s == "0" || s == "1",
        _ => false,
    }
}

fn is_email(s: &str) -> bool {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok())
        .as_ref()
        .map(|re| re.is_match(s))
        .unwrap_or(false)
}

fn is_date(s: &str) -> bool {
    chrono::DateTime::parse_from_rfc3339(s).is_ok()
        || chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").is_ok()
        || chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn matches_date_format(s: &str, pattern: &str) -> bool {
    chrono::NaiveDateTime::parse_from_str(s, pattern).is_ok() || chrono::NaiveDate::parse_from_str(s, pattern).is_ok()
}

/// Size used by min/max: numbers by value, strings by characters, arrays and objects by length.
fn size_of(value: &Value) -> Option<(f64, &'static str)> {
    match value {
        Value::Number(n) => n.as_f64().map(|f| (f, "")),
        Value::String(s) => Some((s.chars().count() as f64, " characters")),
        Value::Array(a) => Some((a.len() as f64, " items")),
        Value::Object(o) => Some((o.len() as f64, " items")),
        _ => None,
    }
}

fn scalar_eq(value: &Value, allowed: &str) -> bool {
    match value {
        Value::String(s) => s == allowed,
        Value::Number(n) => n.to_string() == allowed,
        Value::Bool(b) => b.to_string() == allowed,
        _ => false,
    }
}
