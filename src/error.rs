//! Typed errors and their JSON:API error-document mapping.

use crate::document::{Document, ResourceIdentifier};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("duplicate resource type: {0}")]
    DuplicateType(String),
    #[error("duplicate relationship '{relationship}' on {type_name}")]
    DuplicateRelationship { type_name: String, relationship: String },
    #[error("relationship {type_name}.{relationship} targets unknown type '{target}'")]
    UnknownTarget {
        type_name: String,
        relationship: String,
        target: String,
    },
    #[error("include '{include}' on {type_name} does not name a relationship")]
    UndeclaredInclude { type_name: String, include: String },
    #[error("pivot '{pivot}' joins {expected} but {type_name}.{relationship} declares {found}")]
    PivotMismatch {
        pivot: String,
        type_name: String,
        relationship: String,
        expected: String,
        found: String,
    },
    #[error("invalid rule '{rule}' for {field} on {type_name}: {reason}")]
    InvalidRule {
        type_name: String,
        field: String,
        rule: String,
        reason: String,
    },
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store backend: {0}")]
    Backend(String),
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

/// One field-level violation. `pointer` locates the offending member, e.g. `/data/0/id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub pointer: String,
    pub detail: String,
}

impl ValidationError {
    pub fn new(pointer: impl Into<String>, detail: impl Into<String>) -> Self {
        ValidationError {
            pointer: pointer.into(),
            detail: detail.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("validation failed with {} error(s)", .0.len())]
    Validation(Vec<ValidationError>),
    #[error("unknown resource type: {0}")]
    UnknownResourceType(String),
    #[error("include '{include}' is not allowed on {type_name}")]
    IncludeNotAllowed { type_name: String, include: String },
    #[error("sort field '{field}' is not allowed on {type_name}")]
    InvalidSortField { type_name: String, field: String },
    #[error("invalid pagination: {0}")]
    InvalidPagination(String),
    #[error("relationship targets not found: {}", join_identifiers(.0))]
    RelationshipTargetNotFound(Vec<ResourceIdentifier>),
    #[error("{type_name} '{id}' not found")]
    NotFound { type_name: String, id: String },
    #[error("relationship '{relationship}' does not exist on {type_name}")]
    UnknownRelationship { type_name: String, relationship: String },
    #[error("relationship '{relationship}' on {type_name} cannot be modified")]
    RelationshipNotMutable { type_name: String, relationship: String },
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn join_identifiers(ids: &[ResourceIdentifier]) -> String {
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ErrorSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pointer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ErrorObject {
    pub status: String,
    pub title: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ErrorSource>,
}

impl ErrorObject {
    fn new(status: StatusCode, title: &str, detail: String) -> Self {
        ErrorObject {
            status: status.as_u16().to_string(),
            title: title.to_string(),
            detail,
            source: None,
        }
    }

    fn pointer(mut self, pointer: String) -> Self {
        self.source = Some(ErrorSource {
            pointer: Some(pointer),
            parameter: None,
        });
        self
    }

    fn parameter(mut self, parameter: &str) -> Self {
        self.source = Some(ErrorSource {
            pointer: None,
            parameter: Some(parameter.to_string()),
        });
        self
    }
}

/// Translates any [`AppError`] into a status and an error document.
pub struct ErrorFormatter;

impl ErrorFormatter {
    pub fn status(err: &AppError) -> StatusCode {
        match err {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::UnknownResourceType(_)
            | AppError::NotFound { .. }
            | AppError::UnknownRelationship { .. }
            | AppError::RelationshipTargetNotFound(_) => StatusCode::NOT_FOUND,
            AppError::IncludeNotAllowed { .. }
            | AppError::InvalidSortField { .. }
            | AppError::InvalidPagination(_) => StatusCode::BAD_REQUEST,
            AppError::RelationshipNotMutable { .. } => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Config(_) | AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_objects(err: &AppError) -> Vec<ErrorObject> {
        let status = Self::status(err);
        match err {
            AppError::Validation(errors) => errors
                .iter()
                .map(|e| ErrorObject::new(status, "Validation Error", e.detail.clone()).pointer(e.pointer.clone()))
                .collect(),
            AppError::IncludeNotAllowed { .. } => {
                vec![ErrorObject::new(status, "Invalid Query Parameter", err.to_string()).parameter("include")]
            }
            AppError::InvalidSortField { .. } => {
                vec![ErrorObject::new(status, "Invalid Query Parameter", err.to_string()).parameter("sort")]
            }
            AppError::InvalidPagination(_) => {
                vec![ErrorObject::new(status, "Invalid Query Parameter", err.to_string()).parameter("page")]
            }
            AppError::RelationshipTargetNotFound(ids) => ids
                .iter()
                .map(|id| ErrorObject::new(status, "Resource Not Found", format!("{} '{}' not found", id.type_name, id.id)))
                .collect(),
            AppError::UnknownResourceType(_) | AppError::NotFound { .. } | AppError::UnknownRelationship { .. } => {
                vec![ErrorObject::new(status, "Resource Not Found", err.to_string())]
            }
            AppError::RelationshipNotMutable { .. } => vec![ErrorObject::new(status, "Forbidden", err.to_string())],
            AppError::Conflict(_) => vec![ErrorObject::new(status, "Conflict", err.to_string())],
            AppError::Config(_) | AppError::Store(_) => {
                tracing::error!(error = %err, "operation failed on a collaborator");
                vec![ErrorObject::new(
                    status,
                    "Internal Server Error",
                    "An unexpected error occurred.".to_string(),
                )]
            }
        }
    }

    pub fn format(err: &AppError) -> (StatusCode, Document) {
        (Self::status(err), Document::with_errors(Self::error_objects(err)))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, document) = ErrorFormatter::format(&self);
        crate::response::json_api(status, document)
    }
}
