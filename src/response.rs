//! Response helpers: JSON:API documents with the `application/vnd.api+json` media type.

use crate::document::Document;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

pub const JSONAPI_MEDIA_TYPE: &str = "application/vnd.api+json";

pub fn json_api(status: StatusCode, document: Document) -> Response {
    let mut response = (status, Json(document)).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(JSONAPI_MEDIA_TYPE));
    response
}

pub fn ok(document: Document) -> Response {
    json_api(StatusCode::OK, document)
}

pub fn created(document: Document) -> Response {
    json_api(StatusCode::CREATED, document)
}

/// Relationship updates and deletes answer with an empty body.
pub fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

impl IntoResponse for Document {
    fn into_response(self) -> Response {
        ok(self)
    }
}
