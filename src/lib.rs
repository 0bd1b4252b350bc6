//! JSON:API SDK: configuration-driven resource and relationship engine.

pub mod case;
pub mod config;
pub mod document;
pub mod error;
pub mod links;
pub mod logging;
pub mod notify;
pub mod response;
pub mod service;
pub mod state;
pub mod store;

pub use config::{default_catalogue, load_from_path, resolve, FullConfig, Operation, ResourceRegistry, ResourceTypeDescriptor, Settings};
pub use document::{Document, PrimaryData, ResourceIdentifier, ResourceObject};
pub use error::{AppError, ConfigError, ErrorFormatter, StoreError, ValidationError};
pub use notify::{Actor, EventKind, Notifier, RecordingNotifier, TracingNotifier};
pub use response::{created, no_content, ok};
pub use service::{JsonApiService, ListParams, RelationshipSyncEngine};
pub use state::AppState;
pub use store::{MemoryStore, Store};
