//! Shared state for every operation: the immutable registry plus the collaborators.

use crate::config::{ResourceRegistry, Settings};
use crate::links::LinkBuilder;
use crate::notify::Notifier;
use crate::store::Store;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    /// Built once at startup; never mutated afterwards.
    pub registry: Arc<ResourceRegistry>,
    pub store: Arc<dyn Store>,
    pub notifier: Arc<dyn Notifier>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(
        registry: ResourceRegistry,
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        settings: Settings,
    ) -> Self {
        AppState {
            registry: Arc::new(registry),
            store,
            notifier,
            settings: Arc::new(settings),
        }
    }

    pub fn links(&self) -> LinkBuilder<'_> {
        LinkBuilder::new(&self.settings.base_url)
    }
}
