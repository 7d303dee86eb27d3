//! Shared application state for all routes. The schema inside the engine is immutable for the process lifetime.

use crate::service::ResourceEngine;
use crate::settings::Settings;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ResourceEngine>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(engine: ResourceEngine, settings: Settings) -> Self {
        let engine = engine.with_max_page_size(settings.max_page_size);
        AppState {
            engine: Arc::new(engine),
            settings: Arc::new(settings),
        }
    }
}
