use crate::{config::AppConfig, query::VizEngine};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub engine: VizEngine,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, engine: VizEngine) -> Self {
        Self { config, engine }
    }
}
