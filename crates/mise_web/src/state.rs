use mise_core::RecordStorage;
use mise_scrapers::PassQueue;
use std::sync::Arc;

pub struct AppState {
    pub storage: Arc<dyn RecordStorage>,
    pub queue: PassQueue,
}

impl AppState {
    pub fn new(storage: Arc<dyn RecordStorage>, queue: PassQueue) -> Self {
        Self { storage, queue }
    }
}
