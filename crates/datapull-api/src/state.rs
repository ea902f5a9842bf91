use std::sync::Arc;

use datapull_store::{JobQueue, JobStatusStore};

#[derive(Clone)]
pub struct ApiState {
    pub api_key: Arc<str>,
    pub queue: Arc<dyn JobQueue>,
    pub statuses: Arc<dyn JobStatusStore>,
}

impl ApiState {
    pub fn new(
        api_key: impl Into<Arc<str>>,
        queue: Arc<dyn JobQueue>,
        statuses: Arc<dyn JobStatusStore>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            queue,
            statuses,
        }
    }
}
