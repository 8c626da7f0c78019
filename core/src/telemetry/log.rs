use log::{info, warn};

/// Component-tagged logger used by the overlay pipeline.
pub struct LogManager {
    component: &'static str,
}

impl LogManager {
    pub fn new(component: &'static str) -> Self {
        Self { component }
    }

    pub fn record(&self, message: &str) {
        info!("[{}] {}", self.component, message);
    }

    pub fn record_warn(&self, message: &str) {
        warn!("[{}] {}", self.component, message);
    }
}
