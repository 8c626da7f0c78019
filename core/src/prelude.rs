use serde::{Deserialize, Serialize};

/// Shared configuration for the overlay pipeline.
///
/// Distances are in viewport pixels; the defaults match the product's
/// shipped tuning and are overridable from the dashboard config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub cell_size: u32,
    pub influence_radius: f32,
    pub min_render_threshold: f32,
    pub refresh_interval_ms: u64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            cell_size: 20,
            influence_radius: 40.0,
            min_render_threshold: 0.01,
            refresh_interval_ms: 30_000,
        }
    }
}

/// Common error type for overlay operations.
#[derive(thiserror::Error, Debug)]
pub enum OverlayError {
    #[error("fetch failure: {0}")]
    Fetch(String),
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type OverlayResult<T> = Result<T, OverlayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_shipped_tuning() {
        let config = OverlayConfig::default();
        assert_eq!(config.cell_size, 20);
        assert_eq!(config.influence_radius, 40.0);
        assert_eq!(config.min_render_threshold, 0.01);
        assert_eq!(config.refresh_interval_ms, 30_000);
    }
}
