use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use vigilcore::detection::QuerySettings;
use vigilcore::prelude::OverlayConfig;

/// One camera entry in the dashboard config.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CameraSpec {
    pub id: String,
    pub name: String,
    #[serde(default = "default_online")]
    pub online: bool,
}

fn default_online() -> bool {
    true
}

/// Dashboard-level configuration: the camera set, the query window, and the
/// overlay tuning shared by every tile.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub cameras: Vec<CameraSpec>,
    pub time_window_days: u32,
    pub cell_size: u32,
    pub influence_radius: f32,
    pub refresh_interval_ms: u64,
    pub min_render_threshold: f32,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let overlay = OverlayConfig::default();
        Self {
            cameras: Vec::new(),
            time_window_days: 7,
            cell_size: overlay.cell_size,
            influence_radius: overlay.influence_radius,
            refresh_interval_ms: overlay.refresh_interval_ms,
            min_render_threshold: overlay.min_render_threshold,
            viewport_width: 640,
            viewport_height: 360,
        }
    }
}

impl DashboardConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading dashboard config {}", path_ref.display()))?;
        let config: DashboardConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing dashboard config {}", path_ref.display()))?;
        Ok(config)
    }

    /// Builds a config for N synthetic cameras when no YAML is supplied.
    pub fn from_args(
        cameras: usize,
        time_window_days: u32,
        viewport_width: u32,
        viewport_height: u32,
    ) -> Self {
        let cameras = (1..=cameras.max(1))
            .map(|index| CameraSpec {
                id: format!("cam-{index}"),
                name: format!("Camera {index}"),
                online: true,
            })
            .collect();
        Self {
            cameras,
            time_window_days,
            viewport_width,
            viewport_height,
            ..Self::default()
        }
    }

    pub fn to_overlay_config(&self) -> OverlayConfig {
        OverlayConfig {
            cell_size: self.cell_size,
            influence_radius: self.influence_radius,
            min_render_threshold: self.min_render_threshold,
            refresh_interval_ms: self.refresh_interval_ms,
        }
    }

    pub fn query_settings(&self) -> QuerySettings {
        QuerySettings {
            time_window_days: self.time_window_days,
            class_filter: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_produces_overlay_config() {
        let config = DashboardConfig::from_args(3, 30, 800, 450);
        assert_eq!(config.cameras.len(), 3);
        assert_eq!(config.cameras[0].id, "cam-1");
        assert_eq!(config.to_overlay_config().cell_size, 20);
        assert_eq!(config.query_settings().time_window_days, 30);
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"cameras:\n  - id: lobby\n    name: Lobby\n  - id: dock\n    name: Loading Dock\n    online: false\ntime_window_days: 14\ncell_size: 10\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let config = DashboardConfig::load(&path).unwrap();
        assert_eq!(config.cameras.len(), 2);
        assert!(!config.cameras[1].online);
        assert_eq!(config.time_window_days, 14);
        assert_eq!(config.cell_size, 10);
        // Unspecified fields keep the shipped defaults.
        assert_eq!(config.influence_radius, 40.0);
    }
}
