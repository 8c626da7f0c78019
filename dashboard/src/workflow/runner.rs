use crate::generator::profile::{build_point_set_from_config, camera_seed, GeneratorConfig};
use crate::workflow::config::DashboardConfig;
use anyhow::Context;
use std::collections::BTreeMap;
use std::sync::RwLock;
use vigilcore::tile::{Tile, TileRegistry, TileStatus};

/// Summary of one camera's offline overlay pass.
#[derive(Debug, Clone)]
pub struct TileReport {
    pub camera_id: String,
    pub camera_name: String,
    pub total_detections: usize,
    pub class_counts: BTreeMap<String, usize>,
    pub peak_value: f32,
    pub painted_cells: usize,
    pub status: TileStatus,
}

impl TileReport {
    fn from_tile(tile: &Tile, camera_name: &str) -> Self {
        let threshold = tile.config().min_render_threshold;
        let painted_cells = tile
            .grid()
            .iter_cells()
            .filter(|(_, _, value)| *value > threshold)
            .count();
        let (total_detections, class_counts) = match &tile.state().last_point_set {
            Some(point_set) => (point_set.total_detections, point_set.class_counts.clone()),
            None => (0, BTreeMap::new()),
        };
        Self {
            camera_id: tile.camera_id().to_string(),
            camera_name: camera_name.to_string(),
            total_detections,
            class_counts,
            peak_value: tile.grid().max_value(),
            painted_cells,
            status: tile.status(),
        }
    }
}

/// Single-pass orchestration for offline mode: per camera, synthesize a
/// batch, run the tile pipeline, and summarize the result.
#[derive(Clone)]
pub struct Runner {
    config: DashboardConfig,
}

impl Runner {
    pub fn new(config: DashboardConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self, registry: &RwLock<TileRegistry>) -> anyhow::Result<Vec<TileReport>> {
        let mut guard = registry
            .write()
            .map_err(|_| anyhow::anyhow!("tile registry lock poisoned"))?;

        let mut reports = Vec::with_capacity(self.config.cameras.len());
        for camera in &self.config.cameras {
            let tile = guard.ensure(&camera.id);
            tile.resize(self.config.viewport_width, self.config.viewport_height);
            tile.set_online(camera.online);

            if camera.online {
                let generator = GeneratorConfig {
                    seed: camera_seed(0, &camera.id),
                    ..Default::default()
                };
                let point_set = build_point_set_from_config(&generator)
                    .with_context(|| format!("generating detections for camera {}", camera.id))?;
                let generation = tile.begin_fetch();
                tile.apply_point_set(generation, point_set);
            }

            reports.push(TileReport::from_tile(tile, &camera.name));
        }

        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runner_renders_every_configured_camera() {
        let config = DashboardConfig::from_args(3, 7, 400, 200);
        let runner = Runner::new(config.clone());
        let registry = RwLock::new(TileRegistry::new(config.to_overlay_config()));

        let reports = runner.execute(&registry).unwrap();
        assert_eq!(reports.len(), 3);
        for report in &reports {
            assert_eq!(report.status, TileStatus::Rendered);
            assert!(report.total_detections > 0);
            assert!((report.peak_value - 1.0).abs() < 1e-6);
            assert!(report.painted_cells > 0);
        }
        assert_eq!(registry.read().unwrap().len(), 3);
    }

    #[test]
    fn offline_camera_gets_a_placeholder_report() {
        let mut config = DashboardConfig::from_args(1, 7, 400, 200);
        config.cameras[0].online = false;
        let runner = Runner::new(config.clone());
        let registry = RwLock::new(TileRegistry::new(config.to_overlay_config()));

        let reports = runner.execute(&registry).unwrap();
        assert_eq!(reports[0].total_detections, 0);
        assert_eq!(reports[0].peak_value, 0.0);
        assert_eq!(reports[0].painted_cells, 0);
        let guard = registry.read().unwrap();
        assert!(guard.tile("cam-1").unwrap().placeholder());
    }
}
