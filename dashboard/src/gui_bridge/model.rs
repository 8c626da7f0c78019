use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vigilcore::telemetry::MetricsSnapshot;
use vigilcore::tile::{Tile, TileRegistry, TileStatus};

/// Serializable view of one camera tile for the visualizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileModel {
    pub camera_id: String,
    pub status: TileStatus,
    pub online: bool,
    pub total_detections: usize,
    pub class_counts: BTreeMap<String, usize>,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub grid_cols: usize,
    pub grid_rows: usize,
    pub cell_size: u32,
    /// Normalized density values, row-major.
    pub cells: Vec<f32>,
}

impl TileModel {
    pub fn from_tile(tile: &Tile) -> Self {
        let (viewport_width, viewport_height) = tile.state().viewport;
        let (total_detections, class_counts) = match &tile.state().last_point_set {
            Some(point_set) => (point_set.total_detections, point_set.class_counts.clone()),
            None => (0, BTreeMap::new()),
        };
        Self {
            camera_id: tile.camera_id().to_string(),
            status: tile.status(),
            online: !tile.placeholder(),
            total_detections,
            class_counts,
            viewport_width,
            viewport_height,
            grid_cols: tile.grid().cols(),
            grid_rows: tile.grid().rows(),
            cell_size: tile.grid().cell_size(),
            cells: tile.grid().to_row_major(),
        }
    }
}

/// Everything the visualizer needs in one payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardModel {
    pub tiles: Vec<TileModel>,
    pub metrics: MetricsSnapshot,
}

impl DashboardModel {
    pub fn from_registry(registry: &TileRegistry) -> Self {
        let mut tiles: Vec<TileModel> = registry.iter().map(TileModel::from_tile).collect();
        tiles.sort_by(|a, b| a.camera_id.cmp(&b.camera_id));
        Self {
            tiles,
            metrics: registry.metrics().snapshot(),
        }
    }
}
