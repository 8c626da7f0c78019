use crate::prelude::OverlayConfig;
use crate::telemetry::metrics::MetricsRecorder;
use crate::tile::tile::Tile;
use std::collections::HashMap;
use std::sync::Arc;

/// One tile per visible camera, keyed by camera identity.
///
/// Tiles have independent lifecycles: each owns its point cache, grid, and
/// surface outright, so tearing down or reassigning one can never leak into
/// another.
pub struct TileRegistry {
    tiles: HashMap<String, Tile>,
    config: OverlayConfig,
    metrics: Arc<MetricsRecorder>,
}

impl TileRegistry {
    pub fn new(config: OverlayConfig) -> Self {
        Self {
            tiles: HashMap::new(),
            config,
            metrics: Arc::new(MetricsRecorder::new()),
        }
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<MetricsRecorder> {
        &self.metrics
    }

    /// Returns the tile for a camera, creating it on first sight.
    pub fn ensure(&mut self, camera_id: &str) -> &mut Tile {
        self.tiles
            .entry(camera_id.to_string())
            .or_insert_with(|| Tile::new(camera_id, self.config.clone(), self.metrics.clone()))
    }

    pub fn tile(&self, camera_id: &str) -> Option<&Tile> {
        self.tiles.get(camera_id)
    }

    pub fn tile_mut(&mut self, camera_id: &str) -> Option<&mut Tile> {
        self.tiles.get_mut(camera_id)
    }

    pub fn remove(&mut self, camera_id: &str) -> Option<Tile> {
        self.tiles.remove(camera_id)
    }

    /// Moves a tile to a new camera identity, resetting it fully first.
    /// Returns false when the old camera has no tile.
    pub fn reassign(&mut self, old_camera_id: &str, new_camera_id: &str) -> bool {
        let Some(mut tile) = self.tiles.remove(old_camera_id) else {
            return false;
        };
        tile.reassign(new_camera_id);
        self.tiles.insert(new_camera_id.to_string(), tile);
        true
    }

    pub fn camera_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.tiles.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{DetectionPoint, PointSet};
    use crate::prelude::OverlayError;
    use crate::tile::state::TileStatus;

    fn registry() -> TileRegistry {
        TileRegistry::new(OverlayConfig::default())
    }

    fn batch() -> PointSet {
        PointSet::from_points(vec![DetectionPoint::new(0.5, 0.5, "person", 1.0)])
    }

    #[test]
    fn ensure_creates_one_tile_per_camera() {
        let mut registry = registry();
        registry.ensure("cam-1");
        registry.ensure("cam-2");
        registry.ensure("cam-1");
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.camera_ids(), vec!["cam-1", "cam-2"]);
    }

    #[test]
    fn one_tile_failure_leaves_siblings_untouched() {
        let mut registry = registry();

        let healthy = registry.ensure("cam-1");
        healthy.resize(400, 200);
        let generation = healthy.begin_fetch();
        healthy.apply_point_set(generation, batch());

        let failing = registry.ensure("cam-2");
        failing.resize(400, 200);
        let generation = failing.begin_fetch();
        failing.fetch_failed(generation, &OverlayError::Fetch("unreachable".into()));

        assert_eq!(registry.tile("cam-2").unwrap().status(), TileStatus::Error);
        let healthy = registry.tile("cam-1").unwrap();
        assert_eq!(healthy.status(), TileStatus::Rendered);
        assert!((healthy.grid().max_value() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn reassign_rekeys_and_resets_the_tile() {
        let mut registry = registry();
        let tile = registry.ensure("cam-1");
        tile.resize(400, 200);
        let generation = tile.begin_fetch();
        tile.apply_point_set(generation, batch());

        assert!(registry.reassign("cam-1", "cam-5"));
        assert!(registry.tile("cam-1").is_none());
        let moved = registry.tile("cam-5").unwrap();
        assert_eq!(moved.status(), TileStatus::Idle);
        assert!(moved.state().last_point_set.is_none());
    }

    #[test]
    fn remove_tears_down_only_the_named_tile() {
        let mut registry = registry();
        registry.ensure("cam-1");
        registry.ensure("cam-2");
        assert!(registry.remove("cam-1").is_some());
        assert!(registry.remove("cam-1").is_none());
        assert!(registry.tile("cam-2").is_some());
    }
}
