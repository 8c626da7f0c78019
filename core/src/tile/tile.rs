use crate::density::{DensityEstimator, DensityGrid, PixelSurface, SurfaceRenderer};
use crate::detection::{DetectionPoint, PointSet};
use crate::prelude::{OverlayConfig, OverlayError};
use crate::telemetry::log::LogManager;
use crate::telemetry::metrics::MetricsRecorder;
use crate::tile::state::{TileState, TileStatus};
use std::collections::BTreeSet;
use std::sync::Arc;

/// One camera's self-contained overlay: point cache, density grid, and
/// rendered surface, plus the triggers that keep them consistent.
///
/// Every trigger runs the full filter -> estimate -> paint pipeline
/// synchronously; there are no incremental updates, so the rendered surface
/// always matches the current point set, class selection, and viewport.
pub struct Tile {
    state: TileState,
    grid: DensityGrid,
    surface: PixelSurface,
    config: OverlayConfig,
    logger: LogManager,
    metrics: Arc<MetricsRecorder>,
}

impl Tile {
    pub fn new(
        camera_id: impl Into<String>,
        config: OverlayConfig,
        metrics: Arc<MetricsRecorder>,
    ) -> Self {
        let state = TileState::new(camera_id);
        Self {
            grid: DensityGrid::zeros(0, 0, config.cell_size),
            surface: PixelSurface::default(),
            state,
            config,
            logger: LogManager::new("tile"),
            metrics,
        }
    }

    pub fn camera_id(&self) -> &str {
        &self.state.camera_id
    }

    pub fn state(&self) -> &TileState {
        &self.state
    }

    pub fn status(&self) -> TileStatus {
        self.state.status
    }

    pub fn grid(&self) -> &DensityGrid {
        &self.grid
    }

    pub fn surface(&self) -> &PixelSurface {
        &self.surface
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// An offline camera shows a placeholder instead of a density overlay.
    pub fn placeholder(&self) -> bool {
        !self.state.camera_online
    }

    /// Marks the tile loading and returns the generation token the eventual
    /// response must present. The previous render stays on screen while the
    /// fetch is in flight.
    pub fn begin_fetch(&mut self) -> u64 {
        self.state.status = TileStatus::Loading;
        self.state.generation
    }

    /// Replaces the point cache wholesale and re-renders. A response whose
    /// generation no longer matches belongs to a camera this tile has since
    /// dropped, and is discarded unpainted.
    pub fn apply_point_set(&mut self, generation: u64, point_set: PointSet) {
        if generation != self.state.generation {
            self.metrics.record_discarded();
            self.logger.record(&format!(
                "camera {} discarded a stale point batch",
                self.state.camera_id
            ));
            return;
        }
        self.state.last_point_set = Some(point_set);
        self.render();
        self.state.status = TileStatus::Rendered;
    }

    /// Fetch failure keeps the last rendered overlay if one exists;
    /// otherwise the tile reports an error state. Never fatal to siblings.
    pub fn fetch_failed(&mut self, generation: u64, error: &OverlayError) {
        if generation != self.state.generation {
            self.metrics.record_discarded();
            return;
        }
        self.metrics.record_fetch_failure();
        self.logger.record_warn(&format!(
            "camera {} fetch failed: {}",
            self.state.camera_id, error
        ));
        self.state.status = if self.state.last_point_set.is_some() {
            TileStatus::Rendered
        } else {
            TileStatus::Error
        };
    }

    /// Changes the class selection and re-renders from the cached points.
    pub fn set_selected_classes(&mut self, classes: Option<BTreeSet<String>>) {
        self.state.selected_classes = classes;
        self.render();
    }

    /// Reprojects the cached points onto the new viewport. No refetch is
    /// needed since point coordinates are stored normalized.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.state.viewport = (width, height);
        self.render();
    }

    pub fn set_online(&mut self, online: bool) {
        self.state.camera_online = online;
        self.render();
    }

    /// Reassigns the tile to a different camera: a full reset with no
    /// carryover of the previous camera's cache, grid, or surface. The
    /// generation bump invalidates any in-flight fetch for the old camera.
    pub fn reassign(&mut self, camera_id: impl Into<String>) {
        let viewport = self.state.viewport;
        let generation = self.state.generation + 1;
        self.state = TileState::new(camera_id);
        self.state.viewport = viewport;
        self.state.generation = generation;
        self.grid = DensityGrid::zeros(0, 0, self.config.cell_size);
        self.surface = PixelSurface::default();
    }

    fn filtered_points(&self) -> Vec<DetectionPoint> {
        let Some(point_set) = &self.state.last_point_set else {
            return Vec::new();
        };
        match &self.state.selected_classes {
            None => point_set.points.clone(),
            Some(selected) => point_set
                .points
                .iter()
                .filter(|point| selected.contains(&point.class_name))
                .cloned()
                .collect(),
        }
    }

    fn render(&mut self) {
        let (width, height) = self.state.viewport;
        if width == 0 || height == 0 {
            // Collapsed container: skip all computation until it has size.
            self.grid = DensityGrid::zeros(0, 0, self.config.cell_size);
            self.surface = PixelSurface::default();
            return;
        }
        self.surface.resize(width, height);
        if !self.state.camera_online {
            // Placeholder tiles carry no density; the shell draws them.
            self.grid = DensityGrid::zeros(width, height, self.config.cell_size);
            return;
        }
        let points = self.filtered_points();
        self.grid = DensityEstimator::estimate(&points, width, height, &self.config);
        SurfaceRenderer::paint(&self.grid, &self.config, &mut self.surface);
        self.metrics.record_render();
    }
}
