use crate::gui_bridge::model::DashboardModel;
use crate::workflow::config::DashboardConfig;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeSet;
use std::{
    net::SocketAddr,
    sync::{Arc, RwLock},
    thread,
};
use tokio::runtime::Builder;
use tokio::sync::watch;
use vigilcore::detection::{PointSet, QuerySettings};
use vigilcore::tile::TileRegistry;
use warp::{http::StatusCode, Filter};

fn gui_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9100))
}

#[derive(Debug)]
struct WarpError;

impl warp::reject::Reject for WarpError {}

/// A detection batch pushed into one camera's tile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRequest {
    pub camera_id: String,
    pub point_set: PointSet,
}

/// Filter update from the visualizer. An absent class list selects all
/// classes; an empty list selects none. An absent window keeps the current
/// one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRequest {
    #[serde(default)]
    pub time_window_days: Option<u32>,
    #[serde(default)]
    pub classes: Option<Vec<String>>,
}

/// Bridge that hosts the dashboard HTTP endpoints: tile models out,
/// detection batches and filter changes in.
pub struct GuiBridge {
    registry: Arc<RwLock<TileRegistry>>,
}

impl GuiBridge {
    pub fn new(
        registry: Arc<RwLock<TileRegistry>>,
        settings: watch::Sender<QuerySettings>,
        config: DashboardConfig,
    ) -> Self {
        let settings = Arc::new(settings);
        let config = Arc::new(config);
        let registry_for_filter = registry.clone();
        let registry_filter = warp::any().map(move || registry_for_filter.clone());
        let settings_filter = warp::any().map(move || settings.clone());
        let config_filter = warp::any().map(move || config.clone());

        let get_route = warp::path("tiles")
            .and(warp::get())
            .and(registry_filter.clone())
            .map(|registry: Arc<RwLock<TileRegistry>>| {
                let guard = registry.read().unwrap();
                warp::reply::json(&DashboardModel::from_registry(&guard))
            });

        let ingest_route = warp::path("ingest-points")
            .and(warp::post())
            .and(warp::body::json())
            .and(registry_filter.clone())
            .and(config_filter)
            .and_then(
                |request: IngestRequest,
                 registry: Arc<RwLock<TileRegistry>>,
                 config: Arc<DashboardConfig>| async move {
                    let mut guard = registry.write().unwrap();
                    let tile = guard.ensure(&request.camera_id);
                    if tile.state().viewport == (0, 0) {
                        tile.resize(config.viewport_width, config.viewport_height);
                    }
                    let generation = tile.begin_fetch();
                    let total = request.point_set.total_detections;
                    tile.apply_point_set(generation, request.point_set);
                    log::info!(
                        "[bridge] ingested {} detections for camera {}",
                        total,
                        request.camera_id
                    );
                    Ok::<_, warp::Rejection>(warp::reply::with_status(
                        warp::reply::json(&json!({
                            "status": "ok",
                            "camera_id": request.camera_id,
                            "detections": total
                        })),
                        StatusCode::OK,
                    ))
                },
            );

        let filter_route = warp::path("filter")
            .and(warp::post())
            .and(warp::body::json())
            .and(registry_filter)
            .and(settings_filter)
            .and_then(
                |request: FilterRequest,
                 registry: Arc<RwLock<TileRegistry>>,
                 settings: Arc<watch::Sender<QuerySettings>>| async move {
                    let selected: Option<BTreeSet<String>> = request
                        .classes
                        .map(|classes| classes.into_iter().collect());

                    let updated = {
                        let current = settings.borrow().clone();
                        QuerySettings {
                            time_window_days: request
                                .time_window_days
                                .unwrap_or(current.time_window_days),
                            class_filter: selected.clone(),
                        }
                    };
                    // Pollers refetch immediately on this broadcast.
                    settings.send_replace(updated.clone());

                    let mut guard = registry.write().unwrap();
                    for camera_id in guard.camera_ids() {
                        if let Some(tile) = guard.tile_mut(&camera_id) {
                            tile.set_selected_classes(selected.clone());
                        }
                    }
                    Ok::<_, warp::Rejection>(warp::reply::with_status(
                        warp::reply::json(&json!({
                            "status": "ok",
                            "time_window_days": updated.time_window_days,
                        })),
                        StatusCode::OK,
                    ))
                },
            );

        let registry_for_bridge = registry.clone();
        thread::spawn(move || {
            let routes = get_route.or(ingest_route).or(filter_route);
            let runtime = Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("failed to build bridge runtime");
            runtime.block_on(async move {
                warp::serve(routes).run(gui_bind_address()).await;
            });
        });

        Self {
            registry: registry_for_bridge,
        }
    }

    pub fn publish_status(&self, message: &str) {
        let tiles = self.registry.read().map(|guard| guard.len()).unwrap_or(0);
        println!("[BRIDGE] {} ({} tiles)", message, tiles);
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> DashboardModel {
        DashboardModel::from_registry(&self.registry.read().unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::runner::Runner;
    use vigilcore::tile::TileStatus;

    #[test]
    fn bridge_reflects_runner_results() {
        let config = DashboardConfig::from_args(2, 7, 400, 200);
        let registry = Arc::new(RwLock::new(TileRegistry::new(config.to_overlay_config())));
        let (settings_tx, _settings_rx) = watch::channel(config.query_settings());
        let bridge = GuiBridge::new(registry.clone(), settings_tx, config.clone());

        let runner = Runner::new(config);
        runner.execute(&registry).unwrap();

        let model = bridge.snapshot();
        assert_eq!(model.tiles.len(), 2);
        assert!(model
            .tiles
            .iter()
            .all(|tile| tile.status == TileStatus::Rendered));
        assert!(model.metrics.renders >= 2);
    }
}
