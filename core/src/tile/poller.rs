use crate::detection::{PointSource, QuerySettings};
use crate::tile::registry::TileRegistry;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;

/// Cancellable periodic fetch loop for one tile.
///
/// The task wakes on its refresh interval and immediately whenever the
/// shared query settings change. Each fetch carries the tile's generation
/// token, so a response that lands after a reset or reassignment is
/// discarded instead of painted. The task aborts on shutdown or drop; a
/// torn-down tile never has an orphaned timer fetching into it.
pub struct TilePoller {
    camera_id: String,
    handle: JoinHandle<()>,
}

impl TilePoller {
    pub fn spawn<S>(
        camera_id: impl Into<String>,
        source: Arc<S>,
        registry: Arc<RwLock<TileRegistry>>,
        mut settings_rx: watch::Receiver<QuerySettings>,
        refresh_interval: Duration,
    ) -> Self
    where
        S: PointSource + ?Sized + 'static,
    {
        let camera_id = camera_id.into();
        let id = camera_id.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(refresh_interval);
            ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    changed = settings_rx.changed() => {
                        // Settings sender gone means the dashboard is
                        // shutting down.
                        if changed.is_err() {
                            break;
                        }
                    }
                }

                let query = settings_rx.borrow().for_camera(&id);
                let generation = {
                    let Ok(mut guard) = registry.write() else { break };
                    match guard.tile_mut(&id) {
                        Some(tile) => tile.begin_fetch(),
                        // Tile torn down: stop polling.
                        None => break,
                    }
                };

                match source.fetch(query).await {
                    Ok(point_set) => {
                        if let Ok(mut guard) = registry.write() {
                            if let Some(tile) = guard.tile_mut(&id) {
                                tile.apply_point_set(generation, point_set);
                            }
                        }
                    }
                    Err(error) => {
                        if let Ok(mut guard) = registry.write() {
                            if let Some(tile) = guard.tile_mut(&id) {
                                tile.fetch_failed(generation, &error);
                            }
                        }
                    }
                }
            }
        });
        Self { camera_id, handle }
    }

    pub fn camera_id(&self) -> &str {
        &self.camera_id
    }

    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

impl Drop for TilePoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{DetectionPoint, FetchFuture, PointQuery, PointSet};
    use crate::prelude::{OverlayConfig, OverlayError};
    use crate::tile::state::TileStatus;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct ScriptedSource {
        calls: AtomicUsize,
        fail: AtomicBool,
    }

    impl ScriptedSource {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl PointSource for ScriptedSource {
        fn fetch(&self, _query: PointQuery) -> FetchFuture<'_> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let fail = self.fail.load(Ordering::SeqCst);
            Box::pin(async move {
                if fail {
                    Err(OverlayError::Fetch("scripted failure".into()))
                } else {
                    Ok(PointSet::from_points(vec![DetectionPoint::new(
                        0.5, 0.5, "person", 0.9,
                    )]))
                }
            })
        }
    }

    fn sized_registry(camera_id: &str) -> Arc<RwLock<TileRegistry>> {
        let mut registry = TileRegistry::new(OverlayConfig::default());
        registry.ensure(camera_id).resize(400, 200);
        Arc::new(RwLock::new(registry))
    }

    #[tokio::test]
    async fn poller_fetches_and_renders_on_spawn() {
        let registry = sized_registry("cam-1");
        let source = Arc::new(ScriptedSource::new());
        let (_settings_tx, settings_rx) = watch::channel(QuerySettings::default());

        let poller = TilePoller::spawn(
            "cam-1",
            source.clone(),
            registry.clone(),
            settings_rx,
            Duration::from_millis(10),
        );
        time::sleep(Duration::from_millis(80)).await;

        assert!(source.calls() >= 1);
        let guard = registry.read().unwrap();
        let tile = guard.tile("cam-1").unwrap();
        assert_eq!(tile.status(), TileStatus::Rendered);
        assert!((tile.grid().max_value() - 1.0).abs() < 1e-6);
        drop(guard);
        poller.shutdown();
    }

    #[tokio::test]
    async fn shutdown_stops_the_timer() {
        let registry = sized_registry("cam-1");
        let source = Arc::new(ScriptedSource::new());
        let (_settings_tx, settings_rx) = watch::channel(QuerySettings::default());

        let poller = TilePoller::spawn(
            "cam-1",
            source.clone(),
            registry,
            settings_rx,
            Duration::from_millis(10),
        );
        time::sleep(Duration::from_millis(40)).await;
        poller.shutdown();
        time::sleep(Duration::from_millis(20)).await;

        let calls_after_shutdown = source.calls();
        time::sleep(Duration::from_millis(60)).await;
        assert_eq!(source.calls(), calls_after_shutdown);
    }

    #[tokio::test]
    async fn settings_change_triggers_an_immediate_refetch() {
        let registry = sized_registry("cam-1");
        let source = Arc::new(ScriptedSource::new());
        let (settings_tx, settings_rx) = watch::channel(QuerySettings::default());

        // A long interval so only the initial tick and the settings change
        // can trigger fetches.
        let poller = TilePoller::spawn(
            "cam-1",
            source.clone(),
            registry,
            settings_rx,
            Duration::from_secs(3600),
        );
        time::sleep(Duration::from_millis(60)).await;
        assert_eq!(source.calls(), 1);

        settings_tx
            .send(QuerySettings {
                time_window_days: 30,
                class_filter: None,
            })
            .unwrap();
        time::sleep(Duration::from_millis(60)).await;
        assert_eq!(source.calls(), 2);
        poller.shutdown();
    }

    #[tokio::test]
    async fn removed_tile_ends_its_poller_loop() {
        let registry = sized_registry("cam-1");
        let source = Arc::new(ScriptedSource::new());
        let (_settings_tx, settings_rx) = watch::channel(QuerySettings::default());

        let _poller = TilePoller::spawn(
            "cam-1",
            source.clone(),
            registry.clone(),
            settings_rx,
            Duration::from_millis(10),
        );
        time::sleep(Duration::from_millis(40)).await;
        registry.write().unwrap().remove("cam-1");
        time::sleep(Duration::from_millis(20)).await;

        let calls_after_removal = source.calls();
        time::sleep(Duration::from_millis(60)).await;
        assert!(source.calls() <= calls_after_removal + 1);
    }

    #[tokio::test]
    async fn fetch_failure_surfaces_as_tile_error() {
        let registry = sized_registry("cam-1");
        let source = Arc::new(ScriptedSource::new());
        source.fail.store(true, Ordering::SeqCst);
        let (_settings_tx, settings_rx) = watch::channel(QuerySettings::default());

        let poller = TilePoller::spawn(
            "cam-1",
            source,
            registry.clone(),
            settings_rx,
            Duration::from_millis(10),
        );
        time::sleep(Duration::from_millis(80)).await;

        let guard = registry.read().unwrap();
        assert_eq!(guard.tile("cam-1").unwrap().status(), TileStatus::Error);
        assert!(guard.metrics().snapshot().fetch_failures >= 1);
        drop(guard);
        poller.shutdown();
    }
}
