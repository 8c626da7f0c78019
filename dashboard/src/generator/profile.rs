use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use vigilcore::detection::{DetectionPoint, FetchFuture, PointQuery, PointSet, PointSource};
use vigilcore::prelude::OverlayError;

/// Configuration for generating synthetic detection batches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub points: usize,
    pub hotspots: usize,
    /// Jitter around each hotspot, in normalized frame units.
    pub spread: f32,
    pub seed: u64,
    pub classes: Vec<String>,
    pub scenario: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            points: 120,
            hotspots: 3,
            spread: 0.06,
            seed: 0,
            classes: vec![
                "person".to_string(),
                "car".to_string(),
                "dog".to_string(),
                "bicycle".to_string(),
                "package".to_string(),
            ],
            scenario: None,
        }
    }
}

pub fn build_point_set_from_config(config: &GeneratorConfig) -> anyhow::Result<PointSet> {
    anyhow::ensure!(
        !config.classes.is_empty(),
        "generator requires at least one detection class"
    );

    let mut rng = StdRng::seed_from_u64(config.seed);
    let hotspot_count = config.hotspots.max(1);
    let hotspots: Vec<(f32, f32)> = (0..hotspot_count)
        .map(|_| (rng.gen_range(0.15..0.85), rng.gen_range(0.15..0.85)))
        .collect();

    let mut points = Vec::with_capacity(config.points);
    for index in 0..config.points {
        let (hx, hy) = hotspots[index % hotspot_count];
        let x = (hx + rng.gen_range(-config.spread..=config.spread)).clamp(0.0, 1.0);
        let y = (hy + rng.gen_range(-config.spread..=config.spread)).clamp(0.0, 1.0);
        let class = config.classes[rng.gen_range(0..config.classes.len())].clone();
        // Detector confidence band typical of the upstream pipeline.
        let weight = rng.gen_range(0.5..1.0);
        points.push(DetectionPoint::new(x, y, class, weight));
    }

    Ok(PointSet::from_points(points))
}

pub fn build_point_set(points: usize, seed: u64) -> anyhow::Result<PointSet> {
    let config = GeneratorConfig {
        points,
        seed,
        ..Default::default()
    };
    build_point_set_from_config(&config)
}

/// Derives a per-camera seed so each synthetic camera shows a distinct but
/// stable activity pattern.
pub fn camera_seed(base: u64, camera_id: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    camera_id.hash(&mut hasher);
    base ^ hasher.finish()
}

/// Point source that synthesizes a fresh deterministic batch per fetch.
///
/// Cameras listed in `failing` answer every fetch with an error, which lets
/// the dashboard exercise the stale-overlay and error paths end to end.
pub struct SyntheticPointSource {
    base: GeneratorConfig,
    failing: Mutex<BTreeSet<String>>,
}

impl SyntheticPointSource {
    pub fn new(base: GeneratorConfig) -> Self {
        Self {
            base,
            failing: Mutex::new(BTreeSet::new()),
        }
    }

    pub fn fail_camera(&self, camera_id: &str) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(camera_id.to_string());
        }
    }

    pub fn restore_camera(&self, camera_id: &str) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.remove(camera_id);
        }
    }

    fn is_failing(&self, camera_id: &str) -> bool {
        self.failing
            .lock()
            .map(|failing| failing.contains(camera_id))
            .unwrap_or(false)
    }
}

impl PointSource for SyntheticPointSource {
    fn fetch(&self, query: PointQuery) -> FetchFuture<'_> {
        let failing = self.is_failing(&query.camera_id);
        let mut config = self.base.clone();
        config.seed = camera_seed(self.base.seed, &query.camera_id);
        Box::pin(async move {
            if failing {
                return Err(OverlayError::Fetch(format!(
                    "camera {} is unreachable",
                    query.camera_id
                )));
            }
            let mut point_set = build_point_set_from_config(&config)
                .map_err(|error| OverlayError::Internal(error.to_string()))?;
            // The source applies the query's class filter server-side, the
            // same way the detection API does.
            if let Some(filter) = &query.class_filter {
                let points = point_set
                    .points
                    .into_iter()
                    .filter(|point| filter.contains(&point.class_name))
                    .collect();
                point_set = PointSet::from_points(points);
            }
            Ok(point_set)
        })
    }
}
