use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Single detection observation emitted by the upstream vision pipeline.
///
/// Positions are normalized to the camera frame so a cached batch can be
/// reprojected onto any viewport size without a refetch. The weight is the
/// detector's confidence score; immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionPoint {
    pub x: f32,
    pub y: f32,
    pub class_name: String,
    pub weight: f32,
}

impl DetectionPoint {
    pub fn new(x: f32, y: f32, class_name: impl Into<String>, weight: f32) -> Self {
        Self {
            x,
            y,
            class_name: class_name.into(),
            weight,
        }
    }
}

/// One camera's detection batch for a time window.
///
/// A fetched batch replaces the previous one wholesale; batches are never
/// merged incrementally. A batch with zero detections is a normal
/// "no activity" state, not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointSet {
    #[serde(default)]
    pub points: Vec<DetectionPoint>,
    #[serde(default)]
    pub total_detections: usize,
    #[serde(default)]
    pub class_counts: BTreeMap<String, usize>,
}

impl PointSet {
    /// Builds a batch locally, deriving the count fields from the points.
    pub fn from_points(points: Vec<DetectionPoint>) -> Self {
        let mut class_counts = BTreeMap::new();
        for point in &points {
            *class_counts.entry(point.class_name.clone()).or_insert(0) += 1;
        }
        Self {
            total_detections: points.len(),
            class_counts,
            points,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
