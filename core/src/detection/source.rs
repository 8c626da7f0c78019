use crate::detection::point::PointSet;
use crate::prelude::OverlayResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;

/// Request issued to a point source for one camera and time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointQuery {
    pub camera_id: String,
    pub time_window_days: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_filter: Option<BTreeSet<String>>,
}

impl PointQuery {
    pub fn new(camera_id: impl Into<String>, time_window_days: u32) -> Self {
        Self {
            camera_id: camera_id.into(),
            time_window_days,
            class_filter: None,
        }
    }
}

/// Dashboard-wide query parameters shared by every tile's poller.
///
/// A `None` class filter selects all classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySettings {
    pub time_window_days: u32,
    pub class_filter: Option<BTreeSet<String>>,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            time_window_days: 7,
            class_filter: None,
        }
    }
}

impl QuerySettings {
    pub fn for_camera(&self, camera_id: &str) -> PointQuery {
        PointQuery {
            camera_id: camera_id.to_string(),
            time_window_days: self.time_window_days,
            class_filter: self.class_filter.clone(),
        }
    }
}

pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = OverlayResult<PointSet>> + Send + 'a>>;

/// Supplier of detection points, one batch per (camera, window) request.
///
/// Failure is reported as an error value so the caller can keep its last
/// rendered state; a source must never panic the tile that polls it.
pub trait PointSource: Send + Sync {
    fn fetch(&self, query: PointQuery) -> FetchFuture<'_>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_expand_to_camera_query() {
        let mut filter = BTreeSet::new();
        filter.insert("person".to_string());
        let settings = QuerySettings {
            time_window_days: 30,
            class_filter: Some(filter),
        };
        let query = settings.for_camera("cam-7");
        assert_eq!(query.camera_id, "cam-7");
        assert_eq!(query.time_window_days, 30);
        assert!(query.class_filter.unwrap().contains("person"));
    }

    #[test]
    fn query_serializes_without_empty_filter() {
        let query = PointQuery::new("cam-1", 7);
        let json = serde_json::to_string(&query).unwrap();
        assert!(!json.contains("class_filter"));
    }
}
