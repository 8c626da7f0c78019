use crate::detection::PointSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Lifecycle status of one camera tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileStatus {
    Idle,
    Loading,
    Rendered,
    Error,
}

/// Per-tile state, owned exclusively by one [`Tile`](crate::tile::Tile).
///
/// `selected_classes` of `None` selects every class; `Some(empty)` selects
/// none. The generation counter guards against a late-arriving fetch
/// response painting a tile that has since been reset or reassigned.
#[derive(Debug, Clone)]
pub struct TileState {
    pub camera_id: String,
    pub last_point_set: Option<PointSet>,
    pub selected_classes: Option<BTreeSet<String>>,
    pub viewport: (u32, u32),
    pub camera_online: bool,
    pub status: TileStatus,
    pub generation: u64,
}

impl TileState {
    pub fn new(camera_id: impl Into<String>) -> Self {
        Self {
            camera_id: camera_id.into(),
            last_point_set: None,
            selected_classes: None,
            viewport: (0, 0),
            camera_online: true,
            status: TileStatus::Idle,
            generation: 0,
        }
    }
}
