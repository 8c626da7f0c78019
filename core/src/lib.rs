//! Detection-density overlay core for the Vigil camera dashboard.
//!
//! The modules cover the per-camera heat-overlay pipeline: detection point
//! ingestion, kernel-density estimation, color-mapped surface rendering, and
//! the tile lifecycle that keeps each camera's overlay consistent with its
//! latest point batch, class filter, and viewport size.

pub mod density;
pub mod detection;
pub mod prelude;
pub mod telemetry;
pub mod tile;

pub use prelude::{OverlayConfig, OverlayError, OverlayResult};
