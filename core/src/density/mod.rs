pub mod colormap;
pub mod estimator;
pub mod grid;
pub mod surface;

pub use colormap::{ColorMapper, ColorStop, Rgba};
pub use estimator::DensityEstimator;
pub use grid::DensityGrid;
pub use surface::{PixelSurface, SurfaceRenderer};
