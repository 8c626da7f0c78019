pub mod point;
pub mod source;

pub use point::{DetectionPoint, PointSet};
pub use source::{FetchFuture, PointQuery, PointSource, QuerySettings};
