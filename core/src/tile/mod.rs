pub mod poller;
pub mod registry;
pub mod state;
pub mod tile;

pub use poller::TilePoller;
pub use registry::TileRegistry;
pub use state::{TileState, TileStatus};
pub use tile::Tile;
