pub mod geometry;
pub mod period;
pub mod tile;

pub use geometry::{BoundingBox, Crs, Roi};
pub use period::MonthlyRange;
pub use tile::{Grid, GridCell, Tile};
