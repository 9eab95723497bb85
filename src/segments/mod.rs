pub mod cache;
pub mod model;

pub use cache::SectorCache;
pub use model::{normalize_degrees, Sector, SectorSet, Segment, FULL_TURN, MIN_WEIGHT};
