pub mod actor;
pub mod geometry;
pub mod physics;
pub mod tile;
