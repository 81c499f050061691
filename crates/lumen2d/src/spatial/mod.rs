//! Spatial partitioning structures
//!
//! Provides the 2D bounding areas renderables and physics bodies report,
//! and the quad tree the render pass rebuilds each frame for camera
//! culling queries.

pub mod bounds;
pub mod quad_tree;

pub use bounds::BoundingArea;
pub use quad_tree::{QuadTree, QuadTreeConfig};
