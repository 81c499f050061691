//! Built-in components
//!
//! The engine ships only the components its own passes need to be
//! driven: a camera and a rectangular physics body. Game-specific
//! renderables and behaviors live in host crates.

pub mod body;
pub mod camera;

pub use body::RectangleBody;
pub use camera::CameraComponent;
