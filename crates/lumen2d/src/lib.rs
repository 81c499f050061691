//! # Lumen2D
//!
//! The runtime core of a 2D scene-graph game engine.
//!
//! ## Features
//!
//! - **Scene Graph**: Arena-backed entity tree with lazily cached world
//!   transforms
//! - **Components**: Behaviors attached to entities, with capabilities
//!   resolved once at attach time
//! - **Ordered Passes**: Change-notified filtered and sorted views
//!   drive the update and render loops
//! - **Spatial Culling**: A per-frame quad tree culls renderables per
//!   camera
//! - **Deferred Mutation**: Structural changes requested mid-frame
//!   apply at well-defined drain points
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lumen2d::prelude::*;
//!
//! fn main() {
//!     lumen2d::foundation::logging::init();
//!
//!     let mut scene = Scene::new();
//!     let eye = scene.spawn("camera");
//!     scene.add_component(eye, Box::new(CameraComponent::new(10.0)));
//!
//!     let mut game = Game::new(GameSettings::default());
//!     game.load_scene(scene);
//!
//!     let mut surface = NullSurface;
//!     loop {
//!         if game.tick(&InputState::new(), &mut surface).is_err() {
//!             break;
//!         }
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::must_use_candidate)]

pub mod foundation;
pub mod game;
pub mod input;
pub mod render;
pub mod scene;
pub mod settings;
pub mod spatial;

/// Common imports for engine users
pub mod prelude {
    pub use crate::foundation::{
        collections::FilterSortCollection,
        math::{Mat3, Transform, Vec2},
        time::{FrameTime, Timer},
    };
    pub use crate::game::{Game, GameContext, GameError, Viewport};
    pub use crate::input::{Button, InputState};
    pub use crate::render::{Color, DrawSurface, NullSurface, SamplerMode, ShaderHandle};
    pub use crate::scene::{
        components::{CameraComponent, RectangleBody},
        CameraView, Capabilities, Component, ComponentContext, ComponentKey, Entity, EntityKey,
        Layers, ObserverId, Scene, SceneError, SceneEvent, SceneObserver, System,
    };
    pub use crate::settings::{GameSettings, Settings, SettingsError};
    pub use crate::spatial::{BoundingArea, QuadTree, QuadTreeConfig};
}
