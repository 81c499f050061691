//! Scene-scoped systems
//!
//! A system is a cross-cutting service owned by one scene and driven
//! once per update, before any component updates run. Systems are not
//! ECS systems; they are services like physics steppers or spawn
//! managers that need a whole-scene view.

use std::any::Any;

use crate::foundation::time::FrameTime;
use crate::input::InputState;
use crate::scene::Scene;

/// Cross-cutting service registered on a scene
pub trait System: Any {
    /// Human-readable name for diagnostics
    fn name(&self) -> &str {
        "system"
    }

    /// Called once when the owning scene initializes, after the entity
    /// tree has been initialized
    fn initialize(&mut self, scene: &mut Scene) {
        let _ = scene;
    }

    /// Called once per frame before component updates
    fn update(&mut self, frame: &FrameTime, input: &InputState, scene: &mut Scene) {
        let _ = (frame, input, scene);
    }
}

impl dyn System {
    /// Downcast a shared system reference to a concrete type
    pub fn downcast_ref<T: System>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref()
    }
}
