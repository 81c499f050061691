//! Rectangular physics body component
//!
//! The engine consumes only the bounding-area contract of physics
//! bodies; collision resolution itself belongs to external systems that
//! read the scene's physics view.

use crate::foundation::math::Vec2;
use crate::scene::component::{Capabilities, Component, ComponentContext};
use crate::scene::Scene;
use crate::spatial::BoundingArea;

/// Axis-aligned rectangular body centered on the owning entity.
///
/// The rectangle's world size follows the entity's world scale; its
/// bounding area doubles as its only collider.
#[derive(Debug)]
pub struct RectangleBody {
    context: ComponentContext,
    size: Vec2,
}

impl RectangleBody {
    /// Create a body with the given local size in world units.
    ///
    /// Non-positive dimensions are clamped when the bounding area is
    /// computed.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            context: ComponentContext::default(),
            size: Vec2::new(width, height),
        }
    }

    /// Local size before entity scaling
    pub fn size(&self) -> Vec2 {
        self.size
    }
}

impl Component for RectangleBody {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PHYSICS
    }

    fn initialize(&mut self, ctx: ComponentContext, _scene: &mut Scene) {
        self.context = ctx;
    }

    fn bounding_area(&self, scene: &Scene) -> BoundingArea {
        let world = scene.world_transform(self.context.entity);
        let size = Vec2::new(
            self.size.x * world.scale.x.abs(),
            self.size.y * world.scale.y.abs(),
        );
        BoundingArea::from_center_size(world.position, size)
    }

    fn colliders(&self, scene: &Scene) -> Vec<BoundingArea> {
        vec![self.bounding_area(scene)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameContext;
    use approx::assert_relative_eq;

    #[test]
    fn body_joins_the_physics_view_with_scaled_colliders() {
        let mut scene = Scene::new();
        let block = scene.spawn("block");
        scene.set_local_position(block, Vec2::new(3.0, -1.0));
        scene.set_local_scale(block, Vec2::new(2.0, 0.5));
        let body = scene.add_component(block, Box::new(RectangleBody::new(4.0, 4.0)));
        scene.initialize(&GameContext::default());

        assert!(scene.physics_bodies().contains(body));

        let colliders = scene
            .component(body)
            .and_then(|slot| slot.behavior())
            .map(|behavior| behavior.colliders(&scene))
            .unwrap();
        assert_eq!(colliders.len(), 1);
        assert_relative_eq!(colliders[0].center(), Vec2::new(3.0, -1.0));
        assert_relative_eq!(colliders[0].size(), Vec2::new(8.0, 2.0));
    }
}
