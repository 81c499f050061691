//! Camera component
//!
//! Provides the camera role for the render pass: a world-space view
//! area derived from the owning entity's transform, a world-to-screen
//! matrix, and a layer render mask.

use crate::foundation::math::{Mat3, Vec2};
use crate::scene::component::{CameraView, Capabilities, Component, ComponentContext};
use crate::scene::entity::Layers;
use crate::scene::Scene;
use crate::spatial::BoundingArea;

/// Smallest view height a camera may be configured with, in world units
const MINIMUM_VIEW_HEIGHT: f32 = 0.1;

/// Orthographic 2D camera.
///
/// The visible area is `view_height` world units tall, scaled by the
/// owning entity's vertical world scale, and as wide as the host
/// viewport's aspect ratio dictates. Entities whose layers miss
/// `render_mask` are never drawn by this camera.
#[derive(Debug)]
pub struct CameraComponent {
    context: ComponentContext,
    view_height: f32,
    render_mask: Layers,
}

impl Default for CameraComponent {
    fn default() -> Self {
        Self::new(10.0)
    }
}

impl CameraComponent {
    /// Create a camera seeing `view_height` world units vertically.
    ///
    /// Non-positive heights are clamped rather than rejected.
    pub fn new(view_height: f32) -> Self {
        Self {
            context: ComponentContext::default(),
            view_height: view_height.max(MINIMUM_VIEW_HEIGHT),
            render_mask: Layers::all(),
        }
    }

    /// Builder-style: restrict which layers this camera renders
    pub fn with_render_mask(mut self, mask: Layers) -> Self {
        self.render_mask = mask;
        self
    }

    /// Vertical view size in world units
    pub fn view_height(&self) -> f32 {
        self.view_height
    }

    /// Change the vertical view size, clamping non-positive values
    pub fn set_view_height(&mut self, view_height: f32) {
        self.view_height = view_height.max(MINIMUM_VIEW_HEIGHT);
    }

    /// Layers this camera renders
    pub fn render_mask(&self) -> Layers {
        self.render_mask
    }

    /// Change which layers this camera renders
    pub fn set_render_mask(&mut self, mask: Layers) {
        self.render_mask = mask;
    }
}

impl Component for CameraComponent {
    fn capabilities(&self) -> Capabilities {
        Capabilities::CAMERA
    }

    fn initialize(&mut self, ctx: ComponentContext, _scene: &mut Scene) {
        self.context = ctx;
    }

    fn camera_view(&self, scene: &Scene) -> Option<CameraView> {
        let viewport = scene.viewport();
        let world = scene.world_transform(self.context.entity);

        // The matrix below scales uniformly by the vertical term, so
        // the visible width is the aspect-corrected world height. The
        // bounds must use the same term or the cull under-covers the
        // screen.
        let world_height = self.view_height * world.scale.y.abs().max(f32::EPSILON);
        let world_width = world_height * viewport.aspect_ratio();
        let bounds = BoundingArea::from_center_size(
            world.position,
            Vec2::new(world_width, world_height),
        );

        // World units to pixels, with Y flipped into screen space and
        // the camera position mapped to the viewport center.
        let pixel_scale = viewport.height / world_height;
        let view_matrix = Mat3::new_translation(&Vec2::new(
            viewport.width * 0.5,
            viewport.height * 0.5,
        )) * Mat3::new_nonuniform_scaling(&Vec2::new(pixel_scale, -pixel_scale))
            * Mat3::new_translation(&-world.position);

        Some(CameraView {
            bounds,
            view_matrix,
            render_mask: self.render_mask,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameContext;
    use approx::assert_relative_eq;

    #[test]
    fn bounds_cover_exactly_what_the_view_matrix_shows() {
        let mut scene = Scene::new();
        let eye = scene.spawn("eye");
        scene.set_local_scale(eye, Vec2::new(0.25, 1.0));
        let key = scene.add_component(eye, Box::new(CameraComponent::new(20.0)));
        scene.initialize(&GameContext::default());

        let view = scene
            .component(key)
            .and_then(|slot| slot.behavior())
            .and_then(|behavior| behavior.camera_view(&scene))
            .unwrap();

        // The matrix scales world to pixels uniformly, so the visible
        // width in world units is viewport.width / pixel_scale.
        let viewport = scene.viewport();
        let pixel_scale = viewport.height / 20.0;
        assert_relative_eq!(view.bounds.size().y, 20.0, epsilon = 1e-4);
        assert_relative_eq!(
            view.bounds.size().x,
            viewport.width / pixel_scale,
            epsilon = 1e-4
        );
    }

    #[test]
    fn non_positive_view_height_is_clamped() {
        let camera = CameraComponent::new(-5.0);
        assert!(camera.view_height() >= MINIMUM_VIEW_HEIGHT);

        let mut camera = CameraComponent::new(10.0);
        camera.set_view_height(0.0);
        assert!(camera.view_height() >= MINIMUM_VIEW_HEIGHT);
    }

    #[test]
    fn render_mask_defaults_to_all_layers() {
        let camera = CameraComponent::default();
        assert_eq!(camera.render_mask(), Layers::all());

        let camera = camera.with_render_mask(Layers::LAYER_02);
        assert_eq!(camera.render_mask(), Layers::LAYER_02);
    }
}
