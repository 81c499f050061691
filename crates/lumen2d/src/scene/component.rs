//! Component trait, capability roles, and engine-owned slot state
//!
//! Components are opaque behavior units attached to exactly one entity.
//! Capability roles (updateable, renderable, camera, physics body) are
//! structural: a component reports its roles once through
//! [`Component::capabilities`] when it is attached, and the scene caches
//! the answer in the slot so no per-frame type tests are needed. One
//! component may satisfy several roles at once.

use std::any::Any;

use bitflags::bitflags;
use slotmap::new_key_type;

use crate::foundation::math::Mat3;
use crate::foundation::time::FrameTime;
use crate::input::InputState;
use crate::render::DrawSurface;
use crate::scene::entity::{EntityKey, Layers};
use crate::scene::Scene;
use crate::spatial::BoundingArea;

new_key_type! {
    /// Stable key addressing a component in the scene arena
    pub struct ComponentKey;
}

bitflags! {
    /// Capability roles a component can take part in, resolved once at
    /// attach time
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Participates in the per-frame update pass
        const UPDATE = 1 << 0;
        /// Has a bounding area and a render operation
        const RENDER = 1 << 1;
        /// Provides a camera view for the render pass
        const CAMERA = 1 << 2;
        /// Exposes collider areas to physics consumers
        const PHYSICS = 1 << 3;
    }
}

/// Keys identifying a component and its owning entity, handed to the
/// behavior when it is initialized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComponentContext {
    /// The owning entity
    pub entity: EntityKey,
    /// The component's own key
    pub component: ComponentKey,
}

/// Camera state a camera-capable component reports each frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    /// World-space area the camera can see, used for culling queries
    pub bounds: BoundingArea,
    /// World-to-screen transform for the draw pass
    pub view_matrix: Mat3,
    /// Only renderables on intersecting layers are drawn
    pub render_mask: Layers,
}

/// Opaque unit of behavior attached to one entity.
///
/// Every role operation has a default no-op body; implementors override
/// the ones matching the capabilities they report. `initialize` is
/// called exactly once per attach, after which the component
/// participates in the scene's views.
pub trait Component: Any {
    /// Capability roles this component takes part in.
    ///
    /// Queried once when the component is attached; the result is cached
    /// in the slot and never re-evaluated.
    fn capabilities(&self) -> Capabilities {
        Capabilities::empty()
    }

    /// Called exactly once when the component becomes live in a scene.
    ///
    /// `ctx` carries the component's own key and its owning entity;
    /// behaviors that need either later should store them here.
    fn initialize(&mut self, ctx: ComponentContext, scene: &mut Scene) {
        let _ = (ctx, scene);
    }

    /// Per-frame update, invoked in ascending update order
    fn update(&mut self, frame: &FrameTime, input: &InputState, scene: &mut Scene) {
        let _ = (frame, input, scene);
    }

    /// Draw this component for one camera.
    ///
    /// `view_bounds` is the camera's visible area; a component may clip
    /// against it at finer granularity than the broad-phase cull did.
    fn render(
        &mut self,
        frame: &FrameTime,
        view_bounds: &BoundingArea,
        surface: &mut dyn DrawSurface,
        scene: &Scene,
    ) {
        let _ = (frame, view_bounds, surface, scene);
    }

    /// World-space area this component occupies, used by the spatial
    /// index for culling
    fn bounding_area(&self, scene: &Scene) -> BoundingArea {
        let _ = scene;
        BoundingArea::default()
    }

    /// Camera state, for components with the `CAMERA` capability
    fn camera_view(&self, scene: &Scene) -> Option<CameraView> {
        let _ = scene;
        None
    }

    /// Collider areas, for components with the `PHYSICS` capability
    fn colliders(&self, scene: &Scene) -> Vec<BoundingArea> {
        let _ = scene;
        Vec::new()
    }

    /// Called after the component has been removed from its scene
    fn on_removed(&mut self, scene: &mut Scene) {
        let _ = scene;
    }
}

impl dyn Component {
    /// Downcast a shared component reference to a concrete type
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref()
    }

    /// Downcast a mutable component reference to a concrete type
    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        (self as &mut dyn Any).downcast_mut()
    }
}

/// Engine-owned state for an attached component.
///
/// Enablement, ordering keys, and visibility live here rather than in
/// the behavior so they remain readable and writable while the behavior
/// itself is checked out during an update or render callback.
pub struct ComponentSlot {
    pub(super) entity: EntityKey,
    pub(super) enabled: bool,
    pub(super) visible: bool,
    pub(super) update_order: i32,
    pub(super) render_order: i32,
    pub(super) capabilities: Capabilities,
    pub(super) initialized: bool,
    /// Taken out while the behavior's own callback runs
    pub(super) behavior: Option<Box<dyn Component>>,
}

impl ComponentSlot {
    pub(super) fn new(entity: EntityKey, behavior: Box<dyn Component>) -> Self {
        let capabilities = behavior.capabilities();
        Self {
            entity,
            enabled: true,
            visible: true,
            update_order: 0,
            render_order: 0,
            capabilities,
            initialized: false,
            behavior: Some(behavior),
        }
    }

    /// The owning entity
    pub fn entity(&self) -> EntityKey {
        self.entity
    }

    /// The component's local enabled flag; the owner's flag is ANDed in
    /// by [`Scene::is_component_enabled`]
    pub fn is_locally_enabled(&self) -> bool {
        self.enabled
    }

    /// Visibility flag consulted by the renderable view
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Sort key for the update pass
    pub fn update_order(&self) -> i32 {
        self.update_order
    }

    /// Sort key for the render pass
    pub fn render_order(&self) -> i32 {
        self.render_order
    }

    /// Capability roles cached at attach time
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Shared access to the behavior, unless it is currently checked out
    pub fn behavior(&self) -> Option<&dyn Component> {
        self.behavior.as_deref()
    }

    /// Mutable access to the behavior, unless it is currently checked out
    pub fn behavior_mut(&mut self) -> Option<&mut (dyn Component + 'static)> {
        self.behavior.as_deref_mut()
    }
}
