//! Scene graph management
//!
//! A [`Scene`] owns the entity tree (the scene root is itself an
//! entity), every attached component, the per-category live views the
//! frame passes iterate, a deferred-mutation queue, and a memoized
//! dependency cache. The host drives it through `initialize`, then
//! `update` and `render` once per frame in that order.

pub mod component;
pub mod components;
pub mod entity;
pub mod observer;
pub mod system;

pub use component::{
    CameraView, Capabilities, Component, ComponentContext, ComponentKey, ComponentSlot,
};
pub use entity::{Entity, EntityKey, Layers};
pub use observer::{ObserverId, SceneEvent, SceneObserver};
pub use system::System;

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};

use slotmap::{Key, SlotMap};
use thiserror::Error;

use crate::foundation::collections::FilterSortCollection;
use crate::foundation::math::{transform_point, Mat3, Transform, Vec2};
use crate::foundation::time::FrameTime;
use crate::game::{GameContext, Viewport};
use crate::input::InputState;
use crate::render::{Color, DrawSurface, SamplerMode};
use crate::spatial::{BoundingArea, QuadTree};

/// Errors surfaced for scene misuse that indicates a programming bug
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    /// `update`/`render` was called before the scene was initialized
    #[error("scene has not been initialized; load it into a game first")]
    NotInitialized,
}

/// Initialization state of a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SceneState {
    Uninitialized,
    Initializing,
    Initialized,
}

/// Structural mutation postponed until the next queue drain
type PendingAction = Box<dyn FnOnce(&mut Scene)>;

/// Root container for one world of entities, components, and systems.
///
/// Structural mutations (adds, removals, initialization) requested after
/// the scene has initialized are deferred through [`Scene::invoke`] and
/// become visible to iterating passes only at the next queue drain,
/// which happens right after initialization and at the end of every
/// update. Local field mutations (position, enablement, ordering) apply
/// synchronously; they are not structural.
pub struct Scene {
    state: SceneState,
    context: GameContext,
    background_color: Color,
    entities: SlotMap<EntityKey, Entity>,
    root: EntityKey,
    components: SlotMap<ComponentKey, ComponentSlot>,
    systems: Vec<Option<Box<dyn System>>>,
    cameras: FilterSortCollection<ComponentKey>,
    renderables: FilterSortCollection<ComponentKey>,
    updateables: FilterSortCollection<ComponentKey>,
    physics_bodies: FilterSortCollection<ComponentKey>,
    pending: Vec<PendingAction>,
    dependencies: HashMap<TypeId, Box<dyn Any>>,
    observers: Vec<(ObserverId, Box<dyn SceneObserver>)>,
    next_observer: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create an empty, uninitialized scene
    pub fn new() -> Self {
        let mut entities = SlotMap::with_key();
        let root = entities.insert(Entity::new("scene", None));
        Self {
            state: SceneState::Uninitialized,
            context: GameContext::default(),
            background_color: Color::BLACK,
            entities,
            root,
            components: SlotMap::with_key(),
            systems: Vec::new(),
            cameras: FilterSortCollection::new(),
            renderables: FilterSortCollection::new(),
            updateables: FilterSortCollection::new(),
            physics_bodies: FilterSortCollection::new(),
            pending: Vec::new(),
            dependencies: HashMap::new(),
            observers: Vec::new(),
            next_observer: 0,
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Initialize the scene for a host game.
    ///
    /// Walks the entity tree depth-first, parent before child (entity,
    /// then its components, then its children), then initializes every
    /// registered system, then drains the deferred queue once. Calling
    /// this on an already-initializing or initialized scene is a no-op.
    pub fn initialize(&mut self, context: &GameContext) {
        if self.state != SceneState::Uninitialized {
            return;
        }
        log::info!(
            "Initializing scene: {} entities, {} components, {} systems",
            self.entities.len(),
            self.components.len(),
            self.systems.len()
        );
        self.state = SceneState::Initializing;
        self.context = context.clone();

        self.initialize_subtree(self.root);

        for index in 0..self.systems.len() {
            let Some(mut system) = self.systems[index].take() else {
                continue;
            };
            system.initialize(self);
            if let Some(slot) = self.systems.get_mut(index) {
                *slot = Some(system);
            }
        }

        self.state = SceneState::Initialized;
        self.drain_pending();
    }

    /// Whether the scene has completed initialization
    pub fn is_initialized(&self) -> bool {
        self.state == SceneState::Initialized
    }

    /// Advance the scene by one frame: systems first, then updateable
    /// components in ascending update order, then a deferred-queue
    /// drain.
    pub fn update(&mut self, frame: &FrameTime, input: &InputState) -> Result<(), SceneError> {
        if self.state != SceneState::Initialized {
            return Err(SceneError::NotInitialized);
        }

        for index in 0..self.systems.len() {
            let Some(mut system) = self.systems[index].take() else {
                continue;
            };
            system.update(frame, input, self);
            if let Some(slot) = self.systems.get_mut(index) {
                *slot = Some(system);
            }
        }

        // Snapshot the view so reentrant mutations cannot disturb the
        // iteration; members that dropped out mid-frame are skipped.
        let order: Vec<ComponentKey> = self.updateables.iter().collect();
        for key in order {
            if !self.updateables.contains(key) {
                continue;
            }
            let Some(mut behavior) = self.components.get_mut(key).and_then(|s| s.behavior.take())
            else {
                continue;
            };
            behavior.update(frame, input, self);
            if let Some(slot) = self.components.get_mut(key) {
                slot.behavior = Some(behavior);
            }
        }

        self.drain_pending();
        Ok(())
    }

    /// Render the scene: rebuild the spatial index from the current
    /// renderable set once, then run one culled draw pass per camera in
    /// ascending render order.
    pub fn render(
        &mut self,
        frame: &FrameTime,
        surface: &mut dyn DrawSurface,
    ) -> Result<(), SceneError> {
        if self.state != SceneState::Initialized {
            return Err(SceneError::NotInitialized);
        }

        surface.clear(self.background_color);

        let renderable_keys: Vec<ComponentKey> = self.renderables.iter().collect();
        let mut items: Vec<(ComponentKey, BoundingArea)> =
            Vec::with_capacity(renderable_keys.len());
        for key in &renderable_keys {
            let Some(behavior) = self.components.get(*key).and_then(|s| s.behavior.as_deref())
            else {
                continue;
            };
            items.push((*key, behavior.bounding_area(self)));
        }

        // One index per frame, shared by every camera.
        let world_bounds = items
            .iter()
            .map(|(_, bounds)| *bounds)
            .reduce(|a, b| a.combine(&b))
            .unwrap_or_default();
        let mut index = QuadTree::new(world_bounds, self.context.quad_tree);
        for (key, bounds) in items {
            index.insert(key, bounds);
        }

        let camera_keys: Vec<ComponentKey> = self.cameras.iter().collect();
        for camera_key in camera_keys {
            let Some(view) = self
                .components
                .get(camera_key)
                .and_then(|s| s.behavior.as_deref())
                .and_then(|b| b.camera_view(self))
            else {
                continue;
            };

            let candidates: HashSet<ComponentKey> =
                index.query(&view.bounds).into_iter().collect();
            if candidates.is_empty() {
                continue;
            }

            surface.begin_pass(&view.view_matrix, SamplerMode::default(), None);
            // Walk the sorted view rather than the candidate set so
            // render order (and its insertion-order tie break) holds.
            for key in &renderable_keys {
                if !candidates.contains(key) {
                    continue;
                }
                let masked = self
                    .components
                    .get(*key)
                    .and_then(|slot| self.entities.get(slot.entity))
                    .is_some_and(|entity| entity.layers.intersects(view.render_mask));
                if !masked {
                    continue;
                }
                let Some(mut behavior) =
                    self.components.get_mut(*key).and_then(|s| s.behavior.take())
                else {
                    continue;
                };
                behavior.render(frame, &view.bounds, surface, self);
                if let Some(slot) = self.components.get_mut(*key) {
                    slot.behavior = Some(behavior);
                }
            }
            surface.end_pass();
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // Deferred mutation queue
    // ------------------------------------------------------------------

    /// Queue a structural mutation for the next drain.
    ///
    /// The queue drains as a snapshot: actions enqueued while a drain is
    /// running execute at the following drain, not the current one.
    pub fn invoke(&mut self, action: impl FnOnce(&mut Scene) + 'static) {
        self.pending.push(Box::new(action));
    }

    /// Number of actions currently queued
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn drain_pending(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        for action in pending {
            action(self);
        }
    }

    // ------------------------------------------------------------------
    // Entity tree
    // ------------------------------------------------------------------

    /// The scene's root entity
    pub fn root(&self) -> EntityKey {
        self.root
    }

    /// Look up an entity record
    pub fn entity(&self, key: EntityKey) -> Option<&Entity> {
        self.entities.get(key)
    }

    /// Find the first entity with the given name, in depth-first order
    pub fn find_entity(&self, name: &str) -> Option<EntityKey> {
        let mut stack = vec![self.root];
        while let Some(key) = stack.pop() {
            if let Some(entity) = self.entities.get(key) {
                if entity.name == name {
                    return Some(key);
                }
                stack.extend(entity.children.iter().rev().copied());
            }
        }
        None
    }

    /// Create a new entity under the scene root
    pub fn spawn(&mut self, name: impl Into<String>) -> EntityKey {
        self.spawn_child(self.root, name)
    }

    /// Create a new entity under the given parent.
    ///
    /// Returns the null key if the parent does not exist. The entity's
    /// components become visible to frame passes only after the next
    /// queue drain on an initialized scene.
    pub fn spawn_child(&mut self, parent: EntityKey, name: impl Into<String>) -> EntityKey {
        if !self.entities.contains_key(parent) {
            return EntityKey::null();
        }
        let key = self.entities.insert(Entity::new(name, Some(parent)));
        if let Some(parent) = self.entities.get_mut(parent) {
            parent.children.push(key);
        }
        self.notify(SceneEvent::EntityAdded(key));
        key
    }

    /// Move an entity under a new parent, keeping its local transform.
    ///
    /// Rejected silently (returns `false`) when either key is dead, the
    /// entity is the root or the parent itself, it is already a direct
    /// child, or the move would create a cycle (the entity is an
    /// ancestor of the new parent).
    pub fn reparent(&mut self, entity: EntityKey, new_parent: EntityKey) -> bool {
        if entity == new_parent || entity == self.root {
            return false;
        }
        if !self.entities.contains_key(entity) || !self.entities.contains_key(new_parent) {
            return false;
        }
        if self.entities[new_parent].children.contains(&entity) {
            return false;
        }

        // Walking the candidate parent's ancestor chain both finds
        // cycles and proves the chain is alive.
        let mut cursor = self.entities[new_parent].parent;
        while let Some(ancestor) = cursor {
            if ancestor == entity {
                return false;
            }
            cursor = self.entities.get(ancestor).and_then(Entity::parent);
        }

        if let Some(old_parent) = self.entities[entity].parent {
            if let Some(old) = self.entities.get_mut(old_parent) {
                old.children.retain(|child| *child != entity);
            }
        }
        if let Some(parent) = self.entities.get_mut(new_parent) {
            parent.children.push(entity);
        }
        if let Some(record) = self.entities.get_mut(entity) {
            record.parent = Some(new_parent);
        }
        self.invalidate_world(entity);
        self.notify(SceneEvent::EntityReparented(entity));
        true
    }

    /// Remove an entity and its whole subtree.
    ///
    /// On an initialized scene the removal is deferred to the next queue
    /// drain. The root cannot be removed. Returns whether the request
    /// was accepted.
    pub fn remove_entity(&mut self, key: EntityKey) -> bool {
        if key == self.root || !self.entities.contains_key(key) {
            return false;
        }
        if self.state == SceneState::Uninitialized {
            self.remove_entity_now(key);
        } else {
            self.invoke(move |scene| scene.remove_entity_now(key));
        }
        true
    }

    fn remove_entity_now(&mut self, key: EntityKey) {
        if key == self.root {
            return;
        }
        let Some(entity) = self.entities.get(key) else {
            return;
        };
        let children = entity.children.clone();
        let components = entity.components.clone();

        for component in components {
            self.remove_component_now(component);
        }
        for child in children {
            self.remove_entity_now(child);
        }

        if let Some(record) = self.entities.remove(key) {
            if let Some(parent) = record.parent.and_then(|p| self.entities.get_mut(p)) {
                parent.children.retain(|child| *child != key);
            }
        }
        self.notify(SceneEvent::EntityRemoved(key));
    }

    fn initialize_subtree(&mut self, key: EntityKey) {
        let Some(entity) = self.entities.get(key) else {
            return;
        };
        let components = entity.components.clone();
        let children = entity.children.clone();

        for component in components {
            self.initialize_component(component);
        }
        for child in children {
            self.initialize_subtree(child);
        }
    }

    // ------------------------------------------------------------------
    // Entity transforms
    // ------------------------------------------------------------------

    /// World matrix for an entity, recomputed lazily.
    ///
    /// Only dirty entries are recomputed; an ancestor move invalidates
    /// the whole subtree's caches but no matrix is rebuilt until read.
    pub fn world_matrix(&self, key: EntityKey) -> Mat3 {
        let Some(entity) = self.entities.get(key) else {
            return Mat3::identity();
        };
        if let Some(cached) = entity.world_cache.get() {
            return cached;
        }
        let parent_matrix = entity
            .parent
            .map_or_else(Mat3::identity, |parent| self.world_matrix(parent));
        let matrix =
            parent_matrix * Transform::new(entity.local_position, entity.local_scale).to_matrix();
        entity.world_cache.set(Some(matrix));
        matrix
    }

    /// World transform for an entity (position and scale; rotation is
    /// not tracked at the entity level)
    pub fn world_transform(&self, key: EntityKey) -> Transform {
        Transform::from_matrix_without_rotation(&self.world_matrix(key))
    }

    /// Set an entity's position relative to its parent
    pub fn set_local_position(&mut self, key: EntityKey, position: Vec2) {
        let Some(entity) = self.entities.get_mut(key) else {
            return;
        };
        if entity.local_position == position {
            return;
        }
        entity.local_position = position;
        self.invalidate_world(key);
        self.notify(SceneEvent::TransformChanged(key));
    }

    /// Set an entity's scale relative to its parent
    pub fn set_local_scale(&mut self, key: EntityKey, scale: Vec2) {
        let Some(entity) = self.entities.get_mut(key) else {
            return;
        };
        if entity.local_scale == scale {
            return;
        }
        entity.local_scale = scale;
        self.invalidate_world(key);
        self.notify(SceneEvent::TransformChanged(key));
    }

    /// Place an entity at a world position by computing the equivalent
    /// local position against the parent's world matrix
    pub fn set_world_position(&mut self, key: EntityKey, world_position: Vec2) {
        let Some(local) = self.world_to_local(key, world_position) else {
            return;
        };
        self.set_local_position(key, local);
    }

    /// Give an entity a world scale by dividing out the parent's world
    /// scale
    pub fn set_world_scale(&mut self, key: EntityKey, world_scale: Vec2) {
        let Some(local) = self.world_scale_to_local(key, world_scale) else {
            return;
        };
        self.set_local_scale(key, local);
    }

    /// Assign a world position and scale in one coalesced change
    pub fn set_world_transform(&mut self, key: EntityKey, transform: &Transform) {
        let Some(local_position) = self.world_to_local(key, transform.position) else {
            return;
        };
        let Some(local_scale) = self.world_scale_to_local(key, transform.scale) else {
            return;
        };
        let Some(entity) = self.entities.get_mut(key) else {
            return;
        };
        if entity.local_position == local_position && entity.local_scale == local_scale {
            return;
        }
        entity.local_position = local_position;
        entity.local_scale = local_scale;
        self.invalidate_world(key);
        self.notify(SceneEvent::TransformChanged(key));
    }

    fn world_to_local(&self, key: EntityKey, world_position: Vec2) -> Option<Vec2> {
        let entity = self.entities.get(key)?;
        let parent_matrix = entity
            .parent
            .map_or_else(Mat3::identity, |parent| self.world_matrix(parent));
        let inverse = parent_matrix.try_inverse().unwrap_or_else(Mat3::identity);
        Some(transform_point(&inverse, world_position))
    }

    fn world_scale_to_local(&self, key: EntityKey, world_scale: Vec2) -> Option<Vec2> {
        let entity = self.entities.get(key)?;
        let parent_scale = entity.parent.map_or_else(
            || Vec2::new(1.0, 1.0),
            |parent| {
                Transform::from_matrix_without_rotation(&self.world_matrix(parent)).scale
            },
        );
        let divide = |world: f32, parent: f32| {
            if parent.abs() <= f32::EPSILON {
                world
            } else {
                world / parent
            }
        };
        Some(Vec2::new(
            divide(world_scale.x, parent_scale.x),
            divide(world_scale.y, parent_scale.y),
        ))
    }

    /// Drop cached world matrices for an entity and all descendants
    fn invalidate_world(&self, key: EntityKey) {
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            if let Some(entity) = self.entities.get(current) {
                entity.world_cache.set(None);
                stack.extend_from_slice(&entity.children);
            }
        }
    }

    // ------------------------------------------------------------------
    // Entity fields
    // ------------------------------------------------------------------

    /// Rename an entity
    pub fn set_name(&mut self, key: EntityKey, name: impl Into<String>) {
        if let Some(entity) = self.entities.get_mut(key) {
            entity.name = name.into();
        }
    }

    /// Change an entity's layer bitmask
    pub fn set_layers(&mut self, key: EntityKey, layers: Layers) {
        if let Some(entity) = self.entities.get_mut(key) {
            entity.layers = layers;
        }
    }

    /// Flip an entity's local enabled flag.
    ///
    /// Every component attached to this entity receives one coalesced
    /// effective-enablement change in the views it participates in.
    pub fn set_entity_enabled(&mut self, key: EntityKey, enabled: bool) {
        let Some(entity) = self.entities.get_mut(key) else {
            return;
        };
        if entity.enabled == enabled {
            return;
        }
        entity.enabled = enabled;
        let components = entity.components.clone();
        for component in components {
            self.refresh_component_views(component);
        }
        self.notify(SceneEvent::EntityEnabledChanged(key));
    }

    // ------------------------------------------------------------------
    // Components
    // ------------------------------------------------------------------

    /// Look up a component slot
    pub fn component(&self, key: ComponentKey) -> Option<&ComponentSlot> {
        self.components.get(key)
    }

    /// Shared access to a component behavior as its concrete type
    pub fn component_behavior<T: Component>(&self, key: ComponentKey) -> Option<&T> {
        self.components
            .get(key)?
            .behavior()
            .and_then(<dyn Component>::downcast_ref)
    }

    /// Mutable access to a component behavior as its concrete type
    pub fn component_behavior_mut<T: Component>(&mut self, key: ComponentKey) -> Option<&mut T> {
        self.components
            .get_mut(key)?
            .behavior_mut()
            .and_then(<dyn Component>::downcast_mut)
    }

    /// Attach a behavior to an entity.
    ///
    /// Capabilities are resolved once here and cached. Returns the null
    /// key if the entity does not exist. On an initialized scene the
    /// component's initialization and view registration are deferred to
    /// the next queue drain; callers must not assume it is live yet.
    pub fn add_component(
        &mut self,
        entity: EntityKey,
        behavior: Box<dyn Component>,
    ) -> ComponentKey {
        if !self.entities.contains_key(entity) {
            return ComponentKey::null();
        }
        let key = self.components.insert(ComponentSlot::new(entity, behavior));
        if let Some(record) = self.entities.get_mut(entity) {
            record.components.push(key);
        }
        if self.state != SceneState::Uninitialized {
            self.invoke(move |scene| scene.initialize_component(key));
        }
        self.notify(SceneEvent::ComponentAdded(key));
        key
    }

    /// Move a component to a different owning entity.
    ///
    /// The component is detached from its previous owner first; its
    /// effective enablement is re-evaluated against the new owner.
    pub fn reassign_component(&mut self, key: ComponentKey, new_entity: EntityKey) -> bool {
        if !self.entities.contains_key(new_entity) {
            return false;
        }
        let Some(slot) = self.components.get(key) else {
            return false;
        };
        let old_entity = slot.entity;
        if old_entity == new_entity {
            return false;
        }
        if let Some(old) = self.entities.get_mut(old_entity) {
            old.components.retain(|component| *component != key);
        }
        if let Some(record) = self.entities.get_mut(new_entity) {
            record.components.push(key);
        }
        if let Some(slot) = self.components.get_mut(key) {
            slot.entity = new_entity;
        }
        self.refresh_component_views(key);
        self.notify(SceneEvent::ComponentReassigned(key));
        true
    }

    /// Detach and drop a component.
    ///
    /// Deferred on an initialized scene; idempotent once the slot is
    /// gone. Returns whether the request was accepted.
    pub fn remove_component(&mut self, key: ComponentKey) -> bool {
        if !self.components.contains_key(key) {
            return false;
        }
        if self.state == SceneState::Uninitialized {
            self.remove_component_now(key);
        } else {
            self.invoke(move |scene| scene.remove_component_now(key));
        }
        true
    }

    fn remove_component_now(&mut self, key: ComponentKey) {
        let Some(mut slot) = self.components.remove(key) else {
            return;
        };
        self.cameras.remove(key);
        self.renderables.remove(key);
        self.updateables.remove(key);
        self.physics_bodies.remove(key);
        if let Some(entity) = self.entities.get_mut(slot.entity) {
            entity.components.retain(|component| *component != key);
        }
        if let Some(mut behavior) = slot.behavior.take() {
            behavior.on_removed(self);
        }
        self.notify(SceneEvent::ComponentRemoved(key));
    }

    fn initialize_component(&mut self, key: ComponentKey) {
        let Some(slot) = self.components.get_mut(key) else {
            return;
        };
        if slot.initialized {
            return;
        }
        slot.initialized = true;
        let entity = slot.entity;
        let Some(mut behavior) = slot.behavior.take() else {
            return;
        };
        behavior.initialize(
            ComponentContext {
                entity,
                component: key,
            },
            self,
        );
        if let Some(slot) = self.components.get_mut(key) {
            slot.behavior = Some(behavior);
        }
        self.register_component_in_views(key);
    }

    /// Effective enablement: the component's local flag ANDed with its
    /// direct owner's flag. Deeper ancestors are not consulted.
    pub fn is_component_enabled(&self, key: ComponentKey) -> bool {
        let Some(slot) = self.components.get(key) else {
            return false;
        };
        slot.enabled
            && self
                .entities
                .get(slot.entity)
                .is_some_and(Entity::is_enabled)
    }

    /// Flip a component's local enabled flag; the owning entity's flag
    /// is unchanged
    pub fn set_component_enabled(&mut self, key: ComponentKey, enabled: bool) {
        let Some(slot) = self.components.get_mut(key) else {
            return;
        };
        if slot.enabled == enabled {
            return;
        }
        slot.enabled = enabled;
        self.refresh_component_views(key);
        self.notify(SceneEvent::ComponentEnabledChanged(key));
    }

    /// Flip a renderable component's visibility flag
    pub fn set_component_visible(&mut self, key: ComponentKey, visible: bool) {
        let Some(slot) = self.components.get_mut(key) else {
            return;
        };
        if slot.visible == visible {
            return;
        }
        slot.visible = visible;
        self.refresh_component_views(key);
        self.notify(SceneEvent::ComponentEnabledChanged(key));
    }

    /// Change a component's update-pass sort key
    pub fn set_update_order(&mut self, key: ComponentKey, order: i32) {
        let Some(slot) = self.components.get_mut(key) else {
            return;
        };
        if slot.update_order == order {
            return;
        }
        slot.update_order = order;
        self.refresh_component_views(key);
        self.notify(SceneEvent::ComponentOrderChanged(key));
    }

    /// Change a component's render-pass sort key
    pub fn set_render_order(&mut self, key: ComponentKey, order: i32) {
        let Some(slot) = self.components.get_mut(key) else {
            return;
        };
        if slot.render_order == order {
            return;
        }
        slot.render_order = order;
        self.refresh_component_views(key);
        self.notify(SceneEvent::ComponentOrderChanged(key));
    }

    fn register_component_in_views(&mut self, key: ComponentKey) {
        let Some(slot) = self.components.get(key) else {
            return;
        };
        let capabilities = slot.capabilities;
        let (update_order, render_order, visible) =
            (slot.update_order, slot.render_order, slot.visible);
        let enabled = self.is_component_enabled(key);

        if capabilities.contains(Capabilities::UPDATE) {
            self.updateables.add(key, enabled, update_order);
        }
        if capabilities.contains(Capabilities::RENDER) {
            self.renderables.add(key, enabled && visible, render_order);
        }
        if capabilities.contains(Capabilities::CAMERA) {
            self.cameras.add(key, enabled, render_order);
        }
        if capabilities.contains(Capabilities::PHYSICS) {
            self.physics_bodies.add(key, enabled, update_order);
        }
    }

    /// Deliver one coalesced change to every view tracking this
    /// component
    fn refresh_component_views(&mut self, key: ComponentKey) {
        let Some(slot) = self.components.get(key) else {
            return;
        };
        let capabilities = slot.capabilities;
        let (update_order, render_order, visible) =
            (slot.update_order, slot.render_order, slot.visible);
        let enabled = self.is_component_enabled(key);

        if capabilities.contains(Capabilities::UPDATE) {
            self.updateables.update(key, enabled, update_order);
        }
        if capabilities.contains(Capabilities::RENDER) {
            self.renderables.update(key, enabled && visible, render_order);
        }
        if capabilities.contains(Capabilities::CAMERA) {
            self.cameras.update(key, enabled, render_order);
        }
        if capabilities.contains(Capabilities::PHYSICS) {
            self.physics_bodies.update(key, enabled, update_order);
        }
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// Cameras passing their filter, ascending render order
    pub fn cameras(&self) -> &FilterSortCollection<ComponentKey> {
        &self.cameras
    }

    /// Renderables passing their filter, ascending render order
    pub fn renderables(&self) -> &FilterSortCollection<ComponentKey> {
        &self.renderables
    }

    /// Updateables passing their filter, ascending update order
    pub fn updateables(&self) -> &FilterSortCollection<ComponentKey> {
        &self.updateables
    }

    /// Physics bodies passing their filter, ascending update order
    pub fn physics_bodies(&self) -> &FilterSortCollection<ComponentKey> {
        &self.physics_bodies
    }

    // ------------------------------------------------------------------
    // Systems
    // ------------------------------------------------------------------

    /// Register a cross-cutting system.
    ///
    /// On an initialized scene the system is installed and initialized
    /// at the next queue drain.
    pub fn add_system(&mut self, system: Box<dyn System>) {
        if self.state == SceneState::Uninitialized {
            self.systems.push(Some(system));
        } else {
            self.invoke(move |scene| scene.install_system(system));
        }
    }

    fn install_system(&mut self, mut system: Box<dyn System>) {
        system.initialize(self);
        self.systems.push(Some(system));
    }

    /// Remove every system of the given concrete type, deferred on an
    /// initialized scene
    pub fn remove_system<T: System>(&mut self) {
        if self.state == SceneState::Uninitialized {
            self.remove_system_now::<T>();
        } else {
            self.invoke(Scene::remove_system_now::<T>);
        }
    }

    fn remove_system_now<T: System>(&mut self) {
        self.systems.retain(|slot| {
            slot.as_ref()
                .is_some_and(|system| !(system.as_ref() as &dyn Any).is::<T>())
        });
    }

    /// Find a registered system by concrete type
    pub fn system<T: System>(&self) -> Option<&T> {
        self.systems.iter().find_map(|slot| {
            slot.as_deref().and_then(<dyn System>::downcast_ref)
        })
    }

    // ------------------------------------------------------------------
    // Dependency resolution
    // ------------------------------------------------------------------

    /// Resolve a shared helper, default-constructing it on first use.
    ///
    /// One instance exists per type per scene; later calls return the
    /// cached instance regardless of which resolve overload created it.
    pub fn resolve_dependency<T: Any + Default>(&mut self) -> &mut T {
        self.resolve_dependency_with(T::default)
    }

    /// Resolve a shared helper, constructing it with `factory` on first
    /// use
    pub fn resolve_dependency_with<T: Any>(&mut self, factory: impl FnOnce() -> T) -> &mut T {
        let entry = self
            .dependencies
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(factory()));
        // The map is keyed by TypeId, so the downcast cannot fail.
        entry
            .downcast_mut()
            .expect("dependency cache entry matches its TypeId")
    }

    /// Probe the dependency cache without constructing anything
    pub fn try_resolve<T: Any>(&self) -> Option<&T> {
        self.dependencies
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.downcast_ref())
    }

    // ------------------------------------------------------------------
    // Observers and host state
    // ------------------------------------------------------------------

    /// Subscribe an observer to scene change notifications
    pub fn subscribe(&mut self, observer: Box<dyn SceneObserver>) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, observer));
        id
    }

    /// Unsubscribe a previously subscribed observer
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer_id, _)| *observer_id != id);
        self.observers.len() != before
    }

    fn notify(&mut self, event: SceneEvent) {
        for (_, observer) in &mut self.observers {
            observer.on_event(&event);
        }
    }

    /// Viewport the host is currently presenting into
    pub fn viewport(&self) -> Viewport {
        self.context.viewport
    }

    /// Update the host viewport, typically after a window resize
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.context.viewport = viewport;
    }

    /// Color the render pass clears to
    pub fn background_color(&self) -> Color {
        self.background_color
    }

    /// Change the clear color
    pub fn set_background_color(&mut self, color: Color) {
        self.background_color = color;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::NullSurface;
    use approx::assert_relative_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    type CallLog = Rc<RefCell<Vec<&'static str>>>;

    /// Renderable that records every render call under a tag
    struct Sprite {
        tag: &'static str,
        size: Vec2,
        context: ComponentContext,
        log: CallLog,
    }

    impl Sprite {
        fn new(tag: &'static str, log: &CallLog) -> Self {
            Self {
                tag,
                size: Vec2::new(1.0, 1.0),
                context: ComponentContext::default(),
                log: Rc::clone(log),
            }
        }
    }

    impl Component for Sprite {
        fn capabilities(&self) -> Capabilities {
            Capabilities::RENDER
        }

        fn initialize(&mut self, context: ComponentContext, _scene: &mut Scene) {
            self.context = context;
        }

        fn bounding_area(&self, scene: &Scene) -> BoundingArea {
            let world = scene.world_transform(self.context.entity);
            BoundingArea::from_center_size(world.position, self.size)
        }

        fn render(
            &mut self,
            _frame: &FrameTime,
            _view: &BoundingArea,
            _surface: &mut dyn DrawSurface,
            _scene: &Scene,
        ) {
            self.log.borrow_mut().push(self.tag);
        }
    }

    /// Updateable that records every update call under a tag
    struct Ticker {
        tag: &'static str,
        log: CallLog,
    }

    impl Component for Ticker {
        fn capabilities(&self) -> Capabilities {
            Capabilities::UPDATE
        }

        fn update(&mut self, _frame: &FrameTime, _input: &InputState, _scene: &mut Scene) {
            self.log.borrow_mut().push(self.tag);
        }
    }

    /// Updateable that spawns a fresh entity with a [`Ticker`] on its
    /// first update
    struct Spawner {
        spawned: bool,
        log: CallLog,
    }

    impl Component for Spawner {
        fn capabilities(&self) -> Capabilities {
            Capabilities::UPDATE
        }

        fn update(&mut self, _frame: &FrameTime, _input: &InputState, scene: &mut Scene) {
            if self.spawned {
                return;
            }
            self.spawned = true;
            let hatchling = scene.spawn("hatchling");
            scene.add_component(
                hatchling,
                Box::new(Ticker {
                    tag: "hatchling",
                    log: Rc::clone(&self.log),
                }),
            );
        }
    }

    struct EventCounter {
        events: Rc<RefCell<Vec<SceneEvent>>>,
    }

    impl SceneObserver for EventCounter {
        fn on_event(&mut self, event: &SceneEvent) {
            self.events.borrow_mut().push(*event);
        }
    }

    fn initialized_scene() -> Scene {
        let mut scene = Scene::new();
        scene.initialize(&GameContext::default());
        scene
    }

    fn frame() -> FrameTime {
        FrameTime::from_delta(1.0 / 60.0)
    }

    fn camera_scene(mask: Layers) -> (Scene, CallLog) {
        let log: CallLog = Rc::default();
        let mut scene = Scene::new();
        let eye = scene.spawn("eye");
        scene.add_component(eye, Box::new(components::CameraComponent::new(20.0).with_render_mask(mask)));
        (scene, log)
    }

    #[test]
    fn reparenting_into_a_descendant_is_rejected() {
        let mut scene = Scene::new();
        let a = scene.spawn("a");
        let b = scene.spawn("b");
        assert!(scene.reparent(b, a));
        assert!(!scene.reparent(a, b));
        assert_eq!(scene.entity(a).and_then(Entity::parent), Some(scene.root()));
        assert_eq!(scene.entity(b).and_then(Entity::parent), Some(a));
    }

    #[test]
    fn reparent_rejects_self_root_and_dead_keys() {
        let mut scene = Scene::new();
        let a = scene.spawn("a");
        assert!(!scene.reparent(a, a));
        assert!(!scene.reparent(scene.root(), a));
        assert!(!scene.reparent(EntityKey::null(), a));
        assert!(!scene.reparent(a, scene.root()), "already a direct child");
    }

    #[test]
    fn reparent_keeps_local_transform_so_world_shifts() {
        let mut scene = Scene::new();
        let e = scene.spawn("e");
        let f = scene.spawn("f");
        scene.set_local_position(f, Vec2::new(5.0, 5.0));
        let child = scene.spawn_child(e, "child");
        scene.set_local_position(child, Vec2::new(10.0, 0.0));

        assert!(scene.reparent(child, f));

        let world = scene.world_transform(child);
        assert_relative_eq!(world.position.x, 15.0);
        assert_relative_eq!(world.position.y, 5.0);
        assert_relative_eq!(
            scene.entity(child).unwrap().local_position().x,
            10.0
        );
    }

    #[test]
    fn world_transform_round_trips_through_a_scaled_chain() {
        let mut scene = Scene::new();
        let parent = scene.spawn("parent");
        scene.set_local_position(parent, Vec2::new(3.0, -2.0));
        scene.set_local_scale(parent, Vec2::new(2.0, 4.0));
        let middle = scene.spawn_child(parent, "middle");
        scene.set_local_position(middle, Vec2::new(-1.0, 6.0));
        scene.set_local_scale(middle, Vec2::new(0.5, 0.25));
        let leaf = scene.spawn_child(middle, "leaf");

        scene.set_world_position(leaf, Vec2::new(7.0, 11.0));
        scene.set_world_scale(leaf, Vec2::new(3.0, 5.0));

        let world = scene.world_transform(leaf);
        assert_relative_eq!(world.position.x, 7.0, epsilon = 1e-4);
        assert_relative_eq!(world.position.y, 11.0, epsilon = 1e-4);
        assert_relative_eq!(world.scale.x, 3.0, epsilon = 1e-4);
        assert_relative_eq!(world.scale.y, 5.0, epsilon = 1e-4);
    }

    #[test]
    fn cached_world_matrix_refreshes_after_ancestor_moves() {
        let mut scene = Scene::new();
        let parent = scene.spawn("parent");
        let child = scene.spawn_child(parent, "child");
        scene.set_local_position(child, Vec2::new(1.0, 0.0));

        assert_relative_eq!(scene.world_transform(child).position.x, 1.0);

        scene.set_local_position(parent, Vec2::new(0.0, 9.0));
        let world = scene.world_transform(child);
        assert_relative_eq!(world.position.x, 1.0);
        assert_relative_eq!(world.position.y, 9.0);
    }

    #[test]
    fn effective_enablement_requires_owner_and_component() {
        let mut scene = initialized_scene();
        let log: CallLog = Rc::default();
        let entity = scene.spawn("entity");
        let ticker = scene.add_component(entity, Box::new(Ticker { tag: "tick", log: Rc::clone(&log) }));
        scene.update(&frame(), &InputState::new()).unwrap();

        assert!(scene.is_component_enabled(ticker));
        scene.set_entity_enabled(entity, false);
        assert!(!scene.is_component_enabled(ticker));
        assert!(scene.component(ticker).unwrap().is_locally_enabled());
        assert!(!scene.updateables().contains(ticker));

        scene.set_entity_enabled(entity, true);
        assert!(scene.is_component_enabled(ticker));
        assert!(scene.updateables().contains(ticker));
    }

    #[test]
    fn disabled_components_do_not_update() {
        let mut scene = initialized_scene();
        let log: CallLog = Rc::default();
        let entity = scene.spawn("entity");
        let ticker = scene.add_component(entity, Box::new(Ticker { tag: "tick", log: Rc::clone(&log) }));
        scene.update(&frame(), &InputState::new()).unwrap();
        log.borrow_mut().clear();

        scene.set_component_enabled(ticker, false);
        scene.update(&frame(), &InputState::new()).unwrap();
        assert!(log.borrow().is_empty());

        scene.set_component_enabled(ticker, true);
        scene.update(&frame(), &InputState::new()).unwrap();
        assert_eq!(*log.borrow(), vec!["tick"]);
    }

    #[test]
    fn structural_changes_from_update_apply_at_frame_end() {
        let mut scene = initialized_scene();
        let log: CallLog = Rc::default();
        let entity = scene.spawn("spawner");
        scene.add_component(entity, Box::new(Spawner { spawned: false, log: Rc::clone(&log) }));
        // Frame 1 drains the spawner's own deferred registration.
        scene.update(&frame(), &InputState::new()).unwrap();
        assert!(log.borrow().is_empty());

        // Frame 2: the spawner runs and enqueues the hatchling, which
        // registers at this frame's drain and first ticks on frame 3.
        scene.update(&frame(), &InputState::new()).unwrap();
        assert!(log.borrow().is_empty());

        scene.update(&frame(), &InputState::new()).unwrap();
        assert_eq!(*log.borrow(), vec!["hatchling"]);
    }

    #[test]
    fn update_and_render_fail_before_initialization() {
        let mut scene = Scene::new();
        assert_eq!(
            scene.update(&frame(), &InputState::new()),
            Err(SceneError::NotInitialized)
        );
        let mut surface = NullSurface;
        assert_eq!(
            scene.render(&frame(), &mut surface),
            Err(SceneError::NotInitialized)
        );
    }

    #[test]
    fn initialize_twice_is_a_no_op() {
        let mut scene = initialized_scene();
        let log: CallLog = Rc::default();
        let entity = scene.spawn("entity");
        scene.add_component(entity, Box::new(Ticker { tag: "tick", log: Rc::clone(&log) }));
        scene.initialize(&GameContext::default());
        scene.update(&frame(), &InputState::new()).unwrap();
        assert!(scene.is_initialized());
    }

    #[test]
    fn render_respects_layer_masks() {
        let (mut scene, log) = camera_scene(Layers::LAYER_01);
        let lit = scene.spawn("lit");
        scene.set_layers(lit, Layers::LAYER_01);
        scene.add_component(lit, Box::new(Sprite::new("lit", &log)));
        let dark = scene.spawn("dark");
        scene.add_component(dark, Box::new(Sprite::new("dark", &log)));
        scene.initialize(&GameContext::default());

        let mut surface = NullSurface;
        scene.render(&frame(), &mut surface).unwrap();
        assert_eq!(*log.borrow(), vec!["lit"]);
    }

    #[test]
    fn render_walks_ascending_render_order_with_stable_ties() {
        let (mut scene, log) = camera_scene(Layers::all());
        let stage = scene.spawn("stage");
        let back = scene.add_component(stage, Box::new(Sprite::new("back", &log)));
        let front = scene.add_component(stage, Box::new(Sprite::new("front", &log)));
        let tied = scene.add_component(stage, Box::new(Sprite::new("tied", &log)));
        scene.initialize(&GameContext::default());
        scene.set_render_order(back, 10);
        scene.set_render_order(front, -10);
        scene.set_render_order(tied, -10);

        let mut surface = NullSurface;
        scene.render(&frame(), &mut surface).unwrap();
        assert_eq!(*log.borrow(), vec!["front", "tied", "back"]);
    }

    #[test]
    fn render_culls_bodies_outside_the_camera_view() {
        let (mut scene, log) = camera_scene(Layers::all());
        let near = scene.spawn("near");
        scene.add_component(near, Box::new(Sprite::new("near", &log)));
        let far = scene.spawn("far");
        scene.set_local_position(far, Vec2::new(5_000.0, 5_000.0));
        scene.add_component(far, Box::new(Sprite::new("far", &log)));
        scene.initialize(&GameContext::default());

        let mut surface = NullSurface;
        scene.render(&frame(), &mut surface).unwrap();
        assert_eq!(*log.borrow(), vec!["near"]);
    }

    #[test]
    fn nonuniform_camera_scale_keeps_onscreen_sprites() {
        let log: CallLog = Rc::default();
        let mut scene = Scene::new();
        let eye = scene.spawn("eye");
        scene.set_local_scale(eye, Vec2::new(0.25, 1.0));
        scene.add_component(eye, Box::new(components::CameraComponent::new(20.0)));
        // The view matrix maps x=5 well inside the viewport, so the
        // broad phase must not cull it no matter the horizontal scale.
        let entity = scene.spawn("sprite");
        scene.set_local_position(entity, Vec2::new(5.0, 0.0));
        scene.add_component(entity, Box::new(Sprite::new("sprite", &log)));
        scene.initialize(&GameContext::default());

        let mut surface = NullSurface;
        scene.render(&frame(), &mut surface).unwrap();
        assert_eq!(*log.borrow(), vec!["sprite"]);
    }

    #[test]
    fn invisible_renderables_leave_the_render_view() {
        let (mut scene, log) = camera_scene(Layers::all());
        let entity = scene.spawn("entity");
        let sprite = scene.add_component(entity, Box::new(Sprite::new("sprite", &log)));
        scene.initialize(&GameContext::default());

        scene.set_component_visible(sprite, false);
        assert!(!scene.renderables().contains(sprite));
        let mut surface = NullSurface;
        scene.render(&frame(), &mut surface).unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn component_removal_is_deferred_and_idempotent() {
        let mut scene = initialized_scene();
        let log: CallLog = Rc::default();
        let entity = scene.spawn("entity");
        let ticker = scene.add_component(entity, Box::new(Ticker { tag: "tick", log: Rc::clone(&log) }));
        scene.update(&frame(), &InputState::new()).unwrap();

        assert!(scene.remove_component(ticker));
        assert!(scene.component(ticker).is_some(), "removal waits for the drain");
        scene.update(&frame(), &InputState::new()).unwrap();
        assert!(scene.component(ticker).is_none());
        assert!(!scene.remove_component(ticker));
    }

    #[test]
    fn removing_an_entity_takes_its_subtree_and_components() {
        let mut scene = Scene::new();
        let log: CallLog = Rc::default();
        let parent = scene.spawn("parent");
        let child = scene.spawn_child(parent, "child");
        let ticker = scene.add_component(child, Box::new(Ticker { tag: "tick", log: Rc::clone(&log) }));

        assert!(scene.remove_entity(parent));
        assert!(scene.entity(parent).is_none());
        assert!(scene.entity(child).is_none());
        assert!(scene.component(ticker).is_none());
        assert!(!scene.remove_entity(scene.root()));
    }

    #[test]
    fn reassign_component_reevaluates_owner_enablement() {
        let mut scene = initialized_scene();
        let log: CallLog = Rc::default();
        let sleeping = scene.spawn("sleeping");
        scene.set_entity_enabled(sleeping, false);
        let awake = scene.spawn("awake");
        let ticker = scene.add_component(awake, Box::new(Ticker { tag: "tick", log: Rc::clone(&log) }));
        scene.update(&frame(), &InputState::new()).unwrap();
        assert!(scene.updateables().contains(ticker));

        let events = Rc::new(RefCell::new(Vec::new()));
        scene.subscribe(Box::new(EventCounter { events: Rc::clone(&events) }));

        assert!(scene.reassign_component(ticker, sleeping));
        assert!(!scene.updateables().contains(ticker));
        assert_eq!(scene.component(ticker).unwrap().entity(), sleeping);
        assert!(!scene.entity(awake).unwrap().components().contains(&ticker));
        // Observers see a move, not a fresh attach.
        assert_eq!(*events.borrow(), vec![SceneEvent::ComponentReassigned(ticker)]);
    }

    #[test]
    fn dependency_cache_memoizes_one_instance_per_type() {
        let mut scene = Scene::new();
        assert!(scene.try_resolve::<Vec<u32>>().is_none());
        scene.resolve_dependency_with(|| vec![1u32, 2, 3]).push(4);
        assert_eq!(scene.resolve_dependency::<Vec<u32>>(), &vec![1, 2, 3, 4]);
        assert_eq!(scene.try_resolve::<Vec<u32>>(), Some(&vec![1, 2, 3, 4]));
    }

    #[test]
    fn observers_hear_structural_events_until_unsubscribed() {
        let mut scene = Scene::new();
        let events = Rc::new(RefCell::new(Vec::new()));
        let id = scene.subscribe(Box::new(EventCounter { events: Rc::clone(&events) }));

        let entity = scene.spawn("entity");
        scene.set_local_position(entity, Vec2::new(1.0, 0.0));
        assert_eq!(
            *events.borrow(),
            vec![
                SceneEvent::EntityAdded(entity),
                SceneEvent::TransformChanged(entity)
            ]
        );

        assert!(scene.unsubscribe(id));
        scene.spawn("quiet");
        assert_eq!(events.borrow().len(), 2);
        assert!(!scene.unsubscribe(id));
    }

    #[test]
    fn find_entity_prefers_document_order() {
        let mut scene = Scene::new();
        let first = scene.spawn("twin");
        let _second = scene.spawn("twin");
        assert_eq!(scene.find_entity("twin"), Some(first));
        assert_eq!(scene.find_entity("missing"), None);
    }
}
