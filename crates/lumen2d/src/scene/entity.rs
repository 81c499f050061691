//! Entity records for the scene's arena tree
//!
//! Entities are addressed by stable [`EntityKey`]s into a slotmap arena
//! owned by the scene; the tree is encoded as parent keys and ordered
//! child lists instead of reference-counted links, which keeps
//! "is descendant of" a plain key-chain walk.

use std::cell::Cell;

use bitflags::bitflags;
use slotmap::new_key_type;

use crate::foundation::math::{Mat3, Vec2};
use crate::scene::component::ComponentKey;

new_key_type! {
    /// Stable key addressing an entity in the scene arena
    pub struct EntityKey;
}

bitflags! {
    /// Layer bitmask carried by entities and matched against camera
    /// render masks
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Layers: u16 {
        /// No layers; never matches any camera
        const NONE = 0;
        /// Default layer every entity starts on
        const DEFAULT = 1 << 0;
        /// Free-form layer 1
        const LAYER_01 = 1 << 1;
        /// Free-form layer 2
        const LAYER_02 = 1 << 2;
        /// Free-form layer 3
        const LAYER_03 = 1 << 3;
        /// Free-form layer 4
        const LAYER_04 = 1 << 4;
        /// Free-form layer 5
        const LAYER_05 = 1 << 5;
        /// Free-form layer 6
        const LAYER_06 = 1 << 6;
        /// Free-form layer 7
        const LAYER_07 = 1 << 7;
        /// Free-form layer 8
        const LAYER_08 = 1 << 8;
    }
}

/// Node in the scene's entity tree.
///
/// Local position and scale are authoritative; the world matrix is a
/// lazily-recomputed cache. The cache lives in a `Cell` because the
/// engine is single-threaded per frame and world matrices are read from
/// shared-borrow contexts like the render pass.
#[derive(Debug)]
pub struct Entity {
    pub(super) name: String,
    pub(super) local_position: Vec2,
    pub(super) local_scale: Vec2,
    pub(super) layers: Layers,
    pub(super) enabled: bool,
    pub(super) parent: Option<EntityKey>,
    pub(super) children: Vec<EntityKey>,
    pub(super) components: Vec<ComponentKey>,
    /// `None` means dirty; recomputed on next world-matrix read
    pub(super) world_cache: Cell<Option<Mat3>>,
}

impl Entity {
    pub(super) fn new(name: impl Into<String>, parent: Option<EntityKey>) -> Self {
        Self {
            name: name.into(),
            local_position: Vec2::zeros(),
            local_scale: Vec2::new(1.0, 1.0),
            layers: Layers::DEFAULT,
            enabled: true,
            parent,
            children: Vec::new(),
            components: Vec::new(),
            world_cache: Cell::new(None),
        }
    }

    /// Entity name, for lookup and diagnostics
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position relative to the parent entity
    pub fn local_position(&self) -> Vec2 {
        self.local_position
    }

    /// Scale relative to the parent entity
    pub fn local_scale(&self) -> Vec2 {
        self.local_scale
    }

    /// Layer bitmask used for camera render masking
    pub fn layers(&self) -> Layers {
        self.layers
    }

    /// Locally stored enabled flag; ancestors are not consulted
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Parent entity, `None` for the scene root
    pub fn parent(&self) -> Option<EntityKey> {
        self.parent
    }

    /// Direct children in insertion order
    pub fn children(&self) -> &[EntityKey] {
        &self.children
    }

    /// Components attached to this entity in insertion order
    pub fn components(&self) -> &[ComponentKey] {
        &self.components
    }
}
