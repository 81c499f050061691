//! Change notification for external tooling
//!
//! Editors and debug overlays observe the scene through one explicit
//! listener interface rather than per-property events: every structural
//! or tracked-field change produces a [`SceneEvent`] delivered to all
//! subscribed observers.

use crate::scene::component::ComponentKey;
use crate::scene::entity::EntityKey;

/// A change the scene reports to its observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneEvent {
    /// An entity was added to the tree
    EntityAdded(EntityKey),
    /// An entity (and its subtree) was removed from the tree
    EntityRemoved(EntityKey),
    /// An entity was moved under a new parent
    EntityReparented(EntityKey),
    /// An entity's local transform changed
    TransformChanged(EntityKey),
    /// An entity's local enabled flag flipped
    EntityEnabledChanged(EntityKey),
    /// A component was attached
    ComponentAdded(ComponentKey),
    /// A component was removed
    ComponentRemoved(ComponentKey),
    /// A component moved to a different owning entity
    ComponentReassigned(ComponentKey),
    /// A component's local enabled or visible flag flipped
    ComponentEnabledChanged(ComponentKey),
    /// A component's update or render order changed
    ComponentOrderChanged(ComponentKey),
}

/// Listener receiving scene change notifications
pub trait SceneObserver {
    /// Called for every change the scene reports
    fn on_event(&mut self, event: &SceneEvent);
}

/// Handle identifying a subscribed observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(super) u64);
