//! The fixed row of display slots.

use tracing::debug;

use super::binder::Slot;
use crate::pack::manifest::{Manifest, MAX_VISIBLE_SLOTS, MIN_VISIBLE_SLOTS};

/// Number of display slots. Fixed: slots are created at startup and
/// live for the whole application lifetime.
pub const SLOT_COUNT: usize = 5;

/// Owns the five slots and the visible-count presentation state.
pub struct Stage {
    slots: Vec<Slot>,
    visible_count: usize,
}

impl Stage {
    /// Create the stage with all five slots empty.
    pub fn new() -> Self {
        Self {
            slots: (0..SLOT_COUNT).map(Slot::new).collect(),
            visible_count: MIN_VISIBLE_SLOTS,
        }
    }

    /// Create the stage with the manifest's declared visible count.
    pub fn from_manifest(manifest: &Manifest) -> Self {
        let mut stage = Self::new();
        stage.set_visible_count(manifest.default_visible_count);
        stage
    }

    /// Access a slot by index.
    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    /// Mutable access to a slot by index.
    pub fn slot_mut(&mut self, index: usize) -> Option<&mut Slot> {
        self.slots.get_mut(index)
    }

    /// All slots in position order.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// How many slots are currently shown.
    pub fn visible_count(&self) -> usize {
        self.visible_count
    }

    /// Change the visible-slot count, clamped to the allowed range.
    pub fn set_visible_count(&mut self, count: usize) {
        self.visible_count = count.clamp(MIN_VISIBLE_SLOTS, MAX_VISIBLE_SLOTS);
        debug!("stage: visible count set to {}", self.visible_count);
    }

    /// Frame driver: advance every slot's mixer.
    ///
    /// Callers clamp `dt` (0.05 s is a sane ceiling) so a stall does not
    /// turn into one giant animation step.
    pub fn update_all(&mut self, dt: f32) {
        for slot in &mut self.slots {
            slot.update(dt);
        }
    }

    /// Clear every slot.
    pub fn dispose_all(&mut self) {
        for slot in &mut self.slots {
            slot.dispose();
        }
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Stage {
    fn drop(&mut self) {
        self.dispose_all();
    }
}
