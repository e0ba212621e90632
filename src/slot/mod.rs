//! Display-slot binding and animation state.
//!
//! - [`mixer`] - Clip action bookkeeping with cross-fades
//! - [`binder`] - Per-slot state machine and the attach gate
//! - [`stage`] - The fixed row of five slots

pub mod binder;
pub mod mixer;
pub mod stage;

pub use binder::{AnimationOption, OptionSource, Slot};
pub use mixer::{AnimationMixer, ClipAction, CROSS_FADE_SECONDS};
pub use stage::{Stage, SLOT_COUNT};
