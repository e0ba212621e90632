//! Per-slot binding state machine.
//!
//! A slot is empty or holds one bound model: a skeleton-aware clone of a
//! pack's scene, a mixer over that model's clips, and any compatible
//! clip packs attached on top. Loading a new model fully tears down the
//! previous one before the clone goes in, so no frame ever observes a
//! half-replaced slot.

use tracing::{debug, info};

use super::mixer::AnimationMixer;
use crate::pack::{Pack, PackId};
use crate::scene::SceneGraph;

/// Where an animation option came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionSource {
    /// Authored inside the bound model's own file.
    Model,
    /// Contributed by an attached clip pack.
    ClipPack,
}

/// One selectable animation of a slot.
#[derive(Debug, Clone)]
pub struct AnimationOption {
    /// Mixer action id, unique within the slot.
    pub id: String,
    /// Display label (the clip name).
    pub label: String,
    pub source: OptionSource,
    /// Pack that contributed the clip.
    pub pack_id: PackId,
}

struct BoundModel {
    pack_id: PackId,
    label: String,
    scene: SceneGraph,
    signature: Option<String>,
    size_bytes: Option<u64>,
}

/// One of the five fixed display positions.
///
/// Slots exist for the whole application lifetime; they are cleared,
/// never destroyed. Each slot exclusively owns its clone, mixer and
/// action map, so slots never share mutable state.
pub struct Slot {
    index: usize,
    model: Option<BoundModel>,
    attached_packs: Vec<PackId>,
    options: Vec<AnimationOption>,
    mixer: AnimationMixer,
}

impl Slot {
    /// Create an empty slot.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            model: None,
            attached_packs: Vec::new(),
            options: Vec::new(),
            mixer: AnimationMixer::new(),
        }
    }

    /// Fixed position of this slot.
    pub fn index(&self) -> usize {
        self.index
    }

    /// True when no model is bound.
    pub fn is_empty(&self) -> bool {
        self.model.is_none()
    }

    /// Id of the bound model pack.
    pub fn model_pack_id(&self) -> Option<&str> {
        self.model.as_ref().map(|m| m.pack_id.as_str())
    }

    /// Label of the bound model pack.
    pub fn model_label(&self) -> Option<&str> {
        self.model.as_ref().map(|m| m.label.as_str())
    }

    /// Declared size of the bound model pack.
    pub fn model_size_bytes(&self) -> Option<u64> {
        self.model.as_ref().and_then(|m| m.size_bytes)
    }

    /// This slot's compatibility key: the bound pack's skeleton
    /// signature, recorded at load time.
    pub fn skeleton_signature(&self) -> Option<&str> {
        self.model.as_ref().and_then(|m| m.signature.as_deref())
    }

    /// The bound scene clone.
    pub fn scene(&self) -> Option<&SceneGraph> {
        self.model.as_ref().map(|m| &m.scene)
    }

    /// Currently playing option id.
    pub fn playing_clip(&self) -> Option<&str> {
        self.mixer.current()
    }

    /// The mixer, for inspection.
    pub fn mixer(&self) -> &AnimationMixer {
        &self.mixer
    }

    /// Bind a model pack to this slot.
    ///
    /// Tears down any previous model first: its clone is disposed, its
    /// mixer stopped and its attached clip packs dropped. The incoming
    /// pack's scene is deep-cloned (skins bind bones by name, so the
    /// clone stays correct), grounded, and its intrinsic clips become
    /// options. The first clip, if any, auto-plays with no blend.
    pub fn load_model_pack(&mut self, pack: &Pack) {
        self.clear_model();

        let mut scene = pack.scene.clone_instance();
        scene.rest_on_ground();

        self.model = Some(BoundModel {
            pack_id: pack.id.clone(),
            label: pack.label.clone(),
            scene,
            signature: pack.skeleton_signature.clone(),
            size_bytes: pack.size_bytes,
        });

        for clip in pack.clips() {
            let option_id = option_id(&pack.id, &clip.name);
            if self.mixer.add_action(&option_id, clip.clone()) {
                self.options.push(AnimationOption {
                    id: option_id,
                    label: clip.name.clone(),
                    source: OptionSource::Model,
                    pack_id: pack.id.clone(),
                });
            }
        }

        if let Some(first) = self.options.first() {
            let id = first.id.clone();
            self.mixer.play(&id, true);
        }

        info!(
            "slot {}: bound '{}' with {} intrinsic clip(s)",
            self.index,
            pack.id,
            self.options.len()
        );
    }

    /// Whether a clip pack can attach here: both this slot's signature
    /// and the pack's are present and exactly equal.
    pub fn is_compatible_clip_pack(&self, clip_pack: &Pack) -> bool {
        match (self.skeleton_signature(), &clip_pack.skeleton_signature) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Attach a clip pack, returning the ids of newly added options.
    ///
    /// Empty result (and no state change) when the slot has no model,
    /// the pack was already attached, or the skeletons are
    /// incompatible. Incompatibility is an expected outcome, not an
    /// error. Clip ids already registered are skipped, which makes
    /// re-attachment idempotent.
    pub fn attach_clip_pack(&mut self, clip_pack: &Pack) -> Vec<String> {
        if self.model.is_none() {
            return Vec::new();
        }
        if self.attached_packs.contains(&clip_pack.id) {
            debug!("slot {}: clip pack '{}' already attached", self.index, clip_pack.id);
            return Vec::new();
        }
        if !self.is_compatible_clip_pack(clip_pack) {
            debug!(
                "slot {}: clip pack '{}' incompatible, ignoring",
                self.index, clip_pack.id
            );
            return Vec::new();
        }

        let mut added = Vec::new();
        for clip in clip_pack.clips() {
            let id = option_id(&clip_pack.id, &clip.name);
            if self.mixer.add_action(&id, clip.clone()) {
                self.options.push(AnimationOption {
                    id: id.clone(),
                    label: clip.name.clone(),
                    source: OptionSource::ClipPack,
                    pack_id: clip_pack.id.clone(),
                });
                added.push(id);
            }
        }
        self.attached_packs.push(clip_pack.id.clone());

        info!(
            "slot {}: attached clip pack '{}', {} new option(s)",
            self.index,
            clip_pack.id,
            added.len()
        );
        added
    }

    /// Start an animation option.
    ///
    /// False for unknown ids. Re-playing the active option is a no-op
    /// returning true. Switching cross-fades unless `immediate`.
    pub fn play_clip(&mut self, option_id: &str, immediate: bool) -> bool {
        self.mixer.play(option_id, immediate)
    }

    /// All options in presentation order: model-intrinsic clips first,
    /// then clip-pack clips, alphabetical by label within each group.
    /// The ordering is a stable contract for UI snapshots.
    pub fn animation_options(&self) -> Vec<AnimationOption> {
        let mut sorted = self.options.clone();
        sorted.sort_by(|a, b| {
            let group = |o: &AnimationOption| match o.source {
                OptionSource::Model => 0u8,
                OptionSource::ClipPack => 1,
            };
            group(a).cmp(&group(b)).then_with(|| a.label.cmp(&b.label))
        });
        sorted
    }

    /// Advance the slot's mixer. No-op when empty. `dt` is expected to
    /// be clamped by the frame driver.
    pub fn update(&mut self, dt: f32) {
        if self.model.is_some() {
            self.mixer.update(dt);
        }
    }

    /// Clear the slot back to empty, disposing the bound clone.
    pub fn clear_model(&mut self) {
        if let Some(mut model) = self.model.take() {
            self.mixer.stop_all();
            self.mixer.clear();
            model.scene.dispose();
            debug!("slot {}: cleared '{}'", self.index, model.pack_id);
        }
        self.options.clear();
        self.attached_packs.clear();
    }

    /// Equivalent to loading nothing.
    pub fn dispose(&mut self) {
        self.clear_model();
    }
}

fn option_id(pack_id: &str, clip_name: &str) -> String {
    format!("{pack_id}#{clip_name}")
}
