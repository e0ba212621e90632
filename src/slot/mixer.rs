//! Animation mixer.
//!
//! Bookkeeping over clip actions: which one is playing, at what time and
//! weight, and the single cross-fade that may be in flight. Pose
//! sampling belongs to the rendering collaborator; this mixer only
//! advances state, driven once per frame by an external caller.

use std::collections::HashMap;

use crate::scene::AnimationClip;

/// Cross-fade length in seconds when switching clips non-immediately.
pub const CROSS_FADE_SECONDS: f32 = 0.2;

/// One playable action over a clip.
#[derive(Debug, Clone)]
pub struct ClipAction {
    pub clip: AnimationClip,
    pub playing: bool,
    pub weight: f32,
    pub time: f32,
}

impl ClipAction {
    fn new(clip: AnimationClip) -> Self {
        Self {
            clip,
            playing: false,
            weight: 0.0,
            time: 0.0,
        }
    }
}

#[derive(Debug)]
struct CrossFade {
    from: String,
    elapsed: f32,
}

/// Action map plus the currently-playing state of one slot.
///
/// During a cross-fade two actions run concurrently with complementary
/// weights; that overlap is the only concurrent-looking playback and it
/// is purely cooperative, driven by [`update`](AnimationMixer::update).
#[derive(Debug, Default)]
pub struct AnimationMixer {
    actions: HashMap<String, ClipAction>,
    current: Option<String>,
    fade: Option<CrossFade>,
}

impl AnimationMixer {
    /// Create an empty mixer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action. Returns false when the id already exists
    /// (the existing action is kept untouched).
    pub fn add_action(&mut self, id: &str, clip: AnimationClip) -> bool {
        if self.actions.contains_key(id) {
            return false;
        }
        self.actions.insert(id.to_string(), ClipAction::new(clip));
        true
    }

    /// Whether an action id is registered.
    pub fn has_action(&self, id: &str) -> bool {
        self.actions.contains_key(id)
    }

    /// Inspect an action.
    pub fn action(&self, id: &str) -> Option<&ClipAction> {
        self.actions.get(id)
    }

    /// Number of registered actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// True when no actions are registered.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Currently-playing action id.
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Start playing an action.
    ///
    /// Unknown ids return false. Re-playing the already-current id is a
    /// no-op returning true: the running action is neither stopped nor
    /// restarted. Switching from another clip cross-fades over
    /// [`CROSS_FADE_SECONDS`] unless `immediate`, in which case the old
    /// action stops outright and the new one starts at full weight.
    pub fn play(&mut self, id: &str, immediate: bool) -> bool {
        if !self.actions.contains_key(id) {
            return false;
        }
        if self.current.as_deref() == Some(id) {
            return true;
        }

        // A fade already in flight is cut short: its outgoing action
        // stops now so it cannot linger at partial weight.
        if let Some(old_fade) = self.fade.take() {
            if let Some(action) = self.actions.get_mut(&old_fade.from) {
                action.playing = false;
                action.weight = 0.0;
            }
        }

        let previous = self.current.take();
        match previous {
            Some(prev) if !immediate => {
                // Old action keeps playing while the new ramps in.
                let action = self.actions.get_mut(id).expect("checked above");
                action.playing = true;
                action.weight = 0.0;
                action.time = 0.0;
                self.fade = Some(CrossFade {
                    from: prev,
                    elapsed: 0.0,
                });
            }
            maybe_prev => {
                if let Some(prev) = maybe_prev {
                    if let Some(old) = self.actions.get_mut(&prev) {
                        old.playing = false;
                        old.weight = 0.0;
                    }
                }
                self.fade = None;
                let action = self.actions.get_mut(id).expect("checked above");
                action.playing = true;
                action.weight = 1.0;
                action.time = 0.0;
            }
        }
        self.current = Some(id.to_string());
        true
    }

    /// Stop everything and forget the current clip. Actions stay
    /// registered.
    pub fn stop_all(&mut self) {
        for action in self.actions.values_mut() {
            action.playing = false;
            action.weight = 0.0;
            action.time = 0.0;
        }
        self.current = None;
        self.fade = None;
    }

    /// Drop all actions.
    pub fn clear(&mut self) {
        self.actions.clear();
        self.current = None;
        self.fade = None;
    }

    /// Advance playing actions and any in-flight fade.
    ///
    /// Callers clamp `dt` upstream (a stalled tab must not produce one
    /// giant step); this method applies whatever it is given.
    pub fn update(&mut self, dt: f32) {
        for action in self.actions.values_mut() {
            if action.playing {
                action.time += dt;
                if action.clip.duration > 0.0 {
                    action.time %= action.clip.duration;
                }
            }
        }

        if let Some(fade) = &mut self.fade {
            fade.elapsed += dt;
            let t = (fade.elapsed / CROSS_FADE_SECONDS).min(1.0);
            let from = fade.from.clone();
            let done = t >= 1.0;

            if let Some(current) = &self.current {
                if let Some(action) = self.actions.get_mut(current.as_str()) {
                    action.weight = t;
                }
            }
            if let Some(action) = self.actions.get_mut(&from) {
                action.weight = 1.0 - t;
                if done {
                    action.playing = false;
                    action.weight = 0.0;
                }
            }
            if done {
                self.fade = None;
            }
        }
    }
}
