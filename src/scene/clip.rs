//! Animation clip descriptors.
//!
//! The pipeline hands clips to an external animation/rendering
//! collaborator; here a clip is its identity and timing, not its curves.

/// One named animation clip extracted from a mesh file.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    /// Clip name as authored (take / animation stack name).
    pub name: String,
    /// Duration in seconds. Zero when the source file declared no stop time.
    pub duration: f32,
}

impl AnimationClip {
    /// Create a clip.
    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        Self {
            name: name.into(),
            duration: duration.max(0.0),
        }
    }
}
