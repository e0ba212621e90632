//! Material variants.
//!
//! The set of material kinds the loader produces is closed: one variant
//! per shading model we normalize, with an explicit conversion from the
//! source file's shading-model string. No runtime capability probing.

use std::sync::Arc;

/// A texture reference carried by a material.
///
/// `requested` is the raw path string baked into the mesh file;
/// `resolved` is what the archive resolver mapped it to (a local handle
/// URL on a hit, the original string on a miss). Bytes are present only
/// for hits.
#[derive(Debug, Clone)]
pub struct TextureRef {
    pub requested: String,
    pub resolved: String,
    pub bytes: Option<Arc<Vec<u8>>>,
}

impl TextureRef {
    /// True when archive resolution found actual bytes for this reference.
    pub fn is_resolved(&self) -> bool {
        self.bytes.is_some()
    }

    /// Drop the held bytes. Idempotent.
    pub fn release(&mut self) {
        self.bytes = None;
    }
}

/// Closed set of material kinds.
#[derive(Debug, Clone)]
pub enum Material {
    /// Flat color, no lighting response.
    Unlit {
        color: [f32; 3],
        map: Option<TextureRef>,
    },
    /// Diffuse-only lighting.
    Lambert {
        color: [f32; 3],
        map: Option<TextureRef>,
    },
    /// Specular highlight model.
    Phong {
        color: [f32; 3],
        shininess: f32,
        map: Option<TextureRef>,
    },
    /// Metalness/roughness model.
    Standard {
        color: [f32; 3],
        roughness: f32,
        metalness: f32,
        map: Option<TextureRef>,
    },
}

impl Material {
    /// Convert a source shading-model string into a variant.
    ///
    /// Unknown models normalize to `Standard`, matching how the showcase
    /// treats arbitrary imported assets.
    pub fn from_shading_model(model: &str, color: [f32; 3], shininess: Option<f32>) -> Self {
        match model.trim().to_ascii_lowercase().as_str() {
            "lambert" => Material::Lambert { color, map: None },
            "phong" => Material::Phong {
                color,
                shininess: shininess.unwrap_or(20.0),
                map: None,
            },
            "unlit" | "constant" => Material::Unlit { color, map: None },
            _ => Material::Standard {
                color,
                roughness: 0.8,
                metalness: 0.0,
                map: None,
            },
        }
    }

    /// Diffuse color.
    pub fn color(&self) -> [f32; 3] {
        match self {
            Material::Unlit { color, .. }
            | Material::Lambert { color, .. }
            | Material::Phong { color, .. }
            | Material::Standard { color, .. } => *color,
        }
    }

    /// The diffuse texture map, if any.
    pub fn map(&self) -> Option<&TextureRef> {
        match self {
            Material::Unlit { map, .. }
            | Material::Lambert { map, .. }
            | Material::Phong { map, .. }
            | Material::Standard { map, .. } => map.as_ref(),
        }
    }

    /// Attach a diffuse texture map.
    pub fn set_map(&mut self, texture: TextureRef) {
        match self {
            Material::Unlit { map, .. }
            | Material::Lambert { map, .. }
            | Material::Phong { map, .. }
            | Material::Standard { map, .. } => *map = Some(texture),
        }
    }

    /// Release the texture bytes held by this material. Idempotent.
    pub fn release_map(&mut self) {
        match self {
            Material::Unlit { map, .. }
            | Material::Lambert { map, .. }
            | Material::Phong { map, .. }
            | Material::Standard { map, .. } => {
                if let Some(m) = map {
                    m.release();
                }
            }
        }
    }

    /// Variant name for logging and inspection output.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Material::Unlit { .. } => "unlit",
            Material::Lambert { .. } => "lambert",
            Material::Phong { .. } => "phong",
            Material::Standard { .. } => "standard",
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Material::Standard {
            color: [0.8, 0.8, 0.8],
            roughness: 0.8,
            metalness: 0.0,
            map: None,
        }
    }
}
