//! Scene graph node hierarchy.
//!
//! The loader produces a tree of [`SceneNode`]s: group nodes for plain
//! transforms, bone nodes for skeleton joints, and mesh nodes carrying
//! geometry, a material and an optional skin binding. Skins reference
//! bones by name, which is what makes a deep clone of the tree keep its
//! bindings intact.

use glam::{Mat4, Vec3};

use super::clip::AnimationClip;
use super::material::Material;

/// Skin binding of a mesh: the bones that deform it.
///
/// Bone names are stored in the order the skinning data defines, not in
/// hierarchy order. The skeleton signature depends on this order.
#[derive(Debug, Clone, Default)]
pub struct Skin {
    pub bone_names: Vec<String>,
}

/// Mesh geometry. Positions are local-space; indices may describe
/// arbitrary polygons as emitted by the source file.
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
}

/// Mesh payload of a node.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub geometry: Geometry,
    pub material: Material,
    pub skin: Option<Skin>,
}

impl Mesh {
    /// True when this mesh has a skin binding.
    pub fn is_skinned(&self) -> bool {
        self.skin.is_some()
    }
}

/// Node role within the hierarchy.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Group,
    Bone,
    Mesh(Mesh),
}

/// One node of the scene hierarchy.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub kind: NodeKind,
    /// Local transform relative to the parent.
    pub transform: Mat4,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// Create a group node.
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Group,
            transform: Mat4::IDENTITY,
            children: Vec::new(),
        }
    }

    /// Create a bone node.
    pub fn bone(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Bone,
            transform: Mat4::IDENTITY,
            children: Vec::new(),
        }
    }

    /// Create a mesh node.
    pub fn mesh(name: impl Into<String>, mesh: Mesh) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Mesh(mesh),
            transform: Mat4::IDENTITY,
            children: Vec::new(),
        }
    }

    /// Pre-order depth-first visit.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a SceneNode)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }

    fn visit_mut(&mut self, f: &mut impl FnMut(&mut SceneNode)) {
        f(self);
        for child in &mut self.children {
            child.visit_mut(f);
        }
    }
}

/// A loaded scene: node hierarchy plus the clips authored in the file.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    pub root: SceneNode,
    pub clips: Vec<AnimationClip>,
    disposed: bool,
}

impl SceneGraph {
    /// Wrap a root node and its clips.
    pub fn new(root: SceneNode, clips: Vec<AnimationClip>) -> Self {
        Self {
            root,
            clips,
            disposed: false,
        }
    }

    /// Pre-order depth-first visit over every node.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a SceneNode)) {
        self.root.visit(f);
    }

    /// Total node count.
    pub fn node_count(&self) -> usize {
        let mut n = 0;
        self.visit(&mut |_| n += 1);
        n
    }

    /// True when any mesh node carries a skin binding.
    pub fn has_skinned_mesh(&self) -> bool {
        let mut found = false;
        self.visit(&mut |node| {
            if let NodeKind::Mesh(mesh) = &node.kind {
                if mesh.is_skinned() {
                    found = true;
                }
            }
        });
        found
    }

    /// Deep clone for slot binding.
    ///
    /// Skins reference bones by name rather than by pointer, so the
    /// copy's meshes stay bound to the copy's bones with no fix-up pass.
    pub fn clone_instance(&self) -> SceneGraph {
        SceneGraph {
            root: self.root.clone(),
            clips: self.clips.clone(),
            disposed: false,
        }
    }

    /// Lowest world-space Y over all mesh geometry, or `None` for a
    /// scene with no mesh positions.
    pub fn min_y(&self) -> Option<f32> {
        fn walk(node: &SceneNode, parent: Mat4, min: &mut Option<f32>) {
            let world = parent * node.transform;
            if let NodeKind::Mesh(mesh) = &node.kind {
                for p in &mesh.geometry.positions {
                    let y = world.transform_point3(*p).y;
                    *min = Some(match *min {
                        Some(m) => m.min(y),
                        None => y,
                    });
                }
            }
            for child in &node.children {
                walk(child, world, min);
            }
        }
        let mut min = None;
        walk(&self.root, Mat4::IDENTITY, &mut min);
        min
    }

    /// Translate the root so the lowest mesh point sits on y = 0.
    pub fn rest_on_ground(&mut self) {
        if let Some(min_y) = self.min_y() {
            self.root.transform =
                Mat4::from_translation(Vec3::new(0.0, -min_y, 0.0)) * self.root.transform;
        }
    }

    /// Release the heavyweight payloads: geometry buffers and texture
    /// bytes. The hierarchy itself stays walkable. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.root.visit_mut(&mut |node| {
            if let NodeKind::Mesh(mesh) = &mut node.kind {
                mesh.geometry.positions = Vec::new();
                mesh.geometry.indices = Vec::new();
                mesh.material.release_map();
            }
        });
        self.disposed = true;
    }

    /// Whether [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}
