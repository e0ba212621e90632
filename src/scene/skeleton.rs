//! Skeleton compatibility signature.
//!
//! The signature is a coarse structural proxy for "can clip X retarget
//! onto mesh Y": exact equality of ordered, case-folded bone names.
//! Two skeletons with identical name lists but different bind poses
//! compare equal; that permissive behavior is load-bearing for clip
//! packs authored separately from their target meshes, so it must not
//! be tightened.

use super::node::{NodeKind, SceneGraph};

/// Delimiter between bone names in a signature.
pub const SIGNATURE_DELIMITER: &str = "|";

/// Compute the skeleton signature of a scene.
///
/// The first skinned mesh found by depth-first traversal wins, and its
/// bone list is taken in skinning-data order. Scenes without skinned
/// meshes fall back to every bone node in traversal order. Names are
/// trimmed, lower-cased and empty names dropped; `None` when neither
/// source yields a name.
///
/// Computed once per pack at ingestion and cached there; later graph
/// mutation (slot-local clones, disposal) must not change the stored
/// value.
pub fn skeleton_signature(scene: &SceneGraph) -> Option<String> {
    let mut skinned_bones: Option<&[String]> = None;
    scene.visit(&mut |node| {
        if skinned_bones.is_some() {
            return;
        }
        if let NodeKind::Mesh(mesh) = &node.kind {
            if let Some(skin) = &mesh.skin {
                skinned_bones = Some(&skin.bone_names);
            }
        }
    });

    let names: Vec<String> = match skinned_bones {
        Some(bones) => bones.iter().map(|n| fold(n)).filter(|n| !n.is_empty()).collect(),
        None => {
            let mut collected = Vec::new();
            scene.visit(&mut |node| {
                if matches!(node.kind, NodeKind::Bone) {
                    let name = fold(&node.name);
                    if !name.is_empty() {
                        collected.push(name);
                    }
                }
            });
            collected
        }
    };

    if names.is_empty() {
        None
    } else {
        Some(names.join(SIGNATURE_DELIMITER))
    }
}

fn fold(name: &str) -> String {
    name.trim().to_lowercase()
}
