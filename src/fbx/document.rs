//! Document layer: lift a parsed FBX record tree into a scene graph.
//!
//! Walks `Objects` and `Connections` to recover the model hierarchy,
//! geometry with skin bindings, materials with texture references, and
//! the animation stacks. Every texture reference string encountered in
//! the file is passed through the archive resolver before any bytes are
//! looked up, so texture loads never depend on the path strings baked
//! into the binary.

use std::collections::{HashMap, HashSet};

use glam::{EulerRot, Mat4, Quat, Vec3};
use tracing::{debug, trace, warn};

use super::format::{KTIME_PER_SECOND, NAME_CLASS_SEPARATOR};
use super::reader::{self, FbxFile, FbxNode, FbxProperty};
use crate::resolve::{AssetMap, HandleStore};
use crate::scene::{
    AnimationClip, Geometry, Material, Mesh, SceneGraph, SceneNode, Skin, TextureRef,
};
use crate::util::{Error, Result};

/// Parse a standalone binary FBX buffer into a scene graph.
///
/// Embedded texture references are kept as unresolved literals (no
/// archive context exists), which downstream consumers surface as
/// visibly missing textures.
pub fn load_scene(bytes: &[u8]) -> Result<SceneGraph> {
    let file = reader::parse(bytes)?;
    extract(&file, None)
}

/// Parse the primary member of an ingested archive.
///
/// The member's own bytes come out of the handle store via the asset
/// map, and every texture reference resolves against the same map.
pub fn load_from_resolved_archive(
    primary_member: &str,
    map: &AssetMap,
    store: &HandleStore,
) -> Result<SceneGraph> {
    let url = map.resolve(primary_member);
    if !HandleStore::is_local_url(&url) {
        return Err(Error::other(format!(
            "primary member '{primary_member}' is not in the asset map"
        )));
    }
    let bytes = store
        .get(&url)
        .ok_or_else(|| Error::other(format!("handle for '{primary_member}' was revoked")))?;

    let file = reader::parse(&bytes)?;
    extract(&file, Some((map, store)))
}

type Resolver<'a> = Option<(&'a AssetMap, &'a HandleStore)>;

#[derive(Debug, Clone, Copy, PartialEq)]
enum ModelClass {
    Mesh,
    Limb,
    Other,
}

struct ModelRec<'a> {
    name: String,
    class: ModelClass,
    node: &'a FbxNode,
}

struct Index<'a> {
    model_order: Vec<i64>,
    models: HashMap<i64, ModelRec<'a>>,
    geometries: HashMap<i64, &'a FbxNode>,
    materials: HashMap<i64, Material>,
    textures: HashMap<i64, String>,
    skins: HashSet<i64>,
    clusters: HashSet<i64>,
    /// Object-object connections (child, parent), in file order.
    oo: Vec<(i64, i64)>,
}

fn extract(file: &FbxFile, resolver: Resolver<'_>) -> Result<SceneGraph> {
    let objects = file
        .node("Objects")
        .ok_or_else(|| Error::decode("FBX document has no Objects node"))?;

    let mut index = build_index(objects);
    index.oo = collect_connections(file);

    // Derived connection tables.
    let mut child_models: HashMap<i64, Vec<i64>> = HashMap::new();
    let mut has_parent: HashSet<i64> = HashSet::new();
    let mut geometry_of_model: HashMap<i64, i64> = HashMap::new();
    let mut material_of_model: HashMap<i64, i64> = HashMap::new();
    let mut texture_of_material: HashMap<i64, i64> = HashMap::new();
    let mut skin_of_geometry: HashMap<i64, i64> = HashMap::new();
    let mut clusters_of_skin: HashMap<i64, Vec<i64>> = HashMap::new();
    let mut bone_of_cluster: HashMap<i64, i64> = HashMap::new();

    for &(child, parent) in &index.oo {
        if index.models.contains_key(&child) && index.models.contains_key(&parent) {
            child_models.entry(parent).or_default().push(child);
            has_parent.insert(child);
        } else if index.geometries.contains_key(&child) && index.models.contains_key(&parent) {
            geometry_of_model.entry(parent).or_insert(child);
        } else if index.materials.contains_key(&child) && index.models.contains_key(&parent) {
            material_of_model.entry(parent).or_insert(child);
        } else if index.textures.contains_key(&child) && index.materials.contains_key(&parent) {
            texture_of_material.entry(parent).or_insert(child);
        } else if index.skins.contains(&child) && index.geometries.contains_key(&parent) {
            skin_of_geometry.entry(parent).or_insert(child);
        } else if index.clusters.contains(&child) && index.skins.contains(&parent) {
            // Cluster order within a skin defines bone order.
            clusters_of_skin.entry(parent).or_default().push(child);
        } else if index.models.contains_key(&child) && index.clusters.contains(&parent) {
            bone_of_cluster.entry(parent).or_insert(child);
        }
    }

    let ctx = BuildCtx {
        index: &index,
        child_models: &child_models,
        geometry_of_model: &geometry_of_model,
        material_of_model: &material_of_model,
        texture_of_material: &texture_of_material,
        skin_of_geometry: &skin_of_geometry,
        clusters_of_skin: &clusters_of_skin,
        bone_of_cluster: &bone_of_cluster,
        resolver,
    };

    let mut root = SceneNode::group("scene");
    for &id in &index.model_order {
        if !has_parent.contains(&id) {
            root.children.push(build_node(&ctx, id)?);
        }
    }

    let clips = extract_clips(objects);
    debug!(
        "extracted scene: {} root model(s), {} clip(s)",
        root.children.len(),
        clips.len()
    );

    Ok(SceneGraph::new(root, clips))
}

struct BuildCtx<'a, 'b> {
    index: &'b Index<'a>,
    child_models: &'b HashMap<i64, Vec<i64>>,
    geometry_of_model: &'b HashMap<i64, i64>,
    material_of_model: &'b HashMap<i64, i64>,
    texture_of_material: &'b HashMap<i64, i64>,
    skin_of_geometry: &'b HashMap<i64, i64>,
    clusters_of_skin: &'b HashMap<i64, Vec<i64>>,
    bone_of_cluster: &'b HashMap<i64, i64>,
    resolver: Resolver<'b>,
}

fn build_node(ctx: &BuildCtx<'_, '_>, model_id: i64) -> Result<SceneNode> {
    let rec = &ctx.index.models[&model_id];

    let mut node = match rec.class {
        ModelClass::Limb => SceneNode::bone(rec.name.clone()),
        ModelClass::Mesh => match ctx.geometry_of_model.get(&model_id) {
            Some(geo_id) => {
                let mesh = build_mesh(ctx, model_id, *geo_id)?;
                SceneNode::mesh(rec.name.clone(), mesh)
            }
            None => SceneNode::group(rec.name.clone()),
        },
        ModelClass::Other => SceneNode::group(rec.name.clone()),
    };
    node.transform = local_transform(rec.node);

    if let Some(children) = ctx.child_models.get(&model_id) {
        for &child_id in children {
            node.children.push(build_node(ctx, child_id)?);
        }
    }
    Ok(node)
}

fn build_mesh(ctx: &BuildCtx<'_, '_>, model_id: i64, geo_id: i64) -> Result<Mesh> {
    let geo_node = ctx.index.geometries[&geo_id];
    let geometry = read_geometry(geo_node)?;

    let mut material = ctx
        .material_of_model
        .get(&model_id)
        .and_then(|mat_id| ctx.index.materials.get(mat_id).cloned())
        .unwrap_or_default();

    if let Some(mat_id) = ctx.material_of_model.get(&model_id) {
        if let Some(tex_id) = ctx.texture_of_material.get(mat_id) {
            if let Some(requested) = ctx.index.textures.get(tex_id) {
                material.set_map(resolve_texture(ctx.resolver, requested));
            }
        }
    }

    let skin = ctx.skin_of_geometry.get(&geo_id).map(|skin_id| {
        let bone_names = ctx
            .clusters_of_skin
            .get(skin_id)
            .map(|clusters| {
                clusters
                    .iter()
                    .filter_map(|cluster_id| ctx.bone_of_cluster.get(cluster_id))
                    .filter_map(|bone_id| ctx.index.models.get(bone_id))
                    .map(|bone| bone.name.clone())
                    .collect()
            })
            .unwrap_or_default();
        Skin { bone_names }
    });

    Ok(Mesh {
        geometry,
        material,
        skin,
    })
}

fn resolve_texture(resolver: Resolver<'_>, requested: &str) -> TextureRef {
    match resolver {
        Some((map, store)) => {
            let resolved = map.resolve(requested);
            let bytes = if HandleStore::is_local_url(&resolved) {
                store.get(&resolved)
            } else {
                trace!("texture '{requested}' not in archive, left as literal URL");
                None
            };
            TextureRef {
                requested: requested.to_string(),
                resolved,
                bytes,
            }
        }
        None => TextureRef {
            requested: requested.to_string(),
            resolved: requested.to_string(),
            bytes: None,
        },
    }
}

fn read_geometry(geo: &FbxNode) -> Result<Geometry> {
    let positions = match geo.child("Vertices").and_then(|n| n.properties.first()) {
        Some(FbxProperty::F64Array(values)) => values
            .chunks_exact(3)
            .map(|c| Vec3::new(c[0] as f32, c[1] as f32, c[2] as f32))
            .collect(),
        Some(FbxProperty::F32Array(values)) => values
            .chunks_exact(3)
            .map(|c| Vec3::new(c[0], c[1], c[2]))
            .collect(),
        _ => Vec::new(),
    };

    // Negative indices mark polygon ends; the real index is the bitwise
    // complement.
    let indices = match geo
        .child("PolygonVertexIndex")
        .and_then(|n| n.properties.first())
    {
        Some(FbxProperty::I32Array(values)) => values
            .iter()
            .map(|&v| if v < 0 { !v as u32 } else { v as u32 })
            .collect(),
        _ => Vec::new(),
    };

    Ok(Geometry { positions, indices })
}

fn build_index<'a>(objects: &'a FbxNode) -> Index<'a> {
    let mut index = Index {
        model_order: Vec::new(),
        models: HashMap::new(),
        geometries: HashMap::new(),
        materials: HashMap::new(),
        textures: HashMap::new(),
        skins: HashSet::new(),
        clusters: HashSet::new(),
        oo: Vec::new(),
    };

    for obj in &objects.children {
        let Some(id) = obj.prop_i64(0) else { continue };
        match obj.name.as_str() {
            "Model" => {
                let name = display_name(obj.prop_str(1).unwrap_or(""));
                let class = match obj.prop_str(2).unwrap_or("") {
                    "Mesh" => ModelClass::Mesh,
                    "LimbNode" | "Limb" | "Root" => ModelClass::Limb,
                    _ => ModelClass::Other,
                };
                index.model_order.push(id);
                index.models.insert(id, ModelRec { name, class, node: obj });
            }
            "Geometry" => {
                index.geometries.insert(id, obj);
            }
            "Material" => {
                index.materials.insert(id, read_material(obj));
            }
            "Texture" | "Video" => {
                if let Some(filename) = texture_filename(obj) {
                    index.textures.insert(id, filename);
                }
            }
            "Deformer" => match obj.prop_str(2).unwrap_or("") {
                "Skin" => {
                    index.skins.insert(id);
                }
                "Cluster" => {
                    index.clusters.insert(id);
                }
                other => trace!("ignoring deformer class '{other}'"),
            },
            _ => {}
        }
    }
    index
}

fn collect_connections(file: &FbxFile) -> Vec<(i64, i64)> {
    let mut oo = Vec::new();
    let Some(connections) = file.node("Connections") else {
        return oo;
    };
    for c in connections.children_named("C") {
        // "OO" object-object and "OP" object-property connections both
        // carry (child, parent) ids at indices 1 and 2.
        let kind = c.prop_str(0).unwrap_or("");
        if kind != "OO" && kind != "OP" {
            continue;
        }
        let (Some(child), Some(parent)) = (c.prop_i64(1), c.prop_i64(2)) else {
            warn!("connection with non-integer endpoints skipped");
            continue;
        };
        oo.push((child, parent));
    }
    oo
}

/// `"Hero\x00\x01Model"` carries the display name before the separator.
fn display_name(raw: &str) -> String {
    match raw.split_once(NAME_CLASS_SEPARATOR) {
        Some((name, _class)) => name.to_string(),
        None => raw.to_string(),
    }
}

fn read_material(node: &FbxNode) -> Material {
    let model = node
        .child("ShadingModel")
        .and_then(|n| n.prop_str(0))
        .unwrap_or("");

    let mut color = [0.8f32, 0.8, 0.8];
    let mut shininess = None;
    if let Some(props) = node.child("Properties70") {
        for p in props.children_named("P") {
            match p.prop_str(0) {
                Some("DiffuseColor") | Some("Diffuse") => {
                    if let (Some(r), Some(g), Some(b)) =
                        (p.prop_f64(4), p.prop_f64(5), p.prop_f64(6))
                    {
                        color = [r as f32, g as f32, b as f32];
                    }
                }
                Some("Shininess") | Some("ShininessExponent") => {
                    shininess = p.prop_f64(4).map(|v| v as f32);
                }
                _ => {}
            }
        }
    }
    Material::from_shading_model(model, color, shininess)
}

fn texture_filename(node: &FbxNode) -> Option<String> {
    for child_name in ["RelativeFilename", "FileName", "Filename"] {
        if let Some(name) = node.child(child_name).and_then(|n| n.prop_str(0)) {
            if !name.trim().is_empty() {
                return Some(name.to_string());
            }
        }
    }
    None
}

fn local_transform(model: &FbxNode) -> Mat4 {
    let mut translation = Vec3::ZERO;
    let mut rotation = Vec3::ZERO;
    let mut scale = Vec3::ONE;

    if let Some(props) = model.child("Properties70") {
        for p in props.children_named("P") {
            let values = (p.prop_f64(4), p.prop_f64(5), p.prop_f64(6));
            let (Some(x), Some(y), Some(z)) = values else {
                continue;
            };
            match p.prop_str(0) {
                Some("Lcl Translation") => translation = Vec3::new(x as f32, y as f32, z as f32),
                Some("Lcl Rotation") => rotation = Vec3::new(x as f32, y as f32, z as f32),
                Some("Lcl Scaling") => scale = Vec3::new(x as f32, y as f32, z as f32),
                _ => {}
            }
        }
    }

    let quat = Quat::from_euler(
        EulerRot::XYZ,
        rotation.x.to_radians(),
        rotation.y.to_radians(),
        rotation.z.to_radians(),
    );
    Mat4::from_scale_rotation_translation(scale, quat, translation)
}

fn extract_clips(objects: &FbxNode) -> Vec<AnimationClip> {
    let mut clips = Vec::new();
    for obj in &objects.children {
        if obj.name != "AnimationStack" {
            continue;
        }
        let name = display_name(obj.prop_str(1).unwrap_or("clip"));
        let mut duration = 0.0f32;
        if let Some(props) = obj.child("Properties70") {
            for p in props.children_named("P") {
                if p.prop_str(0) == Some("LocalStop") {
                    if let Some(ktime) = p.properties.iter().rev().find_map(FbxProperty::as_i64) {
                        duration = (ktime as f64 / KTIME_PER_SECOND as f64) as f32;
                    }
                }
            }
        }
        clips.push(AnimationClip::new(name, duration));
    }
    clips
}
