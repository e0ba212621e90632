//! Integration tests for the binary FBX reader and document layer.

mod common;

use common::{build_fbx, skinned_character_fbx, FbxNodeSpec, ZipBuilder};
use rigstage::fbx::{self, load_scene};
use rigstage::pack::ingest_archive;
use rigstage::resolve::HandleStore;
use rigstage::scene::{NodeKind, SceneNode};

#[test]
fn record_tree_round_trip() {
    let bytes = build_fbx(vec![FbxNodeSpec::new("Objects")
        .child(
            FbxNodeSpec::new("Geometry")
                .prop_i64(7)
                .prop_name_class("thing", "Geometry")
                .prop_str("Mesh")
                .child(FbxNodeSpec::new("Vertices").prop_f64_array(vec![0.0, 1.0, 2.0])),
        )
        .child(FbxNodeSpec::new("Empty"))]);

    let file = fbx::reader::parse(&bytes).unwrap();
    assert_eq!(file.version, 7400);
    assert_eq!(file.nodes.len(), 1);

    let objects = file.node("Objects").unwrap();
    assert_eq!(objects.children.len(), 2);

    let geometry = objects.child("Geometry").unwrap();
    assert_eq!(geometry.prop_i64(0), Some(7));
    assert_eq!(geometry.prop_str(2), Some("Mesh"));
    let vertices = geometry.child("Vertices").unwrap();
    assert_eq!(
        vertices.properties.first(),
        Some(&fbx::FbxProperty::F64Array(vec![0.0, 1.0, 2.0]))
    );
}

#[test]
fn zlib_compressed_arrays_decode() {
    let values: Vec<f64> = (0..256).map(|i| i as f64 * 0.25).collect();
    let bytes = build_fbx(vec![FbxNodeSpec::new("Objects").child(
        FbxNodeSpec::new("Geometry")
            .prop_i64(1)
            .prop_name_class("g", "Geometry")
            .prop_str("Mesh")
            .child(FbxNodeSpec::new("Vertices").prop_f64_array_zlib(values.clone())),
    )]);

    let file = fbx::reader::parse(&bytes).unwrap();
    let vertices = file
        .node("Objects")
        .unwrap()
        .child("Geometry")
        .unwrap()
        .child("Vertices")
        .unwrap();
    assert_eq!(
        vertices.properties.first(),
        Some(&fbx::FbxProperty::F64Array(values))
    );
}

#[test]
fn document_extracts_hierarchy_and_clips() {
    let bytes = skinned_character_fbx(&["Hip", "Spine"], "tex.png", &["Idle", "Run"]);
    let scene = load_scene(&bytes).unwrap();

    // Mesh node with both bones hanging under it.
    let mut mesh_count = 0;
    let mut bone_names = Vec::new();
    scene.visit(&mut |node: &SceneNode| match &node.kind {
        NodeKind::Mesh(mesh) => {
            mesh_count += 1;
            assert_eq!(node.name, "Hero");
            assert_eq!(mesh.geometry.positions.len(), 3);
            assert_eq!(mesh.geometry.indices, vec![0, 1, 2]);
            assert_eq!(mesh.material.kind_name(), "phong");
            let skin = mesh.skin.as_ref().expect("mesh should be skinned");
            assert_eq!(skin.bone_names, vec!["Hip".to_string(), "Spine".to_string()]);
        }
        NodeKind::Bone => bone_names.push(node.name.clone()),
        NodeKind::Group => {}
    });
    assert_eq!(mesh_count, 1);
    assert_eq!(bone_names, vec!["Hip".to_string(), "Spine".to_string()]);

    assert_eq!(scene.clips.len(), 2);
    assert_eq!(scene.clips[0].name, "Idle");
    assert!((scene.clips[0].duration - 2.0).abs() < 1e-5);
}

#[test]
fn bare_load_leaves_textures_unresolved() {
    let bytes = skinned_character_fbx(&["Hip"], "C:/weird/path/tex.png", &[]);
    let scene = load_scene(&bytes).unwrap();

    scene.visit(&mut |node: &SceneNode| {
        if let NodeKind::Mesh(mesh) = &node.kind {
            let map = mesh.material.map().expect("texture reference kept");
            assert_eq!(map.requested, "C:/weird/path/tex.png");
            assert_eq!(map.resolved, map.requested);
            assert!(!map.is_resolved());
        }
    });
}

#[test]
fn archive_load_resolves_textures_from_members() {
    let store = HandleStore::new();
    let fbx = skinned_character_fbx(&["Hip"], "textures\\Skin.PNG", &[]);
    let archive = ZipBuilder::new()
        .stored("hero.fbx", &fbx)
        .stored("textures/skin.png", b"skin bytes")
        .build();

    let asset = ingest_archive(&archive, &store).unwrap();
    let mut resolved = false;
    asset.scene.visit(&mut |node: &SceneNode| {
        if let NodeKind::Mesh(mesh) = &node.kind {
            let map = mesh.material.map().expect("texture reference kept");
            assert!(map.resolved.starts_with("mem://"), "backslashed mixed-case reference should match the member");
            assert_eq!(map.bytes.as_deref().map(Vec::as_slice), Some(&b"skin bytes"[..]));
            resolved = true;
        }
    });
    assert!(resolved);
}

#[test]
fn missing_objects_node_is_a_decode_error() {
    let bytes = build_fbx(vec![FbxNodeSpec::new("NotObjects")]);
    let err = load_scene(&bytes).unwrap_err();
    assert!(err.to_string().contains("Objects"));
}
