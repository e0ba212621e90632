//! Shared fixture builders: in-memory ZIP archives and binary FBX
//! documents small enough to hand-assemble but real enough to drive the
//! whole ingestion pipeline.

#![allow(dead_code)]

use std::io::Write;

use flate2::write::{DeflateEncoder, ZlibEncoder};
use flate2::Compression;

// ============================================================================
// ZIP builder
// ============================================================================

const LOCAL_SIG: u32 = 0x0403_4b50;
const CENTRAL_SIG: u32 = 0x0201_4b50;
const EOCD_SIG: u32 = 0x0605_4b50;

struct ZipMember {
    name: String,
    raw: Vec<u8>,
    stored: Vec<u8>,
    method: u16,
    local_offset: u32,
}

/// Builds small ZIP archives, mixing stored and DEFLATE members.
#[derive(Default)]
pub struct ZipBuilder {
    members: Vec<(String, Vec<u8>, bool)>,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member stored without compression.
    pub fn stored(mut self, name: &str, bytes: &[u8]) -> Self {
        self.members.push((name.to_string(), bytes.to_vec(), false));
        self
    }

    /// Add a DEFLATE-compressed member.
    pub fn deflated(mut self, name: &str, bytes: &[u8]) -> Self {
        self.members.push((name.to_string(), bytes.to_vec(), true));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut entries = Vec::new();

        for (name, raw, deflate) in self.members {
            let (stored, method) = if deflate {
                let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(&raw).unwrap();
                (encoder.finish().unwrap(), 8u16)
            } else {
                (raw.clone(), 0u16)
            };

            let local_offset = out.len() as u32;
            out.extend_from_slice(&LOCAL_SIG.to_le_bytes());
            out.extend_from_slice(&20u16.to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(&method.to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes()); // crc, unchecked
            out.extend_from_slice(&(stored.len() as u32).to_le_bytes());
            out.extend_from_slice(&(raw.len() as u32).to_le_bytes());
            out.extend_from_slice(&(name.len() as u16).to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(&stored);

            entries.push(ZipMember {
                name,
                raw,
                stored,
                method,
                local_offset,
            });
        }

        let cd_offset = out.len() as u32;
        for entry in &entries {
            out.extend_from_slice(&CENTRAL_SIG.to_le_bytes());
            out.extend_from_slice(&20u16.to_le_bytes());
            out.extend_from_slice(&20u16.to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(&entry.method.to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes());
            out.extend_from_slice(&(entry.stored.len() as u32).to_le_bytes());
            out.extend_from_slice(&(entry.raw.len() as u32).to_le_bytes());
            out.extend_from_slice(&(entry.name.len() as u16).to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes());
            out.extend_from_slice(&entry.local_offset.to_le_bytes());
            out.extend_from_slice(entry.name.as_bytes());
        }
        let cd_size = out.len() as u32 - cd_offset;

        out.extend_from_slice(&EOCD_SIG.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
        out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
        out.extend_from_slice(&cd_size.to_le_bytes());
        out.extend_from_slice(&cd_offset.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());

        out
    }
}

// ============================================================================
// FBX builder
// ============================================================================

/// One node record under construction.
pub struct FbxNodeSpec {
    name: String,
    properties: Vec<FbxPropSpec>,
    children: Vec<FbxNodeSpec>,
}

pub enum FbxPropSpec {
    I32(i32),
    I64(i64),
    F64(f64),
    Str(String),
    F64Array(Vec<f64>),
    I32Array(Vec<i32>),
    /// F64 array forced through the zlib-compressed encoding.
    F64ArrayZlib(Vec<f64>),
}

impl FbxNodeSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn prop_i64(mut self, v: i64) -> Self {
        self.properties.push(FbxPropSpec::I64(v));
        self
    }

    pub fn prop_i32(mut self, v: i32) -> Self {
        self.properties.push(FbxPropSpec::I32(v));
        self
    }

    pub fn prop_f64(mut self, v: f64) -> Self {
        self.properties.push(FbxPropSpec::F64(v));
        self
    }

    pub fn prop_str(mut self, v: &str) -> Self {
        self.properties.push(FbxPropSpec::Str(v.to_string()));
        self
    }

    /// Object name property in the binary `Name\x00\x01Class` shape.
    pub fn prop_name_class(self, name: &str, class: &str) -> Self {
        self.prop_str(&format!("{name}\u{0}\u{1}{class}"))
    }

    pub fn prop_f64_array(mut self, v: Vec<f64>) -> Self {
        self.properties.push(FbxPropSpec::F64Array(v));
        self
    }

    pub fn prop_f64_array_zlib(mut self, v: Vec<f64>) -> Self {
        self.properties.push(FbxPropSpec::F64ArrayZlib(v));
        self
    }

    pub fn prop_i32_array(mut self, v: Vec<i32>) -> Self {
        self.properties.push(FbxPropSpec::I32Array(v));
        self
    }

    pub fn child(mut self, child: FbxNodeSpec) -> Self {
        self.children.push(child);
        self
    }

    fn write(&self, out: &mut Vec<u8>) {
        let header_pos = out.len();
        // Placeholder offsets, fixed up after the node body is known.
        out.extend_from_slice(&[0u8; 12]);
        out.push(self.name.len() as u8);
        out.extend_from_slice(self.name.as_bytes());

        let props_start = out.len();
        for prop in &self.properties {
            write_prop(out, prop);
        }
        let prop_list_len = (out.len() - props_start) as u32;

        if !self.children.is_empty() {
            for child in &self.children {
                child.write(out);
            }
            // Null record closes the child list.
            out.extend_from_slice(&[0u8; 13]);
        }

        let end_offset = out.len() as u32;
        out[header_pos..header_pos + 4].copy_from_slice(&end_offset.to_le_bytes());
        out[header_pos + 4..header_pos + 8]
            .copy_from_slice(&(self.properties.len() as u32).to_le_bytes());
        out[header_pos + 8..header_pos + 12].copy_from_slice(&prop_list_len.to_le_bytes());
    }
}

fn write_prop(out: &mut Vec<u8>, prop: &FbxPropSpec) {
    match prop {
        FbxPropSpec::I32(v) => {
            out.push(b'I');
            out.extend_from_slice(&v.to_le_bytes());
        }
        FbxPropSpec::I64(v) => {
            out.push(b'L');
            out.extend_from_slice(&v.to_le_bytes());
        }
        FbxPropSpec::F64(v) => {
            out.push(b'D');
            out.extend_from_slice(&v.to_le_bytes());
        }
        FbxPropSpec::Str(v) => {
            out.push(b'S');
            out.extend_from_slice(&(v.len() as u32).to_le_bytes());
            out.extend_from_slice(v.as_bytes());
        }
        FbxPropSpec::F64Array(values) => {
            out.push(b'd');
            out.extend_from_slice(&(values.len() as u32).to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes()); // raw encoding
            out.extend_from_slice(&((values.len() * 8) as u32).to_le_bytes());
            for v in values {
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
        FbxPropSpec::F64ArrayZlib(values) => {
            let mut raw = Vec::with_capacity(values.len() * 8);
            for v in values {
                raw.extend_from_slice(&v.to_le_bytes());
            }
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&raw).unwrap();
            let compressed = encoder.finish().unwrap();

            out.push(b'd');
            out.extend_from_slice(&(values.len() as u32).to_le_bytes());
            out.extend_from_slice(&1u32.to_le_bytes()); // zlib encoding
            out.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
            out.extend_from_slice(&compressed);
        }
        FbxPropSpec::I32Array(values) => {
            out.push(b'i');
            out.extend_from_slice(&(values.len() as u32).to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes());
            out.extend_from_slice(&((values.len() * 4) as u32).to_le_bytes());
            for v in values {
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
    }
}

/// Serialize top-level nodes into a complete binary FBX document
/// (version 7400, 32-bit offsets).
pub fn build_fbx(nodes: Vec<FbxNodeSpec>) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"Kaydara FBX Binary  \x00");
    out.extend_from_slice(&[0x1A, 0x00]);
    out.extend_from_slice(&7400u32.to_le_bytes());
    for node in &nodes {
        node.write(&mut out);
    }
    // Null record terminates the top-level list.
    out.extend_from_slice(&[0u8; 13]);
    out
}

// ============================================================================
// Ready-made scenes
// ============================================================================

/// A skinned character: one mesh bound to the given bones, one diffuse
/// texture reference, plus named animation stacks.
pub fn skinned_character_fbx(bones: &[&str], texture_path: &str, clips: &[&str]) -> Vec<u8> {
    const GEO: i64 = 100;
    const MODEL: i64 = 200;
    const MAT: i64 = 300;
    const TEX: i64 = 400;
    const SKIN: i64 = 500;
    const BONE_BASE: i64 = 600;
    const CLUSTER_BASE: i64 = 700;
    const STACK_BASE: i64 = 900;

    let mut objects = FbxNodeSpec::new("Objects")
        .child(
            FbxNodeSpec::new("Geometry")
                .prop_i64(GEO)
                .prop_name_class("body-geo", "Geometry")
                .prop_str("Mesh")
                .child(FbxNodeSpec::new("Vertices").prop_f64_array_zlib(vec![
                    -0.5, 0.0, 0.0, 0.5, 0.0, 0.0, 0.0, 1.8, 0.0,
                ]))
                .child(FbxNodeSpec::new("PolygonVertexIndex").prop_i32_array(vec![0, 1, -3])),
        )
        .child(
            FbxNodeSpec::new("Model")
                .prop_i64(MODEL)
                .prop_name_class("Hero", "Model")
                .prop_str("Mesh"),
        )
        .child(
            FbxNodeSpec::new("Material")
                .prop_i64(MAT)
                .prop_name_class("skin-mat", "Material")
                .prop_str("")
                .child(FbxNodeSpec::new("ShadingModel").prop_str("phong")),
        )
        .child(
            FbxNodeSpec::new("Texture")
                .prop_i64(TEX)
                .prop_name_class("diffuse", "Texture")
                .prop_str("")
                .child(FbxNodeSpec::new("RelativeFilename").prop_str(texture_path)),
        )
        .child(
            FbxNodeSpec::new("Deformer")
                .prop_i64(SKIN)
                .prop_name_class("", "Deformer")
                .prop_str("Skin"),
        );

    for (i, bone) in bones.iter().enumerate() {
        objects = objects
            .child(
                FbxNodeSpec::new("Model")
                    .prop_i64(BONE_BASE + i as i64)
                    .prop_name_class(bone, "Model")
                    .prop_str("LimbNode"),
            )
            .child(
                FbxNodeSpec::new("Deformer")
                    .prop_i64(CLUSTER_BASE + i as i64)
                    .prop_name_class("", "SubDeformer")
                    .prop_str("Cluster"),
            );
    }

    for (i, clip) in clips.iter().enumerate() {
        objects = objects.child(
            FbxNodeSpec::new("AnimationStack")
                .prop_i64(STACK_BASE + i as i64)
                .prop_name_class(clip, "AnimStack")
                .prop_str("")
                .child(
                    FbxNodeSpec::new("Properties70").child(
                        FbxNodeSpec::new("P")
                            .prop_str("LocalStop")
                            .prop_str("KTime")
                            .prop_str("Time")
                            .prop_str("")
                            .prop_i64(46_186_158_000 * 2),
                    ),
                ),
        );
    }

    let mut connections = FbxNodeSpec::new("Connections")
        .child(conn(GEO, MODEL))
        .child(conn(MAT, MODEL))
        .child(conn(TEX, MAT))
        .child(conn(SKIN, GEO));
    for i in 0..bones.len() as i64 {
        // Cluster order within the skin defines bone order.
        connections = connections
            .child(conn(CLUSTER_BASE + i, SKIN))
            .child(conn(BONE_BASE + i, CLUSTER_BASE + i));
        // Bones hang under the mesh model so they are part of the tree.
        connections = connections.child(conn(BONE_BASE + i, MODEL));
    }

    build_fbx(vec![objects, connections])
}

/// A clip-only file: animation stacks, bone nodes, no skinned mesh.
pub fn clip_pack_fbx(bones: &[&str], clips: &[&str]) -> Vec<u8> {
    const BONE_BASE: i64 = 600;
    const STACK_BASE: i64 = 900;

    let mut objects = FbxNodeSpec::new("Objects");
    for (i, bone) in bones.iter().enumerate() {
        objects = objects.child(
            FbxNodeSpec::new("Model")
                .prop_i64(BONE_BASE + i as i64)
                .prop_name_class(bone, "Model")
                .prop_str("LimbNode"),
        );
    }
    for (i, clip) in clips.iter().enumerate() {
        objects = objects.child(
            FbxNodeSpec::new("AnimationStack")
                .prop_i64(STACK_BASE + i as i64)
                .prop_name_class(clip, "AnimStack")
                .prop_str("")
                .child(
                    FbxNodeSpec::new("Properties70").child(
                        FbxNodeSpec::new("P")
                            .prop_str("LocalStop")
                            .prop_str("KTime")
                            .prop_str("Time")
                            .prop_str("")
                            .prop_i64(46_186_158_000),
                    ),
                ),
        );
    }

    let mut connections = FbxNodeSpec::new("Connections");
    for i in 1..bones.len() as i64 {
        // Chain the bones so traversal order matches declaration order.
        connections = connections.child(conn(BONE_BASE + i, BONE_BASE + i - 1));
    }

    build_fbx(vec![objects, connections])
}

fn conn(child: i64, parent: i64) -> FbxNodeSpec {
    FbxNodeSpec::new("C")
        .prop_str("OO")
        .prop_i64(child)
        .prop_i64(parent)
}

// ============================================================================
// In-memory remote source
// ============================================================================

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rigstage::fetch::RemoteSource;
use rigstage::util::{Error, Result};

/// [`RemoteSource`] serving archives from memory, counting fetches.
///
/// The counter is shared so tests can keep reading it after the source
/// moves into a registry.
#[derive(Default)]
pub struct MapSource {
    files: HashMap<String, Vec<u8>>,
    fetches: Arc<AtomicUsize>,
}

impl MapSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.files.insert(url.to_string(), bytes);
        self
    }

    pub fn fetch_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.fetches)
    }
}

impl RemoteSource for MapSource {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        self.files
            .get(url)
            .cloned()
            .ok_or_else(|| Error::HttpStatus {
                url: url.to_string(),
                status: 404,
            })
    }

    async fn probe_size(&self, url: &str) -> Option<u64> {
        self.files.get(url).map(|b| b.len() as u64)
    }
}
