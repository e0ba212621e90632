//! Rigstage CLI - Inspect showcase asset archives from the command line.

use std::env;
use std::process::ExitCode;

use tracing::info;
use tracing_subscriber::EnvFilter;

use rigstage::pack::{ingest_bytes, PackKind};
use rigstage::resolve::HandleStore;
use rigstage::scene::{NodeKind, SceneNode};
use rigstage::util::{extension, mime_for_extension};
use rigstage::zip::{looks_like_zip, ZipArchive};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = "info";
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-vv" | "--trace" => level = "trace",
            "-q" | "--quiet" => level = "warn",
            _ => filtered_args.push(arg),
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_target(false)
        .init();

    let result = match filtered_args.as_slice() {
        ["inspect", path] => cmd_inspect(path),
        ["sniff", path] => cmd_sniff(path),
        _ => {
            print_usage(&args[0]);
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_usage(program: &str) {
    eprintln!("Usage: {program} [-v|-vv|-q] <command> <file>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  inspect <archive.zip|mesh.fbx>  Ingest an asset and describe it");
    eprintln!("  sniff <file>                    Report what the bytes look like");
}

fn cmd_inspect(path: &str) -> rigstage::Result<()> {
    info!("Inspecting {path}");
    let bytes = std::fs::read(path)?;

    if looks_like_zip(&bytes) {
        let archive = ZipArchive::parse(&bytes)?;
        println!("Archive members ({}):", archive.len());
        for name in archive.member_names() {
            println!("  {name}");
        }
    }

    let store = HandleStore::new();
    let asset = ingest_bytes(&bytes, &store)?;

    let kind = match asset.kind {
        PackKind::ModelWithClip => "model (has skinned mesh)",
        PackKind::ClipOnly => "clip pack (no skinned mesh)",
    };
    println!("Kind:       {kind}");
    println!(
        "Signature:  {}",
        asset.skeleton_signature.as_deref().unwrap_or("<none>")
    );
    println!("Textures:   {}", asset.texture_file_names.join(", "));
    println!("Clips ({}):", asset.scene.clips.len());
    for clip in &asset.scene.clips {
        println!("  {} ({:.2}s)", clip.name, clip.duration);
    }
    println!("Hierarchy:");
    print_node(&asset.scene.root, 1);

    // Inspection owns the handles it created.
    store.clear();
    Ok(())
}

fn print_node(node: &SceneNode, depth: usize) {
    let role = match &node.kind {
        NodeKind::Group => "group".to_string(),
        NodeKind::Bone => "bone".to_string(),
        NodeKind::Mesh(mesh) => {
            let skin = match &mesh.skin {
                Some(skin) => format!(", {} bone(s)", skin.bone_names.len()),
                None => String::new(),
            };
            format!(
                "mesh [{}] {} vert(s){skin}",
                mesh.material.kind_name(),
                mesh.geometry.positions.len()
            )
        }
    };
    println!("{:indent$}{} ({role})", "", node.name, indent = depth * 2);
    for child in &node.children {
        print_node(child, depth + 1);
    }
}

fn cmd_sniff(path: &str) -> rigstage::Result<()> {
    let bytes = std::fs::read(path)?;
    let ext = extension(path).unwrap_or_default();

    println!("Size:       {} byte(s)", bytes.len());
    println!("MIME (ext): {}", mime_for_extension(&ext));
    println!(
        "ZIP magic:  {}",
        if looks_like_zip(&bytes) { "yes" } else { "no" }
    );
    let fbx = bytes.len() >= rigstage::fbx::format::FBX_MAGIC.len()
        && &bytes[..rigstage::fbx::format::FBX_MAGIC.len()] == rigstage::fbx::format::FBX_MAGIC;
    println!("FBX magic:  {}", if fbx { "yes" } else { "no" });
    Ok(())
}
