//! Archive member resolution.
//!
//! Texture references embedded in mesh files are frequently authored as
//! absolute local filesystem paths, or point into per-asset texture
//! subfolders that only exist on the authoring machine. The asset map
//! substitutes those references with handle URLs of actually-extracted
//! archive members, matching forgivingly on normalized path, basename
//! and subfolder remainder.

use std::collections::HashMap;

use smallvec::SmallVec;

use super::handle::HandleStore;
use crate::util::{basename, normalize_key, percent_decode, strip_query_fragment};

/// Marker for the mesh format's co-located texture subfolder convention
/// (`<asset>.fbm/diffuse.png`).
pub const COLOCATED_TEXTURE_MARKER: &str = ".fbm/";

/// Mapping from normalized member keys to handle URLs.
///
/// Built once per archive ingestion and owned by it until the resulting
/// pack takes over. Key insertion order is preserved because the
/// final basename-scan fallback depends on it.
#[derive(Debug, Default)]
pub struct AssetMap {
    keys: Vec<String>,
    entries: HashMap<String, String>,
}

impl AssetMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one member under all of its lookup keys: normalized full
    /// name, basename, and any name found under a co-located texture
    /// subfolder marker.
    pub fn insert_member(&mut self, member_name: &str, handle_url: &str) {
        let full = normalize_key(member_name);
        self.insert_key(basename(&full).to_string(), handle_url);
        if let Some(pos) = full.find(COLOCATED_TEXTURE_MARKER) {
            let remainder = &full[pos + COLOCATED_TEXTURE_MARKER.len()..];
            if !remainder.is_empty() {
                self.insert_key(remainder.to_string(), handle_url);
                self.insert_key(basename(remainder).to_string(), handle_url);
            }
        }
        self.insert_key(full, handle_url);
    }

    fn insert_key(&mut self, key: String, url: &str) {
        if key.is_empty() {
            return;
        }
        if !self.entries.contains_key(&key) {
            self.keys.push(key.clone());
        }
        // Later members overwrite earlier ones on key collision, so
        // duplicate basenames resolve to the last member registered.
        self.entries.insert(key, url.to_string());
    }

    /// Direct lookup by already-normalized key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True when no members are registered.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// Resolve a requested URL against the member table.
    ///
    /// Already-local handle references pass through unchanged. Otherwise
    /// the request is decoded, stripped of query/fragment and normalized;
    /// candidates are tried in order: full normalized path, its basename,
    /// then (when the path goes through a co-located texture subfolder)
    /// the remainder after that marker and the remainder's basename.
    /// As a last resort every table key whose final path segment equals
    /// the requested basename matches, in insertion order.
    ///
    /// Misses return the original request unmodified, so the downstream
    /// loader attempts it as a literal URL and fails visibly rather than
    /// silently. Known limitation: identical basenames from unrelated
    /// archives in one table can resolve to the wrong file; precedence
    /// here is part of the contract and must not be reordered.
    pub fn resolve(&self, requested: &str) -> String {
        if HandleStore::is_local_url(requested) {
            return requested.to_string();
        }

        let decoded = percent_decode(requested);
        let stripped = strip_query_fragment(&decoded);
        let normalized = normalize_key(stripped);

        let mut candidates: SmallVec<[String; 4]> = SmallVec::new();
        candidates.push(normalized.clone());
        candidates.push(basename(&normalized).to_string());
        if let Some(pos) = normalized.find(COLOCATED_TEXTURE_MARKER) {
            let remainder = &normalized[pos + COLOCATED_TEXTURE_MARKER.len()..];
            if !remainder.is_empty() {
                candidates.push(remainder.to_string());
                candidates.push(basename(remainder).to_string());
            }
        }

        for candidate in &candidates {
            if let Some(url) = self.entries.get(candidate.as_str()) {
                return url.clone();
            }
        }

        let wanted = basename(&normalized);
        if !wanted.is_empty() {
            for key in &self.keys {
                if basename(key) == wanted {
                    tracing::trace!("resolved '{requested}' by basename scan via '{key}'");
                    return self.entries[key].clone();
                }
            }
        }

        requested.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_of(members: &[(&str, &str)]) -> AssetMap {
        let mut map = AssetMap::new();
        for (name, url) in members {
            map.insert_member(name, url);
        }
        map
    }

    #[test]
    fn test_round_trip_member_names() {
        let members = [
            ("hero.fbx", "mem://0/hero.fbx"),
            ("textures/hero_diffuse.png", "mem://1/hero_diffuse.png"),
            ("Hero.fbm/normal.PNG", "mem://2/normal.PNG"),
        ];
        let map = map_of(&members);
        for (name, url) in &members {
            assert_eq!(map.resolve(name), *url, "round trip failed for {name}");
        }
    }

    #[test]
    fn test_absolute_path_resolves_by_basename() {
        let map = map_of(&[("textures/skin.png", "mem://0/skin.png")]);
        assert_eq!(map.resolve("C:\\Users\\artist\\skin.png"), "mem://0/skin.png");
        assert_eq!(map.resolve("file:///tmp/skin.png"), "mem://0/skin.png");
    }

    #[test]
    fn test_fbm_subfolder_marker() {
        // Table only knows the bare basename; the request goes through
        // an .fbm folder with a drive prefix.
        let map = map_of(&[("diffuse.png", "mem://0/diffuse.png")]);
        assert_eq!(
            map.resolve("C:/assets/hero.fbm/diffuse.png"),
            "mem://0/diffuse.png"
        );
    }

    #[test]
    fn test_fbm_remainder_with_subdirs() {
        let map = map_of(&[("hero.fbm/maps/ao.png", "mem://0/ao.png")]);
        assert_eq!(map.resolve("D:/export/hero.fbm/maps/ao.png"), "mem://0/ao.png");
    }

    #[test]
    fn test_query_and_fragment_stripped() {
        let map = map_of(&[("skin.png", "mem://0/skin.png")]);
        assert_eq!(map.resolve("skin.png?v=3#top"), "mem://0/skin.png");
    }

    #[test]
    fn test_percent_decoding() {
        let map = map_of(&[("my tex.png", "mem://0/my tex.png")]);
        assert_eq!(map.resolve("my%20tex.png"), "mem://0/my tex.png");
    }

    #[test]
    fn test_local_url_passthrough() {
        let map = map_of(&[("skin.png", "mem://0/skin.png")]);
        assert_eq!(map.resolve("mem://9/other.png"), "mem://9/other.png");
    }

    #[test]
    fn test_miss_returns_original() {
        let map = map_of(&[("skin.png", "mem://0/skin.png")]);
        assert_eq!(map.resolve("https://cdn.example/missing.png"), "https://cdn.example/missing.png");
    }

    #[test]
    fn test_basename_candidate() {
        let map = map_of(&[("deep/nested/dir/rock.png", "mem://0/rock.png")]);
        assert_eq!(map.resolve("Z:/elsewhere/rock.png"), "mem://0/rock.png");
    }

    #[test]
    fn test_basename_scan_fallback() {
        // A table holding only full-path keys still matches on the final
        // path segment via the insertion-order scan.
        let mut map = AssetMap::new();
        map.insert_key("deep/nested/rock.png".to_string(), "mem://0/rock.png");
        map.insert_key("other/rock.png".to_string(), "mem://1/rock.png");
        assert_eq!(map.resolve("rock.png"), "mem://0/rock.png");
    }

    #[test]
    fn test_duplicate_basename_last_member_wins() {
        // Documented collision behavior: both members register the
        // "skin.png" basename key, the later insert owns it.
        let map = map_of(&[
            ("alpha/skin.png", "mem://0/skin.png"),
            ("beta/skin.png", "mem://1/skin.png"),
        ]);
        assert_eq!(map.resolve("skin.png"), "mem://1/skin.png");
        // Full paths still resolve to their own members.
        assert_eq!(map.resolve("alpha/skin.png"), "mem://0/skin.png");
        assert_eq!(map.resolve("beta/skin.png"), "mem://1/skin.png");
    }
}
