//! Binary FBX format constants.

/// Magic bytes at the start of a binary FBX file (21 bytes including the
/// terminating NUL).
pub const FBX_MAGIC: &[u8; 21] = b"Kaydara FBX Binary  \x00";

/// Two marker bytes following the magic.
pub const FBX_MARKER: [u8; 2] = [0x1A, 0x00];

/// Size of the file header: magic + marker + u32 version.
pub const HEADER_SIZE: usize = 27;

/// Lowest FBX version this reader accepts.
pub const MIN_VERSION: u32 = 7000;

/// From this version on, node record offsets are 64-bit.
pub const VERSION_64BIT_OFFSETS: u32 = 7500;

/// FBX KTime units per second.
pub const KTIME_PER_SECOND: i64 = 46_186_158_000;

/// Array property encoding: raw little-endian values.
pub const ARRAY_ENCODING_RAW: u32 = 0;

/// Array property encoding: zlib-compressed values.
pub const ARRAY_ENCODING_ZLIB: u32 = 1;

/// Separator between object name and class in name properties
/// (`Hero\x00\x01Model`).
pub const NAME_CLASS_SEPARATOR: &str = "\u{0}\u{1}";

/// Heuristic for the ASCII variant of the format, used only to name the
/// failure more precisely when the binary magic is missing.
pub fn looks_like_ascii_fbx(bytes: &[u8]) -> bool {
    let head_len = bytes.len().min(1024);
    let head = String::from_utf8_lossy(&bytes[..head_len]);
    head.trim_start().starts_with("; FBX") || head.contains("FBXHeaderExtension")
}
