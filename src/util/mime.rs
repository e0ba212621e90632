//! MIME type lookup and texture extension classification.

/// Map a lower-case file extension to a MIME type.
///
/// Unknown extensions map to `application/octet-stream`. This is a
/// transport-header hint only, callers must never rely on it to validate
/// content.
pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "gif" => "image/gif",
        "tga" => "image/x-tga",
        "tif" | "tiff" => "image/tiff",
        "fbx" => "application/octet-stream",
        "zip" => "application/zip",
        "json" => "application/json",
        "html" | "htm" => "text/html",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Extensions treated as texture members during archive classification.
pub fn is_texture_extension(ext: &str) -> bool {
    matches!(
        ext.to_ascii_lowercase().as_str(),
        "png" | "jpg" | "jpeg" | "webp" | "bmp" | "tga" | "tif" | "tiff"
    )
}
