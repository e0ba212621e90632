//! Path and key normalization.
//!
//! Texture references baked into binary mesh files arrive in every shape
//! an authoring tool can produce: Windows drive paths, `file:` URLs,
//! backslashes, mixed case. Lookups against extracted archive members go
//! through [`normalize_key`] so that all of these collapse to one stable
//! map key.

/// Canonicalize a path or URL into a stable lookup key.
///
/// Transform order: backslashes to forward slashes, strip a leading
/// `./`, strip a drive prefix (`C:/`, case-insensitive), strip a leading
/// `file:` plus any slashes, strip a leading slash, trim whitespace,
/// lower-case. The pass repeats until the string stops changing, so the
/// function is idempotent for all inputs: `normalize_key(normalize_key(x))
/// == normalize_key(x)`.
pub fn normalize_key(path: &str) -> String {
    let mut key = path.to_string();
    loop {
        let next = normalize_pass(&key);
        if next == key {
            return key;
        }
        key = next;
    }
}

fn normalize_pass(path: &str) -> String {
    let mut s = path.replace('\\', "/");

    if let Some(rest) = s.strip_prefix("./") {
        s = rest.to_string();
    }

    // Drive prefix: single letter, colon, slash
    let b = s.as_bytes();
    if b.len() >= 3 && b[0].is_ascii_alphabetic() && b[1] == b':' && b[2] == b'/' {
        s = s[3..].to_string();
    }

    if s.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("file:")) {
        s = s[5..].trim_start_matches('/').to_string();
    }

    if let Some(rest) = s.strip_prefix('/') {
        s = rest.to_string();
    }

    s.trim().to_ascii_lowercase()
}

/// Last path segment of a key (the part after the final `/`).
///
/// Returns the whole string when it contains no separator.
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// File extension (after the final `.` of the basename), lower-cased.
pub fn extension(path: &str) -> Option<String> {
    let base = basename(path);
    let dot = base.rfind('.')?;
    if dot + 1 >= base.len() {
        return None;
    }
    Some(base[dot + 1..].to_ascii_lowercase())
}

/// Cut a query string (`?...`) and fragment (`#...`) off a URL-ish string.
pub fn strip_query_fragment(url: &str) -> &str {
    let end = url
        .find(|c| c == '?' || c == '#')
        .unwrap_or(url.len());
    &url[..end]
}

/// Decode `%xx` escapes. Invalid escapes are kept literally.
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let decoded = std::str::from_utf8(&bytes[i + 1..i + 3])
                .ok()
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());
            if let Some(v) = decoded {
                out.push(v);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Reduce a label to a URL/id-safe slug: lower-case alphanumerics with
/// single dashes, no leading or trailing dash.
pub fn slugify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    let mut dash_pending = false;
    for c in label.chars() {
        if c.is_ascii_alphanumeric() {
            if dash_pending && !slug.is_empty() {
                slug.push('-');
            }
            dash_pending = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            dash_pending = true;
        }
    }
    slug
}
