//! Binary FBX node-record reader.
//!
//! Parses the raw record tree: nested named nodes, each carrying a list
//! of typed properties. No interpretation happens here; the document
//! layer gives the tree meaning.

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::ZlibDecoder;

use super::format::*;
use crate::util::{Error, Result};

/// One typed property of a node record.
#[derive(Debug, Clone, PartialEq)]
pub enum FbxProperty {
    I16(i16),
    Bool(bool),
    I32(i32),
    F32(f32),
    F64(f64),
    I64(i64),
    Str(String),
    Raw(Vec<u8>),
    F32Array(Vec<f32>),
    F64Array(Vec<f64>),
    I32Array(Vec<i32>),
    I64Array(Vec<i64>),
    BoolArray(Vec<bool>),
}

impl FbxProperty {
    /// Integer view across the integral scalar variants.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FbxProperty::I16(v) => Some(*v as i64),
            FbxProperty::I32(v) => Some(*v as i64),
            FbxProperty::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Float view across the numeric scalar variants.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FbxProperty::F32(v) => Some(*v as f64),
            FbxProperty::F64(v) => Some(*v),
            FbxProperty::I16(v) => Some(*v as f64),
            FbxProperty::I32(v) => Some(*v as f64),
            FbxProperty::I64(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// String view.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FbxProperty::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// One node record: name, properties, nested children.
#[derive(Debug, Clone, Default)]
pub struct FbxNode {
    pub name: String,
    pub properties: Vec<FbxProperty>,
    pub children: Vec<FbxNode>,
}

impl FbxNode {
    /// First child with the given name.
    pub fn child(&self, name: &str) -> Option<&FbxNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with the given name, in file order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FbxNode> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Property at index as an integer.
    pub fn prop_i64(&self, index: usize) -> Option<i64> {
        self.properties.get(index).and_then(FbxProperty::as_i64)
    }

    /// Property at index as a float.
    pub fn prop_f64(&self, index: usize) -> Option<f64> {
        self.properties.get(index).and_then(FbxProperty::as_f64)
    }

    /// Property at index as a string.
    pub fn prop_str(&self, index: usize) -> Option<&str> {
        self.properties.get(index).and_then(FbxProperty::as_str)
    }
}

/// A parsed file: format version plus the top-level node list.
#[derive(Debug, Clone)]
pub struct FbxFile {
    pub version: u32,
    pub nodes: Vec<FbxNode>,
}

impl FbxFile {
    /// First top-level node with the given name.
    pub fn node(&self, name: &str) -> Option<&FbxNode> {
        self.nodes.iter().find(|n| n.name == name)
    }
}

/// Parse a binary FBX document.
///
/// The magic check runs first; when it fails on something that looks
/// like the ASCII variant, the error names both failures so the caller
/// can surface one combined message. No further fallback is attempted.
pub fn parse(data: &[u8]) -> Result<FbxFile> {
    if data.len() < HEADER_SIZE {
        return Err(Error::UnexpectedEof(data.len() as u64));
    }
    if &data[..FBX_MAGIC.len()] != FBX_MAGIC {
        if looks_like_ascii_fbx(data) {
            return Err(Error::decode(
                "binary FBX magic missing; content looks like ASCII FBX, \
                 which this loader does not support",
            ));
        }
        return Err(Error::decode("binary FBX magic missing"));
    }

    let version = u32::from_le_bytes([data[23], data[24], data[25], data[26]]);
    if version < MIN_VERSION {
        return Err(Error::UnsupportedVersion(version));
    }
    let wide = version >= VERSION_64BIT_OFFSETS;

    let mut cur = Cursor::new(data);
    cur.set_position(HEADER_SIZE as u64);

    let mut nodes = Vec::new();
    while (cur.position() as usize) < data.len() {
        match read_node(&mut cur, wide)? {
            Some(node) => nodes.push(node),
            // Null record terminates the top-level list; the rest of the
            // file is the footer.
            None => break,
        }
    }

    tracing::debug!("parsed FBX v{version}: {} top-level node(s)", nodes.len());
    Ok(FbxFile { version, nodes })
}

fn read_node(cur: &mut Cursor<&[u8]>, wide: bool) -> Result<Option<FbxNode>> {
    let (end_offset, num_properties) = if wide {
        let end = cur.read_u64::<LittleEndian>()?;
        let num = cur.read_u64::<LittleEndian>()?;
        cur.read_u64::<LittleEndian>()?; // property list byte length
        (end, num)
    } else {
        let end = cur.read_u32::<LittleEndian>()? as u64;
        let num = cur.read_u32::<LittleEndian>()? as u64;
        cur.read_u32::<LittleEndian>()?;
        (end, num)
    };
    let name_len = cur.read_u8()? as usize;

    if end_offset == 0 && num_properties == 0 && name_len == 0 {
        return Ok(None);
    }

    let name = String::from_utf8_lossy(take(cur, name_len)?).into_owned();

    // Capacity comes from the property loop, not the declared count: a
    // corrupted count must not drive allocation.
    let mut properties = Vec::new();
    for _ in 0..num_properties {
        properties.push(read_property(cur)?);
    }

    let mut children = Vec::new();
    while cur.position() < end_offset {
        match read_node(cur, wide)? {
            Some(child) => children.push(child),
            None => break,
        }
    }

    if end_offset > cur.get_ref().len() as u64 {
        return Err(Error::UnexpectedEof(end_offset));
    }
    cur.set_position(end_offset);

    Ok(Some(FbxNode {
        name,
        properties,
        children,
    }))
}

fn read_property(cur: &mut Cursor<&[u8]>) -> Result<FbxProperty> {
    let code = cur.read_u8()?;
    Ok(match code {
        b'Y' => FbxProperty::I16(cur.read_i16::<LittleEndian>()?),
        b'C' => FbxProperty::Bool(cur.read_u8()? & 1 == 1),
        b'I' => FbxProperty::I32(cur.read_i32::<LittleEndian>()?),
        b'F' => FbxProperty::F32(cur.read_f32::<LittleEndian>()?),
        b'D' => FbxProperty::F64(cur.read_f64::<LittleEndian>()?),
        b'L' => FbxProperty::I64(cur.read_i64::<LittleEndian>()?),
        b'S' => {
            let len = cur.read_u32::<LittleEndian>()? as usize;
            FbxProperty::Str(String::from_utf8_lossy(take(cur, len)?).into_owned())
        }
        b'R' => {
            let len = cur.read_u32::<LittleEndian>()? as usize;
            FbxProperty::Raw(take(cur, len)?.to_vec())
        }
        b'f' => FbxProperty::F32Array(read_array(cur, 4, |c| c.read_f32::<LittleEndian>())?),
        b'd' => FbxProperty::F64Array(read_array(cur, 8, |c| c.read_f64::<LittleEndian>())?),
        b'i' => FbxProperty::I32Array(read_array(cur, 4, |c| c.read_i32::<LittleEndian>())?),
        b'l' => FbxProperty::I64Array(read_array(cur, 8, |c| c.read_i64::<LittleEndian>())?),
        b'b' => {
            let raw = read_array(cur, 1, |c| c.read_u8())?;
            FbxProperty::BoolArray(raw.into_iter().map(|v| v & 1 == 1).collect())
        }
        other => {
            return Err(Error::decode(format!(
                "unknown FBX property code 0x{other:02x} at {}",
                cur.position()
            )))
        }
    })
}

fn read_array<T, F>(cur: &mut Cursor<&[u8]>, elem_size: usize, mut read_elem: F) -> Result<Vec<T>>
where
    F: FnMut(&mut Cursor<&[u8]>) -> std::io::Result<T>,
{
    let len = cur.read_u32::<LittleEndian>()? as usize;
    let encoding = cur.read_u32::<LittleEndian>()?;
    let compressed_len = cur.read_u32::<LittleEndian>()? as usize;

    let raw: Vec<u8> = match encoding {
        ARRAY_ENCODING_RAW => take(cur, len * elem_size)?.to_vec(),
        ARRAY_ENCODING_ZLIB => {
            let compressed = take(cur, compressed_len)?;
            let mut out = Vec::with_capacity((len * elem_size).min(1 << 26));
            let mut decoder = ZlibDecoder::new(compressed);
            decoder
                .read_to_end(&mut out)
                .map_err(|e| Error::decode(format!("array inflate failed: {e}")))?;
            out
        }
        other => {
            return Err(Error::decode(format!("unknown array encoding {other}")));
        }
    };

    if raw.len() < len * elem_size {
        return Err(Error::UnexpectedEof(cur.position()));
    }

    let mut elems = Vec::with_capacity(len);
    let mut elem_cur = Cursor::new(raw.as_slice());
    for _ in 0..len {
        elems.push(read_elem(&mut elem_cur)?);
    }
    Ok(elems)
}

fn take<'a>(cur: &mut Cursor<&'a [u8]>, n: usize) -> Result<&'a [u8]> {
    let pos = cur.position() as usize;
    let data: &'a [u8] = *cur.get_ref();
    if pos + n > data.len() {
        return Err(Error::UnexpectedEof((pos + n) as u64));
    }
    cur.set_position((pos + n) as u64);
    Ok(&data[pos..pos + n])
}
