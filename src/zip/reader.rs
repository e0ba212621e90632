//! ZIP archive reader.
//!
//! Walks the end-of-central-directory record and the central directory
//! of an in-memory archive, then extracts members on demand. Supports
//! stored and DEFLATE members; encrypted members are rejected. This is
//! not a general-purpose ZIP implementation, only what uploaded asset
//! archives need.

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::DeflateDecoder;

use super::format::*;
use crate::util::{extension, is_texture_extension, Error, Result};

/// One extracted archive member.
#[derive(Debug, Clone)]
pub struct ArchiveMember {
    /// Member name as stored in the archive (forward slashes).
    pub name: String,
    /// Decompressed bytes.
    pub bytes: Vec<u8>,
    /// True when the extension is a recognized texture format.
    pub is_texture: bool,
}

/// Central directory metadata for one member.
#[derive(Debug, Clone)]
struct ZipEntry {
    name: String,
    method: u16,
    flags: u16,
    compressed_size: u64,
    uncompressed_size: u64,
    local_header_offset: u64,
}

/// Parsed archive over a borrowed byte buffer.
pub struct ZipArchive<'a> {
    data: &'a [u8],
    entries: Vec<ZipEntry>,
}

impl<'a> ZipArchive<'a> {
    /// Parse the central directory of an archive.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if !looks_like_zip(data) {
            return Err(Error::NotAnArchive);
        }

        let eocd_pos = find_end_of_central_dir(data)?;
        let mut cur = Cursor::new(&data[eocd_pos..]);
        cur.read_u32::<LittleEndian>()?; // signature, already verified
        cur.read_u16::<LittleEndian>()?; // disk number
        cur.read_u16::<LittleEndian>()?; // central dir start disk
        cur.read_u16::<LittleEndian>()?; // entries on this disk
        let total_entries = cur.read_u16::<LittleEndian>()? as usize;
        cur.read_u32::<LittleEndian>()?; // central dir size
        let cd_offset = cur.read_u32::<LittleEndian>()? as u64;

        if cd_offset >= data.len() as u64 {
            return Err(Error::UnexpectedEof(cd_offset));
        }

        let mut entries = Vec::with_capacity(total_entries);
        let mut pos = cd_offset as usize;
        for _ in 0..total_entries {
            let entry = read_central_entry(data, &mut pos)?;
            entries.push(entry);
        }

        tracing::debug!("parsed archive: {} member(s)", entries.len());
        Ok(Self { data, entries })
    }

    /// Number of members listed in the central directory.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the archive lists no members.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Member names in central directory order.
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Extract every non-directory member, in central directory order.
    pub fn extract_all(&self) -> Result<Vec<ArchiveMember>> {
        let mut members = Vec::new();
        for entry in &self.entries {
            if entry.name.ends_with('/') {
                continue; // directory marker
            }
            let bytes = self.read_entry(entry)?;
            let is_texture = extension(&entry.name)
                .map(|ext| is_texture_extension(&ext))
                .unwrap_or(false);
            members.push(ArchiveMember {
                name: entry.name.clone(),
                bytes,
                is_texture,
            });
        }
        Ok(members)
    }

    fn read_entry(&self, entry: &ZipEntry) -> Result<Vec<u8>> {
        if entry.flags & FLAG_ENCRYPTED != 0 {
            return Err(Error::EncryptedMember(entry.name.clone()));
        }

        let header_pos = entry.local_header_offset as usize;
        if header_pos + LOCAL_FILE_HEADER_SIZE > self.data.len() {
            return Err(Error::UnexpectedEof(entry.local_header_offset));
        }

        let mut cur = Cursor::new(&self.data[header_pos..]);
        let sig = cur.read_u32::<LittleEndian>()?;
        if sig != LOCAL_FILE_HEADER_SIG {
            return Err(Error::invalid(format!(
                "bad local header for member '{}'",
                entry.name
            )));
        }
        cur.read_u16::<LittleEndian>()?; // version needed
        cur.read_u16::<LittleEndian>()?; // flags
        cur.read_u16::<LittleEndian>()?; // method
        cur.read_u16::<LittleEndian>()?; // mod time
        cur.read_u16::<LittleEndian>()?; // mod date
        cur.read_u32::<LittleEndian>()?; // crc32
        cur.read_u32::<LittleEndian>()?; // compressed size (may be 0 here)
        cur.read_u32::<LittleEndian>()?; // uncompressed size
        let name_len = cur.read_u16::<LittleEndian>()? as usize;
        let extra_len = cur.read_u16::<LittleEndian>()? as usize;

        let data_pos = header_pos + LOCAL_FILE_HEADER_SIZE + name_len + extra_len;
        let data_end = data_pos + entry.compressed_size as usize;
        if data_end > self.data.len() {
            return Err(Error::UnexpectedEof(data_end as u64));
        }
        let raw = &self.data[data_pos..data_end];

        match entry.method {
            METHOD_STORED => Ok(raw.to_vec()),
            METHOD_DEFLATED => {
                let mut out = Vec::with_capacity(entry.uncompressed_size as usize);
                let mut decoder = DeflateDecoder::new(raw);
                decoder.read_to_end(&mut out).map_err(|e| {
                    Error::invalid(format!("member '{}' failed to inflate: {e}", entry.name))
                })?;
                Ok(out)
            }
            method => Err(Error::UnsupportedCompression {
                member: entry.name.clone(),
                method,
            }),
        }
    }
}

/// Scan backwards for the end-of-central-directory signature.
///
/// The record carries a variable-length comment, so it is not at a fixed
/// distance from the end of the file.
fn find_end_of_central_dir(data: &[u8]) -> Result<usize> {
    if data.len() < END_OF_CENTRAL_DIR_SIZE {
        return Err(Error::UnexpectedEof(data.len() as u64));
    }
    let sig = END_OF_CENTRAL_DIR_SIG.to_le_bytes();
    let start = data.len() - END_OF_CENTRAL_DIR_SIZE;
    for pos in (0..=start).rev() {
        if data[pos..pos + 4] == sig {
            return Ok(pos);
        }
    }
    Err(Error::invalid("no end-of-central-directory record"))
}

fn read_central_entry(data: &[u8], pos: &mut usize) -> Result<ZipEntry> {
    if *pos + CENTRAL_DIR_HEADER_SIZE > data.len() {
        return Err(Error::UnexpectedEof(*pos as u64));
    }
    let mut cur = Cursor::new(&data[*pos..]);
    let sig = cur.read_u32::<LittleEndian>()?;
    if sig != CENTRAL_DIR_HEADER_SIG {
        return Err(Error::invalid(format!(
            "bad central directory signature at {pos}"
        )));
    }
    cur.read_u16::<LittleEndian>()?; // version made by
    cur.read_u16::<LittleEndian>()?; // version needed
    let flags = cur.read_u16::<LittleEndian>()?;
    let method = cur.read_u16::<LittleEndian>()?;
    cur.read_u16::<LittleEndian>()?; // mod time
    cur.read_u16::<LittleEndian>()?; // mod date
    cur.read_u32::<LittleEndian>()?; // crc32
    let compressed_size = cur.read_u32::<LittleEndian>()? as u64;
    let uncompressed_size = cur.read_u32::<LittleEndian>()? as u64;
    let name_len = cur.read_u16::<LittleEndian>()? as usize;
    let extra_len = cur.read_u16::<LittleEndian>()? as usize;
    let comment_len = cur.read_u16::<LittleEndian>()? as usize;
    cur.read_u16::<LittleEndian>()?; // disk number start
    cur.read_u16::<LittleEndian>()?; // internal attributes
    cur.read_u32::<LittleEndian>()?; // external attributes
    let local_header_offset = cur.read_u32::<LittleEndian>()? as u64;

    let name_pos = *pos + CENTRAL_DIR_HEADER_SIZE;
    let name_end = name_pos + name_len;
    if name_end > data.len() {
        return Err(Error::UnexpectedEof(name_end as u64));
    }
    let name = String::from_utf8_lossy(&data[name_pos..name_end]).into_owned();

    *pos = name_end + extra_len + comment_len;

    Ok(ZipEntry {
        name,
        method,
        flags,
        compressed_size,
        uncompressed_size,
        local_header_offset,
    })
}
